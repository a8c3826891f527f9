//! Defines [`HeapDisk`], the fixed-size block pool backing every
//! [`crate::store::ByteStore`] in a [`crate::filestore::FileStore`].
//!
//! Grounded on the teacher's intrusive buffer pool (`allocator::buffer`,
//! `allocator::chain`): blocks are heap-allocated, zero-filled byte buffers
//! handed out from a free list and returned to it on `free`.

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// A single fixed-size, heap-allocated, zero-initialized byte buffer.
///
/// Mirrors the teacher's `allocator::buffer::Buffer`, minus the raw-pointer
/// bookkeeping that buffer needed for its intrusive linked list: a `Vec`
/// already gives us a block list for free (see [`crate::store::ByteStore`]).
pub struct Block(Box<[u8]>);

impl Block {
    fn zeroed(size: usize) -> Self {
        Self(vec![0u8; size].into_boxed_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    fn zero_fill(&mut self) {
        self.0.fill(0);
    }
}

struct Inner {
    block_size: usize,
    max_blocks: usize,
    max_cached_blocks: usize,
    free: Vec<Block>,
    allocated: usize,
}

/// Fixed-size-block pool shared by every [`crate::store::ByteStore`] created
/// under one [`crate::filestore::FileStore`].
///
/// `allocate`/`free` are the only mutating entry points and are mutually
/// exclusive via a single internal lock (spec: "HeapDisk is protected by its
/// own monitor; it never holds the file-store lock").
pub struct HeapDisk {
    inner: Mutex<Inner>,
}

impl HeapDisk {
    /// Creates a disk with `block_size` bytes per block, a cap of
    /// `max_blocks` simultaneously allocated blocks, and a free-block cache
    /// capped at `max_cached_blocks`.
    ///
    /// # Panics
    ///
    /// Panics if `block_size == 0` or `max_blocks == 0`.
    pub fn new(block_size: usize, max_blocks: usize, max_cached_blocks: usize) -> Self {
        assert!(block_size > 0, "block_size must be positive");
        assert!(max_blocks >= 1, "max_blocks must be at least 1");
        Self {
            inner: Mutex::new(Inner {
                block_size,
                max_blocks,
                max_cached_blocks,
                free: Vec::new(),
                allocated: 0,
            }),
        }
    }

    pub fn block_size(&self) -> usize {
        self.inner.lock().block_size
    }

    /// Appends `count` freshly allocated or recycled blocks to `list`.
    ///
    /// Fails with [`Error::OutOfSpace`] if doing so would push the disk's
    /// total allocated-block count past `max_blocks`; in that case `list` is
    /// left unchanged.
    pub fn allocate(&self, list: &mut Vec<Block>, count: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.allocated + count > inner.max_blocks {
            tracing::warn!(
                requested = count,
                allocated = inner.allocated,
                max_blocks = inner.max_blocks,
                "heap disk allocation would exceed capacity"
            );
            return Err(Error::OutOfSpace);
        }

        let block_size = inner.block_size;
        let mut acquired = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(mut block) = inner.free.pop() {
                block.zero_fill();
                acquired.push(block);
            } else {
                acquired.push(Block::zeroed(block_size));
            }
        }
        inner.allocated += count;
        tracing::trace!(allocated = inner.allocated, cached = inner.free.len(), "disk allocate");
        list.extend(acquired);
        Ok(())
    }

    /// Removes the last `count` blocks from `list`, caching up to the
    /// remaining free-cache capacity and discarding the rest.
    pub fn free(&self, list: &mut Vec<Block>, count: usize) {
        let count = count.min(list.len());
        if count == 0 {
            return;
        }
        let drained: Vec<Block> = list.split_off(list.len() - count);

        let mut inner = self.inner.lock();
        let cache_room = inner.max_cached_blocks.saturating_sub(inner.free.len());
        for (i, block) in drained.into_iter().enumerate() {
            if i < cache_room {
                inner.free.push(block);
            }
        }
        inner.allocated -= count;
        tracing::trace!(allocated = inner.allocated, cached = inner.free.len(), "disk free");
    }

    /// Total addressable space, `max_blocks * block_size`.
    pub fn total_space(&self) -> u64 {
        let inner = self.inner.lock();
        inner.max_blocks as u64 * inner.block_size as u64
    }

    /// Space not currently allocated to any byte store,
    /// `(max_blocks - allocated) * block_size`.
    pub fn unallocated_space(&self) -> u64 {
        let inner = self.inner.lock();
        (inner.max_blocks - inner.allocated) as u64 * inner.block_size as u64
    }

    pub fn allocated_blocks(&self) -> usize {
        self.inner.lock().allocated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_free_round_trip_accounting() {
        let disk = HeapDisk::new(64, 4, 4);
        let mut list = Vec::new();

        disk.allocate(&mut list, 4).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(disk.unallocated_space(), 0);

        disk.free(&mut list, 4);
        assert!(list.is_empty());
        assert_eq!(disk.unallocated_space(), 256);
    }

    #[test]
    fn allocate_beyond_cap_fails_and_leaves_state_unchanged() {
        let disk = HeapDisk::new(64, 4, 4);
        let mut list = Vec::new();

        disk.allocate(&mut list, 4).unwrap();
        assert!(matches!(disk.allocate(&mut list, 1), Err(Error::OutOfSpace)));
        assert_eq!(list.len(), 4);
        assert_eq!(disk.allocated_blocks(), 4);
    }

    #[test]
    fn freed_blocks_are_recycled_and_zeroed() {
        let disk = HeapDisk::new(8, 2, 2);
        let mut list = Vec::new();
        disk.allocate(&mut list, 1).unwrap();
        list[0].as_mut_slice().copy_from_slice(b"deadbeef");

        disk.free(&mut list, 1);
        disk.allocate(&mut list, 1).unwrap();
        assert_eq!(list[0].as_slice(), &[0u8; 8]);
    }

    #[test]
    fn cache_cap_discards_excess_freed_blocks() {
        let disk = HeapDisk::new(8, 4, 1);
        let mut list = Vec::new();
        disk.allocate(&mut list, 3).unwrap();

        disk.free(&mut list, 3);
        // Only one block could be cached; the disk should still report the
        // other two as unallocated but not retrievable from cache capacity.
        assert_eq!(disk.allocated_blocks(), 0);
        assert_eq!(disk.unallocated_space(), 32);
    }
}
