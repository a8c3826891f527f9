//! Defines [`ByteStore`], the resizable byte container backing regular
//! files.
//!
//! Grounded on the teacher's buffer/chain/slice allocator trio
//! (`allocator::buffer`, `allocator::chain`, `allocator::slice`): a logical
//! byte sequence is spread across a list of fixed-size [`crate::disk::Block`]s
//! obtained from a shared [`crate::disk::HeapDisk`], and scatter/gather
//! access walks that list the same way `allocator::slice::Slice` walks a
//! bounded run of buffers.

use std::io::{Read, Write};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::disk::{Block, HeapDisk};
use crate::error::{Error, Result};

const INITIAL_BLOCK_CAPACITY: usize = 32;

struct Inner {
    blocks: Vec<Block>,
    size: u64,
}

/// Tracks the open-handle count and deleted flag for a [`ByteStore`].
///
/// Deliberately a separate lock from the byte data (spec §4.3/§5: "Open-count
/// / deleted are protected by a monitor separate from the read/write lock --
/// they intentionally serialize only with each other and with delete").
struct OpenState {
    open_count: u64,
    deleted: bool,
}

/// A resizable, block-backed byte container.
///
/// All reads take the store's read lock; all writes and truncation take the
/// write lock. The store does not know about file names or directory
/// structure -- it is pure content, referenced by exactly one
/// [`crate::inode::Inode`].
pub struct ByteStore {
    disk: Arc<HeapDisk>,
    inner: RwLock<Inner>,
    open: Mutex<OpenState>,
}

impl ByteStore {
    /// Creates an empty store backed by `disk`, pre-sized for
    /// [`INITIAL_BLOCK_CAPACITY`] blocks (no blocks are actually allocated
    /// until the first write).
    pub fn new(disk: Arc<HeapDisk>) -> Self {
        Self {
            disk,
            inner: RwLock::new(Inner { blocks: Vec::with_capacity(INITIAL_BLOCK_CAPACITY), size: 0 }),
            open: Mutex::new(OpenState { open_count: 0, deleted: false }),
        }
    }

    pub fn size(&self) -> u64 {
        self.inner.read().size
    }

    fn block_size(&self) -> u64 {
        self.disk.block_size() as u64
    }

    /// Ensures enough blocks exist to cover bytes `[0, pos + len)`, growing
    /// the block list from the disk as needed, then zero-fills any gap
    /// between the current logical size and `pos` and advances `size` to
    /// `pos`. The caller is responsible for writing the remaining
    /// `len` bytes and extending `size` further.
    ///
    /// On allocation failure the logical size is left unchanged; any bytes
    /// that were zero-filled toward a gap that could not ultimately be
    /// covered are simply part of unused block capacity, matching the
    /// spec's allowance that such bytes are undefined.
    fn prepare_for_write(inner: &mut Inner, disk: &HeapDisk, pos: u64, len: u64) -> Result<()> {
        let block_size = disk.block_size() as u64;
        let required_end = pos + len;
        let required_blocks = required_end.div_ceil(block_size) as usize;
        if required_blocks > inner.blocks.len() {
            let deficit = required_blocks - inner.blocks.len();
            disk.allocate(&mut inner.blocks, deficit)?;
        }

        if pos > inner.size {
            Self::zero_range(inner, block_size, inner.size, pos);
            inner.size = pos;
        }
        Ok(())
    }

    fn zero_range(inner: &mut Inner, block_size: u64, start: u64, end: u64) {
        let mut offset = start;
        while offset < end {
            let block_idx = (offset / block_size) as usize;
            let block_off = (offset % block_size) as usize;
            let chunk = ((end - offset).min(block_size - block_off as u64)) as usize;
            inner.blocks[block_idx].as_mut_slice()[block_off..block_off + chunk].fill(0);
            offset += chunk as u64;
        }
    }

    /// Writes `data` starting at `pos`, growing the store as needed.
    /// Returns the number of bytes written (always `data.len()` on success;
    /// writes either fully succeed or fail with [`Error::OutOfSpace`]).
    pub fn write_at(&self, pos: u64, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let mut inner = self.inner.write();
        Self::prepare_for_write(&mut inner, &self.disk, pos, data.len() as u64)?;

        let block_size = self.block_size();
        let mut written = 0usize;
        let mut offset = pos;
        while written < data.len() {
            let block_idx = (offset / block_size) as usize;
            let block_off = (offset % block_size) as usize;
            let chunk = ((block_size - block_off as u64) as usize).min(data.len() - written);
            inner.blocks[block_idx].as_mut_slice()[block_off..block_off + chunk]
                .copy_from_slice(&data[written..written + chunk]);
            written += chunk;
            offset += chunk as u64;
        }
        inner.size = inner.size.max(pos + written as u64);
        Ok(written)
    }

    /// Scatter-write: writes each buffer in `bufs` in sequence, as if they
    /// had been concatenated, starting at `pos`.
    pub fn write_vectored_at(&self, pos: u64, bufs: &[&[u8]]) -> Result<usize> {
        let mut total = 0usize;
        let mut offset = pos;
        for buf in bufs {
            let written = self.write_at(offset, buf)?;
            total += written;
            offset += written as u64;
            if written < buf.len() {
                break;
            }
        }
        Ok(total)
    }

    /// Reads up to `buf.len()` bytes starting at `pos`. Returns `None` if
    /// `pos` is at or past the current size (end of file); otherwise
    /// returns the number of bytes copied, which may be less than
    /// `buf.len()` if the store's size is reached first.
    pub fn read_at(&self, pos: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        let inner = self.inner.read();
        if pos >= inner.size {
            return Ok(None);
        }
        let available = (inner.size - pos).min(buf.len() as u64) as usize;
        let block_size = self.block_size();
        let mut read = 0usize;
        let mut offset = pos;
        while read < available {
            let block_idx = (offset / block_size) as usize;
            let block_off = (offset % block_size) as usize;
            let chunk = ((block_size - block_off as u64) as usize).min(available - read);
            buf[read..read + chunk]
                .copy_from_slice(&inner.blocks[block_idx].as_slice()[block_off..block_off + chunk]);
            read += chunk;
            offset += chunk as u64;
        }
        Ok(Some(read))
    }

    /// Gather-read: fills each buffer in `bufs` in turn, stopping at the
    /// first short read (including an immediate EOF).
    pub fn read_vectored_at(&self, pos: u64, bufs: &mut [&mut [u8]]) -> Result<Option<usize>> {
        let mut total = 0usize;
        let mut offset = pos;
        let mut saw_any = false;
        for buf in bufs {
            match self.read_at(offset, buf)? {
                Some(n) => {
                    saw_any = true;
                    total += n;
                    offset += n as u64;
                    if n < buf.len() {
                        break;
                    }
                }
                None => break,
            }
        }
        Ok(if saw_any { Some(total) } else { None })
    }

    /// Reads up to `count` bytes starting at `pos` from `reader` directly
    /// into the store's blocks, growing the store as needed. Stops at
    /// `reader`'s EOF; the number of bytes actually transferred is returned
    /// (which may be less than `count`, including 0).
    pub fn transfer_from(&self, reader: &mut impl Read, pos: u64, count: u64) -> Result<u64> {
        if count == 0 {
            return Ok(0);
        }
        let mut inner = self.inner.write();
        Self::prepare_for_write(&mut inner, &self.disk, pos, count)?;

        let block_size = self.block_size();
        let mut total = 0u64;
        let mut offset = pos;
        while total < count {
            let block_idx = (offset / block_size) as usize;
            let block_off = (offset % block_size) as usize;
            let chunk = ((block_size - block_off as u64) as usize).min((count - total) as usize);
            let slice = &mut inner.blocks[block_idx].as_mut_slice()[block_off..block_off + chunk];
            let n = read_fully_partial(reader, slice)?;
            total += n as u64;
            offset += n as u64;
            if n < chunk {
                break;
            }
        }
        inner.size = inner.size.max(pos + total);
        Ok(total)
    }

    /// Writes up to `count` bytes starting at `pos` to `writer`. Unlike
    /// [`ByteStore::read_at`], does not signal EOF with a sentinel: reading
    /// past the end of the store simply transfers 0 bytes, matching
    /// `FileChannel.transferTo`'s contract.
    pub fn transfer_to(&self, pos: u64, count: u64, writer: &mut impl Write) -> Result<u64> {
        let inner = self.inner.read();
        if pos >= inner.size {
            return Ok(0);
        }
        let available = (inner.size - pos).min(count);
        let block_size = self.block_size();
        let mut total = 0u64;
        let mut offset = pos;
        while total < available {
            let block_idx = (offset / block_size) as usize;
            let block_off = (offset % block_size) as usize;
            let chunk = ((block_size - block_off as u64) as usize).min((available - total) as usize);
            let slice = &inner.blocks[block_idx].as_slice()[block_off..block_off + chunk];
            writer.write_all(slice).map_err(|_| Error::ChannelClosed)?;
            total += chunk as u64;
            offset += chunk as u64;
        }
        Ok(total)
    }

    /// Shrinks the store to `new_size`, returning freed trailing blocks to
    /// the disk. No-op (returns `false`) if `new_size >= size`.
    pub fn truncate(&self, new_size: u64) -> Result<bool> {
        let mut inner = self.inner.write();
        if new_size >= inner.size {
            return Ok(false);
        }
        let block_size = self.block_size();
        let needed_blocks = if new_size == 0 { 0 } else { new_size.div_ceil(block_size) as usize };
        let surplus = inner.blocks.len() - needed_blocks;
        if surplus > 0 {
            self.disk.free(&mut inner.blocks, surplus);
        }
        inner.size = new_size;
        Ok(true)
    }

    /// Makes an independent copy of this store's contents under the read
    /// lock, backed by a freshly allocated block list of the same size.
    pub fn copy(&self, disk: Arc<HeapDisk>) -> Result<ByteStore> {
        let inner = self.inner.read();
        let mut blocks = Vec::with_capacity(inner.blocks.len());
        if !inner.blocks.is_empty() {
            disk.allocate(&mut blocks, inner.blocks.len())?;
            for (src, dst) in inner.blocks.iter().zip(blocks.iter_mut()) {
                dst.as_mut_slice().copy_from_slice(src.as_slice());
            }
        }
        Ok(ByteStore {
            disk,
            inner: RwLock::new(Inner { blocks, size: inner.size }),
            open: Mutex::new(OpenState { open_count: 0, deleted: false }),
        })
    }

    /// Registers a new open handle against this store.
    pub fn opened(&self) {
        self.open.lock().open_count += 1;
    }

    /// Releases one open handle; if this drops the count to zero and the
    /// store has been marked deleted, its blocks are returned to the disk.
    pub fn closed(&self) {
        let mut state = self.open.lock();
        state.open_count = state.open_count.saturating_sub(1);
        if state.open_count == 0 && state.deleted {
            self.release_content();
        }
    }

    /// Marks this store for deletion. If there are no open handles, its
    /// blocks are freed immediately; otherwise they are freed by the last
    /// matching [`ByteStore::closed`] call.
    pub fn mark_deleted(&self) {
        let mut state = self.open.lock();
        state.deleted = true;
        if state.open_count == 0 {
            self.release_content();
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.open.lock().deleted
    }

    fn release_content(&self) {
        let mut inner = self.inner.write();
        let count = inner.blocks.len();
        self.disk.free(&mut inner.blocks, count);
        inner.size = 0;
    }
}

/// Reads into `buf` in a loop until it is full or `reader` hits EOF,
/// returning the number of bytes actually filled.
fn read_fully_partial(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => return Err(Error::ChannelClosed),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn disk() -> Arc<HeapDisk> {
        Arc::new(HeapDisk::new(16, 64, 64))
    }

    #[test]
    fn write_then_read_round_trips() {
        let store = ByteStore::new(disk());
        store.write_at(0, &[0, 1, 2, 3]).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(store.read_at(0, &mut buf).unwrap(), Some(4));
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(store.size(), 4);
    }

    #[test]
    fn write_past_size_zero_fills_gap() {
        let store = ByteStore::new(disk());
        store.write_at(0, &[1, 2]).unwrap();
        store.write_at(10, &[9, 9]).unwrap();

        let mut buf = [0xFFu8; 12];
        assert_eq!(store.read_at(0, &mut buf).unwrap(), Some(12));
        assert_eq!(&buf[0..2], &[1, 2]);
        assert_eq!(&buf[2..10], &[0u8; 8]);
        assert_eq!(&buf[10..12], &[9, 9]);
    }

    #[test]
    fn read_at_or_past_size_returns_none() {
        let store = ByteStore::new(disk());
        store.write_at(0, &[1, 2, 3]).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(store.read_at(3, &mut buf).unwrap(), None);
        assert_eq!(store.read_at(100, &mut buf).unwrap(), None);
    }

    #[test]
    fn truncate_larger_size_is_noop() {
        let store = ByteStore::new(disk());
        store.write_at(0, &[1, 2, 3]).unwrap();
        assert!(!store.truncate(10).unwrap());
        assert_eq!(store.size(), 3);
    }

    #[test]
    fn truncate_smaller_frees_blocks_and_shrinks() {
        let disk = disk();
        let store = ByteStore::new(disk.clone());
        store.write_at(0, &[1u8; 40]).unwrap();
        assert!(store.truncate(5).unwrap());
        assert_eq!(store.size(), 5);
        let mut buf = [0u8; 5];
        assert_eq!(store.read_at(0, &mut buf).unwrap(), Some(5));
        assert_eq!(buf, [1, 1, 1, 1, 1]);
    }

    #[test]
    fn out_of_space_leaves_size_unchanged() {
        let disk = Arc::new(HeapDisk::new(8, 1, 1));
        let store = ByteStore::new(disk);
        assert!(store.write_at(0, &[0u8; 8]).is_ok());
        assert!(matches!(store.write_at(8, &[0u8; 8]), Err(Error::OutOfSpace)));
        assert_eq!(store.size(), 8);
    }

    #[test]
    fn transfer_from_and_to_channel() {
        let store = ByteStore::new(disk());
        let mut source = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let written = store.transfer_from(&mut source, 0, 5).unwrap();
        assert_eq!(written, 5);

        let mut sink = Vec::new();
        let sent = store.transfer_to(0, 100, &mut sink).unwrap();
        assert_eq!(sent, 5);
        assert_eq!(sink, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn transfer_to_past_eof_returns_zero_not_error() {
        let store = ByteStore::new(disk());
        store.write_at(0, &[1, 2, 3]).unwrap();
        let mut sink = Vec::new();
        assert_eq!(store.transfer_to(100, 10, &mut sink).unwrap(), 0);
    }

    #[test]
    fn copy_produces_independent_store() {
        let disk = disk();
        let store = ByteStore::new(disk.clone());
        store.write_at(0, &[7, 7, 7]).unwrap();

        let copy = store.copy(disk).unwrap();
        store.write_at(0, &[9, 9, 9]).unwrap();

        let mut buf = [0u8; 3];
        copy.read_at(0, &mut buf).unwrap();
        assert_eq!(buf, [7, 7, 7]);
    }

    #[test]
    fn open_close_lifecycle_frees_on_last_close_after_delete() {
        let disk = disk();
        let store = ByteStore::new(disk.clone());
        store.write_at(0, &[1u8; 16]).unwrap();
        assert_eq!(disk.allocated_blocks(), 1);

        store.opened();
        store.opened();
        store.mark_deleted();
        assert_eq!(disk.allocated_blocks(), 1, "blocks survive while handles remain open");

        store.closed();
        assert_eq!(disk.allocated_blocks(), 1, "still one handle open");

        store.closed();
        assert_eq!(disk.allocated_blocks(), 0, "blocks freed once last handle closes");
        assert_eq!(store.size(), 0);
    }
}
