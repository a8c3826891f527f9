//! Defines [`FileStore`], the root object owning one file store's disk,
//! inode arena, and root directory.
//!
//! Grounded on the teacher's overall `Vfs` trait boundary (one object owning
//! "the" file system state that every operation is dispatched against), but
//! where the teacher dispatches NFS procedures directly on that boundary,
//! here it is a thin lock-holding shell: all operation logic lives in
//! [`crate::view`], which borrows the arena out from under this lock for the
//! duration of one call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{RwLock, RwLockWriteGuard};

use crate::dir::DirectoryTable;
use crate::disk::HeapDisk;
use crate::inode::{Inode, InodeArena, InodeContent};
use crate::name::{Name, Normalization};
use crate::tree::FileTree;

/// One file store: a disk, the arena of inodes it backs, and the directory
/// tree woven through that arena.
///
/// The root's own arena key never changes after construction, so
/// [`FileTree`] is kept outside the lock; only the arena (which embeds every
/// [`crate::dir::DirectoryTable`]) needs mutual exclusion.
pub struct FileStore {
    disk: Arc<HeapDisk>,
    tree: FileTree,
    arena: RwLock<InodeArena>,
}

impl FileStore {
    /// Creates a new, empty file store backed by `disk`, with a single
    /// freshly created root directory named `"/"`.
    pub fn new(disk: Arc<HeapDisk>) -> Self {
        Self::with_roots(disk, vec![Name::new("/", Normalization::default())])
    }

    /// Creates a new, empty file store backed by `disk`, with one freshly
    /// created root directory per entry of `root_names` -- the super-root
    /// model a multi-root (Windows-like `"C:/"`, `"D:/"`, ...) configuration
    /// needs, alongside the single-root case [`FileStore::new`] covers.
    /// `root_names` must be non-empty; its first entry becomes the default
    /// working directory handed out by [`crate::view::FileSystemView::new`].
    pub fn with_roots(disk: Arc<HeapDisk>, root_names: Vec<Name>) -> Self {
        assert!(!root_names.is_empty(), "a file store needs at least one root");
        let now = SystemTime::now();
        let mut arena = InodeArena::new();
        let mut roots = HashMap::new();
        let mut default_root_key = None;
        for name in root_names {
            let key = arena.insert_with(|key| {
                let mut table = DirectoryTable::new(key, key);
                table.set_root();
                Inode::new(InodeContent::Directory(table), now)
            });
            default_root_key.get_or_insert(key);
            roots.insert(name, key);
        }
        let tree = FileTree::new(roots, default_root_key.expect("root_names is non-empty"));
        Self { disk, tree, arena: RwLock::new(arena) }
    }

    pub fn disk(&self) -> &Arc<HeapDisk> {
        &self.disk
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn root_key(&self) -> usize {
        self.tree.root_key()
    }

    /// Whether `key` names one of this store's root directories.
    pub fn is_root(&self, key: usize) -> bool {
        self.tree.is_root(key)
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, InodeArena> {
        self.arena.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, InodeArena> {
        self.arena.write()
    }

    fn try_write(&self) -> Option<RwLockWriteGuard<'_, InodeArena>> {
        self.arena.try_write()
    }

    /// Acquires write access to `a` and `b` together, safely handling the
    /// case where they are in fact the same store.
    ///
    /// For two distinct stores, uses a try-lock back-off: lock `a`, try-lock
    /// `b`; on failure, release `a`, lock `b`, try-lock `a`. Repeating this
    /// with the roles swapped each round avoids the classic two-lock
    /// deadlock without requiring a global store ordering.
    pub fn lock_pair_for_write<'a>(a: &'a FileStore, b: &'a FileStore) -> DualWriteGuard<'a> {
        if std::ptr::eq(a, b) {
            return DualWriteGuard::Same(a.write());
        }
        let mut rounds = 0u32;
        loop {
            let guard_a = a.write();
            if let Some(guard_b) = b.try_write() {
                return DualWriteGuard::Distinct(guard_a, guard_b);
            }
            drop(guard_a);

            let guard_b = b.write();
            if let Some(guard_a) = a.try_write() {
                return DualWriteGuard::Distinct(guard_a, guard_b);
            }
            drop(guard_b);

            rounds += 1;
            tracing::trace!(rounds, "cross-store write-lock back-off retrying");
        }
    }
}

/// The result of [`FileStore::lock_pair_for_write`]: either one guard shared
/// by both roles (same store on both sides of a move/copy) or two distinct
/// guards. Callers match on this directly rather than being handed a
/// uniform two-`&mut` view, since the `Same` case cannot offer two live
/// mutable borrows of the one underlying arena at once.
pub enum DualWriteGuard<'a> {
    Same(RwLockWriteGuard<'a, InodeArena>),
    Distinct(RwLockWriteGuard<'a, InodeArena>, RwLockWriteGuard<'a, InodeArena>),
}
