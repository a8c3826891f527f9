//! `create_directory`, `create_symlink`, and `open` (which creates a
//! regular file on demand per its [`OpenOptions`]).
//!
//! Grounded on the teacher's `vfs::create` / `vfs::mk_dir` / `vfs::symlink`
//! (each an `Args`/`Success`/`Fail` triple over a parent file id and a
//! name) for the create-under-parent shape, generalized here into plain
//! methods over [`Path`].

use std::sync::Arc;
use std::time::SystemTime;

use super::{FileSystemView, OpenOptions};
use crate::dir::DirectoryTable;
use crate::error::{Error, Result};
use crate::inode::{Inode, InodeContent, InodeTimes};
use crate::path::Path;
use crate::store::ByteStore;

impl FileSystemView {
    /// Creates an empty directory at `path`. Fails with
    /// [`Error::AlreadyExists`] if something is already there, or
    /// [`Error::NotFound`] if the parent does not exist.
    #[tracing::instrument(skip_all, fields(op = "create_directory", path = %path))]
    pub fn create_directory(&self, path: &Path) -> Result<()> {
        let mut arena = self.store.write();
        let (parent_key, name) = self.store.tree().lookup_parent(&arena, self.cwd_key, path)?;
        crate::tree::require_does_not_exist(&arena, parent_key, &name)?;

        let now = SystemTime::now();
        let new_key = arena.insert_with(|key| {
            let mut inode = Inode::new(InodeContent::Directory(DirectoryTable::new(key, parent_key)), now);
            inode.increment_link_count();
            inode
        });
        if let Err(e) = arena.get_mut(parent_key)?.as_directory_mut()?.link(name, new_key) {
            arena.remove(new_key);
            return Err(e);
        }
        arena.get_mut(parent_key)?.set_last_modified(now);
        Ok(())
    }

    /// Creates a symbolic link at `path` pointing at `target` (stored
    /// verbatim, resolved lazily on traversal -- see [`crate::tree`]).
    #[tracing::instrument(skip_all, fields(op = "create_symlink", path = %path, target = %target))]
    pub fn create_symlink(&self, path: &Path, target: Path) -> Result<()> {
        let mut arena = self.store.write();
        let (parent_key, name) = self.store.tree().lookup_parent(&arena, self.cwd_key, path)?;
        crate::tree::require_does_not_exist(&arena, parent_key, &name)?;

        let now = SystemTime::now();
        let new_key = arena.insert_with(|_| {
            let mut inode = Inode::new(InodeContent::Symlink(target), now);
            inode.increment_link_count();
            inode
        });
        if let Err(e) = arena.get_mut(parent_key)?.as_directory_mut()?.link(name, new_key) {
            arena.remove(new_key);
            return Err(e);
        }
        arena.get_mut(parent_key)?.set_last_modified(now);
        Ok(())
    }

    /// Opens (and, depending on `options`, creates or truncates) the
    /// regular file at `path`, returning its backing [`ByteStore`] and
    /// arena key. The caller is responsible for wrapping the store in a
    /// [`crate::channel::SeekableByteChannel`] and for calling
    /// [`ByteStore::opened`]/[`ByteStore::closed`] around its lifetime,
    /// which this method does on the caller's behalf.
    #[tracing::instrument(skip_all, fields(op = "open", path = %path, options = ?options))]
    pub fn open(&self, path: &Path, options: OpenOptions) -> Result<(Arc<ByteStore>, usize, Arc<InodeTimes>)> {
        if !options.intersects(OpenOptions::READ | OpenOptions::WRITE | OpenOptions::APPEND) {
            return Err(Error::Invalid("open requires at least one of READ, WRITE, or APPEND".into()));
        }

        let mut arena = self.store.write();
        let (parent_key, name) = self.store.tree().lookup_parent(&arena, self.cwd_key, path)?;
        let existing = arena.get(parent_key)?.as_directory()?.get(&name);

        let file_key = match existing {
            Some(key) => {
                if options.contains(OpenOptions::CREATE_NEW) {
                    return Err(Error::AlreadyExists);
                }
                let resolved = if arena.get(key)?.is_symbolic_link() {
                    self.store.tree().lookup(&arena, self.cwd_key, path, options.link_handling())?
                } else {
                    key
                };
                if !arena.get(resolved)?.is_regular_file() {
                    return Err(Error::NotRegularFile);
                }
                resolved
            }
            None => {
                if !options.contains(OpenOptions::CREATE) && !options.contains(OpenOptions::CREATE_NEW) {
                    return Err(Error::NotFound);
                }
                let now = SystemTime::now();
                let store = Arc::new(ByteStore::new(self.store.disk().clone()));
                let new_key = arena.insert_with(|_| {
                    let mut inode = Inode::new(InodeContent::Regular(store), now);
                    inode.increment_link_count();
                    inode
                });
                arena.get_mut(parent_key)?.as_directory_mut()?.link(name, new_key)?;
                new_key
            }
        };

        let inode = arena.get_mut(file_key)?;
        let store = inode.as_regular()?.clone();
        if options.contains(OpenOptions::TRUNCATE_EXISTING) && options.contains(OpenOptions::WRITE) {
            store.truncate(0)?;
        }
        inode.set_last_accessed(SystemTime::now());
        let times = inode.times();
        store.opened();
        Ok((store, file_key, times))
    }
}
