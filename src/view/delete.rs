//! `delete`: removes a directory entry and, once nothing else references
//! the underlying inode, the inode itself.
//!
//! Grounded on the teacher's `vfs::remove` (`RemoveArgs { dir, name }` /
//! `RemoveSuccess`), extended with the link-count and open-handle bookkeeping
//! `vfs::remove` leaves to its caller.

use super::FileSystemView;
use crate::error::{Error, Result};
use crate::inode::InodeContent;
use crate::path::Path;

/// Restricts what kind of entry [`FileSystemView::delete`] is willing to
/// remove, mirroring `SecureDirectoryStream.deleteFile`/`deleteDirectory`
/// splitting one removal primitive in two by expected target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Removes whatever is at `path`, directory or not.
    Any,
    /// Fails with [`Error::NotRegularFile`] if `path` names a directory.
    NonDirectoryOnly,
    /// Fails with [`Error::NotDirectory`] if `path` does not name a directory.
    DirectoryOnly,
}

impl FileSystemView {
    /// Removes the entry at `path`, restricted by `mode`.
    ///
    /// A non-empty directory cannot be deleted ([`Error::DirectoryNotEmpty`]).
    /// Deleting a relative path that names the working directory itself
    /// (an empty relative path) is rejected, since there is no containing
    /// directory entry to remove it from; the same path given in absolute
    /// form is permitted.
    #[tracing::instrument(skip_all, fields(op = "delete", path = %path, mode = ?mode))]
    pub fn delete(&self, path: &Path, mode: DeleteMode) -> Result<()> {
        if !path.is_absolute() && path.is_empty() {
            return Err(Error::Invalid("cannot delete the working directory by a relative path".into()));
        }

        let mut arena = self.store.write();
        let (parent_key, name) = self.store.tree().lookup_parent(&arena, self.cwd_key, path)?;
        if name.is_dot() || name.is_dot_dot() {
            return Err(Error::Invalid("cannot delete '.' or '..'".into()));
        }

        let target_key = arena.get(parent_key)?.as_directory()?.get(&name).ok_or(Error::NotFound)?;
        if self.store.is_root(target_key) {
            return Err(Error::Invalid("cannot delete a file store root".into()));
        }
        let is_directory = arena.get(target_key)?.is_directory();
        match mode {
            DeleteMode::Any => {}
            DeleteMode::NonDirectoryOnly if is_directory => return Err(Error::NotRegularFile),
            DeleteMode::DirectoryOnly if !is_directory => return Err(Error::NotDirectory),
            _ => {}
        }
        if is_directory && !arena.get(target_key)?.as_directory()?.is_empty() {
            return Err(Error::DirectoryNotEmpty);
        }

        arena.get_mut(parent_key)?.as_directory_mut()?.unlink(&name)?;
        let remaining = arena.get_mut(target_key)?.decrement_link_count();
        if remaining == 0 {
            let inode = arena.remove(target_key);
            if let InodeContent::Regular(store) = inode.content() {
                store.mark_deleted();
            }
        }
        Ok(())
    }
}
