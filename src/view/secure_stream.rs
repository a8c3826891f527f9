//! [`SecureDirectoryStream`]: a directory handle addressed by arena key
//! rather than by path, so operations through it keep working after the
//! directory (or one of its ancestors) is renamed or moved.
//!
//! Grounded on the teacher's shadow-host `fs::state` id-mapping idea (a
//! stable id surviving path changes), reworked here around the existing
//! inode arena key rather than a second id space.

use std::sync::Arc;

use super::{DeleteMode, FileSystemView, OpenOptions};
use crate::error::Result;
use crate::filestore::FileStore;
use crate::inode::InodeTimes;
use crate::path::Path;
use crate::store::ByteStore;
use crate::tree::LinkHandling;

use super::snapshot::DirectoryEntrySnapshot;

/// A directory handle that resolves every relative path given to it against
/// the directory's actual arena key, not its path at open time.
pub struct SecureDirectoryStream {
    view: FileSystemView,
}

impl SecureDirectoryStream {
    fn new(store: Arc<FileStore>, dir_key: usize) -> Self {
        Self { view: FileSystemView::with_working_directory(store, dir_key) }
    }

    /// The arena key this stream is pinned to.
    pub fn directory_key(&self) -> usize {
        self.view.working_directory_key()
    }

    /// This directory's current canonical path (it may have moved since
    /// the stream was opened).
    pub fn current_path(&self) -> Result<Path> {
        self.view.to_real_path(&Path::relative(vec![]))
    }

    pub fn entries(&self) -> Result<Vec<DirectoryEntrySnapshot>> {
        self.view.read_directory(&Path::relative(vec![]))
    }

    pub fn open(&self, relative: &Path, options: OpenOptions) -> Result<(Arc<ByteStore>, usize, Arc<InodeTimes>)> {
        self.view.open(relative, options)
    }

    /// Removes the entry named `relative`, directory or not.
    pub fn delete(&self, relative: &Path) -> Result<()> {
        self.view.delete(relative, DeleteMode::Any)
    }

    /// Removes `relative`, failing with [`crate::error::Error::NotRegularFile`]
    /// if it names a directory.
    pub fn delete_file(&self, relative: &Path) -> Result<()> {
        self.view.delete(relative, DeleteMode::NonDirectoryOnly)
    }

    /// Removes `relative`, failing with [`crate::error::Error::NotDirectory`]
    /// if it does not name a directory.
    pub fn delete_directory(&self, relative: &Path) -> Result<()> {
        self.view.delete(relative, DeleteMode::DirectoryOnly)
    }

    pub fn create_directory(&self, relative: &Path) -> Result<()> {
        self.view.create_directory(relative)
    }

    /// Opens a nested directory as its own independent `SecureDirectoryStream`.
    pub fn new_directory_stream(&self, relative: &Path) -> Result<SecureDirectoryStream> {
        let store = self.view.store().clone();
        let key = {
            let arena = store.read();
            let key = store.tree().lookup(&arena, self.directory_key(), relative, LinkHandling::Follow)?;
            crate::tree::require_directory(&arena, key)?;
            key
        };
        Ok(SecureDirectoryStream::new(store, key))
    }
}

impl FileSystemView {
    /// Opens a [`SecureDirectoryStream`] on the directory at `path`.
    #[tracing::instrument(skip_all, fields(op = "new_secure_directory_stream", path = %path))]
    pub fn new_secure_directory_stream(&self, path: &Path) -> Result<SecureDirectoryStream> {
        let arena = self.store.read();
        let key = self.lookup(&arena, path, LinkHandling::Follow)?;
        crate::tree::require_directory(&arena, key)?;
        drop(arena);
        Ok(SecureDirectoryStream::new(self.store.clone(), key))
    }
}
