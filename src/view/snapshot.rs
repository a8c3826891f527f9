//! Directory listing and the modified-time snapshot used to detect
//! concurrent changes to a directory being iterated.

use std::time::SystemTime;

use super::FileSystemView;
use crate::error::Result;
use crate::name::Name;
use crate::path::Path;
use crate::tree::LinkHandling;

/// One entry as returned by [`FileSystemView::read_directory`]: a name plus
/// enough of its target's type to avoid a second lookup for the common
/// "is this a directory" question.
#[derive(Debug, Clone)]
pub struct DirectoryEntrySnapshot {
    pub name: Name,
    pub key: usize,
    pub is_directory: bool,
    pub is_regular_file: bool,
    pub is_symbolic_link: bool,
}

impl FileSystemView {
    /// Lists the contents of the directory at `path`, ordered by display
    /// name (see [`crate::dir::DirectoryTable::snapshot`]).
    #[tracing::instrument(skip_all, fields(op = "read_directory", path = %path))]
    pub fn read_directory(&self, path: &Path) -> Result<Vec<DirectoryEntrySnapshot>> {
        let arena = self.store.read();
        let key = self.lookup(&arena, path, LinkHandling::Follow)?;
        let entries: Vec<DirectoryEntrySnapshot> = arena
            .get(key)?
            .as_directory()?
            .snapshot()
            .into_iter()
            .map(|(name, child_key)| {
                let inode = arena.get(child_key)?;
                Ok(DirectoryEntrySnapshot {
                    name,
                    key: child_key,
                    is_directory: inode.is_directory(),
                    is_regular_file: inode.is_regular_file(),
                    is_symbolic_link: inode.is_symbolic_link(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        arena.get(key)?.set_last_accessed(SystemTime::now());
        Ok(entries)
    }

    /// The directory's own last-modified time, usable as a cheap check for
    /// whether it has changed since an earlier [`FileSystemView::read_directory`]
    /// call (a full entry-set comparison is the caller's job if it needs
    /// more precision than the timestamp gives).
    #[tracing::instrument(skip_all, fields(op = "snapshot_modified_time", path = %path))]
    pub fn snapshot_modified_time(&self, path: &Path) -> Result<SystemTime> {
        let arena = self.store.read();
        let key = self.lookup(&arena, path, LinkHandling::Follow)?;
        let modified = arena.get(key)?.last_modified();
        arena.get(key)?.set_last_accessed(SystemTime::now());
        Ok(modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::HeapDisk;
    use crate::filestore::FileStore;
    use std::sync::Arc;

    fn path(names: &[&str]) -> Path {
        Path::absolute(Name::new("/", Default::default()), names.iter().map(|s| Name::new(*s, Default::default())).collect())
    }

    #[test]
    fn read_directory_lists_children_in_order() {
        let view = FileSystemView::new(Arc::new(FileStore::new(Arc::new(HeapDisk::new(512, 64, 16)))));
        view.create_directory(&path(&["b"])).unwrap();
        view.create_directory(&path(&["a"])).unwrap();

        let entries = view.read_directory(&path(&[])).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.display()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(entries.iter().all(|e| e.is_directory));
    }
}
