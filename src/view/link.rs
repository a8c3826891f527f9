//! `link`: creates an additional directory entry for an existing regular
//! file.
//!
//! Grounded on the teacher's `vfs::link` (`LinkArgs { file, link_dir, name
//! }` / `LinkSuccess`).

use super::FileSystemView;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::tree::LinkHandling;

impl FileSystemView {
    /// Creates a new name `link_path` for the existing regular file at
    /// `existing_path`. Directories cannot be hard-linked.
    #[tracing::instrument(skip_all, fields(op = "link", existing_path = %existing_path, link_path = %link_path))]
    pub fn link(&self, existing_path: &Path, link_path: &Path) -> Result<()> {
        let mut arena = self.store.write();
        let existing_key = self.store.tree().lookup(&arena, self.cwd_key, existing_path, LinkHandling::Follow)?;
        if !arena.get(existing_key)?.is_regular_file() {
            return Err(Error::Unsupported("only regular files can be hard-linked".into()));
        }

        let (parent_key, name) = self.store.tree().lookup_parent(&arena, self.cwd_key, link_path)?;
        crate::tree::require_does_not_exist(&arena, parent_key, &name)?;

        arena.get_mut(parent_key)?.as_directory_mut()?.link(name, existing_key)?;
        arena.get_mut(existing_key)?.increment_link_count();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::HeapDisk;
    use crate::name::Name;
    use crate::view::OpenOptions;
    use std::sync::Arc;

    fn path(names: &[&str]) -> Path {
        Path::absolute(Name::new("/", Default::default()), names.iter().map(|s| Name::new(*s, Default::default())).collect())
    }

    #[test]
    fn link_creates_second_name_sharing_content() {
        let store = Arc::new(crate::filestore::FileStore::new(Arc::new(HeapDisk::new(512, 64, 16))));
        let view = FileSystemView::new(store);

        let original = path(&["a.txt"]);
        let (data, _, _) = view.open(&original, OpenOptions::CREATE | OpenOptions::WRITE).unwrap();
        data.write_at(0, b"hello").unwrap();

        let linked = path(&["b.txt"]);
        view.link(&original, &linked).unwrap();

        let (reopened, _, _) = view.open(&linked, OpenOptions::READ).unwrap();
        let mut buf = [0u8; 5];
        reopened.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn link_rejects_directories() {
        let store = Arc::new(crate::filestore::FileStore::new(Arc::new(HeapDisk::new(512, 64, 16))));
        let view = FileSystemView::new(store);
        let dir = path(&["d"]);
        view.create_directory(&dir).unwrap();
        let link_path = path(&["d2"]);
        assert!(matches!(view.link(&dir, &link_path), Err(Error::Unsupported(_))));
    }
}
