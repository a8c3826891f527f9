//! Defines [`Configuration`], the entry point for building a file store and
//! its default view.
//!
//! Grounded on the teacher's `main`/server-setup wiring (a handful of
//! tunables assembled into the running `Vfs`), replacing the teacher's
//! socket-bind parameters with the disk and normalization knobs this
//! library's [`crate::filestore::FileStore`] actually needs.

use std::collections::HashSet;
use std::sync::Arc;

use crate::disk::HeapDisk;
use crate::error::{Error, Result};
use crate::filestore::FileStore;
use crate::name::{CaseSensitivity, Name, Normalization, UnicodeNormalization};
use crate::service::PathService;
use crate::view::FileSystemView;

/// Tunables for building a [`FileStore`]. Construct via [`Configuration::unix`]
/// or [`Configuration::windows`] and adjust fields before calling
/// [`Configuration::build`], or build one from scratch with
/// [`Configuration::new`].
///
/// `roots` lists the root directories the resulting store exposes (spec:
/// "Root configuration" -- a single-root Unix-like store passes `["/"]`;
/// a multi-root Windows-like store passes one string per drive, e.g.
/// `["C:/", "D:/"]`). The first entry becomes the default working directory.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub roots: Vec<String>,
    pub block_size: usize,
    pub max_blocks: usize,
    pub max_cached_blocks: usize,
    pub normalization: Normalization,
}

impl Configuration {
    pub fn new(roots: Vec<String>, block_size: usize, max_blocks: usize, max_cached_blocks: usize, normalization: Normalization) -> Self {
        Self { roots, block_size, max_blocks, max_cached_blocks, normalization }
    }

    /// A configuration with POSIX defaults: a single `"/"` root,
    /// case-sensitive names, no Unicode folding, 8 KiB blocks, and a
    /// generous default capacity (roughly 4 GiB addressable, entirely in
    /// memory and lazily allocated -- see [`crate::disk::HeapDisk`]).
    pub fn unix() -> Self {
        Self::new(
            vec!["/".to_owned()],
            8192,
            512 * 1024,
            1024,
            Normalization { case_sensitivity: CaseSensitivity::Sensitive, unicode: UnicodeNormalization::None },
        )
    }

    /// A configuration with Windows-ish defaults: one root per drive letter
    /// in `drives` (e.g. `&["C:/", "D:/"]`), ASCII case-insensitive names,
    /// otherwise identical to [`Configuration::unix`].
    pub fn windows(drives: &[&str]) -> Self {
        Self::new(
            drives.iter().map(|s| (*s).to_owned()).collect(),
            8192,
            512 * 1024,
            1024,
            Normalization { case_sensitivity: CaseSensitivity::AsciiInsensitive, unicode: UnicodeNormalization::None },
        )
    }

    /// A [`PathService`] consistent with this configuration's roots and
    /// normalization, for parsing and formatting paths handed to the
    /// resulting view.
    pub fn path_service(&self) -> PathService {
        let roots = self.root_names();
        PathService::new(self.normalization, roots)
    }

    fn root_names(&self) -> Vec<Name> {
        self.roots.iter().map(|r| Name::new(r.clone(), self.normalization)).collect()
    }

    /// Builds the file store and a [`FileSystemView`] rooted at its first
    /// root directory.
    ///
    /// Fails with [`Error::Invalid`] if `roots` is empty or names the same
    /// root twice under this configuration's normalization.
    pub fn build(self) -> Result<(Arc<FileStore>, FileSystemView)> {
        if self.roots.is_empty() {
            return Err(Error::Invalid("configuration must name at least one root".into()));
        }
        let root_names = self.root_names();
        let mut seen = HashSet::new();
        for name in &root_names {
            if !seen.insert(name.canonical().to_owned()) {
                return Err(Error::Invalid(format!("duplicate root '{name}'")));
            }
        }
        let disk = Arc::new(HeapDisk::new(self.block_size, self.max_blocks, self.max_cached_blocks));
        let store = Arc::new(FileStore::with_roots(disk, root_names));
        let view = FileSystemView::new(store.clone());
        Ok((store, view))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::unix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_config_builds_a_usable_store() {
        let (store, view) = Configuration::unix().build().unwrap();
        assert_eq!(store.root_key(), view.working_directory_key());
    }

    #[test]
    fn windows_config_is_case_insensitive() {
        let service = Configuration::windows(&["C:/"]).path_service();
        let a = service.parse("C:/Documents");
        let b = service.parse("C:/documents");
        assert_eq!(a, b);
    }

    #[test]
    fn windows_config_exposes_one_root_per_drive() {
        let (store, _) = Configuration::windows(&["C:/", "D:/"]).build().unwrap();
        let tree = store.tree();
        let norm = Normalization { case_sensitivity: CaseSensitivity::AsciiInsensitive, unicode: UnicodeNormalization::None };
        let c_key = tree.resolve_root(&Name::new("C:/", norm)).unwrap();
        let d_key = tree.resolve_root(&Name::new("D:/", norm)).unwrap();
        assert_ne!(c_key, d_key);
    }

    #[test]
    fn empty_roots_is_rejected() {
        let config = Configuration::new(vec![], 512, 64, 16, Normalization::default());
        assert!(matches!(config.build(), Err(Error::Invalid(_))));
    }

    #[test]
    fn duplicate_roots_are_rejected() {
        let config = Configuration::new(vec!["/".to_owned(), "/".to_owned()], 512, 64, 16, Normalization::default());
        assert!(matches!(config.build(), Err(Error::Invalid(_))));
    }
}
