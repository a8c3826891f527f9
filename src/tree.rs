//! Defines [`FileTree`], the symbolic-link-aware path resolution algorithm
//! layered over an [`InodeArena`] and a tree of [`DirectoryTable`]s.
//!
//! Grounded on `rcore-fs`'s `INode::lookup_follow`, which walks a path one
//! component at a time and, on hitting a symlink, re-splices the link's
//! target in front of the remaining path components. This implementation
//! takes the same approach but recurses per-symlink instead of rewriting a
//! path string, and caps the recursion at [`MAX_SYMLINK_DEPTH`] the way that
//! implementation caps its `follow_times` counter.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::inode::InodeArena;
use crate::name::Name;
use crate::path::Path;

/// Matches most POSIX resolution behavior: a symlink chain longer than this
/// fails with [`Error::TooManyLinks`] rather than looping forever.
pub const MAX_SYMLINK_DEPTH: u32 = 10;

/// Whether the final path component should be followed if it names a
/// symbolic link. Intermediate components are always followed regardless
/// of this setting -- only the terminal component's handling is optional,
/// matching `open(2)`'s `O_NOFOLLOW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHandling {
    Follow,
    NoFollow,
}

/// Resolves [`Path`]s to inode arena keys against one file store's roots.
///
/// A store may expose more than one root directory (the super-root model:
/// a single `"/"` for a Unix-like store, or `"C:/"`, `"D:/"`, ... for a
/// Windows-like one), each keyed by its [`Name`]. Every lookup is handed the
/// arena it should traverse explicitly (callers hold the file store's read
/// or write lock, see [`crate::filestore::FileStore`]), so `FileTree` itself
/// does no locking.
pub struct FileTree {
    roots: HashMap<Name, usize>,
    default_root_key: usize,
}

impl FileTree {
    /// A tree with exactly one root, named `root_name`.
    pub fn single(root_name: Name, root_key: usize) -> Self {
        let mut roots = HashMap::new();
        roots.insert(root_name, root_key);
        Self { roots, default_root_key: root_key }
    }

    /// A tree with one root directory per entry of `roots`. `default_root_key`
    /// (one of `roots`' values) is used as the base for lookups that ignore
    /// the tree's roots entirely, i.e. the default working directory handed
    /// out by [`crate::view::FileSystemView::new`].
    pub fn new(roots: HashMap<Name, usize>, default_root_key: usize) -> Self {
        Self { roots, default_root_key }
    }

    /// The default root's key, used as the initial working directory.
    pub fn root_key(&self) -> usize {
        self.default_root_key
    }

    /// Whether `key` names one of this tree's root directories.
    pub fn is_root(&self, key: usize) -> bool {
        self.roots.values().any(|&k| k == key)
    }

    /// The arena key of the root directory named `name`, or
    /// [`Error::ProviderMismatch`] if no such root exists: an absolute path
    /// whose root token this tree never configured is, by definition, a path
    /// from another file-system instance (spec: "ProviderMismatch -- path
    /// from another file-system instance").
    pub fn resolve_root(&self, name: &Name) -> Result<usize> {
        self.roots.get(name).copied().ok_or(Error::ProviderMismatch)
    }

    /// The name a root key was registered under, if `key` is in fact a root.
    pub fn name_for_root(&self, key: usize) -> Option<&Name> {
        self.roots.iter().find(|(_, &k)| k == key).map(|(name, _)| name)
    }

    /// Resolves `path` starting from `base_key` (the working directory, for
    /// a relative path; ignored in favor of `path`'s own root for an
    /// absolute one).
    pub fn lookup(&self, arena: &InodeArena, base_key: usize, path: &Path, link_handling: LinkHandling) -> Result<usize> {
        let base = if path.is_absolute() { self.resolve_root(path.root().unwrap())? } else { base_key };
        let mut depth = 0u32;
        self.resolve(arena, base, path.names(), link_handling, &mut depth)
    }

    /// Resolves all but the final component of `path` (always following
    /// symlinks along the way), returning the parent directory's key and
    /// the final component's name, unresolved.
    pub fn lookup_parent(&self, arena: &InodeArena, base_key: usize, path: &Path) -> Result<(usize, Name)> {
        let names = path.names();
        let Some((last, prefix)) = names.split_last() else {
            return Err(Error::Invalid("path has no final component".into()));
        };
        let base = if path.is_absolute() { self.resolve_root(path.root().unwrap())? } else { base_key };
        let mut depth = 0u32;
        let parent = self.resolve(arena, base, prefix, LinkHandling::Follow, &mut depth)?;
        Ok((parent, last.clone()))
    }

    fn resolve(
        &self,
        arena: &InodeArena,
        base_key: usize,
        names: &[Name],
        link_handling: LinkHandling,
        depth: &mut u32,
    ) -> Result<usize> {
        if names.len() == 1 && names[0].display().is_empty() {
            return Ok(base_key);
        }

        let mut current = base_key;
        for (i, name) in names.iter().enumerate() {
            let is_last = i == names.len() - 1;
            let dir = arena.get(current)?.as_directory()?;
            let next = dir.get(name).ok_or(Error::NotFound)?;
            let next_inode = arena.get(next)?;

            if next_inode.is_symbolic_link() && (!is_last || link_handling == LinkHandling::Follow) {
                *depth += 1;
                if *depth > MAX_SYMLINK_DEPTH {
                    tracing::warn!(name = %name, depth = *depth, "symlink chain exceeded MAX_SYMLINK_DEPTH");
                    return Err(Error::TooManyLinks);
                }
                tracing::trace!(name = %name, depth = *depth, "following symlink during lookup");
                let target = next_inode.as_symlink()?.clone();
                let target_base = if target.is_absolute() { self.resolve_root(target.root().unwrap())? } else { current };
                current = self.resolve(arena, target_base, target.names(), LinkHandling::Follow, depth)?;
            } else {
                current = next;
            }
        }
        Ok(current)
    }
}

/// Fails unless `key` refers to an existing inode.
pub fn require_exists(arena: &InodeArena, key: usize) -> Result<()> {
    if arena.contains(key) {
        Ok(())
    } else {
        Err(Error::NotFound)
    }
}

/// Fails if looking up `name` under `parent_key` would succeed (used by
/// create operations before an `AlreadyExists` check makes sense to run).
pub fn require_does_not_exist(arena: &InodeArena, parent_key: usize, name: &Name) -> Result<()> {
    let dir = arena.get(parent_key)?.as_directory()?;
    if dir.contains(name) {
        Err(Error::AlreadyExists)
    } else {
        Ok(())
    }
}

pub fn require_directory(arena: &InodeArena, key: usize) -> Result<()> {
    arena.get(key)?.as_directory().map(|_| ())
}

pub fn require_symbolic_link(arena: &InodeArena, key: usize) -> Result<()> {
    arena.get(key)?.as_symlink().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::DirectoryTable;
    use crate::inode::{Inode, InodeContent};
    use crate::name::{Name, Normalization};
    use std::time::SystemTime;

    fn n(s: &str) -> Name {
        Name::new(s, Normalization::default())
    }

    fn setup() -> (InodeArena, FileTree, usize, usize) {
        let mut arena = InodeArena::new();
        let root_key = arena.insert(Inode::new(InodeContent::Directory(DirectoryTable::new(0, 0)), SystemTime::UNIX_EPOCH));
        arena.get_mut(root_key).unwrap().as_directory_mut().unwrap().set_root();

        let sub_key = arena.insert(Inode::new(InodeContent::Directory(DirectoryTable::new(1, root_key)), SystemTime::UNIX_EPOCH));
        arena.get_mut(root_key).unwrap().as_directory_mut().unwrap().link(n("sub"), sub_key).unwrap();

        let file_key = arena.insert(Inode::new(InodeContent::Regular(std::sync::Arc::new(
            crate::store::ByteStore::new(std::sync::Arc::new(crate::disk::HeapDisk::new(64, 8, 8))),
        )), SystemTime::UNIX_EPOCH));
        arena.get_mut(sub_key).unwrap().as_directory_mut().unwrap().link(n("file.txt"), file_key).unwrap();

        let tree = FileTree::single(n("/"), root_key);
        (arena, tree, root_key, file_key)
    }

    #[test]
    fn resolves_absolute_path_through_subdirectory() {
        let (arena, tree, root_key, file_key) = setup();
        let path = Path::absolute(n("/"), vec![n("sub"), n("file.txt")]);
        assert_eq!(tree.lookup(&arena, root_key, &path, LinkHandling::Follow).unwrap(), file_key);
    }

    #[test]
    fn missing_component_is_not_found() {
        let (arena, tree, root_key, _) = setup();
        let path = Path::absolute(n("/"), vec![n("nope")]);
        assert!(matches!(tree.lookup(&arena, root_key, &path, LinkHandling::Follow), Err(Error::NotFound)));
    }

    #[test]
    fn walking_through_a_file_is_not_a_directory() {
        let (arena, tree, root_key, _) = setup();
        let path = Path::absolute(n("/"), vec![n("sub"), n("file.txt"), n("oops")]);
        assert!(matches!(tree.lookup(&arena, root_key, &path, LinkHandling::Follow), Err(Error::NotDirectory)));
    }

    #[test]
    fn symlink_cycle_hits_depth_cap() {
        let mut arena = InodeArena::new();
        let root_key = arena.insert(Inode::new(InodeContent::Directory(DirectoryTable::new(0, 0)), SystemTime::UNIX_EPOCH));
        arena.get_mut(root_key).unwrap().as_directory_mut().unwrap().set_root();

        let link_target = Path::absolute(n("/"), vec![n("loop")]);
        let link_key = arena.insert(Inode::new(InodeContent::Symlink(link_target), SystemTime::UNIX_EPOCH));
        arena.get_mut(root_key).unwrap().as_directory_mut().unwrap().link(n("loop"), link_key).unwrap();

        let tree = FileTree::single(n("/"), root_key);
        let path = Path::absolute(n("/"), vec![n("loop")]);
        assert!(matches!(tree.lookup(&arena, root_key, &path, LinkHandling::Follow), Err(Error::TooManyLinks)));
    }

    #[test]
    fn nofollow_on_final_component_returns_the_link_itself() {
        let mut arena = InodeArena::new();
        let root_key = arena.insert(Inode::new(InodeContent::Directory(DirectoryTable::new(0, 0)), SystemTime::UNIX_EPOCH));
        arena.get_mut(root_key).unwrap().as_directory_mut().unwrap().set_root();

        let target = Path::absolute(n("/"), vec![n("somewhere")]);
        let link_key = arena.insert(Inode::new(InodeContent::Symlink(target), SystemTime::UNIX_EPOCH));
        arena.get_mut(root_key).unwrap().as_directory_mut().unwrap().link(n("link"), link_key).unwrap();

        let tree = FileTree::single(n("/"), root_key);
        let path = Path::absolute(n("/"), vec![n("link")]);
        assert_eq!(tree.lookup(&arena, root_key, &path, LinkHandling::NoFollow).unwrap(), link_key);
    }

    #[test]
    fn lookup_parent_splits_final_component() {
        let (arena, tree, root_key, _) = setup();
        let path = Path::absolute(n("/"), vec![n("sub"), n("new_file")]);
        let (parent, last) = tree.lookup_parent(&arena, root_key, &path).unwrap();
        assert_eq!(last, n("new_file"));
        assert!(arena.get(parent).unwrap().as_directory().unwrap().contains(&n("file.txt")));
    }
}
