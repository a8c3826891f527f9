//! Defines [`FileSystemView`], the operation-level API (create, open,
//! link, delete, copy/move, stat) layered over a [`crate::filestore::FileStore`].
//!
//! Grounded on the teacher's per-procedure module layout (`vfs::create`,
//! `vfs::remove`, `vfs::rename`, `vfs::link`, ... each its own file under
//! `src/vfs/`): this module keeps that one-file-per-operation-family split
//! (see `create.rs`, `delete.rs`, `link.rs`, `copy_move.rs`,
//! `secure_stream.rs`, `snapshot.rs`) but replaces the teacher's
//! Args/Success/Fail/Result/Promise RPC envelope with ordinary methods
//! returning [`crate::error::Result`], since there is no wire protocol here.

mod attributes;
mod copy_move;
mod create;
mod delete;
mod link;
mod secure_stream;
mod snapshot;

use std::sync::Arc;

use bitflags::bitflags;

use crate::error::Result;
use crate::filestore::FileStore;
use crate::inode::InodeArena;
use crate::path::Path;
use crate::tree::LinkHandling;

pub use delete::DeleteMode;
pub use secure_stream::SecureDirectoryStream;
pub use snapshot::DirectoryEntrySnapshot;

bitflags! {
    /// Mirrors `java.nio.file.StandardOpenOption`: governs what
    /// [`FileSystemView::open`] is permitted to do and how it should treat a
    /// missing or existing target.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenOptions: u32 {
        const READ               = 1 << 0;
        const WRITE              = 1 << 1;
        const APPEND             = 1 << 2;
        const CREATE             = 1 << 3;
        const CREATE_NEW         = 1 << 4;
        const TRUNCATE_EXISTING  = 1 << 5;
        const DELETE_ON_CLOSE    = 1 << 6;
        const NOFOLLOW_LINKS     = 1 << 7;
    }
}

bitflags! {
    /// Mirrors `java.nio.file.StandardCopyOption`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CopyOptions: u32 {
        const REPLACE_EXISTING = 1 << 0;
        const COPY_ATTRIBUTES  = 1 << 1;
        const ATOMIC_MOVE      = 1 << 2;
        const NOFOLLOW_LINKS   = 1 << 3;
    }
}

bitflags! {
    /// Options controlling link resolution of a plain stat/lookup call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LinkOptions: u32 {
        const NOFOLLOW_LINKS = 1 << 0;
    }
}

impl LinkOptions {
    pub fn handling(self) -> LinkHandling {
        if self.contains(Self::NOFOLLOW_LINKS) {
            LinkHandling::NoFollow
        } else {
            LinkHandling::Follow
        }
    }
}

impl OpenOptions {
    fn link_handling(self) -> LinkHandling {
        if self.contains(Self::NOFOLLOW_LINKS) {
            LinkHandling::NoFollow
        } else {
            LinkHandling::Follow
        }
    }
}

/// An operation-level view onto one [`FileStore`], carrying its own working
/// directory.
///
/// Cheap to clone-in-spirit (construct a new view with a different working
/// directory key) since it borrows the store via `Arc` rather than owning
/// any lock.
#[derive(Clone)]
pub struct FileSystemView {
    store: Arc<FileStore>,
    cwd_key: usize,
}

impl FileSystemView {
    /// A view rooted at `store`'s root directory.
    pub fn new(store: Arc<FileStore>) -> Self {
        let cwd_key = store.root_key();
        Self { store, cwd_key }
    }

    /// A view whose working directory is the directory at `cwd_key`, used
    /// internally by [`SecureDirectoryStream`] to build a view scoped to an
    /// already-resolved directory.
    pub fn with_working_directory(store: Arc<FileStore>, cwd_key: usize) -> Self {
        Self { store, cwd_key }
    }

    pub fn store(&self) -> &Arc<FileStore> {
        &self.store
    }

    pub fn working_directory_key(&self) -> usize {
        self.cwd_key
    }

    fn lookup(&self, arena: &InodeArena, path: &Path, link_handling: LinkHandling) -> Result<usize> {
        self.store.tree().lookup(arena, self.cwd_key, path, link_handling)
    }

    /// Resolves `path` to its canonical absolute form by following every
    /// symlink in it and walking `..`/`.` away, including the final
    /// component.
    ///
    /// Unlike [`Self::lookup`], this tracks the real name stack as it walks
    /// rather than resolving to a key and walking `..` back up afterward --
    /// a non-directory target (a regular file or a symlink) has no stored
    /// parent pointer to walk back through, only directories do (see
    /// [`crate::dir::DirectoryTable::parent_key`]).
    #[tracing::instrument(skip_all, fields(op = "to_real_path", path = %path))]
    pub fn to_real_path(&self, path: &Path) -> Result<Path> {
        let arena = self.store.read();
        let tree = self.store.tree();
        let (root_key, base, base_names) = if path.is_absolute() {
            let root_key = tree.resolve_root(path.root().unwrap())?;
            (root_key, root_key, Vec::new())
        } else {
            let (root_key, names) = directory_real_path_names(&arena, tree, self.cwd_key);
            (root_key, self.cwd_key, names)
        };
        let mut depth = 0u32;
        let (final_root_key, _, names) = resolve_real(&arena, tree, root_key, base, base_names, path.names(), &mut depth)?;
        let root_name = tree.name_for_root(final_root_key).ok_or(crate::error::Error::NotFound)?.clone();
        Ok(Path::absolute(root_name, names))
    }

    /// Whether `a` and `b` resolve to the same inode.
    #[tracing::instrument(skip_all, fields(op = "is_same_file", a = %a, b = %b))]
    pub fn is_same_file(&self, a: &Path, b: &Path) -> Result<bool> {
        let arena = self.store.read();
        let key_a = self.lookup(&arena, a, LinkHandling::Follow)?;
        let key_b = self.lookup(&arena, b, LinkHandling::Follow)?;
        Ok(key_a == key_b)
    }

    /// Reads the target of a symbolic link without following it.
    #[tracing::instrument(skip_all, fields(op = "read_symlink", path = %path))]
    pub fn read_symlink(&self, path: &Path) -> Result<Path> {
        let arena = self.store.read();
        let key = self.lookup(&arena, path, LinkHandling::NoFollow)?;
        Ok(arena.get(key)?.as_symlink()?.clone())
    }
}

/// Resolves `names` from `base_key`, maintaining a parallel stack of real
/// path components rather than a single key, so the result stays correct
/// even when the final component is not a directory. `.` is dropped, `..`
/// pops the last pushed component, a plain name is pushed, and a symlink
/// splices its target's own resolved stack in (replacing the whole stack
/// for an absolute target, extending the current one for a relative target).
///
/// Also tracks which root the returned stack is relative to -- an absolute
/// symlink target can name a different root than the one resolution
/// started under, so the caller cannot assume it stayed put.
fn resolve_real(
    arena: &InodeArena,
    tree: &crate::tree::FileTree,
    root_key: usize,
    base_key: usize,
    base_names: Vec<crate::name::Name>,
    names: &[crate::name::Name],
    depth: &mut u32,
) -> Result<(usize, usize, Vec<crate::name::Name>)> {
    if names.len() == 1 && names[0].display().is_empty() {
        return Ok((root_key, base_key, base_names));
    }

    let mut current = base_key;
    let mut current_root = root_key;
    let mut stack = base_names;
    for name in names {
        let dir = arena.get(current)?.as_directory()?;
        let next = dir.get(name).ok_or(crate::error::Error::NotFound)?;
        let next_inode = arena.get(next)?;
        if next_inode.is_symbolic_link() {
            *depth += 1;
            if *depth > crate::tree::MAX_SYMLINK_DEPTH {
                return Err(crate::error::Error::TooManyLinks);
            }
            let target = next_inode.as_symlink()?.clone();
            let (target_root, target_base, target_stack) = if target.is_absolute() {
                let target_root = tree.resolve_root(target.root().unwrap())?;
                (target_root, target_root, Vec::new())
            } else {
                (current_root, current, stack.clone())
            };
            let (resolved_root, resolved_key, resolved_stack) =
                resolve_real(arena, tree, target_root, target_base, target_stack, target.names(), depth)?;
            current_root = resolved_root;
            current = resolved_key;
            stack = resolved_stack;
        } else {
            current = next;
            if name.is_dot_dot() {
                stack.pop();
            } else if !name.is_dot() {
                stack.push(name.clone());
            }
        }
    }
    Ok((current_root, current, stack))
}

/// Builds the absolute name stack for a directory key by walking `..` up to
/// whichever of the tree's roots it hangs under, returning that root's key
/// alongside the names. Only ever called with keys known to name a
/// directory (a file store's working directory key, always validated by
/// [`crate::tree::require_directory`] before it is stored) -- directories
/// alone carry a stable parent pointer to walk back through (see
/// [`crate::dir::DirectoryTable::parent_key`]); a resolved file or symlink
/// target has none, which is why [`resolve_real`] tracks its stack forward
/// during resolution instead of rebuilding it after the fact.
fn directory_real_path_names(
    arena: &InodeArena,
    tree: &crate::tree::FileTree,
    mut key: usize,
) -> (usize, Vec<crate::name::Name>) {
    let mut names = Vec::new();
    while !tree.is_root(key) {
        let Ok(dir) = arena.get(key).and_then(|inode| inode.as_directory()) else {
            break;
        };
        let parent = dir.parent_key();
        if let Some(name) = name_in_parent(arena, parent, key) {
            names.push(name);
        }
        if parent == key {
            break;
        }
        key = parent;
    }
    names.reverse();
    (key, names)
}

fn name_in_parent(arena: &InodeArena, parent_key: usize, child_key: usize) -> Option<crate::name::Name> {
    let dir = arena.get(parent_key).ok()?.as_directory().ok()?;
    dir.snapshot().into_iter().find(|(_, key)| *key == child_key).map(|(name, _)| name)
}
