//! `copy` and `move_to`: relocate or duplicate one entry, optionally across
//! two distinct [`crate::filestore::FileStore`]s.
//!
//! Grounded on the teacher's `vfs::rename` (`RenameArgs { from_dir, from_name,
//! to_dir, to_name }`) for the parent/name pairing, generalized to also
//! cover copy (which `vfs::rename` has no equivalent for, so the duplication
//! path is grounded on `ByteStore::copy`, itself grounded on
//! `allocator::chain`'s whole-chain duplication) and to span two file
//! stores using [`FileStore::lock_pair_for_write`]'s back-off protocol.

use std::sync::Arc;
use std::time::SystemTime;

use super::{CopyOptions, FileSystemView};
use crate::dir::DirectoryTable;
use crate::disk::HeapDisk;
use crate::error::{Error, Result};
use crate::inode::{Inode, InodeArena, InodeContent};
use crate::name::Name;
use crate::path::Path;
use crate::store::ByteStore;
use crate::filestore::{DualWriteGuard, FileStore};

/// What kind of content a copy needs to materialize, captured before any
/// arena mutation so the (possibly fallible) `ByteStore::copy` call happens
/// outside the closure that finally inserts the new inode.
enum ContentPlan {
    Directory,
    Regular(ByteStore),
    Symlink(Path),
}

struct AttributeSnapshot {
    owner: String,
    group: String,
    permissions: u32,
    dos: crate::inode::DosAttributes,
    created: SystemTime,
    last_modified: SystemTime,
    last_accessed: SystemTime,
}

fn snapshot_attributes(inode: &Inode) -> AttributeSnapshot {
    AttributeSnapshot {
        owner: inode.owner().to_owned(),
        group: inode.group().to_owned(),
        permissions: inode.permissions(),
        dos: *inode.dos(),
        created: inode.created(),
        last_modified: inode.last_modified(),
        last_accessed: inode.last_accessed(),
    }
}

fn apply_non_time_attributes(inode: &mut Inode, snapshot: &AttributeSnapshot) {
    inode.set_owner(snapshot.owner.clone());
    inode.set_group(snapshot.group.clone());
    inode.set_permissions(snapshot.permissions);
    *inode.dos_mut() = snapshot.dos;
}

fn plan_for(inode: &Inode, disk: &Arc<HeapDisk>) -> Result<ContentPlan> {
    match inode.content() {
        InodeContent::Directory(_) => Ok(ContentPlan::Directory),
        InodeContent::Regular(store) => Ok(ContentPlan::Regular(store.copy(disk.clone())?)),
        InodeContent::Symlink(target) => Ok(ContentPlan::Symlink(target.clone())),
    }
}

/// Builds the destination inode for a copy or cross-store move. `times`
/// controls whether the new inode's creation/modified/access timestamps are
/// carried over from `times`'s snapshot instead of stamped with `now`;
/// `attrs` separately controls whether owner/group/permissions/dos are
/// carried over. The two are independent so a forced cross-store move can
/// carry times unconditionally while still respecting whether
/// `COPY_ATTRIBUTES` was set for the rest.
fn materialize(
    plan: ContentPlan,
    dst_parent_key: usize,
    key: usize,
    now: SystemTime,
    times: Option<&AttributeSnapshot>,
    attrs: Option<&AttributeSnapshot>,
) -> Inode {
    let content = match plan {
        ContentPlan::Directory => InodeContent::Directory(DirectoryTable::new(key, dst_parent_key)),
        ContentPlan::Regular(store) => InodeContent::Regular(Arc::new(store)),
        ContentPlan::Symlink(target) => InodeContent::Symlink(target),
    };
    let mut inode = match times {
        Some(t) => Inode::with_times(content, t.created, t.last_modified, t.last_accessed),
        None => Inode::new(content, now),
    };
    inode.increment_link_count();
    if let Some(attrs) = attrs {
        apply_non_time_attributes(&mut inode, attrs);
    }
    inode
}

/// Whether `key` is `ancestor_key` or lies anywhere under it, walking `..`
/// links up from `key`. Used to reject moving a directory into its own
/// subtree.
fn is_ancestor(arena: &InodeArena, ancestor_key: usize, mut key: usize) -> bool {
    loop {
        if key == ancestor_key {
            return true;
        }
        let Ok(dir) = arena.get(key).and_then(|i| i.as_directory()) else {
            return false;
        };
        let parent = dir.parent_key();
        if parent == key {
            return false;
        }
        key = parent;
    }
}

/// Replaces the entry named `name` in `parent_key` with `new_key`,
/// releasing the old target if this was its last link.
fn relink(arena: &mut InodeArena, parent_key: usize, name: &Name, new_key: usize) -> Result<()> {
    let existing = arena.get(parent_key)?.as_directory()?.get(name);
    match existing {
        Some(old_key) => {
            arena.get_mut(parent_key)?.as_directory_mut()?.replace(name, new_key)?;
            let remaining = arena.get_mut(old_key)?.decrement_link_count();
            if remaining == 0 {
                let inode = arena.remove(old_key);
                if let InodeContent::Regular(store) = inode.content() {
                    store.mark_deleted();
                }
            }
        }
        None => {
            arena.get_mut(parent_key)?.as_directory_mut()?.link(name.clone(), new_key)?;
        }
    }
    Ok(())
}

fn check_replace_allowed(arena: &InodeArena, parent_key: usize, name: &Name, options: CopyOptions) -> Result<()> {
    if let Some(existing) = arena.get(parent_key)?.as_directory()?.get(name) {
        if !options.contains(CopyOptions::REPLACE_EXISTING) {
            return Err(Error::AlreadyExists);
        }
        let existing_inode = arena.get(existing)?;
        if existing_inode.is_directory() && !existing_inode.as_directory()?.is_empty() {
            return Err(Error::DirectoryNotEmpty);
        }
    }
    Ok(())
}

impl FileSystemView {
    /// Copies the entry at `src_path` (in `self`'s store) to `dst_path` (in
    /// `dst_view`'s store, which may be the same store). The copy is
    /// shallow: a directory copy creates a new empty directory, it does not
    /// recurse into children.
    #[tracing::instrument(skip_all, fields(op = "copy", src_path = %src_path, dst_path = %dst_path, options = ?options))]
    pub fn copy(&self, src_path: &Path, dst_view: &FileSystemView, dst_path: &Path, options: CopyOptions) -> Result<()> {
        if options.contains(CopyOptions::ATOMIC_MOVE) {
            return Err(Error::Unsupported("ATOMIC_MOVE is not supported for copy".into()));
        }
        self.copy_internal(src_path, dst_view, dst_path, options, false)
    }

    /// Shared by [`Self::copy`] and the cross-store branch of
    /// [`Self::move_to`]. `force_times` makes the destination's
    /// creation/modified/access timestamps carry over from the source
    /// unconditionally, regardless of `CopyOptions::COPY_ATTRIBUTES` --
    /// needed because a cross-store move is implemented as copy-then-delete,
    /// and a move must preserve times even when it would not otherwise copy
    /// attributes.
    fn copy_internal(
        &self,
        src_path: &Path,
        dst_view: &FileSystemView,
        dst_path: &Path,
        options: CopyOptions,
        force_times: bool,
    ) -> Result<()> {
        match FileStore::lock_pair_for_write(self.store(), dst_view.store()) {
            DualWriteGuard::Same(mut arena) => {
                let (src_parent, src_name) = self.store.tree().lookup_parent(&arena, self.cwd_key, src_path)?;
                let src_key = arena.get(src_parent)?.as_directory()?.get(&src_name).ok_or(Error::NotFound)?;
                let (dst_parent, dst_name) =
                    self.store.tree().lookup_parent(&arena, dst_view.cwd_key, dst_path)?;
                if arena.get(dst_parent)?.as_directory()?.get(&dst_name) == Some(src_key) {
                    return Ok(());
                }
                check_replace_allowed(&arena, dst_parent, &dst_name, options)?;

                let plan = plan_for(arena.get(src_key)?, self.store.disk())?;
                let copy_attrs = options.contains(CopyOptions::COPY_ATTRIBUTES);
                let snapshot = (copy_attrs || force_times).then(|| snapshot_attributes(arena.get(src_key).unwrap()));
                let times = (copy_attrs || force_times).then(|| snapshot.as_ref().unwrap());
                let attrs = copy_attrs.then(|| snapshot.as_ref().unwrap());
                let now = SystemTime::now();
                let new_key = arena.insert_with(|key| materialize(plan, dst_parent, key, now, times, attrs));
                relink(&mut arena, dst_parent, &dst_name, new_key)?;
                arena.get_mut(dst_parent)?.set_last_modified(now);
                Ok(())
            }
            DualWriteGuard::Distinct(src_arena, mut dst_arena) => {
                let (src_parent, src_name) = self.store.tree().lookup_parent(&src_arena, self.cwd_key, src_path)?;
                let src_key = src_arena.get(src_parent)?.as_directory()?.get(&src_name).ok_or(Error::NotFound)?;
                let (dst_parent, dst_name) =
                    dst_view.store.tree().lookup_parent(&dst_arena, dst_view.cwd_key, dst_path)?;
                check_replace_allowed(&dst_arena, dst_parent, &dst_name, options)?;

                let plan = plan_for(src_arena.get(src_key)?, dst_view.store.disk())?;
                let copy_attrs = options.contains(CopyOptions::COPY_ATTRIBUTES);
                let snapshot = (copy_attrs || force_times).then(|| snapshot_attributes(src_arena.get(src_key).unwrap()));
                let times = (copy_attrs || force_times).then(|| snapshot.as_ref().unwrap());
                let attrs = copy_attrs.then(|| snapshot.as_ref().unwrap());
                let now = SystemTime::now();
                let new_key = dst_arena.insert_with(|key| materialize(plan, dst_parent, key, now, times, attrs));
                relink(&mut dst_arena, dst_parent, &dst_name, new_key)?;
                dst_arena.get_mut(dst_parent)?.set_last_modified(now);
                Ok(())
            }
        }
    }

    /// Moves the entry at `src_path` to `dst_path`. Within a single store
    /// this relinks the existing inode in place (an O(1) rename); across
    /// stores it must copy then delete the source, since the destination
    /// store has its own inode arena.
    #[tracing::instrument(skip_all, fields(op = "move_to", src_path = %src_path, dst_path = %dst_path, options = ?options))]
    pub fn move_to(&self, src_path: &Path, dst_view: &FileSystemView, dst_path: &Path, options: CopyOptions) -> Result<()> {
        match FileStore::lock_pair_for_write(self.store(), dst_view.store()) {
            DualWriteGuard::Same(mut arena) => {
                let (src_parent, src_name) = self.store.tree().lookup_parent(&arena, self.cwd_key, src_path)?;
                let src_key = arena.get(src_parent)?.as_directory()?.get(&src_name).ok_or(Error::NotFound)?;
                let (dst_parent, dst_name) =
                    self.store.tree().lookup_parent(&arena, dst_view.cwd_key, dst_path)?;

                if arena.get(dst_parent)?.as_directory()?.get(&dst_name) == Some(src_key) {
                    return Ok(());
                }
                if arena.get(src_key)?.is_directory() && is_ancestor(&arena, src_key, dst_parent) {
                    return Err(Error::Invalid("cannot move a directory into its own subtree".into()));
                }
                check_replace_allowed(&arena, dst_parent, &dst_name, options)?;

                arena.get_mut(src_parent)?.as_directory_mut()?.unlink(&src_name)?;
                relink(&mut arena, dst_parent, &dst_name, src_key)?;
                if arena.get(src_key)?.is_directory() {
                    arena.get_mut(src_key)?.as_directory_mut()?.set_parent(dst_parent);
                }
                Ok(())
            }
            DualWriteGuard::Distinct(..) => {
                if options.contains(CopyOptions::ATOMIC_MOVE) {
                    return Err(Error::Unsupported("ATOMIC_MOVE is not supported across two file stores".into()));
                }
                self.copy_internal(src_path, dst_view, dst_path, options, true)?;
                self.delete(src_path, super::DeleteMode::Any)
            }
        }
    }
}
