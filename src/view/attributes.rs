//! `get_attribute`, `read_attributes`, and `set_attribute`: the
//! `FileSystemView`-level surface over [`crate::attr`]'s `"view:attr"`
//! dispatch grammar.
//!
//! Grounded on the teacher's `vfs::get_attr` (`GetAttrArgs { file } ->
//! GetAttrSuccess { attr: FileAttr }`) for the path-to-metadata shape;
//! `crate::attr` itself carries the provider dispatch this module just
//! resolves a path down to an inode for.

use super::FileSystemView;
use crate::attr::AttributeValue;
use crate::error::{Error, Result};
use crate::path::Path;
use crate::tree::LinkHandling;

impl FileSystemView {
    /// Reads every attribute named by `spec` (`"view:attr"`,
    /// `"view:attr1,attr2"`, or `"view:*"`) off the inode at `path`,
    /// following symbolic links along the way and at the final component.
    #[tracing::instrument(skip_all, fields(op = "read_attributes", path = %path, spec = %spec))]
    pub fn read_attributes(&self, path: &Path, spec: &str) -> Result<Vec<(String, AttributeValue)>> {
        let arena = self.store.read();
        let key = self.lookup(&arena, path, LinkHandling::Follow)?;
        crate::attr::read(arena.get(key)?, spec)
    }

    /// Reads exactly one attribute named by `spec` (`"view:attr"`, or bare
    /// `"attr"` for the `basic` view). Fails with [`Error::Invalid`] if
    /// `spec` names a wildcard or comma-separated list instead of a single
    /// attribute.
    #[tracing::instrument(skip_all, fields(op = "get_attribute", path = %path, spec = %spec))]
    pub fn get_attribute(&self, path: &Path, spec: &str) -> Result<AttributeValue> {
        let mut values = self.read_attributes(path, spec)?;
        if values.len() != 1 {
            return Err(Error::Invalid(format!("'{spec}' does not name exactly one attribute")));
        }
        Ok(values.pop().unwrap().1)
    }

    /// Writes a single named attribute on the inode at `path`. Updates the
    /// inode's modified time for writes to its own content-affecting fields
    /// is the caller's responsibility elsewhere (e.g. [`super::create`]) --
    /// this method only ever touches the attribute map itself.
    #[tracing::instrument(skip_all, fields(op = "set_attribute", path = %path, spec = %spec))]
    pub fn set_attribute(&self, path: &Path, spec: &str, value: AttributeValue) -> Result<()> {
        let mut arena = self.store.write();
        let key = self.lookup(&arena, path, LinkHandling::Follow)?;
        crate::attr::write(arena.get_mut(key)?, spec, value)
    }
}
