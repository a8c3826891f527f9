//! Defines attribute values and the `"view:attr"` dispatch grammar used by
//! [`crate::service::PathService`]-facing attribute reads and writes.
//!
//! Grounded on the teacher's `vfs::get_attr` (`GetAttrArgs`/`GetAttrSuccess`
//! carrying an NFSv3 `FileAttr`) for the fixed-field shape of `basic`,
//! `owner`, and `posix` attributes, generalized into a small provider
//! dispatch table rather than one hardcoded struct, plus a `user` provider
//! for arbitrary named attributes backed by a `dashmap::DashMap` the way
//! the rest of the pack (tvix) uses dashmap for concurrent auxiliary maps.

use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::inode::Inode;

/// A single attribute value. Loosely typed because the set of attributes is
/// open-ended across providers (a `posix:permissions` is a bitmask, a
/// `basic:creationTime` is a timestamp, a `user:*` value is caller-defined).
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    UInt(u64),
    Text(String),
    Time(SystemTime),
    StringList(Vec<String>),
}

/// The fixed set of attribute views this file store understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeView {
    Basic,
    Owner,
    Posix,
    Dos,
    User,
}

impl AttributeView {
    fn parse(view: &str) -> Result<Self> {
        match view {
            "basic" => Ok(Self::Basic),
            "owner" => Ok(Self::Owner),
            "posix" => Ok(Self::Posix),
            "dos" => Ok(Self::Dos),
            "user" => Ok(Self::User),
            other => Err(Error::Unsupported(format!("unrecognized attribute view '{other}'"))),
        }
    }
}

/// Splits `"view:attr"` into its view and attribute name. A name with no
/// `:` is treated as the `basic` view's attribute. A bare `"view:*"` (attr
/// `*`) requests every attribute in that view and is only legal when no
/// specific attribute name follows it.
fn split(spec: &str) -> (&str, &str) {
    match spec.split_once(':') {
        Some((view, attr)) => (view, attr),
        None => ("basic", spec),
    }
}

/// Reads one, several, or all attributes named by `spec` (`"view:attr"`,
/// `"view:attr1,attr2"`, or `"view:*"`) from `inode`. Mixing `*` with any
/// other name in the same spec is rejected.
pub fn read(inode: &Inode, spec: &str) -> Result<Vec<(String, AttributeValue)>> {
    let (view_name, attrs) = split(spec);
    let view = AttributeView::parse(view_name)?;
    if attrs == "*" {
        return Ok(all_of(inode, view));
    }
    let names: Vec<&str> = attrs.split(',').collect();
    if names.iter().any(|n| *n == "*") {
        return Err(Error::Unsupported("cannot mix '*' with explicit attribute names".into()));
    }
    names.into_iter().map(|name| Ok((name.to_owned(), read_one(inode, view, name)?))).collect()
}

/// Writes a single named attribute. `"view:*"` is rejected here: writes must
/// name exactly one attribute (spec: `"view:*"` combined with an explicit
/// write is not supported).
pub fn write(inode: &mut Inode, spec: &str, value: AttributeValue) -> Result<()> {
    let (view, attr) = split(spec);
    if attr == "*" {
        return Err(Error::Unsupported("cannot write to a wildcard attribute spec".into()));
    }
    let view = AttributeView::parse(view)?;
    write_one(inode, view, attr, value)
}

fn all_of(inode: &Inode, view: AttributeView) -> Vec<(String, AttributeValue)> {
    match view {
        AttributeView::Basic => vec![
            ("isDirectory".into(), AttributeValue::Bool(inode.is_directory())),
            ("isRegularFile".into(), AttributeValue::Bool(inode.is_regular_file())),
            ("isSymbolicLink".into(), AttributeValue::Bool(inode.is_symbolic_link())),
            ("size".into(), AttributeValue::UInt(inode.size())),
            ("creationTime".into(), AttributeValue::Time(inode.created())),
            ("lastModifiedTime".into(), AttributeValue::Time(inode.last_modified())),
            ("lastAccessTime".into(), AttributeValue::Time(inode.last_accessed())),
            ("linkCount".into(), AttributeValue::UInt(inode.link_count())),
        ],
        AttributeView::Owner => vec![("owner".into(), AttributeValue::Text(inode.owner().to_owned()))],
        AttributeView::Posix => vec![
            ("owner".into(), AttributeValue::Text(inode.owner().to_owned())),
            ("group".into(), AttributeValue::Text(inode.group().to_owned())),
            ("permissions".into(), AttributeValue::UInt(inode.permissions() as u64)),
        ],
        AttributeView::Dos => vec![
            ("readonly".into(), AttributeValue::Bool(inode.dos().readonly)),
            ("hidden".into(), AttributeValue::Bool(inode.dos().hidden)),
            ("archive".into(), AttributeValue::Bool(inode.dos().archive)),
            ("system".into(), AttributeValue::Bool(inode.dos().system)),
        ],
        AttributeView::User => inode
            .user_attributes()
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect(),
    }
}

fn read_one(inode: &Inode, view: AttributeView, attr: &str) -> Result<AttributeValue> {
    match (view, attr) {
        (AttributeView::Basic, "isDirectory") => Ok(AttributeValue::Bool(inode.is_directory())),
        (AttributeView::Basic, "isRegularFile") => Ok(AttributeValue::Bool(inode.is_regular_file())),
        (AttributeView::Basic, "isSymbolicLink") => Ok(AttributeValue::Bool(inode.is_symbolic_link())),
        (AttributeView::Basic, "size") => Ok(AttributeValue::UInt(inode.size())),
        (AttributeView::Basic, "creationTime") => Ok(AttributeValue::Time(inode.created())),
        (AttributeView::Basic, "lastModifiedTime") => Ok(AttributeValue::Time(inode.last_modified())),
        (AttributeView::Basic, "lastAccessTime") => Ok(AttributeValue::Time(inode.last_accessed())),
        (AttributeView::Basic, "linkCount") => Ok(AttributeValue::UInt(inode.link_count())),
        (AttributeView::Owner, "owner") => Ok(AttributeValue::Text(inode.owner().to_owned())),
        (AttributeView::Posix, "owner") => Ok(AttributeValue::Text(inode.owner().to_owned())),
        (AttributeView::Posix, "group") => Ok(AttributeValue::Text(inode.group().to_owned())),
        (AttributeView::Posix, "permissions") => Ok(AttributeValue::UInt(inode.permissions() as u64)),
        (AttributeView::Dos, "readonly") => Ok(AttributeValue::Bool(inode.dos().readonly)),
        (AttributeView::Dos, "hidden") => Ok(AttributeValue::Bool(inode.dos().hidden)),
        (AttributeView::Dos, "archive") => Ok(AttributeValue::Bool(inode.dos().archive)),
        (AttributeView::Dos, "system") => Ok(AttributeValue::Bool(inode.dos().system)),
        (AttributeView::User, name) => inode
            .user_attributes()
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or(Error::NotFound),
        _ => Err(Error::Invalid("unknown attribute name for view".into())),
    }
}

fn write_one(inode: &mut Inode, view: AttributeView, attr: &str, value: AttributeValue) -> Result<()> {
    match (view, attr, value) {
        (AttributeView::Owner, "owner", AttributeValue::Text(v))
        | (AttributeView::Posix, "owner", AttributeValue::Text(v)) => {
            inode.set_owner(v);
            Ok(())
        }
        (AttributeView::Posix, "group", AttributeValue::Text(v)) => {
            inode.set_group(v);
            Ok(())
        }
        (AttributeView::Posix, "permissions", AttributeValue::UInt(v)) => {
            inode.set_permissions(v as u32);
            Ok(())
        }
        (AttributeView::Dos, "readonly", AttributeValue::Bool(v)) => {
            inode.dos_mut().readonly = v;
            Ok(())
        }
        (AttributeView::Dos, "hidden", AttributeValue::Bool(v)) => {
            inode.dos_mut().hidden = v;
            Ok(())
        }
        (AttributeView::Dos, "archive", AttributeValue::Bool(v)) => {
            inode.dos_mut().archive = v;
            Ok(())
        }
        (AttributeView::Dos, "system", AttributeValue::Bool(v)) => {
            inode.dos_mut().system = v;
            Ok(())
        }
        (AttributeView::Basic, "lastModifiedTime", AttributeValue::Time(v)) => {
            inode.set_last_modified(v);
            Ok(())
        }
        (AttributeView::Basic, "lastAccessTime", AttributeValue::Time(v)) => {
            inode.set_last_accessed(v);
            Ok(())
        }
        (AttributeView::User, name, v) => {
            inode.user_attributes().insert(name.to_owned(), v);
            Ok(())
        }
        (AttributeView::Basic, _, _) => Err(Error::Unsupported("basic attributes besides times are read-only".into())),
        _ => Err(Error::Invalid("unknown or mistyped attribute for view".into())),
    }
}
