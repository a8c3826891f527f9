//! Defines [`Path`], an immutable sequence of [`Name`]s with an optional root.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::name::Name;

/// An immutable, absolute or relative path within one file-store instance.
///
/// Absolute paths carry a root name (e.g. `"/"`, `"C:\"`); relative paths do
/// not. The empty relative path is represented as a single empty-string name
/// (`names = [""]`) and is treated as equivalent to `.` by the lookup
/// algorithm (see [`crate::tree`]).
#[derive(Clone, PartialEq, Eq)]
pub struct Path {
    root: Option<Name>,
    names: Vec<Name>,
}

impl Path {
    /// Builds an absolute path from a root and a sequence of names.
    pub fn absolute(root: Name, names: Vec<Name>) -> Self {
        Self { root: Some(root), names }
    }

    /// Builds a relative path from a sequence of names. An empty `names`
    /// vector is normalized to the canonical empty path `[""]`.
    pub fn relative(names: Vec<Name>) -> Self {
        if names.is_empty() {
            Self { root: None, names: vec![Name::new("", Default::default())] }
        } else {
            Self { root: None, names }
        }
    }

    pub fn root(&self) -> Option<&Name> {
        self.root.as_ref()
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    pub fn is_absolute(&self) -> bool {
        self.root.is_some()
    }

    /// Whether this is the canonical empty relative path (`names == [""]`).
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.names.len() == 1 && self.names[0].display().is_empty()
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    pub fn get_name(&self, index: usize) -> Option<&Name> {
        self.names.get(index)
    }

    /// The final name component, if any (the empty relative path has none
    /// that is meaningful, but still returns its sentinel empty name).
    pub fn file_name(&self) -> Option<&Name> {
        self.names.last()
    }

    /// Bounds-checked subpath `[begin, end)`. Preserves the root only when
    /// `begin == 0`.
    pub fn subpath(&self, begin: usize, end: usize) -> Result<Path> {
        if begin > end || end > self.names.len() {
            return Err(Error::Invalid("subpath range out of bounds".into()));
        }
        let names = self.names[begin..end].to_vec();
        if begin == 0 && self.root.is_some() {
            Ok(Path { root: self.root.clone(), names })
        } else {
            Ok(Path::relative(names))
        }
    }

    /// The parent path, or `None` for a root path or a path with a single
    /// name component.
    pub fn parent(&self) -> Option<Path> {
        if self.names.len() <= 1 {
            return if self.root.is_some() && self.names.is_empty() {
                Some(self.clone())
            } else {
                None
            };
        }
        self.subpath(0, self.names.len() - 1).ok()
    }

    /// Collapses `.` segments and resolves `name/..` pairs.
    ///
    /// A leading `..` in a relative path is preserved (there is nothing to
    /// cancel it against); a `..` occupying the root position of an absolute
    /// path is discarded (you cannot go above the root).
    pub fn normalize(&self) -> Path {
        let mut stack: Vec<Name> = Vec::with_capacity(self.names.len());
        for name in &self.names {
            if name.is_dot() {
                continue;
            }
            if name.is_dot_dot() {
                match stack.last() {
                    Some(top) if !top.is_dot_dot() => {
                        stack.pop();
                    }
                    _ => {
                        if self.root.is_none() {
                            stack.push(name.clone());
                        }
                        // absolute: discard, cannot go above root
                    }
                }
                continue;
            }
            stack.push(name.clone());
        }
        if stack.is_empty() {
            if self.root.is_some() {
                Path { root: self.root.clone(), names: Vec::new() }
            } else {
                Path::relative(Vec::new())
            }
        } else {
            Path { root: self.root.clone(), names: stack }
        }
    }

    /// Resolves `other` against `self`, following the usual path-resolution
    /// rules: an absolute `other` replaces `self` entirely; an empty `self`
    /// is replaced by `other`; an empty `other` yields `self`; otherwise the
    /// two name sequences are concatenated.
    pub fn resolve(&self, other: &Path) -> Path {
        if other.is_absolute() || self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut names = self.names.clone();
        names.extend(other.names.iter().cloned());
        Path { root: self.root.clone(), names }
    }

    /// Resolves `other` against `self`'s parent, falling back to `other`
    /// itself when `self` has no parent.
    pub fn resolve_sibling(&self, other: &Path) -> Path {
        match self.parent() {
            Some(parent) => parent.resolve(other),
            None => other.clone(),
        }
    }

    /// Computes the relative path that, when resolved against `self`,
    /// yields `other`. Requires both paths to agree on root presence.
    pub fn relativize(&self, other: &Path) -> Result<Path> {
        if self.is_absolute() != other.is_absolute() {
            return Err(Error::Invalid("relativize requires matching root presence".into()));
        }
        let a = self.normalize();
        let b = other.normalize();

        let shared = a
            .names
            .iter()
            .zip(b.names.iter())
            .take_while(|(x, y)| x == y)
            .count();

        let mut names = Vec::new();
        for _ in shared..a.names.len() {
            names.push(Name::dot_dot());
        }
        names.extend(b.names[shared..].iter().cloned());
        Ok(Path::relative(names))
    }

    /// Whether `self`'s names begin with `other`'s names (and agree on root
    /// presence, when `other` is absolute).
    pub fn starts_with(&self, other: &Path) -> bool {
        if other.is_absolute() && self.root != other.root {
            return false;
        }
        if other.names.len() > self.names.len() {
            return false;
        }
        self.names[..other.names.len()] == other.names[..]
    }

    /// Whether `self`'s names end with `other`'s names.
    pub fn ends_with(&self, other: &Path) -> bool {
        if other.is_absolute() {
            return self == other;
        }
        if other.names.len() > self.names.len() {
            return false;
        }
        let offset = self.names.len() - other.names.len();
        self.names[offset..] == other.names[..]
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(root) = &self.root {
            write!(f, "{}", root)?;
        }
        let mut first = true;
        for name in &self.names {
            if !first || self.root.is_none() {
                if !first {
                    write!(f, "/")?;
                }
            }
            write!(f, "{}", name)?;
            first = false;
        }
        Ok(())
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        let root_order = match (&self.root, &other.root) {
            (Some(a), Some(b)) => a.display().cmp(b.display()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        root_order.then_with(|| {
            self.names
                .iter()
                .map(Name::display)
                .cmp(other.names.iter().map(Name::display))
        })
    }
}
