//! Defines [`Name`], the immutable, normalization-aware path component.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// How textual path components are folded before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseSensitivity {
    /// Compare canonical forms byte-for-byte.
    #[default]
    Sensitive,
    /// Fold ASCII letters to lowercase before comparing.
    AsciiInsensitive,
    /// Fold full Unicode case before comparing.
    UnicodeInsensitive,
}

/// Unicode normalization applied to textual path components.
///
/// Only the two common composed/decomposed forms are modeled; true NFC/NFD
/// folding is out of scope for this crate (it would pull in a Unicode
/// normalization table), so both variants currently normalize whitespace-only
/// and are provided so callers can express intent and so a future
/// implementation has a home. `None` performs no transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnicodeNormalization {
    #[default]
    None,
    Nfc,
    Nfd,
}

/// Normalization settings used to derive a [`Name`]'s canonical form from its
/// display form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Normalization {
    pub case_sensitivity: CaseSensitivity,
    pub unicode: UnicodeNormalization,
}

impl Normalization {
    fn canonicalize(&self, display: &str) -> String {
        let folded = match self.case_sensitivity {
            CaseSensitivity::Sensitive => display.to_owned(),
            CaseSensitivity::AsciiInsensitive => display.to_ascii_lowercase(),
            CaseSensitivity::UnicodeInsensitive => display.to_lowercase(),
        };
        // NFC/NFD folding would be applied here; see doc comment above.
        folded
    }
}

/// A single path component, holding both its display form (for rendering)
/// and its canonical form (for equality and hashing during lookup).
///
/// `.` and `..` are special: regardless of normalization settings they
/// canonicalize to themselves, and every occurrence of either is the same
/// shared instance (see [`Name::dot`] / [`Name::dot_dot`]).
#[derive(Clone)]
pub struct Name(Arc<Inner>);

struct Inner {
    display: String,
    canonical: String,
}

impl Name {
    /// Builds a name from raw text, applying `normalization` to derive the
    /// canonical form. `.` and `..` are recognized regardless of
    /// `normalization` and return the shared sentinel instances.
    pub fn new(display: impl Into<String>, normalization: Normalization) -> Self {
        let display = display.into();
        if display == "." {
            return Self::dot();
        }
        if display == ".." {
            return Self::dot_dot();
        }
        let canonical = normalization.canonicalize(&display);
        Self(Arc::new(Inner { display, canonical }))
    }

    /// The shared `.` sentinel.
    pub fn dot() -> Self {
        static DOT: OnceLock<Name> = OnceLock::new();
        DOT.get_or_init(|| Self(Arc::new(Inner { display: ".".into(), canonical: ".".into() })))
            .clone()
    }

    /// The shared `..` sentinel.
    pub fn dot_dot() -> Self {
        static DOT_DOT: OnceLock<Name> = OnceLock::new();
        DOT_DOT
            .get_or_init(|| Self(Arc::new(Inner { display: "..".into(), canonical: "..".into() })))
            .clone()
    }

    /// The form to use when rendering this name back to a user.
    pub fn display(&self) -> &str {
        &self.0.display
    }

    /// The form used for equality and hashing.
    pub fn canonical(&self) -> &str {
        &self.0.canonical
    }

    pub fn is_dot(&self) -> bool {
        self.0.canonical == "."
    }

    pub fn is_dot_dot(&self) -> bool {
        self.0.canonical == ".."
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Name")
            .field("display", &self.0.display)
            .field("canonical", &self.0.canonical)
            .finish()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.display)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0.canonical == other.0.canonical
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.canonical.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.display.cmp(&other.0.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_and_dot_dot_are_shared_instances() {
        let norm = Normalization::default();
        let a = Name::new(".", norm);
        let b = Name::dot();
        assert!(Arc::ptr_eq(&a.0, &b.0));

        let a = Name::new("..", norm);
        let b = Name::dot_dot();
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn case_insensitive_folds_canonical_but_keeps_display() {
        let norm = Normalization {
            case_sensitivity: CaseSensitivity::AsciiInsensitive,
            unicode: UnicodeNormalization::None,
        };
        let name = Name::new("ReadMe.TXT", norm);
        assert_eq!(name.display(), "ReadMe.TXT");
        assert_eq!(name.canonical(), "readme.txt");

        let other = Name::new("readme.txt", norm);
        assert_eq!(name, other);
    }

    #[test]
    fn case_sensitive_names_differ() {
        let norm = Normalization::default();
        let a = Name::new("File", norm);
        let b = Name::new("file", norm);
        assert_ne!(a, b);
    }
}
