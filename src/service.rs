//! Defines [`PathService`] (string parsing/formatting for [`Path`]) and
//! [`PathMatcher`] (the `"glob:pattern"` / `"regex:pattern"` matcher
//! grammar).
//!
//! Grounded on the rest of the pack's use of the `regex` crate (tvix,
//! wasmer) for exactly this kind of pattern compilation; there is no
//! teacher equivalent since NFS procedures take pre-split path components,
//! never a single string to parse.

use regex::Regex;

use crate::error::{Error, Result};
use crate::name::{Name, Normalization};
use crate::path::Path;

/// Parses and formats [`Path`]s using one fixed separator (`/`) and a given
/// [`Normalization`], recognizing one or more configured root tokens (a
/// single `"/"` for a Unix-like service, or one token per drive such as
/// `"C:/"`, `"D:/"` for a Windows-like one -- spec: "Parses strings into
/// paths using the configured path-type").
pub struct PathService {
    normalization: Normalization,
    roots: Vec<Name>,
}

impl PathService {
    /// `roots` must be non-empty; a raw string is absolute iff it starts
    /// with one of them, matched longest-first so no shorter root token
    /// shadows a longer one that shares a prefix.
    pub fn new(normalization: Normalization, roots: Vec<Name>) -> Self {
        assert!(!roots.is_empty(), "a path service needs at least one root token");
        let mut roots = roots;
        roots.sort_by_key(|r| std::cmp::Reverse(r.display().len()));
        Self { normalization, roots }
    }

    pub fn roots(&self) -> &[Name] {
        &self.roots
    }

    /// Parses `raw` into a [`Path`]. A leading match against one of this
    /// service's configured root tokens makes it absolute under that root;
    /// consecutive or trailing separators in the remainder are collapsed
    /// away, matching common POSIX shell path handling. Anything else
    /// (including an empty string) parses to a relative path.
    pub fn parse(&self, raw: &str) -> Path {
        let matched_root = self.roots.iter().find(|root| raw.starts_with(root.display()));
        let rest = match matched_root {
            Some(root) => &raw[root.display().len()..],
            None => raw,
        };
        let names: Vec<Name> =
            rest.split('/').filter(|s| !s.is_empty()).map(|s| Name::new(s, self.normalization)).collect();
        match matched_root {
            Some(root) => Path::absolute(root.clone(), names),
            None => Path::relative(names),
        }
    }

    /// Formats `path` back to its string form, via [`Path`]'s `Display`.
    pub fn format(&self, path: &Path) -> String {
        path.to_string()
    }

    /// Whether `matcher` accepts `path`'s formatted string form.
    pub fn matches(&self, path: &Path, matcher: &PathMatcher) -> bool {
        matcher.matches(&self.format(path))
    }
}

/// A compiled `"glob:pattern"` or `"regex:pattern"` path matcher.
pub struct PathMatcher {
    regex: Regex,
}

impl PathMatcher {
    /// Compiles `spec`, which must begin with `"glob:"` or `"regex:"`.
    pub fn compile(spec: &str) -> Result<Self> {
        let (kind, pattern) = spec
            .split_once(':')
            .ok_or(Error::Invalid("matcher syntax must be 'glob:pattern' or 'regex:pattern'".into()))?;
        let source = match kind {
            "glob" => glob_to_regex(pattern),
            "regex" => pattern.to_owned(),
            _ => return Err(Error::Unsupported("matcher kind must be 'glob' or 'regex'".into())),
        };
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|_| Error::Invalid("malformed matcher pattern".into()))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Translates a shell-style glob into an equivalent regex source string.
/// `*` matches any run of non-separator characters, `**` matches across
/// separators, `?` matches a single non-separator character, `[...]`
/// character classes pass through verbatim, and `{a,b}` becomes a
/// non-capturing alternation (braces do not nest, matching the spec's
/// glob grammar).
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::new();
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '.' | '(' | ')' | '+' | '|' | '^' | '$' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '[' => {
                out.push('[');
                for next in chars.by_ref() {
                    out.push(next);
                    if next == ']' {
                        break;
                    }
                }
            }
            '{' => {
                out.push_str("(?:");
                for next in chars.by_ref() {
                    match next {
                        '}' => break,
                        ',' => out.push('|'),
                        '.' | '(' | ')' | '+' | '|' | '^' | '$' | '\\' => {
                            out.push('\\');
                            out.push(next);
                        }
                        other => out.push(other),
                    }
                }
                out.push(')');
            }
            '}' => out.push('}'),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix_service() -> PathService {
        PathService::new(Normalization::default(), vec![Name::new("/", Normalization::default())])
    }

    #[test]
    fn parse_collapses_separators_and_detects_root() {
        let service = unix_service();
        let path = service.parse("/a//b/");
        assert!(path.is_absolute());
        assert_eq!(service.format(&path), "/a/b");
    }

    #[test]
    fn parse_relative_path() {
        let service = unix_service();
        let path = service.parse("a/b");
        assert!(!path.is_absolute());
        assert_eq!(service.format(&path), "a/b");
    }

    #[test]
    fn parse_picks_the_matching_configured_root_among_several() {
        let norm = Normalization::default();
        let service =
            PathService::new(norm, vec![Name::new("C:/", norm), Name::new("D:/", norm)]);
        let path = service.parse("D:/Users/a.txt");
        assert!(path.is_absolute());
        assert_eq!(path.root().unwrap().display(), "D:/");
        assert_eq!(service.format(&path), "D:/Users/a.txt");
    }

    #[test]
    fn parse_treats_an_unconfigured_root_token_as_relative() {
        let service = unix_service();
        let path = service.parse("C:/Users/a.txt");
        assert!(!path.is_absolute());
    }

    #[test]
    fn glob_matcher_respects_separator_boundary() {
        let matcher = PathMatcher::compile("glob:/a/*.txt").unwrap();
        assert!(matcher.matches("/a/b.txt"));
        assert!(!matcher.matches("/a/b/c.txt"));
    }

    #[test]
    fn glob_double_star_crosses_separators() {
        let matcher = PathMatcher::compile("glob:/a/**/*.txt").unwrap();
        assert!(matcher.matches("/a/b/c/d.txt"));
    }

    #[test]
    fn brace_expansion_matches_any_alternative() {
        let matcher = PathMatcher::compile("glob:/a/*.{txt,md}").unwrap();
        assert!(matcher.matches("/a/b.txt"));
        assert!(matcher.matches("/a/b.md"));
        assert!(!matcher.matches("/a/b.rs"));
    }

    #[test]
    fn regex_matcher_is_used_directly() {
        let matcher = PathMatcher::compile("regex:/[ab]+\\.txt").unwrap();
        assert!(matcher.matches("/ab.txt"));
        assert!(!matcher.matches("/c.txt"));
    }

    #[test]
    fn unknown_matcher_kind_is_unsupported() {
        assert!(matches!(PathMatcher::compile("xyz:foo"), Err(Error::Unsupported(_))));
    }
}
