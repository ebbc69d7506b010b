//! Keys and key parsers.
//!
//! A [`Key`] is the address of a position in a [`Values`](super::Values) tree:
//! an ordered sequence of string segments. `a.b.c` style strings become keys
//! through a [`KeyParser`], the default being a [`SeparatorKeyParser`] on `.`.

use std::fmt;


/// An ordered sequence of string segments addressing a tree position.
///
/// The empty key is a valid value and addresses the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Vec<String>);

impl Key {
    /// Build a key from explicit segments.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Key(parts.into_iter().map(Into::into).collect())
    }

    /// The empty key, addressing the root of a tree.
    pub fn root() -> Self {
        Key(Vec::new())
    }

    /// Split `source` on `sep`.
    ///
    /// An empty `source` with a non-empty `sep` yields one empty segment.
    /// An empty `sep` yields one segment per `char`.
    pub fn split(source: &str, sep: &str) -> Self {
        if sep.is_empty() {
            return Key(source.chars().map(String::from).collect());
        }
        Key(source.split(sep).map(String::from).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True if `prefix` matches the leading segments of this key.
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// True if `suffix` matches the trailing segments of this key.
    pub fn ends_with(&self, suffix: &Key) -> bool {
        self.0.ends_with(&suffix.0)
    }

    /// A new key made of this key followed by every key in `others`.
    pub fn append(&self, others: &[&Key]) -> Key {
        let extra: usize = others.iter().map(|k| k.len()).sum();
        let mut parts = Vec::with_capacity(self.len() + extra);
        parts.extend_from_slice(&self.0);
        for other in others {
            parts.extend_from_slice(&other.0);
        }
        Key(parts)
    }

    /// A new key made of this key followed by the given segments.
    pub fn append_strings(&self, others: &[&str]) -> Key {
        self.append(&[&Key::new(others.iter().copied())])
    }

    /// A new key one segment deeper.
    pub fn child(&self, segment: impl Into<String>) -> Key {
        let mut parts = self.0.clone();
        parts.push(segment.into());
        Key(parts)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<Vec<String>> for Key {
    fn from(parts: Vec<String>) -> Self {
        Key(parts)
    }
}

impl From<&[&str]> for Key {
    fn from(parts: &[&str]) -> Self {
        Key::new(parts.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(parts: [&str; N]) -> Self {
        Key::new(parts)
    }
}

impl AsRef<[String]> for Key {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}

impl IntoIterator for Key {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Key {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}


// ---------------------------------------------------------------------------
// Key parsers
// ---------------------------------------------------------------------------

/// Turns a raw string into a [`Key`].
pub trait KeyParser {
    fn parse(&self, raw: &str) -> Key;
}

impl<F> KeyParser for F
where
    F: Fn(&str) -> Key,
{
    fn parse(&self, raw: &str) -> Key {
        self(raw)
    }
}


/// Splits raw strings on a fixed separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorKeyParser(pub String);

impl SeparatorKeyParser {
    pub fn new(sep: impl Into<String>) -> Self {
        SeparatorKeyParser(sep.into())
    }
}

impl Default for SeparatorKeyParser {
    fn default() -> Self {
        SeparatorKeyParser::new(PERIOD_SEPARATOR)
    }
}

impl KeyParser for SeparatorKeyParser {
    fn parse(&self, raw: &str) -> Key {
        Key::split(raw, &self.0)
    }
}

/// Separator used by the default parser of a [`Config`](crate::Config).
pub const PERIOD_SEPARATOR: &str = ".";
