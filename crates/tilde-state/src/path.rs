//! Dot-delimited paths into the store tree.
//!
//! Segments are kept as strings. Whether a segment addresses an object key or an
//! array index is decided by the node it is applied to: arrays read it as a
//! non-negative integer, objects as a key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A path relative to the store root, e.g. `user.addresses.0.city`.
///
/// # Examples
///
/// ```
/// use tilde_state::DataPath;
///
/// let path = DataPath::parse("users.0.name");
/// assert_eq!(path.segments().len(), 3);
/// assert_eq!(path.to_string(), "users.0.name");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DataPath(Vec<String>);

impl DataPath {
    /// The whole tree.
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Split a dot-delimited path.
    ///
    /// Every dot separates two segments, so `""` is a single empty key and `"a."`
    /// ends with an empty key. Use [`DataPath::root`] for the whole tree.
    pub fn parse(s: &str) -> Self {
        Self(s.split('.').map(str::to_owned).collect())
    }

    #[inline]
    pub fn push(&mut self, seg: impl Into<String>) {
        self.0.push(seg.into());
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Check if this path is the root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if this path is a prefix of another path.
    ///
    /// A path is a prefix of itself.
    #[inline]
    pub fn is_prefix_of(&self, other: &DataPath) -> bool {
        other.0.starts_with(&self.0)
    }

    /// The rest of this path below `prefix`, or `None` when `prefix` does not cover it.
    pub fn strip_prefix(&self, prefix: &DataPath) -> Option<DataPath> {
        prefix
            .is_prefix_of(self)
            .then(|| DataPath(self.0[prefix.0.len()..].to_vec()))
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for DataPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DataPath::parse(s))
    }
}

impl From<&str> for DataPath {
    fn from(s: &str) -> Self {
        DataPath::parse(s)
    }
}

impl From<String> for DataPath {
    fn from(s: String) -> Self {
        DataPath::parse(&s)
    }
}

impl From<DataPath> for String {
    fn from(path: DataPath) -> Self {
        path.to_string()
    }
}

/// Construct a [`DataPath`] from displayable segments.
///
/// ```
/// use tilde_state::data_path;
///
/// let p = data_path!("items", 0, "name");
/// assert_eq!(p.to_string(), "items.0.name");
/// ```
#[macro_export]
macro_rules! data_path {
    () => {
        $crate::DataPath::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::DataPath::root();
        $(
            p.push($seg.to_string());
        )+
        p
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_empty_segments() {
        assert_eq!(DataPath::parse("").segments(), &[String::new()]);
        assert_eq!(DataPath::parse("a.").segments(), &["a".to_owned(), String::new()]);
        assert!(DataPath::root().is_root());
        assert!(!DataPath::parse("").is_root());
    }

    #[test]
    fn test_macro_matches_parse() {
        assert_eq!(data_path!("rows", 2, "label"), DataPath::parse("rows.2.label"));
        assert_eq!(data_path!(), DataPath::root());
    }

    #[test]
    fn test_prefix_and_strip() {
        let parent = DataPath::parse("user");
        let child = DataPath::parse("user.name");
        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
        assert!(DataPath::root().is_prefix_of(&child));
        assert_eq!(child.strip_prefix(&parent), Some(DataPath::parse("name")));
        assert_eq!(child.strip_prefix(&child), Some(DataPath::root()));
        assert_eq!(DataPath::parse("username").strip_prefix(&parent), None);
    }

    #[test]
    fn test_serde_as_string() {
        let path = DataPath::parse("a.b.0");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#""a.b.0""#);
        let back: DataPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
