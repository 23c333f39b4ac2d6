//! The reference grammar.
//!
//! A reference is a string that points into one of the two live scopes:
//!
//! | Form            | Meaning                                               |
//! |-----------------|-------------------------------------------------------|
//! | `~`             | the whole local scope tree                            |
//! | `~~`            | the whole global scope tree                           |
//! | `~.rest`        | a path relative to the local scope                    |
//! | `~~.rest`       | a path relative to the global scope                   |
//! | `~>key[.rest]`  | anchored at the last `key` segment of the current path |
//! | `~~>key[.rest]` | anchored at the first `key` segment of the current path |
//!
//! Any other string (and any non-string value) is a literal.

use serde_json::Value;
use std::fmt;

/// Which end of the current path an ancestor search starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AncestorSearch {
    /// `~>`: the occurrence closest to the leaf.
    Nearest,
    /// `~~>`: the occurrence closest to the root.
    Outermost,
}

/// A parsed reference, borrowing from the source string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `~`
    LocalRoot,
    /// `~~`
    GlobalRoot,
    /// `~.rest`; `rest` may be empty.
    Local(&'a str),
    /// `~~.rest`; `rest` may be empty.
    Global(&'a str),
    /// `~>key[.rest]` or `~~>key[.rest]`.
    Ancestor {
        search: AncestorSearch,
        key: &'a str,
        rest: Option<&'a str>,
    },
}

impl<'a> Reference<'a> {
    /// Parse a string as a reference. Returns `None` for literals.
    pub fn parse(s: &'a str) -> Option<Self> {
        match s {
            "~" => return Some(Reference::LocalRoot),
            "~~" => return Some(Reference::GlobalRoot),
            _ => {}
        }

        if let Some(rest) = s.strip_prefix("~~.") {
            Some(Reference::Global(rest))
        } else if let Some(rest) = s.strip_prefix("~.") {
            Some(Reference::Local(rest))
        } else if let Some(tail) = s.strip_prefix("~~>") {
            Some(Self::ancestor(AncestorSearch::Outermost, tail))
        } else if let Some(tail) = s.strip_prefix("~>") {
            Some(Self::ancestor(AncestorSearch::Nearest, tail))
        } else {
            None
        }
    }

    fn ancestor(search: AncestorSearch, tail: &'a str) -> Self {
        let (key, rest) = match tail.split_once('.') {
            Some((key, rest)) => (key, Some(rest)),
            None => (tail, None),
        };
        Reference::Ancestor { search, key, rest }
    }

    /// Whether evaluation of this reference starts from the global tree.
    #[inline]
    pub fn starts_from_global(&self) -> bool {
        !matches!(self, Reference::LocalRoot | Reference::Local(_))
    }
}

impl fmt::Display for Reference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::LocalRoot => write!(f, "~"),
            Reference::GlobalRoot => write!(f, "~~"),
            Reference::Local(rest) => write!(f, "~.{rest}"),
            Reference::Global(rest) => write!(f, "~~.{rest}"),
            Reference::Ancestor { search, key, rest } => {
                let prefix = match search {
                    AncestorSearch::Nearest => "~>",
                    AncestorSearch::Outermost => "~~>",
                };
                match rest {
                    Some(rest) => write!(f, "{prefix}{key}.{rest}"),
                    None => write!(f, "{prefix}{key}"),
                }
            }
        }
    }
}

/// Returns true if `s` follows the reference grammar.
#[inline]
pub fn is_reference(s: &str) -> bool {
    Reference::parse(s).is_some()
}

/// Parse a JSON value as a reference. Only strings can be references.
#[inline]
pub fn as_reference(value: &Value) -> Option<Reference<'_>> {
    value.as_str().and_then(Reference::parse)
}
