//! Scopes: a data tree paired with the absolute path it lives at.

use serde_json::Value;
use std::sync::Arc;

/// Absolute path of the global root scope.
pub const ROOT_PATH: &str = "data";

static DETACHED: Value = Value::Null;

/// A borrowed scope: the tree a reference is evaluated against and its absolute path.
///
/// Two scopes are always live together: the *local* one (nearest enclosing binding context)
/// and the *global* one (the root store).
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    tree: &'a Value,
    path: &'a str,
}

impl<'a> Scope<'a> {
    /// Create a scope over `tree`, located at `path`.
    #[inline]
    pub fn new(tree: &'a Value, path: &'a str) -> Self {
        Self { tree, path }
    }

    /// Create the root scope over `tree`, located at [`ROOT_PATH`].
    #[inline]
    pub fn root(tree: &'a Value) -> Self {
        Self::new(tree, ROOT_PATH)
    }

    /// Create a scope that only carries a path.
    ///
    /// Path resolution never reads the tree, so this is enough for [`crate::resolve`].
    #[inline]
    pub fn detached(path: &'a str) -> Self {
        Self::new(&DETACHED, path)
    }

    /// The tree of this scope.
    #[inline]
    pub fn tree(&self) -> &'a Value {
        self.tree
    }

    /// The absolute path of this scope.
    #[inline]
    pub fn path(&self) -> &'a str {
        self.path
    }
}

/// An owned scope, cheap to clone, for contexts that outlive a borrow of the store.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedScope {
    pub tree: Arc<Value>,
    pub path: String,
}

impl OwnedScope {
    pub fn new(tree: impl Into<Arc<Value>>, path: impl Into<String>) -> Self {
        Self {
            tree: tree.into(),
            path: path.into(),
        }
    }

    pub fn root(tree: impl Into<Arc<Value>>) -> Self {
        Self::new(tree, ROOT_PATH)
    }

    /// Borrow as a [`Scope`].
    #[inline]
    pub fn as_scope(&self) -> Scope<'_> {
        Scope::new(&self.tree, &self.path)
    }
}
