//! Binding contexts: the pair of scopes a reaction or action is evaluated in.

use serde_json::Value;
use tilde_state::DataTarget;
use tilde_template::{resolve, Evaluator, OwnedScope, TemplateResult};

use crate::error::RuntimeResult;

/// The local and global scopes live at the point a reaction fires.
///
/// `local` is the nearest enclosing binding (a list item, a nested component);
/// `global` is the root of the store being written to.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingContext {
    pub local: OwnedScope,
    pub global: OwnedScope,
}

impl BindingContext {
    pub fn new(local: OwnedScope, global: OwnedScope) -> Self {
        Self { local, global }
    }

    /// A context whose local scope is the global one.
    pub fn root(global: OwnedScope) -> Self {
        Self {
            local: global.clone(),
            global,
        }
    }

    /// Root context over the current tree of `target`.
    pub fn from_target(target: &dyn DataTarget) -> RuntimeResult<Self> {
        Ok(Self::root(target.global_scope()?))
    }

    /// Replace the local scope, keeping the global one.
    pub fn with_local(mut self, local: OwnedScope) -> Self {
        self.local = local;
        self
    }

    /// Resolve a data location to an absolute path, relative to the local scope.
    pub fn resolve_path(&self, location: &str) -> TemplateResult<String> {
        let local = self.local.as_scope();
        let global = self.global.as_scope();
        resolve(location, &self.local.path, &local, &global).map(|path| path.into_owned())
    }

    /// Evaluate a value collection in this context.
    pub fn evaluate(
        &self,
        evaluator: &Evaluator,
        value: &Value,
        depth: i32,
    ) -> TemplateResult<Option<Value>> {
        evaluator.evaluate_collection(value, &self.local.as_scope(), &self.global.as_scope(), depth)
    }

    /// Evaluate a single value: a reference is looked up, anything else is returned as is.
    pub fn evaluate_scalar(&self, value: &Value) -> TemplateResult<Option<Value>> {
        tilde_template::evaluate_scalar(value, &self.local.as_scope(), &self.global.as_scope())
    }
}
