//! Evaluation of references against live scope data.
//!
//! Evaluation never mutates the scope trees. A reference that walks into a missing
//! segment, or through a value that is neither an object nor an array, evaluates to
//! `None` rather than failing, so optional bindings degrade quietly. The only error is
//! an ancestor search whose key is absent from the local scope path.

use crate::config::TemplateConfig;
use crate::error::TemplateResult;
use crate::reference::{as_reference, Reference};
use crate::resolve::resolve_parsed;
use crate::scope::Scope;
use crate::truthy::is_truthy;
use serde_json::{Map, Value};

/// Look up what a reference points at, without cloning.
///
/// Local forms walk the local tree; global and ancestor forms walk the global tree.
/// Ancestor forms are first resolved to an absolute path against the local scope path.
pub fn lookup<'s>(
    reference: Reference<'_>,
    local: &Scope<'s>,
    global: &Scope<'s>,
) -> TemplateResult<Option<&'s Value>> {
    let found = match reference {
        Reference::LocalRoot => Some(local.tree()),
        Reference::GlobalRoot => Some(global.tree()),
        Reference::Local(rest) => walk(local.tree(), rest.split('.')),
        Reference::Global(rest) => walk(global.tree(), rest.split('.')),
        Reference::Ancestor { .. } => {
            let absolute = resolve_parsed(reference, local.path(), local, global)?;
            // The first segment is the global root itself.
            walk(global.tree(), absolute.split('.').skip(1))
        }
    };
    Ok(found)
}

fn walk<'s, 'k>(
    mut node: &'s Value,
    segments: impl Iterator<Item = &'k str>,
) -> Option<&'s Value> {
    for segment in segments {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Evaluate a single value.
///
/// Literals come back unchanged; references are replaced by the data they point at, or
/// `None` when that data is missing.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tilde_template::{evaluate_scalar, Scope};
///
/// let data = json!({"user": {"name": "Ada"}});
/// let scope = Scope::root(&data);
///
/// let name = evaluate_scalar(&json!("~.user.name"), &scope, &scope).unwrap();
/// assert_eq!(name, Some(json!("Ada")));
///
/// let missing = evaluate_scalar(&json!("~.user.age"), &scope, &scope).unwrap();
/// assert_eq!(missing, None);
///
/// let literal = evaluate_scalar(&json!("plain"), &scope, &scope).unwrap();
/// assert_eq!(literal, Some(json!("plain")));
/// ```
pub fn evaluate_scalar(
    value: &Value,
    local: &Scope<'_>,
    global: &Scope<'_>,
) -> TemplateResult<Option<Value>> {
    match as_reference(value) {
        Some(reference) => Ok(lookup(reference, local, global)?.cloned()),
        None => Ok(Some(value.clone())),
    }
}

/// Evaluate references inside a value, using the default [`TemplateConfig`].
///
/// See [`Evaluator::evaluate_collection`].
pub fn evaluate_collection(
    value: &Value,
    local: &Scope<'_>,
    global: &Scope<'_>,
    depth: i32,
) -> TemplateResult<Option<Value>> {
    Evaluator::default().evaluate_collection(value, local, global, depth)
}

/// Depth-aware evaluator carrying a [`TemplateConfig`].
#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    config: TemplateConfig,
}

impl Evaluator {
    pub fn new(config: TemplateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Evaluate references inside a value, keeping its shape.
    ///
    /// - `depth == 0` returns the value untouched.
    /// - `depth == 1` evaluates the value itself, or each direct element of an array/object.
    /// - `depth > 1` re-evaluates any composite result with `depth - 1`, taking at most
    ///   the configured recursion safety limit of passes.
    /// - `depth < 0` keeps re-evaluating composite results until the configured
    ///   recursion safety limit is reached.
    ///
    /// Self-referencing data terminates either way.
    ///
    /// Missing array elements become `null`; missing object values drop their key.
    pub fn evaluate_collection(
        &self,
        value: &Value,
        local: &Scope<'_>,
        global: &Scope<'_>,
        depth: i32,
    ) -> TemplateResult<Option<Value>> {
        let depth = i64::from(depth).min(self.config.depth_ceiling());
        self.collection(value, local, global, depth)
    }

    /// Evaluate a map of attributes at the default depth, keeping only truthy results.
    pub fn evaluate_attributes(
        &self,
        attrs: &Map<String, Value>,
        local: &Scope<'_>,
        global: &Scope<'_>,
    ) -> TemplateResult<Map<String, Value>> {
        let mut evaluated = Map::new();
        for (name, value) in attrs {
            let result = self.evaluate_collection(value, local, global, self.config.default_depth)?;
            if let Some(result) = result.filter(is_truthy) {
                evaluated.insert(name.clone(), result);
            }
        }
        Ok(evaluated)
    }

    fn collection(
        &self,
        value: &Value,
        local: &Scope<'_>,
        global: &Scope<'_>,
        depth: i64,
    ) -> TemplateResult<Option<Value>> {
        if depth == 0 {
            return Ok(Some(value.clone()));
        }
        if depth <= self.config.depth_floor() {
            tracing::debug!(
                limit = self.config.recursion_safety_limit,
                "template evaluation stopped at recursion safety limit"
            );
            return Ok(Some(value.clone()));
        }

        match value {
            Value::Array(items) => {
                let mut evaluated = Vec::with_capacity(items.len());
                for item in items {
                    let item = self.item(item, local, global, depth)?;
                    evaluated.push(item.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Array(evaluated)))
            }
            Value::Object(map) => {
                let mut evaluated = Map::with_capacity(map.len());
                for (key, item) in map {
                    if let Some(item) = self.item(item, local, global, depth)? {
                        evaluated.insert(key.clone(), item);
                    }
                }
                Ok(Some(Value::Object(evaluated)))
            }
            scalar => self.item(scalar, local, global, depth),
        }
    }

    fn item(
        &self,
        value: &Value,
        local: &Scope<'_>,
        global: &Scope<'_>,
        depth: i64,
    ) -> TemplateResult<Option<Value>> {
        let more_passes = depth > 1 || depth < 0;
        match evaluate_scalar(value, local, global)? {
            Some(result) if more_passes && (result.is_array() || result.is_object()) => {
                self.collection(&result, local, global, depth - 1)
            }
            other => Ok(other),
        }
    }
}
