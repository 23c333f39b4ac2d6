//! Data mapping: dispatch parts of a response to several store locations.
//!
//! A mapping configuration is an object keyed by processor name:
//!
//! ```json
//! {
//!   "simpleMapping": {
//!     "stringMap": {
//!       "~~.user.name": { "value": "profile.displayName" },
//!       "~~.user.avatar": {
//!         "value": "profile.image",
//!         "required": false,
//!         "defaultValue": "~~.placeholder"
//!       }
//!     },
//!     "onErrorMap": {
//!       "~~.user.name": { "value": "~~.guestName" }
//!     }
//!   }
//! }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tilde_state::{DataTarget, UpdateMode};
use tilde_template::Evaluator;

use crate::context::BindingContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::reaction::present;

/// Name of the built-in [`SimpleMapping`] processor.
pub const SIMPLE_MAPPING: &str = "simpleMapping";

/// A named strategy writing response data into a store.
pub trait MappingProcessor: Send + Sync {
    fn apply(
        &self,
        config: &Value,
        response: &Value,
        ctx: &BindingContext,
        target: &dyn DataTarget,
        evaluator: &Evaluator,
    ) -> RuntimeResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum MappingRegistryError {
    #[error("mapping processor already registered: {0}")]
    IdConflict(String),
}

/// Mapping processors keyed by the name used in configurations.
#[derive(Clone, Default)]
pub struct MappingRegistry {
    processors: HashMap<String, Arc<dyn MappingProcessor>>,
}

impl std::fmt::Debug for MappingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl MappingRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in processors.
    pub fn builtin() -> Self {
        let mut processors: HashMap<String, Arc<dyn MappingProcessor>> = HashMap::new();
        processors.insert(SIMPLE_MAPPING.to_owned(), Arc::new(SimpleMapping));
        Self { processors }
    }

    pub fn register_named(
        &mut self,
        id: impl Into<String>,
        processor: Arc<dyn MappingProcessor>,
    ) -> Result<(), MappingRegistryError> {
        let key = id.into();
        if self.processors.contains_key(&key) {
            return Err(MappingRegistryError::IdConflict(key));
        }
        self.processors.insert(key, processor);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn MappingProcessor>> {
        self.processors.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.processors.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

/// Run every processor named in `mapping` against `response`.
///
/// Unknown names are warned about; a failing processor is logged and does not stop the
/// others. Returns how many processors completed.
pub fn apply_data_mapping(
    mapping: &Value,
    response: &Value,
    ctx: &BindingContext,
    target: &dyn DataTarget,
    registry: &MappingRegistry,
    evaluator: &Evaluator,
) -> usize {
    let Some(entries) = mapping.as_object() else {
        return 0;
    };

    let mut completed = 0;
    for (name, config) in entries {
        let Some(processor) = registry.get(name) else {
            tracing::warn!(processor = %name, "unknown data mapping processor");
            continue;
        };
        match processor.apply(config, response, ctx, target, evaluator) {
            Ok(()) => completed += 1,
            Err(err) => {
                tracing::error!(processor = %name, error = %err, "data mapping processor failed");
            }
        }
    }
    completed
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimpleMappingConfig {
    string_map: Map<String, Value>,
    on_error_map: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MappingItem {
    #[serde(default)]
    value: Option<String>,
    #[serde(default = "required_by_default")]
    required: bool,
    #[serde(default, deserialize_with = "present")]
    default_value: Option<Value>,
    #[serde(default)]
    update_mode: Option<String>,
}

fn required_by_default() -> bool {
    true
}

#[derive(Debug, PartialEq)]
struct PlannedWrite {
    path: String,
    value: Option<Value>,
    mode: UpdateMode,
}

/// Destination location → response location associations.
///
/// All writes are planned before any is applied. When a required source is missing the
/// plan fails as a whole, and `onErrorMap` (whose locations are references into the
/// current data) is planned and applied instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleMapping;

impl MappingProcessor for SimpleMapping {
    fn apply(
        &self,
        config: &Value,
        response: &Value,
        ctx: &BindingContext,
        target: &dyn DataTarget,
        evaluator: &Evaluator,
    ) -> RuntimeResult<()> {
        let config: SimpleMappingConfig = serde_json::from_value(config.clone())
            .map_err(|err| RuntimeError::processor(SIMPLE_MAPPING, err.to_string()))?;

        let from_response = |location: &str| retrieve(response, location).map(Some);
        let writes = match plan(&config.string_map, &from_response, ctx, evaluator) {
            Ok(writes) => writes,
            Err(err) => {
                let Some(on_error_map) = &config.on_error_map else {
                    return Err(err);
                };
                tracing::warn!(error = %err, "simple mapping failed, applying onErrorMap");
                let from_data = |location: &str| -> RuntimeResult<Option<Value>> {
                    Ok(ctx.evaluate(evaluator, &Value::String(location.to_owned()), -1)?)
                };
                plan(on_error_map, &from_data, ctx, evaluator)?
            }
        };

        for write in writes {
            target.update_absolute(&write.path, write.value, write.mode)?;
        }
        Ok(())
    }
}

fn plan(
    map: &Map<String, Value>,
    source: &dyn Fn(&str) -> RuntimeResult<Option<Value>>,
    ctx: &BindingContext,
    evaluator: &Evaluator,
) -> RuntimeResult<Vec<PlannedWrite>> {
    let mut writes = Vec::with_capacity(map.len());
    for (destination, item) in map {
        if let Some(write) = plan_item(destination, item, source, ctx, evaluator)? {
            writes.push(write);
        }
    }
    Ok(writes)
}

fn plan_item(
    destination: &str,
    item: &Value,
    source: &dyn Fn(&str) -> RuntimeResult<Option<Value>>,
    ctx: &BindingContext,
    evaluator: &Evaluator,
) -> RuntimeResult<Option<PlannedWrite>> {
    let item: MappingItem = match serde_json::from_value(item.clone()) {
        Ok(item) => item,
        Err(err) => {
            tracing::warn!(destination, error = %err, "invalid mapping item");
            return Ok(None);
        }
    };

    let mode = match item.update_mode.as_deref() {
        None | Some("") | Some("replace") => UpdateMode::Replace,
        Some("add") => UpdateMode::Add,
        Some("remove") => UpdateMode::Remove,
        Some("move") => UpdateMode::Move,
        Some(other) => {
            tracing::warn!(destination, update_mode = other, "invalid mapping update mode");
            return Ok(None);
        }
    };

    let Some(location) = item.value.as_deref().filter(|location| !location.is_empty()) else {
        tracing::warn!(destination, "mapping item has no value location");
        return Ok(None);
    };

    let path = ctx.resolve_path(destination)?;
    if !is_under_root(&path, &ctx.global.path) {
        tracing::warn!(destination, resolved = %path, "mapping destination is not a data path");
        return Ok(None);
    }

    match source(location) {
        Ok(value) => Ok(Some(PlannedWrite { path, value, mode })),
        Err(_) if item.required => Err(RuntimeError::required_value_missing(location)),
        Err(_) => match &item.default_value {
            Some(default_value) => Ok(Some(PlannedWrite {
                path,
                value: ctx.evaluate(evaluator, default_value, -1)?,
                mode,
            })),
            None => Ok(None),
        },
    }
}

/// Whether `path` is the store root or lies below it.
pub(crate) fn is_under_root(path: &str, root: &str) -> bool {
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Read a dot-separated location out of response data.
fn retrieve(data: &Value, location: &str) -> RuntimeResult<Value> {
    if location.is_empty() {
        return Err(RuntimeError::EmptyLocation);
    }
    let mut current = data;
    for segment in location.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| RuntimeError::required_value_missing(location))?;
    }
    Ok(current.clone())
}
