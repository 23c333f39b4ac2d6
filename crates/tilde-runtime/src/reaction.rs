//! Data reactions: writes triggered by events, addressed with references.
//!
//! Every reaction resolves its `path` against the local scope of the [`BindingContext`] it
//! fires in, evaluates its payload one level deep, and hands the write to a [`DataTarget`].
//! A reaction without a `path` does nothing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tilde_state::{DataTarget, UpdateMode, UpdateOutcome};
use tilde_template::Evaluator;

use crate::context::BindingContext;
use crate::error::RuntimeResult;

/// Keep an explicit `null` as `Some(Value::Null)`; only an absent field is `None`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SetDataArgs {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AddDataArgs {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoveDataArgs {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveDataArgs {
    #[serde(default)]
    pub path: Option<String>,
    /// Signed offset: an integer, or a reference or numeric string evaluating to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<Value>,
}

/// A data reaction descriptor, tagged by `what`.
///
/// ```json
/// {"what": "setData", "on": "click", "path": "~.done", "value": true}
/// ```
///
/// Fields that belong to the event wiring (such as `on`) are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "what", rename_all = "camelCase")]
pub enum Reaction {
    SetData(SetDataArgs),
    AddData(AddDataArgs),
    RemoveData(RemoveDataArgs),
    MoveData(MoveDataArgs),
}

impl Reaction {
    pub fn name(&self) -> &'static str {
        match self {
            Reaction::SetData(_) => "setData",
            Reaction::AddData(_) => "addData",
            Reaction::RemoveData(_) => "removeData",
            Reaction::MoveData(_) => "moveData",
        }
    }

    /// Run this reaction.
    pub fn apply(
        &self,
        ctx: &BindingContext,
        target: &dyn DataTarget,
        evaluator: &Evaluator,
    ) -> RuntimeResult<UpdateOutcome> {
        match self {
            Reaction::SetData(args) => set_data(args, ctx, target, evaluator),
            Reaction::AddData(args) => add_data(args, ctx, target, evaluator),
            Reaction::RemoveData(args) => remove_data(args, ctx, target),
            Reaction::MoveData(args) => move_data(args, ctx, target, evaluator),
        }
    }
}

/// Replace the value at `path` with the evaluated `value`. An absent value deletes the key.
pub fn set_data(
    args: &SetDataArgs,
    ctx: &BindingContext,
    target: &dyn DataTarget,
    evaluator: &Evaluator,
) -> RuntimeResult<UpdateOutcome> {
    let value = evaluate_payload(args.value.as_ref(), ctx, evaluator)?;
    write(args.path.as_deref(), value, UpdateMode::Replace, ctx, target)
}

/// Append the evaluated `value` to the list at `path`.
pub fn add_data(
    args: &AddDataArgs,
    ctx: &BindingContext,
    target: &dyn DataTarget,
    evaluator: &Evaluator,
) -> RuntimeResult<UpdateOutcome> {
    let value = evaluate_payload(args.value.as_ref(), ctx, evaluator)?;
    write(args.path.as_deref(), value, UpdateMode::Add, ctx, target)
}

/// Drop the list element at `path`.
pub fn remove_data(
    args: &RemoveDataArgs,
    ctx: &BindingContext,
    target: &dyn DataTarget,
) -> RuntimeResult<UpdateOutcome> {
    write(args.path.as_deref(), None, UpdateMode::Remove, ctx, target)
}

/// Shift the list element at `path` by `increment` positions.
pub fn move_data(
    args: &MoveDataArgs,
    ctx: &BindingContext,
    target: &dyn DataTarget,
    evaluator: &Evaluator,
) -> RuntimeResult<UpdateOutcome> {
    let increment = evaluate_payload(args.increment.as_ref(), ctx, evaluator)?;
    let value = increment.map(|increment| json!({ "increment": increment }));
    write(args.path.as_deref(), value, UpdateMode::Move, ctx, target)
}

/// Run reactions in order. A failing reaction is logged and does not stop its siblings.
pub fn dispatch_reactions(
    reactions: &[Reaction],
    ctx: &BindingContext,
    target: &dyn DataTarget,
    evaluator: &Evaluator,
) -> Vec<RuntimeResult<UpdateOutcome>> {
    reactions
        .iter()
        .map(|reaction| {
            let result = reaction.apply(ctx, target, evaluator);
            if let Err(err) = &result {
                tracing::error!(reaction = reaction.name(), error = %err, "reaction failed");
            }
            result
        })
        .collect()
}

fn evaluate_payload(
    value: Option<&Value>,
    ctx: &BindingContext,
    evaluator: &Evaluator,
) -> RuntimeResult<Option<Value>> {
    match value {
        Some(value) => Ok(ctx.evaluate(evaluator, value, evaluator.config().default_depth)?),
        None => Ok(None),
    }
}

fn write(
    path: Option<&str>,
    value: Option<Value>,
    mode: UpdateMode,
    ctx: &BindingContext,
    target: &dyn DataTarget,
) -> RuntimeResult<UpdateOutcome> {
    let Some(path) = path else {
        return Ok(UpdateOutcome::Unchanged);
    };
    let absolute = ctx.resolve_path(path)?;
    Ok(target.update_absolute(&absolute, value, mode)?)
}
