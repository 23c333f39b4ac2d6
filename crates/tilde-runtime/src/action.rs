//! Network-bound actions: `fetchData` and `submitData`.
//!
//! Both go through the same pipeline:
//!
//! ```text
//! latch ─▶ evaluate url ─▶ Transport::send ─▶ alter_data ─▶ response handling
//!   │                                                          │
//!   └── busy: Skipped                     refreshAppOnResponse = false: Ignored
//!                                         updateOnlyData: write data (root or location)
//!                                         otherwise: Reload(document)
//! ```
//!
//! Only one action runs at a time per [`crate::Session`]; the latch is released on every
//! exit path, including transport failures.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tilde_state::{DataTarget, UpdateMode, UpdateOutcome};
use tilde_template::is_truthy;

use crate::context::BindingContext;
use crate::error::RuntimeResult;
use crate::mapping::is_under_root;
use crate::processor::alter_data;
use crate::reaction::present;
use crate::runtime::Runtime;
use crate::transport::FetchRequest;

/// Arguments shared by `fetchData` and `submitData`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpActionArgs {
    /// Request URL; may be a reference.
    pub url: Option<Value>,
    pub http_method: Option<String>,
    /// Whether the response is used at all. Defaults to true.
    pub refresh_app_on_response: Option<bool>,
    /// Treat the response as data instead of a whole document.
    pub update_only_data: bool,
    /// Where the response data goes when `update_only_data` is set. Root data when absent.
    pub update_data_at_location: Option<String>,
    pub submit_silently: Option<bool>,
    /// Payload for `submitData`, evaluated one level deep.
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// What an action did with its response.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    /// Another action holds the session latch.
    Skipped,
    /// The URL evaluated to nothing.
    MissingUrl,
    /// The response was not used.
    Ignored,
    /// Response data was written to the store.
    DataUpdated(UpdateOutcome),
    /// The response is a new document for the caller to load.
    Reload(Value),
}

/// Request data and apply the response. The default method is GET.
pub async fn fetch_data(
    runtime: &Runtime,
    args: &HttpActionArgs,
    ctx: &BindingContext,
    target: &dyn DataTarget,
) -> RuntimeResult<ActionOutcome> {
    let method = args.http_method.as_deref().unwrap_or("get");
    execute(runtime, args, method, None, None, ctx, target, "fetchData").await
}

/// Send the current data and apply the response. The default method is POST.
///
/// Without `data` the payload is `{"data": <global tree>}`. With `data`, each direct
/// member is evaluated and `__state` from the global tree is appended when present.
pub async fn submit_data(
    runtime: &Runtime,
    args: &HttpActionArgs,
    ctx: &BindingContext,
    target: &dyn DataTarget,
) -> RuntimeResult<ActionOutcome> {
    let method = args.http_method.as_deref().unwrap_or("post");
    let payload = submission_payload(args.data.as_ref(), ctx)?;
    execute(
        runtime,
        args,
        method,
        Some(payload),
        args.submit_silently,
        ctx,
        target,
        "submitData",
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn execute(
    runtime: &Runtime,
    args: &HttpActionArgs,
    method: &str,
    body: Option<Value>,
    silent: Option<bool>,
    ctx: &BindingContext,
    target: &dyn DataTarget,
    action: &'static str,
) -> RuntimeResult<ActionOutcome> {
    let Some(_guard) = runtime.session().try_begin_submission(silent) else {
        tracing::debug!(action, "submission in progress, action skipped");
        return Ok(ActionOutcome::Skipped);
    };

    let url = match args.url.as_ref() {
        Some(url) => ctx.evaluate_scalar(url)?,
        None => None,
    };
    let Some(url) = url.as_ref().and_then(Value::as_str).filter(|url| !url.is_empty()) else {
        return Ok(ActionOutcome::MissingUrl);
    };

    let mut request = FetchRequest::new(method, url).with_headers(runtime.session().headers());
    if let Some(body) = body {
        request = request.with_body(body);
    }

    let response = match runtime.transport().send(request.clone()).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(action, url, error = %err, "could not execute request");
            return Err(err);
        }
    };

    if !args.refresh_app_on_response.unwrap_or(true) {
        return Ok(ActionOutcome::Ignored);
    }

    let altered = alter_data(
        &request.context(),
        &response.context(),
        &response.body,
        !args.update_only_data,
        runtime.processors(),
    );

    if !args.update_only_data {
        return Ok(ActionOutcome::Reload(altered));
    }

    let Some(location) = args.update_data_at_location.as_deref() else {
        return Ok(ActionOutcome::DataUpdated(target.replace_root(altered)?));
    };

    let path = ctx.resolve_path(location)?;
    let root = &ctx.global.path;
    if !is_under_root(&path, root) {
        tracing::warn!(
            action,
            location,
            resolved = %path,
            "updateDataAtLocation is not a data path"
        );
        return Ok(ActionOutcome::Ignored);
    }
    let outcome = if &path == root {
        target.replace_root(altered)?
    } else {
        target.update_absolute(&path, Some(altered), UpdateMode::Replace)?
    };
    Ok(ActionOutcome::DataUpdated(outcome))
}

fn submission_payload(data: Option<&Value>, ctx: &BindingContext) -> RuntimeResult<Value> {
    let Some(data) = data else {
        let mut payload = Map::new();
        payload.insert("data".to_owned(), (*ctx.global.tree).clone());
        return Ok(Value::Object(payload));
    };

    let mut payload = match data {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| -> RuntimeResult<Value> {
                    Ok(ctx.evaluate_scalar(item)?.unwrap_or(Value::Null))
                })
                .collect::<RuntimeResult<Vec<_>>>()?,
        ),
        Value::Object(entries) => {
            let mut evaluated = Map::new();
            for (key, value) in entries {
                if let Some(value) = ctx.evaluate_scalar(value)? {
                    evaluated.insert(key.clone(), value);
                }
            }
            Value::Object(evaluated)
        }
        scalar => ctx
            .evaluate_scalar(scalar)?
            .filter(is_truthy)
            .unwrap_or(Value::Null),
    };

    if let (Some(state), Value::Object(payload)) = (ctx.global.tree.get("__state"), &mut payload) {
        payload.insert("__state".to_owned(), state.clone());
    }
    Ok(payload)
}
