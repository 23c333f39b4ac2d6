//! Additional data sources: documents may ask for more data to be fetched after load.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tilde_state::{value_type_name, DataTarget, UpdateMode, UpdateOutcome};
use tokio::task::JoinHandle;

use crate::context::BindingContext;
use crate::error::RuntimeResult;
use crate::mapping::apply_data_mapping;
use crate::processor::alter_data;
use crate::runtime::Runtime;
use crate::transport::FetchRequest;

/// One entry of a document's `additionalDataSource` list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdditionalDataSource {
    /// URL to fetch. Sources without one are skipped.
    pub src: Option<String>,
    /// HTTP method, GET when absent.
    pub method: Option<String>,
    /// Data location receiving the body. The body is merged into root data when absent.
    pub path: Option<String>,
    /// Blocking sources are loaded before the view is considered ready.
    pub blocking: bool,
    /// Mapping configuration used instead of `path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_mapping: Option<Value>,
}

/// Write a fetched body into `target`.
///
/// - With `dataMapping`, the mapping processors decide where data goes.
/// - With `path`, the body is written at the resolved location.
/// - Otherwise each top-level key of the body is written individually under root data;
///   a body that is not an object is ignored.
pub fn merge_data_source_result(
    source: &AdditionalDataSource,
    body: Value,
    ctx: &BindingContext,
    target: &dyn DataTarget,
    runtime: &Runtime,
) -> RuntimeResult<UpdateOutcome> {
    if let Some(mapping) = &source.data_mapping {
        let completed = apply_data_mapping(
            mapping,
            &body,
            ctx,
            target,
            runtime.mappings(),
            runtime.evaluator(),
        );
        return Ok(if completed > 0 {
            UpdateOutcome::Applied
        } else {
            UpdateOutcome::Unchanged
        });
    }

    let root = &ctx.global.path;
    let Some(location) = source.path.as_deref() else {
        let entries = match body {
            Value::Object(entries) => entries,
            other => {
                tracing::warn!(
                    src = source.src.as_deref(),
                    body_type = value_type_name(&other),
                    "data source body cannot be merged at root, expected an object"
                );
                return Ok(UpdateOutcome::Unchanged);
            }
        };
        let mut outcome = UpdateOutcome::Unchanged;
        for (key, value) in entries {
            let changed =
                target.update_absolute(&format!("{root}.{key}"), Some(value), UpdateMode::Replace)?;
            if changed.is_changed() {
                outcome = changed;
            }
        }
        return Ok(outcome);
    };

    let path = ctx.resolve_path(location)?;
    Ok(target.update_absolute(&path, Some(body), UpdateMode::Replace)?)
}

/// Fetch every source and merge the results into `target`.
///
/// Blocking sources are fetched together and awaited. Non-blocking sources are spawned
/// afterwards; their handles are returned so callers may wait for them. Failures are
/// logged and never abort the other sources.
pub async fn load_additional_sources(
    sources: &[AdditionalDataSource],
    runtime: &Runtime,
    target: Arc<dyn DataTarget>,
) -> Vec<JoinHandle<()>> {
    let (blocking, background): (Vec<_>, Vec<_>) = sources
        .iter()
        .cloned()
        .enumerate()
        .partition(|(_, source)| source.blocking);

    join_all(
        blocking
            .into_iter()
            .map(|(index, source)| fetch_source(index, source, runtime.clone(), target.clone())),
    )
    .await;

    background
        .into_iter()
        .map(|(index, source)| {
            tokio::spawn(fetch_source(index, source, runtime.clone(), target.clone()))
        })
        .collect()
}

async fn fetch_source(
    index: usize,
    source: AdditionalDataSource,
    runtime: Runtime,
    target: Arc<dyn DataTarget>,
) {
    let Some(src) = source.src.as_deref() else {
        tracing::warn!(index, "additional data source has no src, skipped");
        return;
    };

    let request = FetchRequest::new(source.method.as_deref().unwrap_or("GET"), src)
        .with_headers(runtime.session().headers());
    let response = match runtime.transport().send(request.clone()).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(index, src, error = %err, "could not fetch additional data source");
            return;
        }
    };

    let body = alter_data(
        &request.context(),
        &response.context(),
        &response.body,
        false,
        runtime.processors(),
    );

    let merged = BindingContext::from_target(target.as_ref())
        .and_then(|ctx| merge_data_source_result(&source, body, &ctx, target.as_ref(), &runtime));
    if let Err(err) = merged {
        tracing::error!(index, src, error = %err, "could not merge additional data source");
    }
}
