//! Document payloads: the JSON an application is loaded from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tilde_state::{ReactiveStore, StoreConfig, StoreHandle};
use tokio::task::JoinHandle;

use crate::error::RuntimeResult;
use crate::runtime::Runtime;
use crate::source::{load_additional_sources, AdditionalDataSource};

/// A parsed application document.
///
/// ```json
/// {
///   "renderView": { "main": { "type": "Text", "content": "~~.greeting" } },
///   "templates": {},
///   "data": { "greeting": "Hello" },
///   "additionalDataSource": [{ "src": "/api/user", "path": "~~.user" }]
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Document {
    pub render_view: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Value>,
    /// Legacy name of `templates`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_forms: Option<Value>,
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_data_source: Vec<AdditionalDataSource>,
}

impl Document {
    pub fn from_json_str(json: &str) -> RuntimeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> RuntimeResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The templates of this document, falling back to the legacy `listForms`.
    pub fn templates(&self) -> Option<&Value> {
        if self.templates.is_none() && self.list_forms.is_some() {
            tracing::warn!("'listForms' is deprecated, rename it to 'templates'");
        }
        self.templates.as_ref().or(self.list_forms.as_ref())
    }

    /// Names of the top-level views, in document order.
    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.render_view.keys().map(String::as_str)
    }

    /// Build the root store from `data`, or from `data_override` when given.
    pub fn into_store(self, data_override: Option<Value>, config: StoreConfig) -> LoadedDocument {
        let templates = self.templates().cloned();
        let data = data_override.unwrap_or(self.data);
        LoadedDocument {
            store: StoreHandle::new(ReactiveStore::with_config(data, config)),
            render_view: self.render_view,
            templates,
            additional_data_source: self.additional_data_source,
        }
    }

    /// [`Document::into_store`] with the store settings of `runtime`.
    pub fn into_store_with(
        self,
        data_override: Option<Value>,
        runtime: &Runtime,
    ) -> LoadedDocument {
        self.into_store(data_override, runtime.config().store.clone())
    }
}

/// A document whose data now lives in a store.
#[derive(Clone, Debug)]
pub struct LoadedDocument {
    pub store: StoreHandle,
    pub render_view: Map<String, Value>,
    pub templates: Option<Value>,
    pub additional_data_source: Vec<AdditionalDataSource>,
}

impl LoadedDocument {
    /// Fetch the document's additional data sources into its store.
    ///
    /// Returns once blocking sources are merged; see [`load_additional_sources`].
    pub async fn load_sources(&self, runtime: &Runtime) -> Vec<JoinHandle<()>> {
        if self.additional_data_source.is_empty() {
            return Vec::new();
        }
        load_additional_sources(
            &self.additional_data_source,
            runtime,
            Arc::new(self.store.clone()),
        )
        .await
    }
}
