//! The network seam: requests go out through a [`Transport`], responses come back as JSON.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::RuntimeResult;
use crate::processor::{RequestContext, ResponseContext};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchRequest {
    /// Upper-case HTTP method.
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl FetchRequest {
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        self.headers = headers.clone();
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn context(&self) -> RequestContext {
        RequestContext {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl FetchResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body,
        }
    }

    pub(crate) fn context(&self) -> ResponseContext {
        ResponseContext {
            status: self.status,
            headers: self.headers.clone(),
            data: self.body.clone(),
        }
    }
}

/// Sends requests on behalf of actions and data sources.
///
/// Implementations decode the response body as JSON and report non-success statuses
/// as [`crate::RuntimeError::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: FetchRequest) -> RuntimeResult<FetchResponse>;
}
