#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tilde_runtime::{FetchRequest, FetchResponse, RuntimeError, RuntimeResult, Transport};
use tokio::sync::Notify;

/// A deterministic transport serving fixed bodies by URL.
///
/// Unknown URLs fail with a transport error. When gated, every request waits for
/// one `notify_one` on the gate before answering.
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<String, Value>,
    requests: Mutex<Vec<FetchRequest>>,
    gate: Option<Arc<Notify>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, body: Value) -> Self {
        self.routes.insert(url.to_owned(), body);
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: FetchRequest) -> RuntimeResult<FetchResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.routes.get(&request.url) {
            Some(body) => Ok(FetchResponse::ok(body.clone())),
            None => Err(RuntimeError::transport(format!("404 {}", request.url))),
        }
    }
}
