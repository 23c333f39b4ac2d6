//! Response data processors.
//!
//! Processors see every response before it reaches the store, in registration order.
//! A processor that fails is logged and skipped; the next one receives the last good value.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RuntimeResult;

/// The request a response answers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestContext {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

/// The raw response, before any processor ran.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseContext {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
}

/// Everything a processor may inspect besides the value it transforms.
#[derive(Clone, Copy, Debug)]
pub struct ProcessorInput<'a> {
    pub request: &'a RequestContext,
    pub response: &'a ResponseContext,
    /// The value before the first processor ran.
    pub original: &'a Value,
}

/// A transformation applied to response data.
pub trait DataProcessor: Send + Sync {
    /// Stable identifier used in logs.
    fn id(&self) -> &str;

    /// Transform `data`, the output of the previous processor.
    fn process(&self, input: ProcessorInput<'_>, data: &Value) -> RuntimeResult<Value>;
}

/// Run `processors` over a response body.
///
/// With `is_document`, the body is a full document and only its `data` member is processed.
pub fn alter_data(
    request: &RequestContext,
    response: &ResponseContext,
    body: &Value,
    is_document: bool,
    processors: &[Arc<dyn DataProcessor>],
) -> Value {
    if processors.is_empty() {
        return body.clone();
    }

    let original = if is_document {
        body.get("data").cloned().unwrap_or(Value::Null)
    } else {
        body.clone()
    };
    let input = ProcessorInput {
        request,
        response,
        original: &original,
    };

    let mut processed = original.clone();
    for processor in processors {
        match processor.process(input, &processed) {
            Ok(next) => processed = next,
            Err(err) => {
                tracing::error!(processor = processor.id(), error = %err, "data processor failed");
            }
        }
    }

    match (is_document, body) {
        (true, Value::Object(document)) => {
            let mut document = document.clone();
            document.insert("data".to_owned(), processed);
            Value::Object(document)
        }
        (true, _) => body.clone(),
        (false, _) => processed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use serde_json::json;

    struct Tag(&'static str);

    impl DataProcessor for Tag {
        fn id(&self) -> &str {
            self.0
        }

        fn process(&self, _input: ProcessorInput<'_>, data: &Value) -> RuntimeResult<Value> {
            let mut data = data.clone();
            if let Some(tags) = data.get_mut("tags").and_then(Value::as_array_mut) {
                tags.push(json!(self.0));
            }
            Ok(data)
        }
    }

    struct Broken;

    impl DataProcessor for Broken {
        fn id(&self) -> &str {
            "broken"
        }

        fn process(&self, _input: ProcessorInput<'_>, _data: &Value) -> RuntimeResult<Value> {
            Err(RuntimeError::processor("broken", "always fails"))
        }
    }

    struct SeesOriginal;

    impl DataProcessor for SeesOriginal {
        fn id(&self) -> &str {
            "original"
        }

        fn process(&self, input: ProcessorInput<'_>, _data: &Value) -> RuntimeResult<Value> {
            Ok(json!({ "was": input.original, "status": input.response.status }))
        }
    }

    fn contexts() -> (RequestContext, ResponseContext) {
        (
            RequestContext {
                url: "/api".into(),
                method: "GET".into(),
                ..Default::default()
            },
            ResponseContext {
                status: 200,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_no_processors_returns_body() {
        let (req, resp) = contexts();
        let body = json!({"tags": []});
        assert_eq!(alter_data(&req, &resp, &body, false, &[]), body);
    }

    #[test]
    fn test_processors_run_in_order_and_skip_failures() {
        let (req, resp) = contexts();
        let processors: Vec<Arc<dyn DataProcessor>> =
            vec![Arc::new(Tag("a")), Arc::new(Broken), Arc::new(Tag("b"))];
        let body = json!({"tags": []});
        assert_eq!(
            alter_data(&req, &resp, &body, false, &processors),
            json!({"tags": ["a", "b"]})
        );
        assert_eq!(body, json!({"tags": []}));
    }

    #[test]
    fn test_document_processes_data_member_only() {
        let (req, resp) = contexts();
        let processors: Vec<Arc<dyn DataProcessor>> = vec![Arc::new(Tag("x"))];
        let body = json!({"renderView": {"tags": []}, "data": {"tags": []}});
        assert_eq!(
            alter_data(&req, &resp, &body, true, &processors),
            json!({"renderView": {"tags": []}, "data": {"tags": ["x"]}})
        );
    }

    #[test]
    fn test_processor_sees_original_and_response() {
        let (req, resp) = contexts();
        let processors: Vec<Arc<dyn DataProcessor>> =
            vec![Arc::new(Tag("x")), Arc::new(SeesOriginal)];
        let body = json!({"tags": []});
        assert_eq!(
            alter_data(&req, &resp, &body, false, &processors),
            json!({"was": {"tags": []}, "status": 200})
        );
    }
}
