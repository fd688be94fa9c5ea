//! Search engine client seam, wire response types and error classification

use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Failure reported by the engine or its transport
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", describe(.error_type, .reason))]
pub struct EngineError {
    /// HTTP status, absent for transport failures
    pub status: Option<u16>,

    /// Engine error type, e.g. `resource_already_exists_exception`
    pub error_type: Option<String>,

    pub reason: String,
}

fn describe(error_type: &Option<String>, reason: &str) -> String {
    match error_type {
        Some(error_type) => format!("{}: {}", error_type, reason),
        None => reason.to_string(),
    }
}

impl EngineError {
    pub fn new(status: Option<u16>, error_type: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            status,
            error_type,
            reason: reason.into(),
        }
    }

    /// Transport-level failure with no engine response
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::new(None, None, reason)
    }

    /// Parse an engine error envelope
    ///
    /// Accepts `{"error": {"type", "reason"}, "status"}`, `{"error": "..."}`
    /// and bodies without an `error` key such as a `found: false` lookup.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error"));

        let (error_type, reason) = match error {
            Some(Value::Object(details)) => (
                details.get("type").and_then(Value::as_str).map(str::to_string),
                details
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or(body)
                    .to_string(),
            ),
            Some(Value::String(reason)) => (None, reason.clone()),
            _ if body.trim().is_empty() => (None, format!("engine responded with status {}", status)),
            _ => (None, body.to_string()),
        };

        Self::new(Some(status), error_type, reason)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// A concurrent creator already made the index
    pub fn is_already_exists(&self) -> bool {
        self.error_type
            .as_deref()
            .is_some_and(|t| t == "resource_already_exists_exception")
    }
}

/// Normalize an engine failure into the crate error taxonomy
///
/// A 404 for a specific document becomes `NotFound`; everything else is
/// wrapped as `IndexOperationFailed` with the engine message intact.
pub fn classify(err: EngineError, entity: &str, id: Option<&str>) -> AppError {
    match id {
        Some(id) if err.is_not_found() => AppError::not_found(entity, id),
        _ => {
            tracing::error!(
                status = ?err.status,
                error_type = ?err.error_type,
                reason = %err.reason,
                "Search engine operation failed"
            );
            AppError::IndexOperationFailed(err.to_string())
        }
    }
}

/// Single stored document
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(value) | TotalHits::Object { value } => *value,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: Option<TotalHits>,

    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// `_search` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub took: u64,

    #[serde(default)]
    pub hits: Hits,

    #[serde(default)]
    pub aggregations: Map<String, Value>,
}

impl SearchResponse {
    pub fn total(&self) -> u64 {
        self.hits.total.as_ref().map(TotalHits::value).unwrap_or(0)
    }
}

/// Document store operations the repository depends on
///
/// Write operations must not return before the change is visible to
/// searches (`refresh=wait_for`).
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn index_exists(&self, index: &str) -> Result<bool, EngineError>;

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), EngineError>;

    /// Index a new document and return the engine-assigned id
    async fn index_document(&self, index: &str, document: &Value) -> Result<String, EngineError>;

    async fn get_document(&self, index: &str, id: &str) -> Result<Hit, EngineError>;

    /// Merge `partial` into the stored document
    async fn update_document(&self, index: &str, id: &str, partial: &Value)
        -> Result<(), EngineError>;

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), EngineError>;

    async fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, EngineError>;

    /// Run a scripted update over matching documents; returns the updated count
    async fn update_by_query(&self, index: &str, body: &Value) -> Result<u64, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_error() {
        let err = EngineError::from_response(
            400,
            r#"{"error":{"type":"resource_already_exists_exception","reason":"index [todos/abc] already exists"},"status":400}"#,
        );
        assert!(err.is_already_exists());
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "resource_already_exists_exception: index [todos/abc] already exists"
        );
    }

    #[test]
    fn test_parse_document_missing() {
        let err = EngineError::from_response(404, r#"{"_index":"todos","_id":"x","found":false}"#);
        assert!(err.is_not_found());
        assert!(err.error_type.is_none());
    }

    #[test]
    fn test_parse_empty_body() {
        let err = EngineError::from_response(503, "");
        assert_eq!(err.reason, "engine responded with status 503");
    }

    #[test]
    fn test_classify_not_found() {
        let err = EngineError::from_response(404, "{}");
        match classify(err, "Todo", Some("abc")) {
            AppError::NotFound { entity, id } => {
                assert_eq!(entity, "Todo");
                assert_eq!(id, "abc");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_wraps_everything_else() {
        let err = EngineError::transport("connection refused");
        match classify(err, "Todo", Some("abc")) {
            AppError::IndexOperationFailed(message) => assert_eq!(message, "connection refused"),
            other => panic!("unexpected {:?}", other),
        }

        let missing_index = EngineError::from_response(
            404,
            r#"{"error":{"type":"index_not_found_exception","reason":"no such index [todos]"}}"#,
        );
        assert!(matches!(
            classify(missing_index, "Todo", None),
            AppError::IndexOperationFailed(_)
        ));
    }

    #[test]
    fn test_search_response_total_formats() {
        let modern: SearchResponse =
            serde_json::from_str(r#"{"took":3,"hits":{"total":{"value":7,"relation":"eq"},"hits":[]}}"#)
                .unwrap();
        let legacy: SearchResponse =
            serde_json::from_str(r#"{"hits":{"total":4,"hits":[]}}"#).unwrap();

        assert_eq!(modern.total(), 7);
        assert_eq!(legacy.total(), 4);
        assert!(modern.aggregations.is_empty());
    }
}
