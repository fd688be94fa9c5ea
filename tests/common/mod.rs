//! Common test utilities for repository testing
//!
//! Provides an in-memory `SearchEngine` that stores documents, records the
//! request bodies it receives and can be told to fail.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use todo_search::search::{
    EngineError, Hit, SearchConfig, SearchConfigBuilder, SearchEngine, SearchResponse,
};
use todo_search::TodoRepository;

/// In-memory engine keyed by document id
#[derive(Default)]
pub struct FakeEngine {
    index_exists: Mutex<bool>,
    documents: Mutex<HashMap<String, Value>>,
    canned_search: Mutex<Option<Value>>,
    failure: Mutex<Option<EngineError>>,
    create_error: Mutex<Option<EngineError>>,
    create_delay: Mutex<Option<Duration>>,

    pub exists_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub created_definitions: Mutex<Vec<Value>>,
    pub search_bodies: Mutex<Vec<Value>>,
    pub update_bodies: Mutex<Vec<Value>>,
    pub update_by_query_bodies: Mutex<Vec<Value>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engine whose index already exists
    pub fn with_index() -> Arc<Self> {
        let engine = Self::default();
        *engine.index_exists.lock() = true;
        Arc::new(engine)
    }

    /// Fail every document and search call with `error`
    pub fn fail_with(&self, error: EngineError) {
        *self.failure.lock() = Some(error);
    }

    /// Fail index creation with `error`
    pub fn fail_create_with(&self, error: EngineError) {
        *self.create_error.lock() = Some(error);
    }

    pub fn delay_create(&self, delay: Duration) {
        *self.create_delay.lock() = Some(delay);
    }

    /// Return `response` from every `_search` call
    pub fn respond_to_search(&self, response: Value) {
        *self.canned_search.lock() = Some(response);
    }

    pub fn insert_raw(&self, id: &str, source: Value) {
        self.documents.lock().insert(id.to_string(), source);
    }

    pub fn stored(&self, id: &str) -> Option<Value> {
        self.documents.lock().get(id).cloned()
    }

    pub fn last_search_body(&self) -> Value {
        self.search_bodies
            .lock()
            .last()
            .cloned()
            .expect("no search recorded")
    }

    fn check_failure(&self) -> Result<(), EngineError> {
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn document_missing(id: &str) -> EngineError {
        EngineError::from_response(404, &json!({ "_id": id, "found": false }).to_string())
    }
}

#[async_trait]
impl SearchEngine for FakeEngine {
    async fn index_exists(&self, _index: &str) -> Result<bool, EngineError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.index_exists.lock())
    }

    async fn create_index(&self, _index: &str, body: &Value) -> Result<(), EngineError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.create_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.create_error.lock().clone() {
            return Err(error);
        }

        self.created_definitions.lock().push(body.clone());
        *self.index_exists.lock() = true;
        Ok(())
    }

    async fn index_document(&self, _index: &str, document: &Value) -> Result<String, EngineError> {
        self.check_failure()?;
        let id = uuid::Uuid::new_v4().to_string();
        self.documents.lock().insert(id.clone(), document.clone());
        Ok(id)
    }

    async fn get_document(&self, _index: &str, id: &str) -> Result<Hit, EngineError> {
        self.check_failure()?;
        let source = self
            .stored(id)
            .ok_or_else(|| Self::document_missing(id))?;
        Ok(Hit {
            id: id.to_string(),
            source: Some(source),
        })
    }

    async fn update_document(
        &self,
        _index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<(), EngineError> {
        self.check_failure()?;
        self.update_bodies.lock().push(partial.clone());

        let mut documents = self.documents.lock();
        let stored = documents
            .get_mut(id)
            .ok_or_else(|| Self::document_missing(id))?;
        if let (Value::Object(target), Value::Object(changes)) = (stored, partial) {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete_document(&self, _index: &str, id: &str) -> Result<(), EngineError> {
        self.check_failure()?;
        self.documents
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::document_missing(id))
    }

    async fn search(&self, _index: &str, body: &Value) -> Result<SearchResponse, EngineError> {
        self.check_failure()?;
        self.search_bodies.lock().push(body.clone());

        let response = match self.canned_search.lock().clone() {
            Some(canned) => canned,
            None => {
                let documents = self.documents.lock();
                let hits: Vec<Value> = documents
                    .iter()
                    .map(|(id, source)| json!({ "_id": id, "_source": source }))
                    .collect();
                json!({
                    "took": 1,
                    "hits": { "total": { "value": hits.len(), "relation": "eq" }, "hits": hits },
                    "aggregations": Map::new(),
                })
            }
        };

        serde_json::from_value(response).map_err(|e| EngineError::transport(e.to_string()))
    }

    async fn update_by_query(&self, _index: &str, body: &Value) -> Result<u64, EngineError> {
        self.check_failure()?;
        self.update_by_query_bodies.lock().push(body.clone());

        let mut updated = 0;
        for source in self.documents.lock().values_mut() {
            let Value::Object(fields) = source else { continue };
            let mut changed = false;
            for (field, default) in [
                ("priority", json!("medium")),
                ("severity", json!("low")),
                ("due_date", Value::Null),
                ("compliance_framework", json!([])),
            ] {
                let missing = match fields.get(field) {
                    None => true,
                    Some(Value::Null) => field != "due_date",
                    Some(_) => false,
                };
                if missing {
                    fields.insert(field.to_string(), default);
                    changed = true;
                }
            }
            if changed {
                updated += 1;
            }
        }
        Ok(updated)
    }
}

pub fn test_config() -> SearchConfig {
    SearchConfigBuilder::new().index_name("todos-test").build()
}

pub fn repository(engine: Arc<FakeEngine>) -> TodoRepository {
    TodoRepository::new(engine, test_config())
}
