//! Search index lifecycle: creation on first use and legacy-field backfill

use crate::error::Result;
use crate::search::config::SearchConfig;
use crate::search::engine::{classify, SearchEngine};
use crate::search::query::fields;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

const ENTITY: &str = "Index";

/// Defaults written into documents created before these fields existed
const BACKFILL_SCRIPT: &str = "\
boolean changed = false;\
if (ctx._source.priority == null) { ctx._source.priority = params.priority; changed = true; }\
if (ctx._source.severity == null) { ctx._source.severity = params.severity; changed = true; }\
if (!ctx._source.containsKey('due_date')) { ctx._source.due_date = null; changed = true; }\
if (ctx._source.compliance_framework == null) { ctx._source.compliance_framework = []; changed = true; }\
if (!changed) { ctx.op = 'noop'; }";

/// Ensures the todo index exists before it is used
///
/// The ready state is memoized per manager. Concurrent first callers share
/// a single initialization; a creation race with another process surfaces
/// as `resource_already_exists_exception` and counts as success.
pub struct IndexManager {
    engine: Arc<dyn SearchEngine>,
    config: SearchConfig,
    ready: OnceCell<()>,
}

impl IndexManager {
    pub fn new(engine: Arc<dyn SearchEngine>, config: SearchConfig) -> Self {
        Self {
            engine,
            config,
            ready: OnceCell::new(),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.config.index_name
    }

    /// Whether a previous `ensure_index` already succeeded
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Settings and mapping used when creating the index
    pub fn index_definition(&self) -> Value {
        json!({
            "settings": {
                "number_of_shards": self.config.number_of_shards,
                "number_of_replicas": self.config.number_of_replicas,
            },
            "mappings": {
                "properties": {
                    (fields::TITLE): {
                        "type": "text",
                        "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
                    },
                    (fields::DESCRIPTION): { "type": "text" },
                    (fields::STATUS): { "type": "keyword" },
                    (fields::TAGS): { "type": "keyword" },
                    (fields::ASSIGNEE): { "type": "keyword" },
                    (fields::PRIORITY): { "type": "keyword" },
                    (fields::SEVERITY): { "type": "keyword" },
                    (fields::DUE_DATE): { "type": "date" },
                    (fields::COMPLIANCE_FRAMEWORK): { "type": "keyword" },
                    (fields::CREATED_AT): { "type": "date" },
                    (fields::UPDATED_AT): { "type": "date" },
                    (fields::COMPLETED_AT): { "type": "date" },
                }
            }
        })
    }

    /// Make sure the index exists, creating it on first use
    pub async fn ensure_index(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| self.create_if_missing())
            .await
            .map(|_| ())
    }

    async fn create_if_missing(&self) -> Result<()> {
        let index = self.index_name();

        let exists = self
            .engine
            .index_exists(index)
            .await
            .map_err(|e| classify(e, ENTITY, None))?;
        if exists {
            tracing::debug!(index = %index, "Index already present");
            return Ok(());
        }

        match self.engine.create_index(index, &self.index_definition()).await {
            Ok(()) => {
                tracing::info!(
                    index = %index,
                    shards = self.config.number_of_shards,
                    replicas = self.config.number_of_replicas,
                    "Created search index"
                );
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                tracing::debug!(index = %index, "Index created concurrently, continuing");
                Ok(())
            }
            Err(e) => Err(classify(e, ENTITY, None)),
        }
    }

    /// Fill defaults into documents missing priority, severity, due date or
    /// compliance frameworks; returns the number of updated documents
    ///
    /// Safe to run repeatedly; documents already carrying every field are
    /// left untouched.
    pub async fn backfill(&self) -> Result<u64> {
        self.ensure_index().await?;

        let missing = |field: &str| json!({ "bool": { "must_not": { "exists": { "field": field } } } });
        let body = json!({
            "query": {
                "bool": {
                    "should": [
                        missing(fields::PRIORITY),
                        missing(fields::SEVERITY),
                        missing(fields::DUE_DATE),
                        missing(fields::COMPLIANCE_FRAMEWORK),
                    ],
                    "minimum_should_match": 1
                }
            },
            "script": {
                "lang": "painless",
                "source": BACKFILL_SCRIPT,
                "params": { "priority": "medium", "severity": "low" }
            }
        });

        let updated = self
            .engine
            .update_by_query(self.index_name(), &body)
            .await
            .map_err(|e| classify(e, ENTITY, None))?;

        tracing::info!(index = %self.index_name(), updated, "Backfilled legacy todo fields");
        Ok(updated)
    }
}
