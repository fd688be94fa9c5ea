//! Todo repository: sequences index checks, request building, engine calls
//! and response mapping for every public operation

use crate::error::{AppError, Result};
use crate::models::{
    AnalyticsStats, CreateTodoRequest, PaginatedResponse, StatsQuery, Suggestions, Todo,
    TodoDocument, TodoFilter, TodoStats, UpdateTodoRequest,
};
use crate::search::aggregation::AggregationBuilder;
use crate::search::engine::{classify, Hit, SearchEngine, SearchResponse};
use crate::search::query::{QueryBuilder, SearchRequest};
use crate::search::sort::resolve_sort;
use crate::search::{document, reducer, IndexManager, SearchConfig};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

const ENTITY: &str = "Todo";

/// Data-access entry point for todos
pub struct TodoRepository {
    engine: Arc<dyn SearchEngine>,
    index: IndexManager,
    config: SearchConfig,
}

impl TodoRepository {
    pub fn new(engine: Arc<dyn SearchEngine>, config: SearchConfig) -> Self {
        Self {
            index: IndexManager::new(engine.clone(), config.clone()),
            engine,
            config,
        }
    }

    pub fn index_manager(&self) -> &IndexManager {
        &self.index
    }

    fn index_name(&self) -> &str {
        &self.config.index_name
    }

    /// Create a todo and return it with its assigned id
    pub async fn create(&self, request: &CreateTodoRequest) -> Result<Todo> {
        self.index.ensure_index().await?;

        let doc = document::to_create_document(request, Utc::now());
        let body = serde_json::to_value(&doc)?;
        let id = self
            .engine
            .index_document(self.index_name(), &body)
            .await
            .map_err(|e| classify(e, ENTITY, None))?;

        tracing::info!(todo_id = %id, status = %doc.status, "Todo created");
        Ok(document::from_storage(id, doc))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Todo> {
        self.index.ensure_index().await?;

        let hit = self
            .engine
            .get_document(self.index_name(), id)
            .await
            .map_err(|e| classify(e, ENTITY, Some(id)))?;
        hit_to_todo(hit)?.ok_or_else(|| AppError::not_found(ENTITY, id))
    }

    /// Apply a partial update and return the post-update view
    pub async fn update(&self, id: &str, request: &UpdateTodoRequest) -> Result<Todo> {
        let existing = self.get_by_id(id).await?;

        let delta = document::to_update_document(request, &existing, Utc::now());
        let body = serde_json::to_value(&delta)?;
        self.engine
            .update_document(self.index_name(), id, &body)
            .await
            .map_err(|e| classify(e, ENTITY, Some(id)))?;

        tracing::info!(todo_id = %id, "Todo updated");
        Ok(document::merge_update(&existing, &delta, id))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.index.ensure_index().await?;

        self.engine
            .delete_document(self.index_name(), id)
            .await
            .map_err(|e| classify(e, ENTITY, Some(id)))?;

        tracing::info!(todo_id = %id, "Todo deleted");
        Ok(())
    }

    /// Filtered, sorted, paginated search
    pub async fn search(&self, filter: &TodoFilter) -> Result<PaginatedResponse<Todo>> {
        self.search_at(filter, Utc::now()).await
    }

    /// `search` with an explicit reference time for the overdue predicate
    pub async fn search_at(
        &self,
        filter: &TodoFilter,
        now: DateTime<Utc>,
    ) -> Result<PaginatedResponse<Todo>> {
        self.index.ensure_index().await?;

        let (page, page_size) = self.config.pagination(filter.page, filter.page_size);
        let request = SearchRequest {
            query: QueryBuilder::new(now).build(filter),
            sort: vec![resolve_sort(
                filter.sort_field.as_deref(),
                filter.sort_direction,
            )],
            from: u64::from(page - 1) * u64::from(page_size),
            size: u64::from(page_size),
            track_total_hits: true,
            aggs: Default::default(),
        };

        let response = self.run_search(&request).await?;
        let total = response.total();
        let items = response
            .hits
            .hits
            .into_iter()
            .filter_map(|hit| {
                let id = hit.id.clone();
                hit_to_todo(hit).unwrap_or_else(|e| {
                    tracing::warn!(todo_id = %id, error = %e, "Skipping undecodable document");
                    None
                })
            })
            .collect();

        Ok(PaginatedResponse::new(items, total, page, page_size))
    }

    pub async fn get_stats(&self, query: &StatsQuery) -> Result<TodoStats> {
        self.index.ensure_index().await?;

        let request = SearchRequest::aggregations_only(
            QueryBuilder::new(Utc::now()).build_stats(query),
            AggregationBuilder::new(&self.config).basic_stats(query.interval),
        );
        let response = self.run_search(&request).await?;
        Ok(reducer::reduce_stats(response.total(), &response.aggregations))
    }

    pub async fn get_analytics(&self, query: &StatsQuery) -> Result<AnalyticsStats> {
        self.get_analytics_at(query, Utc::now()).await
    }

    /// `get_analytics` with an explicit reference time for the overdue breakdown
    pub async fn get_analytics_at(
        &self,
        query: &StatsQuery,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsStats> {
        self.index.ensure_index().await?;

        let request = SearchRequest::aggregations_only(
            QueryBuilder::new(now).build_stats(query),
            AggregationBuilder::new(&self.config).analytics(now),
        );
        let response = self.run_search(&request).await?;
        Ok(reducer::reduce_analytics(
            response.total(),
            &response.aggregations,
            now,
        ))
    }

    /// Distinct tags and compliance frameworks currently in use
    pub async fn get_suggestions(&self) -> Result<Suggestions> {
        self.index.ensure_index().await?;

        let request = SearchRequest::aggregations_only(
            QueryBuilder::new(Utc::now()).build_stats(&StatsQuery::default()),
            AggregationBuilder::new(&self.config).suggestions(),
        );
        let response = self.run_search(&request).await?;
        Ok(reducer::reduce_suggestions(&response.aggregations))
    }

    async fn run_search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let body = serde_json::to_value(request)?;
        tracing::debug!(index = %self.index_name(), body = %body, "Executing search");
        self.engine
            .search(self.index_name(), &body)
            .await
            .map_err(|e| classify(e, ENTITY, None))
    }
}

/// Map a hit to a todo; hits without a source yield `None`
fn hit_to_todo(hit: Hit) -> Result<Option<Todo>> {
    match hit.source {
        None | Some(Value::Null) => Ok(None),
        Some(source) => {
            let doc: TodoDocument = serde_json::from_value(source)?;
            Ok(Some(document::from_storage(hit.id, doc)))
        }
    }
}
