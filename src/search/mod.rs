//! Search engine data access for todos
//!
//! Todos live in a single Elasticsearch/OpenSearch index. This module turns
//! typed requests and filters into engine request bodies and turns engine
//! responses back into domain values:
//!
//! - **Normalization**: tag and compliance framework cleanup before storage
//! - **Document mapping**: create/update payloads and the post-update view
//! - **Query building**: filter predicates, full-text matching, overdue logic
//! - **Sorting**: public sort names resolved to indexed fields
//! - **Aggregations**: stats, analytics and suggestion requests
//! - **Reduction**: buckets into zero-filled, percentage-annotated statistics
//! - **Index lifecycle**: lazy creation and legacy-field backfill
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           TodoRepository                         │
//! ├─────────────────────────────────────────────────┤
//! │  - create()  get_by_id()  update()  delete()    │
//! │  - search()  get_stats()  get_analytics()       │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │  QueryBuilder / AggregationBuilder / reducer    │
//! │  IndexManager (ready flag, mapping, backfill)   │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │  SearchEngine trait  ──  HttpEngine (REST)      │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo_search::config::Config;
//! use todo_search::models::TodoFilter;
//! use todo_search::repository::TodoRepository;
//! use todo_search::search::HttpEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let engine = Arc::new(HttpEngine::new(&config.engine)?);
//!     let repository = TodoRepository::new(engine, config.search);
//!
//!     let filter = TodoFilter {
//!         search_text: Some("audit".to_string()),
//!         is_overdue: Some(true),
//!         ..Default::default()
//!     };
//!
//!     let page = repository.search(&filter).await?;
//!     println!("Found {} todos", page.total);
//!
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod config;
pub mod document;
pub mod engine;
pub mod http;
pub mod index;
pub mod normalize;
pub mod query;
pub mod reducer;
pub mod sort;

pub use aggregation::{Aggregation, AggregationBuilder, Aggregations};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use engine::{classify, EngineError, Hit, SearchEngine, SearchResponse};
pub use http::HttpEngine;
pub use index::IndexManager;
pub use normalize::{normalize_compliance_frameworks, normalize_tags};
pub use query::{BoolQuery, Query, QueryBuilder, SearchRequest};
pub use sort::{resolve_sort, SortClause, SortField};
