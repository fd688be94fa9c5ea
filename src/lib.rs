//! Search-engine backed data access for compliance-aware todos
//!
//! [`repository::TodoRepository`] is the entry point. It stores todos in an
//! Elasticsearch/OpenSearch index, answers filtered searches and computes
//! dashboard statistics from aggregations.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod search;

pub use error::{AppError, Result};
pub use repository::TodoRepository;
