//! Search configuration

use crate::models::CompletionInterval;
use serde::{Deserialize, Serialize};

/// Index and query tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the todo index
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Primary shard count used when creating the index
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Replica count used when creating the index
    #[serde(default)]
    pub number_of_replicas: u32,

    /// Page size when the request does not specify one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper clamp for requested page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Number of tags in the stats top-N
    #[serde(default = "default_top_n")]
    pub top_tags_size: u32,

    /// Number of assignees in the stats top-N
    #[serde(default = "default_top_n")]
    pub top_assignees_size: u32,

    /// Bucket bound for autocomplete suggestions
    #[serde(default = "default_bucket_bound")]
    pub suggestions_size: u32,

    /// Bucket bound for compliance coverage
    #[serde(default = "default_bucket_bound")]
    pub frameworks_size: u32,

    /// Completion timeline granularity when the request does not specify one
    #[serde(default)]
    pub completion_interval: CompletionInterval,

    /// Run the legacy-field backfill when the service starts
    #[serde(default)]
    pub backfill_on_startup: bool,
}

fn default_index_name() -> String {
    "todos".to_string()
}

fn default_shards() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

fn default_top_n() -> u32 {
    10
}

fn default_bucket_bound() -> u32 {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            number_of_shards: default_shards(),
            number_of_replicas: 0,
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            top_tags_size: default_top_n(),
            top_assignees_size: default_top_n(),
            suggestions_size: default_bucket_bound(),
            frameworks_size: default_bucket_bound(),
            completion_interval: CompletionInterval::Day,
            backfill_on_startup: false,
        }
    }
}

impl SearchConfig {
    /// Clamp a requested page/page size to the configured bounds
    pub fn pagination(&self, page: Option<u32>, page_size: Option<u32>) -> (u32, u32) {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1));
        (page, page_size)
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_name = name.into();
        self
    }

    pub fn shards(mut self, shards: u32, replicas: u32) -> Self {
        self.config.number_of_shards = shards;
        self.config.number_of_replicas = replicas;
        self
    }

    pub fn default_page_size(mut self, size: u32) -> Self {
        self.config.default_page_size = size;
        self
    }

    pub fn max_page_size(mut self, size: u32) -> Self {
        self.config.max_page_size = size;
        self
    }

    pub fn top_tags_size(mut self, size: u32) -> Self {
        self.config.top_tags_size = size;
        self
    }

    pub fn top_assignees_size(mut self, size: u32) -> Self {
        self.config.top_assignees_size = size;
        self
    }

    pub fn suggestions_size(mut self, size: u32) -> Self {
        self.config.suggestions_size = size;
        self
    }

    pub fn completion_interval(mut self, interval: CompletionInterval) -> Self {
        self.config.completion_interval = interval;
        self
    }

    pub fn backfill_on_startup(mut self, enabled: bool) -> Self {
        self.config.backfill_on_startup = enabled;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamps() {
        let config = SearchConfigBuilder::new()
            .default_page_size(20)
            .max_page_size(50)
            .build();

        assert_eq!(config.pagination(None, None), (1, 20));
        assert_eq!(config.pagination(Some(0), Some(0)), (1, 1));
        assert_eq!(config.pagination(Some(3), Some(500)), (3, 50));
    }

    #[test]
    fn test_builder() {
        let config = SearchConfigBuilder::new()
            .index_name("todos-test")
            .shards(2, 1)
            .completion_interval(CompletionInterval::Week)
            .build();

        assert_eq!(config.index_name, "todos-test");
        assert_eq!(config.number_of_shards, 2);
        assert_eq!(config.number_of_replicas, 1);
        assert_eq!(config.completion_interval, CompletionInterval::Week);
        assert_eq!(config.top_tags_size, 10);
    }
}
