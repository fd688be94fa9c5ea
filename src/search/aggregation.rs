//! Typed aggregation DSL and the stats/analytics aggregation trees

use crate::models::{CompletionInterval, Priority, Severity};
use crate::search::config::SearchConfig;
use crate::search::query::{fields, Query};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Bucket bound for enum-valued terms aggregations; larger than any enum so
/// unknown keys from index drift cannot crowd out valid ones
const ENUM_BUCKETS: u32 = 20;

/// Aggregation names shared by the builders and the reducer
pub mod names {
    pub const BY_STATUS: &str = "by_status";
    pub const TOP_TAGS: &str = "top_tags";
    pub const COMPLETION_TIMELINE: &str = "completion_timeline";
    pub const TOP_ASSIGNEES: &str = "top_assignees";
    pub const UNASSIGNED: &str = "unassigned";

    pub const COMPLIANCE_COVERAGE: &str = "compliance_coverage";
    pub const OVERDUE: &str = "overdue";
    pub const BY_PRIORITY: &str = "by_priority";
    pub const BY_SEVERITY: &str = "by_severity";
    pub const PRIORITY_DISTRIBUTION: &str = "priority_distribution";
    pub const SEVERITY_DISTRIBUTION: &str = "severity_distribution";
    pub const PRIORITY_SEVERITY_MATRIX: &str = "priority_severity_matrix";

    pub const TAGS: &str = "tags";
    pub const COMPLIANCE_FRAMEWORKS: &str = "compliance_frameworks";
}

/// Named sub-aggregations
pub type Aggregations = BTreeMap<String, Aggregation>;

/// One aggregation request node
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    Terms {
        field: String,
        size: u32,
        /// Bucket documents lacking the field under this key
        missing: Option<String>,
        aggs: Aggregations,
    },
    DateHistogram {
        field: String,
        interval: CompletionInterval,
    },
    Filter {
        filter: Query,
        aggs: Aggregations,
    },
    Missing {
        field: String,
    },
}

impl Aggregation {
    pub fn terms(field: &str, size: u32) -> Self {
        Aggregation::Terms {
            field: field.to_string(),
            size,
            missing: None,
            aggs: Aggregations::new(),
        }
    }

    /// Count documents without the field under `value`; no-op for non-terms kinds
    pub fn or_missing(mut self, value: impl ToString) -> Self {
        if let Aggregation::Terms { missing, .. } = &mut self {
            *missing = Some(value.to_string());
        }
        self
    }

    /// Attach a named sub-aggregation; ignored for leaf-only kinds
    pub fn with_sub(mut self, name: &str, sub: Aggregation) -> Self {
        if let Aggregation::Terms { aggs, .. } | Aggregation::Filter { aggs, .. } = &mut self {
            aggs.insert(name.to_string(), sub);
        }
        self
    }

    /// Render the wire representation
    pub fn to_json(&self) -> Value {
        let (mut body, aggs) = match self {
            Aggregation::Terms {
                field,
                size,
                missing,
                aggs,
            } => {
                let mut terms = json!({ "field": field, "size": size });
                if let Some(missing) = missing {
                    terms["missing"] = Value::String(missing.clone());
                }
                (json!({ "terms": terms }), Some(aggs))
            }
            Aggregation::DateHistogram { field, interval } => (
                json!({
                    "date_histogram": {
                        "field": field,
                        "calendar_interval": interval.to_string(),
                        "min_doc_count": 1,
                    }
                }),
                None,
            ),
            Aggregation::Filter { filter, aggs } => {
                (json!({ "filter": filter.to_json() }), Some(aggs))
            }
            Aggregation::Missing { field } => (json!({ "missing": { "field": field } }), None),
        };

        if let Some(aggs) = aggs.filter(|aggs| !aggs.is_empty()) {
            let rendered: Map<String, Value> = aggs
                .iter()
                .map(|(name, agg)| (name.clone(), agg.to_json()))
                .collect();
            body["aggs"] = Value::Object(rendered);
        }
        body
    }
}

impl Serialize for Aggregation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Builds aggregation trees from the configured bucket sizes
pub struct AggregationBuilder<'a> {
    config: &'a SearchConfig,
}

impl<'a> AggregationBuilder<'a> {
    pub fn new(config: &'a SearchConfig) -> Self {
        Self { config }
    }

    /// Status histogram, top tags, completion timeline, top assignees, unassigned count
    pub fn basic_stats(&self, interval: Option<CompletionInterval>) -> Aggregations {
        let mut aggs = Aggregations::new();
        aggs.insert(
            names::BY_STATUS.to_string(),
            Aggregation::terms(fields::STATUS, ENUM_BUCKETS),
        );
        aggs.insert(
            names::TOP_TAGS.to_string(),
            Aggregation::terms(fields::TAGS, self.config.top_tags_size),
        );
        aggs.insert(
            names::COMPLETION_TIMELINE.to_string(),
            Aggregation::DateHistogram {
                field: fields::COMPLETED_AT.to_string(),
                interval: interval.unwrap_or(self.config.completion_interval),
            },
        );
        aggs.insert(
            names::TOP_ASSIGNEES.to_string(),
            Aggregation::terms(fields::ASSIGNEE, self.config.top_assignees_size),
        );
        aggs.insert(
            names::UNASSIGNED.to_string(),
            Aggregation::Missing {
                field: fields::ASSIGNEE.to_string(),
            },
        );
        aggs
    }

    /// Compliance coverage, overdue breakdown, distributions and the
    /// priority/severity matrix
    pub fn analytics(&self, now: DateTime<Utc>) -> Aggregations {
        let mut aggs = Aggregations::new();
        aggs.insert(
            names::COMPLIANCE_COVERAGE.to_string(),
            Aggregation::terms(fields::COMPLIANCE_FRAMEWORK, self.config.frameworks_size)
                .with_sub(names::BY_STATUS, Aggregation::terms(fields::STATUS, ENUM_BUCKETS)),
        );
        aggs.insert(
            names::OVERDUE.to_string(),
            Aggregation::Filter {
                filter: Query::overdue(now),
                aggs: Aggregations::new(),
            }
            .with_sub(names::BY_PRIORITY, priority_terms())
            .with_sub(names::BY_SEVERITY, severity_terms()),
        );
        aggs.insert(
            names::PRIORITY_DISTRIBUTION.to_string(),
            priority_terms(),
        );
        aggs.insert(
            names::SEVERITY_DISTRIBUTION.to_string(),
            severity_terms(),
        );
        aggs.insert(
            names::PRIORITY_SEVERITY_MATRIX.to_string(),
            priority_terms()
                .with_sub(names::BY_SEVERITY, severity_terms()),
        );
        aggs
    }

    /// Distinct tags and frameworks for autocomplete
    pub fn suggestions(&self) -> Aggregations {
        let mut aggs = Aggregations::new();
        aggs.insert(
            names::TAGS.to_string(),
            Aggregation::terms(fields::TAGS, self.config.suggestions_size),
        );
        aggs.insert(
            names::COMPLIANCE_FRAMEWORKS.to_string(),
            Aggregation::terms(fields::COMPLIANCE_FRAMEWORK, self.config.suggestions_size),
        );
        aggs
    }
}

/// Priority terms; legacy documents without a priority count as the default
fn priority_terms() -> Aggregation {
    Aggregation::terms(fields::PRIORITY, ENUM_BUCKETS).or_missing(Priority::default())
}

/// Severity terms; legacy documents without a severity count as the default
fn severity_terms() -> Aggregation {
    Aggregation::terms(fields::SEVERITY, ENUM_BUCKETS).or_missing(Severity::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stats_tree() {
        let config = SearchConfig::default();
        let aggs = AggregationBuilder::new(&config).basic_stats(None);
        let json = serde_json::to_value(&aggs).unwrap();

        assert_eq!(
            json["by_status"],
            json!({ "terms": { "field": "status", "size": 20 } })
        );
        assert_eq!(json["top_tags"]["terms"]["size"], 10);
        assert_eq!(
            json["completion_timeline"]["date_histogram"]["calendar_interval"],
            "day"
        );
        assert_eq!(json["unassigned"], json!({ "missing": { "field": "assignee" } }));
    }

    #[test]
    fn test_interval_override() {
        let config = SearchConfig::default();
        let aggs = AggregationBuilder::new(&config).basic_stats(Some(CompletionInterval::Month));
        assert_eq!(
            aggs[names::COMPLETION_TIMELINE].to_json()["date_histogram"]["calendar_interval"],
            "month"
        );
    }

    #[test]
    fn test_analytics_tree_nests_sub_aggregations() {
        let config = SearchConfig::default();
        let now: DateTime<Utc> = "2024-06-01T00:00:00Z".parse().unwrap();
        let json = serde_json::to_value(AggregationBuilder::new(&config).analytics(now)).unwrap();

        assert_eq!(
            json["compliance_coverage"]["aggs"]["by_status"]["terms"]["field"],
            "status"
        );
        assert_eq!(
            json["overdue"]["filter"]["bool"]["must_not"],
            json!([{ "term": { "status": "done" } }])
        );
        assert_eq!(
            json["overdue"]["aggs"]["by_priority"]["terms"]["field"],
            "priority"
        );
        assert_eq!(
            json["priority_severity_matrix"]["aggs"]["by_severity"]["terms"]["field"],
            "severity"
        );
        assert!(json["priority_distribution"].get("aggs").is_none());
    }

    #[test]
    fn test_legacy_documents_fall_into_default_buckets() {
        let config = SearchConfig::default();
        let now: DateTime<Utc> = "2024-06-01T00:00:00Z".parse().unwrap();
        let json = serde_json::to_value(AggregationBuilder::new(&config).analytics(now)).unwrap();

        assert_eq!(
            json["priority_distribution"],
            json!({ "terms": { "field": "priority", "size": 20, "missing": "medium" } })
        );
        assert_eq!(json["severity_distribution"]["terms"]["missing"], "low");
        assert_eq!(json["priority_severity_matrix"]["terms"]["missing"], "medium");
        assert_eq!(
            json["priority_severity_matrix"]["aggs"]["by_severity"]["terms"]["missing"],
            "low"
        );
        assert_eq!(json["overdue"]["aggs"]["by_priority"]["terms"]["missing"], "medium");
        assert_eq!(json["overdue"]["aggs"]["by_severity"]["terms"]["missing"], "low");
        assert!(json["compliance_coverage"]["terms"].get("missing").is_none());
    }

    #[test]
    fn test_suggestions_are_bounded() {
        let config = SearchConfig::default();
        let json = serde_json::to_value(AggregationBuilder::new(&config).suggestions()).unwrap();
        assert_eq!(json["tags"]["terms"]["size"], 100);
        assert_eq!(
            json["compliance_frameworks"]["terms"]["field"],
            "compliance_framework"
        );
    }
}
