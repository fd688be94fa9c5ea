//! Typed query DSL and the builders that translate filters into it

use crate::models::{StatsQuery, TodoFilter, TodoStatus};
use crate::search::aggregation::Aggregation;
use crate::search::normalize::{normalize_compliance_frameworks, normalize_tags};
use crate::search::sort::SortClause;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Indexed field names
pub mod fields {
    pub const TITLE: &str = "title";
    pub const TITLE_KEYWORD: &str = "title.keyword";
    pub const DESCRIPTION: &str = "description";
    pub const STATUS: &str = "status";
    pub const TAGS: &str = "tags";
    pub const ASSIGNEE: &str = "assignee";
    pub const PRIORITY: &str = "priority";
    pub const SEVERITY: &str = "severity";
    pub const DUE_DATE: &str = "due_date";
    pub const COMPLIANCE_FRAMEWORK: &str = "compliance_framework";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const COMPLETED_AT: &str = "completed_at";
}

/// Boost applied to title matches relative to description matches
const TITLE_BOOST: u32 = 2;

/// One node of a search query
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    Term {
        field: String,
        value: String,
    },
    Terms {
        field: String,
        values: Vec<String>,
    },
    Range {
        field: String,
        gte: Option<DateTime<Utc>>,
        lte: Option<DateTime<Utc>>,
        lt: Option<DateTime<Utc>>,
    },
    Exists {
        field: String,
    },
    MultiMatch {
        query: String,
        fields: Vec<String>,
        fuzziness: String,
    },
    Bool(BoolQuery),
}

/// Boolean combination of clauses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub filter: Vec<Query>,
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.filter.is_empty() && self.must_not.is_empty()
    }
}

impl Query {
    pub fn term(field: &str, value: impl ToString) -> Self {
        Query::Term {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// `term` for a single value, `terms` for several
    pub fn any_of<T: ToString>(field: &str, values: &[T]) -> Option<Self> {
        match values {
            [] => None,
            [single] => Some(Query::term(field, single.to_string())),
            many => Some(Query::Terms {
                field: field.to_string(),
                values: many.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    /// Inclusive range; `None` when both bounds are absent
    pub fn date_range(
        field: &str,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        if after.is_none() && before.is_none() {
            return None;
        }
        Some(Query::Range {
            field: field.to_string(),
            gte: after,
            lte: before,
            lt: None,
        })
    }

    pub fn exists(field: &str) -> Self {
        Query::Exists {
            field: field.to_string(),
        }
    }

    /// Due date present and strictly before `now`, status not done
    pub fn overdue(now: DateTime<Utc>) -> Self {
        Query::Bool(BoolQuery {
            must: vec![
                Query::Range {
                    field: fields::DUE_DATE.to_string(),
                    gte: None,
                    lte: None,
                    lt: Some(now),
                },
                Query::exists(fields::DUE_DATE),
            ],
            filter: Vec::new(),
            must_not: vec![Query::term(fields::STATUS, TodoStatus::Done)],
        })
    }

    /// Render the wire representation
    pub fn to_json(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Term { field, value } => json!({ "term": { field: value } }),
            Query::Terms { field, values } => json!({ "terms": { field: values } }),
            Query::Range {
                field,
                gte,
                lte,
                lt,
            } => {
                let mut bounds = Map::new();
                for (op, bound) in [("gte", gte), ("lte", lte), ("lt", lt)] {
                    if let Some(bound) = bound {
                        bounds.insert(op.to_string(), Value::String(format_date(bound)));
                    }
                }
                json!({ "range": { field: bounds } })
            }
            Query::Exists { field } => json!({ "exists": { "field": field } }),
            Query::MultiMatch {
                query,
                fields,
                fuzziness,
            } => json!({
                "multi_match": {
                    "query": query,
                    "fields": fields,
                    "fuzziness": fuzziness,
                }
            }),
            Query::Bool(bool_query) => {
                let mut clauses = Map::new();
                for (occur, queries) in [
                    ("must", &bool_query.must),
                    ("filter", &bool_query.filter),
                    ("must_not", &bool_query.must_not),
                ] {
                    if !queries.is_empty() {
                        clauses.insert(
                            occur.to_string(),
                            Value::Array(queries.iter().map(Query::to_json).collect()),
                        );
                    }
                }
                json!({ "bool": clauses })
            }
        }
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Body of a `_search` request
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: Query,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortClause>,

    pub from: u64,

    pub size: u64,

    pub track_total_hits: bool,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aggs: BTreeMap<String, Aggregation>,
}

impl SearchRequest {
    /// Aggregation-only request; no hits are fetched
    pub fn aggregations_only(query: Query, aggs: BTreeMap<String, Aggregation>) -> Self {
        Self {
            query,
            sort: Vec::new(),
            from: 0,
            size: 0,
            track_total_hits: true,
            aggs,
        }
    }
}

/// Translates filter requests into queries
pub struct QueryBuilder {
    now: DateTime<Utc>,
}

impl QueryBuilder {
    /// `now` anchors the overdue predicate
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Build the query for a filtered search
    pub fn build(&self, filter: &TodoFilter) -> Query {
        let mut query = BoolQuery::default();

        if let Some(text) = filter.search_text.as_deref().map(str::trim) {
            if !text.is_empty() {
                query.must.push(Query::MultiMatch {
                    query: text.to_string(),
                    fields: vec![
                        format!("{}^{}", fields::TITLE, TITLE_BOOST),
                        fields::DESCRIPTION.to_string(),
                    ],
                    fuzziness: "AUTO".to_string(),
                });
            }
        }

        query.filter.extend(Query::any_of(fields::STATUS, &filter.status));
        query.filter.extend(Query::any_of(fields::PRIORITY, &filter.priority));
        query.filter.extend(Query::any_of(fields::SEVERITY, &filter.severity));

        // Every requested tag must be present
        for tag in normalize_tags(&filter.tags) {
            query.filter.push(Query::term(fields::TAGS, tag));
        }

        if let Some(assignee) = filter.assignee.as_deref().map(str::trim) {
            if !assignee.is_empty() {
                query.filter.push(Query::term(fields::ASSIGNEE, assignee));
            }
        }

        let frameworks = normalize_compliance_frameworks(&filter.compliance_frameworks);
        if !frameworks.is_empty() {
            query.filter.push(Query::Terms {
                field: fields::COMPLIANCE_FRAMEWORK.to_string(),
                values: frameworks,
            });
        }

        for (field, after, before) in [
            (fields::DUE_DATE, filter.due_date_after, filter.due_date_before),
            (fields::CREATED_AT, filter.created_after, filter.created_before),
            (fields::UPDATED_AT, filter.updated_after, filter.updated_before),
            (fields::COMPLETED_AT, filter.completed_after, filter.completed_before),
        ] {
            query.filter.extend(Query::date_range(field, after, before));
        }

        if filter.is_overdue == Some(true) {
            query.filter.push(Query::overdue(self.now));
        }

        finish(query)
    }

    /// Build the narrower query used by the statistics endpoints
    pub fn build_stats(&self, stats: &StatsQuery) -> Query {
        let mut query = BoolQuery::default();
        query.filter.extend(Query::date_range(
            fields::CREATED_AT,
            stats.created_after,
            stats.created_before,
        ));
        finish(query)
    }
}

fn finish(query: BoolQuery) -> Query {
    if query.is_empty() {
        Query::MatchAll
    } else {
        Query::Bool(query)
    }
}
