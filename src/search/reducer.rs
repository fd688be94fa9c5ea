//! Reduction of aggregation buckets into typed statistics

use crate::models::{
    AnalyticsStats, DistributionEntry, FrameworkCoverage, MatrixCell, OverdueBreakdown, Priority,
    Severity, Suggestions, TermCount, TimelinePoint, TodoStats, TodoStatus,
};
use crate::search::aggregation::names;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Decimal places for basic stats percentages
pub const STATS_PRECISION: u32 = 0;

/// Decimal places for analytics percentages and completion rates
pub const ANALYTICS_PRECISION: u32 = 2;

/// One aggregation bucket with any nested sub-aggregations
#[derive(Debug, Clone, Deserialize)]
pub struct Bucket {
    pub key: Value,

    #[serde(default)]
    pub key_as_string: Option<String>,

    #[serde(default)]
    pub doc_count: u64,

    #[serde(flatten)]
    pub aggregations: Map<String, Value>,
}

impl Bucket {
    /// Bucket key as a string; numeric keys are rendered
    pub fn key(&self) -> Option<String> {
        match &self.key {
            Value::String(key) => Some(key.clone()),
            Value::Number(key) => Some(key.to_string()),
            Value::Bool(key) => Some(key.to_string()),
            _ => None,
        }
    }
}

/// `count / total * 100` rounded to `precision` decimals; 0 when `total` is 0
pub fn percentage(count: u64, total: u64, precision: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let factor = 10f64.powi(precision as i32);
    let raw = count as f64 / total as f64 * 100.0;
    ((raw * factor).round() / factor).clamp(0.0, 100.0)
}

/// Buckets of the named terms/histogram aggregation; empty when absent
pub fn buckets(aggs: &Map<String, Value>, name: &str) -> Vec<Bucket> {
    let Some(raw) = aggs.get(name).and_then(|agg| agg.get("buckets")) else {
        return Vec::new();
    };
    match Vec::<Bucket>::deserialize(raw) {
        Ok(buckets) => buckets,
        Err(e) => {
            tracing::warn!(aggregation = name, error = %e, "Malformed aggregation buckets");
            Vec::new()
        }
    }
}

/// `doc_count` of a single-bucket aggregation (`missing`, `filter`)
pub fn doc_count(aggs: &Map<String, Value>, name: &str) -> u64 {
    aggs.get(name)
        .and_then(|agg| agg.get("doc_count"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Counts for every enum value, overlaid with observed buckets
///
/// Keys that are not valid enum values are dropped.
pub fn dense_counts<T>(all: &[T], buckets: &[Bucket]) -> BTreeMap<T, u64>
where
    T: FromStr + Ord + Copy,
{
    let mut counts: BTreeMap<T, u64> = all.iter().map(|value| (*value, 0)).collect();
    for bucket in buckets {
        if let Some(value) = bucket.key().and_then(|key| T::from_str(&key).ok()) {
            *counts.entry(value).or_insert(0) += bucket.doc_count;
        }
    }
    counts
}

fn distribution<T>(all: &[T], buckets: &[Bucket], total: u64) -> Vec<DistributionEntry<T>>
where
    T: FromStr + Ord + Copy,
{
    dense_counts(all, buckets)
        .into_iter()
        .map(|(value, count)| DistributionEntry {
            value,
            count,
            percentage: percentage(count, total, ANALYTICS_PRECISION),
        })
        .collect()
}

fn term_counts(buckets: Vec<Bucket>) -> Vec<TermCount> {
    buckets
        .into_iter()
        .filter_map(|bucket| {
            bucket.key().map(|key| TermCount {
                key,
                count: bucket.doc_count,
            })
        })
        .collect()
}

fn timeline(buckets: Vec<Bucket>) -> Vec<TimelinePoint> {
    buckets
        .into_iter()
        .filter_map(|bucket| {
            let date = bucket
                .key
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .or_else(|| bucket.key_as_string.as_deref()?.parse().ok())?;
            Some(TimelinePoint {
                date,
                count: bucket.doc_count,
            })
        })
        .collect()
}

/// Reduce the basic stats aggregations
pub fn reduce_stats(total: u64, aggs: &Map<String, Value>) -> TodoStats {
    let by_status = dense_counts(&TodoStatus::ALL, &buckets(aggs, names::BY_STATUS));
    let status_percentages = by_status
        .iter()
        .map(|(status, count)| (*status, percentage(*count, total, STATS_PRECISION)))
        .collect();

    TodoStats {
        total,
        by_status,
        status_percentages,
        top_tags: term_counts(buckets(aggs, names::TOP_TAGS)),
        completion_timeline: timeline(buckets(aggs, names::COMPLETION_TIMELINE)),
        top_assignees: term_counts(buckets(aggs, names::TOP_ASSIGNEES)),
        unassigned_count: doc_count(aggs, names::UNASSIGNED),
    }
}

/// Flatten the nested priority -> severity buckets into a dense grid
///
/// Bucket keys outside the known enums are skipped.
pub fn reduce_matrix(buckets: &[Bucket], total: u64) -> Vec<MatrixCell> {
    let mut counts: BTreeMap<(Priority, Severity), u64> = BTreeMap::new();

    for priority_bucket in buckets {
        let Some(priority) = priority_bucket
            .key()
            .and_then(|key| Priority::from_str(&key).ok())
        else {
            tracing::debug!(key = ?priority_bucket.key, "Skipping unknown priority bucket");
            continue;
        };

        for severity_bucket in self::buckets(&priority_bucket.aggregations, names::BY_SEVERITY) {
            match severity_bucket
                .key()
                .and_then(|key| Severity::from_str(&key).ok())
            {
                Some(severity) => {
                    *counts.entry((priority, severity)).or_insert(0) += severity_bucket.doc_count;
                }
                None => {
                    tracing::debug!(key = ?severity_bucket.key, "Skipping unknown severity bucket");
                }
            }
        }
    }

    Priority::ALL
        .iter()
        .flat_map(|priority| Severity::ALL.iter().map(move |severity| (*priority, *severity)))
        .map(|(priority, severity)| {
            let count = counts.get(&(priority, severity)).copied().unwrap_or(0);
            MatrixCell {
                priority,
                severity,
                count,
                percentage: percentage(count, total, ANALYTICS_PRECISION),
            }
        })
        .collect()
}

fn compliance_coverage(buckets: Vec<Bucket>) -> Vec<FrameworkCoverage> {
    buckets
        .into_iter()
        .filter_map(|bucket| {
            let framework = bucket.key()?;
            let by_status = dense_counts(
                &TodoStatus::ALL,
                &self::buckets(&bucket.aggregations, names::BY_STATUS),
            );
            let done = by_status.get(&TodoStatus::Done).copied().unwrap_or(0);

            Some(FrameworkCoverage {
                framework,
                total: bucket.doc_count,
                completion_rate: percentage(done, bucket.doc_count, ANALYTICS_PRECISION),
                by_status,
            })
        })
        .collect()
}

fn overdue(aggs: &Map<String, Value>) -> OverdueBreakdown {
    let Some(Value::Object(overdue)) = aggs.get(names::OVERDUE) else {
        return OverdueBreakdown {
            total: 0,
            by_priority: dense_counts(&Priority::ALL, &[]),
            by_severity: dense_counts(&Severity::ALL, &[]),
        };
    };

    OverdueBreakdown {
        total: overdue.get("doc_count").and_then(Value::as_u64).unwrap_or(0),
        by_priority: dense_counts(&Priority::ALL, &buckets(overdue, names::BY_PRIORITY)),
        by_severity: dense_counts(&Severity::ALL, &buckets(overdue, names::BY_SEVERITY)),
    }
}

/// Reduce the analytics aggregations
pub fn reduce_analytics(
    total: u64,
    aggs: &Map<String, Value>,
    computed_at: DateTime<Utc>,
) -> AnalyticsStats {
    AnalyticsStats {
        computed_at,
        total_tasks: total,
        compliance_coverage: compliance_coverage(buckets(aggs, names::COMPLIANCE_COVERAGE)),
        overdue: overdue(aggs),
        priority_distribution: distribution(
            &Priority::ALL,
            &buckets(aggs, names::PRIORITY_DISTRIBUTION),
            total,
        ),
        severity_distribution: distribution(
            &Severity::ALL,
            &buckets(aggs, names::SEVERITY_DISTRIBUTION),
            total,
        ),
        priority_severity_matrix: reduce_matrix(
            &buckets(aggs, names::PRIORITY_SEVERITY_MATRIX),
            total,
        ),
    }
}

/// Reduce the suggestion aggregations into plain value lists
pub fn reduce_suggestions(aggs: &Map<String, Value>) -> Suggestions {
    let keys = |name: &str| {
        buckets(aggs, name)
            .iter()
            .filter_map(Bucket::key)
            .collect::<Vec<_>>()
    };

    Suggestions {
        tags: keys(names::TAGS),
        compliance_frameworks: keys(names::COMPLIANCE_FRAMEWORKS),
    }
}
