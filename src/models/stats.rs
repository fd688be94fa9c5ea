//! Statistics and analytics responses

use crate::models::{Priority, Severity, TodoStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A term and the number of documents carrying it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCount {
    pub key: String,
    pub count: u64,
}

/// One completion histogram bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: DateTime<Utc>,
    pub count: u64,
}

/// Basic statistics; percentages are whole percents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total: u64,
    /// Every status is present, zero-filled
    pub by_status: BTreeMap<TodoStatus, u64>,
    pub status_percentages: BTreeMap<TodoStatus, f64>,
    pub top_tags: Vec<TermCount>,
    pub completion_timeline: Vec<TimelinePoint>,
    pub top_assignees: Vec<TermCount>,
    pub unassigned_count: u64,
}

/// Count and share of one enum value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry<T> {
    pub value: T,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixCell {
    pub priority: Priority,
    pub severity: Severity,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkCoverage {
    pub framework: String,
    pub total: u64,
    pub by_status: BTreeMap<TodoStatus, u64>,
    /// Share of `done` todos, two decimals
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueBreakdown {
    pub total: u64,
    pub by_priority: BTreeMap<Priority, u64>,
    pub by_severity: BTreeMap<Severity, u64>,
}

/// Advanced analytics; percentages carry two decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    pub computed_at: DateTime<Utc>,
    pub total_tasks: u64,
    pub compliance_coverage: Vec<FrameworkCoverage>,
    pub overdue: OverdueBreakdown,
    pub priority_distribution: Vec<DistributionEntry<Priority>>,
    pub severity_distribution: Vec<DistributionEntry<Severity>>,
    pub priority_severity_matrix: Vec<MatrixCell>,
}

/// Distinct values currently present, for autocomplete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    pub tags: Vec<String>,
    pub compliance_frameworks: Vec<String>,
}
