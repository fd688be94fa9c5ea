//! Storage shape of a todo inside the search index

use crate::models::{Priority, Severity, TodoStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Indexed todo document (`_source` of a hit)
///
/// Fields introduced after the first index version are optional on read so
/// legacy documents still deserialize; `due_date`, `compliance_framework` and
/// `completed_at` are always written, using `null` for "unset".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoDocument {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub status: TodoStatus,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[serde(default)]
    pub severity: Option<Severity>,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub compliance_framework: Option<Vec<String>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Partial update body
///
/// Outer `None` means "leave untouched" and is never serialized; for the
/// nullable fields `Some(None)` is written as an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TodoDocumentDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_framework: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,

    pub updated_at: DateTime<Utc>,
}
