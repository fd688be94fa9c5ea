use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A tracked task as exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Store-assigned identifier
    pub id: String,

    /// Short title
    pub title: String,

    /// Optional long-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Workflow status
    pub status: TodoStatus,

    /// Lower-cased, deduplicated tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Assigned user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    pub priority: Priority,

    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    /// Compliance framework labels, case preserved
    #[serde(default)]
    pub compliance_frameworks: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Set exactly when `status` is `done`
    pub completed_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// A todo is overdue when it has a past due date and is not done
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TodoStatus::Done && self.due_date.is_some_and(|due| due < now)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Planned,
    InProgress,
    Done,
    Error,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 4] = [
        TodoStatus::Planned,
        TodoStatus::InProgress,
        TodoStatus::Done,
        TodoStatus::Error,
    ];
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];
}
