//! Request and response objects exchanged with the transport layer

use crate::error::AppError;
use crate::models::{Priority, Severity, TodoStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// Payload for creating a todo
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(max = 4000))]
    pub description: Option<String>,

    pub status: Option<TodoStatus>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    pub assignee: Option<String>,

    pub priority: Option<Priority>,

    pub severity: Option<Severity>,

    pub due_date: Option<DateTime<Utc>>,

    #[validate(length(max = 10))]
    pub compliance_frameworks: Option<Vec<String>>,
}

/// Payload for partially updating a todo
///
/// Absent fields are left untouched. An empty `description` or `assignee`
/// clears the field, and `dueDate: null` clears the due date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,

    #[validate(length(max = 4000))]
    pub description: Option<String>,

    pub status: Option<TodoStatus>,

    pub tags: Option<Vec<String>>,

    pub assignee: Option<String>,

    pub priority: Option<Priority>,

    pub severity: Option<Severity>,

    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,

    #[validate(length(max = 10))]
    pub compliance_frameworks: Option<Vec<String>>,
}

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`)
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Upper bound for a single compliance framework label
pub const MAX_FRAMEWORK_LEN: usize = 100;

impl CreateTodoRequest {
    /// Derived length rules plus the per-framework bound
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        check_frameworks(self.compliance_frameworks.as_deref())
    }
}

impl UpdateTodoRequest {
    /// Derived length rules plus the per-framework bound
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        check_frameworks(self.compliance_frameworks.as_deref())
    }
}

fn check_frameworks(frameworks: Option<&[String]>) -> Result<(), AppError> {
    match frameworks
        .unwrap_or_default()
        .iter()
        .find(|f| f.chars().count() > MAX_FRAMEWORK_LEN)
    {
        Some(framework) => Err(AppError::Validation(format!(
            "compliance framework '{}' exceeds {} characters",
            framework, MAX_FRAMEWORK_LEN
        ))),
        None => Ok(()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Accepts either a single value or a list for enum filters
fn one_or_many<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort and pagination options for `search`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoFilter {
    pub page: Option<u32>,
    pub page_size: Option<u32>,

    #[serde(deserialize_with = "one_or_many")]
    pub status: Vec<TodoStatus>,
    #[serde(deserialize_with = "one_or_many")]
    pub priority: Vec<Priority>,
    #[serde(deserialize_with = "one_or_many")]
    pub severity: Vec<Severity>,

    /// Every listed tag must be present
    pub tags: Vec<String>,

    /// Any listed framework may match
    pub compliance_frameworks: Vec<String>,

    pub assignee: Option<String>,
    pub search_text: Option<String>,

    pub due_date_after: Option<DateTime<Utc>>,
    pub due_date_before: Option<DateTime<Utc>>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub updated_after: Option<DateTime<Utc>>,
    pub updated_before: Option<DateTime<Utc>>,
    pub completed_after: Option<DateTime<Utc>>,
    pub completed_before: Option<DateTime<Utc>>,

    pub is_overdue: Option<bool>,

    /// Logical field name; unknown names fall back to the creation timestamp
    pub sort_field: Option<String>,
    pub sort_direction: Option<SortDirection>,
}

/// One page of results plus derived page metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
        };

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// Histogram granularity for the completion timeline
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompletionInterval {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

/// Time window and granularity for `get_stats` / `get_analytics`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsQuery {
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub interval: Option<CompletionInterval>,
}
