//! Logical sort fields and their indexed counterparts

use crate::models::SortDirection;
use crate::search::query::fields;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::str::FromStr;
use strum::{Display, EnumString};

/// Fields a caller may sort by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum SortField {
    Title,
    Status,
    Priority,
    Severity,
    DueDate,
    #[default]
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}

impl SortField {
    /// Name of the indexed field to sort on
    ///
    /// `title` is analyzed text, so its keyword sub-field is used instead.
    pub fn indexed_field(self) -> &'static str {
        match self {
            SortField::Title => fields::TITLE_KEYWORD,
            SortField::Status => fields::STATUS,
            SortField::Priority => fields::PRIORITY,
            SortField::Severity => fields::SEVERITY,
            SortField::DueDate => fields::DUE_DATE,
            SortField::CreatedAt => fields::CREATED_AT,
            SortField::UpdatedAt => fields::UPDATED_AT,
            SortField::CompletedAt => fields::COMPLETED_AT,
        }
    }
}

/// A resolved `{ field: { order } }` sort entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl Serialize for SortClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Order {
            order: SortDirection,
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            self.field,
            &Order {
                order: self.direction,
            },
        )?;
        map.end()
    }
}

/// Resolve a requested sort; unknown or missing fields fall back to
/// creation time, missing direction to descending
pub fn resolve_sort(field: Option<&str>, direction: Option<SortDirection>) -> SortClause {
    let field = match field.map(|name| name.trim().replace('_', "")) {
        Some(name) => SortField::from_str(&name).unwrap_or_else(|_| {
            tracing::debug!(sort_field = %name, "Unknown sort field, using default");
            SortField::default()
        }),
        None => SortField::default(),
    };

    SortClause {
        field: field.indexed_field(),
        direction: direction.unwrap_or_default(),
    }
}
