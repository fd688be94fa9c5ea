//! Conversion between indexed documents and domain todos

use crate::models::{
    CreateTodoRequest, Todo, TodoDocument, TodoDocumentDelta, TodoStatus, UpdateTodoRequest,
};
use crate::search::normalize::{normalize_compliance_frameworks, normalize_tags};
use chrono::{DateTime, Utc};

/// Build a domain todo from a stored document
///
/// Legacy documents lacking newer fields get the domain defaults; null
/// collections become empty.
pub fn from_storage(id: impl Into<String>, doc: TodoDocument) -> Todo {
    Todo {
        id: id.into(),
        title: doc.title,
        description: doc.description.filter(|d| !d.is_empty()),
        status: doc.status,
        tags: doc.tags.unwrap_or_default(),
        assignee: doc.assignee.filter(|a| !a.is_empty()),
        priority: doc.priority.unwrap_or_default(),
        severity: doc.severity.unwrap_or_default(),
        due_date: doc.due_date,
        compliance_frameworks: doc.compliance_framework.unwrap_or_default(),
        created_at: doc.created_at,
        updated_at: doc.updated_at,
        completed_at: doc.completed_at,
    }
}

/// Build the document to index for a new todo
pub fn to_create_document(request: &CreateTodoRequest, now: DateTime<Utc>) -> TodoDocument {
    let status = request.status.unwrap_or_default();

    TodoDocument {
        title: request.title.trim().to_string(),
        description: non_blank(request.description.as_deref()),
        status,
        tags: Some(normalize_tags(request.tags.iter().flatten())),
        assignee: non_blank(request.assignee.as_deref()),
        priority: Some(request.priority.unwrap_or_default()),
        severity: Some(request.severity.unwrap_or_default()),
        due_date: request.due_date,
        compliance_framework: Some(normalize_compliance_frameworks(
            request.compliance_frameworks.iter().flatten(),
        )),
        created_at: now,
        updated_at: now,
        completed_at: (status == TodoStatus::Done).then_some(now),
    }
}

/// Build the partial document for an update
///
/// Only fields present in `request` appear in the delta; `updated_at` is
/// always set. Moving into `done` stamps `completed_at`, moving out of it
/// clears the stamp.
pub fn to_update_document(
    request: &UpdateTodoRequest,
    existing: &Todo,
    now: DateTime<Utc>,
) -> TodoDocumentDelta {
    let mut delta = TodoDocumentDelta {
        updated_at: now,
        ..Default::default()
    };

    if let Some(title) = &request.title {
        delta.title = Some(title.trim().to_string());
    }
    if let Some(description) = &request.description {
        delta.description = Some(non_blank(Some(description)));
    }
    if let Some(assignee) = &request.assignee {
        delta.assignee = Some(non_blank(Some(assignee)));
    }
    if let Some(status) = request.status {
        delta.status = Some(status);

        let was_done = existing.status == TodoStatus::Done;
        let is_done = status == TodoStatus::Done;
        if is_done && !was_done {
            delta.completed_at = Some(Some(now));
        } else if !is_done && was_done {
            delta.completed_at = Some(None);
        }
    }
    if let Some(tags) = &request.tags {
        delta.tags = Some(normalize_tags(tags));
    }
    delta.priority = request.priority;
    delta.severity = request.severity;
    delta.due_date = request.due_date;
    if let Some(frameworks) = &request.compliance_frameworks {
        delta.compliance_framework = Some(normalize_compliance_frameworks(frameworks));
    }

    delta
}

/// Apply a delta to the pre-update todo without re-reading from the index
pub fn merge_update(existing: &Todo, delta: &TodoDocumentDelta, id: &str) -> Todo {
    Todo {
        id: id.to_string(),
        title: delta.title.clone().unwrap_or_else(|| existing.title.clone()),
        description: delta
            .description
            .clone()
            .unwrap_or_else(|| existing.description.clone()),
        status: delta.status.unwrap_or(existing.status),
        tags: delta.tags.clone().unwrap_or_else(|| existing.tags.clone()),
        assignee: delta
            .assignee
            .clone()
            .unwrap_or_else(|| existing.assignee.clone()),
        priority: delta.priority.unwrap_or(existing.priority),
        severity: delta.severity.unwrap_or(existing.severity),
        due_date: delta.due_date.unwrap_or(existing.due_date),
        compliance_frameworks: delta
            .compliance_framework
            .clone()
            .unwrap_or_else(|| existing.compliance_frameworks.clone()),
        created_at: existing.created_at,
        updated_at: delta.updated_at,
        completed_at: delta.completed_at.unwrap_or(existing.completed_at),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Severity};
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    fn existing(status: TodoStatus) -> Todo {
        let created = now() - Duration::days(3);
        let doc = to_create_document(
            &CreateTodoRequest {
                title: "Review firewall rules".to_string(),
                description: Some("Quarterly review".to_string()),
                status: Some(status),
                tags: Some(vec!["network".to_string()]),
                assignee: Some("alice".to_string()),
                due_date: Some(created + Duration::days(10)),
                compliance_frameworks: Some(vec!["SOC 2".to_string()]),
                ..Default::default()
            },
            created,
        );
        from_storage("todo-1", doc)
    }

    #[test]
    fn test_create_trims_and_normalizes() {
        let request = CreateTodoRequest {
            title: "  Fix  ".to_string(),
            tags: Some(vec!["Sec".to_string(), "sec".to_string()]),
            ..Default::default()
        };
        let doc = to_create_document(&request, now());

        assert_eq!(doc.title, "Fix");
        assert_eq!(doc.tags, Some(vec!["sec".to_string()]));
        assert_eq!(doc.status, TodoStatus::Planned);
        assert_eq!(doc.priority, Some(Priority::Medium));
        assert_eq!(doc.severity, Some(Severity::Low));
        assert_eq!(doc.completed_at, None);
        assert_eq!(doc.created_at, now());
        assert_eq!(doc.updated_at, now());
        assert_eq!(doc.compliance_framework, Some(vec![]));
    }

    #[test]
    fn test_create_done_sets_completed_at() {
        let request = CreateTodoRequest {
            title: "Done already".to_string(),
            status: Some(TodoStatus::Done),
            ..Default::default()
        };
        assert_eq!(to_create_document(&request, now()).completed_at, Some(now()));
    }

    #[test]
    fn test_round_trip_reproduces_request() {
        let due = now() + Duration::days(7);
        let request = CreateTodoRequest {
            title: "Encrypt backups".to_string(),
            description: Some("Use KMS".to_string()),
            status: Some(TodoStatus::InProgress),
            tags: Some(vec!["backup".to_string()]),
            assignee: Some("bob".to_string()),
            priority: Some(Priority::High),
            severity: Some(Severity::Critical),
            due_date: Some(due),
            compliance_frameworks: Some(vec!["ISO 27001".to_string()]),
        };
        let todo = from_storage("abc", to_create_document(&request, now()));

        assert_eq!(todo.id, "abc");
        assert_eq!(todo.title, "Encrypt backups");
        assert_eq!(todo.description.as_deref(), Some("Use KMS"));
        assert_eq!(todo.status, TodoStatus::InProgress);
        assert_eq!(todo.tags, vec!["backup"]);
        assert_eq!(todo.assignee.as_deref(), Some("bob"));
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.severity, Severity::Critical);
        assert_eq!(todo.due_date, Some(due));
        assert_eq!(todo.compliance_frameworks, vec!["ISO 27001"]);
        assert!(todo.completed_at.is_none());
    }

    #[test]
    fn test_from_storage_defaults_legacy_fields() {
        let doc: TodoDocument = serde_json::from_value(serde_json::json!({
            "title": "Legacy",
            "status": "done",
            "tags": null,
            "due_date": null,
            "created_at": "2023-01-01T00:00:00Z",
            "updated_at": "2023-01-02T00:00:00Z",
            "completed_at": "2023-01-02T00:00:00Z"
        }))
        .unwrap();
        let todo = from_storage("legacy-1", doc);

        assert!(todo.tags.is_empty());
        assert!(todo.compliance_frameworks.is_empty());
        assert_eq!(todo.due_date, None);
        assert_eq!(todo.priority, Priority::Medium);
        assert_eq!(todo.severity, Severity::Low);
    }

    #[test]
    fn test_update_only_includes_requested_fields() {
        let request = UpdateTodoRequest {
            priority: Some(Priority::Critical),
            ..Default::default()
        };
        let delta = to_update_document(&request, &existing(TodoStatus::Planned), now());
        let value = serde_json::to_value(&delta).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();

        assert_eq!(keys.len(), 2);
        assert_eq!(value["priority"], "critical");
        assert!(value.get("updated_at").is_some());
    }

    #[test]
    fn test_status_transitions_stamp_completed_at() {
        let planned = existing(TodoStatus::Planned);
        let to_done = UpdateTodoRequest {
            status: Some(TodoStatus::Done),
            ..Default::default()
        };
        let delta = to_update_document(&to_done, &planned, now());
        assert_eq!(delta.completed_at, Some(Some(now())));

        let done = merge_update(&planned, &delta, "todo-1");
        assert_eq!(done.completed_at, Some(now()));

        let later = now() + Duration::hours(1);
        let back = UpdateTodoRequest {
            status: Some(TodoStatus::Planned),
            ..Default::default()
        };
        let delta = to_update_document(&back, &done, later);
        assert_eq!(delta.completed_at, Some(None));
        assert_eq!(merge_update(&done, &delta, "todo-1").completed_at, None);

        let stay_done = to_update_document(&to_done, &done, later);
        assert_eq!(stay_done.completed_at, None);
    }

    #[test]
    fn test_empty_strings_clear_fields() {
        let todo = existing(TodoStatus::Planned);
        let request = UpdateTodoRequest {
            description: Some(String::new()),
            assignee: Some("   ".to_string()),
            ..Default::default()
        };
        let delta = to_update_document(&request, &todo, now());

        assert_eq!(delta.assignee, Some(None));
        assert_eq!(delta.description, Some(None));

        let merged = merge_update(&todo, &delta, &todo.id);
        assert_eq!(merged.assignee, None);
        assert_eq!(merged.description, None);
        assert_eq!(merged.title, todo.title);
    }

    #[test]
    fn test_explicit_null_due_date_clears() {
        let todo = existing(TodoStatus::Planned);
        assert!(todo.due_date.is_some());

        let request = UpdateTodoRequest {
            due_date: Some(None),
            ..Default::default()
        };
        let delta = to_update_document(&request, &todo, now());
        assert!(serde_json::to_value(&delta).unwrap()["due_date"].is_null());
        assert_eq!(merge_update(&todo, &delta, &todo.id).due_date, None);
    }

    #[test]
    fn test_update_normalizes_collections() {
        let request = UpdateTodoRequest {
            tags: Some(vec![" Infra ".to_string(), "INFRA".to_string()]),
            compliance_frameworks: Some(vec!["HIPAA ".to_string(), "HIPAA".to_string()]),
            ..Default::default()
        };
        let delta = to_update_document(&request, &existing(TodoStatus::Planned), now());

        assert_eq!(delta.tags, Some(vec!["infra".to_string()]));
        assert_eq!(delta.compliance_framework, Some(vec!["HIPAA".to_string()]));
    }
}
