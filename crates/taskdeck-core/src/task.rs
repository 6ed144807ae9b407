use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user-owned unit of work.
///
/// `id`, `owner_id` and `created_at` are fixed at creation; `attachment_url`
/// is set only by the attachment workflow (a later upload may overwrite it).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub done: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub name: String,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// The closed set of fields a task update may touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub name: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_serializes_with_camel_case_names() {
        let task = Task {
            id: "t-1".into(),
            owner_id: "u-1".into(),
            name: "Buy milk".into(),
            due_date: Some("2026-09-01".into()),
            done: false,
            created_at: Utc::now(),
            attachment_url: None,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["ownerId"], "u-1");
        assert_eq!(value["dueDate"], "2026-09-01");
        assert_eq!(value["done"], false);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("attachmentUrl").is_none());
    }

    #[test]
    fn create_request_due_date_defaults_to_none() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"name":"Buy milk"}"#).unwrap();
        assert_eq!(req.name, "Buy milk");
        assert!(req.due_date.is_none());
    }

    #[test]
    fn patch_round_trips() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"name":"Buy milk","dueDate":"2026-09-01","done":true}"#)
                .unwrap();
        assert!(patch.done);
        assert_eq!(patch.due_date.as_deref(), Some("2026-09-01"));
    }
}
