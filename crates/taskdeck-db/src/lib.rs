mod sqlite;

pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;
use thiserror::Error;

use taskdeck_core::{Task, TaskPatch};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        DbError::Internal(e.to_string())
    }
}

/// The only component that talks to durable storage for tasks.
///
/// Point operations are keyed by task id; listing is a filtered scan by
/// owner id with no ordering contract. Faults propagate unchanged; retries
/// are the store's concern, not the gateway's.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks whose owner matches; empty vec if none.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Task>, DbError>;

    /// Write a fully populated task verbatim.
    async fn create(&self, task: &Task) -> Result<Task, DbError>;

    /// Single-key lookup. `None` means the record does not exist, which is
    /// distinct from a storage failure.
    async fn get(&self, task_id: &str) -> Result<Option<Task>, DbError>;

    /// Partial update of exactly `{name, due_date, done}`. The owner, id,
    /// creation time and attachment URL are never touched. Fails with
    /// `DbError::NotFound` when the record does not exist.
    async fn update(&self, task_id: &str, patch: &TaskPatch) -> Result<Task, DbError>;

    /// Idempotent delete; a missing id is not an error.
    async fn delete(&self, task_id: &str) -> Result<(), DbError>;

    /// Single-field update of the attachment URL, same fault semantics as
    /// `update`.
    async fn set_attachment_url(&self, task_id: &str, url: &str) -> Result<(), DbError>;
}

/// Configuration for the task store backend.
pub struct DbConfig {
    /// Path to the sqlite database file. `None` selects the default data dir.
    pub sqlite_path: Option<String>,
}

impl DbConfig {
    pub fn from_env() -> Self {
        Self {
            sqlite_path: std::env::var("TASKDECK_DB_PATH").ok(),
        }
    }
}
