use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use taskdeck_core::{CreateTaskRequest, Task, TaskPatch};
use taskdeck_db::{DbError, TaskStore};
use taskdeck_store::{LinkIssuer, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

/// Proof that an ownership check passed for one task.
///
/// The only way to obtain one is [`TaskService::claim`], and every mutating
/// or attachment operation requires one, so an unchecked mutation does not
/// compile.
#[derive(Debug)]
pub struct TaskClaim {
    task_id: String,
}

impl TaskClaim {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

/// Domain operations exposed to request handlers.
///
/// Holds process-wide store handles; no task state is cached across calls.
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    links: Arc<dyn LinkIssuer>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, links: Arc<dyn LinkIssuer>) -> Self {
        Self { store, links }
    }

    /// Create a task owned by `owner_id` with a fresh id, `done = false`
    /// and the current time as creation timestamp.
    pub async fn create_task(
        &self,
        owner_id: &str,
        req: &CreateTaskRequest,
    ) -> Result<Task, ServiceError> {
        if req.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("name must not be empty".into()));
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: req.name.clone(),
            due_date: req.due_date.clone(),
            done: false,
            created_at: Utc::now(),
            attachment_url: None,
        };

        match self.store.create(&task).await {
            Ok(created) => Ok(created),
            Err(e) => {
                warn!(error = %e, owner_id, "failed creating task");
                Err(e.into())
            }
        }
    }

    pub async fn list_tasks(&self, owner_id: &str) -> Result<Vec<Task>, ServiceError> {
        Ok(self.store.list_by_owner(owner_id).await?)
    }

    /// The sole ownership predicate. A missing task is simply not owned;
    /// only a storage fault is an error.
    pub async fn is_owner(&self, owner_id: &str, task_id: &str) -> Result<bool, ServiceError> {
        let task = self.store.get(task_id).await?;
        Ok(task.is_some_and(|t| t.owner_id == owner_id))
    }

    /// Evaluate the ownership gate and hand back an access-checked handle.
    ///
    /// Missing and foreign tasks are indistinguishable to the caller: both
    /// yield `NotFound`.
    pub async fn claim(&self, owner_id: &str, task_id: &str) -> Result<TaskClaim, ServiceError> {
        if self.is_owner(owner_id, task_id).await? {
            Ok(TaskClaim {
                task_id: task_id.to_string(),
            })
        } else {
            info!(owner_id, task_id, "ownership check failed");
            Err(ServiceError::NotFound(format!("task {task_id}")))
        }
    }

    pub async fn update_task(
        &self,
        claim: &TaskClaim,
        patch: &TaskPatch,
    ) -> Result<Task, ServiceError> {
        if patch.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("name must not be empty".into()));
        }
        Ok(self.store.update(&claim.task_id, patch).await?)
    }

    pub async fn delete_task(&self, claim: &TaskClaim) -> Result<(), ServiceError> {
        Ok(self.store.delete(&claim.task_id).await?)
    }

    /// Mint a write URL for the task's attachment slot and persist the
    /// deterministic retrieval URL on the task.
    ///
    /// The retrieval URL is written before the client uploads, so it may
    /// dangle until the upload completes; that window is accepted.
    pub async fn attach_image(&self, claim: &TaskClaim) -> Result<String, ServiceError> {
        let upload_url = self.links.upload_url(&claim.task_id).await?;
        let public_url = self.links.public_url(&claim.task_id);
        self.store
            .set_attachment_url(&claim.task_id, &public_url)
            .await?;
        info!(task_id = %claim.task_id, "issued attachment upload link");
        Ok(upload_url)
    }
}
