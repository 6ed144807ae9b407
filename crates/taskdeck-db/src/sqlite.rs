use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use tracing::info;

use taskdeck_core::{Task, TaskPatch};

use crate::{DbConfig, DbError, TaskStore};

/// Extension trait that converts `rusqlite::Result<T>` into `Result<T, DbError>`.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(|e| DbError::Internal(e.to_string()))
    }
}

#[derive(Clone)]
pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let path = config
            .sqlite_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("taskdeck.db"));
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path).to_db()?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
        .to_db()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().to_db()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }

    fn init_schema(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS tasks (
                    id             TEXT PRIMARY KEY,
                    owner_id       TEXT NOT NULL,
                    name           TEXT NOT NULL,
                    due_date       TEXT,
                    done           INTEGER NOT NULL DEFAULT 0,
                    created_at     TEXT NOT NULL,
                    attachment_url TEXT
                 );
                 CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id);",
            )
            .to_db()
        })
    }
}

fn data_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("taskdeck")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share/taskdeck")
    } else {
        PathBuf::from(".")
    }
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        name: row.get("name")?,
        due_date: row.get("due_date")?,
        done: row.get("done")?,
        created_at: row.get("created_at")?,
        attachment_url: row.get("attachment_url")?,
    })
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Task>, DbError> {
        info!(owner_id, "listing tasks");
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM tasks WHERE owner_id = ?1")
                .to_db()?;
            let tasks = stmt
                .query_map(params![owner_id], row_to_task)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(tasks)
        })
    }

    async fn create(&self, task: &Task) -> Result<Task, DbError> {
        info!(task_id = %task.id, owner_id = %task.owner_id, "creating task");
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, owner_id, name, due_date, done, created_at, attachment_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id,
                    task.owner_id,
                    task.name,
                    task.due_date,
                    task.done,
                    task.created_at,
                    task.attachment_url,
                ],
            )
            .to_db()?;
            Ok(task.clone())
        })
    }

    async fn get(&self, task_id: &str) -> Result<Option<Task>, DbError> {
        self.with_conn(|conn| {
            match conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![task_id], row_to_task)
            {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(DbError::Internal(e.to_string())),
            }
        })
    }

    async fn update(&self, task_id: &str, patch: &TaskPatch) -> Result<Task, DbError> {
        info!(task_id, "updating task");
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE tasks SET name = ?1, due_date = ?2, done = ?3 WHERE id = ?4",
                    params![patch.name, patch.due_date, patch.done, task_id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {task_id}")));
            }
            conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![task_id], row_to_task)
                .to_db()
        })
    }

    async fn delete(&self, task_id: &str) -> Result<(), DbError> {
        info!(task_id, "deleting task");
        self.with_conn(|conn| {
            // Deleting a missing id is a no-op, not an error.
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])
                .to_db()?;
            Ok(())
        })
    }

    async fn set_attachment_url(&self, task_id: &str, url: &str) -> Result<(), DbError> {
        info!(task_id, "setting attachment url");
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE tasks SET attachment_url = ?1 WHERE id = ?2",
                    params![url, task_id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {task_id}")));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mk_task(id: &str, owner: &str, name: &str) -> Task {
        Task {
            id: id.into(),
            owner_id: owner.into(),
            name: name.into(),
            due_date: None,
            done: false,
            created_at: Utc::now(),
            attachment_url: None,
        }
    }

    #[test]
    fn open_path_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("test.db");
        assert!(!db_path.exists());

        let _store = SqliteTaskStore::open_path(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        let task = mk_task("t-1", "u-1", "Buy milk");

        let created = store.create(&task).await.unwrap();
        assert_eq!(created.id, "t-1");

        let fetched = store.get("t-1").await.unwrap().unwrap();
        assert_eq!(fetched.owner_id, "u-1");
        assert_eq!(fetched.name, "Buy milk");
        assert!(!fetched.done);
        assert!(fetched.due_date.is_none());
        assert!(fetched.attachment_url.is_none());
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_by_owner_filters() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        store.create(&mk_task("t-1", "alice", "a")).await.unwrap();
        store.create(&mk_task("t-2", "alice", "b")).await.unwrap();
        store.create(&mk_task("t-3", "bob", "c")).await.unwrap();

        let alices = store.list_by_owner("alice").await.unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|t| t.owner_id == "alice"));

        assert!(store.list_by_owner("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_touches_only_the_three_mutable_fields() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        let mut task = mk_task("t-1", "alice", "before");
        task.attachment_url = Some("https://pics/t-1".into());
        store.create(&task).await.unwrap();

        let updated = store
            .update(
                "t-1",
                &TaskPatch {
                    name: "after".into(),
                    due_date: Some("2026-09-01".into()),
                    done: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "after");
        assert_eq!(updated.due_date.as_deref(), Some("2026-09-01"));
        assert!(updated.done);
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.owner_id, task.owner_id);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.attachment_url, task.attachment_url);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        let err = store
            .update(
                "ghost",
                &TaskPatch {
                    name: "x".into(),
                    due_date: None,
                    done: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        store.create(&mk_task("t-1", "alice", "a")).await.unwrap();

        store.delete("t-1").await.unwrap();
        store.delete("t-1").await.unwrap();
        assert!(store.get("t-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_attachment_url_persists_and_overwrites() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        store.create(&mk_task("t-1", "alice", "a")).await.unwrap();

        store
            .set_attachment_url("t-1", "https://pics/t-1")
            .await
            .unwrap();
        let task = store.get("t-1").await.unwrap().unwrap();
        assert_eq!(task.attachment_url.as_deref(), Some("https://pics/t-1"));

        store
            .set_attachment_url("t-1", "https://pics/t-1-v2")
            .await
            .unwrap();
        let task = store.get("t-1").await.unwrap().unwrap();
        assert_eq!(task.attachment_url.as_deref(), Some("https://pics/t-1-v2"));
    }

    #[tokio::test]
    async fn set_attachment_url_missing_is_not_found() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        let err = store
            .set_attachment_url("ghost", "https://pics/ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}
