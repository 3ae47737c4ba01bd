//! Deferred task queue contract and SQLite outbox implementation.
//!
//! # Responsibility
//! - Hand side-effect work (confirmation emails) to an asynchronous worker.
//! - Persist enqueued tasks so delivery can be retried independently of the
//!   request that produced them.
//!
//! # Invariants
//! - Enqueue only records the task; it never performs the side effect.
//! - Delivered tasks are not returned by `pending`.

use crate::db::DbError;
use log::info;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Queue that carries confirmation emails.
pub const EMAIL_QUEUE: &str = "email-queue";
/// Task name understood by the email worker.
pub const SEND_CONFIRMATION_EMAIL_TASK: &str = "send_confirmation_email";

/// Stable identifier of an enqueued task.
pub type TaskId = Uuid;

/// Queue failure.
#[derive(Debug)]
pub enum QueueError {
    Db(DbError),
    Serialization(serde_json::Error),
    /// Backend refused the task.
    Rejected(String),
    InvalidData(String),
}

impl Display for QueueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "task params are not serializable: {err}"),
            Self::Rejected(reason) => write!(f, "task rejected by queue: {reason}"),
            Self::InvalidData(message) => write!(f, "invalid outbox row: {message}"),
        }
    }
}

impl Error for QueueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Rejected(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for QueueError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// One unit of deferred work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub queue: String,
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl Task {
    pub fn new(queue: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Task persisted in the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTask {
    pub task_id: TaskId,
    pub task: Task,
    pub enqueued_at: i64,
}

/// Producer side of a deferred task queue.
pub trait TaskQueue {
    /// Records `task` for later delivery.
    fn enqueue(&self, task: &Task) -> Result<TaskId, QueueError>;
}

impl<Q: TaskQueue + ?Sized> TaskQueue for &Q {
    fn enqueue(&self, task: &Task) -> Result<TaskId, QueueError> {
        (**self).enqueue(task)
    }
}

/// Outbox table used as a durable task queue.
pub struct SqliteTaskOutbox<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskOutbox<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns up to `limit` pending tasks of `queue`, oldest first.
    pub fn pending(&self, queue: &str, limit: u32) -> Result<Vec<QueuedTask>, QueueError> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id, queue_name, task_name, params_json, enqueued_at
             FROM task_outbox
             WHERE queue_name = ?1
               AND status = 'pending'
             ORDER BY enqueued_at ASC, rowid ASC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![queue, i64::from(limit)])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("task_id")?;
            let task_id = Uuid::parse_str(&id_text).map_err(|_| {
                QueueError::InvalidData(format!("invalid uuid `{id_text}` in task_outbox.task_id"))
            })?;
            let params_json: String = row.get("params_json")?;
            tasks.push(QueuedTask {
                task_id,
                task: Task {
                    queue: row.get("queue_name")?,
                    name: row.get("task_name")?,
                    params: serde_json::from_str(&params_json)?,
                },
                enqueued_at: row.get("enqueued_at")?,
            });
        }
        Ok(tasks)
    }

    /// Marks a task delivered. Returns `false` when it was not pending.
    pub fn mark_delivered(&self, task_id: TaskId) -> Result<bool, QueueError> {
        let changed = self.conn.execute(
            "UPDATE task_outbox
             SET status = 'delivered',
                 delivered_at = (strftime('%s', 'now') * 1000)
             WHERE task_id = ?1
               AND status = 'pending';",
            [task_id.to_string()],
        )?;
        Ok(changed == 1)
    }
}

impl TaskQueue for SqliteTaskOutbox<'_> {
    fn enqueue(&self, task: &Task) -> Result<TaskId, QueueError> {
        let task_id = Uuid::new_v4();
        let params_json = serde_json::to_string(&task.params)?;
        self.conn.execute(
            "INSERT INTO task_outbox (task_id, queue_name, task_name, params_json)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                task_id.to_string(),
                task.queue.as_str(),
                task.name.as_str(),
                params_json
            ],
        )?;
        info!(
            "event=task_enqueue module=queue status=ok queue={} task={} task_id={}",
            task.queue, task.name, task_id
        );
        Ok(task_id)
    }
}
