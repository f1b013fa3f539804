/// Task model and database operations
///
/// This module provides the Task model and the status state machine that
/// governs updates. Tasks belong to exactly one user from creation until
/// deletion; every read and write outside of listing goes through an
/// ownership check in the authorization layer, and listing is scoped to the
/// owner at the query level.
///
/// # State Machine
///
/// ```text
/// open → in_progress → done
/// in_progress → open        (put back)
/// done → in_progress        (reopen)
/// ```
///
/// All other pairs are illegal, including `from == to`: a status field in a
/// patch must describe an actual move.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('open', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'open',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Task status
///
/// Serialized as `OPEN` / `IN_PROGRESS` / `DONE` on the wire and stored as
/// the lowercase `task_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Newly created, not yet started
    Open,

    /// Being worked on
    InProgress,

    /// Finished; can be reopened via `done → in_progress`
    Done,
}

impl TaskStatus {
    /// Checks if a transition to the target status is legal
    ///
    /// `from == to` is not a legal move; callers that don't want to change
    /// status omit it from the patch.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        match (self, target) {
            (TaskStatus::Open, TaskStatus::InProgress) => true,
            (TaskStatus::InProgress, TaskStatus::Done) => true,
            (TaskStatus::InProgress, TaskStatus::Open) => true,
            (TaskStatus::Done, TaskStatus::InProgress) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Open => "OPEN",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        };
        f.write_str(s)
    }
}

/// Error returned when a patch requests an illegal status move
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move task from {from} to {to}")]
pub struct TransitionError {
    /// Current status of the task
    pub from: TaskStatus,

    /// Status the patch asked for
    pub to: TaskStatus,
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user; set at creation, never reassigned
    pub user_id: Uuid,

    /// Task title
    pub title: String,

    /// Task description
    pub description: String,

    /// Current status
    pub status: TaskStatus,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owning user (forced to the caller's id by the handler)
    pub user_id: Uuid,

    /// Task title
    pub title: String,

    /// Task description
    pub description: String,

    /// Initial status
    pub status: TaskStatus,
}

/// Patch applied to an existing task
///
/// Only present fields are changed. A `status` field is validated against
/// the transition table before anything is persisted.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// Requested status move
    pub status: Option<TaskStatus>,
}

/// Filters applied to a task listing, always in conjunction with the
/// mandatory owner scope
#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    /// Only tasks with this status
    pub status: Option<TaskStatus>,

    /// Case-insensitive substring match against title or description
    pub search: Option<String>,
}

impl Task {
    /// Applies a patch to this task, validating status legality
    ///
    /// Pure: returns the patched value or a [`TransitionError`] without
    /// touching storage. Rejection is atomic — when the requested status
    /// move is illegal, none of the other patched fields survive either.
    pub fn apply_patch(&self, patch: &UpdateTask) -> Result<Task, TransitionError> {
        if let Some(next) = patch.status {
            if !self.status.can_transition_to(next) {
                return Err(TransitionError {
                    from: self.status,
                    to: next,
                });
            }
        }

        Ok(Task {
            id: self.id,
            user_id: self.user_id,
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            status: patch.status.unwrap_or(self.status),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// Creates a task and attaches its initial labels in one transaction
    ///
    /// Either the task and all its labels land, or nothing does. Duplicate
    /// names in `label_names` collapse via the unique constraint.
    pub async fn create_with_labels(
        pool: &PgPool,
        data: CreateTask,
        label_names: &[String],
    ) -> Result<(Self, Vec<crate::models::label::TaskLabel>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, status, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .fetch_one(&mut *tx)
        .await?;

        for name in label_names {
            sqlx::query(
                r#"
                INSERT INTO task_labels (task_id, name)
                VALUES ($1, $2)
                ON CONFLICT (task_id, name) DO NOTHING
                "#,
            )
            .bind(task.id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        }

        let labels = sqlx::query_as::<_, crate::models::label::TaskLabel>(
            r#"
            SELECT id, task_id, name, created_at
            FROM task_labels
            WHERE task_id = $1
            ORDER BY created_at ASC, name ASC
            "#,
        )
        .bind(task.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((task, labels))
    }

    /// Finds a task by ID
    ///
    /// Deliberately unscoped: handlers resolve existence first so that a
    /// missing task is NotFound before ownership is ever evaluated.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks owned by a user, newest first
    ///
    /// The owner scope is part of the SQL query, not an in-memory filter;
    /// rows belonging to other users are never fetched.
    pub async fn list_by_owner(
        pool: &PgPool,
        user_id: Uuid,
        filters: &TaskFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = String::from(
            "SELECT id, user_id, title, description, status, created_at, updated_at \
             FROM tasks WHERE user_id = $1",
        );
        let mut bind_count = 1;

        if filters.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND status = ${}", bind_count));
        }
        if filters.search.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND (title ILIKE ${b} OR description ILIKE ${b})",
                b = bind_count
            ));
        }

        query.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(user_id);

        if let Some(status) = filters.status {
            q = q.bind(status);
        }
        if let Some(ref search) = filters.search {
            q = q.bind(format!("%{}%", search));
        }

        let tasks = q.bind(limit).bind(offset).fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Counts tasks owned by a user matching the filters
    ///
    /// Covers the full filtered set, independent of the pagination window.
    pub async fn count_by_owner(
        pool: &PgPool,
        user_id: Uuid,
        filters: &TaskFilters,
    ) -> Result<i64, sqlx::Error> {
        let mut query = String::from("SELECT COUNT(*) FROM tasks WHERE user_id = $1");
        let mut bind_count = 1;

        if filters.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND status = ${}", bind_count));
        }
        if filters.search.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND (title ILIKE ${b} OR description ILIKE ${b})",
                b = bind_count
            ));
        }

        let mut q = sqlx::query_scalar::<_, i64>(&query).bind(user_id);

        if let Some(status) = filters.status {
            q = q.bind(status);
        }
        if let Some(ref search) = filters.search {
            q = q.bind(format!("%{}%", search));
        }

        let count = q.fetch_one(pool).await?;

        Ok(count)
    }

    /// Persists a patched task
    ///
    /// Call [`Task::apply_patch`] first; this writes title, description and
    /// status in a single statement so a patch lands atomically.
    pub async fn save_patch(pool: &PgPool, patched: &Task) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, title, description, status, created_at, updated_at
            "#,
        )
        .bind(patched.id)
        .bind(&patched.title)
        .bind(&patched.description)
        .bind(patched.status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Labels attached to the task are removed by cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with_status(status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Write report".to_string(),
            description: "Quarterly numbers".to_string(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_legal_transitions() {
        assert!(TaskStatus::Open.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Done));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Open));
        assert!(TaskStatus::Done.can_transition_to(TaskStatus::InProgress));
    }

    #[test]
    fn test_illegal_transitions() {
        // Done must be reached through InProgress, and reopening goes back
        // through InProgress as well.
        assert!(!TaskStatus::Open.can_transition_to(TaskStatus::Done));
        assert!(!TaskStatus::Done.can_transition_to(TaskStatus::Open));

        // Same-status moves are not moves.
        assert!(!TaskStatus::Open.can_transition_to(TaskStatus::Open));
        assert!(!TaskStatus::InProgress.can_transition_to(TaskStatus::InProgress));
        assert!(!TaskStatus::Done.can_transition_to(TaskStatus::Done));
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );

        let status: TaskStatus = serde_json::from_str("\"OPEN\"").unwrap();
        assert_eq!(status, TaskStatus::Open);
    }

    #[test]
    fn test_apply_patch_updates_fields() {
        let task = task_with_status(TaskStatus::Open);

        let patched = task
            .apply_patch(&UpdateTask {
                title: Some("Write final report".to_string()),
                description: None,
                status: Some(TaskStatus::InProgress),
            })
            .unwrap();

        assert_eq!(patched.title, "Write final report");
        assert_eq!(patched.description, task.description);
        assert_eq!(patched.status, TaskStatus::InProgress);
        assert_eq!(patched.id, task.id);
        assert_eq!(patched.user_id, task.user_id);
    }

    #[test]
    fn test_apply_patch_without_status_skips_validation() {
        let task = task_with_status(TaskStatus::Done);

        let patched = task
            .apply_patch(&UpdateTask {
                title: Some("Renamed".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(patched.title, "Renamed");
        assert_eq!(patched.status, TaskStatus::Done);
    }

    #[test]
    fn test_apply_patch_rejects_illegal_move_atomically() {
        let task = task_with_status(TaskStatus::Open);

        // Title change and illegal status move in the same patch: the whole
        // patch is rejected, not just the status field.
        let err = task
            .apply_patch(&UpdateTask {
                title: Some("Should not stick".to_string()),
                description: None,
                status: Some(TaskStatus::Done),
            })
            .unwrap_err();

        assert_eq!(
            err,
            TransitionError {
                from: TaskStatus::Open,
                to: TaskStatus::Done,
            }
        );
        assert_eq!(err.to_string(), "cannot move task from OPEN to DONE");
    }

    #[test]
    fn test_apply_patch_rejects_noop_status() {
        let task = task_with_status(TaskStatus::Open);

        let result = task.apply_patch(&UpdateTask {
            status: Some(TaskStatus::Open),
            ..Default::default()
        });

        assert!(result.is_err());
    }
}
