/// Task label model and database operations
///
/// Labels are plain names attached to a task; a name is unique within its
/// task. Attaching a name that is already present is a no-op (the insert
/// uses `ON CONFLICT DO NOTHING`), and removing a name that is not present
/// is a no-op too, so both operations are idempotent.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_labels (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (task_id, name)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Label attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskLabel {
    /// Unique label ID
    pub id: Uuid,

    /// Task this label belongs to
    pub task_id: Uuid,

    /// Label name, unique within the task
    pub name: String,

    /// When the label was attached
    pub created_at: DateTime<Utc>,
}

impl TaskLabel {
    /// Attaches labels to a task, skipping names already present
    ///
    /// Duplicate names within `names` collapse to one row via the unique
    /// constraint. Returns the full label set of the task afterwards.
    pub async fn attach(
        pool: &PgPool,
        task_id: Uuid,
        names: &[String],
    ) -> Result<Vec<Self>, sqlx::Error> {
        for name in names {
            sqlx::query(
                r#"
                INSERT INTO task_labels (task_id, name)
                VALUES ($1, $2)
                ON CONFLICT (task_id, name) DO NOTHING
                "#,
            )
            .bind(task_id)
            .bind(name)
            .execute(pool)
            .await?;
        }

        Self::list_by_task(pool, task_id).await
    }

    /// Removes labels from a task by name
    ///
    /// Names not present on the task are ignored.
    pub async fn detach(
        pool: &PgPool,
        task_id: Uuid,
        names: &[String],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM task_labels
            WHERE task_id = $1 AND name = ANY($2)
            "#,
        )
        .bind(task_id)
        .bind(names)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists labels for a task, oldest first
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let labels = sqlx::query_as::<_, TaskLabel>(
            r#"
            SELECT id, task_id, name, created_at
            FROM task_labels
            WHERE task_id = $1
            ORDER BY created_at ASC, name ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(labels)
    }

    /// Lists labels for a set of tasks in one query
    ///
    /// Used by the listing endpoint to avoid a query per task.
    pub async fn list_by_tasks(
        pool: &PgPool,
        task_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let labels = sqlx::query_as::<_, TaskLabel>(
            r#"
            SELECT id, task_id, name, created_at
            FROM task_labels
            WHERE task_id = ANY($1)
            ORDER BY created_at ASC, name ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await?;

        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_serializes_name() {
        let label = TaskLabel {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            name: "urgent".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&label).unwrap();
        assert_eq!(json["name"], "urgent");
    }
}
