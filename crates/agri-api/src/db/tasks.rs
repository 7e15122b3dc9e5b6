//! Task persistence.

use agri_core::{SeasonId, TaskId, UserId};
use agri_state::{Task, TaskStatus};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert(pool: &PgPool, task: &Task) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tasks (id, title, description, status, planned_date, due_date, owner_id, season_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(task.id.0)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status.as_str())
    .bind(task.planned_date)
    .bind(task.due_date)
    .bind(task.owner_id.0)
    .bind(task.season_id.map(|id| id.0))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn save(pool: &PgPool, task: &Task) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tasks SET title = $1, description = $2, status = $3, planned_date = $4, due_date = $5
         WHERE id = $6",
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status.as_str())
    .bind(task.planned_date)
    .bind(task.due_date)
    .bind(task.id.0)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: TaskId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<Task>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TaskRow>(
        "SELECT id, title, description, status, planned_date, due_date, owner_id, season_id
         FROM tasks",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TaskRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    planned_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    owner_id: Uuid,
    season_id: Option<Uuid>,
}

impl TaskRow {
    fn into_record(self) -> Task {
        let status = TaskStatus::from_name(&self.status).unwrap_or_else(|e| {
            tracing::error!(
                id = %self.id,
                status = %self.status,
                error = %e,
                "unknown task status in database, loading as CANCELLED"
            );
            TaskStatus::Cancelled
        });

        Task {
            id: TaskId::from_uuid(self.id),
            title: self.title,
            description: self.description,
            status,
            planned_date: self.planned_date,
            due_date: self.due_date,
            owner_id: UserId::from_uuid(self.owner_id),
            season_id: self.season_id.map(SeasonId::from_uuid),
        }
    }
}
