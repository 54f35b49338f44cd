//! Database operations for the `monthly_tasks` table.

use chrono::{DateTime, Utc};
use creatorhub_core::BillingMonth;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const TASK_COLUMNS: &str = "id, project_id, title, description, topic, guidelines, \
     deliverables_required, month, year, is_default, created_by, created_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub project_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub topic: String,
    pub guidelines: String,
    pub deliverables_required: Vec<String>,
    pub month: i16,
    pub year: i32,
    pub is_default: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub topic: String,
    pub guidelines: String,
    pub deliverables_required: Vec<String>,
    pub cycle: BillingMonth,
    pub is_default: bool,
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if `project_id` names a missing project, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_task(
    pool: &PgPool,
    task: &NewTask,
    created_by: Uuid,
) -> Result<TaskRow, DbError> {
    if let Some(project_id) = task.project_id {
        crate::projects::get_project(pool, project_id).await?;
    }

    let sql = format!(
        "INSERT INTO monthly_tasks (project_id, title, description, topic, guidelines, \
             deliverables_required, month, year, is_default, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {TASK_COLUMNS}"
    );
    let row = sqlx::query_as::<_, TaskRow>(&sql)
        .bind(task.project_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.topic)
        .bind(&task.guidelines)
        .bind(&task.deliverables_required)
        .bind(task.cycle.month_i16())
        .bind(task.cycle.year)
        .bind(task.is_default)
        .bind(created_by)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the task does not exist.
pub async fn get_task(pool: &PgPool, id: i64) -> Result<TaskRow, DbError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM monthly_tasks WHERE id = $1");
    sqlx::query_as::<_, TaskRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Tasks for one cycle, or every task newest cycle first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_tasks(
    pool: &PgPool,
    cycle: Option<BillingMonth>,
) -> Result<Vec<TaskRow>, DbError> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM monthly_tasks \
         WHERE ($1::SMALLINT IS NULL OR (month = $1 AND year = $2)) \
         ORDER BY year DESC, month DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, TaskRow>(&sql)
        .bind(cycle.map(BillingMonth::month_i16))
        .bind(cycle.map(|c| c.year))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
