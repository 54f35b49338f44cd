//! Database operations for the `marketing_projects` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const PROJECT_COLUMNS: &str = "id, title, description, objectives, target_audience, deliverables, \
     guidelines, sample_script, is_active, created_by, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub target_audience: String,
    pub deliverables: Vec<String>,
    pub guidelines: String,
    pub sample_script: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of a project; list fields are expected to be cleaned already.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub target_audience: String,
    pub deliverables: Vec<String>,
    pub guidelines: String,
    pub sample_script: Option<String>,
    pub is_active: bool,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_project(
    pool: &PgPool,
    project: &NewProject,
    created_by: Uuid,
) -> Result<ProjectRow, DbError> {
    let sql = format!(
        "INSERT INTO marketing_projects (title, description, objectives, target_audience, \
             deliverables, guidelines, sample_script, is_active, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {PROJECT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.objectives)
        .bind(&project.target_audience)
        .bind(&project.deliverables)
        .bind(&project.guidelines)
        .bind(&project.sample_script)
        .bind(project.is_active)
        .bind(created_by)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Replace every editable field of project `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the project does not exist.
pub async fn update_project(
    pool: &PgPool,
    id: i64,
    project: &NewProject,
) -> Result<ProjectRow, DbError> {
    let sql = format!(
        "UPDATE marketing_projects \
         SET title = $2, description = $3, objectives = $4, target_audience = $5, \
             deliverables = $6, guidelines = $7, sample_script = $8, is_active = $9, \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {PROJECT_COLUMNS}"
    );
    sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.objectives)
        .bind(&project.target_audience)
        .bind(&project.deliverables)
        .bind(&project.guidelines)
        .bind(&project.sample_script)
        .bind(project.is_active)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Soft enable/disable.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the project does not exist.
pub async fn set_project_active(
    pool: &PgPool,
    id: i64,
    is_active: bool,
) -> Result<ProjectRow, DbError> {
    let sql = format!(
        "UPDATE marketing_projects SET is_active = $2, updated_at = NOW() \
         WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
    );
    sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(id)
        .bind(is_active)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the project does not exist.
pub async fn get_project(pool: &PgPool, id: i64) -> Result<ProjectRow, DbError> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM marketing_projects WHERE id = $1");
    sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_projects(pool: &PgPool, active_only: bool) -> Result<Vec<ProjectRow>, DbError> {
    let sql = format!(
        "SELECT {PROJECT_COLUMNS} FROM marketing_projects \
         WHERE ($1 = FALSE OR is_active) \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(active_only)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
