//! Database operations for the `guidebook_resources` table.

use chrono::{DateTime, Utc};
use creatorhub_core::{AccessLevel, FileType, ResourceCategory, UserRole};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const RESOURCE_COLUMNS: &str = "id, title, description, file_url, file_type, file_size, category, \
     access_level, is_active, uploaded_by, created_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GuidebookResourceRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_type: String,
    pub file_size: Option<i64>,
    pub category: String,
    pub access_level: String,
    pub is_active: bool,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGuidebookResource {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_type: FileType,
    pub file_size: Option<i64>,
    pub category: ResourceCategory,
    pub access_level: AccessLevel,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_resource(
    pool: &PgPool,
    resource: &NewGuidebookResource,
    uploaded_by: Uuid,
) -> Result<GuidebookResourceRow, DbError> {
    let sql = format!(
        "INSERT INTO guidebook_resources (title, description, file_url, file_type, file_size, \
             category, access_level, uploaded_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {RESOURCE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, GuidebookResourceRow>(&sql)
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.file_url)
        .bind(resource.file_type.as_str())
        .bind(resource.file_size)
        .bind(resource.category.as_str())
        .bind(resource.access_level.as_str())
        .bind(uploaded_by)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Active resources `role` may read, grouped by category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_visible_resources(
    pool: &PgPool,
    role: UserRole,
    category: Option<ResourceCategory>,
) -> Result<Vec<GuidebookResourceRow>, DbError> {
    let sql = format!(
        "SELECT {RESOURCE_COLUMNS} FROM guidebook_resources \
         WHERE is_active AND access_level = ANY($1) \
           AND ($2::TEXT IS NULL OR category = $2) \
         ORDER BY category, created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, GuidebookResourceRow>(&sql)
        .bind(AccessLevel::visible_to(role))
        .bind(category.map(ResourceCategory::as_str))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Soft-delete.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the resource does not exist.
pub async fn deactivate_resource(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE guidebook_resources SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
