//! Database operations for the `video_submissions` table.

use chrono::{DateTime, Utc};
use creatorhub_core::{ApprovalStatus, ReviewDecision, SubmissionRecord};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

const SUBMISSION_COLUMNS: &str = "id, influencer_id, task_assignment_id, title, description, \
     video_url, video_file_url, thumbnail_url, approval_status, reviewed_at, reviewed_by, \
     rejection_reason, submitted_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubmissionRow {
    pub id: i64,
    pub influencer_id: i64,
    pub task_assignment_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub video_file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub approval_status: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the stored status is unknown.
    pub fn into_record(self) -> Result<SubmissionRecord, DbError> {
        Ok(SubmissionRecord {
            approval_status: self.approval_status.parse()?,
            id: self.id,
            influencer_id: self.influencer_id,
            title: self.title,
            submitted_at: self.submitted_at,
            video_url: self.video_url.or(self.video_file_url),
        })
    }
}

/// A submission joined with the influencer who made it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubmissionWithInfluencer {
    pub id: i64,
    pub influencer_id: i64,
    pub influencer_name: String,
    pub influencer_email: String,
    pub district: String,
    pub state: String,
    pub follower_count: i32,
    pub task_assignment_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub video_file_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub approval_status: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSubmission {
    pub task_assignment_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub video_file_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Record a `pending` submission; a linked assignment moves to `submitted`
/// in the same transaction.
///
/// # Errors
///
/// Returns [`DbError::InvalidTransition`] if the linked assignment is not
/// open for this influencer, or [`DbError::Sqlx`] if a statement fails.
pub async fn create_submission(
    pool: &PgPool,
    influencer_id: i64,
    submission: &NewSubmission,
) -> Result<SubmissionRow, DbError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO video_submissions (influencer_id, task_assignment_id, title, description, \
             video_url, video_file_url, thumbnail_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {SUBMISSION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, SubmissionRow>(&sql)
        .bind(influencer_id)
        .bind(submission.task_assignment_id)
        .bind(&submission.title)
        .bind(&submission.description)
        .bind(&submission.video_url)
        .bind(&submission.video_file_url)
        .bind(&submission.thumbnail_url)
        .fetch_one(&mut *tx)
        .await?;

    if let Some(assignment_id) = submission.task_assignment_id {
        crate::assignments::mark_submitted(&mut *tx, assignment_id, influencer_id, row.id).await?;
    }

    tx.commit().await?;
    Ok(row)
}

/// Record a review decision on a pending submission.
pub(crate) async fn decide_submission(
    conn: &mut PgConnection,
    id: i64,
    decision: &ReviewDecision,
    reviewer: Uuid,
) -> Result<Option<SubmissionRow>, DbError> {
    let sql = format!(
        "UPDATE video_submissions \
         SET approval_status = $2, rejection_reason = $3, reviewed_at = NOW(), \
             reviewed_by = $4, updated_at = NOW() \
         WHERE id = $1 AND approval_status = 'pending' \
         RETURNING {SUBMISSION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, SubmissionRow>(&sql)
        .bind(id)
        .bind(decision.approval_status().as_str())
        .bind(decision.rejection_reason())
        .bind(reviewer)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the submission does not exist.
pub async fn get_submission(pool: &PgPool, id: i64) -> Result<SubmissionRow, DbError> {
    let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM video_submissions WHERE id = $1");
    sqlx::query_as::<_, SubmissionRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Admin view: every submission with its influencer, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_submissions(
    pool: &PgPool,
    status: Option<ApprovalStatus>,
) -> Result<Vec<SubmissionWithInfluencer>, DbError> {
    let rows = sqlx::query_as::<_, SubmissionWithInfluencer>(
        "SELECT s.id, s.influencer_id, i.full_name AS influencer_name, \
                i.email AS influencer_email, i.district, i.state, i.follower_count, \
                s.task_assignment_id, s.title, s.description, s.video_url, s.video_file_url, \
                s.thumbnail_url, s.approval_status, s.reviewed_at, s.rejection_reason, \
                s.submitted_at \
         FROM video_submissions s \
         JOIN influencers i ON i.id = s.influencer_id \
         WHERE ($1::TEXT IS NULL OR s.approval_status = $1) \
         ORDER BY s.submitted_at DESC, s.id DESC",
    )
    .bind(status.map(ApprovalStatus::as_str))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_submissions_for_influencer(
    pool: &PgPool,
    influencer_id: i64,
) -> Result<Vec<SubmissionRow>, DbError> {
    let sql = format!(
        "SELECT {SUBMISSION_COLUMNS} FROM video_submissions \
         WHERE influencer_id = $1 \
         ORDER BY submitted_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, SubmissionRow>(&sql)
        .bind(influencer_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
