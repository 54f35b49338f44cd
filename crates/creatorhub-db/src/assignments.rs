//! Database operations for the `task_assignments` table.

use chrono::{DateTime, Utc};
use creatorhub_core::{BillingMonth, TaskStatus};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

const ASSIGNMENT_COLUMNS: &str = "id, task_id, influencer_id, assigned_month, assigned_year, \
     status, submission_id, started_at, submitted_at, completed_at, assigned_by, \
     created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssignmentRow {
    pub id: i64,
    pub task_id: i64,
    pub influencer_id: i64,
    pub assigned_month: i16,
    pub assigned_year: i32,
    pub status: String,
    pub submission_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssignmentRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the stored status is unknown.
    pub fn task_status(&self) -> Result<TaskStatus, DbError> {
        Ok(self.status.parse()?)
    }
}

/// An assignment joined with the task it points at.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssignmentWithTask {
    pub id: i64,
    pub task_id: i64,
    pub influencer_id: i64,
    pub influencer_name: String,
    pub assigned_month: i16,
    pub assigned_year: i32,
    pub status: String,
    pub submission_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub task_title: String,
    pub task_description: String,
    pub task_topic: String,
    pub task_guidelines: String,
    pub deliverables_required: Vec<String>,
    pub project_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

const JOINED_SELECT: &str = "SELECT a.id, a.task_id, a.influencer_id, i.full_name AS influencer_name, \
         a.assigned_month, a.assigned_year, a.status, a.submission_id, \
         a.started_at, a.submitted_at, a.completed_at, \
         t.title AS task_title, t.description AS task_description, t.topic AS task_topic, \
         t.guidelines AS task_guidelines, t.deliverables_required, t.project_id, a.created_at \
     FROM task_assignments a \
     JOIN monthly_tasks t ON t.id = a.task_id \
     JOIN influencers i ON i.id = a.influencer_id";

/// Assign `task_id` to an approved influencer for `cycle`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the task or influencer is missing,
/// [`DbError::InvalidTransition`] if the influencer is not approved, and a
/// unique violation if the pair is already assigned.
pub async fn assign_task(
    pool: &PgPool,
    task_id: i64,
    influencer_id: i64,
    cycle: BillingMonth,
    assigned_by: Uuid,
) -> Result<AssignmentRow, DbError> {
    crate::tasks::get_task(pool, task_id).await?;

    let sql = format!(
        "INSERT INTO task_assignments (task_id, influencer_id, assigned_month, assigned_year, \
             status, assigned_by) \
         SELECT $1, i.id, $3, $4, 'assigned', $5 \
         FROM influencers i \
         WHERE i.id = $2 AND i.approval_status = 'approved' \
         RETURNING {ASSIGNMENT_COLUMNS}"
    );
    let inserted = sqlx::query_as::<_, AssignmentRow>(&sql)
        .bind(task_id)
        .bind(influencer_id)
        .bind(cycle.month_i16())
        .bind(cycle.year)
        .bind(assigned_by)
        .fetch_optional(pool)
        .await?;

    match inserted {
        Some(row) => Ok(row),
        None => {
            crate::influencers::get_influencer(pool, influencer_id).await?;
            Err(DbError::InvalidTransition {
                entity: "influencer",
                id: influencer_id,
                expected: "approved",
            })
        }
    }
}

/// Influencer starts work: `assigned → in_progress`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the assignment does not belong to
/// `influencer_id`, or [`DbError::InvalidTransition`] if it is not `assigned`.
pub async fn start_assignment(
    pool: &PgPool,
    id: i64,
    influencer_id: i64,
) -> Result<AssignmentRow, DbError> {
    let sql = format!(
        "UPDATE task_assignments \
         SET status = 'in_progress', started_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND influencer_id = $2 AND status = ANY($3) \
         RETURNING {ASSIGNMENT_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, AssignmentRow>(&sql)
        .bind(id)
        .bind(influencer_id)
        .bind(vec![TaskStatus::Assigned.as_str()])
        .fetch_optional(pool)
        .await?;

    match updated {
        Some(row) => Ok(row),
        None => {
            let existing = get_assignment(pool, id).await?;
            if existing.influencer_id != influencer_id {
                return Err(DbError::NotFound);
            }
            Err(DbError::InvalidTransition {
                entity: "task assignment",
                id,
                expected: "assigned",
            })
        }
    }
}

/// Link a new submission and move the assignment to `submitted`.
pub(crate) async fn mark_submitted(
    conn: &mut PgConnection,
    id: i64,
    influencer_id: i64,
    submission_id: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE task_assignments \
         SET status = 'submitted', submission_id = $3, submitted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND influencer_id = $2 AND status = ANY($4)",
    )
    .bind(id)
    .bind(influencer_id)
    .bind(submission_id)
    .bind(TaskStatus::predecessors(TaskStatus::Submitted))
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidTransition {
            entity: "task assignment",
            id,
            expected: "assigned or in_progress",
        });
    }
    Ok(())
}

/// Move an assignment to the status that follows a review of its submission.
pub(crate) async fn apply_review_outcome(
    conn: &mut PgConnection,
    id: i64,
    next: TaskStatus,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE task_assignments \
         SET status = $2, \
             completed_at = CASE WHEN $2::TEXT = 'completed' THEN NOW() ELSE completed_at END, \
             submission_id = CASE WHEN $2::TEXT = 'in_progress' THEN NULL ELSE submission_id END, \
             submitted_at = CASE WHEN $2::TEXT = 'in_progress' THEN NULL ELSE submitted_at END, \
             updated_at = NOW() \
         WHERE id = $1 AND status = ANY($3)",
    )
    .bind(id)
    .bind(next.as_str())
    .bind(TaskStatus::predecessors(next))
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidTransition {
            entity: "task assignment",
            id,
            expected: "a status that can precede the review outcome",
        });
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the assignment does not exist.
pub async fn get_assignment(pool: &PgPool, id: i64) -> Result<AssignmentRow, DbError> {
    let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM task_assignments WHERE id = $1");
    sqlx::query_as::<_, AssignmentRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Every assignment (optionally one cycle), newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_assignments(
    pool: &PgPool,
    cycle: Option<BillingMonth>,
) -> Result<Vec<AssignmentWithTask>, DbError> {
    let sql = format!(
        "{JOINED_SELECT} \
         WHERE ($1::SMALLINT IS NULL OR (a.assigned_month = $1 AND a.assigned_year = $2)) \
         ORDER BY a.created_at DESC, a.id DESC"
    );
    let rows = sqlx::query_as::<_, AssignmentWithTask>(&sql)
        .bind(cycle.map(BillingMonth::month_i16))
        .bind(cycle.map(|c| c.year))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_assignments_for_influencer(
    pool: &PgPool,
    influencer_id: i64,
) -> Result<Vec<AssignmentWithTask>, DbError> {
    let sql = format!(
        "{JOINED_SELECT} \
         WHERE a.influencer_id = $1 \
         ORDER BY a.assigned_year DESC, a.assigned_month DESC, a.id DESC"
    );
    let rows = sqlx::query_as::<_, AssignmentWithTask>(&sql)
        .bind(influencer_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
