//! Database operations for the `influencers` table.

use chrono::{DateTime, Utc};
use creatorhub_core::{ApprovalStatus, CoreError, InfluencerProfile, InfluencerRecord, UserRole};
use serde::Serialize;
use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use crate::users::insert_user;
use crate::DbError;

const INFLUENCER_COLUMNS: &str = "id, user_id, full_name, phone_number, email, district, state, \
     social_media_handles, follower_count, id_proof_url, id_proof_type, upi_id, \
     approval_status, approved_at, approved_by, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InfluencerRow {
    pub id: i64,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub district: String,
    pub state: String,
    pub social_media_handles: serde_json::Value,
    pub follower_count: i32,
    pub id_proof_url: String,
    pub id_proof_type: String,
    pub upi_id: String,
    pub approval_status: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InfluencerRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the stored status is unknown.
    pub fn status(&self) -> Result<ApprovalStatus, DbError> {
        Ok(self.approval_status.parse()?)
    }

    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the stored status is unknown.
    pub fn into_record(self) -> Result<InfluencerRecord, DbError> {
        Ok(InfluencerRecord {
            approval_status: self.status()?,
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            phone_number: self.phone_number,
            district: self.district,
            state: self.state,
            follower_count: self.follower_count,
            upi_id: self.upi_id,
            created_at: self.created_at,
        })
    }
}

/// Create the `users` row and a `pending` influencer profile in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on failure; a duplicate email surfaces as a
/// unique violation (see [`DbError::is_unique_violation`]).
pub async fn register_influencer(
    pool: &PgPool,
    profile: &InfluencerProfile,
    token_hash: &str,
) -> Result<InfluencerRow, DbError> {
    let mut tx = pool.begin().await?;
    let user = insert_user(
        &mut *tx,
        Uuid::new_v4(),
        &profile.email,
        UserRole::Influencer,
        Some(token_hash),
    )
    .await?;
    let row = insert_influencer(&mut *tx, user.id, profile, ApprovalStatus::Pending, None).await?;
    tx.commit().await?;
    Ok(row)
}

pub(crate) async fn insert_influencer(
    conn: &mut PgConnection,
    user_id: Uuid,
    profile: &InfluencerProfile,
    status: ApprovalStatus,
    approved_by: Option<Uuid>,
) -> Result<InfluencerRow, DbError> {
    let sql = format!(
        "INSERT INTO influencers (user_id, full_name, phone_number, email, district, state, \
             social_media_handles, follower_count, id_proof_url, id_proof_type, upi_id, \
             approval_status, approved_at, approved_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
             CASE WHEN $12::TEXT = 'approved' THEN NOW() END, $13) \
         RETURNING {INFLUENCER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, InfluencerRow>(&sql)
        .bind(user_id)
        .bind(profile.full_name.trim())
        .bind(profile.phone_number.trim())
        .bind(profile.email.trim().to_lowercase())
        .bind(profile.district.trim())
        .bind(profile.state.trim())
        .bind(Json(&profile.social_media_handles))
        .bind(profile.follower_count)
        .bind(profile.id_proof_url.trim())
        .bind(profile.id_proof_type.as_str())
        .bind(profile.upi_id.trim())
        .bind(status.as_str())
        .bind(approved_by)
        .fetch_one(conn)
        .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no influencer has this id.
pub async fn get_influencer(pool: &PgPool, id: i64) -> Result<InfluencerRow, DbError> {
    let sql = format!("SELECT {INFLUENCER_COLUMNS} FROM influencers WHERE id = $1");
    sqlx::query_as::<_, InfluencerRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// The profile owned by `user_id`, if the user has registered one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_influencer_by_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<InfluencerRow>, DbError> {
    let sql = format!("SELECT {INFLUENCER_COLUMNS} FROM influencers WHERE user_id = $1");
    let row = sqlx::query_as::<_, InfluencerRow>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Newest first, optionally filtered by approval status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_influencers(
    pool: &PgPool,
    status: Option<ApprovalStatus>,
) -> Result<Vec<InfluencerRow>, DbError> {
    let sql = format!(
        "SELECT {INFLUENCER_COLUMNS} FROM influencers \
         WHERE ($1::TEXT IS NULL OR approval_status = $1) \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, InfluencerRow>(&sql)
        .bind(status.map(ApprovalStatus::as_str))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Approve or reject a pending application.
///
/// The `WHERE approval_status = 'pending'` guard makes the decision final:
/// a second call, concurrent or not, gets [`DbError::InvalidTransition`].
///
/// # Errors
///
/// Returns [`DbError::InvalidValue`] if `decision` is `pending`,
/// [`DbError::NotFound`] for an unknown id, and
/// [`DbError::InvalidTransition`] if the application was already decided.
pub async fn decide_influencer(
    pool: &PgPool,
    id: i64,
    decision: ApprovalStatus,
    admin_id: Uuid,
) -> Result<InfluencerRow, DbError> {
    if !ApprovalStatus::Pending.can_transition_to(decision) {
        return Err(CoreError::InvalidTransition {
            entity: "influencer",
            from: ApprovalStatus::Pending.to_string(),
            to: decision.to_string(),
        }
        .into());
    }

    let sql = format!(
        "UPDATE influencers \
         SET approval_status = $2, \
             approved_at = CASE WHEN $2::TEXT = 'approved' THEN NOW() ELSE approved_at END, \
             approved_by = $3, \
             updated_at = NOW() \
         WHERE id = $1 AND approval_status = 'pending' \
         RETURNING {INFLUENCER_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, InfluencerRow>(&sql)
        .bind(id)
        .bind(decision.as_str())
        .bind(admin_id)
        .fetch_optional(pool)
        .await?;

    match updated {
        Some(row) => Ok(row),
        None => {
            // Distinguish a missing row from one that was already decided.
            get_influencer(pool, id).await?;
            Err(DbError::InvalidTransition {
                entity: "influencer",
                id,
                expected: "pending",
            })
        }
    }
}
