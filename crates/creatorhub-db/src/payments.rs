//! Database operations for the `payments` table.
//!
//! Nothing here moves money; rows only track what an admin recorded.

use chrono::{DateTime, Utc};
use creatorhub_core::{PaymentRecord, PaymentStatus, PaymentType};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

const PAYMENT_COLUMNS: &str = "id, influencer_id, video_submission_id, task_assignment_id, \
     amount, payment_type, payment_status, upi_transaction_id, paid_at, paid_by, notes, created_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub influencer_id: i64,
    pub video_submission_id: Option<i64>,
    pub task_assignment_id: Option<i64>,
    pub amount: Decimal,
    pub payment_type: String,
    pub payment_status: String,
    pub upi_transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if a stored enum column is unknown.
    pub fn into_record(self) -> Result<PaymentRecord, DbError> {
        Ok(PaymentRecord {
            payment_type: self.payment_type.parse()?,
            payment_status: self.payment_status.parse()?,
            id: self.id,
            influencer_id: self.influencer_id,
            amount: self.amount,
            upi_transaction_id: self.upi_transaction_id,
            created_at: self.created_at,
            paid_at: self.paid_at,
            notes: self.notes,
        })
    }
}

/// A payment joined with its payee.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PaymentWithInfluencer {
    pub id: i64,
    pub influencer_id: i64,
    pub influencer_name: String,
    pub influencer_email: String,
    pub upi_id: String,
    pub video_submission_id: Option<i64>,
    pub amount: Decimal,
    pub payment_type: String,
    pub payment_status: String,
    pub upi_transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub influencer_id: i64,
    pub video_submission_id: Option<i64>,
    pub task_assignment_id: Option<i64>,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

fn statuses_before(next: PaymentStatus) -> Vec<&'static str> {
    PaymentStatus::ALL
        .iter()
        .copied()
        .filter(|from| from.can_transition_to(next))
        .map(PaymentStatus::as_str)
        .collect()
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the influencer does not exist, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_payment(pool: &PgPool, payment: &NewPayment) -> Result<PaymentRow, DbError> {
    crate::influencers::get_influencer(pool, payment.influencer_id).await?;
    let mut conn = pool.acquire().await?;
    insert_payment(&mut conn, payment).await
}

pub(crate) async fn insert_payment(
    conn: &mut PgConnection,
    payment: &NewPayment,
) -> Result<PaymentRow, DbError> {
    let sql = format!(
        "INSERT INTO payments (influencer_id, video_submission_id, task_assignment_id, amount, \
             payment_type, payment_status, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {PAYMENT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(payment.influencer_id)
        .bind(payment.video_submission_id)
        .bind(payment.task_assignment_id)
        .bind(payment.amount)
        .bind(payment.payment_type.as_str())
        .bind(payment.payment_status.as_str())
        .bind(&payment.notes)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

/// Mark a payment `paid` with its UPI transaction reference. A revenue share
/// linked to this payment becomes `paid` in the same transaction.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown id, or
/// [`DbError::InvalidTransition`] if the payment is already paid.
pub async fn mark_payment_paid(
    pool: &PgPool,
    id: i64,
    upi_transaction_id: &str,
    paid_by: Uuid,
) -> Result<PaymentRow, DbError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "UPDATE payments \
         SET payment_status = 'paid', upi_transaction_id = $2, paid_at = NOW(), \
             paid_by = $3, updated_at = NOW() \
         WHERE id = $1 AND payment_status = ANY($4) \
         RETURNING {PAYMENT_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(id)
        .bind(upi_transaction_id)
        .bind(paid_by)
        .bind(statuses_before(PaymentStatus::Paid))
        .fetch_optional(&mut *tx)
        .await?;

    let Some(row) = updated else {
        tx.rollback().await?;
        get_payment(pool, id).await?;
        return Err(DbError::InvalidTransition {
            entity: "payment",
            id,
            expected: "pending or under_review",
        });
    };

    sqlx::query(
        "UPDATE revenue_shares SET payment_status = 'paid', updated_at = NOW() \
         WHERE payment_id = $1",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Move an unpaid payment between `pending` and `under_review`.
///
/// # Errors
///
/// Returns [`DbError::InvalidTransition`] if the move is not allowed from
/// the current status, or [`DbError::NotFound`] for an unknown id.
pub async fn update_payment_status(
    pool: &PgPool,
    id: i64,
    next: PaymentStatus,
) -> Result<PaymentRow, DbError> {
    if next == PaymentStatus::Paid {
        return Err(DbError::InvalidTransition {
            entity: "payment",
            id,
            expected: "a transaction reference to mark it paid",
        });
    }

    let sql = format!(
        "UPDATE payments SET payment_status = $2, updated_at = NOW() \
         WHERE id = $1 AND payment_status = ANY($3) \
         RETURNING {PAYMENT_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(id)
        .bind(next.as_str())
        .bind(statuses_before(next))
        .fetch_optional(pool)
        .await?;

    match updated {
        Some(row) => Ok(row),
        None => {
            get_payment(pool, id).await?;
            Err(DbError::InvalidTransition {
                entity: "payment",
                id,
                expected: "an unpaid status",
            })
        }
    }
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the payment does not exist.
pub async fn get_payment(pool: &PgPool, id: i64) -> Result<PaymentRow, DbError> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
    sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Admin view with payee details, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_payments(
    pool: &PgPool,
    status: Option<PaymentStatus>,
) -> Result<Vec<PaymentWithInfluencer>, DbError> {
    let rows = sqlx::query_as::<_, PaymentWithInfluencer>(
        "SELECT p.id, p.influencer_id, i.full_name AS influencer_name, \
                i.email AS influencer_email, i.upi_id, p.video_submission_id, p.amount, \
                p.payment_type, p.payment_status, p.upi_transaction_id, p.paid_at, p.notes, \
                p.created_at \
         FROM payments p \
         JOIN influencers i ON i.id = p.influencer_id \
         WHERE ($1::TEXT IS NULL OR p.payment_status = $1) \
         ORDER BY p.created_at DESC, p.id DESC",
    )
    .bind(status.map(PaymentStatus::as_str))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_payments_for_influencer(
    pool: &PgPool,
    influencer_id: i64,
) -> Result<Vec<PaymentRow>, DbError> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE influencer_id = $1 \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(influencer_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
