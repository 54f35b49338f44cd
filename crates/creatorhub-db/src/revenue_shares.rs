//! Database operations for the `revenue_shares` ledger.

use chrono::{DateTime, Utc};
use creatorhub_core::{
    BillingMonth, PaymentStatus, PaymentType, RevenueBreakdown, RevenueShareStatus,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::payments::{insert_payment, NewPayment, PaymentRow};
use crate::DbError;

const SHARE_COLUMNS: &str = "id, influencer_id, month, year, follower_band, fixed_payout, \
     leads_generated, revenue_from_leads, performance_share_percentage, \
     performance_share_amount, total_earning, videos_approved, payment_status, payment_id, \
     calculated_at, calculated_by, notes, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RevenueShareRow {
    pub id: i64,
    pub influencer_id: i64,
    pub month: i16,
    pub year: i32,
    pub follower_band: String,
    pub fixed_payout: Decimal,
    pub leads_generated: i32,
    pub revenue_from_leads: Decimal,
    pub performance_share_percentage: Decimal,
    pub performance_share_amount: Decimal,
    pub total_earning: Decimal,
    pub videos_approved: i32,
    pub payment_status: String,
    pub payment_id: Option<i64>,
    pub calculated_at: Option<DateTime<Utc>>,
    pub calculated_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RevenueShareRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the stored status is unknown.
    pub fn status(&self) -> Result<RevenueShareStatus, DbError> {
        Ok(self.payment_status.parse()?)
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Insert or recompute the `(influencer, month)` share as `calculated`.
///
/// Returns `None` when the existing row is already `paid` or linked to a
/// payment; the payment amount was fixed from the old total.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_revenue_share(
    pool: &PgPool,
    influencer_id: i64,
    month: BillingMonth,
    breakdown: &RevenueBreakdown,
    calculated_by: Option<Uuid>,
) -> Result<Option<RevenueShareRow>, DbError> {
    let sql = format!(
        "INSERT INTO revenue_shares (influencer_id, month, year, follower_band, fixed_payout, \
             leads_generated, revenue_from_leads, performance_share_percentage, \
             performance_share_amount, total_earning, videos_approved, payment_status, \
             calculated_at, calculated_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'calculated', NOW(), $12) \
         ON CONFLICT (influencer_id, month, year) DO UPDATE SET \
             follower_band = EXCLUDED.follower_band, \
             fixed_payout = EXCLUDED.fixed_payout, \
             leads_generated = EXCLUDED.leads_generated, \
             revenue_from_leads = EXCLUDED.revenue_from_leads, \
             performance_share_percentage = EXCLUDED.performance_share_percentage, \
             performance_share_amount = EXCLUDED.performance_share_amount, \
             total_earning = EXCLUDED.total_earning, \
             videos_approved = EXCLUDED.videos_approved, \
             payment_status = 'calculated', \
             calculated_at = NOW(), \
             calculated_by = EXCLUDED.calculated_by, \
             updated_at = NOW() \
         WHERE revenue_shares.payment_status <> 'paid' AND revenue_shares.payment_id IS NULL \
         RETURNING {SHARE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, RevenueShareRow>(&sql)
        .bind(influencer_id)
        .bind(month.month_i16())
        .bind(month.year)
        .bind(breakdown.follower_band.as_str())
        .bind(breakdown.fixed_payout)
        .bind(to_i32(breakdown.leads_generated))
        .bind(breakdown.revenue_from_leads)
        .bind(breakdown.performance_share_percentage)
        .bind(breakdown.performance_share_amount)
        .bind(breakdown.total_earning)
        .bind(to_i32(breakdown.videos_approved))
        .bind(calculated_by)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the share does not exist.
pub async fn get_revenue_share(pool: &PgPool, id: i64) -> Result<RevenueShareRow, DbError> {
    let sql = format!("SELECT {SHARE_COLUMNS} FROM revenue_shares WHERE id = $1");
    sqlx::query_as::<_, RevenueShareRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Shares for one month (or all), optionally for one influencer.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_revenue_shares(
    pool: &PgPool,
    month: Option<BillingMonth>,
    influencer_id: Option<i64>,
) -> Result<Vec<RevenueShareRow>, DbError> {
    let sql = format!(
        "SELECT {SHARE_COLUMNS} FROM revenue_shares \
         WHERE ($1::SMALLINT IS NULL OR (month = $1 AND year = $2)) \
           AND ($3::BIGINT IS NULL OR influencer_id = $3) \
         ORDER BY year DESC, month DESC, total_earning DESC, id"
    );
    let rows = sqlx::query_as::<_, RevenueShareRow>(&sql)
        .bind(month.map(BillingMonth::month_i16))
        .bind(month.map(|m| m.year))
        .bind(influencer_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Create a pending `revenue_share` payment for the share's `total_earning`
/// and link it. The share becomes `paid` once that payment is marked paid.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown id, or
/// [`DbError::InvalidTransition`] unless the share is `calculated` and not
/// yet linked to a payment.
pub async fn pay_revenue_share(
    pool: &PgPool,
    id: i64,
) -> Result<(RevenueShareRow, PaymentRow), DbError> {
    let mut tx = pool.begin().await?;

    let lock_sql = format!("SELECT {SHARE_COLUMNS} FROM revenue_shares WHERE id = $1 FOR UPDATE");
    let share = sqlx::query_as::<_, RevenueShareRow>(&lock_sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

    if share.status()? != RevenueShareStatus::Calculated || share.payment_id.is_some() {
        return Err(DbError::InvalidTransition {
            entity: "revenue share",
            id,
            expected: "calculated and not yet linked to a payment",
        });
    }

    let month = BillingMonth::from_columns(share.year, share.month)?;
    let payment = insert_payment(
        &mut *tx,
        &NewPayment {
            influencer_id: share.influencer_id,
            video_submission_id: None,
            task_assignment_id: None,
            amount: share.total_earning,
            payment_type: PaymentType::RevenueShare,
            payment_status: PaymentStatus::Pending,
            notes: Some(format!("Revenue share for {month}")),
        },
    )
    .await?;

    let link_sql = format!(
        "UPDATE revenue_shares SET payment_id = $2, updated_at = NOW() \
         WHERE id = $1 RETURNING {SHARE_COLUMNS}"
    );
    let share = sqlx::query_as::<_, RevenueShareRow>(&link_sql)
        .bind(id)
        .bind(payment.id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok((share, payment))
}
