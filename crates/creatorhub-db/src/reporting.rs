//! Loaders feeding the pure aggregation in `creatorhub_core::reporting`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use creatorhub_core::reporting::{Snapshot, StatusCounts};
use creatorhub_core::revenue::{count_approved_in_month, is_eligible_for_share};
use creatorhub_core::{ApprovalStatus, BillingMonth, FollowerBand, PaymentStatus, TaskStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::influencers::{get_influencer, list_influencers};
use crate::payments::{list_payments_for_influencer, PaymentRow};
use crate::submissions::{list_submissions_for_influencer, SubmissionRow};
use crate::DbError;

/// Read every influencer, submission and payment into a report snapshot.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails, or [`DbError::InvalidValue`]
/// if a stored status does not parse.
pub async fn load_snapshot(pool: &PgPool) -> Result<Snapshot, DbError> {
    let influencers = list_influencers(pool, None)
        .await?
        .into_iter()
        .map(crate::InfluencerRow::into_record)
        .collect::<Result<Vec<_>, _>>()?;

    let submissions = sqlx::query_as::<_, SubmissionRow>(
        "SELECT id, influencer_id, task_assignment_id, title, description, video_url, \
             video_file_url, thumbnail_url, approval_status, reviewed_at, reviewed_by, \
             rejection_reason, submitted_at \
         FROM video_submissions ORDER BY submitted_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(SubmissionRow::into_record)
    .collect::<Result<Vec<_>, _>>()?;

    let payments = sqlx::query_as::<_, PaymentRow>(
        "SELECT id, influencer_id, video_submission_id, task_assignment_id, amount, \
             payment_type, payment_status, upi_transaction_id, paid_at, paid_by, notes, created_at \
         FROM payments ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(PaymentRow::into_record)
    .collect::<Result<Vec<_>, _>>()?;

    Ok(Snapshot {
        influencers,
        submissions,
        payments,
    })
}

/// An influencer's own dashboard figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfluencerStats {
    pub month: BillingMonth,
    pub follower_band: FollowerBand,
    pub videos: StatusCounts,
    pub approved_this_month: u32,
    pub eligible_for_revenue_share: bool,
    pub total_paid: Decimal,
    pub pending_payments: Decimal,
    /// Assignment count per task status; every status is present.
    pub tasks: BTreeMap<TaskStatus, usize>,
}

/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown influencer, or
/// [`DbError::Sqlx`] / [`DbError::InvalidValue`] on query or parse failure.
pub async fn influencer_stats(
    pool: &PgPool,
    influencer_id: i64,
    month: BillingMonth,
) -> Result<InfluencerStats, DbError> {
    let influencer = get_influencer(pool, influencer_id).await?;

    let submissions: Vec<(ApprovalStatus, DateTime<Utc>)> =
        list_submissions_for_influencer(pool, influencer_id)
            .await?
            .into_iter()
            .map(|s| Ok((s.approval_status.parse()?, s.submitted_at)))
            .collect::<Result<_, DbError>>()?;

    let mut total_paid = Decimal::ZERO;
    let mut pending_payments = Decimal::ZERO;
    for payment in list_payments_for_influencer(pool, influencer_id).await? {
        match payment.payment_status.parse::<PaymentStatus>()? {
            PaymentStatus::Paid => total_paid += payment.amount,
            PaymentStatus::Pending | PaymentStatus::UnderReview => {
                pending_payments += payment.amount;
            }
        }
    }

    let task_rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM task_assignments WHERE influencer_id = $1 GROUP BY status",
    )
    .bind(influencer_id)
    .fetch_all(pool)
    .await?;
    let mut tasks: BTreeMap<TaskStatus, usize> =
        TaskStatus::ALL.iter().map(|&status| (status, 0)).collect();
    for (status, count) in task_rows {
        tasks.insert(status.parse()?, usize::try_from(count).unwrap_or(0));
    }

    let approved_this_month = count_approved_in_month(submissions.iter().copied(), month);

    Ok(InfluencerStats {
        month,
        follower_band: FollowerBand::from_follower_count(
            u64::try_from(influencer.follower_count).unwrap_or(0),
        ),
        videos: StatusCounts::tally(submissions.iter().map(|(status, _)| *status)),
        approved_this_month,
        eligible_for_revenue_share: is_eligible_for_share(approved_this_month),
        total_paid,
        pending_payments,
        tasks,
    })
}
