//! Multi-step workflows that span several tables.

use std::collections::HashMap;

use creatorhub_core::{
    compute_revenue_share, ApprovalStatus, BillingMonth, RejectionPolicy, RevenueInput,
    RevenueShareStatus, ReviewDecision, TaskStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::assignments::apply_review_outcome;
use crate::influencers::list_influencers;
use crate::revenue_shares::{list_revenue_shares, upsert_revenue_share, RevenueShareRow};
use crate::submissions::{decide_submission, get_submission, SubmissionRow};
use crate::DbError;

/// Review a pending submission and move its linked assignment in the same
/// transaction.
///
/// Approval completes the assignment; rejection follows `policy`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown submission,
/// [`DbError::InvalidTransition`] if it was already reviewed or the linked
/// assignment cannot take the outcome. Nothing is written on error.
pub async fn review_submission(
    pool: &PgPool,
    id: i64,
    decision: &ReviewDecision,
    reviewer: Uuid,
    policy: RejectionPolicy,
) -> Result<SubmissionRow, DbError> {
    let mut tx = pool.begin().await?;

    let Some(row) = decide_submission(&mut *tx, id, decision, reviewer).await? else {
        tx.rollback().await?;
        get_submission(pool, id).await?;
        return Err(DbError::InvalidTransition {
            entity: "video submission",
            id,
            expected: "pending",
        });
    };

    if let Some(assignment_id) = row.task_assignment_id {
        let next = TaskStatus::after_review(decision, policy);
        apply_review_outcome(&mut *tx, assignment_id, next).await?;
    }

    tx.commit().await?;
    Ok(row)
}

/// Lead figures an admin supplies for one influencer's month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFigures {
    pub leads_generated: u32,
    pub revenue_from_leads: Decimal,
}

impl LeadFigures {
    /// Figures recorded on an earlier calculation of the same share.
    #[must_use]
    pub fn from_stored(row: &RevenueShareRow) -> Self {
        Self {
            leads_generated: u32::try_from(row.leads_generated).unwrap_or(0),
            revenue_from_leads: row.revenue_from_leads,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueRunSummary {
    pub month: BillingMonth,
    pub computed: Vec<RevenueShareRow>,
    /// Influencers whose share for the month is already paid.
    pub skipped_paid: Vec<i64>,
    /// Influencers whose share is linked to a payment that is not yet paid.
    pub skipped_linked: Vec<i64>,
}

async fn approved_counts(
    pool: &PgPool,
    month: BillingMonth,
) -> Result<HashMap<i64, u32>, DbError> {
    let (start, end) = month.bounds();
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT influencer_id, COUNT(*) FROM video_submissions \
         WHERE approval_status = 'approved' AND submitted_at >= $1 AND submitted_at < $2 \
         GROUP BY influencer_id",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, u32::try_from(count).unwrap_or(u32::MAX)))
        .collect())
}

/// Compute and store `month`'s revenue share for every approved influencer.
///
/// Influencers missing from `leads` keep the figures stored by an earlier
/// run of the same month, or zero leads on a first run. Shares already
/// `paid` are reported in `skipped_paid`; shares linked to a pending payment
/// are reported in `skipped_linked`. Neither is recomputed.
///
/// # Errors
///
/// Returns [`DbError::InvalidValue`] for negative lead revenue, or
/// [`DbError::Sqlx`] if a query fails. Shares upserted before the failure
/// stay written; a re-run recomputes them.
pub async fn compute_monthly_revenue(
    pool: &PgPool,
    month: BillingMonth,
    leads: &HashMap<i64, LeadFigures>,
    calculated_by: Option<Uuid>,
) -> Result<RevenueRunSummary, DbError> {
    let influencers = list_influencers(pool, Some(ApprovalStatus::Approved)).await?;
    let counts = approved_counts(pool, month).await?;
    let existing: HashMap<i64, RevenueShareRow> = list_revenue_shares(pool, Some(month), None)
        .await?
        .into_iter()
        .map(|row| (row.influencer_id, row))
        .collect();

    let mut summary = RevenueRunSummary {
        month,
        computed: Vec::with_capacity(influencers.len()),
        skipped_paid: Vec::new(),
        skipped_linked: Vec::new(),
    };

    for influencer in influencers {
        let stored = existing.get(&influencer.id);
        if let Some(row) = stored {
            if row.status()? == RevenueShareStatus::Paid {
                summary.skipped_paid.push(influencer.id);
                continue;
            }
            if row.payment_id.is_some() {
                summary.skipped_linked.push(influencer.id);
                continue;
            }
        }

        let figures = leads
            .get(&influencer.id)
            .copied()
            .or_else(|| stored.map(LeadFigures::from_stored))
            .unwrap_or_default();
        let breakdown = compute_revenue_share(&RevenueInput {
            follower_count: u64::try_from(influencer.follower_count).unwrap_or(0),
            videos_approved: counts.get(&influencer.id).copied().unwrap_or(0),
            leads_generated: figures.leads_generated,
            revenue_from_leads: figures.revenue_from_leads,
        })?;

        match upsert_revenue_share(pool, influencer.id, month, &breakdown, calculated_by).await? {
            Some(row) => summary.computed.push(row),
            // Paid or linked between the snapshot and the upsert.
            None => summary.skipped_linked.push(influencer.id),
        }
    }

    Ok(summary)
}
