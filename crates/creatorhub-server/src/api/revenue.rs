//! Monthly revenue shares.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use creatorhub_core::{BillingMonth, Session};
use creatorhub_db::{LeadFigures, PaymentRow, RevenueRunSummary, RevenueShareRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    current_influencer, map_db_error, parse_month, require_admin, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct LeadEntry {
    pub influencer_id: i64,
    #[serde(default)]
    pub leads_generated: u32,
    #[serde(default)]
    pub revenue_from_leads: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ComputeRequest {
    /// `YYYY-MM`; defaults to the previous calendar month.
    pub month: Option<String>,
    #[serde(default)]
    pub leads: Vec<LeadEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ShareQuery {
    pub month: Option<String>,
    pub influencer_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct PayoutResponse {
    share: RevenueShareRow,
    payment: PaymentRow,
}

/// Later entries for the same influencer replace earlier ones.
fn lead_map(entries: Vec<LeadEntry>) -> HashMap<i64, LeadFigures> {
    entries
        .into_iter()
        .map(|e| {
            (
                e.influencer_id,
                LeadFigures {
                    leads_generated: e.leads_generated,
                    revenue_from_leads: e.revenue_from_leads,
                },
            )
        })
        .collect()
}

pub(super) async fn compute_revenue_shares(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Json(body): Json<ComputeRequest>,
) -> Result<Json<ApiResponse<RevenueRunSummary>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;

    let month = parse_month(rid, body.month.as_deref())?
        .unwrap_or_else(|| BillingMonth::of(Utc::now()).previous());
    let leads = lead_map(body.leads);

    let summary =
        creatorhub_db::compute_monthly_revenue(&state.pool, month, &leads, Some(session.user_id))
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        month = %month,
        computed = summary.computed.len(),
        skipped_paid = summary.skipped_paid.len(),
        skipped_linked = summary.skipped_linked.len(),
        "revenue shares computed"
    );
    Ok(Json(ApiResponse::new(summary, req_id.0)))
}

pub(super) async fn list_revenue_shares(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<ShareQuery>,
) -> Result<Json<ApiResponse<Vec<RevenueShareRow>>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    let month = parse_month(rid, query.month.as_deref())?;

    let rows = creatorhub_db::list_revenue_shares(&state.pool, month, query.influencer_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn my_revenue_shares(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<Vec<RevenueShareRow>>>, ApiError> {
    let rid = &req_id.0;
    let influencer = current_influencer(&state, rid, &session).await?;

    let rows = creatorhub_db::list_revenue_shares(&state.pool, None, Some(influencer.id))
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

/// Open a pending payment for a calculated share.
pub(super) async fn pay_revenue_share(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PayoutResponse>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;

    let (share, payment) = creatorhub_db::pay_revenue_share(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(share_id = id, payment_id = payment.id, amount = %payment.amount, "revenue share payout opened");
    Ok(Json(ApiResponse::new(PayoutResponse { share, payment }, req_id.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_map_keeps_last_entry_per_influencer() {
        let map = lead_map(vec![
            LeadEntry {
                influencer_id: 7,
                leads_generated: 1,
                revenue_from_leads: Decimal::from(100),
            },
            LeadEntry {
                influencer_id: 7,
                leads_generated: 4,
                revenue_from_leads: Decimal::from(2500),
            },
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&7].leads_generated, 4);
        assert_eq!(map[&7].revenue_from_leads, Decimal::from(2500));
    }

    #[test]
    fn compute_request_defaults_to_no_leads() {
        let body: ComputeRequest = serde_json::from_str("{}").unwrap();
        assert!(body.month.is_none());
        assert!(body.leads.is_empty());
    }
}
