//! Admin dashboard summary and CSV exports.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use creatorhub_core::reporting::{export_csv, export_filename, summarize, ExportKind, ReportSummary};
use creatorhub_core::{BillingMonth, Session};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    map_core_error, map_db_error, parse_month, require_admin, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct SummaryQuery {
    /// Month used for revenue-share eligibility; defaults to the current one.
    pub month: Option<String>,
}

pub(super) async fn summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ApiResponse<ReportSummary>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    let month = parse_month(rid, query.month.as_deref())?
        .unwrap_or_else(|| BillingMonth::of(Utc::now()));

    let snapshot = creatorhub_db::load_snapshot(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(summarize(&snapshot, month), req_id.0)))
}

/// `GET /api/v1/reports/export/{influencers|payments|videos}` as `text/csv`.
pub(super) async fn export(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    let kind: ExportKind = kind.parse().map_err(|e| map_core_error(rid, &e))?;

    let snapshot = creatorhub_db::load_snapshot(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let body = export_csv(kind, &snapshot);
    let filename = export_filename(kind, Utc::now().date_naive());
    tracing::info!(kind = %kind, bytes = body.len(), "report exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
