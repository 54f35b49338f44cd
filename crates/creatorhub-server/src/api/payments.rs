//! Payment bookkeeping. Rows record what an admin paid out by UPI; no money
//! moves through this service.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use creatorhub_core::validation::{require_text, validate_amount};
use creatorhub_core::{PaymentStatus, PaymentType, Session};
use creatorhub_db::{NewPayment, PaymentRow, PaymentWithInfluencer};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    current_influencer, map_core_error, map_db_error, require_admin, ApiError, ApiResponse,
    AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct CreatePaymentRequest {
    pub influencer_id: i64,
    pub video_submission_id: Option<i64>,
    pub task_assignment_id: Option<i64>,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusQuery {
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MarkPaidRequest {
    pub upi_transaction_id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusUpdateRequest {
    pub status: PaymentStatus,
}

pub(super) async fn create_payment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentRow>>), ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    validate_amount(body.amount).map_err(|e| map_core_error(rid, &e))?;

    let payment_status = body.payment_status.unwrap_or(PaymentStatus::Pending);
    if payment_status == PaymentStatus::Paid {
        return Err(ApiError::validation(
            rid,
            "new payments start pending or under_review; use mark-paid to record the transfer",
        ));
    }

    let payment = NewPayment {
        influencer_id: body.influencer_id,
        video_submission_id: body.video_submission_id,
        task_assignment_id: body.task_assignment_id,
        amount: body.amount,
        payment_type: body.payment_type,
        payment_status,
        notes: body
            .notes
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty()),
    };

    let row = creatorhub_db::create_payment(&state.pool, &payment)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        payment_id = row.id,
        influencer_id = row.influencer_id,
        amount = %row.amount,
        payment_type = %payment.payment_type,
        "payment recorded"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

pub(super) async fn list_payments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<Vec<PaymentWithInfluencer>>>, ApiError> {
    require_admin(&req_id.0, &session)?;

    let rows = creatorhub_db::list_payments(&state.pool, query.status)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn my_payments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<Vec<PaymentRow>>>, ApiError> {
    let rid = &req_id.0;
    let influencer = current_influencer(&state, rid, &session).await?;

    let rows = creatorhub_db::list_payments_for_influencer(&state.pool, influencer.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn mark_paid(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(body): Json<MarkPaidRequest>,
) -> Result<Json<ApiResponse<PaymentRow>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    let txn = require_text("upi_transaction_id", &body.upi_transaction_id)
        .map_err(|e| map_core_error(rid, &e))?;

    let row = creatorhub_db::mark_payment_paid(&state.pool, id, txn, session.user_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(payment_id = id, paid_by = %session.user_id, "payment marked paid");
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

pub(super) async fn update_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<PaymentRow>>, ApiError> {
    require_admin(&req_id.0, &session)?;

    let row = creatorhub_db::update_payment_status(&state.pool, id, body.status)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(row, req_id.0)))
}
