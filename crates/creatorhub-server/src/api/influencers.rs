//! Registration, the caller's own dashboard, and admin approval.
//!
//! - `POST /api/v1/register`                  — public self-service registration
//! - `GET  /api/v1/me`                        — session, profile and dashboard stats
//! - `GET  /api/v1/influencers?status=`       — admin list
//! - `GET  /api/v1/influencers/{id}`          — admin detail
//! - `POST /api/v1/influencers/{id}/approve`  — admin decision
//! - `POST /api/v1/influencers/{id}/reject`   — admin decision

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use creatorhub_core::validation::validate_profile;
use creatorhub_core::{ApprovalStatus, BillingMonth, InfluencerProfile, Session, UserRole};
use creatorhub_db::{InfluencerRow, InfluencerStats};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_core_error, map_db_error, require_admin, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct RegistrationResponse {
    influencer: InfluencerRow,
    /// Shown once; only its hash is stored.
    api_token: String,
}

#[derive(Debug, Serialize)]
pub(super) struct MeResponse {
    session: Session,
    influencer: Option<InfluencerRow>,
    stats: Option<InfluencerStats>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusQuery {
    pub status: Option<ApprovalStatus>,
}

pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(profile): Json<InfluencerProfile>,
) -> Result<(StatusCode, Json<ApiResponse<RegistrationResponse>>), ApiError> {
    let rid = &req_id.0;
    validate_profile(&profile).map_err(|e| map_core_error(rid, &e))?;

    let api_token = creatorhub_db::generate_api_token();
    let hash = creatorhub_db::hash_api_token(&state.config.token_salt, &api_token);

    let influencer = creatorhub_db::register_influencer(&state.pool, &profile, &hash)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::new(rid, "conflict", "an account with that email already exists")
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    tracing::info!(influencer_id = influencer.id, "influencer registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            RegistrationResponse {
                influencer,
                api_token,
            },
            req_id.0,
        )),
    ))
}

pub(super) async fn me(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let rid = &req_id.0;

    let (influencer, stats) = if session.role == UserRole::Influencer {
        let influencer = creatorhub_db::get_influencer_by_user(&state.pool, session.user_id)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;
        let stats = match &influencer {
            Some(row) => Some(
                creatorhub_db::influencer_stats(&state.pool, row.id, BillingMonth::of(Utc::now()))
                    .await
                    .map_err(|e| map_db_error(rid.clone(), &e))?,
            ),
            None => None,
        };
        (influencer, stats)
    } else {
        (None, None)
    };

    Ok(Json(ApiResponse::new(
        MeResponse {
            session,
            influencer,
            stats,
        },
        req_id.0,
    )))
}

pub(super) async fn list_influencers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<Vec<InfluencerRow>>>, ApiError> {
    require_admin(&req_id.0, &session)?;

    let rows = creatorhub_db::list_influencers(&state.pool, query.status)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn get_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<InfluencerRow>>, ApiError> {
    require_admin(&req_id.0, &session)?;

    let row = creatorhub_db::get_influencer(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(row, req_id.0)))
}

async fn decide(
    state: &AppState,
    req_id: RequestId,
    session: &Session,
    id: i64,
    decision: ApprovalStatus,
) -> Result<Json<ApiResponse<InfluencerRow>>, ApiError> {
    require_admin(&req_id.0, session)?;

    let row = creatorhub_db::decide_influencer(&state.pool, id, decision, session.user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(influencer_id = id, decision = %decision, admin = %session.user_id, "influencer decided");
    Ok(Json(ApiResponse::new(row, req_id.0)))
}

pub(super) async fn approve_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<InfluencerRow>>, ApiError> {
    decide(&state, req_id, &session, id, ApprovalStatus::Approved).await
}

pub(super) async fn reject_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<InfluencerRow>>, ApiError> {
    decide(&state, req_id, &session, id, ApprovalStatus::Rejected).await
}
