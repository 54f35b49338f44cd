//! Video submissions and their review.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use creatorhub_core::validation::require_text;
use creatorhub_core::{ApprovalStatus, ReviewDecision, Session};
use creatorhub_db::{NewSubmission, SubmissionRow, SubmissionWithInfluencer};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    current_influencer, map_core_error, map_db_error, parse_url_or_validation_error,
    require_admin, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct CreateSubmissionRequest {
    pub task_assignment_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: Option<String>,
    pub video_file_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusQuery {
    pub status: Option<ApprovalStatus>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReviewRequest {
    /// `approve` or `reject`
    pub decision: String,
    pub reason: Option<String>,
}

fn optional_url(rid: &str, field: &str, value: Option<String>) -> Result<Option<String>, ApiError> {
    match value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(
            parse_url_or_validation_error(rid, field, &v)?.to_string(),
        )),
        None => Ok(None),
    }
}

impl CreateSubmissionRequest {
    fn into_new_submission(self, rid: &str) -> Result<NewSubmission, ApiError> {
        let title = require_text("title", &self.title)
            .map_err(|e| map_core_error(rid, &e))?
            .to_owned();
        let video_url = optional_url(rid, "video_url", self.video_url)?;
        let video_file_url = optional_url(rid, "video_file_url", self.video_file_url)?;
        if video_url.is_none() && video_file_url.is_none() {
            return Err(ApiError::validation(
                rid,
                "either 'video_url' or 'video_file_url' is required",
            ));
        }

        Ok(NewSubmission {
            task_assignment_id: self.task_assignment_id,
            title,
            description: self.description.trim().to_owned(),
            video_url,
            video_file_url,
            thumbnail_url: optional_url(rid, "thumbnail_url", self.thumbnail_url)?,
        })
    }
}

/// Only approved influencers may submit.
pub(super) async fn create_submission(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubmissionRow>>), ApiError> {
    let rid = &req_id.0;
    let influencer = current_influencer(&state, rid, &session).await?;
    let status = influencer
        .status()
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if status != ApprovalStatus::Approved {
        return Err(ApiError::new(
            rid,
            "forbidden",
            format!("influencer account is {status}; only approved influencers may submit videos"),
        ));
    }

    let submission = body.into_new_submission(rid)?;
    let row = creatorhub_db::create_submission(&state.pool, influencer.id, &submission)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        submission_id = row.id,
        influencer_id = influencer.id,
        assignment_id = ?row.task_assignment_id,
        "video submitted"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

pub(super) async fn list_submissions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<Vec<SubmissionWithInfluencer>>>, ApiError> {
    require_admin(&req_id.0, &session)?;

    let rows = creatorhub_db::list_submissions(&state.pool, query.status)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn my_submissions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<Vec<SubmissionRow>>>, ApiError> {
    let rid = &req_id.0;
    let influencer = current_influencer(&state, rid, &session).await?;

    let rows = creatorhub_db::list_submissions_for_influencer(&state.pool, influencer.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn review_submission(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<SubmissionRow>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    let decision = ReviewDecision::from_parts(body.decision.trim(), body.reason.as_deref())
        .map_err(|e| map_core_error(rid, &e))?;

    let row = creatorhub_db::review_submission(
        &state.pool,
        id,
        &decision,
        session.user_id,
        state.config.rejection_policy,
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        submission_id = id,
        decision = %decision.approval_status(),
        reviewer = %session.user_id,
        "submission reviewed"
    );
    Ok(Json(ApiResponse::new(row, req_id.0)))
}
