//! Monthly tasks and their assignments.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use creatorhub_core::validation::{clean_list, require_text};
use creatorhub_core::{BillingMonth, Session};
use creatorhub_db::{AssignmentRow, AssignmentWithTask, NewTask, TaskRow};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    current_influencer, map_core_error, map_db_error, parse_month, require_admin, ApiError,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct CreateTaskRequest {
    pub project_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub guidelines: String,
    #[serde(default)]
    pub deliverables_required: Vec<String>,
    pub month: u32,
    pub year: i32,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct MonthQuery {
    /// `YYYY-MM`
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AssignRequest {
    pub task_id: i64,
    pub influencer_id: i64,
}

pub(super) async fn create_task(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TaskRow>>), ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;

    let title = require_text("title", &body.title).map_err(|e| map_core_error(rid, &e))?;
    let cycle = BillingMonth::new(body.year, body.month).map_err(|e| map_core_error(rid, &e))?;

    let task = NewTask {
        project_id: body.project_id,
        title: title.to_owned(),
        description: body.description.trim().to_owned(),
        topic: body.topic.trim().to_owned(),
        guidelines: body.guidelines.trim().to_owned(),
        deliverables_required: clean_list(&body.deliverables_required),
        cycle,
        is_default: body.is_default,
    };

    let row = creatorhub_db::create_task(&state.pool, &task, session.user_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(task_id = row.id, cycle = %cycle, "task created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

pub(super) async fn list_tasks(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<ApiResponse<Vec<TaskRow>>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    let cycle = parse_month(rid, query.month.as_deref())?;

    let rows = creatorhub_db::list_tasks(&state.pool, cycle)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

/// Assign a task to an approved influencer for the task's own cycle.
pub(super) async fn assign_task(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Json(body): Json<AssignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AssignmentRow>>), ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;

    let task = creatorhub_db::get_task(&state.pool, body.task_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let cycle = BillingMonth::from_columns(task.year, task.month)
        .map_err(|e| map_core_error(rid, &e))?;

    let row = creatorhub_db::assign_task(
        &state.pool,
        task.id,
        body.influencer_id,
        cycle,
        session.user_id,
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            ApiError::new(rid, "conflict", "this task is already assigned to that influencer")
        } else {
            map_db_error(rid.clone(), &e)
        }
    })?;

    tracing::info!(
        assignment_id = row.id,
        task_id = task.id,
        influencer_id = body.influencer_id,
        "task assigned"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

pub(super) async fn list_assignments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<ApiResponse<Vec<AssignmentWithTask>>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    let cycle = parse_month(rid, query.month.as_deref())?;

    let rows = creatorhub_db::list_assignments(&state.pool, cycle)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn my_assignments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<Vec<AssignmentWithTask>>>, ApiError> {
    let rid = &req_id.0;
    let influencer = current_influencer(&state, rid, &session).await?;

    let rows = creatorhub_db::list_assignments_for_influencer(&state.pool, influencer.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn start_assignment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AssignmentRow>>, ApiError> {
    let rid = &req_id.0;
    let influencer = current_influencer(&state, rid, &session).await?;

    let row = creatorhub_db::start_assignment(&state.pool, id, influencer.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(row, req_id.0)))
}
