//! Marketing project handlers. Admins manage projects; other roles read the
//! active ones.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use creatorhub_core::validation::{clean_list, require_text, validate_project_objectives};
use creatorhub_core::Session;
use creatorhub_db::{NewProject, ProjectRow};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_core_error, map_db_error, require_admin, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ProjectRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub guidelines: String,
    pub sample_script: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(super) struct ProjectListQuery {
    pub active_only: Option<bool>,
}

impl ProjectRequest {
    fn into_new_project(self, rid: &str) -> Result<NewProject, ApiError> {
        let title = require_text("title", &self.title)
            .map_err(|e| map_core_error(rid, &e))?
            .to_owned();
        let objectives = clean_list(&self.objectives);
        validate_project_objectives(&objectives, self.is_active)
            .map_err(|e| map_core_error(rid, &e))?;

        Ok(NewProject {
            title,
            description: self.description.trim().to_owned(),
            objectives,
            target_audience: self.target_audience.trim().to_owned(),
            deliverables: clean_list(&self.deliverables),
            guidelines: self.guidelines.trim().to_owned(),
            sample_script: self
                .sample_script
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            is_active: self.is_active,
        })
    }
}

pub(super) async fn list_projects(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<ApiResponse<Vec<ProjectRow>>>, ApiError> {
    let active_only = !session.is_admin() || query.active_only.unwrap_or(false);

    let rows = creatorhub_db::list_projects(&state.pool, active_only)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn get_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProjectRow>>, ApiError> {
    let row = creatorhub_db::get_project(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if !row.is_active && !session.is_admin() {
        return Err(ApiError::new(&req_id.0, "not_found", "record not found"));
    }

    Ok(Json(ApiResponse::new(row, req_id.0)))
}

pub(super) async fn create_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Json(body): Json<ProjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProjectRow>>), ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    let project = body.into_new_project(rid)?;

    let row = creatorhub_db::create_project(&state.pool, &project, session.user_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(project_id = row.id, "project created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

/// PUT replaces every editable field.
pub(super) async fn update_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(body): Json<ProjectRequest>,
) -> Result<Json<ApiResponse<ProjectRow>>, ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;
    let project = body.into_new_project(rid)?;

    let row = creatorhub_db::update_project(&state.pool, id, &project)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(row, req_id.0)))
}

pub(super) async fn deactivate_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProjectRow>>, ApiError> {
    require_admin(&req_id.0, &session)?;

    let row = creatorhub_db::set_project_active(&state.pool, id, false)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(row, req_id.0)))
}
