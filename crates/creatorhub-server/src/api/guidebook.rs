//! Guidebook resources: training material filtered by the caller's role.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use creatorhub_core::validation::require_text;
use creatorhub_core::{AccessLevel, FileType, ResourceCategory, Session};
use creatorhub_db::{GuidebookResourceRow, NewGuidebookResource};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_core_error, map_db_error, parse_url_or_validation_error, require_admin, ApiError,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct CategoryQuery {
    pub category: Option<ResourceCategory>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateResourceRequest {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_type: FileType,
    pub file_size: Option<i64>,
    #[serde(default = "default_category")]
    pub category: ResourceCategory,
    #[serde(default = "default_access")]
    pub access_level: AccessLevel,
}

#[derive(Debug, Serialize)]
pub(super) struct Deactivated {
    id: i64,
    is_active: bool,
}

fn default_category() -> ResourceCategory {
    ResourceCategory::General
}

fn default_access() -> AccessLevel {
    AccessLevel::All
}

pub(super) async fn list_resources(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<ApiResponse<Vec<GuidebookResourceRow>>>, ApiError> {
    let rows = creatorhub_db::list_visible_resources(&state.pool, session.role, query.category)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn create_resource(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GuidebookResourceRow>>), ApiError> {
    let rid = &req_id.0;
    require_admin(rid, &session)?;

    let title = require_text("title", &body.title)
        .map_err(|e| map_core_error(rid, &e))?
        .to_owned();
    let file_url = parse_url_or_validation_error(rid, "file_url", body.file_url.trim())?;
    if body.file_size.is_some_and(|size| size < 0) {
        return Err(ApiError::validation(rid, "'file_size' must not be negative"));
    }

    let resource = NewGuidebookResource {
        title,
        description: body
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty()),
        file_url: file_url.to_string(),
        file_type: body.file_type,
        file_size: body.file_size,
        category: body.category,
        access_level: body.access_level,
    };

    let row = creatorhub_db::create_resource(&state.pool, &resource, session.user_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(resource_id = row.id, category = %resource.category, "guidebook resource added");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}

pub(super) async fn deactivate_resource(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Deactivated>>, ApiError> {
    require_admin(&req_id.0, &session)?;

    creatorhub_db::deactivate_resource(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        Deactivated {
            id,
            is_active: false,
        },
        req_id.0,
    )))
}
