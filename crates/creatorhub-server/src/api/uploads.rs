//! Raw file uploads into bucketed directories under `upload_dir`.
//!
//! The request body is the file itself; `?filename=` supplies the original
//! name. Stored files are served back from `/files/{bucket}/{name}`.

use std::path::PathBuf;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use creatorhub_core::Session;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

/// Buckets behind the session route. `documents` has its own public route.
const SESSION_BUCKETS: &[&str] = &["videos", "thumbnails", "guidebook"];
const DOCUMENTS: &str = "documents";
const MAX_NAME_LEN: usize = 80;

#[derive(Debug, Deserialize)]
pub(super) struct UploadQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct StoredFile {
    bucket: String,
    name: String,
    url: String,
    size: usize,
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, never starting
/// with a dot.
fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn stored_name(raw: Option<&str>) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_filename(raw.unwrap_or_default()))
}

fn public_url(base: &str, bucket: &str, name: &str) -> String {
    format!("{}/files/{bucket}/{name}", base.trim_end_matches('/'))
}

async fn store(
    state: &AppState,
    rid: &str,
    bucket: &str,
    filename: Option<&str>,
    body: Body,
    limit: usize,
) -> Result<StoredFile, ApiError> {
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|_| {
        ApiError::validation(rid, format!("upload exceeds the {limit} byte limit for '{bucket}'"))
    })?;
    if bytes.is_empty() {
        return Err(ApiError::validation(rid, "upload body is empty"));
    }

    let dir: PathBuf = state.config.upload_dir.join(bucket);
    let name = stored_name(filename);

    let write = async {
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), &bytes).await
    };
    if let Err(e) = write.await {
        tracing::error!(error = %e, bucket, "failed to store upload");
        return Err(ApiError::new(rid, "internal_error", "failed to store upload"));
    }

    tracing::info!(bucket, name = %name, size = bytes.len(), "file uploaded");
    Ok(StoredFile {
        bucket: bucket.to_string(),
        url: public_url(&state.config.public_base_url, bucket, &name),
        name,
        size: bytes.len(),
    })
}

/// Public route so applicants can attach an ID proof before registering.
pub(super) async fn upload_id_proof(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<UploadQuery>,
    body: Body,
) -> Result<(StatusCode, Json<ApiResponse<StoredFile>>), ApiError> {
    let limit = state.config.upload_limits.max_id_proof_bytes;
    let stored = store(
        &state,
        &req_id.0,
        DOCUMENTS,
        query.filename.as_deref(),
        body,
        limit,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(stored, req_id.0))))
}

pub(super) async fn upload(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(bucket): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Body,
) -> Result<(StatusCode, Json<ApiResponse<StoredFile>>), ApiError> {
    let rid = &req_id.0;
    if !SESSION_BUCKETS.contains(&bucket.as_str()) {
        return Err(ApiError::validation(
            rid,
            format!("unknown upload bucket '{bucket}'"),
        ));
    }
    if bucket == "guidebook" {
        super::require_admin(rid, &session)?;
    }

    let limit = state.config.upload_limits.max_upload_bytes;
    let stored = store(&state, rid, &bucket, query.filename.as_deref(), body, limit).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(stored, req_id.0))))
}
