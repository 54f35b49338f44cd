mod guidebook;
mod influencers;
mod payments;
mod projects;
mod reports;
mod revenue;
mod submissions;
mod tasks;
mod uploads;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use creatorhub_core::{AppConfig, BillingMonth, CoreError, Session};
use creatorhub_db::{DbError, InfluencerRow};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, require_session, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub(super) fn validation(request_id: &str, message: impl Into<String>) -> Self {
        Self::new(request_id, "validation_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_core_error(request_id: &str, error: &CoreError) -> ApiError {
    let code = match error {
        CoreError::InvalidValue { .. } | CoreError::Validation(_) => "validation_error",
        CoreError::Forbidden(_) => "forbidden",
        CoreError::InvalidTransition { .. } => "conflict",
    };
    ApiError::new(request_id, code, error.to_string())
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        DbError::InvalidTransition { .. } => {
            tracing::info!(error = %error, "rejected state transition");
            ApiError::new(request_id, "conflict", error.to_string())
        }
        DbError::InvalidValue(core) => map_core_error(&request_id, core),
        e if e.is_unique_violation() => {
            ApiError::new(request_id, "conflict", "a record with that key already exists")
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn require_admin(request_id: &str, session: &Session) -> Result<(), ApiError> {
    session
        .require_admin()
        .map_err(|e| map_core_error(request_id, &e))
}

/// The influencer profile owned by the calling session.
pub(super) async fn current_influencer(
    state: &AppState,
    request_id: &str,
    session: &Session,
) -> Result<InfluencerRow, ApiError> {
    session
        .require_influencer()
        .map_err(|e| map_core_error(request_id, &e))?;
    creatorhub_db::get_influencer_by_user(&state.pool, session.user_id)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?
        .ok_or_else(|| ApiError::new(request_id, "not_found", "no influencer profile for this user"))
}

/// Parse an optional `YYYY-MM` query value.
pub(super) fn parse_month(
    request_id: &str,
    value: Option<&str>,
) -> Result<Option<BillingMonth>, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.parse::<BillingMonth>())
        .transpose()
        .map_err(|e| map_core_error(request_id, &e))
}

/// Parse a URL and convert parse failures into a standardized validation error.
pub(super) fn parse_url_or_validation_error(
    request_id: &str,
    field: &str,
    value: &str,
) -> Result<reqwest::Url, ApiError> {
    reqwest::Url::parse(value).map_err(|_| {
        ApiError::validation(request_id, format!("'{field}' must be a valid URL, got '{value}'"))
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn public_router(rate_limit: RateLimitState) -> Router<AppState> {
    let limited = Router::new()
        .route("/api/v1/register", post(influencers::register))
        .route(
            "/api/v1/uploads/documents",
            post(uploads::upload_id_proof),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .merge(limited)
}

fn protected_router(state: AppState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/me", get(influencers::me))
        .route("/api/v1/influencers", get(influencers::list_influencers))
        .route("/api/v1/influencers/{id}", get(influencers::get_influencer))
        .route(
            "/api/v1/influencers/{id}/approve",
            post(influencers::approve_influencer),
        )
        .route(
            "/api/v1/influencers/{id}/reject",
            post(influencers::reject_influencer),
        )
        .route(
            "/api/v1/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/v1/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::deactivate_project),
        )
        .route(
            "/api/v1/tasks",
            get(tasks::list_tasks).post(tasks::create_task),
        )
        .route(
            "/api/v1/assignments",
            get(tasks::list_assignments).post(tasks::assign_task),
        )
        .route("/api/v1/assignments/mine", get(tasks::my_assignments))
        .route(
            "/api/v1/assignments/{id}/start",
            post(tasks::start_assignment),
        )
        .route(
            "/api/v1/submissions",
            get(submissions::list_submissions).post(submissions::create_submission),
        )
        .route("/api/v1/submissions/mine", get(submissions::my_submissions))
        .route(
            "/api/v1/submissions/{id}/review",
            post(submissions::review_submission),
        )
        .route(
            "/api/v1/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/api/v1/payments/mine", get(payments::my_payments))
        .route(
            "/api/v1/payments/{id}/mark-paid",
            post(payments::mark_paid),
        )
        .route(
            "/api/v1/payments/{id}/status",
            axum::routing::patch(payments::update_status),
        )
        .route(
            "/api/v1/revenue-shares",
            get(revenue::list_revenue_shares),
        )
        .route(
            "/api/v1/revenue-shares/compute",
            post(revenue::compute_revenue_shares),
        )
        .route("/api/v1/revenue-shares/mine", get(revenue::my_revenue_shares))
        .route(
            "/api/v1/revenue-shares/{id}/pay",
            post(revenue::pay_revenue_share),
        )
        .route("/api/v1/reports/summary", get(reports::summary))
        .route("/api/v1/reports/export/{kind}", get(reports::export))
        .route(
            "/api/v1/guidebook",
            get(guidebook::list_resources).post(guidebook::create_resource),
        )
        .route(
            "/api/v1/guidebook/{id}",
            axum::routing::delete(guidebook::deactivate_resource),
        )
        .route("/api/v1/uploads/{bucket}", post(uploads::upload))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(state, require_session)),
        )
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let files = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .merge(public_router(rate_limit.clone()))
        .merge(protected_router(state.clone(), rate_limit))
        .nest_service("/files", files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match creatorhub_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
