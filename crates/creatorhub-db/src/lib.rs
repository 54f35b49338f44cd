use std::time::Duration;

use creatorhub_core::{AppConfig, CoreError};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/creatorhub-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    /// A guarded `UPDATE ... WHERE status = ...` matched no row.
    #[error("{entity} {id} is not in an allowed state (expected {expected})")]
    InvalidTransition {
        entity: &'static str,
        id: i64,
        expected: &'static str,
    },
    /// A stored value failed to parse back into its domain type.
    #[error("invalid stored value: {0}")]
    InvalidValue(#[from] CoreError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// True for a Postgres unique violation (SQLSTATE 23505).
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::Sqlx(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505")
        )
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations does not exist on a fresh database; count that as zero.
    let applied_before = applied_migration_count(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = applied_migration_count(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn applied_migration_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn not_found_is_not_a_unique_violation() {
        assert!(!DbError::NotFound.is_unique_violation());
    }
}

pub mod assignments;
pub mod guidebook;
pub mod influencers;
pub mod payments;
pub mod projects;
pub mod reporting;
pub mod reset;
pub mod revenue_shares;
pub mod seed;
pub mod submissions;
pub mod tasks;
pub mod users;
pub mod workflow;

pub use assignments::{
    assign_task, get_assignment, list_assignments, list_assignments_for_influencer,
    start_assignment, AssignmentRow, AssignmentWithTask,
};
pub use guidebook::{
    create_resource, deactivate_resource, list_visible_resources, GuidebookResourceRow,
    NewGuidebookResource,
};
pub use influencers::{
    decide_influencer, get_influencer, get_influencer_by_user, list_influencers,
    register_influencer, InfluencerRow,
};
pub use payments::{
    create_payment, get_payment, list_payments, list_payments_for_influencer, mark_payment_paid,
    update_payment_status, NewPayment, PaymentRow, PaymentWithInfluencer,
};
pub use projects::{
    create_project, get_project, list_projects, set_project_active, update_project, NewProject,
    ProjectRow,
};
pub use reporting::{influencer_stats, load_snapshot, InfluencerStats};
pub use reset::{drop_step, DROP_STATEMENTS};
pub use revenue_shares::{
    get_revenue_share, list_revenue_shares, pay_revenue_share, upsert_revenue_share,
    RevenueShareRow,
};
pub use seed::{provision_account, seed_admin, ProvisionOutcome, SEED_ADMIN_EMAIL, SEED_ADMIN_ID};
pub use submissions::{
    create_submission, get_submission, list_submissions, list_submissions_for_influencer,
    NewSubmission, SubmissionRow, SubmissionWithInfluencer,
};
pub use tasks::{create_task, get_task, list_tasks, NewTask, TaskRow};
pub use users::{
    find_user_by_token_hash, generate_api_token, get_user_by_email, hash_api_token,
    rotate_api_token, UserRow,
};
pub use workflow::{compute_monthly_revenue, review_submission, LeadFigures, RevenueRunSummary};
