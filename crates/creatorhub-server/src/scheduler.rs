//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! monthly revenue-share run.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use creatorhub_core::{AppConfig, BillingMonth};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_revenue_job(&scheduler, pool, &config.revenue_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Compute last month's revenue shares on `cron` (default: 03:00 UTC on the
/// 1st). The scheduler supplies no lead figures, so any figures an admin
/// already recorded for the month are kept.
async fn register_revenue_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            let month = BillingMonth::of(Utc::now()).previous();
            tracing::info!(month = %month, "scheduler: starting monthly revenue run");
            run_revenue_job(&pool, month).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: monthly revenue job registered");
    Ok(())
}

async fn run_revenue_job(pool: &PgPool, month: BillingMonth) {
    match creatorhub_db::compute_monthly_revenue(pool, month, &HashMap::new(), None).await {
        Ok(summary) => {
            tracing::info!(
                month = %month,
                computed = summary.computed.len(),
                skipped_paid = summary.skipped_paid.len(),
                skipped_linked = summary.skipped_linked.len(),
                "scheduler: monthly revenue run complete"
            );
        }
        Err(e) => {
            tracing::error!(month = %month, error = %e, "scheduler: monthly revenue run failed");
        }
    }
}
