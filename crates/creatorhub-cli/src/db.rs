//! `db` subcommands: migrations, seeding and teardown.

use sqlx::PgPool;

pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = creatorhub_db::run_migrations(pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Upsert the built-in administrator. Safe to run repeatedly.
pub(crate) async fn run_seed(pool: &PgPool) -> anyhow::Result<()> {
    let admin = creatorhub_db::seed_admin(pool).await?;
    tracing::info!(user_id = %admin.id, email = %admin.email, "administrator seeded");
    println!("seeded administrator {} ({})", admin.email, admin.id);
    println!("run `creatorhub-cli users issue-token --email {}` to get a token", admin.email);
    Ok(())
}

/// Drop every table one statement at a time, then migrate from scratch.
///
/// A failed step is logged and skipped; the remaining steps still run.
pub(crate) async fn run_reset(pool: &PgPool, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        anyhow::bail!("db reset drops every table; re-run with --yes to confirm");
    }

    let mut failed = 0_usize;
    for statement in creatorhub_db::DROP_STATEMENTS {
        match creatorhub_db::drop_step(pool, statement).await {
            Ok(()) => tracing::info!(statement, "reset step ok"),
            Err(e) => {
                failed += 1;
                tracing::warn!(statement, error = %e, "reset step failed; continuing");
            }
        }
    }

    let applied = creatorhub_db::run_migrations(pool).await?;
    tracing::info!(failed_steps = failed, applied, "database reset complete");
    println!(
        "reset complete: {} step(s), {failed} failed, {applied} migration(s) re-applied",
        creatorhub_db::DROP_STATEMENTS.len()
    );
    Ok(())
}

pub(crate) async fn run_ping(pool: &PgPool) -> anyhow::Result<()> {
    creatorhub_db::ping(pool).await?;
    println!("database ok");
    Ok(())
}
