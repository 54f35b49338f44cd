//! Demo account provisioning and token issuance.

use std::path::Path;

use creatorhub_core::{load_accounts, AppConfig};
use creatorhub_db::ProvisionOutcome;
use sqlx::PgPool;

/// Provision every account in `path`. Emails that already exist are skipped
/// and keep their current token.
pub(crate) async fn run_demo(pool: &PgPool, config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let file = load_accounts(path)?;
    // Influencer profiles name the seeded admin as approver.
    creatorhub_db::seed_admin(pool).await?;

    let mut issued = Vec::new();
    for account in &file.accounts {
        let token = creatorhub_db::generate_api_token();
        let hash = creatorhub_db::hash_api_token(&config.token_salt, &token);

        match creatorhub_db::provision_account(pool, account, &hash).await? {
            ProvisionOutcome::Created { user, influencer } => {
                tracing::info!(
                    email = %user.email,
                    role = %user.role,
                    influencer_id = influencer.as_ref().map(|i| i.id),
                    "demo account created"
                );
                issued.push((user.email, user.role, token));
            }
            ProvisionOutcome::AlreadyRegistered(user) => {
                tracing::info!(email = %user.email, "demo account already registered; skipping");
            }
        }
    }

    if issued.is_empty() {
        println!("no new accounts; use `users issue-token` to rotate an existing token");
        return Ok(());
    }

    println!("{:<36}{:<12}TOKEN", "EMAIL", "ROLE");
    for (email, role, token) in &issued {
        println!("{email:<36}{role:<12}{token}");
    }
    Ok(())
}

/// Replace a user's token and print the new one. The old token stops
/// working immediately.
pub(crate) async fn run_issue_token(
    pool: &PgPool,
    config: &AppConfig,
    email: &str,
) -> anyhow::Result<()> {
    let token = creatorhub_db::generate_api_token();
    let hash = creatorhub_db::hash_api_token(&config.token_salt, &token);

    let user = match creatorhub_db::rotate_api_token(pool, email, &hash).await {
        Ok(user) => user,
        Err(creatorhub_db::DbError::NotFound) => {
            anyhow::bail!("no user with email '{email}'");
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "api token rotated");
    println!("{token}");
    Ok(())
}
