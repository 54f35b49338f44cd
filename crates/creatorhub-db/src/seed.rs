use creatorhub_core::{AccountConfig, ApprovalStatus, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

use crate::influencers::{insert_influencer, InfluencerRow};
use crate::users::{get_user_by_email, insert_user, UserRow};
use crate::DbError;

/// Fixed id of the built-in administrator.
pub const SEED_ADMIN_ID: Uuid = Uuid::from_u128(0x77af_4d7b_a151_43d1_98fe_c6f2_d600_a6d4);
pub const SEED_ADMIN_EMAIL: &str = "admin@cehpoint.com";

/// Upsert the built-in administrator. Its token hash is left untouched so an
/// already-issued token keeps working.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn seed_admin(pool: &PgPool) -> Result<UserRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, email, role) VALUES ($1, $2, 'admin') \
         ON CONFLICT (id) DO UPDATE SET \
             email = EXCLUDED.email, \
             role = 'admin', \
             updated_at = NOW() \
         RETURNING id, email, role, created_at",
    )
    .bind(SEED_ADMIN_ID)
    .bind(SEED_ADMIN_EMAIL)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

#[derive(Debug)]
pub enum ProvisionOutcome {
    Created {
        user: UserRow,
        influencer: Option<InfluencerRow>,
    },
    AlreadyRegistered(UserRow),
}

/// Create one configured account unless its email is already registered.
///
/// Influencer accounts get their profile inserted pre-approved, with the
/// built-in administrator as approver.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written in
/// that case.
pub async fn provision_account(
    pool: &PgPool,
    account: &AccountConfig,
    token_hash: &str,
) -> Result<ProvisionOutcome, DbError> {
    if let Some(existing) = get_user_by_email(pool, &account.email).await? {
        return Ok(ProvisionOutcome::AlreadyRegistered(existing));
    }

    let mut tx = pool.begin().await?;
    let user = insert_user(
        &mut *tx,
        Uuid::new_v4(),
        &account.email,
        account.role,
        Some(token_hash),
    )
    .await?;

    let influencer = match (account.role, &account.profile) {
        (UserRole::Influencer, Some(profile)) => Some(
            insert_influencer(
                &mut *tx,
                user.id,
                profile,
                ApprovalStatus::Approved,
                Some(SEED_ADMIN_ID),
            )
            .await?,
        ),
        _ => None,
    };

    tx.commit().await?;
    Ok(ProvisionOutcome::Created { user, influencer })
}
