//! Database operations for the `users` table and bearer-token storage.
//!
//! Tokens are never stored: only `sha256("{salt}:{token}")` lands in
//! `users.api_token_hash`.

use chrono::{DateTime, Utc};
use creatorhub_core::{Session, UserRole};
use sha2::{Digest, Sha256};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

const TOKEN_PREFIX: &str = "chub_";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the stored role is unknown.
    pub fn session(&self) -> Result<Session, DbError> {
        Ok(Session {
            user_id: self.id,
            email: self.email.clone(),
            role: self.role.parse::<UserRole>()?,
        })
    }
}

/// A fresh opaque bearer token: prefix plus 32 random bytes as hex.
#[must_use]
pub fn generate_api_token() -> String {
    let bytes: [u8; 32] = rand::random();
    let mut token = String::with_capacity(TOKEN_PREFIX.len() + 64);
    token.push_str(TOKEN_PREFIX);
    for b in bytes {
        token.push_str(&format!("{b:02x}"));
    }
    token
}

#[must_use]
pub fn hash_api_token(salt: &str, token: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{salt}:{token}").as_bytes()))
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_user_by_token_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, role, created_at FROM users WHERE api_token_hash = $1",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Case-insensitive lookup by email.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, role, created_at FROM users WHERE lower(email) = lower($1)",
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub(crate) async fn insert_user(
    conn: &mut PgConnection,
    id: Uuid,
    email: &str,
    role: UserRole,
    token_hash: Option<&str>,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, email, role, api_token_hash) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, email, role, created_at",
    )
    .bind(id)
    .bind(email.trim().to_lowercase())
    .bind(role.as_str())
    .bind(token_hash)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

/// Replace the token hash for the user with `email`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such user exists, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn rotate_api_token(
    pool: &PgPool,
    email: &str,
    token_hash: &str,
) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(
        "UPDATE users SET api_token_hash = $2, updated_at = NOW() \
         WHERE lower(email) = lower($1) \
         RETURNING id, email, role, created_at",
    )
    .bind(email.trim())
    .bind(token_hash)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
