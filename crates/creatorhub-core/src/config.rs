use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment, UploadLimits};
use crate::status::RejectionPolicy;
use crate::ConfigError;

const BYTES_PER_MB: usize = 1024 * 1024;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from the variables already in the process.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn invalid(var: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse and validate configuration through `lookup`, so tests can feed a map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = parse_num(var, default)?;
        u32::try_from(raw).map_err(|e| invalid(var, e))
    };

    let parse_mb = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let mb = usize::try_from(parse_num(var, default)?).map_err(|e| invalid(var, e))?;
        if mb == 0 {
            return Err(invalid(var, "must be at least 1"));
        }
        mb.checked_mul(BYTES_PER_MB)
            .ok_or_else(|| invalid(var, "value too large"))
    };

    let database_url = require("DATABASE_URL")?;
    let token_salt = require("CREATORHUB_TOKEN_SALT")?;

    let env = parse_environment(&or_default("CREATORHUB_ENV", "development"))?;

    let bind_addr = or_default("CREATORHUB_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("CREATORHUB_BIND_ADDR", e))?;
    let log_level = or_default("CREATORHUB_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("CREATORHUB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CREATORHUB_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "CREATORHUB_DB_MIN_CONNECTIONS",
            format!("{db_min_connections} exceeds max connections {db_max_connections}"),
        ));
    }
    let db_acquire_timeout_secs = parse_num("CREATORHUB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let upload_dir = PathBuf::from(or_default("CREATORHUB_UPLOAD_DIR", "./uploads"));
    let public_base_url = or_default("CREATORHUB_PUBLIC_BASE_URL", "http://localhost:3000");
    if !(public_base_url.starts_with("http://") || public_base_url.starts_with("https://")) {
        return Err(invalid(
            "CREATORHUB_PUBLIC_BASE_URL",
            "must start with http:// or https://",
        ));
    }
    let public_base_url = public_base_url.trim_end_matches('/').to_string();

    let upload_limits = UploadLimits {
        max_upload_bytes: parse_mb("CREATORHUB_MAX_UPLOAD_MB", "10")?,
        max_id_proof_bytes: parse_mb("CREATORHUB_MAX_ID_PROOF_MB", "5")?,
    };

    let rejection_policy =
        RejectionPolicy::from_str(&or_default("CREATORHUB_REJECTION_POLICY", "terminal"))
            .map_err(|e| invalid("CREATORHUB_REJECTION_POLICY", e))?;

    let revenue_cron = or_default("CREATORHUB_REVENUE_CRON", "0 0 3 1 * *");
    // six fields: sec min hour day month weekday
    if revenue_cron.split_whitespace().count() != 6 {
        return Err(invalid(
            "CREATORHUB_REVENUE_CRON",
            "expected six cron fields (sec min hour day month weekday)",
        ));
    }

    let accounts_path = PathBuf::from(or_default(
        "CREATORHUB_ACCOUNTS_PATH",
        "./config/accounts.yaml",
    ));

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        token_salt,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        upload_dir,
        public_base_url,
        upload_limits,
        rejection_policy,
        revenue_cron,
        accounts_path,
    })
}

/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything but the three known names.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(invalid(
            "CREATORHUB_ENV",
            format!("unknown environment '{other}' (expected development, test or production)"),
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
