use std::net::SocketAddr;
use std::path::PathBuf;

use crate::status::RejectionPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Size caps for the upload endpoint, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_upload_bytes: usize,
    /// Applies to the `documents` bucket (ID proofs).
    pub max_id_proof_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            max_id_proof_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub token_salt: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub upload_limits: UploadLimits,
    pub rejection_policy: RejectionPolicy,
    pub revenue_cron: String,
    pub accounts_path: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("token_salt", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("upload_dir", &self.upload_dir)
            .field("public_base_url", &self.public_base_url)
            .field("upload_limits", &self.upload_limits)
            .field("rejection_policy", &self.rejection_policy)
            .field("revenue_cron", &self.revenue_cron)
            .field("accounts_path", &self.accounts_path)
            .finish()
    }
}
