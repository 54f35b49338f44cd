pub mod accounts;
pub mod app_config;
pub mod config;
pub mod models;
pub mod period;
pub mod reporting;
pub mod revenue;
pub mod session;
pub mod status;
pub mod validation;

use thiserror::Error;

pub use accounts::{load_accounts, AccountConfig, AccountsFile};
pub use app_config::{AppConfig, Environment, UploadLimits};
pub use config::{load_app_config, load_app_config_from_env};
pub use models::{InfluencerProfile, InfluencerRecord, PaymentRecord, SubmissionRecord};
pub use period::BillingMonth;
pub use revenue::{compute_revenue_share, FollowerBand, RevenueBreakdown, RevenueInput};
pub use session::Session;
pub use status::{
    AccessLevel, ApprovalStatus, FileType, IdProofType, PaymentStatus, PaymentType,
    RejectionPolicy, ResourceCategory, RevenueShareStatus, ReviewDecision, TaskStatus, UserRole,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read accounts file {path}: {source}")]
    AccountsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse accounts file: {0}")]
    AccountsFileParse(#[from] serde_yaml::Error),

    #[error("accounts validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid {kind}: '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    #[error("{0}")]
    Validation(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{entity} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}
