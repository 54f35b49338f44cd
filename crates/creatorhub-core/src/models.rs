//! Typed snapshots of the rows that reporting and the revenue engine read.
//!
//! The db crate converts its raw rows into these so that status columns are
//! parsed exactly once, at the storage boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::{ApprovalStatus, IdProofType, PaymentStatus, PaymentType};

/// Self-service registration form for an influencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluencerProfile {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub district: String,
    pub state: String,
    #[serde(default)]
    pub social_media_handles: SocialHandles,
    pub follower_count: i32,
    #[serde(default)]
    pub id_proof_url: String,
    pub id_proof_type: IdProofType,
    pub upi_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialHandles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluencerRecord {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub district: String,
    pub state: String,
    pub follower_count: i32,
    pub approval_status: ApprovalStatus,
    pub upi_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub id: i64,
    pub influencer_id: i64,
    pub title: String,
    pub approval_status: ApprovalStatus,
    pub submitted_at: DateTime<Utc>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub id: i64,
    pub influencer_id: i64,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub payment_status: PaymentStatus,
    pub upi_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
