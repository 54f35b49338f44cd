//! Offline unit tests for creatorhub-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::Utc;
use creatorhub_core::{
    AppConfig, ApprovalStatus, Environment, PaymentStatus, RejectionPolicy, RevenueShareStatus,
    TaskStatus, UploadLimits,
};
use creatorhub_db::{AssignmentRow, PoolConfig, RevenueShareRow, SubmissionRow};
use rust_decimal::Decimal;
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        token_salt: "salt".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        upload_dir: PathBuf::from("./uploads"),
        public_base_url: "http://localhost:3000".to_string(),
        upload_limits: UploadLimits::default(),
        rejection_policy: RejectionPolicy::Terminal,
        revenue_cron: "0 0 3 1 * *".to_string(),
        accounts_path: PathBuf::from("./config/accounts.yaml"),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn assignment_row_parses_its_status() {
    let row = AssignmentRow {
        id: 1,
        task_id: 2,
        influencer_id: 3,
        assigned_month: 7,
        assigned_year: 2025,
        status: "in_progress".to_string(),
        submission_id: None,
        started_at: Some(Utc::now()),
        submitted_at: None,
        completed_at: None,
        assigned_by: Some(Uuid::new_v4()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.task_status().unwrap(), TaskStatus::InProgress);
}

#[test]
fn assignment_row_with_unknown_status_is_an_invalid_value() {
    let row = AssignmentRow {
        id: 1,
        task_id: 2,
        influencer_id: 3,
        assigned_month: 7,
        assigned_year: 2025,
        status: "archived".to_string(),
        submission_id: None,
        started_at: None,
        submitted_at: None,
        completed_at: None,
        assigned_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let err = row.task_status().unwrap_err();
    assert!(matches!(err, creatorhub_db::DbError::InvalidValue(_)));
}

#[test]
fn submission_record_falls_back_to_uploaded_file() {
    let row = SubmissionRow {
        id: 10,
        influencer_id: 4,
        task_assignment_id: None,
        title: "Unboxing".to_string(),
        description: "First look".to_string(),
        video_url: None,
        video_file_url: Some("http://localhost:3000/files/videos/a.mp4".to_string()),
        thumbnail_url: None,
        approval_status: "rejected".to_string(),
        reviewed_at: Some(Utc::now()),
        reviewed_by: Some(Uuid::new_v4()),
        rejection_reason: Some("audio missing".to_string()),
        submitted_at: Utc::now(),
    };

    let record = row.into_record().unwrap();
    assert_eq!(record.approval_status, ApprovalStatus::Rejected);
    assert_eq!(
        record.video_url.as_deref(),
        Some("http://localhost:3000/files/videos/a.mp4")
    );
}

#[test]
fn revenue_share_row_serializes_money_as_strings() {
    let row = RevenueShareRow {
        id: 1,
        influencer_id: 9,
        month: 7,
        year: 2025,
        follower_band: "25k-100k".to_string(),
        fixed_payout: Decimal::from(14_000),
        leads_generated: 3,
        revenue_from_leads: Decimal::from(10_000),
        performance_share_percentage: Decimal::from(5),
        performance_share_amount: Decimal::new(50_000, 2),
        total_earning: Decimal::new(1_450_000, 2),
        videos_approved: 2,
        payment_status: "calculated".to_string(),
        payment_id: None,
        calculated_at: Some(Utc::now()),
        calculated_by: None,
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.status().unwrap(), RevenueShareStatus::Calculated);
    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json["total_earning"], "14500.00");
    assert_eq!(json["follower_band"], "25k-100k");
}

#[test]
fn payment_status_column_values_match_the_enum() {
    for &status in PaymentStatus::ALL {
        assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
    }
}
