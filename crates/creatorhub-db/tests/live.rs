//! Live integration tests for creatorhub-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/creatorhub-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::collections::HashMap;

use creatorhub_core::models::SocialHandles;
use creatorhub_core::{
    AccessLevel, AccountConfig, ApprovalStatus, BillingMonth, FileType, IdProofType,
    InfluencerProfile, PaymentStatus, PaymentType, RejectionPolicy, ResourceCategory,
    ReviewDecision, TaskStatus, UserRole,
};
use creatorhub_db::{
    assign_task, compute_monthly_revenue, create_payment, create_project, create_resource,
    create_submission, create_task, decide_influencer, find_user_by_token_hash, get_assignment,
    get_influencer_by_user, get_revenue_share, hash_api_token, influencer_stats,
    list_visible_resources, load_snapshot, mark_payment_paid, pay_revenue_share,
    provision_account, register_influencer, review_submission, seed_admin, start_assignment,
    update_payment_status, DbError, InfluencerRow, LeadFigures, NewGuidebookResource, NewPayment,
    NewProject, NewSubmission, NewTask, ProvisionOutcome, SEED_ADMIN_ID,
};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn profile(email: &str, follower_count: i32) -> InfluencerProfile {
    InfluencerProfile {
        full_name: "Asha Rao".to_string(),
        phone_number: "+91-9000000000".to_string(),
        email: email.to_string(),
        district: "Bangalore Urban".to_string(),
        state: "Karnataka".to_string(),
        social_media_handles: SocialHandles {
            instagram: Some("asha.rao".to_string()),
            youtube: None,
            facebook: None,
        },
        follower_count,
        id_proof_url: "http://localhost:3000/files/documents/id.pdf".to_string(),
        id_proof_type: IdProofType::Aadhaar,
        upi_id: "asha@upi".to_string(),
    }
}

async fn approved_influencer(pool: &sqlx::PgPool, email: &str, followers: i32) -> InfluencerRow {
    seed_admin(pool).await.expect("seed_admin failed");
    let registered = register_influencer(pool, &profile(email, followers), &format!("hash-{email}"))
        .await
        .expect("register_influencer failed");
    decide_influencer(pool, registered.id, ApprovalStatus::Approved, SEED_ADMIN_ID)
        .await
        .expect("approve failed")
}

async fn july_task(pool: &sqlx::PgPool) -> i64 {
    create_task(
        pool,
        &NewTask {
            project_id: None,
            title: "Monsoon campaign".to_string(),
            description: "Show the product in the rain".to_string(),
            topic: "Monsoon".to_string(),
            guidelines: "60 seconds, vertical".to_string(),
            deliverables_required: vec!["reel".to_string()],
            cycle: BillingMonth::new(2025, 7).unwrap(),
            is_default: false,
        },
        SEED_ADMIN_ID,
    )
    .await
    .expect("create_task failed")
    .id
}

fn video(assignment_id: Option<i64>, title: &str) -> NewSubmission {
    NewSubmission {
        task_assignment_id: assignment_id,
        title: title.to_string(),
        description: "Walkthrough".to_string(),
        video_url: Some("https://youtube.com/watch?v=abc".to_string()),
        ..NewSubmission::default()
    }
}

async fn backdate_to_july_2025(pool: &sqlx::PgPool, submission_id: i64) {
    sqlx::query("UPDATE video_submissions SET submitted_at = '2025-07-15T10:00:00Z' WHERE id = $1")
        .bind(submission_id)
        .execute(pool)
        .await
        .expect("backdate failed");
}

// ---------------------------------------------------------------------------
// Section 1: Registration and approval
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn registration_creates_pending_influencer_with_token(pool: sqlx::PgPool) {
    let hash = hash_api_token("salt", "chub_token");
    let row = register_influencer(&pool, &profile("Asha@Example.com", 1200), &hash)
        .await
        .expect("register_influencer failed");

    assert_eq!(row.approval_status, "pending");
    assert_eq!(row.email, "asha@example.com");
    assert!(row.approved_at.is_none());

    let user = find_user_by_token_hash(&pool, &hash)
        .await
        .unwrap()
        .expect("token should resolve");
    assert_eq!(user.session().unwrap().role, UserRole::Influencer);
    let linked = get_influencer_by_user(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(linked.id, row.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_registration_is_a_unique_violation(pool: sqlx::PgPool) {
    register_influencer(&pool, &profile("dup@example.com", 10), "h1")
        .await
        .unwrap();
    let err = register_influencer(&pool, &profile("dup@example.com", 10), "h2")
        .await
        .expect_err("second registration should fail");
    assert!(err.is_unique_violation());
}

#[sqlx::test(migrations = "../../migrations")]
async fn approval_is_final(pool: sqlx::PgPool) {
    let approved = approved_influencer(&pool, "final@example.com", 100).await;
    assert_eq!(approved.approval_status, "approved");
    assert_eq!(approved.approved_by, Some(SEED_ADMIN_ID));
    assert!(approved.approved_at.is_some());

    let err = decide_influencer(&pool, approved.id, ApprovalStatus::Rejected, SEED_ADMIN_ID)
        .await
        .expect_err("deciding twice should fail");
    assert!(matches!(
        err,
        DbError::InvalidTransition {
            entity: "influencer",
            expected: "pending",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn deciding_unknown_influencer_is_not_found(pool: sqlx::PgPool) {
    seed_admin(&pool).await.unwrap();
    let err = decide_influencer(&pool, 9_999, ApprovalStatus::Approved, SEED_ADMIN_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

// ---------------------------------------------------------------------------
// Section 2: Assignments and review
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn pending_influencer_cannot_be_assigned(pool: sqlx::PgPool) {
    seed_admin(&pool).await.unwrap();
    let pending = register_influencer(&pool, &profile("wait@example.com", 10), "h")
        .await
        .unwrap();
    let task_id = july_task(&pool).await;

    let err = assign_task(
        &pool,
        task_id,
        pending.id,
        BillingMonth::new(2025, 7).unwrap(),
        SEED_ADMIN_ID,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DbError::InvalidTransition { expected: "approved", .. }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn assigning_twice_is_a_unique_violation(pool: sqlx::PgPool) {
    let influencer = approved_influencer(&pool, "twice@example.com", 10).await;
    let task_id = july_task(&pool).await;
    let cycle = BillingMonth::new(2025, 7).unwrap();

    assign_task(&pool, task_id, influencer.id, cycle, SEED_ADMIN_ID)
        .await
        .unwrap();
    let err = assign_task(&pool, task_id, influencer.id, cycle, SEED_ADMIN_ID)
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}

#[sqlx::test(migrations = "../../migrations")]
async fn approve_review_completes_assignment(pool: sqlx::PgPool) {
    let influencer = approved_influencer(&pool, "flow@example.com", 30_000).await;
    let task_id = july_task(&pool).await;
    let assignment = assign_task(
        &pool,
        task_id,
        influencer.id,
        BillingMonth::new(2025, 7).unwrap(),
        SEED_ADMIN_ID,
    )
    .await
    .unwrap();
    assert_eq!(assignment.status, "assigned");

    let started = start_assignment(&pool, assignment.id, influencer.id)
        .await
        .unwrap();
    assert_eq!(started.task_status().unwrap(), TaskStatus::InProgress);

    let submission = create_submission(&pool, influencer.id, &video(Some(assignment.id), "Reel 1"))
        .await
        .unwrap();
    let submitted = get_assignment(&pool, assignment.id).await.unwrap();
    assert_eq!(submitted.status, "submitted");
    assert_eq!(submitted.submission_id, Some(submission.id));

    let reviewed = review_submission(
        &pool,
        submission.id,
        &ReviewDecision::Approve,
        SEED_ADMIN_ID,
        RejectionPolicy::Terminal,
    )
    .await
    .unwrap();
    assert_eq!(reviewed.approval_status, "approved");
    assert!(reviewed.reviewed_at.is_some());

    let completed = get_assignment(&pool, assignment.id).await.unwrap();
    assert_eq!(completed.status, "completed");
    assert!(completed.completed_at.is_some());

    let err = review_submission(
        &pool,
        submission.id,
        &ReviewDecision::Approve,
        SEED_ADMIN_ID,
        RejectionPolicy::Terminal,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DbError::InvalidTransition { expected: "pending", .. }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn rejection_follows_policy(pool: sqlx::PgPool) {
    let influencer = approved_influencer(&pool, "policy@example.com", 500).await;
    let task_id = july_task(&pool).await;
    let assignment = assign_task(
        &pool,
        task_id,
        influencer.id,
        BillingMonth::new(2025, 7).unwrap(),
        SEED_ADMIN_ID,
    )
    .await
    .unwrap();
    let reject = ReviewDecision::Reject {
        reason: "Logo not visible".to_string(),
    };

    let first = create_submission(&pool, influencer.id, &video(Some(assignment.id), "Take 1"))
        .await
        .unwrap();
    review_submission(&pool, first.id, &reject, SEED_ADMIN_ID, RejectionPolicy::Resubmit)
        .await
        .unwrap();
    let reopened = get_assignment(&pool, assignment.id).await.unwrap();
    assert_eq!(reopened.status, "in_progress");
    assert!(reopened.submission_id.is_none());

    let second = create_submission(&pool, influencer.id, &video(Some(assignment.id), "Take 2"))
        .await
        .unwrap();
    let rejected = review_submission(&pool, second.id, &reject, SEED_ADMIN_ID, RejectionPolicy::Terminal)
        .await
        .unwrap();
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Logo not visible"));
    assert_eq!(get_assignment(&pool, assignment.id).await.unwrap().status, "rejected");
}

#[sqlx::test(migrations = "../../migrations")]
async fn submission_against_foreign_assignment_is_refused(pool: sqlx::PgPool) {
    let owner = approved_influencer(&pool, "owner@example.com", 10).await;
    let other = register_influencer(&pool, &profile("other@example.com", 10), "h-other")
        .await
        .unwrap();
    decide_influencer(&pool, other.id, ApprovalStatus::Approved, SEED_ADMIN_ID)
        .await
        .unwrap();
    let task_id = july_task(&pool).await;
    let assignment = assign_task(
        &pool,
        task_id,
        owner.id,
        BillingMonth::new(2025, 7).unwrap(),
        SEED_ADMIN_ID,
    )
    .await
    .unwrap();

    let err = create_submission(&pool, other.id, &video(Some(assignment.id), "Stolen"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidTransition { .. }));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_submissions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "the insert must roll back with the failed link");
}

// ---------------------------------------------------------------------------
// Section 3: Revenue shares and payments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn monthly_revenue_matches_worked_example(pool: sqlx::PgPool) {
    let influencer = approved_influencer(&pool, "earner@example.com", 30_000).await;
    for title in ["One", "Two"] {
        let sub = create_submission(&pool, influencer.id, &video(None, title))
            .await
            .unwrap();
        review_submission(
            &pool,
            sub.id,
            &ReviewDecision::Approve,
            SEED_ADMIN_ID,
            RejectionPolicy::Terminal,
        )
        .await
        .unwrap();
        backdate_to_july_2025(&pool, sub.id).await;
    }

    let month = BillingMonth::new(2025, 7).unwrap();
    let leads = HashMap::from([(
        influencer.id,
        LeadFigures {
            leads_generated: 4,
            revenue_from_leads: Decimal::from(10_000),
        },
    )]);
    let summary = compute_monthly_revenue(&pool, month, &leads, Some(SEED_ADMIN_ID))
        .await
        .unwrap();

    assert_eq!(summary.computed.len(), 1);
    let share = &summary.computed[0];
    assert_eq!(share.follower_band, "25k-100k");
    assert_eq!(share.videos_approved, 2);
    assert_eq!(share.fixed_payout, Decimal::from(14_000));
    assert_eq!(share.performance_share_amount, Decimal::from(500));
    assert_eq!(share.total_earning, Decimal::from(14_500));
    assert_eq!(share.payment_status, "calculated");

    let stats = influencer_stats(&pool, influencer.id, month).await.unwrap();
    assert_eq!(stats.approved_this_month, 2);
    assert!(stats.eligible_for_revenue_share);
    assert_eq!(stats.videos.approved, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn paid_share_is_never_recomputed(pool: sqlx::PgPool) {
    let influencer = approved_influencer(&pool, "paid@example.com", 3_000).await;
    let month = BillingMonth::new(2025, 7).unwrap();

    let first = compute_monthly_revenue(&pool, month, &HashMap::new(), None)
        .await
        .unwrap();
    let share = &first.computed[0];
    assert_eq!(share.total_earning, Decimal::ZERO);

    let (linked, payment) = pay_revenue_share(&pool, share.id).await.unwrap();
    assert_eq!(linked.payment_id, Some(payment.id));
    assert_eq!(payment.payment_type, PaymentType::RevenueShare.as_str());
    assert_eq!(payment.notes.as_deref(), Some("Revenue share for 2025-07"));

    let err = pay_revenue_share(&pool, share.id).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidTransition { .. }));

    mark_payment_paid(&pool, payment.id, "UPI123", SEED_ADMIN_ID)
        .await
        .unwrap();
    assert_eq!(
        get_revenue_share(&pool, share.id).await.unwrap().payment_status,
        "paid"
    );

    let rerun = compute_monthly_revenue(&pool, month, &HashMap::new(), None)
        .await
        .unwrap();
    assert!(rerun.computed.is_empty());
    assert_eq!(rerun.skipped_paid, vec![influencer.id]);
}

async fn approve_two_july_videos(pool: &sqlx::PgPool, influencer_id: i64) {
    for title in ["First", "Second"] {
        let sub = create_submission(pool, influencer_id, &video(None, title))
            .await
            .unwrap();
        review_submission(
            pool,
            sub.id,
            &ReviewDecision::Approve,
            SEED_ADMIN_ID,
            RejectionPolicy::Terminal,
        )
        .await
        .unwrap();
        backdate_to_july_2025(pool, sub.id).await;
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn share_linked_to_pending_payment_keeps_its_total(pool: sqlx::PgPool) {
    let influencer = approved_influencer(&pool, "linked@example.com", 30_000).await;
    approve_two_july_videos(&pool, influencer.id).await;
    let month = BillingMonth::new(2025, 7).unwrap();

    let first = compute_monthly_revenue(&pool, month, &HashMap::new(), None)
        .await
        .unwrap();
    let share = &first.computed[0];
    assert_eq!(share.total_earning, Decimal::from(14_000));
    let (_, payment) = pay_revenue_share(&pool, share.id).await.unwrap();

    let leads = HashMap::from([(
        influencer.id,
        LeadFigures {
            leads_generated: 4,
            revenue_from_leads: Decimal::from(10_000),
        },
    )]);
    let rerun = compute_monthly_revenue(&pool, month, &leads, None)
        .await
        .unwrap();
    assert!(rerun.computed.is_empty());
    assert!(rerun.skipped_paid.is_empty());
    assert_eq!(rerun.skipped_linked, vec![influencer.id]);

    let paid = mark_payment_paid(&pool, payment.id, "UPI456", SEED_ADMIN_ID)
        .await
        .unwrap();
    let settled = get_revenue_share(&pool, share.id).await.unwrap();
    assert_eq!(settled.payment_status, "paid");
    assert_eq!(settled.total_earning, paid.amount);
    assert_eq!(settled.total_earning, Decimal::from(14_000));
}

#[sqlx::test(migrations = "../../migrations")]
async fn rerun_without_leads_keeps_stored_figures(pool: sqlx::PgPool) {
    let influencer = approved_influencer(&pool, "leads@example.com", 30_000).await;
    approve_two_july_videos(&pool, influencer.id).await;
    let month = BillingMonth::new(2025, 7).unwrap();

    let leads = HashMap::from([(
        influencer.id,
        LeadFigures {
            leads_generated: 4,
            revenue_from_leads: Decimal::from(10_000),
        },
    )]);
    let first = compute_monthly_revenue(&pool, month, &leads, Some(SEED_ADMIN_ID))
        .await
        .unwrap();
    assert_eq!(first.computed[0].total_earning, Decimal::from(14_500));

    let rerun = compute_monthly_revenue(&pool, month, &HashMap::new(), None)
        .await
        .unwrap();
    assert_eq!(rerun.computed.len(), 1);
    let share = &rerun.computed[0];
    assert_eq!(share.leads_generated, 4);
    assert_eq!(share.revenue_from_leads, Decimal::from(10_000));
    assert_eq!(share.performance_share_amount, Decimal::from(500));
    assert_eq!(share.total_earning, Decimal::from(14_500));
}

#[sqlx::test(migrations = "../../migrations")]
async fn payment_status_moves_and_paid_is_final(pool: sqlx::PgPool) {
    let influencer = approved_influencer(&pool, "pay@example.com", 10).await;
    let payment = create_payment(
        &pool,
        &NewPayment {
            influencer_id: influencer.id,
            video_submission_id: None,
            task_assignment_id: None,
            amount: Decimal::from(2_000),
            payment_type: PaymentType::Fixed,
            payment_status: PaymentStatus::Pending,
            notes: Some("Reel bonus".to_string()),
        },
    )
    .await
    .unwrap();

    let reviewing = update_payment_status(&pool, payment.id, PaymentStatus::UnderReview)
        .await
        .unwrap();
    assert_eq!(reviewing.payment_status, "under_review");

    let paid = mark_payment_paid(&pool, payment.id, "TXN-1", SEED_ADMIN_ID)
        .await
        .unwrap();
    assert_eq!(paid.payment_status, "paid");
    assert_eq!(paid.upi_transaction_id.as_deref(), Some("TXN-1"));
    assert!(paid.paid_at.is_some());

    let err = mark_payment_paid(&pool, payment.id, "TXN-2", SEED_ADMIN_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidTransition { entity: "payment", .. }));

    let snapshot = load_snapshot(&pool).await.unwrap();
    assert_eq!(snapshot.payments.len(), 1);
    assert_eq!(snapshot.influencers.len(), 1);
}

// ---------------------------------------------------------------------------
// Section 4: Seed, provisioning, guidebook
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_admin_is_idempotent(pool: sqlx::PgPool) {
    let first = seed_admin(&pool).await.unwrap();
    let second = seed_admin(&pool).await.unwrap();
    assert_eq!(first.id, SEED_ADMIN_ID);
    assert_eq!(second.id, SEED_ADMIN_ID);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn provisioning_skips_registered_emails(pool: sqlx::PgPool) {
    seed_admin(&pool).await.unwrap();
    let account = AccountConfig {
        email: "cehpoint.demo@gmail.com".to_string(),
        role: UserRole::Influencer,
        profile: Some(profile("cehpoint.demo@gmail.com", 35_000)),
    };

    let created = provision_account(&pool, &account, "demo-hash").await.unwrap();
    let ProvisionOutcome::Created { influencer, .. } = created else {
        panic!("first provisioning should create the account");
    };
    let influencer = influencer.expect("influencer profile should be inserted");
    assert_eq!(influencer.approval_status, "approved");
    assert_eq!(influencer.follower_count, 35_000);

    let again = provision_account(&pool, &account, "other-hash").await.unwrap();
    assert!(matches!(again, ProvisionOutcome::AlreadyRegistered(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn guidebook_listing_respects_access_level(pool: sqlx::PgPool) {
    seed_admin(&pool).await.unwrap();
    for (title, level) in [
        ("Welcome", AccessLevel::All),
        ("Shooting tips", AccessLevel::Influencer),
        ("Payout runbook", AccessLevel::Admin),
    ] {
        create_resource(
            &pool,
            &NewGuidebookResource {
                title: title.to_string(),
                description: None,
                file_url: format!("http://localhost:3000/files/guidebook/{title}.pdf"),
                file_type: FileType::Pdf,
                file_size: Some(1_024),
                category: ResourceCategory::Training,
                access_level: level,
            },
            SEED_ADMIN_ID,
        )
        .await
        .unwrap();
    }

    let influencer_view = list_visible_resources(&pool, UserRole::Influencer, None)
        .await
        .unwrap();
    assert_eq!(influencer_view.len(), 2);
    assert!(influencer_view.iter().all(|r| r.access_level != "admin"));

    let admin_view = list_visible_resources(&pool, UserRole::Admin, None)
        .await
        .unwrap();
    assert_eq!(admin_view.len(), 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn active_project_requires_objectives(pool: sqlx::PgPool) {
    seed_admin(&pool).await.unwrap();
    let err = create_project(
        &pool,
        &NewProject {
            title: "Launch".to_string(),
            is_active: true,
            ..NewProject::default()
        },
        SEED_ADMIN_ID,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DbError::Sqlx(_)));
}
