//! Dashboard aggregates and CSV exports over an in-memory snapshot.
//!
//! Everything here is a pure function of its inputs; callers load the
//! snapshot from the database and pass it in.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{InfluencerRecord, PaymentRecord, SubmissionRecord};
use crate::period::BillingMonth;
use crate::revenue::{count_approved_in_month, is_eligible_for_share};
use crate::status::{text_enum, ApprovalStatus, PaymentStatus};

/// Rows loaded for one report.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub influencers: Vec<InfluencerRecord>,
    pub submissions: Vec<SubmissionRecord>,
    pub payments: Vec<PaymentRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn tally<I: IntoIterator<Item = ApprovalStatus>>(statuses: I) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.total += 1;
            match status {
                ApprovalStatus::Pending => counts.pending += 1,
                ApprovalStatus::Approved => counts.approved += 1,
                ApprovalStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCount {
    pub state: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictCount {
    pub district: String,
    pub state: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub month: BillingMonth,
    pub influencers: StatusCounts,
    pub videos: StatusCounts,
    pub total_paid: Decimal,
    pub total_pending: Decimal,
    pub influencers_by_state: Vec<StateCount>,
    pub influencers_by_district: Vec<DistrictCount>,
    pub eligible_for_revenue_share: usize,
}

/// Build the admin report for `month`.
///
/// Groupings are sorted by count descending, ties broken by name so the
/// output is deterministic.
#[must_use]
pub fn summarize(snapshot: &Snapshot, month: BillingMonth) -> ReportSummary {
    let influencers = StatusCounts::tally(snapshot.influencers.iter().map(|i| i.approval_status));
    let videos = StatusCounts::tally(snapshot.submissions.iter().map(|s| s.approval_status));

    let total_paid = sum_by_status(&snapshot.payments, PaymentStatus::Paid);
    let total_pending = sum_by_status(&snapshot.payments, PaymentStatus::Pending);

    let mut by_state: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_district: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for inf in &snapshot.influencers {
        *by_state.entry(inf.state.as_str()).or_default() += 1;
        *by_district
            .entry((inf.district.as_str(), inf.state.as_str()))
            .or_default() += 1;
    }

    let mut influencers_by_state: Vec<StateCount> = by_state
        .into_iter()
        .map(|(state, count)| StateCount {
            state: state.to_string(),
            count,
        })
        .collect();
    influencers_by_state.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.state.cmp(&b.state)));

    let mut influencers_by_district: Vec<DistrictCount> = by_district
        .into_iter()
        .map(|((district, state), count)| DistrictCount {
            district: district.to_string(),
            state: state.to_string(),
            count,
        })
        .collect();
    influencers_by_district.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.district.cmp(&b.district))
            .then_with(|| a.state.cmp(&b.state))
    });

    ReportSummary {
        month,
        influencers,
        videos,
        total_paid,
        total_pending,
        influencers_by_state,
        influencers_by_district,
        eligible_for_revenue_share: count_eligible(snapshot, month),
    }
}

fn sum_by_status(payments: &[PaymentRecord], status: PaymentStatus) -> Decimal {
    payments
        .iter()
        .filter(|p| p.payment_status == status)
        .map(|p| p.amount)
        .sum()
}

/// Number of influencers with enough approved videos in `month` for the share.
#[must_use]
pub fn count_eligible(snapshot: &Snapshot, month: BillingMonth) -> usize {
    let mut per_influencer: HashMap<i64, Vec<(ApprovalStatus, DateTime<Utc>)>> = HashMap::new();
    for sub in &snapshot.submissions {
        per_influencer
            .entry(sub.influencer_id)
            .or_default()
            .push((sub.approval_status, sub.submitted_at));
    }

    snapshot
        .influencers
        .iter()
        .filter(|inf| {
            per_influencer.get(&inf.id).is_some_and(|subs| {
                is_eligible_for_share(count_approved_in_month(subs.iter().copied(), month))
            })
        })
        .count()
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

text_enum! {
    ExportKind {
        Influencers => "influencers",
        Payments => "payments",
        Videos => "videos",
    }
}

pub const INFLUENCERS_HEADER: &str =
    "Full Name,Email,Phone,District,State,Follower Count,Status,UPI ID,Created At";
pub const PAYMENTS_HEADER: &str =
    "Influencer Name,Email,Amount,Type,Status,Transaction ID,Created At,Paid At,Notes";
pub const VIDEOS_HEADER: &str = "Title,Influencer,Email,District,Status,Submitted At,Video URL";

/// `{kind}_{YYYY-MM-DD}.csv`
#[must_use]
pub fn export_filename(kind: ExportKind, date: NaiveDate) -> String {
    format!("{kind}_{}.csv", date.format("%Y-%m-%d"))
}

/// Wrap a field in double quotes, doubling any embedded quote.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn opt_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(timestamp).unwrap_or_default()
}

/// Render one export as CSV text: a header line plus one line per row.
#[must_use]
pub fn export_csv(kind: ExportKind, snapshot: &Snapshot) -> String {
    match kind {
        ExportKind::Influencers => export_influencers(&snapshot.influencers),
        ExportKind::Payments => export_payments(&snapshot.payments, &snapshot.influencers),
        ExportKind::Videos => export_videos(&snapshot.submissions, &snapshot.influencers),
    }
}

fn export_influencers(influencers: &[InfluencerRecord]) -> String {
    let mut out = String::from(INFLUENCERS_HEADER);
    out.push('\n');
    for inf in influencers {
        let line = [
            quote(&inf.full_name),
            quote(&inf.email),
            quote(&inf.phone_number),
            quote(&inf.district),
            quote(&inf.state),
            inf.follower_count.to_string(),
            quote(inf.approval_status.as_str()),
            quote(&inf.upi_id),
            quote(&timestamp(inf.created_at)),
        ]
        .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn index_influencers(influencers: &[InfluencerRecord]) -> HashMap<i64, &InfluencerRecord> {
    influencers.iter().map(|i| (i.id, i)).collect()
}

fn export_payments(payments: &[PaymentRecord], influencers: &[InfluencerRecord]) -> String {
    let by_id = index_influencers(influencers);
    let mut out = String::from(PAYMENTS_HEADER);
    out.push('\n');
    for payment in payments {
        let influencer = by_id.get(&payment.influencer_id);
        let line = [
            quote(influencer.map_or("", |i| i.full_name.as_str())),
            quote(influencer.map_or("", |i| i.email.as_str())),
            payment.amount.to_string(),
            quote(payment.payment_type.as_str()),
            quote(payment.payment_status.as_str()),
            quote(payment.upi_transaction_id.as_deref().unwrap_or_default()),
            quote(&timestamp(payment.created_at)),
            quote(&opt_timestamp(payment.paid_at)),
            quote(payment.notes.as_deref().unwrap_or_default()),
        ]
        .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn export_videos(submissions: &[SubmissionRecord], influencers: &[InfluencerRecord]) -> String {
    let by_id = index_influencers(influencers);
    let mut out = String::from(VIDEOS_HEADER);
    out.push('\n');
    for video in submissions {
        let influencer = by_id.get(&video.influencer_id);
        let line = [
            quote(&video.title),
            quote(influencer.map_or("", |i| i.full_name.as_str())),
            quote(influencer.map_or("", |i| i.email.as_str())),
            quote(influencer.map_or("", |i| i.district.as_str())),
            quote(video.approval_status.as_str()),
            quote(&timestamp(video.submitted_at)),
            quote(video.video_url.as_deref().unwrap_or_default()),
        ]
        .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "reporting_test.rs"]
mod tests;
