//! Follower bands, fixed payouts and the monthly performance share.
//!
//! The monthly revenue share for one influencer is
//!
//! ```text
//! fixed_payout             = base_payout(band) * videos_approved
//! performance_share_amount = revenue_from_leads * 5%   (only when eligible)
//! total_earning            = fixed_payout + performance_share_amount
//! ```
//!
//! where eligibility means at least [`MIN_APPROVED_VIDEOS_FOR_SHARE`] approved
//! submissions were submitted inside the month.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::period::BillingMonth;
use crate::status::{text_enum, ApprovalStatus};
use crate::CoreError;

/// Approved videos required in a month before the performance share applies.
pub const MIN_APPROVED_VIDEOS_FOR_SHARE: u32 = 2;

/// Performance share, in percent of the revenue attributed to an influencer's leads.
pub const PERFORMANCE_SHARE_PERCENT: u32 = 5;

text_enum! {
    /// Payout tier derived from an influencer's follower count.
    FollowerBand {
        UpTo5k => "0-5k",
        From5kTo25k => "5k-25k",
        From25kTo100k => "25k-100k",
        Over100k => "100k+",
    }
}

impl FollowerBand {
    /// Lower bounds are inclusive: 5000 is `5k-25k`, 100000 is `100k+`.
    #[must_use]
    pub fn from_follower_count(count: u64) -> Self {
        match count {
            100_000.. => FollowerBand::Over100k,
            25_000.. => FollowerBand::From25kTo100k,
            5_000.. => FollowerBand::From5kTo25k,
            _ => FollowerBand::UpTo5k,
        }
    }

    /// Fixed payout for one approved video in this band.
    #[must_use]
    pub fn base_payout(self) -> Decimal {
        match self {
            FollowerBand::Over100k => Decimal::from(10_000),
            FollowerBand::From25kTo100k => Decimal::from(7_000),
            FollowerBand::From5kTo25k => Decimal::from(4_000),
            FollowerBand::UpTo5k => Decimal::from(2_000),
        }
    }
}

#[must_use]
pub fn is_eligible_for_share(videos_approved: u32) -> bool {
    videos_approved >= MIN_APPROVED_VIDEOS_FOR_SHARE
}

#[must_use]
pub fn performance_share_percentage() -> Decimal {
    Decimal::from(PERFORMANCE_SHARE_PERCENT)
}

/// Count approved submissions whose `submitted_at` falls inside `month`.
pub fn count_approved_in_month<I>(submissions: I, month: BillingMonth) -> u32
where
    I: IntoIterator<Item = (ApprovalStatus, DateTime<Utc>)>,
{
    let count = submissions
        .into_iter()
        .filter(|(status, submitted_at)| {
            *status == ApprovalStatus::Approved && month.contains(*submitted_at)
        })
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Inputs for one influencer's monthly computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueInput {
    pub follower_count: u64,
    pub videos_approved: u32,
    pub leads_generated: u32,
    pub revenue_from_leads: Decimal,
}

/// Result of [`compute_revenue_share`]; maps onto a `revenue_shares` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueBreakdown {
    pub follower_band: FollowerBand,
    pub videos_approved: u32,
    pub eligible: bool,
    pub fixed_payout: Decimal,
    pub leads_generated: u32,
    pub revenue_from_leads: Decimal,
    pub performance_share_percentage: Decimal,
    pub performance_share_amount: Decimal,
    pub total_earning: Decimal,
}

/// Compute one influencer's revenue share for a month.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] if `revenue_from_leads` is negative.
pub fn compute_revenue_share(input: &RevenueInput) -> Result<RevenueBreakdown, CoreError> {
    if input.revenue_from_leads < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "revenue_from_leads must not be negative, got {}",
            input.revenue_from_leads
        )));
    }

    let follower_band = FollowerBand::from_follower_count(input.follower_count);
    let eligible = is_eligible_for_share(input.videos_approved);
    let fixed_payout = follower_band.base_payout() * Decimal::from(input.videos_approved);
    let percentage = performance_share_percentage();

    let performance_share_amount = if eligible {
        (input.revenue_from_leads * percentage / Decimal::from(100)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    Ok(RevenueBreakdown {
        follower_band,
        videos_approved: input.videos_approved,
        eligible,
        fixed_payout,
        leads_generated: input.leads_generated,
        revenue_from_leads: input.revenue_from_leads,
        performance_share_percentage: percentage,
        performance_share_amount,
        total_earning: fixed_payout + performance_share_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn input(follower_count: u64, videos_approved: u32, revenue: i64) -> RevenueInput {
        RevenueInput {
            follower_count,
            videos_approved,
            leads_generated: 0,
            revenue_from_leads: Decimal::from(revenue),
        }
    }

    #[test]
    fn band_boundaries_land_in_higher_band() {
        assert_eq!(FollowerBand::from_follower_count(0), FollowerBand::UpTo5k);
        assert_eq!(FollowerBand::from_follower_count(4_999), FollowerBand::UpTo5k);
        assert_eq!(FollowerBand::from_follower_count(5_000), FollowerBand::From5kTo25k);
        assert_eq!(FollowerBand::from_follower_count(24_999), FollowerBand::From5kTo25k);
        assert_eq!(FollowerBand::from_follower_count(25_000), FollowerBand::From25kTo100k);
        assert_eq!(FollowerBand::from_follower_count(99_999), FollowerBand::From25kTo100k);
        assert_eq!(FollowerBand::from_follower_count(100_000), FollowerBand::Over100k);
    }

    #[test]
    fn band_labels_match_column_values() {
        assert_eq!(FollowerBand::Over100k.as_str(), "100k+");
        assert_eq!(
            "25k-100k".parse::<FollowerBand>().unwrap(),
            FollowerBand::From25kTo100k
        );
    }

    #[test]
    fn base_payout_table() {
        assert_eq!(FollowerBand::Over100k.base_payout(), Decimal::from(10_000));
        assert_eq!(FollowerBand::From25kTo100k.base_payout(), Decimal::from(7_000));
        assert_eq!(FollowerBand::From5kTo25k.base_payout(), Decimal::from(4_000));
        assert_eq!(FollowerBand::UpTo5k.base_payout(), Decimal::from(2_000));
    }

    #[test]
    fn two_approved_videos_with_leads() {
        let result = compute_revenue_share(&input(30_000, 2, 10_000)).unwrap();
        assert_eq!(result.follower_band, FollowerBand::From25kTo100k);
        assert!(result.eligible);
        assert_eq!(result.fixed_payout, Decimal::from(14_000));
        assert_eq!(result.performance_share_amount, Decimal::from(500));
        assert_eq!(result.total_earning, Decimal::from(14_500));
    }

    #[test]
    fn single_video_is_not_eligible() {
        let result = compute_revenue_share(&input(3_000, 1, 10_000)).unwrap();
        assert!(!result.eligible);
        assert_eq!(result.performance_share_amount, Decimal::ZERO);
        assert_eq!(result.fixed_payout, Decimal::from(2_000));
        assert_eq!(result.total_earning, Decimal::from(2_000));
    }

    #[test]
    fn third_video_keeps_eligibility() {
        assert!(is_eligible_for_share(2));
        assert!(is_eligible_for_share(3));
        assert!(!is_eligible_for_share(1));
        let three = compute_revenue_share(&input(30_000, 3, 10_000)).unwrap();
        assert_eq!(three.performance_share_amount, Decimal::from(500));
        assert_eq!(three.fixed_payout, Decimal::from(21_000));
    }

    #[test]
    fn negative_revenue_is_rejected() {
        let err = compute_revenue_share(&input(30_000, 2, -1)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn share_is_rounded_to_cents() {
        let mut i = input(30_000, 2, 0);
        i.revenue_from_leads = Decimal::new(33_333, 2); // 333.33
        let result = compute_revenue_share(&i).unwrap();
        assert_eq!(result.performance_share_amount, Decimal::new(1_667, 2));
    }

    #[test]
    fn counts_only_approved_inside_month() {
        let july = BillingMonth::new(2025, 7).unwrap();
        let rows = vec![
            (
                ApprovalStatus::Approved,
                Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
            ),
            (
                ApprovalStatus::Approved,
                Utc.with_ymd_and_hms(2025, 7, 31, 23, 59, 59).unwrap(),
            ),
            (
                ApprovalStatus::Pending,
                Utc.with_ymd_and_hms(2025, 7, 15, 0, 0, 0).unwrap(),
            ),
            (
                ApprovalStatus::Approved,
                Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
            ),
        ];
        assert_eq!(count_approved_in_month(rows, july), 2);
    }

    proptest! {
        #[test]
        fn band_is_monotonic(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let rank = |band: FollowerBand| FollowerBand::ALL.iter().position(|&x| x == band);
            prop_assert!(rank(FollowerBand::from_follower_count(lo)) <= rank(FollowerBand::from_follower_count(hi)));
        }

        #[test]
        fn total_is_fixed_plus_share(
            followers in 0u64..500_000,
            videos in 0u32..20,
            revenue_cents in 0i64..100_000_000,
        ) {
            let i = RevenueInput {
                follower_count: followers,
                videos_approved: videos,
                leads_generated: 0,
                revenue_from_leads: Decimal::new(revenue_cents, 2),
            };
            let r = compute_revenue_share(&i).unwrap();
            prop_assert_eq!(r.total_earning, r.fixed_payout + r.performance_share_amount);
            prop_assert_eq!(r.eligible, videos >= MIN_APPROVED_VIDEOS_FOR_SHARE);
            if !r.eligible {
                prop_assert_eq!(r.performance_share_amount, Decimal::ZERO);
            }
        }
    }
}
