use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use creatorhub_core::BillingMonth;
use creatorhub_db::LeadFigures;
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Leads file shape: `{"<influencer id>": {"leads_generated": 3, "revenue_from_leads": "10000"}}`.
fn parse_leads(content: &str) -> anyhow::Result<HashMap<i64, LeadFigures>> {
    serde_json::from_str(content).context("leads file must map influencer ids to lead figures")
}

fn load_leads(path: Option<&Path>) -> anyhow::Result<HashMap<i64, LeadFigures>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read leads file {}", path.display()))?;
    parse_leads(&content)
}

/// Compute shares for `month` (default: previous month) and print one line
/// per influencer.
pub(crate) async fn run_compute(
    pool: &PgPool,
    month: Option<BillingMonth>,
    leads_path: Option<&Path>,
) -> anyhow::Result<()> {
    let month = month.unwrap_or_else(|| BillingMonth::of(Utc::now()).previous());
    let leads = load_leads(leads_path)?;

    let summary = creatorhub_db::compute_monthly_revenue(pool, month, &leads, None).await?;

    if summary.computed.is_empty()
        && summary.skipped_paid.is_empty()
        && summary.skipped_linked.is_empty()
    {
        println!("no approved influencers; nothing computed for {month}");
        return Ok(());
    }

    println!(
        "{:<14}{:<11}{:<8}{:>12}{:>12}{:>12}",
        "INFLUENCER", "BAND", "VIDEOS", "FIXED", "SHARE", "TOTAL"
    );
    for share in &summary.computed {
        println!(
            "{:<14}{:<11}{:<8}{:>12}{:>12}{:>12}",
            share.influencer_id,
            share.follower_band,
            share.videos_approved,
            share.fixed_payout,
            share.performance_share_amount,
            share.total_earning
        );
    }

    let total: Decimal = summary.computed.iter().map(|s| s.total_earning).sum();
    println!("{month}: {} share(s), total {total}", summary.computed.len());
    for id in &summary.skipped_paid {
        tracing::warn!(influencer_id = id, month = %month, "share already paid; left unchanged");
    }
    for id in &summary.skipped_linked {
        tracing::warn!(
            influencer_id = id,
            month = %month,
            "share linked to a pending payment; left unchanged"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_leads_reads_string_keys_and_decimal_strings() {
        let leads =
            parse_leads(r#"{"12": {"leads_generated": 3, "revenue_from_leads": "10000"}}"#)
                .expect("valid leads");
        assert_eq!(
            leads.get(&12),
            Some(&LeadFigures {
                leads_generated: 3,
                revenue_from_leads: Decimal::from(10_000),
            })
        );
    }

    #[test]
    fn parse_leads_rejects_non_numeric_ids() {
        assert!(parse_leads(r#"{"asha": {"leads_generated": 1, "revenue_from_leads": "5"}}"#).is_err());
    }

    #[test]
    fn missing_leads_path_means_no_leads() {
        assert!(load_leads(None).expect("no path").is_empty());
    }
}
