//! Field mapping and comparison features for campaign analysis.
//!
//! Provides pure functions for:
//! - Mapping vendor campaign records onto the canonical schema
//! - Derived ratios (investment / revenue)
//! - Per-criterion comparisons used in strategy scoring

use strategist_catalog::CANONICAL_COLUMNS;
use strategist_model::{
    CampaignRecord, ImpressionTier, InvestmentRevenueBand, NormalizedCampaign,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Campaign '{name}' has no identifier")]
    MissingIdentity { name: String },
}

/// Map a vendor campaign record onto the canonical comparison schema.
///
/// Fields the record does not carry come out as `None`. The source record is
/// kept untouched on the result for export.
pub fn normalize_campaign(record: &CampaignRecord) -> Result<NormalizedCampaign, MappingError> {
    let campaign_id = record
        .campaign_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| MappingError::MissingIdentity {
            name: record.name.clone(),
        })?
        .to_string();

    let metrics = &record.metrics;
    let investment_revenue_ratio = investment_revenue_ratio(metrics.total_amount, metrics.cost);

    Ok(NormalizedCampaign {
        campaign_id,
        name: record.name.clone(),
        status: record.status.clone(),
        budget: record.budget,
        acos_target: record.acos_target,
        acos: metrics.acos,
        impression_tier: record.impression_tier,
        impressions_won_pct: extra_metric(record, "impressions_won_pct"),
        impressions_lost_budget_pct: extra_metric(record, "impressions_lost_budget_pct"),
        impressions_lost_rank_pct: extra_metric(record, "impressions_lost_rank_pct"),
        clicks: metrics.clicks,
        investment_revenue_ratio,
        investment_revenue_band: investment_revenue_ratio.map(InvestmentRevenueBand::from_ratio),
        units_sold_per_ad: metrics.units_quantity,
        quantity: extra_metric(record, "quantity"),
        impressions: metrics.prints,
        source: record.clone(),
    })
}

/// Render one canonical field of a normalized campaign as a cell value.
///
/// Accepts the names in `CANONICAL_COLUMNS` plus `impressions`; returns
/// `None` for missing data and unknown names.
pub fn canonical_value(campaign: &NormalizedCampaign, column: &str) -> Option<String> {
    let number = |v: Option<f64>| v.map(|v| v.to_string());
    match column {
        "name" => Some(campaign.name.clone()),
        "budget" => number(campaign.budget),
        "acos_target" => number(campaign.acos_target),
        "acos" => number(campaign.acos),
        "impression_tier" => campaign.impression_tier.map(|t| t.as_str().to_string()),
        "impressions_won_pct" => number(campaign.impressions_won_pct),
        "impressions_lost_budget_pct" => number(campaign.impressions_lost_budget_pct),
        "impressions_lost_rank_pct" => number(campaign.impressions_lost_rank_pct),
        "clicks" => number(campaign.clicks),
        "investment_revenue_ratio" => number(campaign.investment_revenue_ratio),
        "units_sold_per_ad" => number(campaign.units_sold_per_ad),
        "quantity" => number(campaign.quantity),
        "impressions" => number(campaign.impressions),
        _ => None,
    }
}

/// Values of every canonical column, in `CANONICAL_COLUMNS` order.
pub fn canonical_row(campaign: &NormalizedCampaign) -> Vec<Option<String>> {
    CANONICAL_COLUMNS
        .iter()
        .map(|column| canonical_value(campaign, column))
        .collect()
}

/// Investment-to-revenue ratio: `total_amount / cost`.
///
/// `None` when either side is missing or cost is zero.
pub fn investment_revenue_ratio(total_amount: Option<f64>, cost: Option<f64>) -> Option<f64> {
    match (total_amount, cost) {
        (Some(amount), Some(cost)) if cost != 0.0 => Some(amount / cost),
        _ => None,
    }
}

/// Absolute ACOS distance; infinite when the campaign ACOS is unknown.
pub fn acos_distance(campaign_acos: Option<f64>, strategy_acos: f64) -> f64 {
    match campaign_acos {
        Some(acos) => (acos - strategy_acos).abs(),
        None => f64::INFINITY,
    }
}

/// Exact tier equality; an unknown campaign tier never matches.
pub fn impression_match(
    campaign_tier: Option<ImpressionTier>,
    strategy_tier: ImpressionTier,
) -> bool {
    campaign_tier == Some(strategy_tier)
}

/// Click thresholds used by [`clicks_match`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClicksRule {
    /// Campaigns below this match a zero-click strategy
    pub near_zero_ceiling: f64,
    /// Maximum absolute difference otherwise (inclusive)
    pub tolerance: f64,
}

impl Default for ClicksRule {
    fn default() -> Self {
        Self {
            near_zero_ceiling: 5.0,
            tolerance: 10.0,
        }
    }
}

/// Compare campaign clicks with a strategy's reference clicks.
pub fn clicks_match(
    campaign_clicks: Option<f64>,
    strategy_clicks: Option<f64>,
    rule: &ClicksRule,
) -> bool {
    match (campaign_clicks, strategy_clicks) {
        (Some(campaign), Some(strategy)) if strategy == 0.0 => campaign < rule.near_zero_ceiling,
        (Some(campaign), Some(strategy)) => (campaign - strategy).abs() <= rule.tolerance,
        _ => false,
    }
}

fn extra_metric(record: &CampaignRecord, key: &str) -> Option<f64> {
    record
        .metrics
        .extra
        .get(key)
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite())
}
