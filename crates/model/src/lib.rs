//! Core domain model for campaign strategy analysis.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `StrategyProfile`: A named reference configuration from the catalog
//! - `CampaignRecord`: A campaign as delivered by the ads API
//! - `NormalizedCampaign`: A campaign in the canonical comparison schema
//! - `RecommendationResult`: The matched strategy and budget decision
//! - `OrderRecord`: A seller order, used for business metrics only

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Display value used when no strategy could be recommended.
pub const NO_RECOMMENDATION: &str = "No recommended strategy";

/// How much of the available ad inventory a campaign captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpressionTier {
    #[serde(alias = "Baixa Impressão", alias = "LowImpression")]
    Low,
    #[serde(alias = "Media Impressão", alias = "MediumImpression")]
    Medium,
    #[serde(alias = "Impressões elevadas", alias = "HighImpression")]
    High,
}

impl ImpressionTier {
    /// Parse a tier label, accepting the canonical names and the dashboard labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "low" | "Low" | "LowImpression" | "Baixa Impressão" => Some(Self::Low),
            "medium" | "Medium" | "MediumImpression" | "Media Impressão" => Some(Self::Medium),
            "high" | "High" | "HighImpression" | "Impressões elevadas" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ImpressionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Investment-to-revenue band of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentRevenueBand {
    /// Investment / revenue of 10 or below
    #[serde(rename = "≤10", alias = "10 á abaixo")]
    AtMostTen,
    /// Investment / revenue above 10
    #[serde(rename = ">10", alias = "10 acima")]
    AboveTen,
}

impl InvestmentRevenueBand {
    /// Band for a computed investment/revenue ratio.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio <= 10.0 {
            Self::AtMostTen
        } else {
            Self::AboveTen
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtMostTen => "≤10",
            Self::AboveTen => ">10",
        }
    }
}

/// A named reference strategy from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    /// Unique strategy name
    pub name: String,

    /// Reference budget (currency units)
    pub budget: f64,

    /// Target ACOS, kept as stored; not used for matching
    pub acos_target: f64,

    /// ACOS this strategy is designed around
    pub acos: f64,

    pub impression_tier: ImpressionTier,

    pub impressions_won_pct: f64,
    pub impressions_lost_budget_pct: f64,
    pub impressions_lost_rank_pct: f64,

    /// Reference click count (0 = designed for near-zero clicks)
    pub clicks: f64,

    pub investment_revenue_ratio: InvestmentRevenueBand,

    pub units_sold_per_ad: f64,

    pub quantity: f64,
}

/// Campaign status as reported by the ads API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum CampaignStatus {
    Active,
    Paused,
    /// Any other status, kept verbatim
    Other(String),
    #[default]
    Unknown,
}

impl From<&str> for CampaignStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => Self::Active,
            "paused" => Self::Paused,
            "" => Self::Unknown,
            _ => Self::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for CampaignStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Option<String>> for CampaignStatus {
    fn from(s: Option<String>) -> Self {
        s.map(Self::from).unwrap_or_default()
    }
}

impl From<CampaignStatus> for String {
    fn from(status: CampaignStatus) -> Self {
        status.as_str().to_string()
    }
}

impl CampaignStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Other(s) => s,
            Self::Unknown => "",
        }
    }
}

/// Metrics reported for a campaign over the requested date window.
///
/// Every metric is optional: the API omits metrics it has no data for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    #[serde(default, deserialize_with = "finite_or_none")]
    pub clicks: Option<f64>,
    /// Impressions
    #[serde(default, deserialize_with = "finite_or_none")]
    pub prints: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub ctr: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub cost: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub cpc: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub acos: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub organic_units_quantity: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub direct_items_quantity: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub indirect_items_quantity: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub units_quantity: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub direct_amount: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub indirect_amount: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_none")]
    pub total_amount: Option<f64>,

    /// Metrics not modelled above
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A campaign as delivered by the ads API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecord {
    /// Campaign identifier (the API sends it as `id`, number or string)
    #[serde(
        default,
        rename = "id",
        alias = "campaign_id",
        deserialize_with = "id_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub campaign_id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default)]
    pub status: CampaignStatus,

    /// Configured budget
    #[serde(default, deserialize_with = "finite_or_none")]
    pub budget: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(default, deserialize_with = "finite_or_none")]
    pub acos_target: Option<f64>,

    /// Vendor-side bidding strategy label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Impression tier, only when supplied by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impression_tier: Option<ImpressionTier>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: CampaignMetrics,

    /// Fields not modelled above, kept for export
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CampaignRecord {
    /// Create a minimal record for testing.
    pub fn new(campaign_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            campaign_id: Some(campaign_id.into()),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_acos(mut self, acos: f64) -> Self {
        self.metrics.acos = Some(acos);
        self
    }

    pub fn with_clicks(mut self, clicks: f64) -> Self {
        self.metrics.clicks = Some(clicks);
        self
    }

    pub fn with_impression_tier(mut self, tier: ImpressionTier) -> Self {
        self.impression_tier = Some(tier);
        self
    }

    pub fn with_status(mut self, status: CampaignStatus) -> Self {
        self.status = status;
        self
    }
}

/// A campaign mapped onto the canonical comparison schema.
///
/// Every canonical field is present; `None` means the source had no data,
/// which is distinct from a reported zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCampaign {
    pub campaign_id: String,
    pub name: String,
    pub status: CampaignStatus,
    pub budget: Option<f64>,
    pub acos_target: Option<f64>,
    pub acos: Option<f64>,
    pub impression_tier: Option<ImpressionTier>,
    pub impressions_won_pct: Option<f64>,
    pub impressions_lost_budget_pct: Option<f64>,
    pub impressions_lost_rank_pct: Option<f64>,
    pub clicks: Option<f64>,
    /// total_amount / cost
    pub investment_revenue_ratio: Option<f64>,
    pub investment_revenue_band: Option<InvestmentRevenueBand>,
    pub units_sold_per_ad: Option<f64>,
    pub quantity: Option<f64>,
    /// Raw impression count (`prints`)
    pub impressions: Option<f64>,

    /// The record this was mapped from
    pub source: CampaignRecord,
}

/// Budget direction recommended for a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Increase,
    Decrease,
    Maintain,
}

impl Decision {
    /// Sign of the budget delta.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Self::Increase
        } else if delta < 0.0 {
            Self::Decrease
        } else {
            Self::Maintain
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Maintain => "maintain",
        }
    }
}

/// The recommendation derived for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Matched catalog strategy; `None` when nothing could be recommended
    pub recommended_strategy: Option<String>,

    /// strategy budget - campaign budget
    pub budget_delta: Option<f64>,

    pub decision: Option<Decision>,

    /// Dissimilarity score of the matched strategy (lower = closer)
    pub score: Option<f64>,
}

impl RecommendationResult {
    /// Result used when no strategy could be selected.
    pub fn no_recommendation() -> Self {
        Self {
            recommended_strategy: None,
            budget_delta: None,
            decision: None,
            score: None,
        }
    }

    /// Strategy name for display, falling back to the sentinel.
    pub fn strategy_label(&self) -> &str {
        self.recommended_strategy
            .as_deref()
            .unwrap_or(NO_RECOMMENDATION)
    }
}

/// A seller order, used by the business-metrics roll-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(default, deserialize_with = "id_or_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,

    #[serde(default, deserialize_with = "finite_or_none")]
    pub total_amount: Option<f64>,

    #[serde(default, deserialize_with = "finite_or_none")]
    pub paid_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
}

/// Accept numbers, treating NaN/infinite values as missing.
fn finite_or_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()))
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept identifiers sent either as strings or as numbers.
fn id_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
