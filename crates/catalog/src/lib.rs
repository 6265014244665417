//! The strategy catalog.
//!
//! Strategies are reference profiles loaded from a versioned JSON asset.
//! The built-in asset is embedded at compile time and parsed once per
//! process; alternative assets can be loaded from a path so the catalog
//! can change without touching the matcher.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strategist_model::StrategyProfile;
use thiserror::Error;

/// The embedded default catalog.
const BUILTIN_ASSET: &str = include_str!("../assets/strategies.json");

/// Canonical comparison columns, in catalog definition order.
///
/// Shared by the field mapper and the tabular export.
pub const CANONICAL_COLUMNS: &[&str] = &[
    "name",
    "budget",
    "acos_target",
    "acos",
    "impression_tier",
    "impressions_won_pct",
    "impressions_lost_budget_pct",
    "impressions_lost_rank_pct",
    "clicks",
    "investment_revenue_ratio",
    "units_sold_per_ad",
    "quantity",
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Malformed catalog asset: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Failed to read catalog asset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Strategy at position {0} has an empty name")]
    EmptyName(usize),
    #[error("Duplicate strategy name: {0}")]
    DuplicateName(String),
    #[error("Strategy {name} has a non-finite {field}")]
    NonFinite { name: String, field: &'static str },
}

/// On-disk layout of a catalog asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogAsset {
    version: String,
    strategies: Vec<StrategyProfile>,
}

/// An immutable, ordered set of strategy profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyCatalog {
    version: String,
    strategies: Vec<StrategyProfile>,
}

static BUILTIN: OnceLock<StrategyCatalog> = OnceLock::new();

impl StrategyCatalog {
    /// The process-wide built-in catalog.
    ///
    /// Parsed on first use; every caller shares the same instance.
    pub fn builtin() -> Result<&'static StrategyCatalog, CatalogError> {
        if let Some(catalog) = BUILTIN.get() {
            return Ok(catalog);
        }
        let catalog = Self::from_json(BUILTIN_ASSET)?;
        Ok(BUILTIN.get_or_init(|| catalog))
    }

    /// Parse and validate a catalog asset.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let asset: CatalogAsset = serde_json::from_str(json)?;
        Self::new(asset.version, asset.strategies)
    }

    /// Load a catalog asset from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            version = %catalog.version,
            strategies = catalog.len(),
            "Loaded strategy catalog"
        );
        Ok(catalog)
    }

    /// Build a catalog from profiles, validating them.
    pub fn new(
        version: impl Into<String>,
        strategies: Vec<StrategyProfile>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (i, strategy) in strategies.iter().enumerate() {
            if strategy.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(i));
            }
            if !seen.insert(strategy.name.as_str()) {
                return Err(CatalogError::DuplicateName(strategy.name.clone()));
            }
            check_finite(strategy)?;
        }

        Ok(Self {
            version: version.into(),
            strategies,
        })
    }

    /// All strategies in definition order.
    pub fn all_strategies(&self) -> &[StrategyProfile] {
        &self.strategies
    }

    /// Look up a strategy by exact name.
    pub fn find(&self, name: &str) -> Option<&StrategyProfile> {
        self.strategies.iter().find(|s| s.name == name)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

fn check_finite(strategy: &StrategyProfile) -> Result<(), CatalogError> {
    let fields = [
        ("budget", strategy.budget),
        ("acos_target", strategy.acos_target),
        ("acos", strategy.acos),
        ("impressions_won_pct", strategy.impressions_won_pct),
        ("impressions_lost_budget_pct", strategy.impressions_lost_budget_pct),
        ("impressions_lost_rank_pct", strategy.impressions_lost_rank_pct),
        ("clicks", strategy.clicks),
        ("units_sold_per_ad", strategy.units_sold_per_ad),
        ("quantity", strategy.quantity),
    ];

    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((field, _)) => Err(CatalogError::NonFinite {
            name: strategy.name.clone(),
            field: *field,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strategist_model::{ImpressionTier, InvestmentRevenueBand};

    fn profile(name: &str) -> StrategyProfile {
        StrategyProfile {
            name: name.to_string(),
            budget: 1.0,
            acos_target: 100.0,
            acos: 8.0,
            impression_tier: ImpressionTier::Low,
            impressions_won_pct: 10.0,
            impressions_lost_budget_pct: 0.0,
            impressions_lost_rank_pct: 90.0,
            clicks: 0.0,
            investment_revenue_ratio: InvestmentRevenueBand::AtMostTen,
            units_sold_per_ad: 10.0,
            quantity: 1.0,
        }
    }

    #[test]
    fn test_builtin_loads_in_order() {
        let catalog = StrategyCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 13);
        assert_eq!(catalog.version(), "1");

        let first = &catalog.all_strategies()[0];
        assert_eq!(first.name, "01A - Hig Perforrmance Stage1");
        assert_eq!(first.impression_tier, ImpressionTier::Low);
        assert_eq!(first.acos, 8.0);

        let last = catalog.all_strategies().last().unwrap();
        assert_eq!(last.name, "Recorrencia de vendas");
        assert_eq!(last.clicks, 1000.0);
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = StrategyCatalog::builtin().unwrap();
        let b = StrategyCatalog::builtin().unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_find() {
        let catalog = StrategyCatalog::builtin().unwrap();
        let strategy = catalog.find("Alavanca Full").unwrap();
        assert_eq!(strategy.acos, 45.0);
        assert_eq!(strategy.investment_revenue_ratio, InvestmentRevenueBand::AboveTen);
        assert!(catalog.find("alavanca full").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = StrategyCatalog::new("t", vec![profile("A"), profile("A")]);
        assert!(matches!(result, Err(CatalogError::DuplicateName(name)) if name == "A"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = StrategyCatalog::new("t", vec![profile("A"), profile("  ")]);
        assert!(matches!(result, Err(CatalogError::EmptyName(1))));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut bad = profile("A");
        bad.budget = f64::NAN;
        let result = StrategyCatalog::new("t", vec![bad]);
        assert!(matches!(
            result,
            Err(CatalogError::NonFinite { field: "budget", .. })
        ));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let json = r#"{"version": "2", "strategies": [{"name": "A", "budget": 1}]}"#;
        assert!(matches!(
            StrategyCatalog::from_json(json),
            Err(CatalogError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_catalog_allowed() {
        let catalog = StrategyCatalog::from_json(r#"{"version": "0", "strategies": []}"#).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_from_missing_path() {
        let result = StrategyCatalog::from_path("/nonexistent/strategies.json");
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
