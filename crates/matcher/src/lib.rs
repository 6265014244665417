//! Strategy matching for campaigns.
//!
//! Scores a normalized campaign against every strategy in the catalog and
//! selects the closest one. Lower scores are closer: the score is the ACOS
//! distance plus a fixed penalty for each categorical criterion that fails.

use serde::{Deserialize, Serialize};
use strategist_catalog::StrategyCatalog;
use strategist_features::{acos_distance, clicks_match, impression_match, ClicksRule};
use strategist_model::{NormalizedCampaign, StrategyProfile};

/// Configuration for the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Penalty when the impression tier differs
    pub impression_penalty: f64,
    /// Penalty when clicks fall outside the strategy's range
    pub clicks_penalty: f64,
    /// Allowed click difference for non-zero-click strategies
    pub clicks_tolerance: f64,
    /// Campaigns below this many clicks fit zero-click strategies
    pub near_zero_clicks_ceiling: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            impression_penalty: 100.0,
            clicks_penalty: 50.0,
            clicks_tolerance: 10.0,
            near_zero_clicks_ceiling: 5.0,
        }
    }
}

impl MatchConfig {
    fn clicks_rule(&self) -> ClicksRule {
        ClicksRule {
            near_zero_ceiling: self.near_zero_clicks_ceiling,
            tolerance: self.clicks_tolerance,
        }
    }
}

/// Score breakdown of one campaign against one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyScore {
    /// Position of the strategy in the catalog
    pub position: usize,
    pub strategy_name: String,
    /// Infinite when the campaign ACOS is unknown
    pub acos_diff: f64,
    pub impression_match: bool,
    pub clicks_match: bool,
    pub score: f64,
}

/// Score a campaign against every strategy, in catalog order.
pub fn score_strategies(
    campaign: &NormalizedCampaign,
    catalog: &StrategyCatalog,
    config: &MatchConfig,
) -> Vec<StrategyScore> {
    catalog
        .all_strategies()
        .iter()
        .enumerate()
        .map(|(position, strategy)| score_strategy(campaign, position, strategy, config))
        .collect()
}

/// Select the closest strategy for a campaign.
///
/// Ties go to the strategy defined first. Returns `None` only when the
/// catalog is empty.
pub fn best_match(
    campaign: &NormalizedCampaign,
    catalog: &StrategyCatalog,
    config: &MatchConfig,
) -> Option<StrategyScore> {
    score_strategies(campaign, catalog, config)
        .into_iter()
        .reduce(|best, candidate| {
            // Strict comparison keeps the earlier strategy on ties
            if candidate.score < best.score {
                candidate
            } else {
                best
            }
        })
}

fn score_strategy(
    campaign: &NormalizedCampaign,
    position: usize,
    strategy: &StrategyProfile,
    config: &MatchConfig,
) -> StrategyScore {
    let acos_diff = acos_distance(campaign.acos, strategy.acos);
    let impression_match = impression_match(campaign.impression_tier, strategy.impression_tier);
    let clicks_match = clicks_match(campaign.clicks, Some(strategy.clicks), &config.clicks_rule());

    let mut score = acos_diff;
    if !impression_match {
        score += config.impression_penalty;
    }
    if !clicks_match {
        score += config.clicks_penalty;
    }

    StrategyScore {
        position,
        strategy_name: strategy.name.clone(),
        acos_diff,
        impression_match,
        clicks_match,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strategist_features::normalize_campaign;
    use strategist_model::{CampaignRecord, ImpressionTier, InvestmentRevenueBand};

    fn make_strategy(
        name: &str,
        acos: f64,
        tier: ImpressionTier,
        clicks: f64,
        budget: f64,
    ) -> StrategyProfile {
        StrategyProfile {
            name: name.to_string(),
            budget,
            acos_target: 1000.0,
            acos,
            impression_tier: tier,
            impressions_won_pct: 50.0,
            impressions_lost_budget_pct: 0.0,
            impressions_lost_rank_pct: 50.0,
            clicks,
            investment_revenue_ratio: InvestmentRevenueBand::AtMostTen,
            units_sold_per_ad: 10.0,
            quantity: 1.0,
        }
    }

    fn catalog(strategies: Vec<StrategyProfile>) -> StrategyCatalog {
        StrategyCatalog::new("test", strategies).unwrap()
    }

    fn campaign(record: CampaignRecord) -> NormalizedCampaign {
        normalize_campaign(&record).unwrap()
    }

    #[test]
    fn test_exact_profile_scores_zero() {
        let catalog = catalog(vec![make_strategy("A", 8.0, ImpressionTier::Low, 0.0, 8.0)]);
        let campaign = campaign(
            CampaignRecord::new("1", "c")
                .with_acos(8.0)
                .with_clicks(2.0)
                .with_impression_tier(ImpressionTier::Low),
        );

        let best = best_match(&campaign, &catalog, &MatchConfig::default()).unwrap();
        assert_eq!(best.strategy_name, "A");
        assert_eq!(best.score, 0.0);
        assert!(best.impression_match);
        assert!(best.clicks_match);
    }

    #[test]
    fn test_penalties_add_up() {
        let catalog = catalog(vec![make_strategy("A", 8.0, ImpressionTier::High, 100.0, 8.0)]);
        let campaign = campaign(
            CampaignRecord::new("1", "c")
                .with_acos(10.0)
                .with_clicks(2.0)
                .with_impression_tier(ImpressionTier::Low),
        );

        let scores = score_strategies(&campaign, &catalog, &MatchConfig::default());
        assert_eq!(scores[0].acos_diff, 2.0);
        assert!(!scores[0].impression_match);
        assert!(!scores[0].clicks_match);
        assert_eq!(scores[0].score, 152.0);
    }

    #[test]
    fn test_tie_goes_to_first_in_catalog() {
        let catalog = catalog(vec![
            make_strategy("A", 8.0, ImpressionTier::Low, 0.0, 8.0),
            make_strategy("B", 8.0, ImpressionTier::Low, 0.0, 1.0),
        ]);
        let campaign = campaign(
            CampaignRecord::new("1", "c")
                .with_acos(8.0)
                .with_clicks(2.0)
                .with_impression_tier(ImpressionTier::Low),
        );

        let best = best_match(&campaign, &catalog, &MatchConfig::default()).unwrap();
        assert_eq!(best.strategy_name, "A");
        assert_eq!(best.position, 0);
    }

    #[test]
    fn test_closest_acos_wins() {
        let catalog = catalog(vec![
            make_strategy("far", 30.0, ImpressionTier::Low, 0.0, 1.0),
            make_strategy("near", 9.0, ImpressionTier::Low, 0.0, 1.0),
        ]);
        let campaign = campaign(
            CampaignRecord::new("1", "c")
                .with_acos(8.0)
                .with_clicks(0.0)
                .with_impression_tier(ImpressionTier::Low),
        );

        let best = best_match(&campaign, &catalog, &MatchConfig::default()).unwrap();
        assert_eq!(best.strategy_name, "near");
    }

    #[test]
    fn test_unknown_acos_ignores_strategy_acos() {
        let campaign = campaign(
            CampaignRecord::new("1", "c")
                .with_clicks(2.0)
                .with_impression_tier(ImpressionTier::Low),
        );

        for (first_acos, second_acos) in [(8.0, 50.0), (50.0, 8.0), (0.0, 0.0)] {
            let catalog = catalog(vec![
                make_strategy("A", first_acos, ImpressionTier::Low, 0.0, 1.0),
                make_strategy("B", second_acos, ImpressionTier::Low, 0.0, 1.0),
            ]);
            let best = best_match(&campaign, &catalog, &MatchConfig::default()).unwrap();
            assert_eq!(best.strategy_name, "A");
            assert!(best.acos_diff.is_infinite());
        }
    }

    #[test]
    fn test_empty_catalog_has_no_match() {
        let catalog = catalog(Vec::new());
        let campaign = campaign(CampaignRecord::new("1", "c").with_acos(8.0));
        assert!(best_match(&campaign, &catalog, &MatchConfig::default()).is_none());
    }

    #[test]
    fn test_deterministic() {
        let catalog = StrategyCatalog::builtin().unwrap();
        let campaign = campaign(
            CampaignRecord::new("1", "c")
                .with_acos(21.0)
                .with_clicks(95.0)
                .with_impression_tier(ImpressionTier::Medium),
        );
        let config = MatchConfig::default();

        let first = best_match(&campaign, catalog, &config).unwrap();
        for _ in 0..10 {
            assert_eq!(best_match(&campaign, catalog, &config).unwrap(), first);
        }
        assert_eq!(first.strategy_name, "Aceleração dinamica 850/22");
        assert_eq!(first.score, 1.0);
    }

    #[test]
    fn test_custom_penalties() {
        let catalog = catalog(vec![make_strategy("A", 8.0, ImpressionTier::High, 0.0, 1.0)]);
        let campaign = campaign(CampaignRecord::new("1", "c").with_acos(8.0).with_clicks(1.0));
        let config = MatchConfig {
            impression_penalty: 7.0,
            ..Default::default()
        };

        let best = best_match(&campaign, &catalog, &config).unwrap();
        assert_eq!(best.score, 7.0);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: MatchConfig = serde_json::from_str(r#"{"clicks_penalty": 25}"#).unwrap();
        assert_eq!(config.clicks_penalty, 25.0);
        assert_eq!(config.impression_penalty, 100.0);
    }
}
