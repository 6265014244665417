//! Batch recommendation over a set of campaigns.
//!
//! Maps every campaign onto the canonical schema, matches it against the
//! strategy catalog and derives the budget decision. Records that cannot be
//! mapped are reported back instead of failing the batch.

use serde::{Deserialize, Serialize};
use strategist_catalog::{CatalogError, StrategyCatalog};
use strategist_features::normalize_campaign;
use strategist_matcher::{best_match, MatchConfig, StrategyScore};
use strategist_model::{
    CampaignRecord, CampaignStatus, Decision, NormalizedCampaign, RecommendationResult,
};

/// A campaign paired with its recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecommendation {
    pub campaign: NormalizedCampaign,
    pub result: RecommendationResult,
}

/// A record left out of the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedRecord {
    /// Position in the input sequence
    pub position: usize,
    pub name: String,
    pub reason: String,
}

/// Output of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// One entry per accepted campaign, in input order
    pub recommendations: Vec<CampaignRecommendation>,
    pub excluded: Vec<ExcludedRecord>,
}

impl BatchOutcome {
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}

/// Applies field mapping and strategy matching to campaign batches.
#[derive(Debug, Clone)]
pub struct RecommendationEngine<'a> {
    catalog: &'a StrategyCatalog,
    config: MatchConfig,
}

impl RecommendationEngine<'static> {
    /// Engine over the built-in catalog with default scoring.
    pub fn with_builtin_catalog() -> Result<Self, CatalogError> {
        Ok(Self::new(StrategyCatalog::builtin()?, MatchConfig::default()))
    }
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(catalog: &'a StrategyCatalog, config: MatchConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &'a StrategyCatalog {
        self.catalog
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Recommend a strategy for every record.
    pub fn recommend(&self, records: &[CampaignRecord]) -> BatchOutcome {
        let outcome = records
            .iter()
            .enumerate()
            .map(|(position, record)| self.evaluate(position, record))
            .fold(BatchOutcome::default(), |mut outcome, evaluated| {
                match evaluated {
                    Ok(recommendation) => outcome.recommendations.push(recommendation),
                    Err(excluded) => outcome.excluded.push(excluded),
                }
                outcome
            });

        tracing::info!(
            campaigns = records.len(),
            recommended = outcome.recommendations.len(),
            excluded = outcome.excluded_count(),
            catalog_version = self.catalog.version(),
            "Recommendation batch complete"
        );

        outcome
    }

    /// Recommend a strategy for one normalized campaign.
    pub fn recommend_one(&self, campaign: &NormalizedCampaign) -> RecommendationResult {
        match best_match(campaign, self.catalog, &self.config) {
            Some(best) => self.result_for(campaign, &best),
            None => {
                tracing::warn!(
                    campaign_id = %campaign.campaign_id,
                    "Strategy catalog is empty; no recommendation"
                );
                RecommendationResult::no_recommendation()
            }
        }
    }

    fn evaluate(
        &self,
        position: usize,
        record: &CampaignRecord,
    ) -> Result<CampaignRecommendation, ExcludedRecord> {
        let campaign = normalize_campaign(record).map_err(|e| {
            tracing::warn!(position, name = %record.name, error = %e, "Skipping campaign");
            ExcludedRecord {
                position,
                name: record.name.clone(),
                reason: e.to_string(),
            }
        })?;

        let result = self.recommend_one(&campaign);
        Ok(CampaignRecommendation { campaign, result })
    }

    fn result_for(
        &self,
        campaign: &NormalizedCampaign,
        best: &StrategyScore,
    ) -> RecommendationResult {
        let strategy_budget = self.catalog.all_strategies()[best.position].budget;
        let delta = budget_delta(strategy_budget, campaign.budget);

        tracing::debug!(
            campaign_id = %campaign.campaign_id,
            strategy = %best.strategy_name,
            score = best.score,
            budget_delta = ?delta,
            "Matched campaign"
        );

        RecommendationResult {
            recommended_strategy: Some(best.strategy_name.clone()),
            budget_delta: delta,
            decision: delta.map(Decision::from_delta),
            score: Some(best.score),
        }
    }
}

/// Strategy budget minus campaign budget; `None` when the campaign budget is unknown.
pub fn budget_delta(strategy_budget: f64, campaign_budget: Option<f64>) -> Option<f64> {
    campaign_budget.map(|budget| strategy_budget - budget)
}

/// Keep only recommendations for campaigns with the given status.
pub fn filter_by_status<'r>(
    recommendations: &'r [CampaignRecommendation],
    status: &CampaignStatus,
) -> Vec<&'r CampaignRecommendation> {
    recommendations
        .iter()
        .filter(|r| &r.campaign.status == status)
        .collect()
}
