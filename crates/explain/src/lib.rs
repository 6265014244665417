//! Explanation generation for strategy recommendations.
//!
//! Converts score breakdowns and budget decisions into human-readable text
//! for the command-line report and exported files.

use serde::{Deserialize, Serialize};
use strategist_engine::CampaignRecommendation;
use strategist_matcher::{MatchConfig, StrategyScore};
use strategist_model::{Decision, NormalizedCampaign, RecommendationResult, StrategyProfile};

/// A structured explanation for one scoring criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation (1-2 sentences)
    pub detail: String,

    /// Contribution of this criterion to the score
    pub contribution: f64,

    /// Evidence items supporting this explanation
    pub evidence: Vec<EvidenceItem>,
}

/// A compared value behind an explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Which value this is
    pub kind: String,

    pub value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Explain each criterion of a strategy score.
pub fn explain_score(
    score: &StrategyScore,
    campaign: &NormalizedCampaign,
    strategy: &StrategyProfile,
    config: &MatchConfig,
) -> Vec<Explanation> {
    vec![
        explain_acos(score, campaign, strategy),
        explain_impressions(score, campaign, strategy, config),
        explain_clicks(score, campaign, strategy, config),
    ]
}

fn explain_acos(
    score: &StrategyScore,
    campaign: &NormalizedCampaign,
    strategy: &StrategyProfile,
) -> Explanation {
    match campaign.acos {
        Some(acos) => Explanation {
            summary: format!("ACOS {:.2} vs {:.2}", acos, strategy.acos),
            detail: format!(
                "The campaign ACOS is {:.2} points away from the ACOS '{}' is built around.",
                score.acos_diff, strategy.name
            ),
            contribution: score.acos_diff,
            evidence: vec![
                EvidenceItem {
                    kind: "campaign_acos".to_string(),
                    value: format!("{:.2}", acos),
                    context: None,
                },
                EvidenceItem {
                    kind: "strategy_acos".to_string(),
                    value: format!("{:.2}", strategy.acos),
                    context: None,
                },
            ],
        },
        None => Explanation {
            summary: "ACOS unknown".to_string(),
            detail: "The API reported no ACOS for this campaign, so no strategy can be \
                     matched on cost of sales."
                .to_string(),
            contribution: score.acos_diff,
            evidence: vec![],
        },
    }
}

fn explain_impressions(
    score: &StrategyScore,
    campaign: &NormalizedCampaign,
    strategy: &StrategyProfile,
    config: &MatchConfig,
) -> Explanation {
    let campaign_tier = campaign
        .impression_tier
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let (summary, detail, contribution) = if score.impression_match {
        (
            "Same impression tier".to_string(),
            format!(
                "Both the campaign and '{}' sit in the {} impression tier.",
                strategy.name, strategy.impression_tier
            ),
            0.0,
        )
    } else {
        (
            "Different impression tier".to_string(),
            format!(
                "The campaign impression tier is {} while '{}' targets {}.",
                campaign_tier, strategy.name, strategy.impression_tier
            ),
            config.impression_penalty,
        )
    };

    Explanation {
        summary,
        detail,
        contribution,
        evidence: vec![EvidenceItem {
            kind: "impression_tier".to_string(),
            value: campaign_tier,
            context: Some(format!("strategy: {}", strategy.impression_tier)),
        }],
    }
}

fn explain_clicks(
    score: &StrategyScore,
    campaign: &NormalizedCampaign,
    strategy: &StrategyProfile,
    config: &MatchConfig,
) -> Explanation {
    let range = if strategy.clicks == 0.0 {
        format!("fewer than {}", config.near_zero_clicks_ceiling)
    } else {
        format!("{} ± {}", strategy.clicks, config.clicks_tolerance)
    };

    let (summary, detail) = match (campaign.clicks, score.clicks_match) {
        (Some(clicks), true) => (
            "Clicks in range".to_string(),
            format!(
                "{} clicks is within the {} clicks '{}' expects.",
                clicks, range, strategy.name
            ),
        ),
        (Some(clicks), false) => (
            "Clicks out of range".to_string(),
            format!(
                "{} clicks is outside the {} clicks '{}' expects.",
                clicks, range, strategy.name
            ),
        ),
        (None, _) => (
            "Clicks unknown".to_string(),
            "The API reported no clicks for this campaign.".to_string(),
        ),
    };

    Explanation {
        summary,
        detail,
        contribution: if score.clicks_match { 0.0 } else { config.clicks_penalty },
        evidence: campaign
            .clicks
            .map(|clicks| EvidenceItem {
                kind: "clicks".to_string(),
                value: clicks.to_string(),
                context: Some(format!("expected: {}", range)),
            })
            .into_iter()
            .collect(),
    }
}

/// Budget advice for a recommendation.
pub fn investment_advice(result: &RecommendationResult) -> String {
    match (result.decision, result.budget_delta) {
        (Some(Decision::Increase), Some(delta)) => {
            format!("Increase investment by {:.2}", delta)
        }
        (Some(Decision::Decrease), Some(delta)) => {
            format!("Decrease investment by {:.2}", delta.abs())
        }
        (Some(Decision::Maintain), _) => "Keep current investment".to_string(),
        _ if result.recommended_strategy.is_none() => {
            "No strategy to compare budgets against".to_string()
        }
        _ => "Campaign budget unknown; no budget advice".to_string(),
    }
}

/// One-line summary of a campaign recommendation.
pub fn summarize_recommendation(recommendation: &CampaignRecommendation) -> String {
    let campaign = &recommendation.campaign;
    let result = &recommendation.result;

    let fit = match result.score {
        Some(score) if score < 10.0 => "CLOSE FIT",
        Some(score) if score < 100.0 => "PARTIAL FIT",
        Some(_) => "WEAK FIT",
        None => "NO FIT",
    };

    format!(
        "{}: {} -> {} ({})",
        fit,
        campaign.name,
        result.strategy_label(),
        investment_advice(result)
    )
}

/// Campaign card: the summary line followed by current vs. strategy ACOS and budget.
///
/// `strategy` is the catalog profile of the recommended strategy, if any.
pub fn campaign_card(
    recommendation: &CampaignRecommendation,
    strategy: Option<&StrategyProfile>,
) -> String {
    let campaign = &recommendation.campaign;
    let mut card = summarize_recommendation(recommendation);

    card.push_str(&format!(
        "\nACOS: {} current, {} strategy",
        format_value(campaign.acos),
        format_value(strategy.map(|s| s.acos))
    ));
    card.push_str(&format!(
        "\nBudget: {} current, {} recommended",
        format_value(campaign.budget),
        format_value(strategy.map(|s| s.budget))
    ));
    card
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}
