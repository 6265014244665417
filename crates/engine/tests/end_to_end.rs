use pretty_assertions::assert_eq;
use strategist_catalog::StrategyCatalog;
use strategist_engine::{BatchOutcome, RecommendationEngine};
use strategist_matcher::MatchConfig;
use strategist_model::{CampaignRecord, Decision, ImpressionTier};

fn two_strategy_catalog() -> StrategyCatalog {
    StrategyCatalog::from_json(
        r#"{
            "version": "test",
            "strategies": [
                {"name": "A", "budget": 8, "acos_target": 4500, "acos": 8,
                 "impression_tier": "low", "impressions_won_pct": 10,
                 "impressions_lost_budget_pct": 0, "impressions_lost_rank_pct": 80,
                 "clicks": 0, "investment_revenue_ratio": "≤10",
                 "units_sold_per_ad": 10, "quantity": 1},
                {"name": "B", "budget": 1, "acos_target": 4500, "acos": 8,
                 "impression_tier": "low", "impressions_won_pct": 10,
                 "impressions_lost_budget_pct": 0, "impressions_lost_rank_pct": 80,
                 "clicks": 0, "investment_revenue_ratio": "≤10",
                 "units_sold_per_ad": 10, "quantity": 1}
            ]
        }"#,
    )
    .unwrap()
}

#[test]
fn tied_strategies_pick_first_and_increase_budget() {
    let catalog = two_strategy_catalog();
    let engine = RecommendationEngine::new(&catalog, MatchConfig::default());

    let campaign = CampaignRecord::new("c-1", "Tied")
        .with_acos(8.0)
        .with_clicks(2.0)
        .with_budget(5.0)
        .with_impression_tier(ImpressionTier::Low);

    let outcome = engine.recommend(&[campaign]);
    assert_eq!(outcome.recommendations.len(), 1);

    let result = &outcome.recommendations[0].result;
    assert_eq!(result.recommended_strategy.as_deref(), Some("A"));
    assert_eq!(result.score, Some(0.0));
    assert_eq!(result.budget_delta, Some(3.0));
    assert_eq!(result.decision, Some(Decision::Increase));
}

#[test]
fn record_without_identifier_is_excluded() {
    let engine = RecommendationEngine::with_builtin_catalog().unwrap();

    let mut missing_id = CampaignRecord::new("", "Second").with_acos(20.0);
    missing_id.campaign_id = None;
    let records = vec![
        CampaignRecord::new("1", "First").with_acos(8.0).with_budget(4.0),
        missing_id,
        CampaignRecord::new("3", "Third").with_acos(45.0).with_budget(5.0),
    ];

    let outcome: BatchOutcome = engine.recommend(&records);
    assert_eq!(outcome.recommendations.len(), 2);
    assert_eq!(outcome.excluded_count(), 1);
    assert_eq!(outcome.excluded[0].position, 1);

    let ids: Vec<_> = outcome
        .recommendations
        .iter()
        .map(|r| r.campaign.campaign_id.as_str())
        .collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[test]
fn decision_follows_delta_sign_for_every_match() {
    let engine = RecommendationEngine::with_builtin_catalog().unwrap();

    let records: Vec<_> = (0..40)
        .map(|i| {
            CampaignRecord::new(i.to_string(), format!("c{i}"))
                .with_acos(f64::from(i) * 1.5)
                .with_clicks(f64::from(i * 25))
                .with_budget(f64::from(i % 12))
        })
        .collect();

    for rec in engine.recommend(&records).recommendations {
        let delta = rec.result.budget_delta.unwrap();
        let expected = if delta > 0.0 {
            Decision::Increase
        } else if delta < 0.0 {
            Decision::Decrease
        } else {
            Decision::Maintain
        };
        assert_eq!(rec.result.decision, Some(expected));
    }
}

#[test]
fn vendor_payload_matches_builtin_strategies() {
    let payload = r#"[
        {"id": 1001, "name": "Kitchen", "status": "active", "budget": 10,
         "metrics": {"acos": 45.2, "clicks": 104, "cost": 30, "total_amount": 450}},
        {"id": "1002", "name": "Garden", "status": "paused", "budget": 1,
         "metrics": {"acos": 5, "clicks": 998}}
    ]"#;
    let records: Vec<CampaignRecord> = serde_json::from_str(payload).unwrap();
    let engine = RecommendationEngine::with_builtin_catalog().unwrap();

    let outcome = engine.recommend(&records);
    let names: Vec<_> = outcome
        .recommendations
        .iter()
        .map(|r| r.result.strategy_label().to_string())
        .collect();
    assert_eq!(names, vec!["Alavanca Full", "Recorrencia de vendas"]);
}

#[test]
fn null_vendor_fields_are_still_scored() {
    let payload = r#"[
        {"id": 7, "name": null, "status": null, "budget": 2, "metrics": null},
        {"id": 8, "name": "Garden", "status": "active", "budget": 1,
         "metrics": {"acos": 5, "clicks": 1000}}
    ]"#;
    let records: Vec<CampaignRecord> = serde_json::from_str(payload).unwrap();
    let engine = RecommendationEngine::with_builtin_catalog().unwrap();

    let outcome = engine.recommend(&records);
    assert_eq!(outcome.excluded_count(), 0);
    assert_eq!(outcome.recommendations.len(), 2);

    let first = &outcome.recommendations[0];
    assert_eq!(first.campaign.acos, None);
    assert_eq!(first.result.strategy_label(), catalog_first_name(&engine));
    assert_eq!(first.result.budget_delta, Some(6.0));
    assert_eq!(first.result.decision, Some(Decision::Increase));

    assert_eq!(
        outcome.recommendations[1].result.strategy_label(),
        "Recorrencia de vendas"
    );
}

fn catalog_first_name<'a>(engine: &'a RecommendationEngine<'_>) -> &'a str {
    &engine.catalog().all_strategies()[0].name
}
