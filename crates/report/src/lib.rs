//! Roll-up statistics and flat-file export for analysis runs.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strategist_catalog::CANONICAL_COLUMNS;
use strategist_engine::CampaignRecommendation;
use strategist_features::{canonical_row, canonical_value};
use strategist_model::{Decision, OrderRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_campaigns: usize,
    /// Mean over campaigns that reported ACOS
    pub mean_acos: Option<f64>,
    /// Sum over campaigns with a known budget
    pub total_budget: f64,
    /// Campaign count per recommended strategy label
    pub strategy_counts: BTreeMap<String, usize>,
    pub decision_counts: BTreeMap<Decision, usize>,
}

/// Aggregate a set of recommendations.
pub fn summarize(recommendations: &[CampaignRecommendation]) -> AnalysisSummary {
    let known_acos: Vec<f64> = recommendations
        .iter()
        .filter_map(|r| r.campaign.acos)
        .collect();
    let mean_acos = if known_acos.is_empty() {
        None
    } else {
        Some(known_acos.iter().sum::<f64>() / known_acos.len() as f64)
    };

    let mut summary = AnalysisSummary {
        total_campaigns: recommendations.len(),
        mean_acos,
        total_budget: recommendations.iter().filter_map(|r| r.campaign.budget).sum(),
        ..Default::default()
    };

    for rec in recommendations {
        *summary
            .strategy_counts
            .entry(rec.result.strategy_label().to_string())
            .or_default() += 1;
        if let Some(decision) = rec.result.decision {
            *summary.decision_counts.entry(decision).or_default() += 1;
        }
    }

    summary
}

/// Business metrics over seller orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdersSummary {
    pub total_orders: usize,
    pub gross_revenue: f64,
    /// gross_revenue / orders with an amount
    pub average_ticket: Option<f64>,
    pub status_counts: BTreeMap<String, usize>,
}

pub fn summarize_orders(orders: &[OrderRecord]) -> OrdersSummary {
    let amounts: Vec<f64> = orders.iter().filter_map(|o| o.total_amount).collect();
    let gross_revenue: f64 = amounts.iter().sum();

    let mut status_counts = BTreeMap::new();
    for order in orders {
        *status_counts.entry(order.status.clone()).or_default() += 1;
    }

    OrdersSummary {
        total_orders: orders.len(),
        gross_revenue,
        average_ticket: (!amounts.is_empty()).then(|| gross_revenue / amounts.len() as f64),
        status_counts,
    }
}

/// Header row of the tabular export.
pub fn csv_header() -> Vec<&'static str> {
    let mut header = vec!["campaign_id"];
    header.extend_from_slice(CANONICAL_COLUMNS);
    header.extend_from_slice(&[
        "impressions",
        "status",
        "recommended_strategy",
        "budget_delta",
        "decision",
    ]);
    header
}

/// Write one row per campaign; missing values become empty cells.
pub fn write_csv<W: Write>(
    writer: W,
    recommendations: &[CampaignRecommendation],
) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(csv_header())?;

    for rec in recommendations {
        let campaign = &rec.campaign;
        let mut row = vec![campaign.campaign_id.clone()];
        row.extend(canonical_row(campaign).into_iter().map(Option::unwrap_or_default));
        row.push(canonical_value(campaign, "impressions").unwrap_or_default());
        row.push(campaign.status.as_str().to_string());
        row.push(rec.result.strategy_label().to_string());
        row.push(rec.result.budget_delta.map(|d| d.to_string()).unwrap_or_default());
        row.push(
            rec.result
                .decision
                .map(|d| d.as_str().to_string())
                .unwrap_or_default(),
        );
        out.write_record(&row)?;
    }

    out.flush()?;
    Ok(())
}

/// Pretty JSON export of the recommendations.
pub fn to_json(recommendations: &[CampaignRecommendation]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(recommendations)?)
}

const EXPORT_MARKER: &str = "_campaign_analysis_";
const EXPORT_TIMESTAMP: &str = "%Y%m%d_%H%M%S";
const EXPORT_EXTENSIONS: &[&str] = &["csv", "json", "txt"];

/// File name for an exported analysis, e.g. `acme_campaign_analysis_20240131_142501.csv`.
pub fn export_file_name(client: &str, timestamp: NaiveDateTime, extension: &str) -> String {
    let client: String = client
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let client = if client.is_empty() { "client".to_string() } else { client };

    format!(
        "{}{}{}.{}",
        client,
        EXPORT_MARKER,
        timestamp.format(EXPORT_TIMESTAMP),
        extension
    )
}

/// Timestamp of a name produced by [`export_file_name`], `None` for any other file.
pub fn export_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if !EXPORT_EXTENSIONS.contains(&extension) {
        return None;
    }
    let (client, stamp) = stem.rsplit_once(EXPORT_MARKER)?;
    if client.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, EXPORT_TIMESTAMP).ok()
}

/// Keep export file names only, newest first, at most `limit` of them.
pub fn recent_exports<I>(file_names: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut exports: Vec<(NaiveDateTime, String)> = file_names
        .into_iter()
        .filter_map(|name| export_timestamp(&name).map(|ts| (ts, name)))
        .collect();
    exports.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    exports.into_iter().take(limit).map(|(_, name)| name).collect()
}

/// Previous analyses exported into `dir`, newest first.
pub fn list_exports(dir: &Path, limit: usize) -> Result<Vec<PathBuf>, ExportError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    Ok(recent_exports(names, limit)
        .into_iter()
        .map(|name| dir.join(name))
        .collect())
}
