//! Command-line front-end for campaign strategy analysis.
//!
//! Usage:
//!     strategist analyze --input campaigns.json --format csv --output report.csv
//!     strategist fetch --access-token $TOKEN --days 30
//!     strategist catalog
//!     strategist health --access-token $TOKEN
//!     strategist history --dir exports --limit 5

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, TimeDelta};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use strategist_catalog::StrategyCatalog;
use strategist_engine::{filter_by_status, CampaignRecommendation, RecommendationEngine};
use strategist_explain::{campaign_card, explain_score};
use strategist_matcher::{best_match, MatchConfig};
use strategist_model::{CampaignRecord, CampaignStatus};
use strategist_report::{
    export_file_name, list_exports, summarize, summarize_orders, to_json, write_csv,
    AnalysisSummary,
};
use strategist_source::{CampaignSource, MeliAdsSource, MeliConfig};

#[derive(Parser)]
#[command(name = "strategist")]
#[command(about = "Match ad campaigns to reference strategies and recommend budgets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Strategy catalog asset (defaults to the built-in catalog)
    #[arg(long, global = true, env = "STRATEGIST_CATALOG")]
    catalog: Option<PathBuf>,

    /// Scoring configuration (JSON, partial allowed)
    #[arg(long, global = true, env = "STRATEGIST_SCORING")]
    scoring: Option<PathBuf>,

    /// Ads API base URL
    #[arg(
        long,
        global = true,
        env = "MELI_API_URL",
        default_value = "https://api.mercadolibre.com"
    )]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze campaigns from a JSON file
    Analyze {
        /// JSON array of campaigns, or an API page with `results`
        #[arg(short, long)]
        input: PathBuf,

        /// Only show campaigns with this status (e.g. active, paused)
        #[arg(short, long)]
        status: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include per-criterion explanations in text output
        #[arg(long)]
        explain: bool,
    },

    /// Fetch campaigns from the ads API, analyze and export them
    Fetch {
        #[arg(long, env = "MELI_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,

        /// Advertiser to analyze (defaults to the first one on the account)
        #[arg(long)]
        advertiser_id: Option<String>,

        /// Size of the date window, ending today
        #[arg(long, default_value = "30")]
        days: i64,

        #[arg(long, default_value = "5")]
        max_pages: usize,

        /// Client name used in the export file name
        #[arg(long)]
        client: Option<String>,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Also fetch seller orders and print business metrics
        #[arg(long)]
        orders: bool,
    },

    /// List the strategies in the catalog
    Catalog,

    /// Check the ads API is reachable with the token
    Health {
        #[arg(long, env = "MELI_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
    },

    /// List the most recent exported analyses
    History {
        /// Directory the exports were written to
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        #[arg(long, default_value = "5")]
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Accepted shapes of an input file.
#[derive(Deserialize)]
#[serde(untagged)]
enum CampaignInput {
    List(Vec<CampaignRecord>),
    Page { results: Vec<CampaignRecord> },
}

impl CampaignInput {
    fn into_records(self) -> Vec<CampaignRecord> {
        match self {
            Self::List(records) | Self::Page { results: records } => records,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("strategist=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let loaded;
    let catalog: &StrategyCatalog = match &cli.catalog {
        Some(path) => {
            loaded = StrategyCatalog::from_path(path)?;
            &loaded
        }
        None => StrategyCatalog::builtin()?,
    };
    let config = load_scoring(cli.scoring.as_deref())?;
    tracing::debug!(
        catalog_version = catalog.version(),
        strategies = catalog.len(),
        ?config,
        "Engine configured"
    );
    let engine = RecommendationEngine::new(catalog, config);

    match cli.command {
        Commands::Analyze {
            input,
            status,
            format,
            output,
            explain,
        } => {
            run_analyze(&engine, &input, status.as_deref(), format, output.as_deref(), explain)?;
        }
        Commands::Fetch {
            access_token,
            advertiser_id,
            days,
            max_pages,
            client,
            format,
            output_dir,
            orders,
        } => {
            let source = MeliAdsSource::new(MeliConfig {
                base_url: cli.api_url,
                access_token,
                max_pages: Some(max_pages),
                ..Default::default()
            })?;
            let options = FetchOptions {
                advertiser_id,
                days,
                client,
                format,
                output_dir,
                orders,
            };
            run_fetch(&engine, &source, options).await?;
        }
        Commands::Catalog => {
            run_catalog(catalog);
        }
        Commands::Health { access_token } => {
            let source = MeliAdsSource::new(MeliConfig {
                base_url: cli.api_url,
                access_token,
                ..Default::default()
            })?;
            run_health(&source).await?;
        }
        Commands::History { dir, limit } => {
            run_history(&dir, limit)?;
        }
    }

    Ok(())
}

fn load_scoring(path: Option<&Path>) -> Result<MatchConfig> {
    let Some(path) = path else {
        return Ok(MatchConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scoring config: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Invalid scoring config: {}", path.display()))
}

fn load_campaigns(path: &Path) -> Result<Vec<CampaignRecord>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read campaigns file: {}", path.display()))?;
    let input: CampaignInput = serde_json::from_str(&json)
        .with_context(|| format!("Invalid campaigns file: {}", path.display()))?;
    Ok(input.into_records())
}

fn run_analyze(
    engine: &RecommendationEngine<'_>,
    input: &Path,
    status: Option<&str>,
    format: OutputFormat,
    output: Option<&Path>,
    explain: bool,
) -> Result<()> {
    let records = load_campaigns(input)?;
    let outcome = engine.recommend(&records);

    for excluded in &outcome.excluded {
        eprintln!(
            "Skipped record {} ({}): {}",
            excluded.position + 1,
            excluded.name,
            excluded.reason
        );
    }

    let recommendations: Vec<CampaignRecommendation> = match status {
        Some(status) => filter_by_status(&outcome.recommendations, &CampaignStatus::from(status))
            .into_iter()
            .cloned()
            .collect(),
        None => outcome.recommendations,
    };

    let rendered = render(engine, &recommendations, format, explain)?;
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {} campaigns to {}", recommendations.len(), path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn render(
    engine: &RecommendationEngine<'_>,
    recommendations: &[CampaignRecommendation],
    format: OutputFormat,
    explain: bool,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => to_json(recommendations)?,
        OutputFormat::Csv => {
            let mut out = Vec::new();
            write_csv(&mut out, recommendations)?;
            String::from_utf8(out).context("CSV output is not UTF-8")?
        }
        OutputFormat::Text => render_text(engine, recommendations, explain),
    })
}

fn render_text(
    engine: &RecommendationEngine<'_>,
    recommendations: &[CampaignRecommendation],
    explain: bool,
) -> String {
    let mut out = String::new();

    for (i, rec) in recommendations.iter().enumerate() {
        let campaign = &rec.campaign;
        out.push_str(&format!(
            "\n{}. {} (ID: {})\n",
            i + 1,
            campaign.name,
            campaign.campaign_id
        ));
        out.push_str(&format!("   Status: {}\n", campaign.status.as_str()));
        let strategy = rec
            .result
            .recommended_strategy
            .as_deref()
            .and_then(|name| engine.catalog().find(name));
        for line in campaign_card(rec, strategy).lines() {
            out.push_str(&format!("   {}\n", line));
        }

        if explain {
            if let Some(best) = best_match(campaign, engine.catalog(), engine.config()) {
                let strategy = &engine.catalog().all_strategies()[best.position];
                for explanation in explain_score(&best, campaign, strategy, engine.config()) {
                    out.push_str(&format!(
                        "     - {} (+{:.2}): {}\n",
                        explanation.summary, explanation.contribution, explanation.detail
                    ));
                }
            }
        }
    }

    out.push_str("\n---\n");
    out.push_str(&render_summary(&summarize(recommendations)));
    out
}

fn render_summary(summary: &AnalysisSummary) -> String {
    let mut out = format!("Total campaigns: {}\n", summary.total_campaigns);
    out.push_str(&format!("Mean ACOS: {}\n", format_number(summary.mean_acos)));
    out.push_str(&format!("Total budget: {:.2}\n", summary.total_budget));
    out.push_str("Recommended strategies:\n");
    for (strategy, count) in &summary.strategy_counts {
        out.push_str(&format!("  {}: {}\n", strategy, count));
    }
    out
}

fn format_number(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

struct FetchOptions {
    advertiser_id: Option<String>,
    days: i64,
    client: Option<String>,
    format: OutputFormat,
    output_dir: PathBuf,
    orders: bool,
}

/// `days`-long window ending at `today`.
fn date_window(today: NaiveDate, days: i64) -> Result<(NaiveDate, NaiveDate)> {
    if days <= 0 {
        bail!("--days must be positive (got {})", days);
    }
    let date_from = TimeDelta::try_days(days).and_then(|d| today.checked_sub_signed(d));
    let Some(date_from) = date_from else {
        bail!("--days is too large (got {})", days);
    };
    Ok((date_from, today))
}

async fn run_fetch(
    engine: &RecommendationEngine<'_>,
    source: &MeliAdsSource,
    options: FetchOptions,
) -> Result<()> {
    let (date_from, date_to) = date_window(Local::now().date_naive(), options.days)?;

    let (advertiser_id, advertiser_name) = match options.advertiser_id {
        Some(id) => (id, None),
        None => {
            let advertisers = source.advertisers().await?;
            let first = advertisers
                .into_iter()
                .next()
                .context("No advertisers found for this token")?;
            (first.advertiser_id.to_string(), Some(first.advertiser_name))
        }
    };

    println!("Fetching campaigns for advertiser {} ({} to {})", advertiser_id, date_from, date_to);
    let records = source
        .fetch_campaigns(&advertiser_id, date_from, date_to)
        .await?;
    println!("Retrieved {} campaigns from {}", records.len(), source.name());

    let outcome = engine.recommend(&records);
    if outcome.excluded_count() > 0 {
        println!("Skipped {} campaigns without an identifier", outcome.excluded_count());
    }

    print!("{}", render_summary(&summarize(&outcome.recommendations)));

    if options.orders {
        let seller_id = source.current_user_id().await?;
        let orders = source.fetch_orders(&seller_id, date_from, date_to).await?;
        let business = summarize_orders(&orders);
        println!("Orders: {}", business.total_orders);
        println!("Gross revenue: {:.2}", business.gross_revenue);
        println!("Average ticket: {}", format_number(business.average_ticket));
    }

    let client = options
        .client
        .or(advertiser_name)
        .unwrap_or_else(|| advertiser_id.clone());
    let file_name = export_file_name(
        &client,
        Local::now().naive_local(),
        options.format.extension(),
    );
    let path = options.output_dir.join(file_name);

    let rendered = render(engine, &outcome.recommendations, options.format, false)?;
    fs::write(&path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Exported analysis to {}", path.display());

    Ok(())
}

fn run_catalog(catalog: &StrategyCatalog) {
    println!("Strategy catalog v{} ({} strategies)", catalog.version(), catalog.len());
    for (i, strategy) in catalog.all_strategies().iter().enumerate() {
        println!(
            "{:>2}. {} | budget {:.2} | ACOS {:.2} | {} impressions | {} clicks",
            i + 1,
            strategy.name,
            strategy.budget,
            strategy.acos,
            strategy.impression_tier,
            strategy.clicks
        );
    }
}

fn run_history(dir: &Path, limit: usize) -> Result<()> {
    let exports = list_exports(dir, limit)
        .with_context(|| format!("Failed to list exports in {}", dir.display()))?;

    if exports.is_empty() {
        println!("No previous analyses found in {}", dir.display());
        return Ok(());
    }

    println!("Previous analyses:");
    for path in exports {
        println!("  {}", path.display());
    }
    Ok(())
}

async fn run_health(source: &MeliAdsSource) -> Result<()> {
    print!("Checking {} API... ", source.name());

    match source.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_input_accepts_list_and_page() {
        let list: CampaignInput = serde_json::from_str(r#"[{"id": 1, "name": "a"}]"#).unwrap();
        assert_eq!(list.into_records().len(), 1);

        let page: CampaignInput = serde_json::from_str(
            r#"{"paging": {"total": 2}, "results": [{"id": 1}, {"id": 2}]}"#,
        )
        .unwrap();
        assert_eq!(page.into_records().len(), 2);
    }

    #[test]
    fn test_render_text_lists_campaigns_and_summary() {
        let engine = RecommendationEngine::with_builtin_catalog().unwrap();
        let outcome = engine.recommend(&[CampaignRecord::new("7", "Kitchen")
            .with_acos(45.0)
            .with_clicks(100.0)
            .with_budget(3.0)]);

        let text = render_text(&engine, &outcome.recommendations, true);
        assert!(text.contains("1. Kitchen (ID: 7)"));
        assert!(text.contains("Alavanca Full"));
        assert!(text.contains("Increase investment by 2.00"));
        assert!(text.contains("   ACOS: 45.00 current, 45.00 strategy"));
        assert!(text.contains("   Budget: 3.00 current, 5.00 recommended"));
        assert!(text.contains("Different impression tier"));
        assert!(text.contains("Total campaigns: 1"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(Some(3.14159)), "3.14");
        assert_eq!(format_number(None), "n/a");
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "strategist", "analyze", "--input", "c.json", "--format", "csv", "--status", "active",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { format, status, .. } => {
                assert_eq!(format, OutputFormat::Csv);
                assert_eq!(status.as_deref(), Some("active"));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_date_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            date_window(today, 30).unwrap(),
            (NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), today)
        );
        assert!(date_window(today, 0).is_err());
        assert!(date_window(today, -1).is_err());
        assert!(date_window(today, i64::MAX).is_err());
        assert!(date_window(today, 400_000_000).is_err());
    }

    #[test]
    fn test_cli_parses_history_defaults() {
        let cli = Cli::try_parse_from(["strategist", "history"]).unwrap();
        match cli.command {
            Commands::History { dir, limit } => {
                assert_eq!(dir, PathBuf::from("."));
                assert_eq!(limit, 5);
            }
            _ => panic!("expected history"),
        }
    }
}
