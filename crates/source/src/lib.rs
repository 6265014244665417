//! Campaign data sources.
//!
//! Provides the `CampaignSource` trait and its Mercado Livre Product Ads
//! implementation. The analysis crates only consume fully materialized
//! records, so fetching, paging and rate limiting all stay here.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strategist_model::{CampaignRecord, OrderRecord};
use thiserror::Error;

/// Metrics requested for every campaign.
pub const DEFAULT_METRICS: &[&str] = &[
    "clicks",
    "prints",
    "ctr",
    "cost",
    "cpc",
    "acos",
    "organic_units_quantity",
    "direct_items_quantity",
    "indirect_items_quantity",
    "units_quantity",
    "direct_amount",
    "indirect_amount",
    "total_amount",
];

/// Errors from data source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Source not available")]
    Unavailable,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Trait for campaign data sources.
///
/// Implementations return complete result sets; callers never see pages.
pub trait CampaignSource {
    /// All campaigns of an advertiser with metrics for the date window.
    fn fetch_campaigns(
        &self,
        advertiser_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> impl Future<Output = Result<Vec<CampaignRecord>, SourceError>> + Send;

    /// All orders of a seller created in the date window.
    fn fetch_orders(
        &self,
        seller_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> impl Future<Output = Result<Vec<OrderRecord>, SourceError>> + Send;

    /// Check if the source is reachable with the configured credentials.
    fn health_check(&self) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// Get the source name for logging.
    fn name(&self) -> &'static str;
}

/// Mercado Livre API configuration.
#[derive(Clone)]
pub struct MeliConfig {
    /// Base URL of the API
    pub base_url: String,
    /// OAuth access token, obtained elsewhere
    pub access_token: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Records per page
    pub page_size: usize,
    /// Stop after this many pages
    pub max_pages: Option<usize>,
    /// Pause between page requests
    pub page_delay_ms: u64,
}

impl Default for MeliConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mercadolibre.com".to_string(),
            access_token: String::new(),
            timeout_secs: 30,
            page_size: 50,
            max_pages: None,
            page_delay_ms: 500,
        }
    }
}

impl fmt::Debug for MeliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeliConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("page_delay_ms", &self.page_delay_ms)
            .finish()
    }
}

/// An advertiser account reachable with the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertiser {
    pub advertiser_id: i64,
    #[serde(default)]
    pub advertiser_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdvertisersResponse {
    #[serde(default)]
    advertisers: Vec<Advertiser>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Paging {
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct Page<T> {
    #[serde(default)]
    results: Vec<T>,
    #[serde(default)]
    paging: Paging,
}

/// Offset of the next page, or `None` when paging is done.
fn next_offset(offset: usize, limit: usize, total: usize, page_len: usize) -> Option<usize> {
    if limit == 0 || page_len == 0 || offset + limit >= total {
        None
    } else {
        Some(offset + limit)
    }
}

/// Whether page `page_number` (1-based) may still be requested.
fn within_page_limit(page_number: usize, max_pages: Option<usize>) -> bool {
    match max_pages {
        Some(max) => page_number <= max,
        None => true,
    }
}

/// Mercado Livre Product Ads source.
pub struct MeliAdsSource {
    config: MeliConfig,
    client: reqwest::Client,
}

impl MeliAdsSource {
    /// Create a new source.
    pub fn new(config: MeliConfig) -> Result<Self, SourceError> {
        if config.page_size == 0 {
            return Err(SourceError::Config("page_size must be at least 1".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &MeliConfig {
        &self.config
    }

    /// Advertisers of the Product Ads program.
    pub async fn advertisers(&self) -> Result<Vec<Advertiser>, SourceError> {
        let url = format!("{}/advertising/advertisers", self.config.base_url);
        let response: AdvertisersResponse = self
            .get_json(&url, "1", &[("product_id".to_string(), "PADS".to_string())])
            .await?;
        tracing::info!(count = response.advertisers.len(), "Fetched advertisers");
        Ok(response.advertisers)
    }

    /// Seller id of the token owner.
    pub async fn current_user_id(&self) -> Result<String, SourceError> {
        let url = format!("{}/users/me", self.config.base_url);
        let user: UserResponse = self.get_json(&url, "", &[]).await?;
        Ok(user.id.to_string())
    }

    fn campaigns_url(&self, advertiser_id: &str) -> String {
        format!(
            "{}/advertising/advertisers/{}/product_ads/campaigns",
            self.config.base_url, advertiser_id
        )
    }

    fn campaign_params(date_from: NaiveDate, date_to: NaiveDate) -> Vec<(String, String)> {
        vec![
            ("date_from".to_string(), date_from.format("%Y-%m-%d").to_string()),
            ("date_to".to_string(), date_to.format("%Y-%m-%d").to_string()),
            ("metrics".to_string(), DEFAULT_METRICS.join(",")),
        ]
    }

    fn order_params(
        seller_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Vec<(String, String)> {
        vec![
            ("seller".to_string(), seller_id.to_string()),
            (
                "order.date_created.from".to_string(),
                format!("{}T00:00:00.000-00:00", date_from.format("%Y-%m-%d")),
            ),
            (
                "order.date_created.to".to_string(),
                format!("{}T23:59:59.999-00:00", date_to.format("%Y-%m-%d")),
            ),
        ]
    }

    /// Collect every page of an offset-paginated listing.
    async fn fetch_pages<T>(
        &self,
        url: &str,
        api_version: &str,
        params: &[(String, String)],
    ) -> Result<Vec<T>, SourceError>
    where
        T: DeserializeOwned + Send,
    {
        let limit = self.config.page_size;
        let mut offset = 0;
        let mut page_number = 1;
        let mut all = Vec::new();

        loop {
            if !within_page_limit(page_number, self.config.max_pages) {
                tracing::info!(max_pages = ?self.config.max_pages, "Page limit reached");
                break;
            }

            let mut page_params = params.to_vec();
            page_params.push(("limit".to_string(), limit.to_string()));
            page_params.push(("offset".to_string(), offset.to_string()));

            let page: Page<T> = self.get_json(url, api_version, &page_params).await?;
            let page_len = page.results.len();
            tracing::info!(
                page = page_number,
                records = page_len,
                total = page.paging.total,
                "Fetched page"
            );
            all.extend(page.results);

            match next_offset(offset, limit, page.paging.total, page_len) {
                Some(next) => offset = next,
                None => break,
            }
            page_number += 1;

            tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
        }

        Ok(all)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        api_version: &str,
        params: &[(String, String)],
    ) -> Result<T, SourceError> {
        tracing::debug!(url = %url, "Requesting");

        let mut request = self
            .client
            .get(url)
            .bearer_auth(&self.config.access_token)
            .query(params);
        if !api_version.is_empty() {
            request = request.header("Api-Version", api_version);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))
    }
}

impl CampaignSource for MeliAdsSource {
    async fn fetch_campaigns(
        &self,
        advertiser_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<CampaignRecord>, SourceError> {
        let url = self.campaigns_url(advertiser_id);
        let params = Self::campaign_params(date_from, date_to);
        let campaigns: Vec<CampaignRecord> = self.fetch_pages(&url, "2", &params).await?;
        tracing::info!(advertiser_id, count = campaigns.len(), "Fetched campaigns");
        Ok(campaigns)
    }

    async fn fetch_orders(
        &self,
        seller_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<OrderRecord>, SourceError> {
        let url = format!("{}/orders/search", self.config.base_url);
        let params = Self::order_params(seller_id, date_from, date_to);
        let orders: Vec<OrderRecord> = self.fetch_pages(&url, "", &params).await?;
        tracing::info!(seller_id, count = orders.len(), "Fetched orders");
        Ok(orders)
    }

    async fn health_check(&self) -> Result<(), SourceError> {
        match self.current_user_id().await {
            Ok(_) => Ok(()),
            Err(SourceError::Http { status, .. }) if status == 401 || status == 403 => {
                Err(SourceError::Unavailable)
            }
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &'static str {
        "mercadolivre"
    }
}
