//! Finnhub client for fundamentals and news

use crate::api::{MetricsSource, NewsArticle, NewsCategory, NewsSource};
use crate::dates::{DateRange, format_date};
use crate::error::{Result, StockError};
use async_trait::async_trait;
use chrono::DateTime;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const FINNHUB_API_BASE: &str = "https://finnhub.io/api/v1";

/// Finnhub news article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinnhubNewsArticle {
    /// Article category
    pub category: String,
    /// Publish time (UNIX timestamp)
    pub datetime: i64,
    /// News headline
    pub headline: String,
    /// Unique article ID
    pub id: i64,
    /// Thumbnail image URL
    pub image: String,
    /// Related symbols
    pub related: String,
    /// News source
    pub source: String,
    /// Article summary
    pub summary: String,
    /// Article URL
    pub url: String,
}

impl From<FinnhubNewsArticle> for NewsArticle {
    fn from(article: FinnhubNewsArticle) -> Self {
        Self {
            headline: article.headline,
            source: article.source,
            published_at: DateTime::from_timestamp(article.datetime, 0).unwrap_or_default(),
            summary: article.summary,
            url: article.url,
        }
    }
}

/// Finnhub client with client-side rate limiting
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    api_base: String,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// Create a new Finnhub client
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `rate_limit` - Requests per minute (free tier: 60)
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let per_minute = NonZeroU32::new(rate_limit).ok_or_else(|| {
            StockError::ConfigError("Finnhub rate limit must be greater than 0".to_string())
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: FINNHUB_API_BASE.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        })
    }

    /// Point the client at another base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base.trim_end_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| StockError::ApiError(format!("Finnhub request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::ApiError(format!(
                "Finnhub API error {status}: {body}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StockError::ApiError(format!("Failed to parse Finnhub response: {e}")))
    }

    /// Get company news for a specific symbol
    ///
    /// # Arguments
    /// * `symbol` - Stock symbol (e.g., "AAPL")
    /// * `range` - Publication window
    pub async fn get_company_news(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<Vec<FinnhubNewsArticle>> {
        let (from, to) = (format_date(range.start), format_date(range.end));
        self.get(
            "company-news",
            &[("symbol", symbol), ("from", from.as_str()), ("to", to.as_str())],
        )
        .await
    }

    /// Get general market news
    pub async fn get_market_news(&self, category: NewsCategory) -> Result<Vec<FinnhubNewsArticle>> {
        self.get("news", &[("category", category.as_str())]).await
    }

    /// Get the basic financials of a company (`metric=all`)
    pub async fn get_basic_financials(&self, symbol: &str) -> Result<Value> {
        self.get("stock/metric", &[("symbol", symbol), ("metric", "all")])
            .await
    }
}

impl std::fmt::Debug for FinnhubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinnhubClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetricsSource for FinnhubClient {
    async fn basic_metrics(&self, ticker: &str) -> Result<Option<Value>> {
        match self.get_basic_financials(ticker).await {
            Ok(payload) => {
                debug!(ticker, "Fetched Finnhub metrics");
                Ok(Some(payload))
            }
            Err(e) => {
                warn!(ticker, error = %e, "Error fetching Finnhub data");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl NewsSource for FinnhubClient {
    async fn company_news(&self, symbol: &str, range: DateRange) -> Result<Vec<NewsArticle>> {
        let articles = self.get_company_news(symbol, range).await?;
        Ok(articles.into_iter().map(NewsArticle::from).collect())
    }

    async fn market_news(&self, category: NewsCategory) -> Result<Vec<NewsArticle>> {
        let articles = self.get_market_news(category).await?;
        Ok(articles.into_iter().map(NewsArticle::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn client() -> FinnhubClient {
        FinnhubClient::new("test_key", 60, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_finnhub_client_creation() {
        let client = client();
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.url("stock/metric"), "https://finnhub.io/api/v1/stock/metric");

        let client = client.with_api_base("http://localhost:8080/api/");
        assert_eq!(client.url("news"), "http://localhost:8080/api/news");
        assert!(!format!("{client:?}").contains("test_key"));
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let err = FinnhubClient::new("k", 0, Duration::from_secs(5)).unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }

    #[test]
    fn test_article_conversion() {
        let raw: FinnhubNewsArticle = serde_json::from_value(json!({
            "category": "company",
            "datetime": 1_704_153_600,
            "headline": "Apple unveils new chip",
            "source": "Reuters",
            "summary": "The company said...",
            "url": "https://example.com/apple"
        }))
        .unwrap();

        let article = NewsArticle::from(raw);
        assert_eq!(article.headline, "Apple unveils new chip");
        assert_eq!(
            article.published_at.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[tokio::test]
    async fn test_unreachable_metrics_fall_back_to_none() {
        let client = FinnhubClient::new("k", 60, Duration::from_secs(2))
            .unwrap()
            .with_api_base("http://127.0.0.1:9");

        let payload = client.basic_metrics("AAPL").await.unwrap();
        assert!(payload.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires network access and FINNHUB_API_KEY
    async fn test_basic_financials() {
        let key = std::env::var("FINNHUB_API_KEY").unwrap();
        let client = FinnhubClient::new(key, 60, Duration::from_secs(30)).unwrap();

        let payload = client.get_basic_financials("AAPL").await.unwrap();
        assert!(payload["metric"].is_object());
    }
}
