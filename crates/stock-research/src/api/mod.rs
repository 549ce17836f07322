//! Market data providers
//!
//! The research tools only see the traits defined here, so they can run
//! against mocks in tests and against Yahoo Finance / Finnhub in production.

pub mod finnhub;
pub mod yahoo;

pub use finnhub::{FinnhubClient, FinnhubNewsArticle};
pub use yahoo::YahooFinanceClient;

use crate::dates::DateRange;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A news article, independent of the provider it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub headline: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub summary: String,
    pub url: String,
}

impl NewsArticle {
    /// Whether the headline or summary mentions any of the keywords
    ///
    /// Keywords are expected in lowercase.
    pub fn mentions_any(&self, keywords: &[String]) -> bool {
        let headline = self.headline.to_lowercase();
        let summary = self.summary.to_lowercase();
        keywords
            .iter()
            .any(|k| headline.contains(k.as_str()) || summary.contains(k.as_str()))
    }
}

/// Market news feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsCategory {
    General,
    Crypto,
    Forex,
    Merger,
}

impl NewsCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Crypto => "crypto",
            Self::Forex => "forex",
            Self::Merger => "merger",
        }
    }
}

/// Source of daily price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceHistory: Send + Sync {
    /// Daily adjusted closes for `range`, oldest first, end date included
    ///
    /// An empty window is `StockError::NoPriceData`.
    async fn adjusted_closes(&self, ticker: &str, range: DateRange) -> Result<Vec<f64>>;
}

/// Source of company fundamentals
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Raw basic-financials payload, `None` when the provider had nothing
    async fn basic_metrics(&self, ticker: &str) -> Result<Option<Value>>;
}

/// Source of news articles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// News about one company published within `range`
    async fn company_news(&self, symbol: &str, range: DateRange) -> Result<Vec<NewsArticle>>;

    /// Latest market-wide news in a category
    async fn market_news(&self, category: NewsCategory) -> Result<Vec<NewsArticle>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(headline: &str, summary: &str) -> NewsArticle {
        NewsArticle {
            headline: headline.to_string(),
            source: "Reuters".to_string(),
            published_at: DateTime::from_timestamp(1_717_000_000, 0).unwrap(),
            summary: summary.to_string(),
            url: "https://example.com/a".to_string(),
        }
    }

    #[test]
    fn test_mentions_any() {
        let a = article("Fed holds rates steady", "Markets rally on Inflation data");
        assert!(a.mentions_any(&["inflation".to_string()]));
        assert!(a.mentions_any(&["oil".to_string(), "fed".to_string()]));
        assert!(!a.mentions_any(&["oil".to_string()]));
        assert!(!a.mentions_any(&[]));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(NewsCategory::General.as_str(), "general");
        assert_eq!(NewsCategory::Crypto.as_str(), "crypto");
    }
}
