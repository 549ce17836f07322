//! News search tool

use crate::api::{NewsArticle, NewsCategory, NewsSource};
use crate::companies;
use crate::dates::DateRange;
use agent_core::Result as AgentResult;
use agent_llm::tools::schema;
use agent_tools::{Tool, optional_str, required_str};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Most articles returned per search
pub const MAX_RESULTS: usize = 10;

const CRYPTO_TERMS: &[&str] = &["btc", "bitcoin", "crypto", "cryptocurrency"];

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "about", "with", "from", "news", "latest", "stock", "stocks", "market",
    "markets", "today", "what", "are", "how",
];

/// What a search query asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsQuery {
    /// News about one listed company
    Company(String),
    /// Crypto market news
    Crypto,
    /// General market news filtered by keywords (no filter when empty)
    General(Vec<String>),
}

impl NewsQuery {
    /// Classify a free-text query
    ///
    /// A known company name or ticker wins, then crypto terms, then a lone
    /// ticker-looking word; anything else is a keyword search.
    ///
    /// ```
    /// use stock_research::tools::NewsQuery;
    ///
    /// assert_eq!(NewsQuery::parse("Apple Inc. earnings"), NewsQuery::Company("AAPL".into()));
    /// assert_eq!(NewsQuery::parse("BTC"), NewsQuery::Crypto);
    /// assert_eq!(NewsQuery::parse("oil prices"), NewsQuery::General(vec!["oil".into(), "prices".into()]));
    /// ```
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        let lower = query.to_lowercase();
        let words: Vec<&str> = query
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '?' | '!' | '(' | ')' | '"' | '\''))
            .filter(|w| !w.is_empty())
            .collect();

        if let Some((_, ticker)) = companies::COMPANIES
            .iter()
            .find(|(name, _)| lower.contains(&name.to_lowercase()))
        {
            return Self::Company((*ticker).to_string());
        }

        // Tickers count only when written in capitals ("MA", not "ma")
        if let Some(ticker) = words
            .iter()
            .find_map(|w| companies::COMPANIES.iter().find(|(_, t)| t == w))
            .map(|(_, t)| *t)
        {
            return Self::Company(ticker.to_string());
        }

        if words
            .iter()
            .any(|w| CRYPTO_TERMS.contains(&w.to_lowercase().as_str()))
        {
            return Self::Crypto;
        }

        if let [word] = words.as_slice() {
            if looks_like_ticker(word) {
                return Self::Company((*word).to_string());
            }
        }

        Self::General(
            words
                .iter()
                .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
                .filter(|w| w.len() >= 3 && !STOPWORDS.contains(&w.as_str()))
                .collect(),
        )
    }
}

async fn general_news(
    news: &dyn NewsSource,
    keywords: &[String],
) -> crate::error::Result<Vec<NewsArticle>> {
    let articles = news.market_news(NewsCategory::General).await?;
    if keywords.is_empty() {
        return Ok(articles);
    }
    Ok(articles
        .into_iter()
        .filter(|a| a.mentions_any(keywords))
        .collect())
}

fn looks_like_ticker(word: &str) -> bool {
    (1..=6).contains(&word.len())
        && word.chars().any(|c| c.is_ascii_uppercase())
        && word
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-')
}

/// `news_search`: recent news for a company, crypto, or the wider market
pub struct NewsSearchTool {
    news: Option<Arc<dyn NewsSource>>,
    max_results: usize,
}

impl NewsSearchTool {
    /// Create a tool backed by a news source
    pub fn new(news: Arc<dyn NewsSource>) -> Self {
        Self {
            news: Some(news),
            max_results: MAX_RESULTS,
        }
    }

    /// Create a tool that reports itself unavailable
    pub fn unavailable() -> Self {
        Self {
            news: None,
            max_results: MAX_RESULTS,
        }
    }

    /// Cap the number of articles returned
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    /// Run a search
    pub async fn search(&self, query: &str, range: DateRange) -> AgentResult<Vec<NewsArticle>> {
        let news = self.news.as_ref().ok_or_else(|| {
            agent_core::Error::tool(
                self.name(),
                "News search is unavailable: FINNHUB_API_KEY is not configured",
            )
        })?;

        let parsed = NewsQuery::parse(query);
        let result = match &parsed {
            NewsQuery::Company(ticker) => match news.company_news(ticker, range).await {
                // Macro terms like "CPI" look like tickers but have no company feed
                Ok(articles) if articles.is_empty() => {
                    debug!(ticker, "No company news, searching market news");
                    general_news(news.as_ref(), &[ticker.to_lowercase()]).await
                }
                other => other,
            },
            NewsQuery::Crypto => news.market_news(NewsCategory::Crypto).await,
            NewsQuery::General(keywords) => general_news(news.as_ref(), keywords).await,
        };

        let mut articles = result.map_err(|e| {
            warn!(query, error = %e, "News search failed");
            agent_core::Error::tool(self.name(), format!("Error searching news: {e}"))
        })?;

        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        articles.truncate(self.max_results);

        info!(query, kind = ?parsed, count = articles.len(), "News search complete");
        Ok(articles)
    }
}

#[async_trait]
impl Tool for NewsSearchTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let query = required_str(self.name(), &params, "search_query")?;
        let range = DateRange::resolve(
            optional_str(&params, "start_date"),
            optional_str(&params, "end_date"),
        );

        let articles = self.search(query, range).await?;
        Ok(json!({
            "query": query,
            "count": articles.len(),
            "results": articles,
        }))
    }

    fn name(&self) -> &str {
        "news_search"
    }

    fn description(&self) -> &str {
        "Search the news for information on a given topic. Pass a company name or ticker \
         for company news within the date range, BTC or crypto for crypto market news, or \
         keywords for general market news. Returns at most 10 articles."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "search_query": schema::string("Company name, ticker, BTC, or keywords"),
                "start_date": schema::date("Start of the range, YYYY-MM-DD (company news only)"),
                "end_date": schema::date("End of the range, YYYY-MM-DD (company news only)"),
            }),
            &["search_query"],
        )
    }
}
