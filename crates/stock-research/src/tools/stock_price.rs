//! Tool for summarizing a ticker's price history

use crate::api::PriceHistory;
use crate::dates::DateRange;
use crate::error::Result;
use crate::summary::StockSummary;
use agent_core::{Context, Result as AgentResult};
use agent_crew::Prefetch;
use agent_llm::tools::schema;
use agent_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Fetch adjusted closes for a ticker and reduce them to a summary
///
/// Dates go through [`DateRange::resolve`], so missing or malformed dates
/// mean the trailing year.
pub async fn fetch_stock_price(
    prices: &dyn PriceHistory,
    ticker: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<StockSummary> {
    let ticker = ticker.trim().to_uppercase();
    let range = DateRange::resolve(start_date, end_date);

    let closes = prices.adjusted_closes(&ticker, range).await?;
    let summary = StockSummary::from_prices(&ticker, &closes)?;

    info!(
        ticker = %summary.ticker,
        %range,
        trend = %summary.trend,
        "Stock price summary ready"
    );
    Ok(summary)
}

/// `fetch_stock_prices`: price summary for a date range
pub struct StockPriceTool {
    prices: Arc<dyn PriceHistory>,
}

#[derive(Debug, Deserialize)]
struct StockPriceParams {
    ticker: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

impl StockPriceTool {
    /// Create a new stock price tool
    pub fn new(prices: Arc<dyn PriceHistory>) -> Self {
        Self { prices }
    }

    async fn summarize(
        &self,
        ticker: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> AgentResult<StockSummary> {
        fetch_stock_price(self.prices.as_ref(), ticker, start_date, end_date)
            .await
            .map_err(|e| {
                warn!(ticker, error = %e, "Error fetching stock data");
                agent_core::Error::tool(
                    self.name(),
                    format!("Error fetching stock data for {ticker}: {e}"),
                )
            })
    }
}

#[async_trait]
impl Tool for StockPriceTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: StockPriceParams = serde_json::from_value(params).map_err(|e| {
            agent_core::Error::tool(self.name(), format!("Invalid parameters: {e}"))
        })?;

        let summary = self
            .summarize(
                &params.ticker,
                params.start_date.as_deref(),
                params.end_date.as_deref(),
            )
            .await?;

        serde_json::to_value(summary)
            .map_err(|e| agent_core::Error::ProcessingFailed(e.to_string()))
    }

    fn name(&self) -> &str {
        "fetch_stock_prices"
    }

    fn description(&self) -> &str {
        "Fetch stock prices from a specific date range for a company. Returns the first, \
         last, highest and lowest adjusted close and the trend (up, down or stable)."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Stock ticker symbol (e.g., AAPL)"),
                "start_date": schema::date("Start of the range, YYYY-MM-DD (default: one year ago)"),
                "end_date": schema::date("End of the range, YYYY-MM-DD (default: today)"),
            }),
            &["ticker"],
        )
    }
}

/// The price task starts with the summary for the crew's inputs
#[async_trait]
impl Prefetch for StockPriceTool {
    async fn fetch(&self, context: &Context) -> AgentResult<String> {
        let ticker = context.require_input(agent_core::context::keys::TICKER)?;
        let summary = self
            .summarize(ticker, context.start_date(), context.end_date())
            .await?;

        let body = serde_json::to_string_pretty(&summary)
            .map_err(|e| agent_core::Error::ProcessingFailed(e.to_string()))?;
        Ok(format!("Stock price summary for {ticker}:\n{body}"))
    }
}
