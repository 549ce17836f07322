//! Yahoo Finance API client

use crate::api::PriceHistory;
use crate::dates::DateRange;
use crate::error::{Result, StockError};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Yahoo Finance API client
pub struct YahooFinanceClient {
    connector: yahoo::YahooConnector,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;
        Ok(Self { connector })
    }
}

impl std::fmt::Debug for YahooFinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooFinanceClient").finish_non_exhaustive()
    }
}

/// Midnight UTC at the start of `date`
fn day_start(date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| StockError::YahooFinanceError(format!("Invalid date {date}: {e}")))
}

/// Empty windows (weekends, holidays, unknown history) are `NoPriceData`
fn yahoo_error(ticker: &str, err: yahoo::YahooError) -> StockError {
    match err {
        yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult => StockError::NoPriceData {
            ticker: ticker.to_string(),
        },
        other => StockError::YahooFinanceError(other.to_string()),
    }
}

/// Price for one bar: the adjusted close, else the close
///
/// The connector reports a missing value as `0.0`; bars with neither price
/// are skipped.
fn bar_price(adjclose: f64, close: f64) -> Option<f64> {
    [adjclose, close]
        .into_iter()
        .find(|p| p.is_finite() && *p > 0.0)
}

#[async_trait]
impl PriceHistory for YahooFinanceClient {
    async fn adjusted_closes(&self, ticker: &str, range: DateRange) -> Result<Vec<f64>> {
        let start = day_start(range.start)?;
        let end = day_start(range.end_exclusive())?;

        let response = self
            .connector
            .get_quote_history(ticker, start, end)
            .await
            .map_err(|e| yahoo_error(ticker, e))?;

        let quotes = response.quotes().map_err(|e| yahoo_error(ticker, e))?;

        let closes: Vec<f64> = quotes
            .iter()
            .filter_map(|q| bar_price(q.adjclose, q.close))
            .collect();
        debug!(ticker, %range, bars = quotes.len(), prices = closes.len(), "Fetched price history");

        if closes.is_empty() {
            return Err(StockError::NoPriceData {
                ticker: ticker.to_string(),
            });
        }
        Ok(closes)
    }
}
