//! Price series reduction

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};

/// Direction of the price over the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    /// Compare the last price of a window with the first
    pub fn between(first: f64, last: f64) -> Self {
        if last > first {
            Self::Up
        } else if last < first {
            Self::Down
        } else {
            Self::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five-number summary of a ticker's adjusted closes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    pub ticker: String,
    pub start_price: f64,
    pub end_price: f64,
    pub high: f64,
    pub low: f64,
    pub trend: Trend,
}

impl StockSummary {
    /// Reduce a chronological price series
    ///
    /// NaN and infinite values are skipped. A series with nothing left is a
    /// [`StockError::NoPriceData`].
    ///
    /// ```
    /// use stock_research::{StockSummary, Trend};
    ///
    /// let summary = StockSummary::from_prices("AAPL", &[180.0, 195.5, 172.1, 190.0]).unwrap();
    /// assert_eq!(summary.high, 195.5);
    /// assert_eq!(summary.low, 172.1);
    /// assert_eq!(summary.trend, Trend::Up);
    /// ```
    pub fn from_prices(ticker: &str, prices: &[f64]) -> Result<Self> {
        let mut finite = prices.iter().copied().filter(|p| p.is_finite());

        let first = finite.next().ok_or_else(|| StockError::NoPriceData {
            ticker: ticker.to_string(),
        })?;

        let (last, high, low) = finite.fold((first, first, first), |(_, high, low), p| {
            (p, high.max(p), low.min(p))
        });

        Ok(Self {
            ticker: ticker.to_string(),
            start_price: first,
            end_price: last,
            high,
            low,
            trend: Trend::between(first, last),
        })
    }

    /// Change from the first to the last price, in percent
    pub fn change_percent(&self) -> f64 {
        if self.start_price == 0.0 {
            return 0.0;
        }
        (self.end_price - self.start_price) / self.start_price * 100.0
    }
}

impl std::fmt::Display for StockSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {:.2} -> {:.2} ({:+.2}%), high {:.2}, low {:.2}, trend {}",
            self.ticker,
            self.start_price,
            self.end_price,
            self.change_percent(),
            self.high,
            self.low,
            self.trend
        )
    }
}
