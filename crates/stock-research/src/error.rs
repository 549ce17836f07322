//! Error types for stock research operations

use thiserror::Error;

/// Stock research specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// The price provider returned no usable prices
    #[error("No price data found for {ticker}.")]
    NoPriceData { ticker: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Environment configuration could not be read
    #[error(transparent)]
    Env(#[from] agent_utils::ConfigError),

    /// Configuration values are inconsistent
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The crew could not be assembled or failed while running
    #[error(transparent)]
    Crew(#[from] agent_crew::CrewError),

    /// LLM provider setup failed
    #[error(transparent)]
    Llm(#[from] agent_llm::LLMError),
}

/// Result type alias for stock research operations
pub type Result<T> = std::result::Result<T, StockError>;

impl From<StockError> for agent_core::Error {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Crew(inner) => inner.into(),
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

impl From<agent_core::Error> for StockError {
    fn from(err: agent_core::Error) -> Self {
        StockError::Crew(agent_crew::CrewError::Agent(err))
    }
}
