//! Stock research crew
//!
//! Researches one listed company over a date window with four role agents:
//!
//! - a price analyst with a Yahoo Finance price-history tool
//! - a news analyst with a Finnhub news search tool
//! - a risk analyst with a beta-driven risk assessment tool
//! - a writer who turns the three reports into a newsletter
//!
//! The crew runs hierarchically by default: a manager agent delegates each
//! task to the co-worker suited for it.
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_llm::providers::OpenAIProvider;
//! use stock_research::api::YahooFinanceClient;
//! use stock_research::{DataSources, ResearchConfig, ResearchCrew, ResearchForm};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ResearchConfig::from_env()?;
//!     let provider = Arc::new(OpenAIProvider::with_config(config.openai_config())?);
//!     let sources = DataSources::new(Arc::new(YahooFinanceClient::new()?));
//!
//!     let today = chrono::Local::now().date_naive();
//!     let request = ResearchForm::new(today).company("Apple Inc.").validate(today)?;
//!
//!     let crew = ResearchCrew::builder(provider, sources).model(config.model).build()?;
//!     println!("{}", crew.run(&request).await?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod companies;
pub mod config;
pub mod crew;
pub mod dates;
pub mod error;
pub mod form;
pub mod risk;
pub mod summary;
pub mod tools;

pub use config::{ResearchConfig, ResearchConfigBuilder};
pub use crew::{DataSources, ResearchCrew, ResearchCrewBuilder};
pub use dates::DateRange;
pub use error::{Result, StockError};
pub use form::{FormError, ResearchForm, ResearchRequest};
pub use risk::{RiskAssessment, RiskLevel, RiskRecord};
pub use summary::{StockSummary, Trend};
