//! Configuration for stock research runs

use crate::error::{Result, StockError};
use agent_llm::DEFAULT_MODEL;
use agent_llm::providers::OpenAIConfig;
use agent_utils::{env_parse, env_var, require_env};
use std::time::Duration;

/// Environment variable names
pub mod vars {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_API_BASE: &str = "OPENAI_API_BASE";
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
    pub const FINNHUB_API_KEY: &str = "FINNHUB_API_KEY";
    pub const FINNHUB_RATE_LIMIT: &str = "FINNHUB_RATE_LIMIT";
    pub const RESEARCH_TIMEOUT_SECS: &str = "RESEARCH_TIMEOUT_SECS";
    pub const RESEARCH_CACHE_TTL_SECS: &str = "RESEARCH_CACHE_TTL_SECS";
}

const DEFAULT_FINNHUB_RATE_LIMIT: u32 = 60;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Configuration for a research run
#[derive(Clone)]
pub struct ResearchConfig {
    /// OpenAI (or compatible) API key
    pub openai_api_key: String,

    /// Override for the chat-completions base URL
    pub openai_api_base: Option<String>,

    /// Model used by every agent and the manager
    pub model: String,

    /// Finnhub API key; without it risk falls back to defaults and news
    /// search is unavailable
    pub finnhub_api_key: Option<String>,

    /// Finnhub requests per minute
    pub finnhub_rate_limit: u32,

    /// Timeout for every HTTP request (LLM and data providers)
    pub request_timeout: Duration,

    /// How long tool results are reused within a run
    pub cache_ttl: Duration,
}

impl ResearchConfig {
    /// Create a new configuration builder
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Read the configuration from the environment
    ///
    /// Call [`agent_utils::load_dotenv`] first to pick up a `.env` file.
    /// `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder().openai_api_key(require_env(vars::OPENAI_API_KEY)?);

        if let Some(base) = env_var(vars::OPENAI_API_BASE) {
            builder = builder.openai_api_base(base);
        }
        if let Some(model) = env_var(vars::OPENAI_MODEL) {
            builder = builder.model(model);
        }
        if let Some(key) = env_var(vars::FINNHUB_API_KEY) {
            builder = builder.finnhub_api_key(key);
        }
        if let Some(limit) = env_parse::<u32>(vars::FINNHUB_RATE_LIMIT)? {
            builder = builder.finnhub_rate_limit(limit);
        }
        if let Some(secs) = env_parse::<u64>(vars::RESEARCH_TIMEOUT_SECS)? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>(vars::RESEARCH_CACHE_TTL_SECS)? {
            builder = builder.cache_ttl(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.openai_api_key.trim().is_empty() {
            return Err(StockError::ConfigError(
                "OpenAI API key must not be empty".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(StockError::ConfigError("model must not be empty".to_string()));
        }

        if self.finnhub_rate_limit == 0 {
            return Err(StockError::ConfigError(
                "finnhub_rate_limit must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(StockError::ConfigError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Settings for the OpenAI provider
    pub fn openai_config(&self) -> OpenAIConfig {
        let config = OpenAIConfig::new(self.openai_api_key.clone())
            .with_timeout(self.request_timeout.as_secs().max(1));

        match &self.openai_api_base {
            Some(base) => config.with_api_base(base.clone()),
            None => config,
        }
    }
}

impl std::fmt::Debug for ResearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchConfig")
            .field("openai_api_key", &"<redacted>")
            .field("openai_api_base", &self.openai_api_base)
            .field("model", &self.model)
            .field("finnhub_api_key", &self.finnhub_api_key.as_ref().map(|_| "<redacted>"))
            .field("finnhub_rate_limit", &self.finnhub_rate_limit)
            .field("request_timeout", &self.request_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

/// Builder for ResearchConfig
#[derive(Debug, Default)]
pub struct ResearchConfigBuilder {
    openai_api_key: Option<String>,
    openai_api_base: Option<String>,
    model: Option<String>,
    finnhub_api_key: Option<String>,
    finnhub_rate_limit: Option<u32>,
    request_timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
}

impl ResearchConfigBuilder {
    /// Set the OpenAI API key
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Set the chat-completions base URL
    pub fn openai_api_base(mut self, base: impl Into<String>) -> Self {
        self.openai_api_base = Some(base.into());
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the Finnhub API key
    pub fn finnhub_api_key(mut self, key: impl Into<String>) -> Self {
        self.finnhub_api_key = Some(key.into());
        self
    }

    /// Set the Finnhub rate limit (requests per minute)
    pub fn finnhub_rate_limit(mut self, limit: u32) -> Self {
        self.finnhub_rate_limit = Some(limit);
        self
    }

    /// Set the HTTP request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the tool result cache TTL
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ResearchConfig> {
        let config = ResearchConfig {
            openai_api_key: self.openai_api_key.ok_or_else(|| {
                StockError::Env(agent_utils::ConfigError::Missing(
                    vars::OPENAI_API_KEY.to_string(),
                ))
            })?,
            openai_api_base: self.openai_api_base,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            finnhub_api_key: self.finnhub_api_key,
            finnhub_rate_limit: self.finnhub_rate_limit.unwrap_or(DEFAULT_FINNHUB_RATE_LIMIT),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            cache_ttl: self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ResearchConfig::builder()
            .openai_api_key("sk-test")
            .build()
            .unwrap();

        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.finnhub_rate_limit, 60);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert!(config.finnhub_api_key.is_none());
        assert!(config.openai_api_base.is_none());
    }

    #[test]
    fn test_builder_custom() {
        let config = ResearchConfig::builder()
            .openai_api_key("sk-test")
            .openai_api_base("http://localhost:1234/v1")
            .model("gpt-4o-mini")
            .finnhub_api_key("fh-test")
            .finnhub_rate_limit(30)
            .request_timeout(Duration::from_secs(45))
            .cache_ttl(Duration::from_secs(0))
            .build()
            .unwrap();

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.finnhub_rate_limit, 30);

        let openai = config.openai_config();
        assert_eq!(openai.api_key, "sk-test");
        assert_eq!(openai.api_base, "http://localhost:1234/v1");
        assert_eq!(openai.timeout_secs, 45);
    }

    #[test]
    fn test_missing_api_key() {
        let err = ResearchConfig::builder().build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "OPENAI_API_KEY not found. Check your .env file"
        );
    }

    #[test]
    fn test_validation() {
        let err = ResearchConfig::builder()
            .openai_api_key("sk-test")
            .finnhub_rate_limit(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("finnhub_rate_limit"));

        let err = ResearchConfig::builder()
            .openai_api_key("sk-test")
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("request_timeout"));

        let err = ResearchConfig::builder()
            .openai_api_key("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = ResearchConfig::builder()
            .openai_api_key("sk-secret")
            .finnhub_api_key("fh-secret")
            .build()
            .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("fh-secret"));
        assert!(debug.contains("gpt-3.5-turbo"));
    }
}
