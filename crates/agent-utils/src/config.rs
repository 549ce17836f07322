//! Environment configuration helpers

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors reading configuration from the environment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} not found. Check your .env file")]
    Missing(String),

    /// A variable is set but cannot be parsed
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Load `.env` from the working directory or its parents, if present
///
/// Variables already set in the process environment are not overridden.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "Loaded .env file");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load .env file");
            None
        }
    }
}

/// Read a variable; unset and blank values are both `None`
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a variable that must be set
pub fn require_env(key: &str) -> Result<String, ConfigError> {
    env_var(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

/// Read and parse an optional variable
pub fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key).map(|raw| parse_value(key, &raw)).transpose()
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET: &str = "AGENT_UTILS_TEST_SURELY_UNSET_VARIABLE";

    #[test]
    fn test_missing_variables() {
        assert_eq!(env_var(UNSET), None);
        assert_eq!(
            require_env(UNSET).unwrap_err().to_string(),
            format!("{UNSET} not found. Check your .env file")
        );
        assert_eq!(env_parse::<u64>(UNSET).unwrap(), None);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u64>("RESEARCH_TIMEOUT_SECS", "30").unwrap(), 30);

        let err = parse_value::<u32>("FINNHUB_RATE_LIMIT", "fast").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "FINNHUB_RATE_LIMIT"));
        assert!(err.to_string().starts_with("Invalid value 'fast' for FINNHUB_RATE_LIMIT"));
    }

    #[test]
    fn test_load_dotenv_never_panics() {
        let _ = load_dotenv();
    }
}
