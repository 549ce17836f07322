//! Shared utilities for the research crew
//!
//! Logging setup and the environment helpers configuration is read with.

pub mod config;
pub mod logging;

pub use config::{ConfigError, env_parse, env_var, load_dotenv, require_env};
pub use logging::init_tracing;
