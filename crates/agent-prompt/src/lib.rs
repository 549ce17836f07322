//! Prompt templates for the research crew
//!
//! Templates use Jinja2 syntax (`{{ variable }}`) rendered by MiniJinja.
//! Rendering is strict: a variable the caller did not supply is an error,
//! never an empty string.
//!
//! ```
//! use agent_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry.register(JinjaTemplate::new("price", "Retrieve the price of {{ ticker }}").unwrap());
//!
//! let prompt = registry.render("price", &json!({ "ticker": "AAPL" })).unwrap();
//! assert_eq!(prompt, "Retrieve the price of AAPL");
//!
//! assert!(registry.render("price", &json!({})).is_err());
//! ```
//!
//! [`CrewPrompts`] bundles the fixed prompt pieces agents and tasks are
//! assembled from.

mod crew;
mod error;
mod jinja;
mod registry;

pub use crew::{CrewPrompts, ManagerPersona, ToolSummary};
pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
pub use registry::PromptRegistry;
