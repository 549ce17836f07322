//! MiniJinja-based template implementation

use crate::{PromptError, Result};
use minijinja::{Environment, UndefinedBehavior};

/// A named prompt template backed by MiniJinja
///
/// The source is parsed once at construction so syntax errors surface early;
/// variables are checked at render time.
#[derive(Clone)]
pub struct JinjaTemplate {
    name: String,
    source: String,
}

impl JinjaTemplate {
    /// Create a template, validating its syntax
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        Environment::new()
            .template_from_str(&source)
            .map_err(|e| PromptError::TemplateParseFailed {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        Ok(Self { name, source })
    }

    /// Template name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw template source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template with variables
    ///
    /// Referencing a variable missing from `vars` fails with
    /// [`PromptError::RenderError`].
    pub fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let value = minijinja::Value::from_serialize(vars);

        env.render_str(&self.source, value)
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_template() {
        let template = JinjaTemplate::new("risk", "Assess the risk of {{ ticker }}.").unwrap();

        let result = template.render(&json!({ "ticker": "TSLA" })).unwrap();
        assert_eq!(result, "Assess the risk of TSLA.");
        assert_eq!(template.name(), "risk");
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let template = JinjaTemplate::new("risk", "Assess {{ ticker }}").unwrap();

        let err = template.render(&json!({ "symbol": "TSLA" })).unwrap_err();
        assert!(matches!(err, PromptError::RenderError { .. }));
    }

    #[test]
    fn test_invalid_template_error() {
        let err = JinjaTemplate::new("broken", "{{ unclosed").unwrap_err();
        assert!(matches!(err, PromptError::TemplateParseFailed { .. }));
    }

    #[test]
    fn test_loop_and_conditional() {
        let template = JinjaTemplate::new(
            "tools",
            "{% for t in tools %}- {{ t }}\n{% endfor %}{% if last %}done{% endif %}",
        )
        .unwrap();

        let result = template
            .render(&json!({ "tools": ["news_search", "risk_assessment"], "last": true }))
            .unwrap();
        assert_eq!(result, "- news_search\n- risk_assessment\ndone");
    }

    #[test]
    fn test_text_is_not_html_escaped() {
        let template = JinjaTemplate::new("t", "{{ company }}").unwrap();
        let result = template
            .render(&json!({ "company": "Johnson & Johnson <JNJ>" }))
            .unwrap();
        assert_eq!(result, "Johnson & Johnson <JNJ>");
    }
}
