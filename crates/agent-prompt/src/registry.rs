//! Prompt template registry

use crate::{JinjaTemplate, PromptError, Result};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A thread-safe registry of named templates
///
/// Registering a template under an existing name replaces it.
#[derive(Default)]
pub struct PromptRegistry {
    templates: RwLock<HashMap<String, Arc<JinjaTemplate>>>,
}

impl PromptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template
    pub fn register(&self, template: JinjaTemplate) {
        let mut templates = self
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        templates.insert(template.name().to_string(), Arc::new(template));
    }

    /// Parse and register a template from source
    pub fn register_source(&self, name: &str, source: &str) -> Result<()> {
        self.register(JinjaTemplate::new(name, source)?);
        Ok(())
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<Arc<JinjaTemplate>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Check if a template is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Render a registered template
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| PromptError::TemplateNotRegistered(name.to_string()))?;
        template.render(vars)
    }

    /// All registered template names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("templates", &self.list())
            .finish()
    }
}
