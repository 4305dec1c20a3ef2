//! System-instruction rendering.

use crate::types::PromptDefinition;
use handlebars::Handlebars;
use tutor_core::{AppError, AppResult};

const TEMPLATE_NAME: &str = "system";

/// A compiled system-instruction template.
///
/// The template is registered once at construction; each query renders it
/// with the definition's variables and, optionally, a prior-turn summary.
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    definition: PromptDefinition,
    registry: Handlebars<'static>,
}

impl SystemPrompt {
    /// Compile a definition.
    ///
    /// # Errors
    /// Returns `AppError::Prompt` when the template does not parse.
    pub fn new(definition: PromptDefinition) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Plain text, not HTML
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(TEMPLATE_NAME, &definition.template)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        Ok(Self {
            definition,
            registry,
        })
    }

    /// Compile the built-in definition.
    pub fn default_prompt() -> AppResult<Self> {
        Self::new(crate::defaults::default_definition())
    }

    /// Identifier of the underlying definition.
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Render the instructions for one query.
    ///
    /// When `history` is given and the definition includes history, the
    /// summary is appended after a `Previous conversation:` marker.
    pub fn render(&self, history: Option<&str>) -> AppResult<String> {
        let mut rendered = self
            .registry
            .render(TEMPLATE_NAME, &self.definition.variables)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        if let Some(history) = history {
            if self.definition.context.include_history {
                rendered.push_str("\n\nPrevious conversation:\n");
                rendered.push_str(history);
            } else {
                tracing::debug!("Prompt {} excludes history, dropping it", self.definition.id);
            }
        }

        Ok(rendered)
    }
}
