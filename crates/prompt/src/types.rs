//! Prompt types for the Tutor assistant.
//!
//! This module defines the domain entities for system instructions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A system-instruction definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Context injection settings
    #[serde(default)]
    pub context: PromptContextConfig,

    /// Values bound into the template
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Template string with Handlebars syntax
    pub template: String,
}

/// Context injection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContextConfig {
    /// Append the prior-turn summary to the rendered instructions
    #[serde(rename = "includeHistory", default = "default_include_history")]
    pub include_history: bool,
}

fn default_include_history() -> bool {
    true
}

impl Default for PromptContextConfig {
    fn default() -> Self {
        Self {
            include_history: default_include_history(),
        }
    }
}
