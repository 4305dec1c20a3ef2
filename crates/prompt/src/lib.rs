//! System instructions for the Tutor assistant.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Handlebars template rendering
//! - Prior-conversation injection

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::SystemPrompt;
pub use defaults::{default_definition, DEFAULT_PROMPT_ID};
pub use loader::{list_prompts, load_or_default, load_prompt};
pub use types::{PromptContextConfig, PromptDefinition};
