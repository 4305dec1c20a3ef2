//! Tutor Core Library
//!
//! This crate provides the foundational utilities for the Tutor assistant:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, AssistantConfig, RetrievalConfig, ToolFailurePolicy};
pub use error::{AppError, AppResult};
