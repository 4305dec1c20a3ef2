//! Error types for the Tutor assistant.
//!
//! This module defines a unified error enum that covers every failure the
//! assistant can observe: configuration, I/O, the model boundary, tool
//! dispatch, and the retrieval backend.

use thiserror::Error;

/// Unified error type for the Tutor assistant.
///
/// All fallible functions return `Result<T, AppError>`. The orchestrator
/// branches on the variant kind rather than catching broad faults, so each
/// boundary gets its own variant.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network or service failure on the model boundary
    #[error("Model call failed: {0}")]
    ModelCall(String),

    /// A capability was requested by a name nobody registered
    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    /// Arguments did not satisfy the capability's input schema
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    /// A capability raised while executing
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// The vector backend failed to answer a query
    #[error("Retrieval backend error: {0}")]
    RetrievalBackend(String),

    /// A fuzzy entity reference matched nothing in the catalog
    #[error("Entity not resolved: {0}")]
    EntityNotResolved(String),

    /// Knowledge store errors that are not backend failures
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Wrap any displayable failure as a tool execution error.
    pub fn tool_execution(tool: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::ToolExecution {
            tool: tool.into(),
            message: message.to_string(),
        }
    }

    /// True for failures the model should see as ordinary tool content.
    pub fn is_recoverable_tool_error(&self) -> bool {
        matches!(
            self,
            AppError::ToolNotFound(_) | AppError::InvalidArguments { .. }
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
