//! Tool-calling question answering.
//!
//! Capabilities wrap the retrieval store, the tool manager dispatches them by
//! name, and the orchestrator drives the model through bounded rounds.

pub mod manager;
pub mod orchestrator;
pub mod outline_tool;
pub mod search_tool;
pub mod system;
pub mod tools;
pub mod types;

pub use manager::ToolManager;
pub use orchestrator::{ConversationOrchestrator, ConversationState, Generation, OrchestratorSettings};
pub use outline_tool::{CourseOutlineTool, OUTLINE_TOOL_NAME};
pub use search_tool::{CourseSearchTool, SEARCH_TOOL_NAME};
pub use system::RagSystem;
pub use tools::{Capability, CapabilityDescriptor, ToolArgs, ToolExecutor, ToolOutput};
pub use types::{Citation, CitationLog, RagResponse};
