//! Course knowledge and question answering.
//!
//! Provides the retrieval store over a course catalog and indexed content,
//! the search and outline capabilities built on it, and the tool-calling
//! orchestrator that answers questions with them.

pub mod collection;
pub mod corpus;
pub mod embeddings;
pub mod filter;
pub mod memory;
pub mod rag;
pub mod results;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use collection::{Metadata, QueryResult, Record, VectorCollection};
pub use corpus::{Corpus, SeedStats};
pub use filter::Filter;
pub use memory::InMemoryCollection;
pub use rag::{Citation, RagResponse, RagSystem, ToolManager};
pub use results::{RetrievalHit, RetrievalResultSet};
pub use store::{RetrievalStore, SearchQuery};
pub use types::{Course, CourseAnalytics, CourseChunk, Lesson};
