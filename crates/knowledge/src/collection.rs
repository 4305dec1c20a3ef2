//! Vector collection abstraction.
//!
//! Defines a trait for provider-agnostic semantic collections. The retrieval
//! store talks to two of them: a catalog of courses and the indexed content.

use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use tutor_core::AppResult;

/// Per-record metadata map.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub document: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Record {
    pub fn new(id: impl Into<String>, document: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            document: document.into(),
            metadata,
        }
    }
}

/// Raw query output: parallel lists ordered by ascending distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadata: Vec<Metadata>,
    pub distances: Vec<f32>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Trait for vector collection backends.
///
/// Implementations must support:
/// - Nearest-neighbour queries with an optional metadata filter
/// - Upserting records by id
/// - Listing and counting records
#[async_trait::async_trait]
pub trait VectorCollection: Send + Sync {
    /// Collection name, for logging.
    fn name(&self) -> &str;

    /// Return at most `n_results` records nearest to `text`.
    ///
    /// # Errors
    /// Returns `AppError::RetrievalBackend` when the backend fails.
    async fn query(
        &self,
        text: &str,
        filter: Option<&Filter>,
        n_results: usize,
    ) -> AppResult<QueryResult>;

    /// Insert or replace records by id.
    async fn upsert(&self, records: Vec<Record>) -> AppResult<()>;

    /// All records in insertion order.
    async fn get_all(&self) -> AppResult<Vec<Record>>;

    /// Number of stored records.
    async fn count(&self) -> AppResult<usize>;
}
