//! Typed retrieval results.

use crate::collection::{Metadata, QueryResult};
use crate::filter::{COURSE_TITLE_FIELD, LESSON_NUMBER_FIELD};

/// One retrieved document.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalHit {
    pub document: String,
    pub metadata: Metadata,
    pub distance: f32,
}

impl RetrievalHit {
    /// Course title recorded with the document.
    pub fn course_title(&self) -> Option<&str> {
        self.metadata
            .get(COURSE_TITLE_FIELD)
            .and_then(|value| value.as_str())
    }

    /// Lesson number recorded with the document.
    pub fn lesson_number(&self) -> Option<u32> {
        self.metadata
            .get(LESSON_NUMBER_FIELD)
            .and_then(|value| value.as_u64())
            .and_then(|n| u32::try_from(n).ok())
    }
}

/// Ordered hits, or an explicit error.
///
/// An empty set and an errored set are distinct: check `error` before
/// treating an empty set as "no matches".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResultSet {
    pub hits: Vec<RetrievalHit>,
    pub error: Option<String>,
}

impl RetrievalResultSet {
    /// Convert a raw backend result.
    pub fn from_query(result: QueryResult) -> Self {
        let hits = result
            .documents
            .into_iter()
            .zip(result.metadata)
            .zip(result.distances)
            .map(|((document, metadata), distance)| RetrievalHit {
                document,
                metadata,
                distance,
            })
            .collect();

        Self { hits, error: None }
    }

    /// A successful set with no hits.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A failed set carrying a user-facing message.
    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// True when there are zero hits, whether or not `error` is set.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}
