//! Citation and response types.

use serde::{Deserialize, Serialize};

/// Where part of an answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Display text, e.g. "Python Basics - Lesson 2"
    pub text: String,

    /// External link, when one is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Citation {
    pub fn new(text: impl Into<String>, link: Option<String>) -> Self {
        Self {
            text: text.into(),
            link,
        }
    }
}

/// Citations gathered while answering one query.
///
/// Created empty per query and owned by that query alone, so concurrent
/// queries never see each other's sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationLog {
    entries: Vec<Citation>,
}

impl CitationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, citations: impl IntoIterator<Item = Citation>) {
        self.entries.extend(citations);
    }

    pub fn citations(&self) -> &[Citation] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drain the log, leaving it empty.
    pub fn take(&mut self) -> Vec<Citation> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Answer to a user question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    /// Final answer text
    pub answer: String,

    /// Sources cited while producing this answer
    pub sources: Vec<Citation>,
}
