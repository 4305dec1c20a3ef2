//! Pre-chunked course corpus loading.
//!
//! A corpus file lists courses with their lesson tables and already-chunked
//! text. Seeding writes each course to the catalog and its chunks to the
//! content collection, skipping courses the catalog already knows.

use crate::store::RetrievalStore;
use crate::types::{Course, CourseChunk};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tutor_core::{AppError, AppResult};

/// A corpus file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub courses: Vec<CorpusCourse>,
}

/// One course entry with its text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusCourse {
    #[serde(flatten)]
    pub course: Course,

    #[serde(default)]
    pub chunks: Vec<CorpusChunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,

    pub content: String,
}

/// Counts from a seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedStats {
    pub courses_added: usize,
    pub chunks_added: usize,
    pub courses_skipped: usize,
}

impl CorpusCourse {
    /// Chunks numbered in file order.
    pub fn course_chunks(&self) -> Vec<CourseChunk> {
        self.chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| CourseChunk {
                content: chunk.content.clone(),
                course_title: self.course.title.clone(),
                lesson_number: chunk.lesson_number,
                chunk_index: index as u32,
            })
            .collect()
    }
}

impl Corpus {
    /// Load a corpus from YAML.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read corpus at {:?}: {}", path, e))
        })?;

        let corpus = Self::from_yaml(&content).map_err(|e| {
            AppError::Knowledge(format!("Failed to parse corpus at {:?}: {}", path, e))
        })?;

        tracing::debug!("Loaded corpus with {} courses from {:?}", corpus.courses.len(), path);
        Ok(corpus)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let corpus: Self = serde_yaml::from_str(content)?;

        let mut seen = HashSet::new();
        for entry in &corpus.courses {
            if entry.course.title.trim().is_empty() {
                return Err(AppError::Knowledge("Course title cannot be empty".to_string()));
            }
            if !seen.insert(entry.course.title.as_str()) {
                return Err(AppError::Knowledge(format!(
                    "Duplicate course title: '{}'",
                    entry.course.title
                )));
            }
        }

        Ok(corpus)
    }

    /// Write catalog and content records for courses not yet in the store.
    pub async fn seed(&self, store: &RetrievalStore) -> AppResult<SeedStats> {
        let existing: HashSet<String> = store.existing_course_titles().await?.into_iter().collect();
        let mut stats = SeedStats::default();

        for entry in &self.courses {
            if existing.contains(&entry.course.title) {
                tracing::debug!("Course already indexed: {}", entry.course.title);
                stats.courses_skipped += 1;
                continue;
            }

            let chunks = entry.course_chunks();
            store.add_course_metadata(&entry.course).await?;
            store.add_course_content(&chunks).await?;

            stats.courses_added += 1;
            stats.chunks_added += chunks.len();
        }

        tracing::info!(
            "Seeded {} courses ({} chunks, {} already present)",
            stats.courses_added,
            stats.chunks_added,
            stats.courses_skipped
        );
        Ok(stats)
    }
}
