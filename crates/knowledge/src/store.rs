//! Retrieval over the course catalog and indexed content.
//!
//! The store owns two collections. The catalog holds one record per course,
//! keyed by title, and is used to resolve fuzzy course names and to answer
//! outline and link lookups. The content collection holds the indexed chunks
//! that searches run against.

use crate::collection::{Metadata, Record, VectorCollection};
use crate::filter::{Filter, COURSE_TITLE_FIELD, LESSON_NUMBER_FIELD};
use crate::results::RetrievalResultSet;
use crate::types::{Course, CourseChunk, Lesson};
use serde_json::{json, Value};
use std::sync::Arc;
use tutor_core::{AppError, AppResult};

/// A content search request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub course_name: Option<String>,
    pub lesson_number: Option<u32>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Restrict to a course, by possibly fuzzy name.
    pub fn in_course(mut self, course_name: impl Into<String>) -> Self {
        self.course_name = Some(course_name.into());
        self
    }

    pub fn in_lesson(mut self, lesson_number: u32) -> Self {
        self.lesson_number = Some(lesson_number);
        self
    }

    /// Override the store's configured result count.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Semantic search with course-name resolution.
pub struct RetrievalStore {
    catalog: Arc<dyn VectorCollection>,
    content: Arc<dyn VectorCollection>,
    max_results: usize,
}

impl RetrievalStore {
    /// Create a store over existing collections.
    ///
    /// `max_results` is used whenever a search gives no explicit limit. Zero is
    /// honoured as-is.
    pub fn new(
        catalog: Arc<dyn VectorCollection>,
        content: Arc<dyn VectorCollection>,
        max_results: usize,
    ) -> Self {
        Self {
            catalog,
            content,
            max_results,
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Run a content search.
    ///
    /// Never fails: backend errors and unresolved course names come back as an
    /// errored result set.
    pub async fn search(&self, request: &SearchQuery) -> RetrievalResultSet {
        let course_title = match request.course_name.as_deref() {
            Some(name) => match self.resolve_course_name(name).await {
                Ok(title) => Some(title),
                Err(e) => return RetrievalResultSet::errored(unresolved_message(name, &e)),
            },
            None => None,
        };

        let filter = Filter::compose(course_title.as_deref(), request.lesson_number);
        let n_results = request.limit.unwrap_or(self.max_results);

        tracing::debug!(
            "Searching '{}' (filter: {:?}, n_results: {})",
            request.query,
            filter.as_ref().map(Filter::to_json),
            n_results
        );

        match self
            .content
            .query(&request.query, filter.as_ref(), n_results)
            .await
        {
            Ok(result) => RetrievalResultSet::from_query(result),
            Err(e) => {
                tracing::warn!("Content query failed: {}", e);
                RetrievalResultSet::errored(format!("Search error: {}", backend_cause(&e)))
            }
        }
    }

    /// Map a possibly partial course name to its canonical title.
    ///
    /// # Errors
    /// `AppError::EntityNotResolved` when the catalog has no match, or the
    /// backend error when the lookup itself fails.
    pub async fn resolve_course_name(&self, name: &str) -> AppResult<String> {
        let result = self.catalog.query(name, None, 1).await?;
        let title = result
            .metadata
            .first()
            .and_then(|metadata| metadata.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string);

        tracing::debug!("Resolved course name '{}' to {:?}", name, title);
        title.ok_or_else(|| AppError::EntityNotResolved(name.to_string()))
    }

    /// Add a course to the catalog, replacing any course with the same title.
    pub async fn add_course_metadata(&self, course: &Course) -> AppResult<()> {
        let mut metadata = Metadata::new();
        metadata.insert("title".to_string(), json!(course.title));
        metadata.insert("lessons".to_string(), serde_json::to_value(&course.lessons)?);
        metadata.insert("lesson_count".to_string(), json!(course.lessons.len()));
        if let Some(instructor) = &course.instructor {
            metadata.insert("instructor".to_string(), json!(instructor));
        }
        if let Some(link) = &course.course_link {
            metadata.insert("course_link".to_string(), json!(link));
        }

        self.catalog
            .upsert(vec![Record::new(&course.title, &course.title, metadata)])
            .await
    }

    /// Index course chunks into the content collection.
    pub async fn add_course_content(&self, chunks: &[CourseChunk]) -> AppResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let records = chunks
            .iter()
            .map(|chunk| {
                let mut metadata = Metadata::new();
                metadata.insert(COURSE_TITLE_FIELD.to_string(), json!(chunk.course_title));
                metadata.insert("chunk_index".to_string(), json!(chunk.chunk_index));
                if let Some(lesson) = chunk.lesson_number {
                    metadata.insert(LESSON_NUMBER_FIELD.to_string(), json!(lesson));
                }

                let id = format!(
                    "{}_{}",
                    chunk.course_title.replace(' ', "_"),
                    chunk.chunk_index
                );
                Record::new(id, &chunk.content, metadata)
            })
            .collect();

        self.content.upsert(records).await
    }

    /// Titles of every course in the catalog.
    pub async fn existing_course_titles(&self) -> AppResult<Vec<String>> {
        Ok(self
            .catalog
            .get_all()
            .await?
            .into_iter()
            .map(|record| record.id)
            .collect())
    }

    pub async fn course_count(&self) -> AppResult<usize> {
        self.catalog.count().await
    }

    /// Every course in the catalog, in insertion order.
    pub async fn all_courses(&self) -> AppResult<Vec<Course>> {
        self.catalog
            .get_all()
            .await?
            .iter()
            .map(course_from_record)
            .collect()
    }

    /// A course by exact title.
    pub async fn get_course(&self, title: &str) -> AppResult<Option<Course>> {
        self.catalog
            .get_all()
            .await?
            .iter()
            .find(|record| record.id == title)
            .map(course_from_record)
            .transpose()
    }

    pub async fn course_link(&self, title: &str) -> AppResult<Option<String>> {
        Ok(self
            .get_course(title)
            .await?
            .and_then(|course| course.course_link))
    }

    pub async fn lesson_link(&self, title: &str, lesson_number: u32) -> AppResult<Option<String>> {
        Ok(self.get_course(title).await?.and_then(|course| {
            course
                .lesson(lesson_number)
                .and_then(|lesson| lesson.lesson_link.clone())
        }))
    }
}

/// Text reported for a course name that did not resolve.
///
/// Lookup failures are reported the same way as a missing match.
pub(crate) fn unresolved_message(name: &str, error: &AppError) -> String {
    if !matches!(error, AppError::EntityNotResolved(_)) {
        tracing::warn!("Course name resolution failed for '{}': {}", name, error);
    }
    course_not_found(name)
}

pub(crate) fn course_not_found(name: &str) -> String {
    format!("No course found matching '{}'", name)
}

/// Message carried by a backend failure, without the variant prefix.
fn backend_cause(error: &AppError) -> String {
    match error {
        AppError::RetrievalBackend(message) => message.clone(),
        other => other.to_string(),
    }
}

fn course_from_record(record: &Record) -> AppResult<Course> {
    let text = |key: &str| {
        record
            .metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let lessons: Vec<Lesson> = match record.metadata.get("lessons") {
        Some(value) => serde_json::from_value(value.clone())?,
        None => Vec::new(),
    };

    Ok(Course {
        title: text("title").unwrap_or_else(|| record.id.clone()),
        course_link: text("course_link"),
        instructor: text("instructor"),
        lessons,
    })
}
