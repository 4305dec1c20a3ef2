//! Content search capability.

use crate::rag::tools::{Capability, CapabilityDescriptor, ToolArgs, ToolOutput};
use crate::rag::types::Citation;
use crate::results::RetrievalResultSet;
use crate::store::{RetrievalStore, SearchQuery};
use std::sync::Arc;
use tutor_core::AppResult;

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Searches indexed course content, optionally within a course and lesson.
pub struct CourseSearchTool {
    store: Arc<RetrievalStore>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<RetrievalStore>) -> Self {
        Self { store }
    }

    /// Render hits as model-readable text and collect one citation per hit.
    async fn format_results(&self, results: &RetrievalResultSet) -> (String, Vec<Citation>) {
        let mut blocks = Vec::with_capacity(results.len());
        let mut citations = Vec::with_capacity(results.len());

        for hit in &results.hits {
            let course_title = hit.course_title().unwrap_or("unknown");
            let lesson_number = hit.lesson_number();

            let label = match lesson_number {
                Some(lesson) => format!("{} - Lesson {}", course_title, lesson),
                None => course_title.to_string(),
            };

            let link = match lesson_number {
                Some(lesson) => match self.store.lesson_link(course_title, lesson).await {
                    Ok(link) => link,
                    Err(e) => {
                        tracing::warn!("Lesson link lookup failed for '{}': {}", label, e);
                        None
                    }
                },
                None => None,
            };

            blocks.push(format!("[{}]\n{}", label, hit.document));
            citations.push(Citation::new(label, link));
        }

        (blocks.join("\n\n"), citations)
    }
}

/// Message for a successful search with no hits.
fn no_results_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = String::from("No relevant content found");
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

#[async_trait::async_trait]
impl Capability for CourseSearchTool {
    fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor::new(
            SEARCH_TOOL_NAME,
            "Search course materials with smart course name matching and lesson filtering",
        )
        .param("query", "string", "What to search for in the course content", true)
        .param(
            "course_name",
            "string",
            "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
            false,
        )
        .param(
            "lesson_number",
            "integer",
            "Specific lesson number to search within (e.g. 1, 2, 3)",
            false,
        )
        .minimum("lesson_number", 0)
    }

    async fn execute(&self, args: ToolArgs) -> AppResult<ToolOutput> {
        let course_name = args.opt_str("course_name");
        let lesson_number = args.opt_u32("lesson_number")?;

        let mut request = SearchQuery::new(args.str("query")?);
        if let Some(course) = course_name {
            request = request.in_course(course);
        }
        if let Some(lesson) = lesson_number {
            request = request.in_lesson(lesson);
        }

        let results = self.store.search(&request).await;

        if let Some(error) = &results.error {
            return Ok(ToolOutput::text(error.clone()));
        }

        if results.is_empty() {
            return Ok(ToolOutput::text(no_results_message(course_name, lesson_number)));
        }

        let (content, citations) = self.format_results(&results).await;
        tracing::debug!("Search returned {} hits", citations.len());
        Ok(ToolOutput::text(content).with_citations(citations))
    }
}
