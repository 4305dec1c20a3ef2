//! Course outline capability.

use crate::rag::tools::{Capability, CapabilityDescriptor, ToolArgs, ToolOutput};
use crate::store::{course_not_found, unresolved_message, RetrievalStore};
use crate::types::Course;
use std::fmt::Write;
use std::sync::Arc;
use tutor_core::AppResult;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

/// Lists a course's title, link and numbered lessons.
///
/// Outlines are not quotable sources, so no citations are recorded.
pub struct CourseOutlineTool {
    store: Arc<RetrievalStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<RetrievalStore>) -> Self {
        Self { store }
    }
}

fn format_outline(course: &Course) -> String {
    let mut out = format!("Course Title: {}", course.title);
    if let Some(link) = &course.course_link {
        let _ = write!(out, "\nCourse Link: {}", link);
    }
    if let Some(instructor) = &course.instructor {
        let _ = write!(out, "\nInstructor: {}", instructor);
    }

    if course.lessons.is_empty() {
        out.push_str("\n\nNo lessons listed.");
        return out;
    }

    let _ = write!(out, "\n\nLessons ({} total):", course.lessons.len());
    for lesson in &course.lessons {
        let _ = write!(out, "\nLesson {}: {}", lesson.lesson_number, lesson.title);
    }
    out
}

#[async_trait::async_trait]
impl Capability for CourseOutlineTool {
    fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor::new(
            OUTLINE_TOOL_NAME,
            "Get the complete outline of a course: title, link and every lesson with its number",
        )
        .param(
            "course_title",
            "string",
            "Course title or part of it (e.g. 'MCP', 'Computer Use')",
            true,
        )
    }

    async fn execute(&self, args: ToolArgs) -> AppResult<ToolOutput> {
        let name = args.str("course_title")?;
        let title = match self.store.resolve_course_name(name).await {
            Ok(title) => title,
            Err(e) => return Ok(ToolOutput::text(unresolved_message(name, &e))),
        };

        match self.store.get_course(&title).await? {
            Some(course) => Ok(ToolOutput::text(format_outline(&course))),
            None => Ok(ToolOutput::text(course_not_found(name))),
        }
    }
}
