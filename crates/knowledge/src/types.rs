//! Course catalog type definitions.

use serde::{Deserialize, Serialize};

/// A course with its ordered lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Display title, unique within the catalog
    pub title: String,

    /// External course page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_link: Option<String>,

    /// Instructor name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,

    /// Lessons in ascending number order
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Look up a lesson by number.
    pub fn lesson(&self, lesson_number: u32) -> Option<&Lesson> {
        self.lessons
            .iter()
            .find(|lesson| lesson.lesson_number == lesson_number)
    }
}

/// One lesson inside a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: u32,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_link: Option<String>,
}

/// An indexed piece of course text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    pub content: String,

    pub course_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,

    pub chunk_index: u32,
}

/// Catalog-wide statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}
