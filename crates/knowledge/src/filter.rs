//! Metadata filters for collection queries.

use crate::collection::Metadata;
use serde_json::{json, Value};

/// Metadata field holding a chunk's course title.
pub const COURSE_TITLE_FIELD: &str = "course_title";

/// Metadata field holding a chunk's lesson number.
pub const LESSON_NUMBER_FIELD: &str = "lesson_number";

/// An equality or conjunctive metadata filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `{field: value}`
    Eq { field: String, value: Value },

    /// `{"$and": [...]}`
    And(Vec<Filter>),
}

impl Filter {
    /// Equality clause on a single field.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Build the content filter for a resolved course title and lesson.
    ///
    /// No constraints yields no filter, one yields a bare equality clause, and
    /// both yield an `$and` of exactly two clauses in (course, lesson) order.
    pub fn compose(course_title: Option<&str>, lesson_number: Option<u32>) -> Option<Self> {
        match (course_title, lesson_number) {
            (None, None) => None,
            (Some(title), None) => Some(Self::eq(COURSE_TITLE_FIELD, title)),
            (None, Some(lesson)) => Some(Self::eq(LESSON_NUMBER_FIELD, lesson)),
            (Some(title), Some(lesson)) => Some(Self::And(vec![
                Self::eq(COURSE_TITLE_FIELD, title),
                Self::eq(LESSON_NUMBER_FIELD, lesson),
            ])),
        }
    }

    /// Wire form sent to the retrieval backend.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Eq { field, value } => json!({ field.as_str(): value }),
            Self::And(clauses) => {
                json!({ "$and": clauses.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
        }
    }

    /// Evaluate the filter against a record's metadata.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            Self::Eq { field, value } => metadata.get(field) == Some(value),
            Self::And(clauses) => clauses.iter().all(|clause| clause.matches(metadata)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_without_constraints() {
        assert_eq!(Filter::compose(None, None), None);
    }

    #[test]
    fn test_compose_single_constraint() {
        let course = Filter::compose(Some("MCP"), None).unwrap();
        assert_eq!(course.to_json(), json!({"course_title": "MCP"}));

        let lesson = Filter::compose(None, Some(3)).unwrap();
        assert_eq!(lesson.to_json(), json!({"lesson_number": 3}));
    }

    #[test]
    fn test_compose_both_constraints_in_order() {
        let filter = Filter::compose(Some("MCP"), Some(5)).unwrap();
        assert_eq!(
            filter.to_json(),
            json!({"$and": [{"course_title": "MCP"}, {"lesson_number": 5}]})
        );
    }

    #[test]
    fn test_matches() {
        let mut metadata = Metadata::new();
        metadata.insert("course_title".to_string(), json!("MCP"));
        metadata.insert("lesson_number".to_string(), json!(5));

        assert!(Filter::compose(Some("MCP"), Some(5)).unwrap().matches(&metadata));
        assert!(!Filter::compose(Some("MCP"), Some(4)).unwrap().matches(&metadata));
        assert!(!Filter::compose(None, Some(5))
            .unwrap()
            .matches(&Metadata::new()));
    }
}
