//! Capability contract.
//!
//! A capability is a named, schema-described operation the model may request.
//! Arguments are validated against the capability's JSON Schema before
//! `execute` runs, and results carry their citations back to the caller
//! instead of storing them on the capability.

use crate::rag::types::Citation;
use serde_json::{json, Map, Value};
use tutor_core::{AppError, AppResult};
use tutor_llm::ToolSchema;

/// Name, description and input schema of a capability.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl CapabilityDescriptor {
    /// Start a descriptor with an empty object schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        }
    }

    /// Declare a parameter.
    pub fn param(mut self, name: &str, kind: &str, description: &str, required: bool) -> Self {
        if let Some(properties) = self.input_schema["properties"].as_object_mut() {
            properties.insert(
                name.to_string(),
                json!({"type": kind, "description": description}),
            );
        }
        if required {
            if let Some(list) = self.input_schema["required"].as_array_mut() {
                list.push(json!(name));
            }
        }
        self
    }

    /// Set an inclusive lower bound on a declared numeric parameter.
    pub fn minimum(mut self, name: &str, minimum: i64) -> Self {
        if let Some(property) = self.input_schema["properties"]
            .get_mut(name)
            .and_then(Value::as_object_mut)
        {
            property.insert("minimum".to_string(), json!(minimum));
        }
        self
    }

    /// Schema advertised to the model.
    pub fn to_schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

/// Content returned to the model plus the citations it produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub content: String,
    pub citations: Vec<Citation>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Content the model should read as a failed call.
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            citations: Vec::new(),
            is_error: true,
        }
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }
}

/// Typed view over a validated argument map.
#[derive(Debug, Clone)]
pub struct ToolArgs {
    tool: String,
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(tool: impl Into<String>, args: &Value) -> AppResult<Self> {
        let tool = tool.into();
        match args {
            Value::Object(values) => Ok(Self {
                tool,
                values: values.clone(),
            }),
            Value::Null => Ok(Self {
                tool,
                values: Map::new(),
            }),
            other => Err(AppError::InvalidArguments {
                tool,
                message: format!("expected an object, got {}", other),
            }),
        }
    }

    fn invalid(&self, message: String) -> AppError {
        AppError::InvalidArguments {
            tool: self.tool.clone(),
            message,
        }
    }

    /// A required string.
    pub fn str(&self, key: &str) -> AppResult<&str> {
        self.opt_str(key)
            .ok_or_else(|| self.invalid(format!("missing string argument '{}'", key)))
    }

    pub fn opt_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// An optional non-negative integer that fits in `u32`.
    pub fn opt_u32(&self, key: &str) -> AppResult<Option<u32>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(format!("'{}' must be a non-negative integer", key))),
        }
    }
}

/// Validate arguments against a descriptor's schema.
pub fn validate_against_schema(descriptor: &CapabilityDescriptor, args: &Value) -> AppResult<()> {
    let validator = jsonschema::Validator::new(&descriptor.input_schema).map_err(|e| {
        AppError::tool_execution(&descriptor.name, format!("invalid tool schema: {}", e))
    })?;

    if validator.is_valid(args) {
        return Ok(());
    }

    let errors: Vec<String> = validator.iter_errors(args).map(|e| e.to_string()).collect();
    Err(AppError::InvalidArguments {
        tool: descriptor.name.clone(),
        message: errors.join("; "),
    })
}

/// A capability the model can invoke.
#[async_trait::async_trait]
pub trait Capability: Send + Sync {
    fn descriptor(&self) -> CapabilityDescriptor;

    fn validate_args(&self, args: &Value) -> AppResult<()> {
        validate_against_schema(&self.descriptor(), args)
    }

    /// Run the capability.
    ///
    /// # Errors
    /// Any error aborts the current round under the default failure policy.
    async fn execute(&self, args: ToolArgs) -> AppResult<ToolOutput>;
}

/// Executes tool requests by name.
#[async_trait::async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute_tool(&self, name: &str, args: &Value) -> AppResult<ToolOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> CapabilityDescriptor {
        CapabilityDescriptor::new("search_course_content", "Search course materials")
            .param("query", "string", "What to search for", true)
            .param("lesson_number", "integer", "Lesson to search within", false)
    }

    #[test]
    fn test_descriptor_schema_shape() {
        let schema = descriptor().to_schema();
        assert_eq!(schema.input_schema["type"], "object");
        assert_eq!(schema.input_schema["required"], json!(["query"]));
        assert_eq!(
            schema.input_schema["properties"]["lesson_number"]["type"],
            "integer"
        );
    }

    #[test]
    fn test_validation() {
        let descriptor = descriptor();
        assert!(validate_against_schema(&descriptor, &json!({"query": "loops"})).is_ok());

        let missing = validate_against_schema(&descriptor, &json!({}));
        assert!(matches!(missing, Err(AppError::InvalidArguments { .. })));

        let wrong_type = validate_against_schema(
            &descriptor,
            &json!({"query": "loops", "lesson_number": "three"}),
        );
        assert!(matches!(wrong_type, Err(AppError::InvalidArguments { .. })));
    }

    #[test]
    fn test_tool_args_accessors() {
        let args = ToolArgs::new("t", &json!({"query": "loops", "lesson_number": 3})).unwrap();
        assert_eq!(args.str("query").unwrap(), "loops");
        assert_eq!(args.opt_str("course_name"), None);
        assert_eq!(args.opt_u32("lesson_number").unwrap(), Some(3));
        assert_eq!(args.opt_u32("missing").unwrap(), None);
        assert!(args.str("course_name").is_err());

        let negative = ToolArgs::new("t", &json!({"lesson_number": -1})).unwrap();
        assert!(negative.opt_u32("lesson_number").is_err());

        assert!(ToolArgs::new("t", &json!([1, 2])).is_err());
    }
}
