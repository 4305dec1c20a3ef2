//! Name-keyed capability registry.

use crate::rag::tools::{Capability, ToolArgs, ToolExecutor, ToolOutput};
use serde_json::Value;
use std::sync::Arc;
use tutor_core::{AppError, AppResult};
use tutor_llm::ToolSchema;

/// Ordered registry of capabilities.
///
/// Registration order is the order schemas are offered to the model.
/// Registering a name twice replaces the earlier capability in place.
#[derive(Default)]
pub struct ToolManager {
    tools: Vec<Arc<dyn Capability>>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        let name = capability.descriptor().name;
        match self
            .tools
            .iter_mut()
            .find(|existing| existing.descriptor().name == name)
        {
            Some(existing) => {
                tracing::debug!("Replacing registered tool: {}", name);
                *existing = capability;
            }
            None => {
                tracing::debug!("Registered tool: {}", name);
                self.tools.push(capability);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.tools.iter().find(|tool| tool.descriptor().name == name)
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.descriptor().name).collect()
    }

    /// Schemas for every registered tool, in registration order.
    pub fn descriptors(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|tool| tool.descriptor().to_schema())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate and run a tool by name.
    ///
    /// An unknown name or invalid arguments come back as tool content the
    /// model can react to. Only failures inside the capability are errors.
    pub async fn dispatch(&self, name: &str, args: &Value) -> AppResult<ToolOutput> {
        let Some(tool) = self.get(name) else {
            tracing::warn!("Model requested unknown tool: {}", name);
            return Ok(ToolOutput::text(AppError::ToolNotFound(name.to_string()).to_string()));
        };

        if let Err(e) = tool.validate_args(args) {
            tracing::warn!("Rejected arguments for {}: {}", name, e);
            return match e {
                AppError::InvalidArguments { .. } => Ok(ToolOutput::error(e.to_string())),
                other => Err(other),
            };
        }

        let args = match ToolArgs::new(name, args) {
            Ok(args) => args,
            Err(e) => return Ok(ToolOutput::error(e.to_string())),
        };

        tracing::debug!("Dispatching tool: {}", name);
        match tool.execute(args).await {
            Ok(output) => Ok(output),
            // Argument checks the schema cannot express still reach the model
            Err(e @ AppError::InvalidArguments { .. }) => {
                tracing::warn!("Rejected arguments for {}: {}", name, e);
                Ok(ToolOutput::error(e.to_string()))
            }
            Err(e @ AppError::ToolExecution { .. }) => Err(e),
            Err(other) => Err(AppError::tool_execution(name, other)),
        }
    }
}

#[async_trait::async_trait]
impl ToolExecutor for ToolManager {
    async fn execute_tool(&self, name: &str, args: &Value) -> AppResult<ToolOutput> {
        self.dispatch(name, args).await
    }
}
