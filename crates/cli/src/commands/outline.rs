//! Outline command handler.

use clap::Args;
use serde_json::json;
use tutor_core::config::AppConfig;
use tutor_knowledge::rag::OUTLINE_TOOL_NAME;

/// Show a course outline
#[derive(Args, Debug)]
pub struct OutlineCommand {
    /// Course title, or part of it
    pub course: String,
}

impl OutlineCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing outline command for '{}'", self.course);

        let system = super::build_system(config).await?;
        let output = system
            .tool_manager()
            .dispatch(OUTLINE_TOOL_NAME, &json!({ "course_title": self.course }))
            .await?;

        println!("{}", output.content);
        Ok(())
    }
}
