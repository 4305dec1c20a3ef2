//! Ask command handler.

use clap::Args;
use tutor_core::config::AppConfig;

/// Ask a question about the course materials
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Earlier conversation to include as context
    #[arg(long)]
    pub history: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let system = super::build_system(config).await?;
        let response = system.query(&self.question, self.history.as_deref()).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(());
        }

        println!("{}", response.answer);
        if !response.sources.is_empty() {
            println!();
            println!("Sources:");
            for source in &response.sources {
                match &source.link {
                    Some(link) => println!("- {} ({})", source.text, link),
                    None => println!("- {}", source.text),
                }
            }
        }

        Ok(())
    }
}
