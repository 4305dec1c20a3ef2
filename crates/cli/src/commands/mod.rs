//! Command handlers.

mod ask;
mod courses;
mod outline;

pub use ask::AskCommand;
pub use courses::CoursesCommand;
pub use outline::OutlineCommand;

use anyhow::Context;
use tutor_core::config::AppConfig;
use tutor_knowledge::RagSystem;
use tutor_llm::create_client_from_config;

/// Build the assistant from configuration and index the corpus, if present.
pub(crate) async fn build_system(config: &AppConfig) -> anyhow::Result<RagSystem> {
    config.validate().context("Invalid configuration")?;

    let client = create_client_from_config(config).context("Failed to create model client")?;

    let system = RagSystem::from_config(config, client)?;

    let corpus = config.corpus_path();
    if corpus.exists() {
        let stats = system
            .load_corpus(&corpus)
            .await
            .with_context(|| format!("Failed to load corpus from {:?}", corpus))?;
        tracing::info!(
            "Indexed {} courses ({} chunks)",
            stats.courses_added,
            stats.chunks_added
        );
    } else {
        tracing::warn!("No corpus found at {:?}; the catalog is empty", corpus);
    }

    Ok(system)
}
