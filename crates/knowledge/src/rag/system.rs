//! Question-answering facade over the store, tools and orchestrator.

use crate::corpus::{Corpus, SeedStats};
use crate::memory::InMemoryCollection;
use crate::rag::manager::ToolManager;
use crate::rag::orchestrator::{ConversationOrchestrator, OrchestratorSettings};
use crate::rag::outline_tool::CourseOutlineTool;
use crate::rag::search_tool::CourseSearchTool;
use crate::rag::tools::ToolExecutor;
use crate::rag::types::RagResponse;
use crate::store::RetrievalStore;
use crate::types::CourseAnalytics;
use std::path::Path;
use std::sync::Arc;
use tutor_core::{AppConfig, AppResult};
use tutor_llm::LlmClient;
use tutor_prompt::{load_or_default, SystemPrompt};

/// Catalog collection name.
pub const CATALOG_COLLECTION: &str = "course_catalog";

/// Content collection name.
pub const CONTENT_COLLECTION: &str = "course_content";

/// Answers questions about the indexed courses.
pub struct RagSystem {
    store: Arc<RetrievalStore>,
    tools: ToolManager,
    orchestrator: ConversationOrchestrator,
}

impl RagSystem {
    /// Wire a system over an existing store, registering both course tools.
    pub fn new(
        store: Arc<RetrievalStore>,
        client: Arc<dyn LlmClient>,
        settings: OrchestratorSettings,
        system_prompt: SystemPrompt,
    ) -> Self {
        let mut tools = ToolManager::new();
        tools.register(Arc::new(CourseSearchTool::new(Arc::clone(&store))));
        tools.register(Arc::new(CourseOutlineTool::new(Arc::clone(&store))));

        Self {
            store,
            tools,
            orchestrator: ConversationOrchestrator::new(client, settings, system_prompt),
        }
    }

    /// Build an in-memory system from configuration.
    pub fn from_config(config: &AppConfig, client: Arc<dyn LlmClient>) -> AppResult<Self> {
        let dim = config.retrieval.embedding_dim;
        let store = RetrievalStore::new(
            Arc::new(InMemoryCollection::with_trigrams(CATALOG_COLLECTION, dim)),
            Arc::new(InMemoryCollection::with_trigrams(CONTENT_COLLECTION, dim)),
            config.retrieval.max_results,
        );

        let definition = load_or_default(&config.workspace, config.assistant.prompt_id.as_deref())?;
        let system_prompt = SystemPrompt::new(definition)?;

        tracing::debug!(
            "RAG system configured (prompt: {}, max_results: {}, max_tool_rounds: {})",
            system_prompt.id(),
            config.retrieval.max_results,
            config.assistant.max_tool_rounds
        );

        Ok(Self::new(
            Arc::new(store),
            client,
            OrchestratorSettings::from_config(config),
            system_prompt,
        ))
    }

    /// Load a corpus file and index any courses not yet present.
    pub async fn load_corpus(&self, path: &Path) -> AppResult<SeedStats> {
        Corpus::load(path)?.seed(&self.store).await
    }

    /// Answer a question.
    ///
    /// Sources are those cited while answering this question only.
    pub async fn query(&self, query: &str, history: Option<&str>) -> RagResponse {
        tracing::info!("Answering query: {}", query);

        let prompt = format!("Answer this question about course materials: {}", query);
        let schemas = self.tools.descriptors();
        let executor: &dyn ToolExecutor = &self.tools;

        let generation = self
            .orchestrator
            .generate(&prompt, history, Some(schemas.as_slice()), Some(executor))
            .await;

        tracing::info!(
            "Answered in {} rounds ({} model calls, {} sources)",
            generation.rounds,
            generation.model_calls,
            generation.citations.len()
        );

        RagResponse {
            answer: generation.answer,
            sources: generation.citations,
        }
    }

    pub async fn course_analytics(&self) -> AppResult<CourseAnalytics> {
        Ok(CourseAnalytics {
            total_courses: self.store.course_count().await?,
            course_titles: self.store.existing_course_titles().await?,
        })
    }

    pub fn store(&self) -> &Arc<RetrievalStore> {
        &self.store
    }

    pub fn tool_manager(&self) -> &ToolManager {
        &self.tools
    }
}
