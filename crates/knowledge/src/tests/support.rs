//! Test doubles shared by the scenario tests.

use crate::collection::{Metadata, QueryResult, Record, VectorCollection};
use crate::filter::Filter;
use crate::rag::tools::{Capability, CapabilityDescriptor, ToolArgs, ToolOutput};
use crate::rag::types::Citation;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use tutor_core::{AppError, AppResult};
use tutor_llm::{
    ContentBlock, LlmClient, MessageContent, MessageRequest, MessageResponse, StopReason,
};

/// Model client that replays a fixed script and records every request.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<AppResult<MessageResponse>>>,
    requests: Mutex<Vec<MessageRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<AppResult<MessageResponse>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: Vec<MessageResponse>) -> Self {
        Self::new(replies.into_iter().map(Ok).collect())
    }

    pub fn requests(&self) -> Vec<MessageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn create_message(&self, request: &MessageRequest) -> AppResult<MessageResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::ModelCall("script exhausted".to_string())))
    }
}

/// Model client that picks its reply from the request itself, so concurrent
/// queries get consistent answers whatever order their calls arrive in.
///
/// A first turn mentioning `keyword` asks for one search on it; a turn
/// carrying tool results gets `answer`; anything else gets `small_talk`.
pub struct RoutingClient {
    keyword: String,
    answer: String,
    small_talk: String,
}

impl RoutingClient {
    pub fn new(keyword: &str, answer: &str, small_talk: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            answer: answer.to_string(),
            small_talk: small_talk.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for RoutingClient {
    fn provider_name(&self) -> &str {
        "routing"
    }

    async fn create_message(&self, request: &MessageRequest) -> AppResult<MessageResponse> {
        // Let the other query run between calls
        tokio::task::yield_now().await;

        let carries_results = matches!(
            request.messages.last().map(|m| &m.content),
            Some(MessageContent::Blocks(blocks))
                if blocks.iter().any(|b| matches!(b, ContentBlock::ToolResult { .. }))
        );
        if carries_results {
            return Ok(MessageResponse::text(self.answer.as_str()));
        }

        let asks_keyword = matches!(
            request.messages.first().map(|m| &m.content),
            Some(MessageContent::Text(text)) if text.contains(self.keyword.as_str())
        );
        if asks_keyword {
            return Ok(tool_reply(
                None,
                &[(
                    "toolu_1",
                    "search_course_content",
                    json!({"query": self.keyword.as_str()}),
                )],
            ));
        }

        Ok(MessageResponse::text(self.small_talk.as_str()))
    }
}

/// A reply requesting the given tools, in order.
pub fn tool_reply(text: Option<&str>, calls: &[(&str, &str, Value)]) -> MessageResponse {
    let mut content = Vec::new();
    if let Some(text) = text {
        content.push(ContentBlock::text(text));
    }
    for (id, name, input) in calls {
        content.push(ContentBlock::tool_use(*id, *name, input.clone()));
    }
    MessageResponse::new(content, StopReason::ToolUse)
}

/// One recorded collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub text: String,
    pub filter: Option<Value>,
    pub n_results: usize,
}

/// Collection that records queries and answers with a canned result.
pub struct RecordingCollection {
    name: String,
    response: Result<QueryResult, String>,
    queries: Mutex<Vec<RecordedQuery>>,
}

impl RecordingCollection {
    pub fn answering(name: &str, result: QueryResult) -> Self {
        Self {
            name: name.to_string(),
            response: Ok(result),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty(name: &str) -> Self {
        Self::answering(name, QueryResult::default())
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            response: Err(message.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Catalog whose nearest match is always `title`.
    pub fn catalog_resolving_to(title: &str) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("title".to_string(), json!(title));
        Self::answering(
            "catalog",
            QueryResult {
                ids: vec![title.to_string()],
                documents: vec![title.to_string()],
                metadata: vec![metadata],
                distances: vec![0.1],
            },
        )
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl VectorCollection for RecordingCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(
        &self,
        text: &str,
        filter: Option<&Filter>,
        n_results: usize,
    ) -> AppResult<QueryResult> {
        self.queries.lock().unwrap().push(RecordedQuery {
            text: text.to_string(),
            filter: filter.map(Filter::to_json),
            n_results,
        });
        self.response
            .clone()
            .map_err(AppError::RetrievalBackend)
    }

    async fn upsert(&self, _records: Vec<Record>) -> AppResult<()> {
        Ok(())
    }

    async fn get_all(&self) -> AppResult<Vec<Record>> {
        Ok(Vec::new())
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(0)
    }
}

/// Query result with one hit per `(course, lesson, document)`.
pub fn hits(entries: &[(&str, Option<u32>, &str)]) -> QueryResult {
    let mut result = QueryResult::default();
    for (i, (course, lesson, document)) in entries.iter().enumerate() {
        let mut metadata = Metadata::new();
        metadata.insert("course_title".to_string(), json!(course));
        if let Some(lesson) = lesson {
            metadata.insert("lesson_number".to_string(), json!(lesson));
        }
        result.ids.push(format!("hit_{}", i));
        result.documents.push(document.to_string());
        result.metadata.push(metadata);
        result.distances.push(0.1 * (i + 1) as f32);
    }
    result
}

/// Capability returning fixed text and one citation, recording each call.
pub struct StaticTool {
    pub name: &'static str,
    pub content: &'static str,
    pub calls: Mutex<Vec<Value>>,
}

impl StaticTool {
    pub fn new(name: &'static str, content: &'static str) -> Self {
        Self {
            name,
            content,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Capability for StaticTool {
    fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor::new(self.name, "Returns fixed text").param(
            "query",
            "string",
            "Anything",
            false,
        )
    }

    async fn execute(&self, args: ToolArgs) -> AppResult<ToolOutput> {
        let query = args.opt_str("query").unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(json!({ "query": query }));
        Ok(ToolOutput::text(self.content)
            .with_citations(vec![Citation::new(format!("{}: {}", self.name, query), None)]))
    }
}

/// Capability that always fails.
pub struct FailingTool;

#[async_trait::async_trait]
impl Capability for FailingTool {
    fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor::new("broken", "Always fails")
    }

    async fn execute(&self, _args: ToolArgs) -> AppResult<ToolOutput> {
        Err(AppError::RetrievalBackend("Database connection failed".to_string()))
    }
}

/// System instructions with a recognizable body.
pub fn test_prompt() -> tutor_prompt::SystemPrompt {
    let mut definition = tutor_prompt::default_definition();
    definition.template = "You answer course questions.".to_string();
    tutor_prompt::SystemPrompt::new(definition).unwrap()
}

/// Orchestrator over a scripted client.
pub fn orchestrator(
    client: &std::sync::Arc<ScriptedClient>,
    settings: crate::rag::OrchestratorSettings,
) -> crate::rag::ConversationOrchestrator {
    let client: std::sync::Arc<dyn LlmClient> = client.clone();
    crate::rag::ConversationOrchestrator::new(client, settings, test_prompt())
}
