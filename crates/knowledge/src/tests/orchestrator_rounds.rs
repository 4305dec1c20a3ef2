//! Round-loop behaviour of the conversation orchestrator.

use super::support::{orchestrator, tool_reply, FailingTool, ScriptedClient, StaticTool};
use crate::rag::orchestrator::{
    EMPTY_RESPONSE_FALLBACK, MODEL_FAILURE_FALLBACK, NO_EXECUTOR_MESSAGE, TOOL_FAILURE_FALLBACK,
};
use crate::rag::tools::ToolExecutor;
use crate::rag::{OrchestratorSettings, ToolManager};
use serde_json::json;
use std::sync::Arc;
use tutor_core::{AppError, ToolFailurePolicy};
use tutor_llm::{ContentBlock, MessageContent, MessageResponse, Role, StopReason, ToolSchema};

fn settings() -> OrchestratorSettings {
    OrchestratorSettings::new("test-model")
}

fn registry() -> (ToolManager, Arc<StaticTool>, Arc<StaticTool>) {
    let search = Arc::new(StaticTool::new("search_course_content", "Loops repeat code."));
    let outline = Arc::new(StaticTool::new("get_course_outline", "Lesson 1: Intro"));
    let mut manager = ToolManager::new();
    manager.register(search.clone());
    manager.register(outline.clone());
    (manager, search, outline)
}

fn executor(manager: &ToolManager) -> Option<&dyn ToolExecutor> {
    Some(manager)
}

fn tool_result_blocks(content: &MessageContent) -> Vec<ContentBlock> {
    match content {
        MessageContent::Blocks(blocks) => blocks.clone(),
        MessageContent::Text(text) => panic!("Expected blocks, got text: {}", text),
    }
}

#[tokio::test]
async fn test_direct_answer_makes_one_call() {
    let client = Arc::new(ScriptedClient::replying(vec![MessageResponse::text(
        "Python is a programming language.",
    )]));
    let (manager, search, _) = registry();
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings())
        .generate("What is Python?", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(generation.answer, "Python is a programming language.");
    assert_eq!(client.call_count(), 1);
    assert_eq!(generation.model_calls, 1);
    assert_eq!(search.call_count(), 0);

    let request = &client.requests()[0];
    assert_eq!(request.model, "test-model");
    assert_eq!(request.temperature, Some(0.0));
    assert_eq!(request.max_tokens, 800);
    assert_eq!(request.tools.as_ref().unwrap().len(), 2);
    assert_eq!(
        serde_json::to_value(&request.tool_choice).unwrap(),
        json!({"type": "auto"})
    );
    assert_eq!(request.system.as_deref(), Some("You answer course questions."));
}

#[tokio::test]
async fn test_two_tool_rounds_then_final_answer() {
    let client = Arc::new(ScriptedClient::replying(vec![
        tool_reply(None, &[("t1", "get_course_outline", json!({"query": "course X"}))]),
        tool_reply(None, &[("t2", "search_course_content", json!({"query": "lesson 4"}))]),
        MessageResponse::text("Lesson 4 covers functions."),
    ]));
    let (manager, search, outline) = registry();
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings())
        .generate("Compare", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(generation.answer, "Lesson 4 covers functions.");
    assert_eq!(client.call_count(), 3);
    assert_eq!(outline.call_count() + search.call_count(), 2);
    assert_eq!(generation.rounds, 2);

    let requests = client.requests();
    // Round two sees: query, assistant tool request, tool results
    assert_eq!(requests[1].messages.len(), 3);
    assert_eq!(requests[1].messages[1].role, Role::Assistant);
    let results = tool_result_blocks(&requests[1].messages[2].content);
    assert_eq!(results, vec![ContentBlock::tool_result("t1", "Lesson 1: Intro")]);

    // The limit was reached, so the final call withholds schemas
    assert!(!requests[2].has_tools());
    assert!(requests[2].tool_choice.is_none());
    assert_eq!(requests[2].messages.len(), 5);

    assert_eq!(generation.citations.len(), 2);
}

#[tokio::test]
async fn test_tool_free_reply_inside_limit() {
    let client = Arc::new(ScriptedClient::replying(vec![
        tool_reply(None, &[("t1", "search_course_content", json!({"query": "a"}))]),
        tool_reply(None, &[("t2", "search_course_content", json!({"query": "b"}))]),
        MessageResponse::text("Done."),
    ]));
    let (manager, search, _) = registry();
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings().with_max_tool_rounds(3))
        .generate("q", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(generation.answer, "Done.");
    assert_eq!(client.call_count(), 3);
    assert_eq!(search.call_count(), 2);
    // Still inside the limit, so the third call carried schemas
    assert!(client.requests()[2].has_tools());
}

#[tokio::test]
async fn test_persistent_tool_requests_are_bounded() {
    let replies = (0..10)
        .map(|i| {
            tool_reply(
                None,
                &[(format!("t{}", i).as_str(), "search_course_content", json!({"query": "again"}))],
            )
        })
        .collect();
    let client = Arc::new(ScriptedClient::replying(replies));
    let (manager, search, _) = registry();
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings())
        .generate("q", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    // Two tool rounds plus one tool-free call
    assert_eq!(client.call_count(), 3);
    assert_eq!(search.call_count(), 2);
    assert!(generation.rounds <= 2);
    // The final reply still only asked for tools, so there is no text
    assert_eq!(
        generation.answer,
        "I was unable to generate a complete response. Please try again."
    );
}

#[tokio::test]
async fn test_empty_final_reply_falls_back() {
    let client = Arc::new(ScriptedClient::replying(vec![
        tool_reply(None, &[("t1", "search_course_content", json!({}))]),
        MessageResponse::new(vec![], StopReason::EndTurn),
    ]));
    let (manager, _, _) = registry();
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings().with_max_tool_rounds(1))
        .generate("q", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(client.call_count(), 2);
    assert!(!client.requests()[1].has_tools());
    assert_eq!(generation.answer, EMPTY_RESPONSE_FALLBACK);
}

#[tokio::test]
async fn test_zero_rounds_makes_one_tool_free_call() {
    let client = Arc::new(ScriptedClient::replying(vec![MessageResponse::text("Hi.")]));
    let (manager, _, _) = registry();
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings().with_max_tool_rounds(0))
        .generate("q", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(generation.answer, "Hi.");
    assert_eq!(client.call_count(), 1);
    assert!(!client.requests()[0].has_tools());
}

#[tokio::test]
async fn test_model_failure_returns_apology() {
    let client = Arc::new(ScriptedClient::new(vec![Err(AppError::ModelCall(
        "connection reset".to_string(),
    ))]));

    let generation = orchestrator(&client, settings())
        .generate("q", None, None, None)
        .await;

    assert_eq!(generation.answer, MODEL_FAILURE_FALLBACK);
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_final_call_failure_returns_apology() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(tool_reply(None, &[("t1", "search_course_content", json!({}))])),
        Err(AppError::ModelCall("overloaded".to_string())),
    ]));
    let (manager, _, _) = registry();
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings().with_max_tool_rounds(1))
        .generate("q", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(generation.answer, MODEL_FAILURE_FALLBACK);
}

#[tokio::test]
async fn test_tool_failure_aborts_round_and_discards_siblings() {
    let client = Arc::new(ScriptedClient::replying(vec![tool_reply(
        None,
        &[
            ("t1", "search_course_content", json!({"query": "a"})),
            ("t2", "broken", json!({})),
        ],
    )]));
    let (mut manager, search, _) = registry();
    manager.register(Arc::new(FailingTool));
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings())
        .generate("q", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(generation.answer, TOOL_FAILURE_FALLBACK);
    assert_eq!(client.call_count(), 1);
    // The sibling ran, but its citation was never committed
    assert_eq!(search.call_count(), 1);
    assert!(generation.citations.is_empty());
}

#[tokio::test]
async fn test_tool_failure_returns_last_text() {
    let client = Arc::new(ScriptedClient::replying(vec![tool_reply(
        Some("Let me check that course."),
        &[("t1", "broken", json!({}))],
    )]));
    let mut manager = ToolManager::new();
    manager.register(Arc::new(FailingTool));
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings())
        .generate("q", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(generation.answer, "Let me check that course.");
}

#[tokio::test]
async fn test_tool_failure_ignores_earlier_round_text() {
    let client = Arc::new(ScriptedClient::replying(vec![
        tool_reply(
            Some("Let me look up the outline."),
            &[("t1", "search_course_content", json!({"query": "outline"}))],
        ),
        tool_reply(None, &[("t2", "broken", json!({}))]),
    ]));
    let (mut manager, _, _) = registry();
    manager.register(Arc::new(FailingTool));
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings())
        .generate("q", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(client.call_count(), 2);
    assert_eq!(generation.answer, TOOL_FAILURE_FALLBACK);
    // Round one committed before round two aborted
    assert_eq!(generation.citations.len(), 1);
}

#[tokio::test]
async fn test_best_effort_feeds_failure_forward() {
    let client = Arc::new(ScriptedClient::replying(vec![
        tool_reply(
            None,
            &[
                ("t1", "search_course_content", json!({"query": "a"})),
                ("t2", "broken", json!({})),
            ],
        ),
        MessageResponse::text("Partial answer."),
    ]));
    let (mut manager, _, _) = registry();
    manager.register(Arc::new(FailingTool));
    let schemas = manager.descriptors();

    let generation = orchestrator(
        &client,
        settings().with_failure_policy(ToolFailurePolicy::BestEffort),
    )
    .generate("q", None, Some(schemas.as_slice()), executor(&manager))
    .await;

    assert_eq!(generation.answer, "Partial answer.");
    assert_eq!(generation.citations.len(), 1);

    let requests = client.requests();
    let results = tool_result_blocks(&requests[1].messages[2].content);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], ContentBlock::tool_result("t1", "Loops repeat code."));
    match &results[1] {
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            assert_eq!(tool_use_id, "t2");
            assert!(content.starts_with("Tool execution failed:"));
            assert!(content.contains("Database connection failed"));
            assert!(is_error);
        }
        other => panic!("Expected tool result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_executor_yields_error_results() {
    let client = Arc::new(ScriptedClient::replying(vec![
        tool_reply(None, &[("t1", "search_course_content", json!({}))]),
        MessageResponse::text("I could not search."),
    ]));
    let schemas = vec![ToolSchema {
        name: "search_course_content".to_string(),
        description: "Search".to_string(),
        input_schema: json!({"type": "object", "properties": {}, "required": []}),
    }];

    let generation = orchestrator(&client, settings())
        .generate("q", None, Some(schemas.as_slice()), None)
        .await;

    assert_eq!(generation.answer, "I could not search.");
    let results = tool_result_blocks(&client.requests()[1].messages[2].content);
    assert_eq!(results, vec![ContentBlock::tool_error("t1", NO_EXECUTOR_MESSAGE)]);
}

#[tokio::test]
async fn test_unknown_tool_is_fed_back() {
    let client = Arc::new(ScriptedClient::replying(vec![
        tool_reply(None, &[("t1", "nonexistent_tool", json!({}))]),
        MessageResponse::text("Sorry."),
    ]));
    let (manager, _, _) = registry();
    let schemas = manager.descriptors();

    let generation = orchestrator(&client, settings())
        .generate("q", None, Some(schemas.as_slice()), executor(&manager))
        .await;

    assert_eq!(generation.answer, "Sorry.");
    let results = tool_result_blocks(&client.requests()[1].messages[2].content);
    assert_eq!(
        results,
        vec![ContentBlock::tool_result("t1", "Tool 'nonexistent_tool' not found")]
    );
}

#[tokio::test]
async fn test_empty_schema_list_attaches_nothing() {
    let client = Arc::new(ScriptedClient::replying(vec![MessageResponse::text("Hi.")]));

    orchestrator(&client, settings())
        .generate("q", None, Some(&[][..]), None)
        .await;

    let request = &client.requests()[0];
    assert!(request.tools.is_none());
    assert!(request.tool_choice.is_none());
}

#[tokio::test]
async fn test_history_is_appended_to_system() {
    let client = Arc::new(ScriptedClient::replying(vec![MessageResponse::text("Hi.")]));

    orchestrator(&client, settings())
        .generate("q", Some("User: hi\nAssistant: hello"), None, None)
        .await;

    assert_eq!(
        client.requests()[0].system.as_deref(),
        Some("You answer course questions.\n\nPrevious conversation:\nUser: hi\nAssistant: hello")
    );
}
