// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use zenbot::error::{ApiError, ZenError};
use zenbot::llm::message::{Message, Role};
use zenbot::llm::mock_provider::{MockFailure, MockProvider};
use zenbot::llm::provider::{CompletionRequest, LlmProvider, Usage};
use zenbot::llm::retry::is_retryable;

#[test]
fn test_message_user_creation() {
    let message = Message::user("Hello, world!");
    assert_eq!(message.role, Role::User);
    assert_eq!(message.text(), "Hello, world!");
}

#[test]
fn test_message_assistant_creation() {
    let message = Message::assistant("I can help with that.");
    assert_eq!(message.role, Role::Assistant);
    assert_eq!(message.text(), "I can help with that.");
}

#[test]
fn test_role_serializes_lowercase() {
    let json = serde_json::to_value(Message::system("persona")).unwrap();
    assert_eq!(json["role"], "system");
    assert_eq!(json["content"], "persona");
}

#[test]
fn test_completion_request_builder() {
    let request = CompletionRequest::new(
        "gemma3",
        vec![
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("how are you?"),
        ],
    )
    .with_system("be nice")
    .with_temperature(0.3)
    .with_max_tokens(100);

    assert_eq!(request.model, "gemma3");
    assert_eq!(request.system.as_deref(), Some("be nice"));
    assert!((request.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(request.max_tokens, 100);
    assert_eq!(request.history().len(), 2);
    assert_eq!(request.last_user_message().unwrap().text(), "how are you?");
}

#[test]
fn test_usage_total() {
    let usage = Usage {
        input_tokens: 12,
        output_tokens: 30,
    };
    assert_eq!(usage.total_tokens(), 42);
}

#[tokio::test]
async fn test_mock_provider_through_trait_object() {
    let provider: Box<dyn LlmProvider> = Box::new(MockProvider::new().with_response("pong"));
    let response = provider
        .complete(CompletionRequest::new("m", vec![Message::user("ping")]))
        .await
        .unwrap();

    assert_eq!(provider.name(), "mock");
    assert_eq!(response.content, "pong");
}

#[tokio::test]
async fn test_mock_failures_map_to_api_errors() {
    let provider = MockProvider::new().with_failure(MockFailure::Server {
        status: 502,
        message: "bad gateway".to_string(),
    });
    let err = provider
        .complete(CompletionRequest::new("m", vec![Message::user("hi")]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ZenError::Api(ApiError::ServerError { status: 502, .. })
    ));
    assert!(is_retryable(&err));
}
