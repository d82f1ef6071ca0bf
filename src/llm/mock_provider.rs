// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock LLM provider for testing
//!
//! Provides a configurable mock implementation of the LlmProvider trait
//! that can be used in tests without a running Ollama server.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, StopReason, Usage,
};

/// A mock LLM provider for testing
#[derive(Clone)]
pub struct MockProvider {
    /// Provider name
    name: String,
    /// Configured responses
    responses: Arc<Mutex<Vec<MockResponse>>>,
    /// Call counter
    call_count: Arc<AtomicUsize>,
    /// Recorded requests
    recorded_requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Simulated model latency
    latency: Option<Duration>,
}

/// A pre-configured response for the mock provider
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Reply with this text
    Text(String),
    /// Fail with a model-client error
    Fail(MockFailure),
}

/// Failure modes the mock can simulate
#[derive(Clone, Debug)]
pub enum MockFailure {
    /// Connection refused or similar
    Network(String),
    /// Request timed out
    Timeout,
    /// Server answered with an error status
    Server { status: u16, message: String },
}

impl From<MockFailure> for ApiError {
    fn from(failure: MockFailure) -> Self {
        match failure {
            MockFailure::Network(message) => ApiError::Network(message),
            MockFailure::Timeout => ApiError::Timeout,
            MockFailure::Server { status, message } => ApiError::ServerError { status, message },
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider that always answers "Mock response"
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            responses: Arc::new(Mutex::new(vec![MockResponse::Text(
                "Mock response".to_string(),
            )])),
            call_count: Arc::new(AtomicUsize::new(0)),
            recorded_requests: Arc::new(Mutex::new(vec![])),
            latency: None,
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Mock provider lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Set the text response
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_script(vec![MockResponse::Text(text.into())])
    }

    /// Queue multiple responses (returned in order, the last one repeats)
    pub fn with_responses(self, texts: Vec<String>) -> Self {
        self.with_script(texts.into_iter().map(MockResponse::Text).collect())
    }

    /// Fail every call with the given failure
    pub fn with_failure(self, failure: MockFailure) -> Self {
        self.with_script(vec![MockResponse::Fail(failure)])
    }

    /// Replace the whole response script
    pub fn with_script(self, script: Vec<MockResponse>) -> Self {
        {
            let mut responses = Self::lock(&self.responses);
            *responses = script;
        }
        self
    }

    /// Sleep this long before answering each call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get all recorded requests
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        Self::lock(&self.recorded_requests).clone()
    }

    /// Get the last request made
    pub fn last_request(&self) -> Option<CompletionRequest> {
        Self::lock(&self.recorded_requests).last().cloned()
    }

    /// Get the next response
    fn next_response(&self) -> MockResponse {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        let responses = Self::lock(&self.responses);
        if responses.is_empty() {
            MockResponse::Text("Mock response".to_string())
        } else {
            responses[count.min(responses.len() - 1)].clone()
        }
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        Self::lock(&self.recorded_requests).push(request.clone());
        let response = self.next_response();

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match response {
            MockResponse::Text(text) => Ok(CompletionResponse {
                id: format!("mock-{}", uuid::Uuid::new_v4()),
                model: request.model,
                content: text,
                stop_reason: Some(StopReason::EndTurn),
                usage: Usage {
                    input_tokens: 10,
                    output_tokens: 20,
                },
            }),
            MockResponse::Fail(failure) => Err(ApiError::from(failure).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZenError;
    use crate::llm::message::Message;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new("mock-model", vec![Message::user(text)])
    }

    #[tokio::test]
    async fn test_default_response() {
        let provider = MockProvider::new();
        let response = provider.complete(request("hi")).await.unwrap();
        assert_eq!(response.content, "Mock response");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_queued_responses_repeat_last() {
        let provider =
            MockProvider::new().with_responses(vec!["one".to_string(), "two".to_string()]);

        assert_eq!(provider.complete(request("a")).await.unwrap().content, "one");
        assert_eq!(provider.complete(request("b")).await.unwrap().content, "two");
        assert_eq!(provider.complete(request("c")).await.unwrap().content, "two");
        assert_eq!(provider.recorded_requests().len(), 3);
        assert_eq!(
            provider.last_request().unwrap().messages[0].content,
            "c".to_string()
        );
    }

    #[tokio::test]
    async fn test_failure() {
        let provider = MockProvider::new().with_failure(MockFailure::Timeout);
        let err = provider.complete(request("hi")).await.unwrap_err();
        assert!(matches!(err, ZenError::Api(ApiError::Timeout)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let provider = MockProvider::new();
        let clone = provider.clone();
        clone.complete(request("hi")).await.unwrap();
        assert_eq!(provider.call_count(), 1);
    }
}
