// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Ollama local model provider implementation
//!
//! Implements the LlmProvider trait for Ollama local models via the
//! non-streaming `/api/chat` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OllamaConfig;
use crate::error::{ApiError, Result, ZenError};
use crate::llm::message::{Message, Role};
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider, StopReason, Usage};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const NOT_RUNNING: &str = "Ollama is not running. Start the Ollama app or run 'ollama serve'";

/// Ollama local model provider
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default base URL (http://localhost:11434)
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_URL)
    }

    /// Create with a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, DEFAULT_TIMEOUT)
    }

    /// Create with a custom base URL and request timeout
    pub fn with_options(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!(
                    target: "zenbot.llm.ollama",
                    %error,
                    "failed to build HTTP client with timeout; using defaults"
                );
                Client::new()
            });

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Create from the Ollama section of the settings
    pub fn from_config(config: &OllamaConfig) -> Self {
        Self::with_options(&config.base_url, config.request_timeout())
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama is running and reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => Err(Self::map_send_error(e)),
        }
    }

    /// List available models from Ollama
    pub async fn list_local_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(ZenError::Api(ApiError::ServerError {
                status: response.status().as_u16(),
                message: "Failed to list models".to_string(),
            }));
        }

        let body = response.text().await.map_err(Self::map_send_error)?;
        let tags: OllamaTagsResponse = serde_json::from_str(&body)
            .map_err(|e| ZenError::Api(ApiError::InvalidResponse(e.to_string())))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn map_send_error(e: reqwest::Error) -> ZenError {
        if e.is_timeout() {
            ZenError::Api(ApiError::Timeout)
        } else if e.is_connect() {
            ZenError::Api(ApiError::Network(NOT_RUNNING.to_string()))
        } else {
            ZenError::Http(e)
        }
    }

    /// Convert internal messages to Ollama format
    fn convert_messages(&self, messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|m| OllamaMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Build the request body. The system prompt leads the message list.
    fn build_request(&self, request: &CompletionRequest) -> OllamaRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(OllamaMessage {
                role: Role::System.as_str().to_string(),
                content: system.clone(),
            });
        }
        messages.extend(self.convert_messages(&request.messages));

        OllamaRequest {
            model: request.model.clone(),
            messages,
            stream: false,
            options: Some(OllamaOptions {
                temperature: Some(request.temperature),
                num_predict: Some(request.max_tokens as i64),
            }),
        }
    }

    /// Parse an error response
    fn parse_error(&self, status: u16, body: &str) -> ZenError {
        if let Ok(error_response) = serde_json::from_str::<OllamaError>(body) {
            let message = error_response.error;
            if message.contains("model") && message.contains("not found") {
                ZenError::Api(ApiError::ModelNotFound(message))
            } else {
                ZenError::Api(ApiError::ServerError { status, message })
            }
        } else {
            ZenError::Api(ApiError::ServerError {
                status,
                message: body.to_string(),
            })
        }
    }

    /// Parse a successful chat response body
    fn parse_response(body: &str) -> Result<OllamaResponse> {
        serde_json::from_str(body).map_err(|e| {
            ZenError::Api(ApiError::InvalidResponse(format!(
                "could not decode Ollama response: {e}"
            )))
        })
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_request(&request);

        tracing::debug!(
            target: "zenbot.llm.ollama",
            model = %request.model,
            messages = body.messages.len(),
            temperature = request.temperature,
            timeout_secs = self.timeout.as_secs(),
            "sending chat request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(Self::map_send_error)?;

        if !(200..300).contains(&status) {
            return Err(self.parse_error(status, &text));
        }

        let api_response = Self::parse_response(&text)?;

        let stop_reason = match api_response.done_reason.as_deref() {
            Some("length") => Some(StopReason::MaxTokens),
            _ if api_response.done => Some(StopReason::EndTurn),
            _ => None,
        };

        Ok(CompletionResponse {
            id: format!("ollama-{}", uuid::Uuid::new_v4()),
            model: request.model,
            content: api_response.message.content,
            stop_reason,
            usage: Usage {
                input_tokens: api_response.prompt_eval_count.unwrap_or(0) as u32,
                output_tokens: api_response.eval_count.unwrap_or(0) as u32,
            },
        })
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<i64>,
    #[serde(default)]
    eval_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}
