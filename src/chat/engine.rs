// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation engine shared by every frontend.
//!
//! A submission is one unit of work: lock the session, replay its transcript
//! to the model together with the new question, and append the exchange only
//! once a reply has been obtained.

use std::sync::Arc;

use crate::config::{clamp_temperature, Settings};
use crate::error::{ApiError, Result, ZenError};
use crate::history::{SessionId, SessionStore, Transcript};
use crate::llm::message::Message;
use crate::llm::provider::{CompletionRequest, LlmProvider};
use crate::llm::retry::{with_retry, RetryConfig};

/// Reply shown when the question is empty or whitespace.
pub const INVALID_QUESTION_MESSAGE: &str = "Please enter a valid question!";

/// Per-call sampling settings
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Model to query
    pub model: String,
    /// Sampling temperature, 0.0 to 1.0
    pub temperature: f32,
    /// Maximum tokens in the reply
    pub max_tokens: u32,
}

impl GenerationConfig {
    /// Build from the settings defaults
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.providers.ollama.default_model.clone(),
            temperature: settings.defaults.temperature,
            max_tokens: settings.defaults.max_tokens,
        }
    }

    /// Same config with another temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Result of a submission that reached the engine without error
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The model answered and the exchange was recorded
    Replied {
        reply: String,
        transcript: Transcript,
    },
    /// The question was blank; nothing was sent or recorded
    Rejected { message: &'static str },
}

impl SubmitOutcome {
    /// Text to show the user
    pub fn text(&self) -> &str {
        match self {
            SubmitOutcome::Replied { reply, .. } => reply,
            SubmitOutcome::Rejected { message } => message,
        }
    }

    /// Updated transcript, if the model was called
    pub fn transcript(&self) -> Option<&Transcript> {
        match self {
            SubmitOutcome::Replied { transcript, .. } => Some(transcript),
            SubmitOutcome::Rejected { .. } => None,
        }
    }
}

/// Orchestrates session history and model calls
pub struct ConversationEngine {
    provider: Arc<dyn LlmProvider>,
    store: Arc<SessionStore>,
    system_prompt: String,
    max_history_turns: Option<usize>,
    retry: RetryConfig,
}

impl ConversationEngine {
    /// Create an engine with the default persona, full replay and default retries
    pub fn new(provider: Arc<dyn LlmProvider>, store: Arc<SessionStore>) -> Self {
        Self {
            provider,
            store,
            system_prompt: crate::config::DEFAULT_SYSTEM_PROMPT.to_string(),
            max_history_turns: None,
            retry: RetryConfig::default(),
        }
    }

    /// Create an engine configured from settings
    pub fn from_settings(
        provider: Arc<dyn LlmProvider>,
        store: Arc<SessionStore>,
        settings: &Settings,
    ) -> Self {
        Self::new(provider, store)
            .with_system_prompt(settings.defaults.system_prompt.clone())
            .with_history_window(settings.conversation.max_history_turns)
            .with_retry(RetryConfig::from(&settings.resilience))
    }

    /// Override the system instruction
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Replay at most this many recent turns (None = all)
    pub fn with_history_window(mut self, max_turns: Option<usize>) -> Self {
        self.max_history_turns = max_turns;
        self
    }

    /// Override retry behavior for model calls
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The shared session store
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// The system instruction in use
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Submit a question on behalf of `session_id`.
    ///
    /// Blank questions return [`SubmitOutcome::Rejected`] without touching the
    /// model or the store. Model failures are returned as errors and leave the
    /// transcript unchanged.
    pub async fn submit(
        &self,
        session_id: &SessionId,
        user_message: &str,
        config: &GenerationConfig,
    ) -> Result<SubmitOutcome> {
        if user_message.trim().is_empty() {
            tracing::debug!(target: "zenbot.chat.engine", session = %session_id, "rejected blank question");
            return Ok(SubmitOutcome::Rejected {
                message: INVALID_QUESTION_MESSAGE,
            });
        }

        let temperature = clamp_temperature(config.temperature)?;

        let slot = self.store.slot(session_id);
        let mut transcript = slot.lock().await;

        let mut messages = transcript.to_messages(self.max_history_turns);
        messages.push(Message::user(user_message));

        let request = CompletionRequest::new(&config.model, messages)
            .with_system(&self.system_prompt)
            .with_temperature(temperature)
            .with_max_tokens(config.max_tokens);

        tracing::debug!(
            target: "zenbot.chat.engine",
            session = %session_id,
            history_turns = transcript.len(),
            replayed_messages = request.messages.len() - 1,
            temperature,
            model = %config.model,
            "submitting question"
        );

        let response = with_retry(
            || self.provider.complete(request.clone()),
            &self.retry,
            "chat completion",
        )
        .await
        .inspect_err(|error| {
            tracing::warn!(
                target: "zenbot.chat.engine",
                session = %session_id,
                %error,
                "model call failed; transcript unchanged"
            );
        })?;

        if response.content.trim().is_empty() {
            return Err(ZenError::Api(ApiError::InvalidResponse(
                "model returned an empty reply".to_string(),
            )));
        }

        transcript.push(user_message, response.content.clone());

        tracing::info!(
            target: "zenbot.chat.engine",
            session = %session_id,
            turns = transcript.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "recorded turn"
        );

        Ok(SubmitOutcome::Replied {
            reply: response.content,
            transcript: transcript.clone(),
        })
    }

    /// Clear the transcript of `session_id`. The id remains usable.
    pub async fn clear(&self, session_id: &SessionId) {
        self.store.reset(session_id).await;
    }

    /// Current transcript of `session_id`
    pub async fn transcript(&self, session_id: &SessionId) -> Transcript {
        self.store.get_or_create(session_id).await
    }

    /// Fresh id for a new conversation
    pub fn new_session(&self) -> SessionId {
        SessionId::new()
    }
}
