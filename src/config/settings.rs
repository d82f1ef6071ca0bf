// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for ZenBot
//!
//! Handles loading and saving settings from ~/.zenbot/settings.json

use serde::{Deserialize, Serialize};
use std::time::Duration;

mod io;
mod merge;
mod validation;

pub use validation::{clamp_temperature, MAX_TEMPERATURE, MIN_TEMPERATURE};

/// Persona used when the settings file does not override it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and helpful assistant named ZenBot.\
Start with the greeting 'Hello, I am ZenBot. How can I assist you today?'. \
Answer the user's questions to the best of your ability.";

/// Main settings structure, stored in ~/.zenbot/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// LLM provider configurations
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Default settings for new sessions
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// History replay settings
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Session store limits
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Retry settings for model calls
    #[serde(default)]
    pub resilience: ResilienceConfig,
}

/// Configuration for LLM providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Ollama-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_ollama_model")]
    pub default_model: String,

    /// Upper bound on a single chat request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Default settings for new sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default temperature for LLM
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// System instruction sent ahead of every conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

/// Conversation replay configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConversationConfig {
    /// Replay only the most recent N turns to the model (None = full transcript)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history_turns: Option<usize>,
}

/// Session store limits. Both unset means sessions live until exit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionsConfig {
    /// Maximum number of live sessions before the least recently active is evicted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sessions: Option<usize>,

    /// Drop sessions idle for longer than this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,
}

/// Retry and resilience configuration for model calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds (cap for backoff)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Jitter percentage (0.0 to 1.0) for randomizing delays
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl OllamaConfig {
    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SessionsConfig {
    /// Idle timeout as a Duration
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

// Default value functions
fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "gemma3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_jitter() -> f64 {
    0.25
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            default_model: default_ollama_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}
