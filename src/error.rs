// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for ZenBot
//!
//! This module defines all error types used throughout the application.

use thiserror::Error;

/// Main error type for ZenBot operations
#[derive(Error, Debug)]
pub enum ZenError {
    /// Model client errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Model client error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Requested model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from API
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// API returned an error
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Timeout waiting for response
    #[error("Request timed out")]
    Timeout,
}

/// Result type alias for ZenBot operations
pub type Result<T> = std::result::Result<T, ZenError>;

impl ZenError {
    /// Whether this error came from the model client rather than local code
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, ZenError::Api(_) | ZenError::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zen_error_config() {
        let err = ZenError::Config("bad config".to_string());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_zen_error_invalid_input() {
        let err = ZenError::InvalidInput("bad input".to_string());
        assert!(err.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_zen_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let zen_err: ZenError = io_err.into();
        assert!(zen_err.to_string().contains("IO error"));
        assert!(!zen_err.is_model_unavailable());
    }

    #[test]
    fn test_api_error_model_not_found() {
        let err = ApiError::ModelNotFound("gemma3".to_string());
        assert!(err.to_string().contains("Model not found"));
        assert!(err.to_string().contains("gemma3"));
    }

    #[test]
    fn test_api_error_network() {
        let err = ApiError::Network("connection refused".to_string());
        assert!(err.to_string().contains("Network error"));
    }

    #[test]
    fn test_api_error_server_error() {
        let err = ApiError::ServerError {
            status: 500,
            message: "internal server error".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("internal server error"));
    }

    #[test]
    fn test_api_error_timeout() {
        let err = ApiError::Timeout;
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_zen_error_from_api_error() {
        let zen_err: ZenError = ApiError::Timeout.into();
        assert!(zen_err.to_string().contains("API error"));
        assert!(zen_err.is_model_unavailable());
    }
}
