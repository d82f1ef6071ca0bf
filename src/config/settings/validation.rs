// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{Result, ZenError};

use super::Settings;

/// Lowest accepted sampling temperature.
pub const MIN_TEMPERATURE: f32 = 0.0;
/// Highest accepted sampling temperature.
pub const MAX_TEMPERATURE: f32 = 1.0;

impl Settings {
    /// Check the settings for values the rest of the application cannot use.
    pub fn validate(&self) -> Result<()> {
        let temperature = self.defaults.temperature;
        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(ZenError::Config(format!(
                "defaults.temperature must be between {MIN_TEMPERATURE} and {MAX_TEMPERATURE}, got {temperature}"
            )));
        }

        if self.providers.ollama.default_model.trim().is_empty() {
            return Err(ZenError::Config(
                "providers.ollama.default_model must not be empty".to_string(),
            ));
        }

        let base_url = &self.providers.ollama.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ZenError::Config(format!(
                "providers.ollama.base_url must be an http(s) URL, got '{base_url}'"
            )));
        }

        if self.providers.ollama.request_timeout_secs == 0 {
            return Err(ZenError::Config(
                "providers.ollama.request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.sessions.max_sessions == Some(0) {
            return Err(ZenError::Config(
                "sessions.max_sessions must be at least 1 when set".to_string(),
            ));
        }

        if self.sessions.idle_timeout_secs == Some(0) {
            return Err(ZenError::Config(
                "sessions.idle_timeout_secs must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply the environment overrides (`ZENBOT_OLLAMA_URL`, `ZENBOT_MODEL`).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ZENBOT_OLLAMA_URL") {
            self.providers.ollama.base_url = url;
        }
        if let Ok(model) = std::env::var("ZENBOT_MODEL") {
            self.providers.ollama.default_model = model;
        }
    }
}

/// Clamp a requested temperature into the accepted range.
///
/// NaN is rejected since it cannot be ordered.
pub fn clamp_temperature(temperature: f32) -> Result<f32> {
    if temperature.is_nan() {
        return Err(ZenError::InvalidInput(
            "temperature must be a number".to_string(),
        ));
    }
    Ok(temperature.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let mut settings = Settings::default();
        settings.defaults.temperature = 1.5;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("defaults.temperature"));
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut settings = Settings::default();
        settings.providers.ollama.default_model = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut settings = Settings::default();
        settings.providers.ollama.base_url = "localhost:11434".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_sessions() {
        let mut settings = Settings::default();
        settings.sessions.max_sessions = Some(0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_idle_timeout() {
        let mut settings = Settings::default();
        settings.sessions.idle_timeout_secs = Some(0);
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("sessions.idle_timeout_secs"));

        settings.sessions.idle_timeout_secs = Some(1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_clamp_temperature() {
        assert_eq!(clamp_temperature(0.5).unwrap(), 0.5);
        assert_eq!(clamp_temperature(-1.0).unwrap(), 0.0);
        assert_eq!(clamp_temperature(3.0).unwrap(), 1.0);
        assert!(clamp_temperature(f32::NAN).is_err());
    }
}
