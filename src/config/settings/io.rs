// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::merge;
use super::Settings;

impl Settings {
    /// Get the default settings file path.
    pub fn default_path() -> PathBuf {
        Self::zenbot_home().join("settings.json")
    }

    /// Load settings from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        tracing::debug!(target: "zenbot.config", path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Save settings to a specific path, merging with existing file content
    /// to preserve unknown keys from other versions or hand edits.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let new_value = serde_json::to_value(self)?;

        let merged = if path.exists() {
            let existing_content = std::fs::read_to_string(path)?;
            match serde_json::from_str::<serde_json::Value>(&existing_content) {
                Ok(existing_value) => merge::deep_merge(existing_value, new_value),
                Err(_) => new_value, // Corrupt file, overwrite entirely.
            }
        } else {
            new_value
        };

        let content = serde_json::to_string_pretty(&merged)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `edit` to the settings stored at `path` and write them back.
    ///
    /// Starts from the file, not from the settings in effect, so env and
    /// command-line overrides of the current run are not persisted.
    pub fn update_file(path: &Path, edit: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut settings = Self::load_from(path)?;
        edit(&mut settings);
        settings.validate()?;
        settings.save_to(path)?;
        tracing::info!(target: "zenbot.config", path = %path.display(), "saved settings");
        Ok(settings)
    }

    /// Get the zenbot home directory (~/.zenbot or $ZENBOT_HOME).
    pub fn zenbot_home() -> PathBuf {
        if let Ok(home) = std::env::var("ZENBOT_HOME") {
            return PathBuf::from(home);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".zenbot")
    }
}
