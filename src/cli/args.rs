// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for ZenBot.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;

/// ZenBot - chat with a local Ollama model from your terminal
#[derive(Parser, Debug)]
#[command(name = "zenbot")]
#[command(version, about = "Chat with a local Ollama model from your terminal")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start interactive chat session (default when no command given)
    Chat(ChatArgs),

    /// Ask a single question (non-interactive)
    Ask(AskArgs),

    /// List models installed on the Ollama server
    Models(ModelsArgs),
}

/// Model selection shared by chat and ask
#[derive(clap::Args, Debug, Default, Clone)]
pub struct GenerationArgs {
    /// Model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 to 1.0)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Ollama server URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}

impl GenerationArgs {
    /// Write any flags that were given into `settings`
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(model) = &self.model {
            settings.providers.ollama.default_model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            settings.defaults.temperature = temperature;
        }
        if let Some(base_url) = &self.base_url {
            settings.providers.ollama.base_url = base_url.clone();
        }
    }
}

/// Arguments for the chat subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ChatArgs {
    #[command(flatten)]
    pub generation: GenerationArgs,
}

/// Arguments for the ask subcommand
#[derive(clap::Args, Debug)]
pub struct AskArgs {
    /// The question to ask
    pub prompt: String,

    #[command(flatten)]
    pub generation: GenerationArgs,
}

/// Arguments for the models subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ModelsArgs {
    /// Ollama server URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}
