// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! ZenBot - chat with a local Ollama model from your terminal
//!
//! Entry point for the ZenBot CLI application.

use clap::Parser;

use zenbot::cli::{ChatArgs, Cli, Commands, GenerationArgs};
use zenbot::config::Settings;
use zenbot::error::Result;

#[path = "main/cli_commands.rs"]
mod cli_commands;

use cli_commands::{run_ask, run_chat, run_models};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` turns on the crate's own diagnostics; `RUST_LOG` still applies.
    if cli.verbose > 0 {
        let level = if cli.verbose > 1 { "trace" } else { "debug" };
        for target in [
            "zenbot.chat.engine",
            "zenbot.history",
            "zenbot.llm.ollama",
            "zenbot.llm.retry",
            "zenbot.config",
        ] {
            if let Ok(parsed) = format!("{}={}", target, level).parse() {
                env_filter = env_filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load_from(&settings_path)?;
    settings.apply_env_overrides();

    match cli.command {
        None => {
            run_chat(ChatArgs::default(), settings, &settings_path).await?;
        }
        Some(Commands::Chat(args)) => {
            run_chat(args, settings, &settings_path).await?;
        }
        Some(Commands::Ask(args)) => {
            run_ask(args, settings).await?;
        }
        Some(Commands::Models(args)) => {
            GenerationArgs {
                base_url: args.base_url,
                ..GenerationArgs::default()
            }
            .apply_to(&mut settings);
            run_models(settings).await?;
        }
    }

    Ok(())
}
