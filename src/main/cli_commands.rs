// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crossterm::{
    style::{Color, ResetColor, SetForegroundColor},
    ExecutableCommand,
};

use zenbot::chat::display;
use zenbot::chat::{parse_input, ConversationEngine, GenerationConfig, ReplCommand, SubmitOutcome};
use zenbot::cli::{AskArgs, ChatArgs};
use zenbot::config::Settings;
use zenbot::error::{Result, ZenError};
use zenbot::history::{SessionStore, SessionStoreConfig};
use zenbot::llm::providers::OllamaProvider;

/// Everything a frontend needs to talk to the model
struct Runtime {
    engine: ConversationEngine,
    generation: GenerationConfig,
    base_url: String,
}

fn build_runtime(settings: &Settings) -> Result<Runtime> {
    settings.validate()?;

    let provider = OllamaProvider::from_config(&settings.providers.ollama);
    let base_url = provider.base_url().to_string();
    let store = Arc::new(SessionStore::with_config(SessionStoreConfig::from(
        &settings.sessions,
    )));
    let engine = ConversationEngine::from_settings(Arc::new(provider), store, settings);

    Ok(Runtime {
        engine,
        generation: GenerationConfig::from_settings(settings),
        base_url,
    })
}

/// Periodically drop sessions that have been idle past the configured timeout.
fn spawn_idle_reaper(store: Arc<SessionStore>) {
    let Some(timeout) = store.idle_timeout() else {
        return;
    };

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(timeout);
        interval.tick().await;
        loop {
            interval.tick().await;
            store.evict_idle();
        }
    });
}

pub(super) async fn run_chat(
    args: ChatArgs,
    mut settings: Settings,
    settings_path: &Path,
) -> Result<()> {
    args.generation.apply_to(&mut settings);
    let Runtime {
        engine,
        mut generation,
        base_url,
    } = build_runtime(&settings)?;
    spawn_idle_reaper(engine.store().clone());

    // The reaper must not reset the conversation the user is typing into.
    let mut session_id = engine.new_session();
    let mut _pin = engine.store().pin(&session_id);

    warn_if_server_unreachable(&settings).await?;

    print!(
        "{}",
        display::format_welcome(
            &generation.model,
            &base_url,
            generation.temperature,
            &session_id
        )
    );
    println!();

    loop {
        let Some(input) = read_user_input()? else {
            println!();
            break;
        };

        match parse_input(&input) {
            ReplCommand::Exit => break,
            ReplCommand::Help => println!("{}\n", display::format_help()),
            ReplCommand::Clear => {
                engine.clear(&session_id).await;
                println!("Conversation cleared.\n");
            }
            ReplCommand::New => {
                engine.store().remove(&session_id);
                session_id = engine.new_session();
                _pin = engine.store().pin(&session_id);
                println!("{}\n", display::format_new_session(&session_id));
            }
            ReplCommand::SetTemperature(value) => {
                generation.temperature = value;
                println!("{}\n", display::format_temperature_change(value));
            }
            ReplCommand::History => {
                let transcript = engine.transcript(&session_id).await;
                println!("{}\n", display::format_transcript(&transcript));
            }
            ReplCommand::Save => {
                let temperature = generation.temperature;
                match Settings::update_file(settings_path, |saved| {
                    saved.defaults.temperature = temperature;
                }) {
                    Ok(_) => println!(
                        "{}\n",
                        display::format_settings_saved(temperature, settings_path)
                    ),
                    Err(error) => print_error(&error.to_string())?,
                }
            }
            ReplCommand::Invalid(message) => print_error(&message)?,
            ReplCommand::Message(text) => {
                match engine.submit(&session_id, &text, &generation).await {
                    Ok(SubmitOutcome::Replied { reply, .. }) => {
                        print_response_prefix()?;
                        println!(
                            "{}\n",
                            display::format_reply_with_temperature(&reply, generation.temperature)
                        );
                    }
                    Ok(SubmitOutcome::Rejected { message }) => {
                        print_response_prefix()?;
                        println!("{}\n", message);
                    }
                    Err(error) => report_failure(&error)?,
                }
            }
        }
    }

    Ok(())
}

pub(super) async fn run_ask(args: AskArgs, mut settings: Settings) -> Result<()> {
    args.generation.apply_to(&mut settings);
    let runtime = build_runtime(&settings)?;
    let session_id = runtime.engine.new_session();

    match runtime
        .engine
        .submit(&session_id, &args.prompt, &runtime.generation)
        .await?
    {
        SubmitOutcome::Replied { reply, .. } => println!("{}", reply),
        SubmitOutcome::Rejected { message } => {
            return Err(ZenError::InvalidInput(message.to_string()));
        }
    }

    Ok(())
}

pub(super) async fn run_models(settings: Settings) -> Result<()> {
    settings.validate()?;
    let provider = OllamaProvider::from_config(&settings.providers.ollama);
    let models = provider.list_local_models().await?;

    if models.is_empty() {
        println!("No models installed at {}.", provider.base_url());
        println!("Pull one with: ollama pull {}", settings.providers.ollama.default_model);
        return Ok(());
    }

    for model in models {
        let marker = if model == settings.providers.ollama.default_model
            || model.starts_with(&format!("{}:", settings.providers.ollama.default_model))
        {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, model);
    }
    Ok(())
}

/// Tell the user up front when Ollama cannot be reached; chatting still proceeds.
async fn warn_if_server_unreachable(settings: &Settings) -> Result<()> {
    let provider = OllamaProvider::from_config(&settings.providers.ollama);
    match provider.health_check().await {
        Ok(true) => Ok(()),
        Ok(false) => print_error(&format!(
            "Ollama at {} answered with an error status.",
            provider.base_url()
        )),
        Err(error) => {
            tracing::debug!(target: "zenbot.llm.ollama", %error, "health check failed");
            print_error(&format!("{}", error))
        }
    }
}

/// Read one line from stdin. Returns `None` at end of input.
fn read_user_input() -> Result<Option<String>> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Green))?;
    print!("you: ");
    stdout.execute(ResetColor)?;
    stdout.flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    let line = input.trim_end_matches(['\n', '\r']).to_string();
    Ok(Some(line))
}

fn print_response_prefix() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    print!("\nzenbot: ");
    stdout.execute(ResetColor)?;
    stdout.flush()?;
    Ok(())
}

fn print_error(message: &str) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Red))?;
    println!("{}\n", message);
    stdout.execute(ResetColor)?;
    Ok(())
}

fn report_failure(error: &ZenError) -> Result<()> {
    tracing::warn!(target: "zenbot.chat.engine", %error, "submission failed");
    if error.is_model_unavailable() {
        print_error(&display::format_model_failure())
    } else {
        print_error(&error.to_string())
    }
}
