// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Input parsing for chat commands
//!
//! Pure functions that classify a line typed at the REPL.

/// What the user asked the REPL to do
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Send this text to the model
    Message(String),
    /// Clear the current session's history
    Clear,
    /// Rotate to a fresh session id
    New,
    /// Change the temperature for later questions
    SetTemperature(f32),
    /// Show the transcript
    History,
    /// Store the current temperature as the default
    Save,
    /// Show the command list
    Help,
    /// Leave the REPL
    Exit,
    /// A slash command that could not be understood
    Invalid(String),
}

/// Check if user input is an exit command.
pub fn is_exit_command(input: &str) -> bool {
    let trimmed = input.trim().to_lowercase();
    matches!(trimmed.as_str(), "exit" | "quit" | "/exit" | "/quit")
}

/// Parse the argument of `/temp`.
pub fn parse_temperature(arg: &str) -> Result<f32, String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err("Usage: /temp <value between 0.0 and 1.0>".to_string());
    }
    match arg.parse::<f32>() {
        Ok(value) if value.is_finite() && (0.0..=1.0).contains(&value) => Ok(value),
        Ok(_) => Err(format!("Temperature must be between 0.0 and 1.0, got {}", arg)),
        Err(_) => Err(format!("Not a number: {}", arg)),
    }
}

/// Classify one line of REPL input.
///
/// Anything that is not a recognised command is passed through untouched,
/// including blank lines, so the engine decides how to answer them.
pub fn parse_input(input: &str) -> ReplCommand {
    if is_exit_command(input) {
        return ReplCommand::Exit;
    }

    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return ReplCommand::Message(input.to_string());
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg),
        None => (trimmed, ""),
    };

    match command.to_lowercase().as_str() {
        "/clear" => ReplCommand::Clear,
        "/new" => ReplCommand::New,
        "/history" => ReplCommand::History,
        "/save" => ReplCommand::Save,
        "/help" | "/?" => ReplCommand::Help,
        "/temp" | "/temperature" => match parse_temperature(arg) {
            Ok(value) => ReplCommand::SetTemperature(value),
            Err(message) => ReplCommand::Invalid(message),
        },
        other => ReplCommand::Invalid(format!(
            "Unknown command: {}. Type /help for commands.",
            other
        )),
    }
}
