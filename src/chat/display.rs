// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Display formatting for the chat interface
//!
//! Functions return formatted strings rather than writing to stdout,
//! which keeps them easy to test.

use std::path::Path;

use crate::history::{SessionId, Transcript};

/// Reply followed by the temperature it was sampled at
pub fn format_reply_with_temperature(reply: &str, temperature: f32) -> String {
    format!("{}\n\n**Temperature:** {:.2}", reply, temperature)
}

/// Truncate a string for display with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Numbered listing of a transcript, one question/answer pair per entry
pub fn format_transcript(transcript: &Transcript) -> String {
    if transcript.is_empty() {
        return "(no messages yet)".to_string();
    }

    transcript
        .turns()
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            format!(
                "{}. you: {}\n   zenbot: {}",
                i + 1,
                truncate_string(turn.user.trim(), 80),
                truncate_string(turn.assistant.trim(), 80)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format welcome message
pub fn format_welcome(
    model: &str,
    base_url: &str,
    temperature: f32,
    session_id: &SessionId,
) -> String {
    let mut output = String::new();
    output.push_str("ZenBot - local chat assistant\n");
    output.push_str(&format!("Model: {} @ {}\n", model, base_url));
    output.push_str(&format!("Temperature: {:.2}\n", temperature));
    output.push_str(&format!("Session: {}\n", session_id.short()));
    output.push_str("\nType /help for commands, or start chatting.\n");
    output
}

/// Help text listing REPL commands
pub fn format_help() -> String {
    [
        "Commands:",
        "  /clear         Clear the conversation history",
        "  /new           Start a new session",
        "  /temp <value>  Set the temperature (0.0 to 1.0)",
        "  /history       Show the conversation so far",
        "  /save          Keep the current temperature as the default",
        "  /help          Show this help",
        "  /exit          Quit",
    ]
    .join("\n")
}

/// Notice shown when the model could not produce a reply
pub fn format_model_failure() -> String {
    "Sorry, the model is unavailable right now. Please try again.".to_string()
}

/// Format new session message
pub fn format_new_session(session_id: &SessionId) -> String {
    format!(
        "Started new session: {}\nContext cleared. Ready for a fresh conversation.",
        session_id.short()
    )
}

/// Format temperature change message
pub fn format_temperature_change(temperature: f32) -> String {
    format!("Temperature set to {:.2}", temperature)
}

/// Format settings saved message
pub fn format_settings_saved(temperature: f32, path: &Path) -> String {
    format!(
        "Saved temperature {:.2} as the default in {}",
        temperature,
        path.display()
    )
}
