// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! ZenBot - a conversational assistant backed by a local Ollama model.
//!
//! This crate exposes the shared runtime used by the `zenbot` CLI
//! (`src/main.rs`) and by any other frontend that wants per-session,
//! multi-turn chat against a local model.
//!
//! Architecture highlights:
//! - `history`: process-wide session store mapping ids to transcripts
//! - `chat`: conversation engine that replays history and records turns
//! - `llm`: provider abstraction, the Ollama client, retry and a mock provider
//! - `config`: JSON settings with validation and env overrides
//! - `cli`: clap argument definitions

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;

pub use error::{Result, ZenError};
