// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation history for ZenBot sessions
//!
//! Keeps one append-only transcript per session identifier, in memory,
//! for the lifetime of the process.

pub mod store;

pub use store::{SessionId, SessionPin, SessionStore, SessionStoreConfig, Transcript, Turn};
