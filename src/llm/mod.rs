// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM module for ZenBot
//!
//! Provides the model client abstraction, the Ollama backend, and the
//! retry layer wrapped around model calls.

pub mod message;
pub mod mock_provider;
pub mod provider;
pub mod providers;
pub mod retry;

pub use message::*;
pub use provider::*;
