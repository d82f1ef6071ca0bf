// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat orchestration
//!
//! The conversation engine ties the session store to the model client.
//! Display and input helpers are shared by the terminal frontend.

pub mod display;
pub mod engine;
pub mod input_parser;

pub use engine::{ConversationEngine, GenerationConfig, SubmitOutcome, INVALID_QUESTION_MESSAGE};
pub use input_parser::{parse_input, ReplCommand};
