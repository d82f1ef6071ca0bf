// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! In-memory session store
//!
//! Maps session identifiers to their conversation transcripts. Entries are
//! created on first reference and live until process exit unless a capacity
//! or idle limit is configured.
//!
//! Every session owns an async mutex. Holding it across a model call is what
//! keeps concurrent submissions on the same session in order; the map itself
//! is only locked long enough to look up or insert a slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::SessionsConfig;
use crate::llm::message::Message;

/// Opaque identifier scoping a transcript to one conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for display
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One completed exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// What the user asked
    pub user: String,
    /// What the model answered
    pub assistant: String,
    /// When the exchange completed
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ordered exchanges of one session, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been recorded
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Most recent turn
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Append a completed exchange
    pub fn push(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Turn::new(user, assistant));
    }

    /// Drop every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// `(user, assistant)` pairs, the shape a chat widget renders
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.turns
            .iter()
            .map(|t| (t.user.clone(), t.assistant.clone()))
            .collect()
    }

    /// Alternating user/assistant messages for replay to a model.
    ///
    /// With `window` set, only the most recent `window` turns are included.
    pub fn to_messages(&self, window: Option<usize>) -> Vec<Message> {
        let skip = window
            .map(|w| self.turns.len().saturating_sub(w))
            .unwrap_or(0);

        self.turns[skip..]
            .iter()
            .flat_map(|turn| {
                [
                    Message::user(turn.user.clone()),
                    Message::assistant(turn.assistant.clone()),
                ]
            })
            .collect()
    }
}

/// Limits applied by the store
#[derive(Debug, Clone, Default)]
pub struct SessionStoreConfig {
    /// Maximum number of live sessions
    pub max_sessions: Option<usize>,
    /// Sessions idle longer than this are dropped by [`SessionStore::evict_idle`]
    pub idle_timeout: Option<Duration>,
}

impl From<&SessionsConfig> for SessionStoreConfig {
    fn from(config: &SessionsConfig) -> Self {
        Self {
            max_sessions: config.max_sessions,
            idle_timeout: config.idle_timeout(),
        }
    }
}

/// Shared handle to one session's transcript
pub(crate) type SessionSlot = Arc<tokio::sync::Mutex<Transcript>>;

/// Keeps one session live. Capacity and idle eviction skip it until dropped.
#[must_use = "the session is only protected while the pin is held"]
pub struct SessionPin {
    _slot: SessionSlot,
}

struct SessionEntry {
    slot: SessionSlot,
    last_active: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            slot: Arc::new(tokio::sync::Mutex::new(Transcript::new())),
            last_active: Instant::now(),
        }
    }

    /// Nobody outside the map holds the slot
    fn is_idle_handle(&self) -> bool {
        Arc::strong_count(&self.slot) == 1
    }
}

/// Process-wide mapping from session id to transcript
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    config: SessionStoreConfig,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::with_config(SessionStoreConfig::default())
    }

    /// Create a store with limits
    pub fn with_config(config: SessionStoreConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(target: "zenbot.history", "session map lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Get the slot for `session_id`, registering an empty transcript if absent.
    pub(crate) fn slot(&self, session_id: &SessionId) -> SessionSlot {
        let mut sessions = self.lock();

        if let Some(entry) = sessions.get_mut(session_id) {
            entry.last_active = Instant::now();
            return entry.slot.clone();
        }

        if let Some(max) = self.config.max_sessions {
            while sessions.len() >= max {
                if !Self::evict_least_recent(&mut sessions) {
                    tracing::warn!(
                        target: "zenbot.history",
                        live_sessions = sessions.len(),
                        max_sessions = max,
                        "all sessions busy; exceeding session limit"
                    );
                    break;
                }
            }
        }

        tracing::debug!(target: "zenbot.history", session = %session_id, "creating session");
        let entry = SessionEntry::new();
        let slot = entry.slot.clone();
        sessions.insert(session_id.clone(), entry);
        slot
    }

    /// Exempt `session_id` from eviction while the returned pin is alive,
    /// registering the session if absent.
    pub fn pin(&self, session_id: &SessionId) -> SessionPin {
        SessionPin {
            _slot: self.slot(session_id),
        }
    }

    fn evict_least_recent(sessions: &mut HashMap<SessionId, SessionEntry>) -> bool {
        let victim = sessions
            .iter()
            .filter(|(_, entry)| entry.is_idle_handle())
            .min_by_key(|(_, entry)| entry.last_active)
            .map(|(id, _)| id.clone());

        match victim {
            Some(id) => {
                tracing::debug!(target: "zenbot.history", session = %id, "evicting least recently active session");
                sessions.remove(&id);
                true
            }
            None => false,
        }
    }

    /// Return the transcript for `session_id`, creating an empty one if absent.
    pub async fn get_or_create(&self, session_id: &SessionId) -> Transcript {
        let slot = self.slot(session_id);
        let transcript = slot.lock().await;
        transcript.clone()
    }

    /// Clear the transcript for `session_id`. The id stays usable.
    pub async fn reset(&self, session_id: &SessionId) {
        let slot = self.slot(session_id);
        slot.lock().await.clear();
        tracing::debug!(target: "zenbot.history", session = %session_id, "session reset");
    }

    /// Forget `session_id` entirely. Returns whether it existed.
    pub fn remove(&self, session_id: &SessionId) -> bool {
        self.lock().remove(session_id).is_some()
    }

    /// Whether `session_id` has been registered
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.lock().contains_key(session_id)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no session has been registered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Ids of all live sessions, sorted
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Configured idle timeout, if any
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.config.idle_timeout
    }

    /// Drop sessions idle longer than the configured timeout.
    ///
    /// Sessions with a submission in flight are kept. Returns the number removed.
    pub fn evict_idle(&self) -> usize {
        let Some(timeout) = self.config.idle_timeout else {
            return 0;
        };

        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| {
            !(entry.is_idle_handle() && entry.last_active.elapsed() > timeout)
        });
        let removed = before - sessions.len();

        if removed > 0 {
            tracing::info!(target: "zenbot.history", removed, "evicted idle sessions");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::message::Role;

    #[test]
    fn test_session_id_new_is_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn test_session_id_from_str() {
        let id = SessionId::from("s1");
        assert_eq!(id.as_str(), "s1");
        assert_eq!(id.to_string(), "s1");
        assert_eq!(id.short(), "s1");
    }

    #[test]
    fn test_transcript_to_messages() {
        let mut transcript = Transcript::new();
        transcript.push("What is 2+2?", "4");
        transcript.push("And times 3?", "12");

        let messages = transcript.to_messages(None);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is 2+2?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[3].content, "12");
    }

    #[test]
    fn test_transcript_window() {
        let mut transcript = Transcript::new();
        for i in 0..5 {
            transcript.push(format!("q{i}"), format!("a{i}"));
        }

        let messages = transcript.to_messages(Some(2));
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].content, "q3");
        assert_eq!(messages[3].content, "a4");

        assert_eq!(transcript.to_messages(Some(10)).len(), 10);
        assert!(transcript.to_messages(Some(0)).is_empty());
    }

    #[test]
    fn test_transcript_pairs() {
        let mut transcript = Transcript::new();
        transcript.push("hi", "hello");
        assert_eq!(
            transcript.pairs(),
            vec![("hi".to_string(), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_get_or_create_registers_lazily() {
        let store = SessionStore::new();
        let id = SessionId::from("s1");
        assert!(!store.contains(&id));

        let transcript = store.get_or_create(&id).await;
        assert!(transcript.is_empty());
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = SessionStore::new();
        let id = SessionId::from("s1");
        store.slot(&id).lock().await.push("q", "a");

        let first = store.get_or_create(&id).await;
        let second = store.get_or_create(&id).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_keeps_id_usable() {
        let store = SessionStore::new();
        let id = SessionId::from("s1");
        store.slot(&id).lock().await.push("q", "a");

        store.reset(&id).await;
        assert!(store.get_or_create(&id).await.is_empty());
        assert!(store.contains(&id));

        store.slot(&id).lock().await.push("q2", "a2");
        assert_eq!(store.get_or_create(&id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = SessionId::from("a");
        let b = SessionId::from("b");
        store.slot(&a).lock().await.push("only in a", "ok");

        assert_eq!(store.get_or_create(&a).await.len(), 1);
        assert!(store.get_or_create(&b).await.is_empty());
        assert_eq!(store.session_ids(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new();
        let id = SessionId::from("s1");
        store.get_or_create(&id).await;

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recent() {
        let store = SessionStore::with_config(SessionStoreConfig {
            max_sessions: Some(2),
            idle_timeout: None,
        });
        let a = SessionId::from("a");
        let b = SessionId::from("b");
        let c = SessionId::from("c");

        store.get_or_create(&a).await;
        std::thread::sleep(Duration::from_millis(2));
        store.get_or_create(&b).await;
        std::thread::sleep(Duration::from_millis(2));
        // Touch `a` so `b` becomes the oldest.
        store.get_or_create(&a).await;
        store.get_or_create(&c).await;

        assert_eq!(store.len(), 2);
        assert!(store.contains(&a));
        assert!(!store.contains(&b));
        assert!(store.contains(&c));
    }

    #[tokio::test]
    async fn test_capacity_skips_busy_sessions() {
        let store = SessionStore::with_config(SessionStoreConfig {
            max_sessions: Some(1),
            idle_timeout: None,
        });
        let a = SessionId::from("a");
        let held = store.slot(&a);

        store.get_or_create(&SessionId::from("b")).await;
        assert!(store.contains(&a));
        assert_eq!(store.len(), 2);
        drop(held);
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let store = SessionStore::with_config(SessionStoreConfig {
            max_sessions: None,
            idle_timeout: Some(Duration::from_millis(5)),
        });
        let stale = SessionId::from("stale");
        store.get_or_create(&stale).await;
        std::thread::sleep(Duration::from_millis(20));
        let fresh = SessionId::from("fresh");
        store.get_or_create(&fresh).await;

        assert_eq!(store.evict_idle(), 1);
        assert!(!store.contains(&stale));
        assert!(store.contains(&fresh));
    }

    #[tokio::test]
    async fn test_pinned_session_survives_idle_eviction() {
        let store = SessionStore::with_config(SessionStoreConfig {
            max_sessions: None,
            idle_timeout: Some(Duration::from_millis(5)),
        });
        let current = SessionId::from("current");
        let pin = store.pin(&current);
        store.slot(&current).lock().await.push("hi", "hello");
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(store.evict_idle(), 0);
        assert_eq!(store.get_or_create(&current).await.len(), 1);

        drop(pin);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.evict_idle(), 1);
        assert!(!store.contains(&current));
    }

    #[tokio::test]
    async fn test_pinned_session_survives_capacity_eviction() {
        let store = SessionStore::with_config(SessionStoreConfig {
            max_sessions: Some(1),
            idle_timeout: None,
        });
        let current = SessionId::from("current");
        let _pin = store.pin(&current);

        store.get_or_create(&SessionId::from("other")).await;
        assert!(store.contains(&current));
    }

    #[tokio::test]
    async fn test_evict_idle_without_timeout_is_noop() {
        let store = SessionStore::new();
        store.get_or_create(&SessionId::from("s")).await;
        assert_eq!(store.evict_idle(), 0);
        assert_eq!(store.len(), 1);
    }
}
