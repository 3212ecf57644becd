//! Session identity and history persistence.
//!
//! The store owns the mapping from a session id to its persisted
//! conversation, backed by `localStorage` when the browser allows it and by
//! a plain in-memory map otherwise. Storage trouble never reaches the
//! caller; the worst case is a conversation that does not survive a reload.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;
use uuid::Uuid;

use crate::models::Message;

const SESSION_ID_KEY: &str = "chat.session_id";

fn history_key(session_id: &str) -> String {
    format!("chat.messages.{session_id}")
}

fn started_at_key(session_id: &str) -> String {
    format!("chat.started_at.{session_id}")
}

/// Minimal key-value surface the store needs. Implemented by browser
/// `localStorage` and by the in-memory fallback used in tests and when the
/// host environment disables storage.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// `localStorage`-backed storage.
pub struct BrowserStorage(web_sys::Storage);

impl BrowserStorage {
    /// `None` when the environment has no window or storage access is
    /// denied (private browsing, embedder policy).
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self(storage))
    }
}

impl Storage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.0.set_item(key, value) {
            log::warn!("storage write failed for {key}: {err:?}");
        }
    }

    fn remove(&self, key: &str) {
        let _ = self.0.remove_item(key);
    }
}

#[derive(Default)]
pub struct MemoryStorage(RefCell<HashMap<String, String>>);

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.0.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.0.borrow_mut().remove(key);
    }
}

#[derive(Clone)]
pub struct SessionStore {
    storage: Rc<dyn Storage>,
}

impl SessionStore {
    /// Open against `localStorage`, degrading to in-memory storage when it
    /// is unavailable.
    pub fn open() -> Self {
        match BrowserStorage::open() {
            Some(storage) => Self {
                storage: Rc::new(storage),
            },
            None => {
                log::warn!("localStorage unavailable, sessions will not survive a reload");
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            storage: Rc::new(MemoryStorage::default()),
        }
    }

    /// Return the persisted session id, generating and persisting a fresh
    /// one on first use. Collisions across the uuid space are not a
    /// failure mode anyone handles.
    pub fn session_id(&self) -> String {
        if let Some(id) = self.storage.get(SESSION_ID_KEY) {
            if !id.is_empty() {
                return id;
            }
        }
        let id = format!("session-{}", Uuid::new_v4());
        self.storage.set(SESSION_ID_KEY, &id);
        self.storage
            .set(&started_at_key(&id), &Utc::now().to_rfc3339());
        id
    }

    /// Load the persisted message sequence for a session. Absent or
    /// malformed data comes back as an empty sequence, and any typing
    /// placeholder that leaked into storage is dropped so it cannot
    /// reappear as a stale pending indicator.
    pub fn restore_history(&self, session_id: &str) -> Vec<Message> {
        let Some(raw) = self.storage.get(&history_key(session_id)) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => messages.into_iter().filter(|m| !m.is_typing()).collect(),
            Err(err) => {
                log::warn!("discarding malformed history for {session_id}: {err}");
                Vec::new()
            }
        }
    }

    /// Overwrite the persisted sequence for a session. Typing placeholders
    /// are stripped; an empty (or all-placeholder) sequence is not written.
    pub fn persist_history(&self, session_id: &str, messages: &[Message]) {
        let durable: Vec<&Message> = messages.iter().filter(|m| !m.is_typing()).collect();
        if durable.is_empty() {
            return;
        }
        match serde_json::to_string(&durable) {
            Ok(json) => self.storage.set(&history_key(session_id), &json),
            Err(err) => log::warn!("failed to serialize history for {session_id}: {err}"),
        }
    }

    /// Drop everything recorded for a session. Clears the persisted id as
    /// well, so the next [`SessionStore::session_id`] call generates a fresh
    /// one; reusing an ended id would resurrect a closed conversation.
    pub fn end_session(&self, session_id: &str) {
        self.storage.remove(&history_key(session_id));
        self.storage.remove(&started_at_key(session_id));
        if self.storage.get(SESSION_ID_KEY).as_deref() == Some(session_id) {
            self.storage.remove(SESSION_ID_KEY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageKind;

    #[test]
    fn session_id_is_stable_across_calls() {
        let store = SessionStore::in_memory();
        let first = store.session_id();
        assert!(first.starts_with("session-"));
        assert_eq!(store.session_id(), first);
    }

    #[test]
    fn end_session_forces_a_fresh_id() {
        let store = SessionStore::in_memory();
        let old = store.session_id();
        store.end_session(&old);
        let new = store.session_id();
        assert_ne!(new, old);
    }

    #[test]
    fn end_session_drops_history() {
        let store = SessionStore::in_memory();
        let id = store.session_id();
        store.persist_history(
            &id,
            &[Message::new("m0".into(), MessageKind::Bot, "hello".into())],
        );
        store.end_session(&id);
        assert!(store.restore_history(&id).is_empty());
    }

    #[test]
    fn persist_then_restore_round_trips() {
        let store = SessionStore::in_memory();
        let id = store.session_id();
        let messages = vec![
            Message::new("m0".into(), MessageKind::Bot, "Hi there!".into()),
            Message::new("m1".into(), MessageKind::User, "hello".into()),
            Message::new("m2".into(), MessageKind::Bot, "Hi, how can I help?".into()),
        ];
        store.persist_history(&id, &messages);
        assert_eq!(store.restore_history(&id), messages);
    }

    #[test]
    fn restore_strips_typing_placeholders() {
        let store = SessionStore::in_memory();
        let id = store.session_id();
        let messages = vec![
            Message::new("m0".into(), MessageKind::User, "hello".into()),
            Message::new("typing".into(), MessageKind::Typing, "Typing...".into()),
        ];
        store.persist_history(&id, &messages);

        let restored = store.restore_history(&id);
        assert_eq!(restored.len(), 1);
        assert!(restored.iter().all(|m| !m.is_typing()));
    }

    #[test]
    fn malformed_history_restores_as_empty() {
        let store = SessionStore::in_memory();
        let id = store.session_id();
        store.storage.set(&history_key(&id), "{not json");
        assert!(store.restore_history(&id).is_empty());
    }

    #[test]
    fn empty_history_is_not_persisted() {
        let store = SessionStore::in_memory();
        let id = store.session_id();
        store.persist_history(&id, &[]);
        assert!(store.storage.get(&history_key(&id)).is_none());
    }

    #[test]
    fn unknown_session_restores_as_empty() {
        let store = SessionStore::in_memory();
        assert!(store.restore_history("session-missing").is_empty());
    }
}
