//! Reactive glue between the conversation state machine, the session store,
//! and the webhook client. Provided via Leptos context so components only
//! subscribe to signals.
//!
//! Each round trip is split into a synchronous begin step and a synchronous
//! finish step with only the HTTP await in between, so the whole flow is
//! testable on the host. The finish step checks that the session the request
//! was issued for is still the current one: a reply that outlives a panel
//! close must not touch the successor session's state or storage.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::WebhookClient;
use crate::config::WidgetConfig;
use crate::conversation::{Conversation, Outbound};
use crate::error::ApiError;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct ChatState {
    pub conversation: ReadSignal<Conversation>,
    set_conversation: WriteSignal<Conversation>,
    pub session_id: ReadSignal<Option<String>>,
    set_session_id: WriteSignal<Option<String>>,
    // The store holds an Rc to the storage backend, so it lives in a
    // thread-local stored value rather than a signal.
    store: StoredValue<SessionStore, LocalStorage>,
    client: WebhookClient,
}

impl ChatState {
    fn new(config: &WidgetConfig, store: SessionStore) -> Self {
        let (conversation, set_conversation) = signal(Conversation::new());
        let (session_id, set_session_id) = signal(None::<String>);
        Self {
            conversation,
            set_conversation,
            session_id,
            set_session_id,
            store: StoredValue::new_local(store),
            client: WebhookClient::new(config.webhook_url.clone()),
        }
    }

    /// Create the state for one widget instance and provide it in the
    /// current Leptos context. Each instance owns its store; nothing is
    /// shared across widgets on the same page.
    pub fn provide(config: &WidgetConfig) -> Self {
        let state = Self::new(config, SessionStore::open());
        provide_context(state.clone());
        state
    }

    /// Panel opened: resolve the session id, show any persisted history,
    /// and run the greeting round trip when there is none.
    pub fn open_session(&self) {
        let Some(session_id) = self.open_sync() else {
            return;
        };
        let state = self.clone();
        spawn_local(async move {
            let reply = state.client.init_session(&session_id).await;
            state.finish_initialize(&session_id, reply);
        });
    }

    /// Hand a composed message to the conversation. Blank input or an
    /// in-flight round trip makes this a no-op; the state machine decides,
    /// not the disabled state of the send button.
    pub fn send(&self, text: String) {
        let Some((session_id, outbound)) = self.send_sync(&text) else {
            return;
        };
        let state = self.clone();
        spawn_local(async move {
            let reply = state.client.send_message(&session_id, &outbound.text).await;
            state.finish_send(&session_id, outbound, reply);
        });
    }

    /// Panel closed or unmounted: the session does not survive the surface
    /// that hosts it.
    pub fn teardown(&self) {
        if let Some(session_id) = self.session_id.get_untracked() {
            self.close_session(&session_id);
        }
    }

    /// Resolve the session and restore history. Returns the session id when
    /// the conversation is empty and the greeting round trip must run.
    fn open_sync(&self) -> Option<String> {
        let id = self.store.with_value(|s| s.session_id());
        let restored = self.store.with_value(|s| s.restore_history(&id));
        self.set_session_id.set(Some(id.clone()));

        if restored.is_empty() {
            self.set_conversation.set(Conversation::new());
            let began = self
                .set_conversation
                .try_update(|c| c.begin_initialize())
                .unwrap_or(false);
            began.then_some(id)
        } else {
            log::debug!("restored {} messages for {id}", restored.len());
            self.set_conversation.set(Conversation::restored(restored));
            None
        }
    }

    fn finish_initialize(&self, session_id: &str, reply: Result<String, ApiError>) {
        if !self.is_current(session_id) {
            log::debug!("dropping init reply for ended session {session_id}");
            return;
        }
        self.set_conversation.update(|c| c.complete_initialize(reply));
        self.persist(session_id);
    }

    /// Accept the message and record the in-flight user turn. Returns what
    /// the round trip needs, or `None` when the conversation refused it.
    fn send_sync(&self, text: &str) -> Option<(String, Outbound)> {
        let session_id = self.session_id.get_untracked()?;
        let outbound = self
            .set_conversation
            .try_update(|c| c.begin_send(text))
            .flatten()?;
        self.persist(&session_id);
        Some((session_id, outbound))
    }

    fn finish_send(&self, session_id: &str, outbound: Outbound, reply: Result<String, ApiError>) {
        if !self.is_current(session_id) {
            log::debug!("dropping reply for ended session {session_id}");
            return;
        }
        self.set_conversation.update(|c| c.complete_send(reply));
        if outbound.ends_session {
            self.close_session(session_id);
        } else {
            self.persist(session_id);
        }
    }

    /// Whether a round trip issued for this session may still touch state.
    /// Teardown clears the current id and ending a session retires its id
    /// for good, so a stale completion can never match.
    fn is_current(&self, session_id: &str) -> bool {
        self.session_id.get_untracked().as_deref() == Some(session_id)
    }

    fn close_session(&self, session_id: &str) {
        self.store.with_value(|s| s.end_session(session_id));
        self.set_conversation.update(|c| c.end());
        self.set_session_id.set(None);
    }

    fn persist(&self, session_id: &str) {
        let conversation = self.conversation.get_untracked();
        if conversation.is_ended() {
            return;
        }
        self.store
            .with_value(|s| s.persist_history(session_id, conversation.messages()));
    }
}
