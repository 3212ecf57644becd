//! The conversation state machine: visible message sequence, pending flag,
//! and the begin/complete transitions around each webhook round trip.
//!
//! This module is deliberately free of I/O and browser types. The reactive
//! layer calls `begin_*`, performs the HTTP call, and feeds the outcome back
//! through the matching `complete_*`, so the whole lifecycle is testable on
//! the host.

use crate::error::ApiError;
use crate::models::{Message, MessageKind};

/// Reserved payload that triggers the new-session request shape. Never sent
/// as a user-authored message.
pub const INIT_SENTINEL: &str = "__init__";

/// Reserved user message that ends the session after the normal send flow.
/// Matched after trimming and lowercasing.
pub const END_SENTINEL: &str = "__end__";

/// Shown when the initialization round trip fails.
pub const FALLBACK_GREETING: &str = "Hello! How can I help you today?";

/// Shown when an ordinary send fails.
pub const FALLBACK_ERROR: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again later.";

const TYPING_ID: &str = "typing";
const TYPING_TEXT: &str = "Typing...";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initializing,
    Ready,
    Sending,
    /// Terminal for this session id; stale completions are ignored.
    Ended,
}

/// A message accepted by [`Conversation::begin_send`], ready to go out over
/// the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    /// True when the text matched [`END_SENTINEL`]; the caller must end the
    /// session once the round trip completes.
    pub ends_session: bool,
}

#[derive(Clone, Debug)]
pub struct Conversation {
    messages: Vec<Message>,
    phase: Phase,
    next_id: u64,
    /// Set while the in-flight send carried the end sentinel.
    ending: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            phase: Phase::Uninitialized,
            next_id: 0,
            ending: false,
        }
    }

    /// Resume from persisted history. A non-empty restore skips
    /// initialization entirely.
    pub fn restored(messages: Vec<Message>) -> Self {
        let phase = if messages.is_empty() {
            Phase::Uninitialized
        } else {
            Phase::Ready
        };
        // Stored ids may be non-contiguous (storage is writable by the host
        // page), so continue past the highest one rather than the count.
        let next_id = messages
            .iter()
            .filter_map(|m| m.id.strip_prefix('m').and_then(|n| n.parse::<u64>().ok()))
            .max()
            .map_or(0, |n| n + 1);
        Self {
            messages,
            phase,
            next_id,
            ending: false,
        }
    }

    /// The durable messages, without any typing placeholder.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// What the panel renders: the durable messages plus a trailing typing
    /// placeholder while a round trip is outstanding.
    pub fn visible_messages(&self) -> Vec<Message> {
        let mut view = self.messages.clone();
        if self.pending() {
            view.push(Message::new(
                TYPING_ID.to_string(),
                MessageKind::Typing,
                TYPING_TEXT.to_string(),
            ));
        }
        view
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> bool {
        matches!(self.phase, Phase::Initializing | Phase::Sending)
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// Enter `Initializing`. Only valid once, on an empty conversation;
    /// returns false (and changes nothing) otherwise.
    pub fn begin_initialize(&mut self) -> bool {
        if self.phase != Phase::Uninitialized || !self.messages.is_empty() {
            return false;
        }
        self.phase = Phase::Initializing;
        true
    }

    /// Record the outcome of the initialization round trip. The sequence is
    /// never left empty: a failure shows the fixed greeting instead, and the
    /// session record is untouched so reopening can retry.
    pub fn complete_initialize(&mut self, reply: Result<String, ApiError>) {
        if self.phase != Phase::Initializing {
            return;
        }
        let content = match reply {
            Ok(text) => text,
            Err(err) => {
                log::error!("chat initialization failed: {err}");
                FALLBACK_GREETING.to_string()
            }
        };
        let greeting = self.next_message(MessageKind::Bot, content);
        self.messages = vec![greeting];
        self.phase = Phase::Ready;
    }

    /// Accept a user message and enter `Sending`. Returns `None` without any
    /// state change when the text trims to nothing, a round trip is already
    /// outstanding, or the conversation is not ready. The at-most-one
    /// in-flight request contract lives here, not in the UI.
    pub fn begin_send(&mut self, text: &str) -> Option<Outbound> {
        let text = text.trim();
        if text.is_empty() || self.phase != Phase::Ready {
            return None;
        }
        if text == INIT_SENTINEL {
            // Reserved for the wire protocol, not typeable.
            return None;
        }
        let ends_session = text.to_lowercase() == END_SENTINEL;
        let user = self.next_message(MessageKind::User, text.to_string());
        self.messages.push(user);
        self.phase = Phase::Sending;
        self.ending = ends_session;
        Some(Outbound {
            text: text.to_string(),
            ends_session,
        })
    }

    /// Record the outcome of a send. The reply (or the fixed fallback) is
    /// appended and `pending` is cleared on every path. Ignored unless a send
    /// is actually outstanding, so a completion arriving after teardown is
    /// harmless.
    pub fn complete_send(&mut self, reply: Result<String, ApiError>) {
        if self.phase != Phase::Sending {
            return;
        }
        let content = match reply {
            Ok(text) => text,
            Err(err) => {
                log::error!("chat send failed: {err}");
                FALLBACK_ERROR.to_string()
            }
        };
        let bot = self.next_message(MessageKind::Bot, content);
        self.messages.push(bot);
        self.phase = if self.ending { Phase::Ended } else { Phase::Ready };
        self.ending = false;
    }

    /// Terminal transition for this session id. Later completions and sends
    /// become no-ops.
    pub fn end(&mut self) {
        self.phase = Phase::Ended;
    }

    fn next_message(&mut self, kind: MessageKind, content: String) -> Message {
        let id = format!("m{}", self.next_id);
        self.next_id += 1;
        Message::new(id, kind, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> Conversation {
        let mut conv = Conversation::new();
        assert!(conv.begin_initialize());
        conv.complete_initialize(Ok("Hi there!".to_string()));
        conv
    }

    #[test]
    fn initialize_success_shows_raw_reply() {
        let mut conv = Conversation::new();
        assert!(conv.begin_initialize());
        assert!(conv.pending());
        conv.complete_initialize(Ok("Hi there!".to_string()));

        assert!(!conv.pending());
        assert_eq!(conv.messages().len(), 1);
        assert_eq!(conv.messages()[0].kind, MessageKind::Bot);
        assert_eq!(conv.messages()[0].content, "Hi there!");
    }

    #[test]
    fn initialize_failure_shows_fallback_greeting() {
        let mut conv = Conversation::new();
        assert!(conv.begin_initialize());
        conv.complete_initialize(Err(ApiError::Status(500)));

        assert!(!conv.pending());
        assert_eq!(conv.messages().len(), 1);
        assert_eq!(conv.messages()[0].kind, MessageKind::Bot);
        assert_eq!(conv.messages()[0].content, FALLBACK_GREETING);
    }

    #[test]
    fn initialize_runs_at_most_once() {
        let mut conv = ready();
        assert!(!conv.begin_initialize());
        assert_eq!(conv.messages().len(), 1);
    }

    #[test]
    fn send_round_trip_appends_user_then_bot() {
        let mut conv = ready();
        let out = conv.begin_send("hello").expect("send accepted");
        assert_eq!(out.text, "hello");
        assert!(!out.ends_session);
        assert!(conv.pending());

        conv.complete_send(Ok("Hi, how can I help?".to_string()));
        assert!(!conv.pending());

        let kinds: Vec<_> = conv.messages().iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![MessageKind::Bot, MessageKind::User, MessageKind::Bot]
        );
        assert_eq!(conv.messages()[1].content, "hello");
        assert_eq!(conv.messages()[2].content, "Hi, how can I help?");
        assert!(conv.messages().iter().all(|m| !m.is_typing()));
    }

    #[test]
    fn typing_placeholder_is_single_and_last_while_pending() {
        let mut conv = ready();
        conv.begin_send("hello").unwrap();

        let visible = conv.visible_messages();
        let typing: Vec<_> = visible.iter().filter(|m| m.is_typing()).collect();
        assert_eq!(typing.len(), 1);
        assert!(visible.last().unwrap().is_typing());

        conv.complete_send(Ok("done".to_string()));
        assert!(conv.visible_messages().iter().all(|m| !m.is_typing()));
    }

    #[test]
    fn send_while_pending_is_noop() {
        let mut conv = ready();
        conv.begin_send("first").unwrap();
        let before = conv.messages().to_vec();

        assert!(conv.begin_send("second").is_none());
        assert_eq!(conv.messages(), &before[..]);
        assert!(conv.pending());
    }

    #[test]
    fn blank_send_is_noop() {
        let mut conv = ready();
        assert!(conv.begin_send("").is_none());
        assert!(conv.begin_send("   ").is_none());
        assert_eq!(conv.messages().len(), 1);
        assert!(!conv.pending());
    }

    #[test]
    fn init_sentinel_is_not_user_sendable() {
        let mut conv = ready();
        assert!(conv.begin_send("__init__").is_none());
        assert_eq!(conv.messages().len(), 1);
    }

    #[test]
    fn end_sentinel_matches_after_trim_and_lowercase() {
        let mut conv = ready();
        let out = conv.begin_send("  __END__ ").unwrap();
        assert!(out.ends_session);

        conv.complete_send(Ok("bye".to_string()));
        assert!(conv.is_ended());
        assert!(conv.begin_send("anything").is_none());
    }

    #[test]
    fn end_sentinel_session_ends_even_when_send_fails() {
        let mut conv = ready();
        let out = conv.begin_send("__end__").unwrap();
        assert!(out.ends_session);

        conv.complete_send(Err(ApiError::Network("connection refused".into())));
        assert!(conv.is_ended());
        assert_eq!(conv.messages().last().unwrap().content, FALLBACK_ERROR);
    }

    #[test]
    fn send_failure_appends_fallback_error() {
        let mut conv = ready();
        conv.begin_send("x").unwrap();
        conv.complete_send(Err(ApiError::Network("connection reset".into())));

        assert!(!conv.pending());
        let last = conv.messages().last().unwrap();
        assert_eq!(last.kind, MessageKind::Bot);
        assert_eq!(last.content, FALLBACK_ERROR);
        let user = &conv.messages()[conv.messages().len() - 2];
        assert_eq!(user.kind, MessageKind::User);
        assert_eq!(user.content, "x");
    }

    #[test]
    fn completion_after_end_is_ignored() {
        let mut conv = ready();
        conv.begin_send("hello").unwrap();
        conv.end();
        let before = conv.messages().to_vec();

        conv.complete_send(Ok("too late".to_string()));
        assert_eq!(conv.messages(), &before[..]);
        assert!(conv.is_ended());
    }

    #[test]
    fn restored_history_skips_initialization() {
        let msgs = vec![
            Message::new("m0".into(), MessageKind::Bot, "welcome back".into()),
            Message::new("m1".into(), MessageKind::User, "hi".into()),
        ];
        let mut conv = Conversation::restored(msgs);
        assert_eq!(conv.phase(), Phase::Ready);
        assert!(!conv.begin_initialize());
        assert!(conv.begin_send("still here").is_some());
    }

    #[test]
    fn restored_empty_history_still_initializes() {
        let mut conv = Conversation::restored(Vec::new());
        assert_eq!(conv.phase(), Phase::Uninitialized);
        assert!(conv.begin_initialize());
    }

    #[test]
    fn restored_gapped_ids_do_not_collide() {
        let msgs = vec![
            Message::new("m2".into(), MessageKind::Bot, "hello".into()),
            Message::new("m5".into(), MessageKind::User, "hi".into()),
        ];
        let mut conv = Conversation::restored(msgs);
        conv.begin_send("next").unwrap();
        conv.complete_send(Ok("ok".to_string()));

        let mut ids: Vec<_> = conv.messages().iter().map(|m| m.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), conv.messages().len());
    }

    #[test]
    fn message_ids_are_unique_after_restore() {
        let msgs = vec![
            Message::new("m0".into(), MessageKind::Bot, "hello".into()),
            Message::new("m1".into(), MessageKind::User, "hey".into()),
        ];
        let mut conv = Conversation::restored(msgs);
        conv.begin_send("next").unwrap();
        conv.complete_send(Ok("ok".to_string()));

        let mut ids: Vec<_> = conv.messages().iter().map(|m| m.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), conv.messages().len());
    }
}
