use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a visible chat entry is: a user utterance, a bot reply, or the
/// transient typing indicator shown while a request is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Bot,
    Typing,
}

/// One entry in the visible conversation. `Typing` entries are a UI
/// projection only and are never written to durable storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(id: String, kind: MessageKind, content: String) -> Self {
        Self {
            id,
            kind,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn is_typing(&self) -> bool {
        self.kind == MessageKind::Typing
    }
}

/// Body of the new-session announcement POST.
#[derive(Clone, Debug, Serialize)]
pub struct InitRequest<'a> {
    pub event: &'static str,
    pub session_id: &'a str,
}

impl<'a> InitRequest<'a> {
    pub fn new(session_id: &'a str) -> Self {
        Self {
            event: "new_session",
            session_id,
        }
    }
}

/// Body of an ordinary message POST.
#[derive(Clone, Debug, Serialize)]
pub struct MessageRequest<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
}
