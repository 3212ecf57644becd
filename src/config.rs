/// Corner of the viewport the widget anchors to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    BottomRight,
    BottomLeft,
}

/// Configuration for one embedded widget. Only `webhook_url` affects the
/// session/message lifecycle; everything else is presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetConfig {
    pub webhook_url: String,
    pub title: String,
    pub subtitle: String,
    pub primary_color: String,
    pub position: Position,
    /// Open the panel by itself after this many milliseconds.
    pub auto_open_delay_ms: Option<u32>,
    /// Render bot replies as raw HTML. Off by default: turning this on
    /// means trusting the webhook with script injection into the host page.
    pub trusted_html: bool,
}

impl WidgetConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            title: "AI Assistant".to_string(),
            subtitle: "Online".to_string(),
            primary_color: "#2563eb".to_string(),
            position: Position::BottomRight,
            auto_open_delay_ms: None,
            trusted_html: false,
        }
    }
}
