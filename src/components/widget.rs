//! The floating widget shell: toggle button, open/close state, and the
//! session lifecycle hooks tied to the panel's visibility.

use gloo_timers::callback::Timeout;
use leptos::prelude::*;

use crate::components::window::ChatWindow;
use crate::config::{Position, WidgetConfig};
use crate::state::ChatState;

/// Floating chat widget. Renders the toggle button in the configured corner
/// and mounts the chat window while open. Opening the panel starts (or
/// resumes) the session; closing it ends the session.
#[component]
pub fn ChatWidget(config: WidgetConfig) -> impl IntoView {
    let state = ChatState::provide(&config);
    let (open, set_open) = signal(false);

    if let Some(delay) = config.auto_open_delay_ms {
        Timeout::new(delay, move || set_open.set(true)).forget();
    }

    // The panel's visibility drives the session lifecycle, whether it was
    // toggled by the user or by the auto-open timer.
    {
        let state = state.clone();
        Effect::new(move |prev: Option<bool>| {
            let is_open = open.get();
            let was_open = prev.unwrap_or(false);
            if is_open && !was_open {
                state.open_session();
            } else if was_open && !is_open {
                state.teardown();
            }
            is_open
        });
    }

    let container_class = match config.position {
        Position::BottomRight => "chat-widget bottom-right",
        Position::BottomLeft => "chat-widget bottom-left",
    };
    let toggle_color = config.primary_color.clone();
    let window_config = config.clone();

    view! {
        <div class=container_class>
            <style>{WIDGET_CSS}</style>
            {move || {
                open.get()
                    .then(|| {
                        view! {
                            <ChatWindow
                                config=window_config.clone()
                                on_close=move |()| set_open.set(false)
                            />
                        }
                    })
            }}
            <button
                class="chat-toggle"
                style:background=toggle_color
                on:click=move |_| set_open.update(|o| *o = !*o)
                aria-label=move || if open.get() { "Close chat" } else { "Open chat" }
            >
                {move || if open.get() { "✕" } else { "💬" }}
            </button>
        </div>
    }
}

const WIDGET_CSS: &str = r#"
.chat-widget {
    position: fixed;
    bottom: 24px;
    z-index: 50;
    display: flex;
    flex-direction: column;
    align-items: flex-end;
    gap: 16px;
    font-family: system-ui, -apple-system, sans-serif;
}
.chat-widget.bottom-right { right: 24px; }
.chat-widget.bottom-left { left: 24px; align-items: flex-start; }
.chat-toggle {
    width: 56px;
    height: 56px;
    border-radius: 50%;
    border: none;
    cursor: pointer;
    color: white;
    font-size: 20px;
    box-shadow: 0 10px 25px rgba(0, 0, 0, 0.2);
    transition: transform 0.2s ease;
}
.chat-toggle:hover { transform: scale(1.1); }
.chat-window {
    background: white;
    border-radius: 16px;
    box-shadow: 0 25px 50px -12px rgba(0, 0, 0, 0.25);
    width: 350px;
    height: 450px;
    display: flex;
    flex-direction: column;
    overflow: hidden;
}
.chat-header {
    color: white;
    padding: 16px;
    display: flex;
    align-items: center;
    justify-content: space-between;
}
.chat-header-info { display: flex; align-items: center; gap: 8px; }
.chat-avatar {
    width: 36px;
    height: 36px;
    background: rgba(255, 255, 255, 0.25);
    border-radius: 50%;
    display: flex;
    align-items: center;
    justify-content: center;
}
.chat-title { font-weight: 600; font-size: 14px; margin: 0; }
.chat-subtitle { font-size: 12px; opacity: 0.85; margin: 0; }
.chat-close {
    background: none;
    border: none;
    color: white;
    cursor: pointer;
    width: 28px;
    height: 28px;
    border-radius: 4px;
}
.chat-close:hover { background: rgba(255, 255, 255, 0.2); }
.chat-messages {
    flex: 1;
    overflow-y: auto;
    padding: 16px;
    display: flex;
    flex-direction: column;
    gap: 12px;
}
.chat-row { display: flex; }
.chat-row.user { justify-content: flex-end; }
.chat-row.bot { justify-content: flex-start; }
.chat-message {
    max-width: 80%;
    padding: 10px 12px;
    border-radius: 14px;
    font-size: 14px;
    line-height: 1.4;
    white-space: pre-wrap;
    word-break: break-word;
}
.chat-message.user {
    color: white;
    border-bottom-right-radius: 4px;
}
.chat-message.bot {
    background: #f1f5f9;
    color: #1f2937;
    border-bottom-left-radius: 4px;
}
.chat-typing {
    display: flex;
    gap: 4px;
    padding: 12px;
    background: #f1f5f9;
    border-radius: 14px;
    border-bottom-left-radius: 4px;
}
.chat-typing span {
    width: 6px;
    height: 6px;
    background: #94a3b8;
    border-radius: 50%;
    animation: chat-bounce 1.4s infinite ease-in-out;
}
.chat-typing span:nth-child(1) { animation-delay: -0.32s; }
.chat-typing span:nth-child(2) { animation-delay: -0.16s; }
@keyframes chat-bounce {
    0%, 80%, 100% { transform: translateY(0); }
    40% { transform: translateY(-6px); }
}
.chat-input-area { padding: 12px 16px; border-top: 1px solid #e5e7eb; }
.chat-input-row { display: flex; gap: 8px; }
.chat-input-row input {
    flex: 1;
    padding: 8px 12px;
    border: 1px solid #d1d5db;
    border-radius: 8px;
    font-size: 14px;
    outline: none;
}
.chat-send {
    border: none;
    border-radius: 8px;
    padding: 8px 14px;
    color: white;
    cursor: pointer;
    font-size: 14px;
}
.chat-send:disabled { opacity: 0.5; cursor: not-allowed; }
.chat-hint {
    font-size: 11px;
    color: #9ca3af;
    text-align: center;
    margin: 8px 0 0;
}
"#;
