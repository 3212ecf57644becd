//! The chat panel: header, message list, typing indicator, and input row.
//! Presentation only; every lifecycle decision lives in [`ChatState`] and
//! the conversation state machine behind it.

use leptos::ev;
use leptos::html;
use leptos::prelude::*;

use crate::config::WidgetConfig;
use crate::models::{Message, MessageKind};
use crate::state::ChatState;

#[component]
pub fn ChatWindow(config: WidgetConfig, #[prop(into)] on_close: Callback<()>) -> impl IntoView {
    let state = expect_context::<ChatState>();
    let list_ref: NodeRef<html::Div> = NodeRef::new();

    let conversation = state.conversation;
    let visible = move || conversation.get().visible_messages();

    // Keep the list scrolled to the newest entry.
    Effect::new(move |_| {
        conversation.track();
        if let Some(el) = list_ref.get() {
            el.set_scroll_top(el.scroll_height());
        }
    });

    let header_color = config.primary_color.clone();
    let bubble_color = config.primary_color.clone();
    let trusted_html = config.trusted_html;

    view! {
        <div class="chat-window">
            <div class="chat-header" style:background=header_color>
                <div class="chat-header-info">
                    <div class="chat-avatar">"🤖"</div>
                    <div>
                        <p class="chat-title">{config.title.clone()}</p>
                        <p class="chat-subtitle">{config.subtitle.clone()}</p>
                    </div>
                </div>
                <button
                    class="chat-close"
                    aria-label="Close chat"
                    on:click=move |_| on_close.run(())
                >
                    "✕"
                </button>
            </div>

            <div class="chat-messages" node_ref=list_ref>
                <For each=visible key=|m| m.id.clone() let:message>
                    <MessageBubble
                        message=message
                        trusted_html=trusted_html
                        bubble_color=bubble_color.clone()
                    />
                </For>
            </div>

            <ChatInput send_color=config.primary_color.clone() />
        </div>
    }
}

/// One rendered entry. Bot content is escaped text unless the operator
/// opted into trusted HTML; the webhook then owns script safety.
#[component]
fn MessageBubble(message: Message, trusted_html: bool, bubble_color: String) -> impl IntoView {
    let row_class = match message.kind {
        MessageKind::User => "chat-row user",
        MessageKind::Bot | MessageKind::Typing => "chat-row bot",
    };

    let body = match message.kind {
        MessageKind::Typing => view! {
            <div class="chat-typing">
                <span></span>
                <span></span>
                <span></span>
            </div>
        }
        .into_any(),
        MessageKind::User => view! {
            <div class="chat-message user" style:background=bubble_color>
                {message.content.clone()}
            </div>
        }
        .into_any(),
        MessageKind::Bot if trusted_html => view! {
            <div class="chat-message bot" inner_html=message.content.clone()></div>
        }
        .into_any(),
        MessageKind::Bot => view! {
            <div class="chat-message bot">{message.content.clone()}</div>
        }
        .into_any(),
    };

    view! { <div class=row_class>{body}</div> }
}

/// Input row with Enter-to-send. The input is disabled while a round trip
/// is outstanding, but the real guard is in the conversation itself.
#[component]
fn ChatInput(send_color: String) -> impl IntoView {
    let state = expect_context::<ChatState>();
    let (input, set_input) = signal(String::new());

    let conversation = state.conversation;
    let pending = move || conversation.get().pending();

    let submit = {
        let state = state.clone();
        move || {
            let text = input.get_untracked();
            if text.trim().is_empty() {
                return;
            }
            set_input.set(String::new());
            state.send(text);
        }
    };

    let submit_on_key = submit.clone();
    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            submit_on_key();
        }
    };

    view! {
        <div class="chat-input-area">
            <div class="chat-input-row">
                <input
                    type="text"
                    placeholder="Type your message..."
                    prop:value=input
                    on:input=move |ev| set_input.set(event_target_value(&ev))
                    on:keydown=on_keydown
                    disabled=pending
                />
                <button
                    class="chat-send"
                    style:background=send_color
                    on:click=move |_| submit()
                    disabled=move || pending() || input.get().trim().is_empty()
                >
                    "➤"
                </button>
            </div>
            <p class="chat-hint">"Press Enter to send"</p>
        </div>
    }
}
