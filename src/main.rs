mod api;
mod components;
mod config;
mod conversation;
mod error;
mod models;
mod session;
mod state;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::widget::ChatWidget;
use config::WidgetConfig;

/// Conversational backend for this deployment.
const WEBHOOK_URL: &str =
    "https://alpharc.app.n8n.cloud/webhook/9b07fb75-bc10-4c31-ae17-2055bbcc5018";

/// Root component: the host page plus one embedded widget.
#[component]
fn App() -> impl IntoView {
    let config = WidgetConfig {
        title: "Customer Support".to_string(),
        ..WidgetConfig::new(WEBHOOK_URL)
    };

    view! { <ChatWidget config=config /> }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
