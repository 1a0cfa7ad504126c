mod api;
mod components;
mod state;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::chat::ChatWidget;
use state::ChatState;

/// Root component: the assistant widget embedded in the news site.
#[component]
fn App() -> impl IntoView {
    ChatState::provide();

    view! {
        <div class="assistant-container">
            <ChatWidget />
        </div>
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
