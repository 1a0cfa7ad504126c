use leptos::ev;
use leptos::prelude::*;
use newsroom_protocol::Role;

use crate::state::ChatState;

/// Assistant chat: message history with the live reply, and the input.
#[component]
pub fn ChatWidget() -> impl IntoView {
    let state = expect_context::<ChatState>();

    view! {
        <section class="chat-widget">
            <div class="chat-header">"AI асистент"</div>

            <div class="messages-container">
                {move || {
                    let msgs = state.messages();
                    if msgs.is_empty() {
                        view! {
                            <div class="empty-state">
                                "Попитайте ме за новини, събития или информация от сайта."
                            </div>
                        }
                            .into_any()
                    } else {
                        msgs.into_iter()
                            .map(|m| view! { <MessageBubble role=m.role content=m.content /> })
                            .collect_view()
                            .into_any()
                    }
                }}
                // Shown until the first delta of the reply arrives
                {move || {
                    let waiting = state.is_in_flight()
                        && state
                            .conversation
                            .with(|c| c.messages().last().is_none_or(|m| m.content.is_empty()));
                    waiting.then(|| view! { <div class="typing-indicator">"…"</div> })
                }}
            </div>

            <ChatInput />
        </section>
    }
}

#[component]
fn MessageBubble(role: Role, content: String) -> impl IntoView {
    let (css_class, label) = match role {
        Role::User => ("message user", "Вие"),
        Role::Assistant => ("message assistant", "AI асистент"),
    };

    view! {
        <div class=css_class>
            <div class="role-label">{label}</div>
            <div class="message-content">{content}</div>
        </div>
    }
}

/// Chat input form with textarea and send button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<ChatState>();
    let (input, set_input) = signal(String::new());

    let is_sending = move || state.is_in_flight();

    let send = move || {
        let text = input.get().trim().to_string();
        if text.is_empty() || is_sending() {
            return;
        }
        set_input.set(String::new());
        state.send(text);
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send();
        }
    };

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    rows="1"
                    placeholder="Задайте въпрос… (Enter за изпращане, Shift+Enter за нов ред)"
                    prop:value=input
                    on:input=move |ev| {
                        set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                    disabled=is_sending
                />
                <button
                    class="send-btn"
                    on:click=move |_| send()
                    disabled=move || is_sending() || input.get().trim().is_empty()
                >
                    {move || if is_sending() { "Изпращане…" } else { "Изпрати" }}
                </button>
            </div>
        </div>
    }
}
