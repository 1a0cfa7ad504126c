use leptos::prelude::*;
use leptos::task::spawn_local;
use newsroom_protocol::{ChatMessage, Conversation, ConversationHandle, StreamConsumer};

use crate::api::RelayTransport;

/// Chat widget state, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct ChatState {
    pub conversation: RwSignal<Conversation>,
}

impl ChatState {
    /// Create a new `ChatState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let state = Self { conversation: RwSignal::new(Conversation::new()) };
        provide_context(state);
        state
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.conversation.with(|c| c.messages().to_vec())
    }

    pub fn is_in_flight(&self) -> bool {
        self.conversation.with(Conversation::is_in_flight)
    }

    /// Streams the assistant reply to `text` into the conversation.
    /// Ignored while a reply is still streaming.
    pub fn send(&self, text: String) {
        let state = *self;
        spawn_local(async move {
            StreamConsumer::new(RelayTransport).submit(&state, &text).await;
        });
    }
}

impl ConversationHandle for ChatState {
    fn update(&self, f: impl FnOnce(&mut Conversation)) {
        if self.conversation.try_update(f).is_none() {
            log::warn!("chat widget disposed; dropping conversation update");
        }
    }
}
