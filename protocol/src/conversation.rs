use chrono::Utc;
use tracing::debug;

use crate::message::{ChatMessage, ChatTurn, Role};

/// Assistant reply shown when a turn fails for any reason.
pub const FALLBACK_REPLY: &str = "Съжалявам, възникна грешка. Моля, опитайте отново.";

/// The chat history of one widget instance, kept in memory only.
///
/// At most one turn is in flight. While it is, the assistant placeholder
/// opened by [`Conversation::open_reply`] is the only message that changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    in_flight: bool,
    reply_index: Option<usize>,
    next_seq: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Starts a turn with the user's input.
    ///
    /// Returns `None` and leaves the conversation untouched when the trimmed
    /// input is empty or another turn is still in flight. Otherwise appends
    /// the user message and returns the whole history to send to the relay.
    pub fn begin_turn(&mut self, input: &str) -> Option<Vec<ChatTurn>> {
        let text = input.trim();
        if text.is_empty() || self.in_flight {
            return None;
        }
        let message = ChatMessage::new(self.next_id(), Role::User, text);
        self.messages.push(message);
        self.in_flight = true;
        Some(self.messages.iter().map(ChatMessage::to_turn).collect())
    }

    /// Appends the empty assistant message that deltas are streamed into.
    pub fn open_reply(&mut self) {
        let message = ChatMessage::new(self.next_id(), Role::Assistant, String::new());
        self.messages.push(message);
        self.reply_index = Some(self.messages.len() - 1);
    }

    pub fn append_delta(&mut self, delta: &str) {
        match self.reply_index.and_then(|i| self.messages.get_mut(i)) {
            Some(reply) => reply.content.push_str(delta),
            None => debug!("dropping delta with no open reply: {delta:?}"),
        }
    }

    /// Ends the in-flight turn; the reply is final from here on.
    pub fn finish_turn(&mut self) {
        self.in_flight = false;
        self.reply_index = None;
    }

    /// Ends the in-flight turn with [`FALLBACK_REPLY`], replacing the open
    /// placeholder or appending a new assistant message if none was opened.
    pub fn fail_turn(&mut self) {
        match self.reply_index.and_then(|i| self.messages.get_mut(i)) {
            Some(reply) => reply.content = FALLBACK_REPLY.to_string(),
            None => {
                let message = ChatMessage::new(self.next_id(), Role::Assistant, FALLBACK_REPLY);
                self.messages.push(message);
            }
        }
        self.finish_turn();
    }

    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", Utc::now().timestamp_millis(), self.next_seq);
        self.next_seq += 1;
        id
    }
}
