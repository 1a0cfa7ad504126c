//! Client side of the relay: sends a turn and folds the streamed frames into
//! the live assistant message.

use std::cell::RefCell;

use futures_util::stream::LocalBoxStream;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::conversation::Conversation;
use crate::errors::ConsumerError;
use crate::frame::decode_frame;
use crate::lines::LineReassembler;
use crate::message::RelayRequest;

/// Response body of the relay, chunk by chunk as the network delivers it.
pub type ByteStream = LocalBoxStream<'static, Result<Vec<u8>, ConsumerError>>;

/// Network seam of the consumer.
///
/// Implementations must report a non-success status as
/// [`ConsumerError::Status`] instead of returning its body.
#[allow(async_fn_in_trait)]
pub trait ChatTransport {
    async fn post(&self, request: &RelayRequest) -> Result<ByteStream, ConsumerError>;
}

/// Somewhere the conversation lives: a UI signal, a `RefCell`, ...
///
/// Every mutation goes through `update` so reactive holders can re-render.
pub trait ConversationHandle {
    fn update(&self, f: impl FnOnce(&mut Conversation));
}

impl ConversationHandle for RefCell<Conversation> {
    fn update(&self, f: impl FnOnce(&mut Conversation)) {
        f(&mut self.borrow_mut());
    }
}

/// Clears the in-flight flag however the turn ends, including when the
/// submitting future is dropped mid-stream.
struct FinishOnDrop<'a, H: ConversationHandle + ?Sized>(&'a H);

impl<H: ConversationHandle + ?Sized> Drop for FinishOnDrop<'_, H> {
    fn drop(&mut self) {
        self.0.update(Conversation::finish_turn);
    }
}

pub struct StreamConsumer<T> {
    transport: T,
}

impl<T: ChatTransport> StreamConsumer<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Runs one chat turn for `input`.
    ///
    /// A no-op when the input is blank or a turn is already in flight. Any
    /// failure ends the turn with the fallback reply; the conversation stays
    /// usable either way.
    pub async fn submit<H>(&self, conversation: &H, input: &str)
    where
        H: ConversationHandle + ?Sized,
    {
        let mut turns = None;
        conversation.update(|c| turns = c.begin_turn(input));
        let Some(messages) = turns else {
            debug!("submission ignored: blank input or turn in flight");
            return;
        };

        let _finish = FinishOnDrop(conversation);
        if let Err(err) = self.stream_turn(conversation, RelayRequest { messages }).await {
            warn!("chat turn failed: {err}");
            conversation.update(Conversation::fail_turn);
        }
    }

    async fn stream_turn<H>(&self, conversation: &H, request: RelayRequest) -> Result<(), ConsumerError>
    where
        H: ConversationHandle + ?Sized,
    {
        let mut body = self.transport.post(&request).await?;
        conversation.update(Conversation::open_reply);

        let mut lines = LineReassembler::new();
        while let Some(chunk) = body.next().await {
            for line in lines.push(&chunk?) {
                apply_line(conversation, &line);
            }
        }
        if let Some(rest) = lines.finish() {
            debug!("discarding unterminated frame at end of stream: {rest:?}");
        }
        Ok(())
    }
}

fn apply_line<H: ConversationHandle + ?Sized>(conversation: &H, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match decode_frame(line) {
        Some(delta) => conversation.update(|c| c.append_delta(&delta)),
        None => debug!("ignoring line that is not a text frame: {line:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::FALLBACK_REPLY;
    use crate::frame::encode_text_delta;
    use crate::message::Role;
    use futures::channel::mpsc;
    use futures_util::stream;

    /// Replays canned chunks, or fails the POST with a status.
    struct CannedTransport {
        response: Result<Vec<Vec<u8>>, ConsumerError>,
        seen: RefCell<Vec<RelayRequest>>,
    }

    impl CannedTransport {
        fn chunks(chunks: Vec<Vec<u8>>) -> Self {
            Self { response: Ok(chunks), seen: RefCell::new(Vec::new()) }
        }

        fn failing(err: ConsumerError) -> Self {
            Self { response: Err(err), seen: RefCell::new(Vec::new()) }
        }
    }

    impl ChatTransport for CannedTransport {
        async fn post(&self, request: &RelayRequest) -> Result<ByteStream, ConsumerError> {
            self.seen.borrow_mut().push(request.clone());
            let chunks = self.response.clone()?;
            Ok(stream::iter(chunks.into_iter().map(Ok)).boxed_local())
        }
    }

    /// Streams whatever the test pushes into the channel.
    struct ChannelTransport {
        body: RefCell<Option<mpsc::UnboundedReceiver<Result<Vec<u8>, ConsumerError>>>>,
    }

    impl ChatTransport for ChannelTransport {
        async fn post(&self, _request: &RelayRequest) -> Result<ByteStream, ConsumerError> {
            let rx = self.body.borrow_mut().take().ok_or(ConsumerError::Network("used".into()))?;
            Ok(rx.boxed_local())
        }
    }

    fn frames(deltas: &[&str]) -> Vec<u8> {
        deltas.iter().map(|d| encode_text_delta(d)).collect::<String>().into_bytes()
    }

    #[tokio::test]
    async fn streamed_frames_build_the_reply() {
        let transport = CannedTransport::chunks(vec![frames(&["Здра", "сти!"])]);
        let consumer = StreamConsumer::new(transport);
        let conv = RefCell::new(Conversation::new());

        consumer.submit(&conv, "Какво е новото?").await;

        let conv = conv.into_inner();
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].role, Role::User);
        assert_eq!(conv.messages()[1].role, Role::Assistant);
        assert_eq!(conv.messages()[1].content, "Здрасти!");
        assert!(!conv.is_in_flight());
    }

    #[tokio::test]
    async fn posts_full_history_including_new_message() {
        let consumer = StreamConsumer::new(CannedTransport::chunks(vec![frames(&["едно"])]));
        let conv = RefCell::new(Conversation::new());
        consumer.submit(&conv, "първи").await;
        consumer.submit(&conv, "втори").await;

        let seen = consumer.transport.seen.borrow();
        assert_eq!(seen.len(), 2);
        let contents: Vec<_> = seen[1].messages.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["първи", "едно", "втори"]);
    }

    #[tokio::test]
    async fn frame_split_across_chunks_is_one_delta() {
        let transport = CannedTransport::chunks(vec![b"0:\"hel".to_vec(), b"lo\"\n".to_vec()]);
        let consumer = StreamConsumer::new(transport);
        let conv = RefCell::new(Conversation::new());
        let deltas = RefCell::new(Vec::new());

        struct Recording<'a>(&'a RefCell<Conversation>, &'a RefCell<Vec<String>>);
        impl ConversationHandle for Recording<'_> {
            fn update(&self, f: impl FnOnce(&mut Conversation)) {
                let mut conv = self.0.borrow_mut();
                let before = conv.messages().last().map(|m| m.content.clone());
                f(&mut conv);
                let after = conv.messages().last().map(|m| m.content.clone());
                if let (Some(before), Some(after)) = (before, after) {
                    if after.len() > before.len() && after.starts_with(&before) {
                        self.1.borrow_mut().push(after[before.len()..].to_string());
                    }
                }
            }
        }

        consumer.submit(&Recording(&conv, &deltas), "hi").await;
        assert_eq!(deltas.into_inner(), vec!["hello".to_string()]);
        assert_eq!(conv.borrow().messages()[1].content, "hello");
    }

    #[tokio::test]
    async fn chunking_at_every_byte_gives_same_reply() {
        let body = frames(&["Здрасти, ", "\"свят\"", "\n\tот релето\\"]);
        for split in 0..=body.len() {
            let (a, b) = body.split_at(split);
            let transport = CannedTransport::chunks(vec![a.to_vec(), b.to_vec()]);
            let consumer = StreamConsumer::new(transport);
            let conv = RefCell::new(Conversation::new());
            consumer.submit(&conv, "hi").await;
            assert_eq!(
                conv.borrow().messages()[1].content,
                "Здрасти, \"свят\"\n\tот релето\\",
                "split at {split}"
            );
        }
    }

    #[tokio::test]
    async fn blank_and_foreign_lines_are_skipped() {
        let body = b"\n0:\"a\"\n\n2:[1]\n0:\"b\"\n0:\"trunc".to_vec();
        let consumer = StreamConsumer::new(CannedTransport::chunks(vec![body]));
        let conv = RefCell::new(Conversation::new());
        consumer.submit(&conv, "hi").await;
        assert_eq!(conv.borrow().messages()[1].content, "ab");
    }

    #[tokio::test]
    async fn second_submit_while_streaming_is_ignored() {
        let (tx, rx) = mpsc::unbounded();
        let consumer = StreamConsumer::new(ChannelTransport { body: RefCell::new(Some(rx)) });
        let conv = RefCell::new(Conversation::new());

        {
            let first = consumer.submit(&conv, "първи");
            futures::pin_mut!(first);
            assert!(futures::poll!(first.as_mut()).is_pending());
            assert_eq!(conv.borrow().len(), 2);
            assert!(conv.borrow().is_in_flight());

            consumer.submit(&conv, "втори").await;
            assert_eq!(conv.borrow().len(), 2);

            tx.unbounded_send(Ok(frames(&["готово"]))).unwrap();
            drop(tx);
            first.await;
        }

        let conv = conv.into_inner();
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[1].content, "готово");
        assert!(!conv.is_in_flight());
    }

    #[tokio::test]
    async fn non_success_status_appends_single_fallback() {
        let transport = CannedTransport::failing(ConsumerError::Status { status: 500 });
        let consumer = StreamConsumer::new(transport);
        let conv = RefCell::new(Conversation::new());

        consumer.submit(&conv, "Какво е новото?").await;

        let conv = conv.into_inner();
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[1].role, Role::Assistant);
        assert_eq!(conv.messages()[1].content, FALLBACK_REPLY);
        assert!(!conv.is_in_flight());
    }

    #[tokio::test]
    async fn read_error_replaces_placeholder_with_fallback() {
        let (tx, rx) = mpsc::unbounded();
        let consumer = StreamConsumer::new(ChannelTransport { body: RefCell::new(Some(rx)) });
        let conv = RefCell::new(Conversation::new());

        tx.unbounded_send(Ok(frames(&["частично"]))).unwrap();
        tx.unbounded_send(Err(ConsumerError::Read("connection reset".into()))).unwrap();
        drop(tx);
        consumer.submit(&conv, "hi").await;

        let conv = conv.into_inner();
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[1].content, FALLBACK_REPLY);
        assert!(!conv.is_in_flight());
    }

    #[tokio::test]
    async fn dropping_the_turn_clears_in_flight() {
        let (_tx, rx) = mpsc::unbounded::<Result<Vec<u8>, ConsumerError>>();
        let consumer = StreamConsumer::new(ChannelTransport { body: RefCell::new(Some(rx)) });
        let conv = RefCell::new(Conversation::new());

        {
            let turn = consumer.submit(&conv, "hi");
            futures::pin_mut!(turn);
            assert!(futures::poll!(turn.as_mut()).is_pending());
            assert!(conv.borrow().is_in_flight());
        }
        assert!(!conv.borrow().is_in_flight());
    }
}
