//! Gemini SSE → text-delta frames, incrementally.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt::Display;
use std::pin::Pin;

use axum::body::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use newsroom_protocol::{encode_text_delta, LineReassembler};
use tracing::{debug, warn};

use crate::models::StreamChunk;

const DATA_PREFIX: &str = "data:";

/// Converts upstream SSE bytes into encoded frames, one per text delta.
///
/// Only complete lines are looked at; anything that is not a `data:` line
/// carrying candidate text is dropped.
#[derive(Debug, Default)]
pub struct SseTranscoder {
    lines: LineReassembler,
}

impl SseTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.lines
            .push(chunk)
            .iter()
            .filter_map(|line| transcode_line(line))
            .collect()
    }

    /// Flushes a last line that arrived without a newline.
    pub fn finish(&mut self) -> Option<Bytes> {
        self.lines.finish().and_then(|line| transcode_line(&line))
    }
}

fn transcode_line(line: &str) -> Option<Bytes> {
    extract_delta(line).map(|delta| Bytes::from(encode_text_delta(&delta)))
}

/// Text delta carried by one SSE line, if it carries any.
pub fn extract_delta(line: &str) -> Option<String> {
    let data = line.strip_prefix(DATA_PREFIX)?.trim();
    if data.is_empty() {
        return None;
    }
    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!("skipping malformed upstream event ({e}): {data}");
            return None;
        }
    };
    chunk
        .first_text()
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

struct RelayState<S> {
    upstream: Pin<Box<S>>,
    transcoder: SseTranscoder,
    ready: VecDeque<Bytes>,
    done: bool,
}

/// Re-streams an upstream SSE body as frames.
///
/// Pulls from upstream only when the consumer asks for the next frame, so a
/// slow client holds back the upstream read. An upstream error mid-stream is
/// logged and ends the output cleanly; headers are already sent by then.
pub fn relay_stream<S, E>(upstream: S) -> impl Stream<Item = Result<Bytes, Infallible>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = RelayState {
        upstream: Box::pin(upstream),
        transcoder: SseTranscoder::new(),
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.ready.pop_front() {
                return Some((Ok(frame), state));
            }
            if state.done {
                return None;
            }
            match state.upstream.next().await {
                Some(Ok(chunk)) => {
                    let frames = state.transcoder.push(&chunk);
                    state.ready.extend(frames);
                }
                Some(Err(e)) => {
                    warn!("upstream stream failed mid-response: {e}");
                    state.done = true;
                }
                None => {
                    debug!("upstream stream ended");
                    state.ready.extend(state.transcoder.finish());
                    state.done = true;
                }
            }
        }
    })
}
