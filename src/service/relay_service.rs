use std::convert::Infallible;

use axum::body::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use newsroom_protocol::RelayRequest;
use tracing::info;

use crate::agent::GeminiClient;
use crate::errors::AppError;
use crate::service::transcoder::relay_stream;

/// Encoded text-delta frames on their way to the client.
pub type FrameStream = BoxStream<'static, Result<Bytes, Infallible>>;

/// Handles one chat turn: upstream call, then frame re-streaming.
///
/// Stateless across requests; clones share the upstream client.
#[derive(Clone)]
pub struct RelayService {
    agent: GeminiClient,
}

impl RelayService {
    pub fn new(agent: GeminiClient) -> Self {
        Self { agent }
    }

    /// Opens the upstream stream and returns the frame stream for the client.
    ///
    /// Errors here happen before any byte is streamed and become a JSON error
    /// response. Upstream failures after this point only shorten the stream.
    pub async fn open_stream(&self, request: RelayRequest) -> Result<FrameStream, AppError> {
        info!("relaying chat turn with {} messages", request.messages.len());
        let response = self.agent.stream_generate(&request.messages).await?;
        Ok(relay_stream(response.bytes_stream()).boxed())
    }
}
