use thiserror::Error;

/// Failures of one chat turn on the consuming side. None of them is fatal to
/// the conversation: the turn ends with the fallback reply and the next
/// submission proceeds normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsumerError {
    #[error("Relay responded with status {status}")]
    Status { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to read response body: {0}")]
    Read(String),
}
