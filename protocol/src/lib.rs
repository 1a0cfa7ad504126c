//! Wire types and stream plumbing shared by the relay server and the browser
//! chat widget.
//!
//! The relay speaks a minimal line protocol to the browser: every line is one
//! text delta of the assistant reply, shaped `0:"<escaped text>"`. This crate
//! owns both ends of that protocol plus the incremental line reassembly that
//! both sides need when bytes arrive in arbitrary chunks.

pub mod consumer;
pub mod conversation;
pub mod errors;
pub mod frame;
pub mod lines;
pub mod message;

pub use consumer::{ByteStream, ChatTransport, ConversationHandle, StreamConsumer};
pub use conversation::{Conversation, FALLBACK_REPLY};
pub use errors::ConsumerError;
pub use frame::{decode_frame, encode_text_delta, escape, unescape};
pub use lines::LineReassembler;
pub use message::{ChatMessage, ChatTurn, RelayErrorBody, RelayRequest, Role};
