//! UI Message Stream protocol support for the wagerdesk chat surface.
//!
//! The wire format follows the AI SDK UI Message Stream conventions:
//! kebab-case tagged events carried as SSE `data:` frames, terminated by a
//! `finish` or `error` event and a `[DONE]` trailer.

mod events;
mod message;

/// Wire protocol version advertised by streaming responses.
pub const STREAM_PROTOCOL_VERSION: &str = "v1";

pub use events::StreamEvent;
pub use message::{ChatMessage, MessagePart, Role, StreamState, ToolPart, ToolState};
