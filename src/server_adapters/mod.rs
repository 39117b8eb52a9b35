//! Server adapters: turn a [`ChatStream`] into the relay wire format
//!
//! Whatever the upstream provider speaks, the relay always emits the same
//! OpenAI-shaped envelope, one SSE `data:` frame per delta:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//!
//! data: [DONE]
//!
//! ```
//!
//! Errors never surface as HTTP failures once streaming has begun. They are
//! rendered as a final content envelope (`❌ Error: <message>. <hint>`)
//! followed by `[DONE]`, so every relay response ends with exactly one
//! `[DONE]` frame.
//!
//! - **Framework-agnostic**: [`relay_payloads`] and [`sse_lines`]
//! - **Axum**: [`axum::router`] and [`axum::to_sse_response`] (requires `server-adapters`)

use std::convert::Infallible;
use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::error::LlmError;
use crate::streaming::{ChatStream, ChatStreamEvent, fuse_terminal};

#[cfg(feature = "server-adapters")]
pub mod axum;

/// Payload of the terminal frame.
pub const DONE_PAYLOAD: &str = "[DONE]";

/// Terminal frame as written on the wire.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Prefix of the content envelope that carries a mid-stream error.
pub const ERROR_PREFIX: &str = "❌ Error: ";

/// JSON payload of one content envelope.
pub fn envelope_json(content: &str) -> String {
    serde_json::json!({ "choices": [{ "delta": { "content": content } }] }).to_string()
}

/// One complete envelope frame, including the trailing blank line.
pub fn encode_delta_frame(content: &str) -> String {
    format!("data: {}\n\n", envelope_json(content))
}

/// Text shown to the user when a stream fails.
pub fn error_content(error: &LlmError) -> String {
    format!("{ERROR_PREFIX}{}", error.user_message_with_hint())
}

/// Frame payloads (without the `data: ` prefix) for a chat stream.
///
/// Yields one envelope per non-empty delta, an error envelope if the stream
/// fails, and always finishes with [`DONE_PAYLOAD`].
pub fn relay_payloads(stream: ChatStream) -> Pin<Box<dyn Stream<Item = String> + Send>> {
    let mut inner = fuse_terminal(stream);
    let s = async_stream::stream! {
        let mut deltas = 0usize;
        while let Some(item) = inner.next().await {
            match item {
                Ok(ChatStreamEvent::ContentDelta { delta }) => {
                    deltas += 1;
                    yield envelope_json(&delta);
                }
                Ok(ChatStreamEvent::StreamEnd) => break,
                Err(e) => {
                    tracing::warn!(
                        target: "chat_relay::stream",
                        kind = ?e.kind(),
                        error = %e,
                        deltas,
                        "stream failed; sending error envelope"
                    );
                    yield envelope_json(&error_content(&e));
                    break;
                }
            }
        }
        tracing::debug!(target: "chat_relay::stream", deltas, "relay stream finished");
        yield DONE_PAYLOAD.to_string();
    };
    Box::pin(s)
}

/// Wire frames (`data: ...\n\n`) for a chat stream.
///
/// The `Result` wrapper lets the output feed a streaming HTTP body directly.
pub fn sse_lines(
    stream: ChatStream,
) -> Pin<Box<dyn Stream<Item = Result<String, Infallible>> + Send>> {
    Box::pin(relay_payloads(stream).map(|payload| Ok(format!("data: {payload}\n\n"))))
}
