//! Stream Factory
//!
//! Frames a response body with [`FrameCodec`] and feeds each frame to a
//! provider adapter, producing a [`ChatStream`] that honors the terminal
//! contract.

use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use super::{ChatStream, ChatStreamEvent, FrameCodec};
use crate::error::LlmError;
use crate::providers::{FrameOutcome, ProviderAdapter};

/// Stream Factory
pub struct StreamFactory;

impl StreamFactory {
    /// Build a chat stream from raw body chunks.
    ///
    /// Transport errors in `body` end the stream with that error. If the body
    /// closes without the adapter's sentinel, the stream ends normally as long
    /// as at least one byte arrived; a body that closes empty is reported as a
    /// connection error.
    pub fn from_byte_stream<S>(body: S, adapter: Arc<dyn ProviderAdapter>) -> ChatStream
    where
        S: Stream<Item = Result<Bytes, LlmError>> + Send + 'static,
    {
        let s = async_stream::stream! {
            let provider = adapter.provider_id().to_string();
            let body = Box::pin(body).map(|chunk| chunk.map_err(std::io::Error::other));
            let mut frames = FramedRead::new(
                StreamReader::new(body),
                FrameCodec::new(adapter.frame_delimiter()),
            );

            while let Some(frame) = frames.next().await {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(
                            target: "chat_relay::stream",
                            provider = %provider,
                            error = %e,
                            "body read failed mid-stream"
                        );
                        yield Err(e);
                        return;
                    }
                };

                match adapter.extract_delta(&frame) {
                    FrameOutcome::Delta(delta) => {
                        if !delta.is_empty() {
                            yield Ok(ChatStreamEvent::ContentDelta { delta });
                        }
                    }
                    FrameOutcome::End => {
                        tracing::debug!(
                            target: "chat_relay::stream",
                            provider = %provider,
                            bytes = frames.decoder().bytes_received(),
                            "end sentinel received"
                        );
                        yield Ok(ChatStreamEvent::StreamEnd);
                        return;
                    }
                    FrameOutcome::Skip => {
                        tracing::trace!(
                            target: "chat_relay::stream",
                            provider = %provider,
                            frame_len = frame.len(),
                            "frame skipped"
                        );
                    }
                }
            }

            let received = frames.decoder().bytes_received();
            if received == 0 {
                yield Err(LlmError::HttpError(format!(
                    "provider={provider} closed the connection before sending any data"
                )));
            } else {
                tracing::debug!(
                    target: "chat_relay::stream",
                    provider = %provider,
                    bytes = received,
                    "body closed"
                );
                yield Ok(ChatStreamEvent::StreamEnd);
            }
        };
        Box::pin(s)
    }
}
