//! Cancellation utilities
//!
//! Dropping a [`ChatStream`] already closes the upstream connection. A
//! [`CancelHandle`] lets another task stop a stream it does not own, even
//! while the stream is parked waiting for the next chunk.

use tokio_util::sync::CancellationToken;

use crate::streaming::{ChatStream, ChatStreamEvent};

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The wrapped stream ends with `StreamEnd` and
    /// drops its inner stream, which closes the HTTP connection so the
    /// provider stops generating tokens.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Make a ChatStream cancellable and return its cancel handle.
pub fn make_cancellable_stream(stream: ChatStream) -> (ChatStream, CancelHandle) {
    let handle = CancelHandle::new();
    let wrapped = with_cancel_handle(stream, &handle);
    (wrapped, handle)
}

/// Tie an existing handle to a stream; one handle may stop several streams.
pub fn with_cancel_handle(stream: ChatStream, handle: &CancelHandle) -> ChatStream {
    let token = handle.token.clone();
    let mut inner = stream;
    let s = async_stream::stream! {
        use futures::StreamExt;
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                item = inner.next() => Some(item),
            };
            match next {
                None => {
                    tracing::debug!(target: "chat_relay::stream", "stream cancelled");
                    yield Ok(ChatStreamEvent::StreamEnd);
                    break;
                }
                Some(None) => break,
                Some(Some(item)) => {
                    let terminal = !matches!(item, Ok(ChatStreamEvent::ContentDelta { .. }));
                    yield item;
                    if terminal {
                        break;
                    }
                }
            }
        }
    };
    Box::pin(s)
}
