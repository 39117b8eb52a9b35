//! Streaming primitives
//!
//! A [`ChatStream`] yields text deltas and ends with exactly one terminal
//! item: `Ok(ChatStreamEvent::StreamEnd)` or a single `Err(LlmError)`.

pub mod factory;
pub mod frame_reader;

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::error::{ErrorKind, LlmError};

pub use factory::StreamFactory;
pub use frame_reader::{FrameCodec, FrameDelimiter, FrameReader};

/// Events yielded by a chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    /// Next fragment of assistant text. Never empty.
    ContentDelta { delta: String },
    /// Normal end of the stream.
    StreamEnd,
}

pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatStreamEvent, LlmError>> + Send>>;

/// How a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTerminal {
    Done,
    Error(LlmError),
}

impl StreamTerminal {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Done => None,
            Self::Error(e) => Some(e.kind()),
        }
    }
}

/// Enforce the terminal contract on any stream.
///
/// Empty deltas are dropped, nothing is forwarded after the first terminal,
/// and a stream that simply runs out gets a trailing `StreamEnd`.
pub fn fuse_terminal(mut inner: ChatStream) -> ChatStream {
    let s = async_stream::stream! {
        loop {
            match inner.next().await {
                Some(Ok(ChatStreamEvent::ContentDelta { delta })) => {
                    if !delta.is_empty() {
                        yield Ok(ChatStreamEvent::ContentDelta { delta });
                    }
                }
                Some(Ok(ChatStreamEvent::StreamEnd)) | None => {
                    yield Ok(ChatStreamEvent::StreamEnd);
                    break;
                }
                Some(Err(e)) => {
                    yield Err(e);
                    break;
                }
            }
        }
    };
    Box::pin(s)
}

/// Drain a stream, concatenating deltas. A stream that ends without a
/// terminal counts as `Done`.
pub async fn collect_text(mut stream: ChatStream) -> (String, StreamTerminal) {
    let mut text = String::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(ChatStreamEvent::ContentDelta { delta }) => text.push_str(&delta),
            Ok(ChatStreamEvent::StreamEnd) => return (text, StreamTerminal::Done),
            Err(e) => return (text, StreamTerminal::Error(e)),
        }
    }
    (text, StreamTerminal::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn delta(s: &str) -> Result<ChatStreamEvent, LlmError> {
        Ok(ChatStreamEvent::ContentDelta {
            delta: s.to_string(),
        })
    }

    #[tokio::test]
    async fn fuse_stops_after_first_terminal() {
        let inner: ChatStream = Box::pin(stream::iter(vec![
            delta("a"),
            delta(""),
            Err(LlmError::HttpError("reset".into())),
            delta("late"),
            Ok(ChatStreamEvent::StreamEnd),
        ]));
        let items: Vec<_> = fuse_terminal(inner).collect().await;
        assert_eq!(
            items,
            vec![delta("a"), Err(LlmError::HttpError("reset".into()))]
        );
    }

    #[tokio::test]
    async fn fuse_appends_end_when_inner_runs_out() {
        let inner: ChatStream = Box::pin(stream::iter(vec![delta("x")]));
        let items: Vec<_> = fuse_terminal(inner).collect().await;
        assert_eq!(items, vec![delta("x"), Ok(ChatStreamEvent::StreamEnd)]);
    }

    #[tokio::test]
    async fn collect_text_reports_error_terminal() {
        let inner: ChatStream = Box::pin(stream::iter(vec![
            delta("He"),
            Err(LlmError::RateLimitError("slow down".into())),
        ]));
        let (text, terminal) = collect_text(inner).await;
        assert_eq!(text, "He");
        assert_eq!(terminal.error_kind(), Some(ErrorKind::RateLimited));
    }
}
