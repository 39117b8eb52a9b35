//! Relay consumer
//!
//! Client side of the relay wire format. [`RelayClient`] posts a
//! conversation to `/api/chat` and feeds the streamed envelopes into a
//! callback; [`Conversation`] keeps the chat history and renders failures
//! as assistant content, the way a chat UI shows them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use uuid::Uuid;

use crate::error::LlmError;
use crate::server_adapters::{DONE_PAYLOAD, error_content};
use crate::streaming::{FrameCodec, FrameDelimiter};
use crate::types::{ChatRequest, Message, RequestConfig, Role};
use crate::utils::error_handling::{classify_http_error, classify_transport_error};

const RELAY: &str = "relay";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    choices: Vec<EnvelopeChoice>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeChoice {
    #[serde(default)]
    delta: Option<EnvelopeDelta>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeDelta {
    #[serde(default)]
    content: Option<String>,
}

enum RelayLine {
    Delta(String),
    Done,
    Skip,
}

fn parse_relay_line(line: &str) -> RelayLine {
    let Some(payload) = crate::providers::sse_field(line, "data") else {
        return RelayLine::Skip;
    };
    if payload.trim() == DONE_PAYLOAD {
        return RelayLine::Done;
    }
    match serde_json::from_str::<Envelope>(payload) {
        Ok(envelope) => envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta)
            .and_then(|d| d.content)
            .filter(|c| !c.is_empty())
            .map_or(RelayLine::Skip, RelayLine::Delta),
        Err(e) => {
            tracing::debug!(
                target: "chat_relay::stream",
                error = %e,
                "skipping malformed envelope"
            );
            RelayLine::Skip
        }
    }
}

/// Read a relay response body, calling `on_delta` for every content delta.
///
/// Returns at `[DONE]`, or when the body closes. A body that closes without
/// sending a single byte is a connection error.
pub async fn read_relay_stream<S, F>(body: S, mut on_delta: F) -> Result<(), LlmError>
where
    S: Stream<Item = Result<Bytes, LlmError>>,
    F: FnMut(&str),
{
    let body = std::pin::pin!(body);
    let mut lines = FramedRead::new(
        StreamReader::new(body.map(|chunk| chunk.map_err(std::io::Error::other))),
        FrameCodec::new(FrameDelimiter::Line),
    );

    while let Some(line) = lines.next().await {
        match parse_relay_line(&line?) {
            RelayLine::Delta(delta) => on_delta(&delta),
            RelayLine::Done => return Ok(()),
            RelayLine::Skip => {}
        }
    }

    if lines.decoder().bytes_received() == 0 {
        return Err(LlmError::HttpError(
            "relay closed the connection before sending any data".to_string(),
        ));
    }
    // Connection closed without [DONE]; keep what arrived.
    Ok(())
}

/// HTTP client for a running relay.
#[derive(Debug, Clone)]
pub struct RelayClient {
    base_url: String,
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Post a chat request and stream the reply into `on_delta`.
    pub async fn stream_chat<F>(&self, request: &ChatRequest, on_delta: F) -> Result<(), LlmError>
    where
        F: FnMut(&str),
    {
        let response = self
            .http
            .post(self.chat_url())
            .json(request)
            .send()
            .await
            .map_err(|e| classify_transport_error(RELAY, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(RELAY, status.as_u16(), &body));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| classify_transport_error(RELAY, e)));
        read_relay_stream(body, on_delta).await
    }
}

/// One message as displayed in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    fn to_wire(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}

/// Clears the loading flag when the submission ends, even if it is dropped.
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self(flag.clone()))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Chat history plus the provider selection and per-provider settings.
#[derive(Debug)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    provider: String,
    model: String,
    settings: HashMap<String, RequestConfig>,
    loading: Arc<AtomicBool>,
}

impl Conversation {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            provider: provider.into(),
            model: model.into(),
            settings: HashMap::new(),
            loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn select(&mut self, provider: impl Into<String>, model: impl Into<String>) {
        self.provider = provider.into();
        self.model = model.into();
    }

    /// Key and base URL sent with every request to `provider`.
    pub fn set_provider_settings(&mut self, provider: impl Into<String>, settings: RequestConfig) {
        self.settings.insert(provider.into(), settings);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Shared flag for observers (spinners, disabled inputs).
    pub fn loading_flag(&self) -> Arc<AtomicBool> {
        self.loading.clone()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Send `input` and stream the reply into a new assistant message.
    ///
    /// Returns `None` without doing anything when the input is blank or a
    /// submission is already running. Failures are rendered into the
    /// assistant message instead of being returned.
    pub async fn submit(&mut self, relay: &RelayClient, input: &str) -> Option<&ChatMessage> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        let _guard = LoadingGuard::acquire(&self.loading)?;

        let user = ChatMessage::new(Role::User, text);
        let mut wire: Vec<Message> = self.messages.iter().map(ChatMessage::to_wire).collect();
        wire.push(user.to_wire());
        self.messages.push(user);

        let request = ChatRequest {
            messages: wire,
            provider: self.provider.clone(),
            model: self.model.clone(),
            config: self.settings.get(&self.provider).cloned(),
        };

        self.messages.push(ChatMessage::new(Role::Assistant, ""));
        let idx = self.messages.len() - 1;
        let result = {
            let reply = &mut self.messages[idx].content;
            relay.stream_chat(&request, |delta| reply.push_str(delta)).await
        };

        if let Err(e) = result {
            tracing::warn!(
                target: "chat_relay::stream",
                provider = %self.provider,
                kind = ?e.kind(),
                error = %e,
                "chat submission failed"
            );
            let reply = &mut self.messages[idx].content;
            if !reply.is_empty() {
                reply.push_str("\n\n");
            }
            reply.push_str(&error_content(&e));
        }

        self.messages.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::server_adapters::{DONE_FRAME, encode_delta_frame};
    use futures::stream;

    fn chunks(parts: Vec<Vec<u8>>) -> impl Stream<Item = Result<Bytes, LlmError>> {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
    }

    fn text_chunks(parts: &[&str]) -> impl Stream<Item = Result<Bytes, LlmError>> {
        chunks(parts.iter().map(|p| p.as_bytes().to_vec()).collect())
    }

    #[tokio::test]
    async fn reads_envelopes_across_chunk_boundaries() {
        let wire = format!(
            "{}{}{}",
            encode_delta_frame("Hel"),
            encode_delta_frame("lo"),
            DONE_FRAME
        );
        let bytes = wire.as_bytes();
        for split in 1..bytes.len() {
            let mut text = String::new();
            let parts = vec![bytes[..split].to_vec(), bytes[split..].to_vec()];
            read_relay_stream(chunks(parts), |d| text.push_str(d))
                .await
                .unwrap();
            assert_eq!(text, "Hello", "split at {split}");
        }
    }

    #[tokio::test]
    async fn stops_at_done_and_skips_garbage() {
        let mut text = String::new();
        read_relay_stream(
            text_chunks(&[
                "data: {oops\n\n",
                ": keep-alive\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
                "data: [DONE]\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n",
            ]),
            |d| text.push_str(d),
        )
        .await
        .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn empty_body_is_a_connection_error() {
        let err = read_relay_stream(chunks(vec![]), |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn blank_input_is_a_noop() {
        let mut conversation = Conversation::new("ollama", "llama3.2:3b");
        let relay = RelayClient::new("http://127.0.0.1:9");
        assert!(conversation.submit(&relay, "   ").await.is_none());
        assert!(conversation.messages().is_empty());
    }

    #[tokio::test]
    async fn busy_conversation_rejects_second_submit() {
        let mut conversation = Conversation::new("ollama", "llama3.2:3b");
        let flag = conversation.loading_flag();
        flag.store(true, Ordering::Release);
        let relay = RelayClient::new("http://127.0.0.1:9");
        assert!(conversation.submit(&relay, "hi").await.is_none());
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn loading_guard_resets_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        {
            let _guard = LoadingGuard::acquire(&flag).unwrap();
            assert!(flag.load(Ordering::Acquire));
            assert!(LoadingGuard::acquire(&flag).is_none());
        }
        assert!(!flag.load(Ordering::Acquire));
    }
}
