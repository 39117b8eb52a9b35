//! OpenAI-compatible chat completions
//!
//! SSE lines of the form `data: {json}`; the delta lives at
//! `choices[0].delta.content` and `data: [DONE]` ends the stream. Most hosted
//! providers in the catalog speak this dialect; a few need a different path
//! or extra headers.

use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, FrameOutcome, ProviderAdapter, UpstreamRequest,
    sse_field,
};
use crate::error::LlmError;
use crate::streaming::FrameDelimiter;
use crate::types::{Message, Role, StreamSession};

const DONE_SENTINEL: &str = "[DONE]";

/// Adapter for the chat-completions SSE dialect.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    provider_id: String,
    chat_path: &'static str,
    extra_headers: &'static [(&'static str, &'static str)],
    send_max_tokens: bool,
}

impl OpenAiAdapter {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            chat_path: "/chat/completions",
            extra_headers: &[],
            send_max_tokens: true,
        }
    }

    /// OpenRouter asks callers to identify the app.
    pub fn openrouter() -> Self {
        Self {
            extra_headers: &[
                ("http-referer", "https://github.com/chat-relay/chat-relay"),
                ("x-title", "Multi-Provider AI Chat"),
            ],
            ..Self::new("openrouter")
        }
    }

    /// MiniMax serves the same dialect under its own path and rejects `max_tokens`.
    pub fn minimax() -> Self {
        Self {
            chat_path: "/text/chatcompletion_v2",
            send_max_tokens: false,
            ..Self::new("minimax")
        }
    }

    pub fn chat_path(&self) -> &str {
        self.chat_path
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<&'a Message>,
    stream: bool,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl ProviderAdapter for OpenAiAdapter {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn frame_delimiter(&self) -> FrameDelimiter {
        FrameDelimiter::Line
    }

    fn build_request(
        &self,
        session: &StreamSession,
        base_url: &str,
    ) -> Result<UpstreamRequest, LlmError> {
        let body = ChatCompletionRequest {
            model: &session.model,
            // Empty system prompts are rejected by several providers.
            messages: session
                .messages
                .iter()
                .filter(|m| m.role != Role::System || !m.content.is_empty())
                .collect(),
            stream: true,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: self.send_max_tokens.then_some(DEFAULT_MAX_TOKENS),
        };

        let mut request = UpstreamRequest::post(
            format!("{base_url}{}", self.chat_path),
            serde_json::to_value(&body)?,
        );
        for &(name, value) in self.extra_headers {
            request = request.with_static_header(name, value);
        }
        match session.credentials.expose_api_key() {
            Some(key) => request.with_bearer(key),
            None => Ok(request),
        }
    }

    fn extract_delta(&self, frame: &str) -> FrameOutcome {
        let Some(payload) = sse_field(frame, "data") else {
            return FrameOutcome::Skip;
        };
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            return FrameOutcome::End;
        }
        match serde_json::from_str::<ChatCompletionChunk>(payload) {
            Ok(chunk) => FrameOutcome::from_text(
                chunk
                    .choices
                    .first()
                    .and_then(|c| c.delta.as_ref())
                    .and_then(|d| d.content.as_deref()),
            ),
            Err(e) => {
                tracing::trace!(
                    target: "chat_relay::stream",
                    provider = %self.provider_id,
                    error = %e,
                    "skipping unparseable frame"
                );
                FrameOutcome::Skip
            }
        }
    }

    fn build_check_request(
        &self,
        base_url: &str,
        api_key: Option<&str>,
        _model: Option<&str>,
    ) -> Result<UpstreamRequest, LlmError> {
        let request = UpstreamRequest::get(format!("{base_url}/models"));
        match api_key {
            Some(key) => request.with_bearer(key),
            None => Ok(request),
        }
    }
}
