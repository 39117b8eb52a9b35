//! Ollama `/api/chat` (NDJSON, one object per line, ends when the body closes).

use serde::{Deserialize, Serialize};

use super::{FrameOutcome, ProviderAdapter, UpstreamRequest};
use crate::error::LlmError;
use crate::streaming::FrameDelimiter;
use crate::types::{Message, StreamSession};

#[derive(Debug, Clone, Default)]
pub struct OllamaAdapter;

impl OllamaAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ProviderAdapter for OllamaAdapter {
    fn provider_id(&self) -> &str {
        "ollama"
    }

    fn frame_delimiter(&self) -> FrameDelimiter {
        FrameDelimiter::Line
    }

    fn build_request(
        &self,
        session: &StreamSession,
        base_url: &str,
    ) -> Result<UpstreamRequest, LlmError> {
        let body = OllamaChatRequest {
            model: &session.model,
            messages: &session.messages,
            stream: true,
        };
        Ok(UpstreamRequest::post(
            format!("{base_url}/api/chat"),
            serde_json::to_value(&body)?,
        ))
    }

    fn extract_delta(&self, frame: &str) -> FrameOutcome {
        match serde_json::from_str::<OllamaChatChunk>(frame.trim()) {
            Ok(chunk) => FrameOutcome::from_text(
                chunk.message.as_ref().and_then(|m| m.content.as_deref()),
            ),
            Err(_) => FrameOutcome::Skip,
        }
    }

    fn build_check_request(
        &self,
        base_url: &str,
        _api_key: Option<&str>,
        _model: Option<&str>,
    ) -> Result<UpstreamRequest, LlmError> {
        Ok(UpstreamRequest::get(format!("{base_url}/api/tags")))
    }
}
