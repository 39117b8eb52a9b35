//! Hugging Face text-generation inference
//!
//! Token streams arrive as one JSON object per line, optionally behind an
//! SSE `data:` prefix. Some deployments answer with plain text instead, in
//! which case each line is passed through as-is, blank lines included.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, FrameOutcome, ProviderAdapter, UpstreamRequest,
    sse_field,
};
use crate::error::LlmError;
use crate::streaming::FrameDelimiter;
use crate::types::StreamSession;

#[derive(Debug, Default)]
pub struct HuggingFaceAdapter {
    /// Set once a non-JSON line was seen; blank lines are text from then on.
    plain_text: AtomicBool,
}

impl HuggingFaceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn plain_line(&self, frame: &str) -> FrameOutcome {
        self.plain_text.store(true, Ordering::Relaxed);
        FrameOutcome::Delta(format!("{frame}\n"))
    }
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    inputs: String,
    parameters: GenerateParameters,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct TokenChunk {
    #[serde(default)]
    token: Option<Token>,
    #[serde(default)]
    generated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Token {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    special: bool,
}

impl ProviderAdapter for HuggingFaceAdapter {
    fn provider_id(&self) -> &str {
        "huggingface"
    }

    fn frame_delimiter(&self) -> FrameDelimiter {
        FrameDelimiter::RawLine
    }

    fn build_request(
        &self,
        session: &StreamSession,
        base_url: &str,
    ) -> Result<UpstreamRequest, LlmError> {
        let inputs = session
            .messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        let body = GenerateRequest {
            inputs,
            parameters: GenerateParameters {
                max_new_tokens: DEFAULT_MAX_TOKENS,
                temperature: DEFAULT_TEMPERATURE,
            },
            stream: true,
        };
        let request = UpstreamRequest::post(
            format!("{base_url}/{}", session.model),
            serde_json::to_value(&body)?,
        );
        match session.credentials.expose_api_key() {
            Some(key) => request.with_bearer(key),
            None => Ok(request),
        }
    }

    fn extract_delta(&self, frame: &str) -> FrameOutcome {
        if frame.trim().is_empty() {
            // Event separator in token streams, paragraph break in plain text.
            return if self.plain_text.load(Ordering::Relaxed) {
                FrameOutcome::Delta(format!("{frame}\n"))
            } else {
                FrameOutcome::Skip
            };
        }
        let text = sse_field(frame, "data").unwrap_or(frame);
        // Non-streaming deployments answer with `[{"generated_text": ...}]`.
        let value = match serde_json::from_str::<serde_json::Value>(text.trim()) {
            Ok(serde_json::Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
            Ok(serde_json::Value::Array(_)) => return FrameOutcome::Skip,
            Ok(value @ serde_json::Value::Object(_)) => value,
            _ => return self.plain_line(text),
        };
        let Ok(chunk) = serde_json::from_value::<TokenChunk>(value) else {
            return FrameOutcome::Skip;
        };
        // The final chunk repeats the whole text in `generated_text`; the
        // per-token text is what belongs in the stream.
        if let Some(token) = chunk.token {
            if token.special {
                return FrameOutcome::Skip;
            }
            return FrameOutcome::from_text(token.text.as_deref());
        }
        FrameOutcome::from_text(chunk.generated_text.as_deref())
    }

    fn build_check_request(
        &self,
        base_url: &str,
        api_key: Option<&str>,
        model: Option<&str>,
    ) -> Result<UpstreamRequest, LlmError> {
        let url = match model {
            Some(model) => format!("{base_url}/{model}"),
            None => base_url.to_string(),
        };
        let request = UpstreamRequest::get(url);
        match api_key {
            Some(key) => request.with_bearer(key),
            None => Ok(request),
        }
    }
}
