//! Anthropic Messages API
//!
//! SSE with typed events. Only `content_block_delta` carries text
//! (`delta.text`); `message_stop` closes the stream. Everything else
//! (`message_start`, `ping`, `content_block_start`, ...) is skipped.

use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_MAX_TOKENS, FrameOutcome, ProviderAdapter, UpstreamRequest, require_api_key,
    sse_field,
};
use crate::error::LlmError;
use crate::streaming::FrameDelimiter;
use crate::types::{Message, StreamSession};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Default)]
pub struct AnthropicAdapter;

impl AnthropicAdapter {
    pub fn new() -> Self {
        Self
    }

    fn authed(request: UpstreamRequest, api_key: &str) -> Result<UpstreamRequest, LlmError> {
        request
            .with_static_header("anthropic-version", ANTHROPIC_VERSION)
            .with_secret_header(reqwest::header::HeaderName::from_static("x-api-key"), api_key)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<&'a Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<EnvelopeDelta>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeDelta {
    #[serde(default)]
    text: Option<String>,
}

impl ProviderAdapter for AnthropicAdapter {
    fn provider_id(&self) -> &str {
        "anthropic"
    }

    fn frame_delimiter(&self) -> FrameDelimiter {
        FrameDelimiter::Event
    }

    fn build_request(
        &self,
        session: &StreamSession,
        base_url: &str,
    ) -> Result<UpstreamRequest, LlmError> {
        let api_key = require_api_key(self.provider_id(), session.credentials.expose_api_key())?;
        let body = MessagesRequest {
            model: &session.model,
            messages: session.dialogue().collect(),
            system: session.system_prompt(),
            max_tokens: DEFAULT_MAX_TOKENS,
            stream: true,
        };
        Self::authed(
            UpstreamRequest::post(format!("{base_url}/messages"), serde_json::to_value(&body)?),
            api_key,
        )
    }

    fn extract_delta(&self, frame: &str) -> FrameOutcome {
        // An event block may carry its JSON over several `data:` lines.
        let data: Vec<&str> = frame.lines().filter_map(|l| sse_field(l, "data")).collect();
        if data.is_empty() {
            return FrameOutcome::Skip;
        }
        let Ok(envelope) = serde_json::from_str::<StreamEnvelope>(&data.join("\n")) else {
            return FrameOutcome::Skip;
        };
        match envelope.kind.as_str() {
            "content_block_delta" => FrameOutcome::from_text(
                envelope.delta.as_ref().and_then(|d| d.text.as_deref()),
            ),
            "message_stop" => FrameOutcome::End,
            _ => FrameOutcome::Skip,
        }
    }

    fn build_check_request(
        &self,
        base_url: &str,
        api_key: Option<&str>,
        model: Option<&str>,
    ) -> Result<UpstreamRequest, LlmError> {
        let api_key = require_api_key(self.provider_id(), api_key)?;
        let body = serde_json::json!({
            "model": model.unwrap_or("claude-3-5-haiku-20241022"),
            "messages": [{"role": "user", "content": "test"}],
            "max_tokens": 1,
        });
        Self::authed(UpstreamRequest::post(format!("{base_url}/messages"), body), api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderCredentials;

    #[test]
    fn only_text_deltas_and_stop_matter() {
        let adapter = AnthropicAdapter::new();
        assert_eq!(
            adapter.extract_delta(
                "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}"
            ),
            FrameOutcome::Delta("Hi".into())
        );
        assert_eq!(
            adapter.extract_delta("event: message_stop\ndata: {\"type\":\"message_stop\"}"),
            FrameOutcome::End
        );
        for frame in [
            "event: ping\ndata: {\"type\": \"ping\"}",
            "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{}}",
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\"}}",
            "data: {broken",
            ": comment only",
        ] {
            assert_eq!(adapter.extract_delta(frame), FrameOutcome::Skip, "{frame}");
        }
    }

    #[test]
    fn request_moves_system_prompt_out_of_messages() {
        let session = StreamSession::new(
            "anthropic",
            "claude-3-5-haiku-20241022",
            vec![Message::system("be terse"), Message::user("hi")],
            ProviderCredentials::new().with_api_key("sk-ant-xyz"),
        );
        let req = AnthropicAdapter::new()
            .build_request(&session, "https://api.anthropic.com/v1")
            .unwrap();
        assert_eq!(req.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(req.headers["x-api-key"], "sk-ant-xyz");
        assert_eq!(req.headers["anthropic-version"], ANTHROPIC_VERSION);
        let body = req.body.unwrap();
        assert_eq!(body["system"], "be terse");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["max_tokens"], 2000);
    }
}
