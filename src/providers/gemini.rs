//! Google Gemini `streamGenerateContent`
//!
//! Without `alt=sse` the endpoint streams one JSON array whose elements are
//! `GenerateContentResponse` objects, often pretty-printed across many
//! chunks. Frames are the array elements; the stream ends when the body
//! closes.

use serde::{Deserialize, Serialize};

use super::{FrameOutcome, ProviderAdapter, UpstreamRequest, require_api_key};
use crate::error::LlmError;
use crate::streaming::FrameDelimiter;
use crate::types::{Role, StreamSession};

#[derive(Debug, Clone, Default)]
pub struct GeminiAdapter;

impl GeminiAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part {
            text: Some(text.to_string()),
        }],
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn provider_id(&self) -> &str {
        "google"
    }

    fn frame_delimiter(&self) -> FrameDelimiter {
        FrameDelimiter::JsonObject
    }

    fn build_request(
        &self,
        session: &StreamSession,
        base_url: &str,
    ) -> Result<UpstreamRequest, LlmError> {
        let api_key = require_api_key(self.provider_id(), session.credentials.expose_api_key())?;

        let contents = session
            .dialogue()
            .map(|m| {
                let role = if m.role == Role::Assistant { "model" } else { "user" };
                text_content(Some(role), &m.content)
            })
            .collect();
        let body = GenerateContentRequest {
            contents,
            system_instruction: session.system_prompt().map(|p| text_content(None, p)),
        };

        Ok(UpstreamRequest::post(
            format!(
                "{base_url}/models/{}:streamGenerateContent?key={}",
                session.model,
                urlencoding::encode(api_key)
            ),
            serde_json::to_value(&body)?,
        ))
    }

    fn extract_delta(&self, frame: &str) -> FrameOutcome {
        match serde_json::from_str::<GenerateContentResponse>(frame) {
            Ok(resp) => FrameOutcome::from_text(
                resp.candidates
                    .first()
                    .and_then(|c| c.content.as_ref())
                    .and_then(|c| c.parts.first())
                    .and_then(|p| p.text.as_deref()),
            ),
            Err(_) => FrameOutcome::Skip,
        }
    }

    fn build_check_request(
        &self,
        base_url: &str,
        api_key: Option<&str>,
        _model: Option<&str>,
    ) -> Result<UpstreamRequest, LlmError> {
        let api_key = require_api_key(self.provider_id(), api_key)?;
        Ok(UpstreamRequest::get(format!(
            "{base_url}/models?key={}",
            urlencoding::encode(api_key)
        )))
    }
}
