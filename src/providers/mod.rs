//! Provider adapters
//!
//! Each upstream wire format is one [`ProviderAdapter`]. An adapter knows how
//! to build the outbound request and how to pull a text delta out of a single
//! frame; the framing itself is done by
//! [`FrameCodec`](crate::streaming::FrameCodec) with the adapter's
//! delimiter.
//!
//! Provider ids map to adapters through a fixed table in [`adapter_for`].

pub mod anthropic;
pub mod gemini;
pub mod huggingface;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::error::LlmError;
use crate::streaming::FrameDelimiter;
use crate::types::StreamSession;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use huggingface::HuggingFaceAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;

/// Sampling defaults sent to every provider that accepts them.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Result of looking at one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Delta(String),
    /// Provider's explicit end-of-stream sentinel.
    End,
    /// Nothing to emit: metadata, keep-alives, or a frame that failed to parse.
    Skip,
}

impl FrameOutcome {
    /// `Delta` for non-empty text, `Skip` otherwise.
    pub fn from_text(text: Option<&str>) -> Self {
        match text {
            Some(t) if !t.is_empty() => Self::Delta(t.to_string()),
            _ => Self::Skip,
        }
    }
}

/// Fully built outbound request.
#[derive(Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl UpstreamRequest {
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            method: Method::POST,
            url: url.into(),
            headers,
            body: Some(body),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Add a header whose value is a credential; it is marked sensitive so
    /// it never shows up in `Debug` output.
    pub fn with_secret_header(mut self, name: HeaderName, value: &str) -> Result<Self, LlmError> {
        let mut value = HeaderValue::from_str(value).map_err(|_| {
            LlmError::AuthenticationError(
                "API key contains characters not allowed in a header".into(),
            )
        })?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn with_bearer(self, api_key: &str) -> Result<Self, LlmError> {
        self.with_secret_header(AUTHORIZATION, &format!("Bearer {api_key}"))
    }

    pub fn with_static_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        self
    }

    /// URL without the query string, safe to log.
    pub fn log_url(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

impl std::fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Query strings may carry a key.
        f.debug_struct("UpstreamRequest")
            .field("method", &self.method)
            .field("url", &self.log_url())
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

/// One upstream wire format.
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    /// Provider id this adapter was created for.
    fn provider_id(&self) -> &str;

    /// Framing used by the response body.
    fn frame_delimiter(&self) -> FrameDelimiter;

    /// Build the streaming chat request.
    fn build_request(
        &self,
        session: &StreamSession,
        base_url: &str,
    ) -> Result<UpstreamRequest, LlmError>;

    /// Extract at most one delta from a complete frame. Must not panic on
    /// malformed input.
    fn extract_delta(&self, frame: &str) -> FrameOutcome;

    /// Cheap request used to check credentials or reachability.
    fn build_check_request(
        &self,
        base_url: &str,
        api_key: Option<&str>,
        model: Option<&str>,
    ) -> Result<UpstreamRequest, LlmError>;
}

/// Providers speaking the OpenAI chat-completions SSE dialect with no quirks.
const OPENAI_COMPATIBLE: &[&str] = &[
    "openai",
    "xai",
    "moonshot",
    "groq",
    "deepseek",
    "mistral",
    "fireworks",
    "megallm",
    "agentrouter",
    "lmstudio",
    "bedrock",
    "vertexai",
    "chutes",
    "glama",
    "unbound",
    "ovhcloud",
];

/// Fresh adapter for a provider id, or `None` when the id is unknown.
///
/// An adapter may carry state across the frames of one body, so each
/// response gets its own.
pub fn adapter_for(provider_id: &str) -> Option<Arc<dyn ProviderAdapter>> {
    let adapter: Arc<dyn ProviderAdapter> = match provider_id {
        "anthropic" => Arc::new(AnthropicAdapter::new()),
        "google" => Arc::new(GeminiAdapter::new()),
        "huggingface" => Arc::new(HuggingFaceAdapter::new()),
        "ollama" => Arc::new(OllamaAdapter::new()),
        "openrouter" => Arc::new(OpenAiAdapter::openrouter()),
        "minimax" => Arc::new(OpenAiAdapter::minimax()),
        id if OPENAI_COMPATIBLE.contains(&id) => Arc::new(OpenAiAdapter::new(id)),
        _ => return None,
    };
    Some(adapter)
}

/// Like [`adapter_for`] but fails with `ProviderNotFound`.
pub fn resolve_adapter(provider_id: &str) -> Result<Arc<dyn ProviderAdapter>, LlmError> {
    adapter_for(provider_id).ok_or_else(|| {
        LlmError::ProviderNotFound(format!("no stream adapter for provider '{provider_id}'"))
    })
}

/// Key from the session, or `ApiKeyMissing`.
pub(crate) fn require_api_key<'a>(
    provider_id: &str,
    api_key: Option<&'a str>,
) -> Result<&'a str, LlmError> {
    api_key.ok_or_else(|| {
        LlmError::ApiKeyMissing(format!("provider '{provider_id}' needs an API key"))
    })
}

/// Strip an SSE field name (`data:`), tolerating the optional space.
pub(crate) fn sse_field<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}
