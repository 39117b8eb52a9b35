//! Core data types shared by the client, relay and consumer.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateUrl, ValidationError};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a conversation, as sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Per-request credentials. The key is never printed; see [`redact_key`].
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
}

impl ProviderCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.trim().is_empty()).then(|| SecretString::from(key));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = (!url.trim().is_empty()).then_some(url);
        self
    }

    /// Exposed key, if any. Only request builders should call this.
    pub fn expose_api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &self.expose_api_key().map(redact_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// One submission: immutable once built.
#[derive(Debug, Clone)]
pub struct StreamSession {
    pub provider_id: String,
    pub model: String,
    pub messages: Vec<Message>,
    pub credentials: ProviderCredentials,
}

impl StreamSession {
    pub fn new(
        provider_id: impl Into<String>,
        model: impl Into<String>,
        messages: Vec<Message>,
        credentials: ProviderCredentials,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            model: model.into(),
            messages,
            credentials,
        }
    }

    /// System prompt, if the conversation carries a non-empty one.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System && !m.content.is_empty())
            .map(|m| m.content.as_str())
    }

    /// Messages excluding system entries.
    pub fn dialogue(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }
}

/// Optional per-request provider settings (bring-your-own-key).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_base_url"))]
    pub base_url: Option<String>,
}

/// A blank base URL means "use the provider default"; anything else must
/// be an absolute URL.
fn validate_base_url(url: &str) -> Result<(), ValidationError> {
    if url.trim().is_empty() || url.validate_url() {
        return Ok(());
    }
    Err(ValidationError::new("url").with_message("baseUrl must be an absolute URL".into()))
}

impl RequestConfig {
    /// Blank strings count as absent.
    pub fn into_credentials(self) -> ProviderCredentials {
        let mut credentials = ProviderCredentials::new();
        if let Some(key) = self.api_key {
            credentials = credentials.with_api_key(key);
        }
        if let Some(url) = self.base_url {
            credentials = credentials.with_base_url(url);
        }
        credentials
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "messages must not be empty"))]
    pub messages: Vec<Message>,
    #[validate(length(min = 1, message = "provider is required"))]
    pub provider: String,
    #[validate(length(min = 1, message = "model is required"))]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub config: Option<RequestConfig>,
}

/// Body of `POST /api/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ValidateRequest {
    #[validate(length(min = 1, message = "provider is required"))]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub config: Option<RequestConfig>,
}

/// Short prefix of a key for diagnostics, e.g. `sk-o…`.
pub fn redact_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}…")
}
