//! Error Handling Module
//!
//! Two layers live here:
//! - [`LlmError`]: the rich error carried through streams, with diagnostic detail
//! - [`ErrorKind`]: the closed taxonomy every `LlmError` collapses to, which is
//!   what users see (templated message plus an optional hint)
//!
//! # Example
//!
//! ```rust
//! use chat_relay::error::{ErrorKind, LlmError};
//!
//! let error = LlmError::AuthenticationError("provider=openai unauthorized".into());
//! assert_eq!(error.kind(), ErrorKind::AuthError);
//! assert_eq!(error.user_message(), "Invalid API key");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of user-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ApiKeyMissing,
    AuthError,
    PaymentRequired,
    RateLimited,
    UpstreamServerError,
    ModelNotFound,
    ProviderNotFound,
    NetworkError,
    ParseError,
}

impl ErrorKind {
    /// Templated message shown to users.
    pub const fn message(self) -> &'static str {
        match self {
            Self::ApiKeyMissing => "API key required",
            Self::AuthError => "Invalid API key",
            Self::PaymentRequired => "Payment required",
            Self::RateLimited => "Rate limit exceeded",
            Self::UpstreamServerError => "Provider service error",
            Self::ModelNotFound => "Model not found",
            Self::ProviderNotFound => "Provider not found",
            Self::NetworkError => "Connection error",
            Self::ParseError => "Invalid response from provider",
        }
    }

    /// Follow-up advice appended after the message, if any.
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ApiKeyMissing => Some("Please add your API key in Settings."),
            Self::AuthError => Some("Please check your API key in Settings."),
            Self::PaymentRequired => {
                Some("Your API key may need credits or a valid payment method.")
            }
            Self::RateLimited => Some("Please wait and try again."),
            Self::UpstreamServerError => Some("Please try again later."),
            Self::ModelNotFound => Some("Please choose another model."),
            Self::NetworkError => Some("Please check your connection and try again."),
            Self::ProviderNotFound | Self::ParseError => None,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors produced while building, sending, or consuming a chat stream.
///
/// The string payloads are diagnostic detail for logs. They may contain
/// fragments of provider error bodies and are never shown to users directly;
/// use [`LlmError::user_message`] for that.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// A provider that requires a key was called without one.
    #[error("API key required: {0}")]
    ApiKeyMissing(String),

    /// The provider id is not in the registry or dispatch table.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Any other non-success upstream status (5xx or unmapped).
    #[error("API error {code}: {message}")]
    ApiError { code: u16, message: String },

    /// Transport failure: connect, timeout, body read.
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LlmError {
    /// Create an upstream API error with a status code.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
        }
    }

    /// Collapse into the user-facing taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ApiKeyMissing(_) => ErrorKind::ApiKeyMissing,
            Self::ProviderNotFound(_) => ErrorKind::ProviderNotFound,
            Self::AuthenticationError(_) => ErrorKind::AuthError,
            Self::PaymentRequired(_) => ErrorKind::PaymentRequired,
            Self::RateLimitError(_) => ErrorKind::RateLimited,
            Self::ModelNotFound(_) => ErrorKind::ModelNotFound,
            Self::ApiError { .. } => ErrorKind::UpstreamServerError,
            Self::HttpError(_) => ErrorKind::NetworkError,
            Self::ParseError(_) => ErrorKind::ParseError,
        }
    }

    /// HTTP status that produced this error, when there was one.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Templated message without provider text.
    ///
    /// Statuses outside the classifier table keep the raw code for diagnosis,
    /// e.g. `Provider service error (HTTP 418)`.
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiError { code, .. } if !(500..=599).contains(code) => {
                format!("{} (HTTP {code})", ErrorKind::UpstreamServerError.message())
            }
            other => other.kind().message().to_string(),
        }
    }

    /// [`user_message`](Self::user_message) followed by the kind's hint.
    pub fn user_message_with_hint(&self) -> String {
        let message = self.user_message();
        match self.kind().hint() {
            Some(hint) => format!("{message}. {hint}"),
            None => message,
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Body read failures travel through `tokio_util` readers as `io::Error`;
/// a wrapped [`LlmError`] comes back out unchanged.
impl From<std::io::Error> for LlmError {
    fn from(err: std::io::Error) -> Self {
        let message = err.to_string();
        match err.into_inner().map(|inner| inner.downcast::<LlmError>()) {
            Some(Ok(inner)) => *inner,
            _ => Self::HttpError(message),
        }
    }
}
