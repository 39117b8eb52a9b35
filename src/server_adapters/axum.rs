//! Axum relay
//!
//! [`router`] exposes the relay endpoints:
//!
//! - `POST /api/chat`: stream a chat completion in the relay wire format
//! - `POST /api/validate`: check a provider key (or local server URL)
//! - `GET /api/providers`: provider and model catalog
//! - `GET /health`: liveness check
//!
//! Request problems found before streaming starts are answered with a JSON
//! `{"error": ...}` body and a 4xx/5xx status ([`RelayError`]). Once the
//! `200` is sent every failure travels in-band (see [`super::relay_payloads`]).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chat_relay::prelude::*;
//! use chat_relay::server_adapters::axum::{RelayState, router};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ProviderRegistry::builtin());
//! let config = RelayConfig::default();
//! let client = ChatClient::new(registry.clone(), &config.http)?;
//! let app = router(RelayState::new(registry, Arc::new(client), config));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use validator::Validate;

use crate::client::ChatService;
use crate::config::RelayConfig;
use crate::error::LlmError;
use crate::providers::adapter_for;
use crate::registry::{ProviderDescriptor, ProviderRegistry};
use crate::server_adapters::relay_payloads;
use crate::streaming::ChatStream;
use crate::types::{
    ChatRequest, Message, ProviderCredentials, RequestConfig, Role, StreamSession,
    ValidateRequest,
};

/// Errors answered before the stream starts.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Provider not found")]
    ProviderNotFound,
    #[error("API key required")]
    ApiKeyRequired,
    /// Detail is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::ProviderNotFound => StatusCode::BAD_REQUEST,
            Self::ApiKeyRequired => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                target: "chat_relay::http",
                status = status.as_u16(),
                error = %self,
                "request failed"
            );
        } else {
            tracing::warn!(
                target: "chat_relay::http",
                status = status.as_u16(),
                error = %self,
                "request rejected"
            );
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Answer of `POST /api/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Shared handler state.
#[derive(Clone)]
pub struct RelayState {
    pub registry: Arc<ProviderRegistry>,
    pub chat: Arc<dyn ChatService>,
    pub config: Arc<RelayConfig>,
}

impl RelayState {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        chat: Arc<dyn ChatService>,
        config: RelayConfig,
    ) -> Self {
        Self {
            registry,
            chat,
            config: Arc::new(config),
        }
    }

    /// Request credentials, falling back to the server-side key.
    fn credentials_for(
        &self,
        descriptor: &ProviderDescriptor,
        request: Option<RequestConfig>,
    ) -> ProviderCredentials {
        let credentials = request.unwrap_or_default().into_credentials();
        if credentials.has_api_key() {
            return credentials;
        }
        match self.config.default_key(&descriptor.id) {
            Some(key) => credentials.with_api_key(key),
            None => credentials,
        }
    }

    /// Turn a validated chat request into a session, or reject it.
    pub fn session_for(&self, request: ChatRequest) -> Result<StreamSession, RelayError> {
        let descriptor = self
            .registry
            .get(&request.provider)
            .ok_or(RelayError::ProviderNotFound)?;
        if adapter_for(&descriptor.id).is_none() {
            return Err(RelayError::Internal(format!(
                "no adapter registered for provider '{}'",
                descriptor.id
            )));
        }

        let credentials = self.credentials_for(descriptor, request.config);
        if descriptor.requires_api_key && !credentials.has_api_key() {
            return Err(RelayError::ApiKeyRequired);
        }

        let mut messages = request.messages;
        let starts_with_system = messages.first().is_some_and(|m| m.role == Role::System);
        if !starts_with_system && !self.config.system_prompt.is_empty() {
            messages.insert(0, Message::system(self.config.system_prompt.clone()));
        }

        Ok(StreamSession::new(
            descriptor.id.clone(),
            request.model,
            messages,
            credentials,
        ))
    }
}

/// Build the relay router.
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/validate", post(validate))
        .route("/api/providers", get(providers))
        .route("/health", get(health))
        .with_state(state)
}

/// Wrap a chat stream as an SSE response in the relay wire format.
pub fn to_sse_response(stream: ChatStream) -> Response {
    let events = relay_payloads(stream)
        .map(|payload| Ok::<Event, Infallible>(Event::default().data(payload)));
    (
        [(header::CONNECTION, "keep-alive")],
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

fn parse_body<T: DeserializeOwned + Validate>(body: &[u8]) -> Result<T, RelayError> {
    let value: T =
        serde_json::from_slice(body).map_err(|e| RelayError::InvalidRequest(e.to_string()))?;
    value
        .validate()
        .map_err(|e| RelayError::InvalidRequest(e.to_string()))?;
    Ok(value)
}

async fn chat(State(state): State<RelayState>, body: Bytes) -> Result<Response, RelayError> {
    let request: ChatRequest = parse_body(&body)?;
    let session = state.session_for(request)?;

    tracing::info!(
        target: "chat_relay::http",
        provider = %session.provider_id,
        model = %session.model,
        messages = session.messages.len(),
        has_api_key = session.credentials.has_api_key(),
        custom_base_url = session.credentials.base_url.is_some(),
        "relaying chat request"
    );

    Ok(to_sse_response(state.chat.chat_stream(session)))
}

async fn validate(
    State(state): State<RelayState>,
    body: Bytes,
) -> Result<Json<ValidateResponse>, RelayError> {
    let request: ValidateRequest = parse_body(&body)?;
    let result = match state.registry.get(&request.provider) {
        Some(descriptor) => {
            let credentials = state.credentials_for(descriptor, request.config);
            state
                .chat
                .validate_credentials(&descriptor.id, &credentials)
                .await
        }
        None => Err(LlmError::ProviderNotFound(request.provider.clone())),
    };

    tracing::info!(
        target: "chat_relay::http",
        provider = %request.provider,
        valid = result.is_ok(),
        "validated provider credentials"
    );

    Ok(Json(match result {
        Ok(()) => ValidateResponse {
            valid: true,
            error: None,
        },
        Err(e) => ValidateResponse {
            valid: false,
            error: Some(e.user_message()),
        },
    }))
}

async fn providers(State(state): State<RelayState>) -> Json<Vec<ProviderDescriptor>> {
    Json(state.registry.list().to_vec())
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RelayState {
        let registry = Arc::new(ProviderRegistry::builtin());
        let client =
            crate::client::ChatClient::with_http_client(reqwest::Client::new(), registry.clone());
        RelayState::new(
            registry,
            Arc::new(client),
            RelayConfig::default().with_provider_key("groq", "gsk-server"),
        )
    }

    fn request(provider: &str, config: Option<RequestConfig>) -> ChatRequest {
        ChatRequest {
            messages: vec![Message::user("hi")],
            provider: provider.into(),
            model: "m".into(),
            config,
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = state().session_for(request("nope", None)).unwrap_err();
        assert!(matches!(err, RelayError::ProviderNotFound));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_key_is_unauthorized() {
        let err = state().session_for(request("openai", None)).unwrap_err();
        assert!(matches!(err, RelayError::ApiKeyRequired));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn server_key_fills_in_and_request_key_wins() {
        let s = state();
        let session = s.session_for(request("groq", None)).unwrap();
        assert_eq!(session.credentials.expose_api_key(), Some("gsk-server"));

        let byok = RequestConfig {
            api_key: Some("gsk-user".into()),
            base_url: None,
        };
        let session = s.session_for(request("groq", Some(byok))).unwrap();
        assert_eq!(session.credentials.expose_api_key(), Some("gsk-user"));
    }

    #[test]
    fn blank_base_url_falls_back_to_the_catalog() {
        let s = state();
        let blank = RequestConfig {
            api_key: Some("sk-user".into()),
            base_url: Some(String::new()),
        };
        let req = request("openai", Some(blank));
        assert!(req.validate().is_ok());

        let session = s.session_for(req).unwrap();
        assert_eq!(session.credentials.base_url, None);
        let descriptor = s.registry.resolve("openai").unwrap();
        assert_eq!(
            descriptor.resolve_base_url(session.credentials.base_url.as_deref()),
            "https://api.openai.com/v1"
        );
    }

    #[test]
    fn system_prompt_is_prepended_once() {
        let s = state();
        let session = s.session_for(request("ollama", None)).unwrap();
        assert_eq!(session.messages[0].role, Role::System);
        assert_eq!(session.messages.len(), 2);

        let mut own = request("ollama", None);
        own.messages.insert(0, Message::system("be brief"));
        let session = s.session_for(own).unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content, "be brief");
    }

    #[test]
    fn malformed_body_is_invalid_request() {
        let err = parse_body::<ChatRequest>(b"{not json").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = parse_body::<ChatRequest>(
            br#"{"messages":[],"provider":"openai","model":"gpt-4o"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::InvalidRequest(_)));
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = RelayError::Internal("adapter table out of sync".into());
        assert_eq!(err.public_message(), "Internal error");
    }
}
