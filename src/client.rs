//! Client Module
//!
//! [`ChatService`] is the seam between the relay and the network; the
//! production implementation is [`ChatClient`], which resolves the provider,
//! sends one HTTP request per session and turns the body into a
//! [`ChatStream`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::LlmError;
use crate::providers::{ProviderAdapter, UpstreamRequest, resolve_adapter};
use crate::registry::ProviderRegistry;
use crate::streaming::{ChatStream, StreamFactory};
use crate::types::{ProviderCredentials, StreamSession, redact_key};
use crate::utils::cancel::{CancelHandle, make_cancellable_stream};
use crate::utils::error_handling::{classify_http_error, classify_transport_error};

/// A stream paired with the handle that stops it.
pub struct ChatStreamHandle {
    pub stream: ChatStream,
    pub cancel: CancelHandle,
}

/// Streaming chat backend.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Start a session. The returned stream is lazy: nothing is sent until
    /// it is first polled. Setup failures (unknown provider, missing key,
    /// non-success status) arrive as the stream's single error item.
    fn chat_stream(&self, session: StreamSession) -> ChatStream;

    /// Same as [`chat_stream`](Self::chat_stream) with a cancel handle attached.
    fn chat_stream_with_cancel(&self, session: StreamSession) -> ChatStreamHandle {
        let (stream, cancel) = make_cancellable_stream(self.chat_stream(session));
        ChatStreamHandle { stream, cancel }
    }

    /// Check that the credentials are accepted (or the local server answers).
    async fn validate_credentials(
        &self,
        provider_id: &str,
        credentials: &ProviderCredentials,
    ) -> Result<(), LlmError>;
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout, including the streamed body.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(120)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some(format!("chat-relay/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl HttpConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, LlmError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        builder
            .build()
            .map_err(|e| LlmError::HttpError(format!("Failed to build HTTP client: {e}")))
    }
}

/// Production [`ChatService`] backed by reqwest.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    registry: Arc<ProviderRegistry>,
}

impl ChatClient {
    pub fn new(registry: Arc<ProviderRegistry>, config: &HttpConfig) -> Result<Self, LlmError> {
        Ok(Self::with_http_client(config.build_client()?, registry))
    }

    /// Reuse an existing reqwest client (shares its connection pool).
    pub fn with_http_client(http: reqwest::Client, registry: Arc<ProviderRegistry>) -> Self {
        Self { http, registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Resolve provider, adapter and base URL, then build the request.
    fn prepare(
        &self,
        session: &StreamSession,
    ) -> Result<(Arc<dyn ProviderAdapter>, UpstreamRequest), LlmError> {
        let descriptor = self.registry.resolve(&session.provider_id)?;
        let adapter = resolve_adapter(&descriptor.id)?;
        if descriptor.requires_api_key && !session.credentials.has_api_key() {
            return Err(LlmError::ApiKeyMissing(format!(
                "provider '{}' needs an API key",
                descriptor.id
            )));
        }
        let base_url = descriptor.resolve_base_url(session.credentials.base_url.as_deref());
        let request = adapter.build_request(session, base_url)?;
        Ok((adapter, request))
    }
}

fn request_builder(http: &reqwest::Client, request: UpstreamRequest) -> reqwest::RequestBuilder {
    let mut builder = http
        .request(request.method, &request.url)
        .headers(request.headers);
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }
    builder
}

#[async_trait]
impl ChatService for ChatClient {
    fn chat_stream(&self, session: StreamSession) -> ChatStream {
        let prepared = self.prepare(&session);
        let http = self.http.clone();

        let s = async_stream::stream! {
            let provider = session.provider_id.clone();
            let (adapter, request) = match prepared {
                Ok(prepared) => prepared,
                Err(e) => {
                    tracing::warn!(
                        target: "chat_relay::http",
                        provider = %provider,
                        error = %e,
                        "request could not be built"
                    );
                    yield Err(e);
                    return;
                }
            };

            tracing::debug!(
                target: "chat_relay::http",
                provider = %provider,
                model = %session.model,
                url = %request.log_url(),
                api_key = ?session.credentials.expose_api_key().map(redact_key),
                messages = session.messages.len(),
                "dispatching streaming request"
            );

            let response = match request_builder(&http, request).send().await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(classify_transport_error(&provider, e));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::debug!(
                    target: "chat_relay::http",
                    provider = %provider,
                    status = status.as_u16(),
                    body_len = body.len(),
                    "upstream rejected request"
                );
                yield Err(classify_http_error(&provider, status.as_u16(), &body));
                return;
            }

            let body_provider = provider.clone();
            let body = response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| classify_transport_error(&body_provider, e)));
            let mut inner = StreamFactory::from_byte_stream(body, adapter);
            while let Some(item) = inner.next().await {
                yield item;
            }
        };
        Box::pin(s)
    }

    async fn validate_credentials(
        &self,
        provider_id: &str,
        credentials: &ProviderCredentials,
    ) -> Result<(), LlmError> {
        let descriptor = self.registry.resolve(provider_id)?;
        let adapter = resolve_adapter(&descriptor.id)?;
        let api_key = credentials.expose_api_key();

        if descriptor.requires_api_key && api_key.is_none() {
            return Err(LlmError::ApiKeyMissing(format!(
                "provider '{provider_id}' needs an API key"
            )));
        }
        if !descriptor.requires_api_key && !descriptor.requires_base_url {
            return Ok(());
        }

        let base_url = descriptor.resolve_base_url(credentials.base_url.as_deref());
        let check = adapter.build_check_request(
            base_url,
            api_key,
            descriptor.models.first().map(|m| m.id.as_str()),
        )?;
        tracing::debug!(
            target: "chat_relay::http",
            provider = %provider_id,
            url = %check.log_url(),
            "checking credentials"
        );

        let response = request_builder(&self.http, check)
            .send()
            .await
            .map_err(|e| classify_transport_error(provider_id, e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_http_error(provider_id, status.as_u16(), &body))
    }
}
