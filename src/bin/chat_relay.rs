//! `chat-relay` server
//!
//! Serves `POST /api/chat` and friends on `CHAT_RELAY_ADDR`. See
//! [`chat_relay::config`] and [`chat_relay::telemetry`] for the environment
//! variables it reads.

use std::sync::Arc;

use chat_relay::client::ChatClient;
use chat_relay::config::RelayConfig;
use chat_relay::registry::ProviderRegistry;
use chat_relay::server_adapters::axum::{RelayState, router};
use chat_relay::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = telemetry::init_from_env()?;

    let registry = Arc::new(ProviderRegistry::builtin());
    let config = RelayConfig::from_env(&registry)?;
    let client = ChatClient::new(registry.clone(), &config.http)?;
    let addr = config.bind_addr;

    let app = router(RelayState::new(registry.clone(), Arc::new(client), config));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        target: "chat_relay::http",
        addr = %listener.local_addr()?,
        providers = registry.len(),
        "chat relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!(target: "chat_relay::http", "shutting down");
        })
        .await?;

    Ok(())
}
