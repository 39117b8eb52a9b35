//! Test fixtures utilities: load recorded provider bodies and replay them
//! through the normalizer in arbitrary chunkings.
#![allow(dead_code)]

use bytes::Bytes;
use futures_util::Stream;

use chat_relay::error::LlmError;
use chat_relay::providers::adapter_for;
use chat_relay::streaming::{StreamFactory, StreamTerminal, collect_text};

/// Raw bytes of `tests/fixtures/<rel>`.
pub fn fixture(rel: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{rel}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read(&path).unwrap_or_else(|e| panic!("read fixture {path}: {e}"))
}

pub fn fixture_str(rel: &str) -> String {
    String::from_utf8(fixture(rel)).expect("fixture is UTF-8")
}

/// Split into chunks of at most `size` bytes (may cut through UTF-8 sequences).
pub fn chunked(bytes: &[u8], size: usize) -> Vec<Bytes> {
    bytes
        .chunks(size.max(1))
        .map(Bytes::copy_from_slice)
        .collect()
}

/// Split at the given offsets (out-of-range and duplicate cuts are ignored).
pub fn split_at_cuts(bytes: &[u8], cuts: &[usize]) -> Vec<Bytes> {
    let mut cuts: Vec<usize> = cuts
        .iter()
        .copied()
        .filter(|&c| c > 0 && c < bytes.len())
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    let mut out = Vec::with_capacity(cuts.len() + 1);
    let mut prev = 0;
    for cut in cuts {
        out.push(Bytes::copy_from_slice(&bytes[prev..cut]));
        prev = cut;
    }
    out.push(Bytes::copy_from_slice(&bytes[prev..]));
    out
}

pub fn byte_stream(
    chunks: Vec<Bytes>,
) -> impl Stream<Item = Result<Bytes, LlmError>> + Send + 'static {
    futures_util::stream::iter(chunks.into_iter().map(Ok))
}

/// Run chunks through the named provider's adapter and collect the text.
pub async fn normalize(provider: &str, chunks: Vec<Bytes>) -> (String, StreamTerminal) {
    let adapter = adapter_for(provider).unwrap_or_else(|| panic!("no adapter for {provider}"));
    collect_text(StreamFactory::from_byte_stream(byte_stream(chunks), adapter)).await
}

/// `text/event-stream` response template carrying `body`.
pub fn sse_response(body: impl Into<Vec<u8>>) -> wiremock::ResponseTemplate {
    wiremock::ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_bytes(body.into())
}

/// Serve the relay on an ephemeral port; returns its base URL.
#[cfg(feature = "server-adapters")]
pub async fn spawn_relay(config: chat_relay::config::RelayConfig) -> String {
    use std::sync::Arc;

    use chat_relay::client::ChatClient;
    use chat_relay::registry::ProviderRegistry;
    use chat_relay::server_adapters::axum::{RelayState, router};

    let registry = Arc::new(ProviderRegistry::builtin());
    let client = ChatClient::with_http_client(reqwest::Client::new(), registry.clone());
    let app = router(RelayState::new(registry, Arc::new(client), config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("relay server");
    });
    format!("http://{addr}")
}

/// Upstream OpenAI-style body streaming the given deltas, then `[DONE]`.
pub fn openai_sse(deltas: &[&str]) -> String {
    let mut body: String = deltas
        .iter()
        .map(|d| {
            format!(
                "data: {}\n\n",
                serde_json::json!({ "choices": [{ "index": 0, "delta": { "content": d } }] })
            )
        })
        .collect();
    body.push_str("data: [DONE]\n\n");
    body
}
