//! ChatClient against a mock upstream

mod support;

use std::sync::Arc;

use chat_relay::client::{ChatClient, ChatService};
use chat_relay::error::{ErrorKind, LlmError};
use chat_relay::registry::ProviderRegistry;
use chat_relay::streaming::{ChatStreamEvent, StreamTerminal, collect_text};
use chat_relay::types::{Message, ProviderCredentials, StreamSession};
use futures_util::StreamExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> ChatClient {
    ChatClient::with_http_client(reqwest::Client::new(), Arc::new(ProviderRegistry::builtin()))
}

fn session(provider: &str, model: &str, server: &MockServer, key: Option<&str>) -> StreamSession {
    let mut credentials = ProviderCredentials::new().with_base_url(server.uri());
    if let Some(key) = key {
        credentials = credentials.with_api_key(key);
    }
    StreamSession::new(
        provider,
        model,
        vec![Message::system("be brief"), Message::user("hi")],
        credentials,
    )
}

#[tokio::test]
async fn openai_stream_sends_bearer_and_normalizes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "stream": true,
            "temperature": 0.7,
            "max_tokens": 2000,
        })))
        .respond_with(support::sse_response(support::fixture("openai/hello_world.sse")))
        .expect(1)
        .mount(&server)
        .await;

    let session = session("openai", "gpt-4o-mini", &server, Some("sk-test"));
    let (text, terminal) = collect_text(client().chat_stream(session)).await;
    assert_eq!(text, "Hello, wörld ✨");
    assert!(terminal.is_done());
}

#[tokio::test]
async fn openrouter_sends_attribution_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("x-title", "Multi-Provider AI Chat"))
        .respond_with(support::sse_response(support::fixture("openai/hello_world.sse")))
        .expect(1)
        .mount(&server)
        .await;

    let (_, terminal) = collect_text(client().chat_stream(session(
        "openrouter",
        "openai/gpt-4o",
        &server,
        Some("sk-or-test"),
    )))
    .await;
    assert!(terminal.is_done());
}

#[tokio::test]
async fn anthropic_stream_uses_header_key_and_system_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({
            "system": "be brief",
            "messages": [{ "role": "user", "content": "hi" }],
            "max_tokens": 2000,
            "stream": true,
        })))
        .respond_with(support::sse_response(support::fixture("anthropic/message_stream.sse")))
        .expect(1)
        .mount(&server)
        .await;

    let (text, terminal) = collect_text(client().chat_stream(session(
        "anthropic",
        "claude-3-5-sonnet-20241022",
        &server,
        Some("sk-ant-test"),
    )))
    .await;
    assert_eq!(text, "Hello world");
    assert!(terminal.is_done());
}

#[tokio::test]
async fn gemini_stream_puts_key_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:streamGenerateContent"))
        .and(query_param("key", "AIza test/key"))
        .and(body_partial_json(serde_json::json!({
            "systemInstruction": { "parts": [{ "text": "be brief" }] },
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_bytes(support::fixture("gemini/stream.json")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (text, terminal) = collect_text(client().chat_stream(session(
        "google",
        "gemini-1.5-flash",
        &server,
        Some("AIza test/key"),
    )))
    .await;
    assert_eq!(text, "Braces {like} these and \"quotes\" stay intact");
    assert!(terminal.is_done());
}

#[tokio::test]
async fn ollama_needs_no_key_and_ends_at_close() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({ "model": "llama3.2:3b", "stream": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-ndjson")
                .set_body_bytes(support::fixture("ollama/chat.ndjson")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (text, terminal) =
        collect_text(client().chat_stream(session("ollama", "llama3.2:3b", &server, None))).await;
    assert_eq!(text, "Local models rock");
    assert!(terminal.is_done());
}

#[tokio::test]
async fn rejected_request_is_a_single_classified_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({
                    "error": { "message": "Incorrect API key provided" }
                })),
        )
        .mount(&server)
        .await;

    let items: Vec<_> = client()
        .chat_stream(session("openai", "gpt-4o", &server, Some("sk-bad")))
        .collect()
        .await;
    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(e) => {
            assert_eq!(e.kind(), ErrorKind::AuthError);
            assert_eq!(e.user_message(), "Invalid API key");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn status_table_applies_to_real_responses() {
    let cases = [
        (402, ErrorKind::PaymentRequired),
        (404, ErrorKind::ModelNotFound),
        (429, ErrorKind::RateLimited),
        (503, ErrorKind::UpstreamServerError),
    ];
    for (status, kind) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;
        let session = session("groq", "llama-3.1-8b-instant", &server, Some("k"));
        let (_, terminal) = collect_text(client().chat_stream(session)).await;
        assert_eq!(terminal.error_kind(), Some(kind), "status {status}");
    }
}

#[tokio::test]
async fn missing_key_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = session("anthropic", "claude-3-5-haiku-20241022", &server, None);
    let (_, terminal) = collect_text(client().chat_stream(session)).await;
    assert_eq!(terminal.error_kind(), Some(ErrorKind::ApiKeyMissing));
}

#[tokio::test]
async fn empty_success_body_is_a_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(support::sse_response(Vec::new()))
        .mount(&server)
        .await;

    let (text, terminal) =
        collect_text(client().chat_stream(session("openai", "gpt-4o", &server, Some("k")))).await;
    assert!(text.is_empty());
    assert_eq!(terminal.error_kind(), Some(ErrorKind::NetworkError));
}

#[tokio::test]
async fn unreachable_upstream_is_a_connection_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let session = StreamSession::new(
        "ollama",
        "llama3.2:3b",
        vec![Message::user("hi")],
        ProviderCredentials::new().with_base_url(uri),
    );
    match collect_text(client().chat_stream(session)).await.1 {
        StreamTerminal::Error(LlmError::HttpError(msg)) => assert!(msg.contains("provider=ollama")),
        other => panic!("expected HttpError, got {other:?}"),
    }
}

#[tokio::test]
async fn cancel_handle_ends_a_stalled_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            support::sse_response(support::fixture("openai/hello_world.sse"))
                .set_delay(std::time::Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let handle = client().chat_stream_with_cancel(session("openai", "gpt-4o", &server, Some("k")));
    let mut stream = handle.stream;
    let cancel = handle.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        cancel.cancel();
    });
    let first = tokio::time::timeout(std::time::Duration::from_secs(5), stream.next())
        .await
        .expect("cancel unblocks the stream");
    assert_eq!(first, Some(Ok(ChatStreamEvent::StreamEnd)));
}

#[tokio::test]
async fn validate_checks_models_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", "Bearer good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let creds = |key: &str| {
        ProviderCredentials::new()
            .with_api_key(key)
            .with_base_url(server.uri())
    };
    assert!(client().validate_credentials("openai", &creds("good")).await.is_ok());
    let err = client()
        .validate_credentials("openai", &creds("bad"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthError);
}
