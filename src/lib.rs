//! # chat-relay - Multi-provider LLM chat relay
//!
//! Every LLM provider streams completions in its own framing: OpenAI-style
//! SSE with a `[DONE]` sentinel, Anthropic typed events, newline-delimited
//! JSON from Ollama, a top-level JSON array from Gemini. chat-relay reads
//! all of them through one pipeline and re-emits a single envelope format.
//!
#![deny(unsafe_code)]

//! ## Pipeline
//!
//! - **FrameReader** ([`streaming::FrameReader`]): bytes to complete frames,
//!   chunk-boundary and UTF-8 safe
//! - **ProviderAdapter** ([`providers::ProviderAdapter`]): request building and
//!   frame-to-delta extraction per provider
//! - **ChatClient** ([`client::ChatClient`]): one HTTP request per session,
//!   exposed as a [`streaming::ChatStream`] of deltas plus one terminal
//! - **Error classification** ([`utils::error_handling`]): statuses and
//!   transport failures onto a closed [`error::ErrorKind`] set
//! - **Relay** ([`server_adapters`]): axum endpoints re-emitting the
//!   normalized envelope format
//! - **Consumer** ([`consumer`]): client side of that format
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chat_relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(ProviderRegistry::builtin());
//!     let client = ChatClient::new(registry, &HttpConfig::default())?;
//!
//!     let session = StreamSession::new(
//!         "ollama",
//!         "llama3.2:3b",
//!         vec![Message::user("Hello!")],
//!         ProviderCredentials::new(),
//!     );
//!     let (text, terminal) = collect_text(client.chat_stream(session)).await;
//!     println!("{text} ({terminal:?})");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod consumer;
pub mod error;
pub mod providers;
pub mod registry;
pub mod server_adapters;
pub mod streaming;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use error::{ErrorKind, LlmError};

/// Commonly used items.
pub mod prelude {
    pub use crate::client::{ChatClient, ChatService, ChatStreamHandle, HttpConfig};
    pub use crate::config::RelayConfig;
    pub use crate::consumer::{ChatMessage, Conversation, RelayClient, read_relay_stream};
    pub use crate::error::{ErrorKind, LlmError};
    pub use crate::providers::{FrameOutcome, ProviderAdapter, adapter_for};
    pub use crate::registry::{ModelDescriptor, ProviderDescriptor, ProviderRegistry};
    pub use crate::streaming::{
        ChatStream, ChatStreamEvent, FrameDelimiter, FrameReader, StreamTerminal, collect_text,
    };
    pub use crate::types::{
        ChatRequest, Message, ProviderCredentials, RequestConfig, Role, StreamSession,
    };
    pub use crate::utils::{CancelHandle, make_cancellable_stream};
}
