//! Utility modules for chat-relay
//!
//! Cancellation and error classification helpers shared by the client,
//! relay and consumer.

pub mod cancel;
pub mod error_handling;

pub use cancel::{CancelHandle, make_cancellable_stream, with_cancel_handle};
pub use error_handling::{classify_http_error, classify_transport_error};
