//! # sse-relay - Streamed answer delivery over Server-Sent Events
//!
//! A small client-side library that opens a streaming HTTP request, reassembles
//! the `data: ` frames of the response body no matter how the network slices
//! it, and hands each text increment to caller-supplied callbacks.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Boundary-independent framing, including UTF-8 sequences split across reads
//! - `[DONE]` and `Error:` sentinels handled by a small state machine
//! - `on_complete` fires at most once, and only after a clean drain
//! - Errors are always reported through the handler, never returned
//!
//! ## Architecture
//!
//! 1. **Transport** ([`providers::HttpStreamClient`]): sends the request and
//!    yields raw byte chunks
//! 2. **Decoder** ([`sse::FrameDecoder`], [`sse::frames`]): bytes to frame payloads
//! 3. **Dispatcher** ([`dispatch::Session`]): payloads to [`StreamHandler`] calls
//!
//! ## Example
//! ```no_run
//! use sse_relay::handler::TextCollector;
//! use sse_relay::model::StreamRequest;
//! use sse_relay::providers::HttpStreamClient;
//! use sse_relay::StreamingClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = HttpStreamClient::with_base_url("http://localhost:8000/api/v1");
//!
//!     let request = StreamRequest::post("/roles/process/stream")
//!         .with_body(json!({ "role_id": "marketing-expert", "query": "Pitch me a slogan" }));
//!
//!     let mut collector = TextCollector::new();
//!     let outcome = client.stream(request, &mut collector).await;
//!
//!     if outcome.is_completed() {
//!         println!("{}", collector.text());
//!     }
//! }
//! ```

pub mod client;
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod model;
pub mod options;
pub mod providers;
pub mod sse;

// Re-exports for convenience
pub use client::{ErrorKind, StreamError, StreamingClient};
pub use dispatch::{SessionOutcome, SessionState};
pub use handler::{Callbacks, StreamHandler, TextCollector};
pub use model::StreamRequest;
