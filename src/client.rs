//! Core client trait and error types.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{AbortRegistration, BoxStream};
use thiserror::Error;
use tracing::warn;

use crate::dispatch::{drive, SessionOutcome};
use crate::handler::StreamHandler;
use crate::model::StreamRequest;
use crate::options::TransportOptions;
use crate::sse::{frames, frames_abortable};

/// Raw byte chunks as pulled from an open response body.
pub type ByteStream = BoxStream<'static, Result<Bytes, StreamError>>;

/// Errors that can occur during a streaming call.
///
/// None of these escape a streaming call; they are delivered to
/// [`StreamHandler::on_error`].
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Payload of an `Error:` frame, kept verbatim.
    #[error("{0}")]
    ServerReported(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`StreamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The stream could not be opened or the transport broke underneath it.
    TransportUnavailable,
    /// The server sent an `Error:` frame.
    ServerReported,
    /// Bytes could not be turned into text frames.
    Decode,
}

impl StreamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamError::TransportUnavailable(_)
            | StreamError::Status { .. }
            | StreamError::Transport(_)
            | StreamError::Config(_)
            | StreamError::Json(_) => ErrorKind::TransportUnavailable,
            StreamError::ServerReported(_) => ErrorKind::ServerReported,
            StreamError::Decode(_) => ErrorKind::Decode,
        }
    }
}

/// A client that can open a byte stream for a [`StreamRequest`] and drive it
/// through the frame decoder and dispatcher.
///
/// # Associated Types
/// - `TransportProvider`: Transport-specific options (e.g., `HttpTransport`)
///
/// # Required Methods
/// - `open`: Static method that issues the request and returns the body
/// - `new`: Constructor to create a client instance
/// - `transport_options`: Accessor for the stored transport options
///
/// # Provided Methods (with default implementations)
/// - `request_stream`: Full streaming call with explicit options
/// - `stream`: Uses the stored options
/// - `stream_abortable`: Uses the stored options and stops on abort
///
/// # Example
/// ```rust,ignore
/// impl StreamingClient for MyClient {
///     type TransportProvider = MyTransport;
///
///     async fn open(
///         request: &StreamRequest,
///         transport_options: &TransportOptions<Self::TransportProvider>,
///     ) -> Result<ByteStream, StreamError> {
///         // Issue the request, check status, hand back the body
///     }
///
///     fn new(transport_options: TransportOptions<Self::TransportProvider>) -> Self {
///         Self { transport_options }
///     }
///
///     fn transport_options(&self) -> &TransportOptions<Self::TransportProvider> {
///         &self.transport_options
///     }
/// }
/// ```
#[async_trait]
pub trait StreamingClient: Send + Sync + Sized {
    /// Transport-specific options type.
    type TransportProvider: Send + Sync;

    /// Issue the request and return its body as a stream of byte chunks.
    ///
    /// Fails with a `TransportUnavailable`-class error when the request cannot
    /// be sent or the response status is not a success.
    async fn open(
        request: &StreamRequest,
        transport_options: &TransportOptions<Self::TransportProvider>,
    ) -> Result<ByteStream, StreamError>;

    /// Create a new client instance with the given options.
    fn new(transport_options: TransportOptions<Self::TransportProvider>) -> Self;

    /// Get reference to the transport options field.
    fn transport_options(&self) -> &TransportOptions<Self::TransportProvider>;

    /// Run one streaming call to its end.
    ///
    /// Every outcome is reported through `handler`: chunks in arrival order,
    /// then exactly one `on_complete` on a clean end, or exactly one fatal
    /// `on_error` (and no completion) when the stream cannot be opened or breaks.
    async fn request_stream<H>(
        request: StreamRequest,
        transport_options: &TransportOptions<Self::TransportProvider>,
        handler: &mut H,
    ) -> SessionOutcome
    where
        H: StreamHandler + ?Sized,
    {
        match Self::open(&request, transport_options).await {
            Ok(bytes) => drive(frames(bytes), handler).await,
            Err(err) => reject(err, handler),
        }
    }

    /// Run one streaming call with the client's stored options.
    async fn stream<H>(&self, request: StreamRequest, handler: &mut H) -> SessionOutcome
    where
        H: StreamHandler + ?Sized,
    {
        Self::request_stream(request, self.transport_options(), handler).await
    }

    /// Like [`stream`](Self::stream), but calling `abort()` on the paired
    /// `AbortHandle` ends the body early. An abort counts as a normal end of
    /// stream: buffered frames are flushed and `on_complete` fires.
    async fn stream_abortable<H>(
        &self,
        request: StreamRequest,
        handler: &mut H,
        registration: AbortRegistration,
    ) -> SessionOutcome
    where
        H: StreamHandler + ?Sized,
    {
        match Self::open(&request, self.transport_options()).await {
            Ok(bytes) => drive(frames_abortable(bytes, registration), handler).await,
            Err(err) => reject(err, handler),
        }
    }
}

/// The stream never opened: report once and skip the dispatcher entirely.
fn reject<H>(err: StreamError, handler: &mut H) -> SessionOutcome
where
    H: StreamHandler + ?Sized,
{
    warn!(error = %err, "stream could not be opened");
    handler.on_error(err);
    SessionOutcome::failed()
}
