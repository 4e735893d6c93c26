//! Per-stream state machine that routes frame payloads to a [`StreamHandler`].
//!
//! ```text
//! Streaming ──(drained)──▶ Completed
//!     │
//!     └──(fatal fault)───▶ Failed
//! ```
//!
//! Both terminal states are final: nothing reaches the handler after them,
//! which is what makes `on_complete` fire at most once.

use futures::{Stream, StreamExt};
use tracing::{debug, trace, warn};

use crate::client::StreamError;
use crate::handler::StreamHandler;
use crate::sse::Frame;

/// Lifecycle of one streaming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Streaming,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Streaming)
    }
}

/// What happened during a streaming call, returned once the call is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub state: SessionState,
    /// Data frames delivered to `on_chunk`
    pub chunks: usize,
    /// `Error:` frames delivered to `on_error`
    pub server_errors: usize,
    /// Whether the server sent `[DONE]`
    pub done_seen: bool,
}

impl SessionOutcome {
    /// Outcome of a call whose stream never opened.
    pub(crate) fn failed() -> Self {
        Self {
            state: SessionState::Failed,
            chunks: 0,
            server_errors: 0,
            done_seen: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }
}

/// Run-time state of one stream: the handler it reports to plus the flags
/// that enforce ordering and exactly-once completion.
pub struct Session<'h, H: StreamHandler + ?Sized> {
    handler: &'h mut H,
    state: SessionState,
    chunks: usize,
    server_errors: usize,
    done_seen: bool,
}

impl<'h, H: StreamHandler + ?Sized> Session<'h, H> {
    pub fn new(handler: &'h mut H) -> Self {
        Self {
            handler,
            state: SessionState::Streaming,
            chunks: 0,
            server_errors: 0,
            done_seen: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Route one frame payload. Ignored once the session is terminal.
    pub fn dispatch(&mut self, payload: String) {
        if self.state.is_terminal() {
            return;
        }

        match Frame::classify(payload) {
            // Completion waits for the stream to drain.
            Frame::Done => {
                trace!("done marker received");
                self.done_seen = true;
            }
            Frame::Error(message) => {
                debug!(message = %message, "server reported error");
                self.server_errors += 1;
                self.handler.on_error(StreamError::ServerReported(message));
            }
            Frame::Data(text) => {
                self.chunks += 1;
                self.handler.on_chunk(text);
            }
        }
    }

    /// The stream drained cleanly. Fires `on_complete` on the first call only.
    pub fn complete(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = SessionState::Completed;
        debug!(
            chunks = self.chunks,
            server_errors = self.server_errors,
            done_seen = self.done_seen,
            "stream completed"
        );
        self.handler.on_complete();
    }

    /// A fatal fault ended the stream. Reports it once; no completion follows.
    pub fn fail(&mut self, error: StreamError) {
        if self.state.is_terminal() {
            return;
        }
        self.state = SessionState::Failed;
        warn!(error = %error, chunks = self.chunks, "stream failed");
        self.handler.on_error(error);
    }

    pub fn outcome(&self) -> SessionOutcome {
        SessionOutcome {
            state: self.state,
            chunks: self.chunks,
            server_errors: self.server_errors,
            done_seen: self.done_seen,
        }
    }
}

/// Feed every payload of `frames` through a fresh [`Session`] until the
/// stream ends or yields an error.
pub async fn drive<S, H>(frames: S, handler: &mut H) -> SessionOutcome
where
    S: Stream<Item = Result<String, StreamError>>,
    H: StreamHandler + ?Sized,
{
    let mut session = Session::new(handler);
    futures::pin_mut!(frames);

    while let Some(item) = frames.next().await {
        match item {
            Ok(payload) => session.dispatch(payload),
            Err(err) => {
                session.fail(err);
                return session.outcome();
            }
        }
    }

    session.complete();
    session.outcome()
}
