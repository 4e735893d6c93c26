//! The callback contract between a streaming call and its caller.

use crate::client::StreamError;

/// Receiver of everything a streaming call produces.
///
/// For one call the dispatcher guarantees:
/// - `on_chunk` is invoked once per data frame, in arrival order, with the
///   payload exactly as received;
/// - `on_error` is invoked for every `Error:` frame (the stream continues),
///   and at most once for a fatal fault (the stream stops);
/// - `on_complete` is invoked at most once, and only after the stream drained
///   cleanly. It is never invoked after a fatal fault.
pub trait StreamHandler: Send {
    fn on_chunk(&mut self, text: String);

    fn on_error(&mut self, error: StreamError);

    fn on_complete(&mut self);
}

/// A [`StreamHandler`] built from three closures.
///
/// # Example
/// ```rust
/// use sse_relay::handler::{Callbacks, StreamHandler};
///
/// let mut answer = String::new();
/// let mut finished = false;
/// {
///     let mut callbacks = Callbacks::new(
///         |text: String| answer.push_str(&text),
///         |err| eprintln!("stream error: {}", err),
///         || finished = true,
///     );
///     callbacks.on_chunk("Hel".to_string());
///     callbacks.on_chunk("lo".to_string());
///     callbacks.on_complete();
/// }
/// assert_eq!(answer, "Hello");
/// assert!(finished);
/// ```
pub struct Callbacks<C, E, D> {
    on_chunk: C,
    on_error: E,
    on_complete: D,
}

impl<C, E, D> Callbacks<C, E, D>
where
    C: FnMut(String) + Send,
    E: FnMut(StreamError) + Send,
    D: FnMut() + Send,
{
    pub fn new(on_chunk: C, on_error: E, on_complete: D) -> Self {
        Self {
            on_chunk,
            on_error,
            on_complete,
        }
    }
}

impl<C, E, D> StreamHandler for Callbacks<C, E, D>
where
    C: FnMut(String) + Send,
    E: FnMut(StreamError) + Send,
    D: FnMut() + Send,
{
    fn on_chunk(&mut self, text: String) {
        (self.on_chunk)(text)
    }

    fn on_error(&mut self, error: StreamError) {
        (self.on_error)(error)
    }

    fn on_complete(&mut self) {
        (self.on_complete)()
    }
}

/// Accumulates a streamed answer into one string.
#[derive(Debug, Default)]
pub struct TextCollector {
    text: String,
    chunks: usize,
    errors: Vec<StreamError>,
    completed: bool,
}

impl TextCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenation of every chunk received so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn errors(&self) -> &[StreamError] {
        &self.errors
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl StreamHandler for TextCollector {
    fn on_chunk(&mut self, text: String) {
        self.chunks += 1;
        self.text.push_str(&text);
    }

    fn on_error(&mut self, error: StreamError) {
        self.errors.push(error);
    }

    fn on_complete(&mut self) {
        self.completed = true;
    }
}
