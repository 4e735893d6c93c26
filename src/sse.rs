//! Server-Sent Events framing.
//!
//! The wire format is a sequence of blank-line separated frames:
//! ```text
//! data: Hel
//!
//! data: lo
//!
//! data: Error: model overloaded
//!
//! data: [DONE]
//! ```
//!
//! [`FrameDecoder`] turns arbitrarily sliced byte chunks into frame payloads,
//! and [`frames`] lifts it over a byte stream.

use std::collections::VecDeque;

use futures::stream::{self, AbortRegistration, Abortable, Stream, StreamExt};
use tracing::trace;

use crate::client::StreamError;

/// Separator between two frames.
pub const FRAME_SEPARATOR: &str = "\n\n";

/// Prefix of every meaningful frame.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that marks explicit server-side completion.
pub const DONE_MARKER: &str = "[DONE]";

/// Prefix of a payload that carries a server-reported error.
pub const ERROR_PREFIX: &str = "Error:";

/// A classified frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Content increment, delivered unmodified.
    Data(String),
    /// The `[DONE]` sentinel.
    Done,
    /// An `Error:` payload, kept whole.
    Error(String),
}

impl Frame {
    /// Classify a payload (the text after `data: `).
    ///
    /// # Example
    /// ```
    /// use sse_relay::sse::Frame;
    ///
    /// assert_eq!(Frame::classify("[DONE]".to_string()), Frame::Done);
    /// assert_eq!(Frame::classify("Error: boom".to_string()), Frame::Error("Error: boom".to_string()));
    /// assert_eq!(Frame::classify(" hi".to_string()), Frame::Data(" hi".to_string()));
    /// ```
    pub fn classify(payload: String) -> Self {
        if is_done_marker(&payload) {
            Frame::Done
        } else if is_error_payload(&payload) {
            Frame::Error(payload)
        } else {
            Frame::Data(payload)
        }
    }
}

/// Extract the payload of a frame.
///
/// Frames are in the format `data: <payload>`. The payload is returned as-is;
/// leading or trailing whitespace in it is content.
///
/// # Example
/// ```
/// use sse_relay::sse::parse_frame;
///
/// assert_eq!(parse_frame("data: {\"key\": \"value\"}"), Some("{\"key\": \"value\"}"));
/// assert_eq!(parse_frame("data:  two spaces"), Some(" two spaces"));
/// assert_eq!(parse_frame(": keep-alive"), None);
/// ```
pub fn parse_frame(frame: &str) -> Option<&str> {
    frame.strip_prefix(DATA_PREFIX)
}

/// Check if a payload is the completion sentinel.
///
/// # Example
/// ```
/// use sse_relay::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker(" [DONE]"));
/// assert!(!is_done_marker(""));
/// ```
pub fn is_done_marker(payload: &str) -> bool {
    payload == DONE_MARKER
}

/// Check if a payload is a server-reported error.
pub fn is_error_payload(payload: &str) -> bool {
    payload.starts_with(ERROR_PREFIX)
}

/// Incremental decoder from raw byte chunks to frame payloads.
///
/// Holds the text received so far that has not yet been closed by a separator,
/// plus the tail of a UTF-8 sequence cut by a chunk boundary. One decoder
/// belongs to exactly one stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
    pending: Vec<u8>,
    // Offset in `buffer` before which no separator can start.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text received but not yet emitted as a complete frame.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Feed one raw chunk and return the payloads of every frame it completed,
    /// in arrival order. Returns an empty vector when no frame is complete yet.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>, StreamError> {
        self.append(chunk)?;

        let mut payloads = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.buffer[from..].find(FRAME_SEPARATOR) {
            let end = from + offset;
            if let Some(payload) = extract_payload(&self.buffer[start..end]) {
                payloads.push(payload);
            }
            start = end + FRAME_SEPARATOR.len();
            from = start;
        }
        self.buffer.drain(..start);

        // A trailing '\n' may be the first half of a separator.
        self.scanned = if self.buffer.ends_with('\n') {
            self.buffer.len() - 1
        } else {
            self.buffer.len()
        };
        Ok(payloads)
    }

    /// Signal end of stream. Returns the payload of a trailing `data: ` frame
    /// that never received its separator, if any.
    pub fn finish(&mut self) -> Result<Option<String>, StreamError> {
        if !self.pending.is_empty() {
            let dangling = self.pending.len();
            self.pending.clear();
            self.buffer.clear();
            self.scanned = 0;
            return Err(StreamError::Decode(format!(
                "stream ended inside a UTF-8 sequence ({} dangling bytes)",
                dangling
            )));
        }
        Ok(self.flush())
    }

    /// End of stream forced by the caller. Bytes of a UTF-8 sequence cut by
    /// the interruption are dropped; the text before them is flushed as in
    /// [`finish`](Self::finish).
    pub fn finish_interrupted(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            trace!(len = self.pending.len(), "dropping partial UTF-8 sequence");
            self.pending.clear();
        }
        self.flush()
    }

    fn flush(&mut self) -> Option<String> {
        self.scanned = 0;
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest
            .strip_suffix("\r\n")
            .or_else(|| rest.strip_suffix('\n'))
            .unwrap_or(rest.as_str());
        extract_payload(rest)
    }

    fn append(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        let bytes = if self.pending.is_empty() {
            chunk.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            joined
        };

        match std::str::from_utf8(&bytes) {
            Ok(text) => self.buffer.push_str(text),
            // Only an incomplete sequence at the very end; wait for the rest.
            Err(err) if err.error_len().is_none() => {
                let (valid, tail) = bytes.split_at(err.valid_up_to());
                let text = std::str::from_utf8(valid)
                    .map_err(|e| StreamError::Decode(e.to_string()))?;
                self.buffer.push_str(text);
                self.pending = tail.to_vec();
            }
            Err(err) => {
                return Err(StreamError::Decode(format!("invalid UTF-8 in stream: {}", err)));
            }
        }
        Ok(())
    }
}

fn extract_payload(block: &str) -> Option<String> {
    let block = block.trim_start_matches(['\r', '\n']);
    match parse_frame(block) {
        Some(payload) => Some(payload.to_string()),
        None => {
            if !block.is_empty() {
                trace!(len = block.len(), "discarding non-data block");
            }
            None
        }
    }
}

/// Turn a stream of raw byte chunks into a stream of frame payloads.
///
/// Frames split across chunks are reassembled; a trailing unterminated
/// `data: ` frame is flushed once the byte stream ends. The first error,
/// whether from the transport or from decoding, is yielded and then the
/// stream ends.
pub fn frames<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, StreamError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<StreamError> + Send,
{
    decode_frames(bytes, |_: &S| false)
}

/// Like [`frames`], but the byte stream stops as soon as the paired
/// `AbortHandle` is aborted. An abort is a normal end of stream: buffered
/// text is flushed and no decode fault is raised for a character the abort
/// cut in half.
pub fn frames_abortable<S, B, E>(
    bytes: S,
    registration: AbortRegistration,
) -> impl Stream<Item = Result<String, StreamError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<StreamError> + Send,
{
    decode_frames(Abortable::new(bytes, registration), Abortable::is_aborted)
}

fn decode_frames<S, B, E>(
    bytes: S,
    interrupted: fn(&S) -> bool,
) -> impl Stream<Item = Result<String, StreamError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<StreamError> + Send,
{
    stream::unfold(
        (Box::pin(bytes), FrameDecoder::new(), VecDeque::new(), false),
        move |(mut bytes, mut decoder, mut ready, mut ended)| async move {
            loop {
                if let Some(payload) = ready.pop_front() {
                    return Some((Ok(payload), (bytes, decoder, ready, ended)));
                }

                if ended {
                    return None;
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => match decoder.decode(chunk.as_ref()) {
                        Ok(payloads) => ready.extend(payloads),
                        Err(e) => {
                            return Some((Err(e), (bytes, decoder, ready, true)));
                        }
                    },
                    Some(Err(e)) => {
                        return Some((Err(e.into()), (bytes, decoder, ready, true)));
                    }
                    None if interrupted(bytes.as_ref().get_ref()) => {
                        ended = true;
                        ready.extend(decoder.finish_interrupted());
                    }
                    None => {
                        ended = true;
                        match decoder.finish() {
                            Ok(last) => ready.extend(last),
                            Err(e) => {
                                return Some((Err(e), (bytes, decoder, ready, ended)));
                            }
                        }
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::future;
    use futures::stream::AbortHandle;

    const WIRE: &str = "data: Hel\n\ndata: lo wor\n\n: ping\n\ndata: Error: slow down\n\ndata: ld\n\ndata: [DONE]\n\n";

    async fn collect(chunks: Vec<Vec<u8>>) -> Vec<Result<String, StreamError>> {
        let source = stream::iter(chunks.into_iter().map(|c| Ok::<_, StreamError>(Bytes::from(c))));
        frames(source).collect().await
    }

    async fn payloads(chunks: Vec<Vec<u8>>) -> Vec<String> {
        collect(chunks)
            .await
            .into_iter()
            .map(|r| r.expect("unexpected error"))
            .collect()
    }

    #[test]
    fn test_parse_frame() {
        assert_eq!(parse_frame("data: hello"), Some("hello"));
        assert_eq!(parse_frame("data: "), Some(""));
        assert_eq!(parse_frame("data:hello"), None);
        assert_eq!(parse_frame("event: message"), None);
        assert_eq!(parse_frame(""), None);
    }

    #[test]
    fn test_is_error_payload() {
        assert!(is_error_payload("Error: boom"));
        assert!(is_error_payload("Error:"));
        assert!(!is_error_payload("error: lowercase"));
        assert!(!is_error_payload("An Error: mid-sentence"));
    }

    #[test]
    fn test_decoder_keeps_partial_frame_buffered() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(b"data: Hel").unwrap().is_empty());
        assert_eq!(decoder.buffered(), "data: Hel");

        let out = decoder.decode(b"lo\n\ndata: [DO").unwrap();
        assert_eq!(out, vec!["Hello".to_string()]);
        assert_eq!(decoder.buffered(), "data: [DO");
    }

    #[test]
    fn test_decoder_separator_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(b"data: a\n").unwrap().is_empty());
        assert_eq!(decoder.decode(b"\ndata: b\n\n").unwrap(), vec!["a", "b"]);
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_decoder_discards_non_data_blocks() {
        let mut decoder = FrameDecoder::new();
        let out = decoder
            .decode(b": keep-alive\n\nevent: ping\n\ndata: x\n\n\n\n")
            .unwrap();
        assert_eq!(out, vec!["x"]);
    }

    #[test]
    fn test_decoder_tolerates_extra_blank_lines() {
        let mut decoder = FrameDecoder::new();
        let out = decoder.decode(b"data: a\n\n\ndata: b\n\n").unwrap();
        assert_eq!(out, vec!["a", "b"]);
    }

    #[test]
    fn test_decoder_payload_is_not_trimmed() {
        let mut decoder = FrameDecoder::new();
        let out = decoder.decode(b"data:  padded \n\n").unwrap();
        assert_eq!(out, vec![" padded "]);
    }

    #[test]
    fn test_decoder_multibyte_char_split_across_chunks() {
        let text = "data: caf\u{e9} \u{1f980}\n\n".as_bytes();
        // Cut inside the four-byte crab.
        let cut = text.len() - 4;
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(&text[..cut]).unwrap().is_empty());
        assert_eq!(
            decoder.decode(&text[cut..]).unwrap(),
            vec!["caf\u{e9} \u{1f980}"]
        );
    }

    #[test]
    fn test_decoder_invalid_utf8_is_decode_error() {
        let mut decoder = FrameDecoder::new();
        let err = decoder.decode(b"data: \xff\xfe\n\n").unwrap_err();
        assert!(matches!(err, StreamError::Decode(_)));
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.decode(b"data: a\n\ndata: tail\n").unwrap(), vec!["a"]);
        assert_eq!(decoder.finish().unwrap(), Some("tail".to_string()));
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_finish_drops_non_data_leftover() {
        let mut decoder = FrameDecoder::new();
        decoder.decode(b": comment").unwrap();
        assert_eq!(decoder.finish().unwrap(), None);
    }

    #[test]
    fn test_finish_inside_utf8_sequence_is_decode_error() {
        let mut decoder = FrameDecoder::new();
        decoder.decode(&[b'd', b'a', b't', b'a', b':', b' ', 0xE2, 0x82]).unwrap();
        assert!(matches!(decoder.finish(), Err(StreamError::Decode(_))));
    }

    #[tokio::test]
    async fn test_frames_single_chunk() {
        let out = payloads(vec![WIRE.as_bytes().to_vec()]).await;
        assert_eq!(
            out,
            vec!["Hel", "lo wor", "Error: slow down", "ld", "[DONE]"]
        );
    }

    #[tokio::test]
    async fn test_frames_are_independent_of_chunk_boundaries() {
        let bytes = WIRE.as_bytes();
        let expected = payloads(vec![bytes.to_vec()]).await;

        // One byte at a time.
        let single: Vec<Vec<u8>> = bytes.iter().map(|b| vec![*b]).collect();
        assert_eq!(payloads(single).await, expected);

        // Every two-way split.
        for cut in 0..=bytes.len() {
            let chunks = vec![bytes[..cut].to_vec(), bytes[cut..].to_vec()];
            assert_eq!(payloads(chunks).await, expected, "split at {}", cut);
        }

        // Uneven slices.
        let uneven: Vec<Vec<u8>> = bytes.chunks(7).map(|c| c.to_vec()).collect();
        assert_eq!(payloads(uneven).await, expected);
    }

    #[tokio::test]
    async fn test_frames_empty_stream() {
        assert!(collect(vec![]).await.is_empty());
        assert!(collect(vec![Vec::new(), Vec::new()]).await.is_empty());
    }

    #[tokio::test]
    async fn test_frames_flush_trailing_frame() {
        let out = payloads(vec![b"data: A\n\ndata: B".to_vec()]).await;
        assert_eq!(out, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_frames_stop_after_transport_error() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"data: A\n\n")),
            Err(StreamError::TransportUnavailable("connection reset".into())),
            Ok(Bytes::from_static(b"data: B\n\n")),
        ]);
        let out: Vec<_> = frames(source).collect().await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap(), "A");
        assert!(matches!(out[1], Err(StreamError::TransportUnavailable(_))));
    }

    #[tokio::test]
    async fn test_frames_stop_after_decode_error() {
        let out = collect(vec![
            b"data: A\n\n".to_vec(),
            b"data: \xc3\x28\n\n".to_vec(),
            b"data: B\n\n".to_vec(),
        ])
        .await;
        assert_eq!(out.len(), 2);
        assert!(matches!(out[1], Err(StreamError::Decode(_))));
    }

    #[test]
    fn test_finish_strips_trailing_crlf() {
        let mut decoder = FrameDecoder::new();
        decoder.decode(b"data: tail\r\n").unwrap();
        assert_eq!(decoder.finish().unwrap(), Some("tail".to_string()));

        decoder.decode(b"data: keep\r\r\n").unwrap();
        assert_eq!(decoder.finish().unwrap(), Some("keep\r".to_string()));
    }

    #[test]
    fn test_finish_interrupted_drops_cut_character() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(b"data: caf\xc3").unwrap().is_empty());
        assert_eq!(decoder.finish_interrupted(), Some("caf".to_string()));
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_decoder_resumes_after_multibyte_tail() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode("data: \u{e9}\u{e9}".as_bytes()).unwrap().is_empty());
        assert!(decoder.decode("\u{1f980}\n".as_bytes()).unwrap().is_empty());
        assert_eq!(
            decoder.decode(b"\ndata: next\n\n").unwrap(),
            vec!["\u{e9}\u{e9}\u{1f980}", "next"]
        );
    }

    #[test]
    fn test_decoder_large_frame_byte_by_byte() {
        let payload = "x".repeat(200_000);
        let wire = format!("data: {}\n\ndata: after\n\n", payload);
        let mut decoder = FrameDecoder::new();
        let mut out = Vec::new();
        for byte in wire.as_bytes() {
            out.extend(decoder.decode(&[*byte]).unwrap());
        }
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), payload.len());
        assert_eq!(out[1], "after");
    }

    #[test]
    fn test_decoder_many_frames_in_one_chunk() {
        let wire: String = (0..10_000).map(|i| format!("data: {}\n\n", i)).collect();
        let mut decoder = FrameDecoder::new();
        let out = decoder.decode(wire.as_bytes()).unwrap();
        assert_eq!(out.len(), 10_000);
        assert_eq!(out[9_999], "9999");
        assert_eq!(decoder.buffered(), "");
    }

    #[tokio::test]
    async fn test_frames_natural_end_inside_character_is_decode_error() {
        let out = collect(vec![b"data: A\n\ndata: caf\xc3".to_vec()]).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap(), "A");
        assert!(matches!(out[1], Err(StreamError::Decode(_))));
    }

    #[tokio::test]
    async fn test_frames_abort_inside_character_ends_cleanly() {
        let (handle, registration) = AbortHandle::new_pair();
        let source = stream::iter(vec![Ok::<_, StreamError>(Bytes::from_static(
            b"data: A\n\ndata: caf\xc3",
        ))])
        .chain(stream::once(async move {
            handle.abort();
            future::pending::<Result<Bytes, StreamError>>().await
        }));

        let out: Vec<String> = frames_abortable(source, registration)
            .map(|r| r.expect("abort must not raise an error"))
            .collect()
            .await;
        assert_eq!(out, vec!["A", "caf"]);
    }

    #[tokio::test]
    async fn test_frames_abortable_without_abort_matches_frames() {
        let (_handle, registration) = AbortHandle::new_pair();
        let source = stream::iter(vec![Ok::<_, StreamError>(Bytes::from_static(WIRE.as_bytes()))]);
        let out: Vec<String> = frames_abortable(source, registration)
            .map(|r| r.expect("unexpected error"))
            .collect()
            .await;
        assert_eq!(out, payloads(vec![WIRE.as_bytes().to_vec()]).await);
    }
}
