//! Newline-delimited JSON framing for the relay byte stream.
//!
//! The protocol engine feeds bytes read from the
//! [`RelayStream`](crate::transport::stream::RelayStream) into a
//! [`BytesMut`] and pulls frames out with [`Decoder::decode`]. Outbound
//! responses are framed with [`Encoder::encode`].
//!
//! Line splitting and the length cap come from
//! [`tokio_util::codec::LinesCodec`]. On top of that the codec applies the
//! frame policy of the relay link:
//!
//! - surrounding whitespace is trimmed and blank lines never surface as
//!   frames (the stream adapter appends a delimiter to every message, so
//!   an empty message arrives as a bare `\n`);
//! - every rejected inbound frame is counted, so the engine can report how
//!   many were dropped over the session;
//! - an outbound frame containing a line break is refused, since it would
//!   reach the relay as two frames.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Maximum accepted frame length: 1 MiB.
pub const MAX_FRAME_BYTES: usize = 1_048_576;

/// Frame codec for JSON-RPC over the relay stream.
///
/// Lines longer than the limit yield [`AppError::Codec`] and the rest of
/// that line is discarded; decoding resumes at the next `\n`. Lines that
/// are not valid UTF-8 are consumed and reported the same way.
#[derive(Debug)]
pub struct FrameCodec {
    lines: LinesCodec,
    rejected: u64,
}

impl FrameCodec {
    /// Create a codec with the default [`MAX_FRAME_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(MAX_FRAME_BYTES)
    }

    /// Create a codec that rejects inbound frames longer than `max_length`.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
            rejected: 0,
        }
    }

    /// Inbound length limit in bytes.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.lines.max_length()
    }

    /// Inbound frames rejected so far.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn next_frame(&mut self, src: &mut BytesMut, eof: bool) -> Result<Option<String>> {
        loop {
            let line = if eof {
                self.lines.decode_eof(src)
            } else {
                self.lines.decode(src)
            };

            match line {
                Ok(Some(line)) => {
                    let frame = line.trim();
                    if frame.is_empty() {
                        continue;
                    }
                    if frame.len() == line.len() {
                        return Ok(Some(line));
                    }
                    return Ok(Some(frame.to_owned()));
                }
                Ok(None) => return Ok(None),
                Err(err) => {
                    self.rejected += 1;
                    return Err(self.map_codec_error(err));
                }
            }
        }
    }

    /// Decoding operates on in-memory buffers, so the only `Io` variant
    /// `LinesCodec` produces is invalid UTF-8.
    fn map_codec_error(&self, err: LinesCodecError) -> AppError {
        match err {
            LinesCodecError::MaxLineLengthExceeded => AppError::Codec(format!(
                "line too long: exceeded {} bytes",
                self.max_length()
            )),
            LinesCodecError::Io(io_err) => AppError::Codec(format!("invalid frame: {io_err}")),
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.next_frame(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.next_frame(src, true)
    }
}

impl Encoder<String> for FrameCodec {
    type Error = AppError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        if item.contains(&['\n', '\r'][..]) {
            return Err(AppError::Codec(
                "outbound frame contains a line break".into(),
            ));
        }
        self.lines
            .encode(item, dst)
            .map_err(|err| AppError::Codec(format!("encode failed: {err}")))
    }
}
