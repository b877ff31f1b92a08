//! Read → dispatch → write loop over the relay stream.
//!
//! Bytes read from the [`RelayStream`] are split into lines with
//! [`FrameCodec`]. Each line is decoded as a JSON-RPC request, routed
//! through the [`Dispatcher`], and any response is written back as one
//! line. A request is fully answered before the next read, so responses
//! leave in request order.
//!
//! Blank, oversized and undecodable frames are skipped, the latter two with
//! a warning. The loop only ends when the stream fails, and that failure is
//! returned as `AppError::Transport`.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use super::codec::FrameCodec;
use super::dispatcher::Dispatcher;
use super::protocol::{decode_request, encode_response};
use crate::transport::stream::RelayStream;
use crate::{AppError, Result};

/// Size of each read from the stream.
pub const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Longest slice of a rejected frame echoed into the logs.
const LOG_PREVIEW_BYTES: usize = 256;

/// Protocol engine driving one connection.
#[derive(Debug)]
pub struct Engine {
    dispatcher: Dispatcher,
}

impl Engine {
    /// Create an engine around a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// The dispatcher requests are routed through.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serve requests until reading or writing the stream fails.
    ///
    /// # Errors
    ///
    /// Always ends with `AppError::Transport` describing the I/O failure,
    /// including the failure caused by a local `close`. Callers decide
    /// whether that was intentional.
    pub async fn run<S>(&self, stream: &RelayStream<S>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut codec = FrameCodec::new();
        let mut pending = BytesMut::with_capacity(READ_CHUNK_BYTES);
        let mut chunk = vec![0u8; READ_CHUNK_BYTES];

        loop {
            loop {
                match codec.decode(&mut pending) {
                    Ok(Some(line)) => self.process_line(stream, &mut codec, &line).await?,
                    Ok(None) => break,
                    Err(err) => warn!(%err, rejected = codec.rejected(), "skipping undecodable frame"),
                }
            }

            let read = stream
                .read(&mut chunk)
                .await
                .map_err(|err| AppError::Transport(format!("read failed: {err}")))?;
            if read == 0 {
                return Err(AppError::Transport("read returned no data".into()));
            }
            pending.extend_from_slice(chunk.get(..read).unwrap_or_default());
        }
    }

    async fn process_line<S>(
        &self,
        stream: &RelayStream<S>,
        codec: &mut FrameCodec,
        line: &str,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let request = match decode_request(line) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, raw_line = %preview(line), "skipping malformed frame");
                return Ok(());
            }
        };

        debug!(method = %request.method, id = ?request.id, "request received");

        let Some(response) = self.dispatcher.handle(request).await else {
            return Ok(());
        };

        let encoded = match encode_response(&response) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(%err, id = ?response.id, "dropping unencodable response");
                return Ok(());
            }
        };

        let mut out = BytesMut::with_capacity(encoded.len() + 1);
        if let Err(err) = codec.encode(encoded, &mut out) {
            warn!(%err, id = ?response.id, "dropping unframeable response");
            return Ok(());
        }
        stream
            .write(&out)
            .await
            .map_err(|err| AppError::Transport(format!("write failed: {err}")))?;
        Ok(())
    }
}

/// Leading part of `text`, cut on a char boundary.
fn preview(text: &str) -> &str {
    if text.len() <= LOG_PREVIEW_BYTES {
        return text;
    }
    let end = (0..=LOG_PREVIEW_BYTES)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0);
    text.get(..end).unwrap_or_default()
}
