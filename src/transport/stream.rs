//! Byte-stream adapter over a message-oriented WebSocket connection.
//!
//! The MCP stdio framing expects a byte stream of `\n`-terminated JSON
//! lines; the relay speaks discrete WebSocket messages. [`RelayStream`]
//! bridges the two:
//!
//! - `read` delivers each inbound message as one delimiter-terminated
//!   frame, split across as many reads as the caller's buffer requires.
//! - `write` sends each call as exactly one outbound message.
//! - `close` may be called from any task and unblocks a pending `read`.
//!
//! The read half and write half sit behind independent locks, so a reader
//! blocked waiting for the relay never holds up a concurrent writer.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::frame_buffer::FrameBuffer;

/// Default upper bound on delivering the close frame during shutdown.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Stream adapter over a relay connection established by the connector.
pub type RelayConnection = RelayStream<MaybeTlsStream<TcpStream>>;

/// Read side: the inbound message source plus the undelivered tail of the
/// last message.
struct Inbound<S> {
    source: SplitStream<WebSocketStream<S>>,
    pending: FrameBuffer,
}

/// Stream-style view of one WebSocket connection.
pub struct RelayStream<S> {
    inbound: Mutex<Inbound<S>>,
    outbound: Mutex<SplitSink<WebSocketStream<S>, Message>>,
    closed: CancellationToken,
    close_started: AtomicBool,
    close_timeout: Duration,
    peer: String,
}

impl<S> RelayStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Take ownership of an established WebSocket connection.
    ///
    /// `peer` is only used for logging and should not contain credentials.
    pub fn new(socket: WebSocketStream<S>, peer: impl Into<String>) -> Self {
        let (sink, source) = socket.split();
        Self {
            inbound: Mutex::new(Inbound {
                source,
                pending: FrameBuffer::new(),
            }),
            outbound: Mutex::new(sink),
            closed: CancellationToken::new(),
            close_started: AtomicBool::new(false),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            peer: peer.into(),
        }
    }

    /// Override how long `close` waits for the close frame to go out.
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Redacted description of the remote end.
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Read up to `buf.len()` bytes of the inbound byte stream.
    ///
    /// Buffered bytes from a previous message are delivered first. When
    /// none remain, waits for the next text or binary message; control
    /// frames are skipped. Only one task is expected to read at a time.
    ///
    /// # Errors
    ///
    /// - `BrokenPipe` when the stream was closed locally, including while
    ///   this call was waiting.
    /// - `ConnectionAborted` when the relay sent a close frame.
    /// - `UnexpectedEof` when the underlying connection ended.
    /// - Any transport error reported by the WebSocket layer.
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.is_closed() {
            return Err(closed_locally());
        }

        let mut inbound = self.inbound.lock().await;
        if !inbound.pending.is_empty() {
            return Ok(inbound.pending.drain_into(buf));
        }

        loop {
            let next = tokio::select! {
                biased;
                () = self.closed.cancelled() => return Err(closed_locally()),
                next = inbound.source.next() => next,
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    inbound.pending.load(text.as_bytes());
                    break;
                }
                Some(Ok(Message::Binary(data))) => {
                    inbound.pending.load(&data);
                    break;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    debug!(peer = %self.peer, ?frame, "relay closed the connection");
                    return Err(io::Error::new(
                        io::ErrorKind::ConnectionAborted,
                        "connection closed by relay",
                    ));
                }
                Some(Err(err)) => return Err(into_io_error(err)),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "relay stream ended",
                    ))
                }
            }
        }

        Ok(inbound.pending.drain_into(buf))
    }

    /// Send `bytes` as one outbound message and return its length.
    ///
    /// Valid UTF-8 goes out as a text message, anything else as binary.
    /// Concurrent writers are serialized; messages never interleave. A
    /// send stalled on a relay that stopped reading is abandoned when the
    /// stream is closed.
    ///
    /// # Errors
    ///
    /// Returns `BrokenPipe` after or during `close`, or the transport error
    /// from the underlying send.
    pub async fn write(&self, bytes: &[u8]) -> io::Result<usize> {
        let message = match std::str::from_utf8(bytes) {
            Ok(text) => Message::Text(text.to_owned()),
            Err(_) => Message::Binary(bytes.to_vec()),
        };

        self.send_until_closed(message).await?;
        Ok(bytes.len())
    }

    /// Send a WebSocket ping through the write lock.
    ///
    /// # Errors
    ///
    /// Same as [`RelayStream::write`].
    pub async fn ping(&self) -> io::Result<()> {
        self.send_until_closed(Message::Ping(Vec::new())).await
    }

    /// Take the write lock and send, giving up as soon as `close` runs.
    async fn send_until_closed(&self, message: Message) -> io::Result<()> {
        if self.is_closed() {
            return Err(closed_locally());
        }

        tokio::select! {
            biased;
            () = self.closed.cancelled() => Err(closed_locally()),
            sent = async {
                let mut sink = self.outbound.lock().await;
                sink.send(message).await.map_err(into_io_error)
            } => sent,
        }
    }

    /// Close the connection.
    ///
    /// Wakes any task blocked in `read` with an error, then makes one
    /// bounded attempt to send a close frame. Calling it again is a no-op.
    pub async fn close(&self) {
        self.closed.cancel();
        if self.close_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let goodbye = async {
            let mut sink = self.outbound.lock().await;
            sink.close().await
        };

        match tokio::time::timeout(self.close_timeout, goodbye).await {
            Ok(Ok(())) => debug!(peer = %self.peer, "close frame sent"),
            Ok(Err(err)) => debug!(peer = %self.peer, %err, "close frame not delivered"),
            Err(_) => warn!(peer = %self.peer, "timed out sending close frame"),
        }
    }
}

impl<S> fmt::Debug for RelayStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayStream")
            .field("peer", &self.peer)
            .field("closed", &self.closed.is_cancelled())
            .field("close_timeout", &self.close_timeout)
            .finish_non_exhaustive()
    }
}

fn closed_locally() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "stream closed")
}

fn into_io_error(err: tungstenite::Error) -> io::Error {
    match err {
        tungstenite::Error::Io(inner) => inner,
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            io::Error::new(io::ErrorKind::NotConnected, err.to_string())
        }
        other => io::Error::other(other.to_string()),
    }
}
