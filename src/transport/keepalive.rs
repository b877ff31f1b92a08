//! Periodic WebSocket pings toward the relay.
//!
//! Runs as a second writer next to the protocol engine, sharing the
//! stream's write lock.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::stream::RelayStream;

/// Spawn the keepalive task.
///
/// The first ping goes out one `interval` after spawning. The task stops
/// when `ct` fires, the stream is closed, or a ping fails. A zero
/// `interval` disables keepalive: the returned task exits at once.
pub fn spawn_keepalive<S>(
    stream: Arc<RelayStream<S>>,
    interval: Duration,
    ct: CancellationToken,
) -> JoinHandle<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    if interval.is_zero() {
        debug!("keepalive: zero interval, not pinging");
        return tokio::spawn(async {});
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = ct.cancelled() => {
                    debug!("keepalive: cancellation received, stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if stream.is_closed() {
                        break;
                    }
                    if let Err(err) = stream.ping().await {
                        warn!(%err, "keepalive: ping failed, stopping");
                        break;
                    }
                    debug!("keepalive: ping sent");
                }
            }
        }
    })
}
