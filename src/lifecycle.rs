//! Ties the relay connection to the process lifetime.
//!
//! OS termination signals and the caller's cancellation token are merged
//! into one token. When it fires, the connection is closed, which wakes
//! the engine out of its pending read and ends the loop.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::mcp::engine::Engine;
use crate::transport::stream::RelayStream;
use crate::Result;

/// Wait for Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                if let Err(err) = ctrl_c.await {
                    error!(%err, "ctrl-c signal handler failed");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
    }
}

/// Derive a token that fires when `parent` is cancelled or the process
/// receives a termination signal.
///
/// Must be called inside a tokio runtime.
#[must_use]
pub fn link_shutdown(parent: &CancellationToken) -> CancellationToken {
    let token = parent.child_token();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = shutdown_signal() => {
                info!("shutdown signal received");
                trigger.cancel();
            }
            () = trigger.cancelled() => {}
        }
    });
    token
}

/// Run `engine` on `stream` until it stops.
///
/// Cancelling `ct` closes the stream. The resulting read failure counts as
/// a normal stop and yields `Ok(())`. Any failure while `ct` is still live
/// is returned, after the stream has been closed.
///
/// # Errors
///
/// Returns the engine's `AppError::Transport` when the connection failed
/// without being cancelled.
pub async fn run_until_shutdown<S>(
    stream: Arc<RelayStream<S>>,
    engine: &Engine,
    ct: CancellationToken,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let watcher = {
        let stream = Arc::clone(&stream);
        let ct = ct.clone();
        tokio::spawn(async move {
            ct.cancelled().await;
            info!(peer = %stream.peer(), "closing relay connection");
            stream.close().await;
        })
    };

    let outcome = engine.run(stream.as_ref()).await;
    let cancelled = ct.is_cancelled();

    if cancelled {
        if let Err(err) = watcher.await {
            warn!(%err, "connection watcher did not finish cleanly");
        }
    } else {
        watcher.abort();
        stream.close().await;
    }

    match outcome {
        Err(err) if !cancelled => {
            error!(%err, "relay session failed");
            Err(err)
        }
        _ => {
            info!("relay session stopped normally");
            Ok(())
        }
    }
}
