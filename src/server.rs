//! WebSocket listener.
//!
//! Accepts TCP connections, performs the WebSocket handshake and runs one
//! [`session`](crate::session) per connection on its own task. Sessions
//! share nothing; a failure in one never reaches the listener or another
//! session.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, info_span, warn, Instrument};

use crate::config::GlobalConfig;
use crate::session::supervisor::{run_session, ProducerOutcome, SessionSummary};
use crate::session::SessionId;
use crate::{AppError, Result};

/// Bind the listener on `config.listen_addr()`.
///
/// # Errors
///
/// Returns `AppError::Io` if the address cannot be bound.
pub async fn bind(config: &GlobalConfig) -> Result<TcpListener> {
    let addr = config.listen_addr();
    TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Io(format!("failed to bind {addr}: {err}")))
}

/// Accept connections until `ct` is cancelled.
///
/// Each accepted connection is served on its own task under a child token
/// of `ct`, so cancellation also winds down live sessions. Returns once
/// every session task has finished.
///
/// # Errors
///
/// Returns `AppError::Io` if the listener's local address is unavailable.
pub async fn serve(
    listener: TcpListener,
    config: Arc<GlobalConfig>,
    ct: CancellationToken,
) -> Result<()> {
    let local = listener
        .local_addr()
        .map_err(|err| AppError::Io(format!("listener has no local address: {err}")))?;
    let tracker = TaskTracker::new();

    async {
        info!("listening");
        loop {
            tokio::select! {
                () = ct.cancelled() => {
                    info!("listener shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => {
                            tracker.spawn(handle_connection(
                                stream,
                                peer,
                                Arc::clone(&config),
                                ct.child_token(),
                            ));
                        }
                        Err(err) => {
                            warn!(%err, "accept failed");
                        }
                    }
                }
            }
        }
    }
    .instrument(info_span!("listener", %local))
    .await;

    tracker.close();
    tracker.wait().await;
    info!(%local, "all sessions finished");
    Ok(())
}

/// Upgrade one TCP connection and run its session.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    config: Arc<GlobalConfig>,
    cancel: CancellationToken,
) {
    let session_id = SessionId::new();
    let span = info_span!("session", %session_id, %peer);

    async move {
        let handshake = tokio::select! {
            () = cancel.cancelled() => return,
            result = tokio_tungstenite::accept_async(stream) => result,
        };

        let ws = match handshake {
            Ok(ws) => ws,
            Err(err) => {
                warn!(error = %err, "websocket handshake failed");
                return;
            }
        };

        let (sink, stream) = ws.split();
        let summary = run_session(session_id, sink, stream, &config, &cancel).await;
        log_summary(&summary);
    }
    .instrument(span)
    .await;
}

fn log_summary(summary: &SessionSummary) {
    let producer = match &summary.producer {
        ProducerOutcome::Stopped(exit) => format!("{exit:?}"),
        ProducerOutcome::Aborted => "aborted".to_owned(),
    };
    info!(
        session_id = %summary.session_id,
        sent = summary.sent,
        received = summary.received,
        %producer,
        consumer = ?summary.consumer,
        "session ended"
    );
}
