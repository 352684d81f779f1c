//! Consumer loop.
//!
//! Reads inbound WebSocket messages from the session's receive half and
//! logs them. Content is never interpreted and nothing is written back.
//! Control frames (ping/pong) are answered by the transport itself and only
//! traced at `DEBUG`.
//!
//! Each receive result is checked explicitly:
//!
//! | Result                           | Effect                              |
//! |----------------------------------|-------------------------------------|
//! | text / binary message            | logged at `INFO`, loop continues    |
//! | close frame, end of stream       | [`ConsumerExit::Closed`]            |
//! | reset / aborted socket           | [`ConsumerExit::Closed`]            |
//! | any other transport error        | [`ConsumerExit::Failed`], `WARN`    |
//! | session token cancelled          | [`ConsumerExit::Cancelled`]         |

use std::fmt::Write as _;

use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::SessionId;
use crate::AppError;

/// Number of leading bytes of a binary message rendered in the log.
const BINARY_PREVIEW_BYTES: usize = 16;

/// Why the consumer loop stopped.
#[derive(Debug)]
pub enum ConsumerExit {
    /// The peer closed or reset the connection.
    Closed(String),
    /// The transport failed for a reason other than a disconnect.
    Failed(AppError),
    /// The server is shutting down.
    Cancelled,
}

/// Outcome of one consumer run.
#[derive(Debug)]
pub struct ConsumerReport {
    /// Text and binary messages received.
    pub received: u64,
    /// How the loop ended.
    pub exit: ConsumerExit,
}

/// Consumer loop — logs every inbound message until the stream ends.
///
/// Returns as soon as a receive fails, the peer sends a close frame, the
/// stream is exhausted, or `cancel` fires.
pub async fn run_consumer<St>(
    session_id: SessionId,
    stream: &mut St,
    cancel: &CancellationToken,
) -> ConsumerReport
where
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut received: u64 = 0;

    let exit = loop {
        let item = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(%session_id, "consumer: cancellation received, stopping");
                break ConsumerExit::Cancelled;
            }
            item = stream.next() => item,
        };

        match item {
            None => {
                info!(%session_id, "consumer: stream ended");
                break ConsumerExit::Closed("stream ended".into());
            }
            Some(Err(err)) => {
                let err = AppError::from(err);
                if err.is_disconnect() {
                    info!(%session_id, reason = %err, "consumer: connection closed");
                    break ConsumerExit::Closed(err.to_string());
                }
                warn!(%session_id, error = %err, "consumer: transport error, stopping");
                break ConsumerExit::Failed(err);
            }
            Some(Ok(message)) => {
                if let Some(reason) = log_message(session_id, &message) {
                    info!(%session_id, %reason, "consumer: peer sent close frame");
                    break ConsumerExit::Closed(reason);
                }
                if matches!(message, Message::Text(_) | Message::Binary(_)) {
                    received += 1;
                }
            }
        }
    };

    ConsumerReport { received, exit }
}

/// Log one inbound message. Returns the close reason for close frames.
fn log_message(session_id: SessionId, message: &Message) -> Option<String> {
    match message {
        Message::Text(text) => {
            info!(%session_id, kind = "text", len = text.len(), text = %text.as_str(), "received");
            None
        }
        Message::Binary(data) => {
            info!(
                %session_id,
                kind = "binary",
                len = data.len(),
                preview = %hex_preview(data),
                "received"
            );
            None
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
            debug!(%session_id, len = message.len(), "consumer: control frame");
            None
        }
        Message::Close(frame) => Some(match frame {
            Some(frame) => format!(
                "close code {}: {}",
                u16::from(frame.code),
                frame.reason.as_str()
            ),
            None => "close frame without status".into(),
        }),
    }
}

/// Hex rendering of the first [`BINARY_PREVIEW_BYTES`] bytes.
fn hex_preview(data: &[u8]) -> String {
    let mut out = String::with_capacity(BINARY_PREVIEW_BYTES * 2 + 3);
    for byte in data.iter().take(BINARY_PREVIEW_BYTES) {
        let _ = write!(out, "{byte:02x}");
    }
    if data.len() > BINARY_PREVIEW_BYTES {
        out.push_str("...");
    }
    out
}
