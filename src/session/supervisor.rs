//! Session supervisor.
//!
//! Runs one session end to end: spawn the producer on the send half, run
//! the consumer inline on the receive half, then cancel the producer and
//! close the connection once the consumer returns.

use std::fmt::Display;

use futures_util::{Sink, SinkExt, Stream};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::consumer::{run_consumer, ConsumerExit};
use super::producer::{spawn_producer, ProducerExit};
use super::SessionId;
use crate::config::GlobalConfig;

/// Producer state as seen by the supervisor after teardown.
#[derive(Debug)]
pub enum ProducerOutcome {
    /// The producer returned within the grace period.
    Stopped(ProducerExit),
    /// The producer had to be aborted.
    Aborted,
}

/// What happened during one session. Logged, never acted upon.
#[derive(Debug)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: SessionId,
    /// Records the producer handed to the transport.
    pub sent: u64,
    /// Text and binary messages the consumer received.
    pub received: u64,
    /// How the producer ended.
    pub producer: ProducerOutcome,
    /// How the consumer ended.
    pub consumer: ConsumerExit,
}

/// Run one session to completion.
///
/// `sink` and `stream` are the two halves of the same connection. When this
/// returns the producer has been cancelled (and either joined or aborted)
/// and the send half has been closed. `cancel` ends the session early; the
/// producer runs under a child token of it.
pub async fn run_session<S, St>(
    session_id: SessionId,
    sink: S,
    mut stream: St,
    config: &GlobalConfig,
    cancel: &CancellationToken,
) -> SessionSummary
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    info!(%session_id, "session started");

    let producer = spawn_producer(
        session_id,
        sink,
        config.producer.clone(),
        cancel.child_token(),
    );

    let consumer = run_consumer(session_id, &mut stream, cancel).await;

    producer.cancel();
    let (sent, producer_outcome) = match producer.finish(config.session.producer_grace()).await {
        Some((mut sink, report)) => {
            if let Err(err) = sink.close().await {
                debug!(%session_id, error = %err, "close on send half failed");
            }
            (report.sent, ProducerOutcome::Stopped(report.exit))
        }
        None => (0, ProducerOutcome::Aborted),
    };

    SessionSummary {
        session_id,
        sent,
        received: consumer.received,
        producer: producer_outcome,
        consumer: consumer.exit,
    }
}
