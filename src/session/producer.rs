//! Producer task.
//!
//! Emits one binary record per tick on the session's send half. The first
//! record goes out immediately; every following one after an interruptible
//! wait of one tick interval.
//!
//! Both suspension points (the send and the inter-tick wait) race against
//! the session's [`CancellationToken`], so once cancellation is observed no
//! further record is handed to the sink.
//!
//! | State       | Entered when                          | Terminal |
//! |-------------|---------------------------------------|----------|
//! | `Running`   | task start                            | no       |
//! | `Cancelled` | token fires before a send or in a wait | yes     |
//! | `Faulted`   | the sink rejects a record             | yes      |

use std::fmt::Display;
use std::time::Duration;

use futures_util::{Sink, SinkExt};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, warn, Instrument};

use super::SessionId;
use crate::config::ProducerConfig;
use crate::record::Wavepoint;
use crate::AppError;

/// Terminal state of a producer run.
#[derive(Debug)]
pub enum ProducerExit {
    /// Cancellation was observed; no send was attempted afterwards.
    Cancelled,
    /// A send failed; the producer stopped without retrying.
    Faulted(AppError),
}

/// Outcome of one producer run.
#[derive(Debug)]
pub struct ProducerReport {
    /// Records accepted by the sink.
    pub sent: u64,
    /// How the run ended.
    pub exit: ProducerExit,
}

/// Producer loop — sends one record per tick until cancelled or faulted.
///
/// The phase for tick `n` is `config.phase_step * n`. A failed send is
/// logged at `ERROR` and ends the loop; it is never retried.
pub async fn run_producer<S>(
    session_id: SessionId,
    sink: &mut S,
    config: &ProducerConfig,
    cancel: &CancellationToken,
) -> ProducerReport
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let interval = config.tick_interval();
    let mut tick: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            debug!(%session_id, tick, "producer: cancelled before send");
            return ProducerReport {
                sent: tick,
                exit: ProducerExit::Cancelled,
            };
        }

        let frame = Message::Binary(Wavepoint::at(tick, config.phase_step).record().to_bytes());

        let outcome = tokio::select! {
            biased;

            () = cancel.cancelled() => None,
            result = sink.send(frame) => Some(result),
        };

        match outcome {
            None => {
                debug!(%session_id, tick, "producer: cancelled during send");
                return ProducerReport {
                    sent: tick,
                    exit: ProducerExit::Cancelled,
                };
            }
            Some(Err(err)) => {
                error!(%session_id, tick, error = %err, "producer: send failed, stopping");
                return ProducerReport {
                    sent: tick,
                    exit: ProducerExit::Faulted(AppError::Send(err.to_string())),
                };
            }
            Some(Ok(())) => {}
        }

        tick += 1;

        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(%session_id, tick, "producer: cancelled during wait");
                return ProducerReport {
                    sent: tick,
                    exit: ProducerExit::Cancelled,
                };
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}

/// Start the producer on its own task.
///
/// The task owns `sink` while it runs and hands it back through the
/// returned [`ProducerHandle`] so the supervisor can close the connection.
#[must_use]
pub fn spawn_producer<S>(
    session_id: SessionId,
    mut sink: S,
    config: ProducerConfig,
    cancel: CancellationToken,
) -> ProducerHandle<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
{
    let task_cancel = cancel.clone();
    let join = tokio::spawn(
        async move {
            let report = run_producer(session_id, &mut sink, &config, &task_cancel).await;
            (sink, report)
        }
        .instrument(info_span!("producer", %session_id)),
    );

    ProducerHandle {
        session_id,
        cancel,
        join: Some(join),
    }
}

/// Handle returned from [`spawn_producer`].
///
/// Dropping the handle cancels the task.
pub struct ProducerHandle<S> {
    session_id: SessionId,
    cancel: CancellationToken,
    join: Option<JoinHandle<(S, ProducerReport)>>,
}

impl<S> Drop for ProducerHandle<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<S> ProducerHandle<S> {
    /// Signal the producer to stop. Idempotent and non-blocking.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the producer task has already returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel the producer and wait up to `grace` for it to return.
    ///
    /// Returns the sink and the run report when the task finished in time.
    /// If it did not, the task is aborted and `None` is returned.
    pub async fn finish(mut self, grace: Duration) -> Option<(S, ProducerReport)> {
        self.cancel.cancel();
        let mut join = self.join.take()?;

        match tokio::time::timeout(grace, &mut join).await {
            Ok(Ok(output)) => Some(output),
            Ok(Err(err)) => {
                error!(session_id = %self.session_id, error = %err, "producer task failed to join");
                None
            }
            Err(_) => {
                warn!(
                    session_id = %self.session_id,
                    grace_ms = grace.as_millis(),
                    "producer did not stop within grace period, aborting"
                );
                join.abort();
                None
            }
        }
    }
}
