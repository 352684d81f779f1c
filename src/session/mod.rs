//! Per-connection session machinery.
//!
//! A session pairs one WebSocket connection with two concurrent units:
//!
//! - [`producer`]: a spawned task emitting one [`OutboundRecord`](crate::record::OutboundRecord)
//!   per tick on the send half until cancelled or a send fails.
//! - [`consumer`]: an inline loop on the accepting task that logs every
//!   inbound message until the receive half closes or errors.
//!
//! [`supervisor::run_session`] wires the two together and guarantees that
//! the producer is cancelled and the connection closed before it returns.

use std::fmt::{Display, Formatter};

use uuid::Uuid;

pub mod consumer;
pub mod producer;
pub mod supervisor;

/// Identifier attached to every log line of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Allocate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
