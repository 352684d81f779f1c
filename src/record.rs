//! Outbound record model and its 9-byte wire encoding.
//!
//! | Offset | Size | Field | Encoding              |
//! |--------|------|-------|-----------------------|
//! | 0      | 1    | tag   | constant [`RECORD_TAG`] |
//! | 1      | 4    | v1    | `u32` little-endian   |
//! | 5      | 4    | v2    | `u32` little-endian   |
//!
//! `v1`/`v2` carry `floor(sin(x) * 1000)` and `floor(cos(x) * 1000)` reduced
//! modulo 2^32, so negative values arrive as their two's-complement bit
//! pattern and decode back with [`OutboundRecord::v1_signed`].

use bytes::Bytes;

use crate::{AppError, Result};

/// Tag byte leading every record.
pub const RECORD_TAG: u8 = 0x01;

/// Encoded record size in bytes.
pub const RECORD_LEN: usize = 9;

/// Scale applied to the sine/cosine before flooring.
pub const AMPLITUDE: f64 = 1000.0;

/// The producer's phase for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wavepoint {
    /// Zero-based tick index within the session.
    pub tick: u64,
    /// Phase `x` fed to sine and cosine.
    pub x: f64,
}

impl Wavepoint {
    /// Phase for tick `tick` given a per-tick `step`.
    ///
    /// Computed as `step * tick` rather than accumulated, so tick N always
    /// encodes exactly `0.05 * N` with the default step.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn at(tick: u64, step: f64) -> Self {
        Self {
            tick,
            x: step * tick as f64,
        }
    }

    /// Build the record for this phase.
    #[must_use]
    pub fn record(&self) -> OutboundRecord {
        OutboundRecord {
            v1: scaled_floor(self.x.sin()),
            v2: scaled_floor(self.x.cos()),
        }
    }
}

/// One tagged `(v1, v2)` pair as it travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundRecord {
    /// `floor(sin(x) * 1000) mod 2^32`.
    pub v1: u32,
    /// `floor(cos(x) * 1000) mod 2^32`.
    pub v2: u32,
}

impl OutboundRecord {
    /// Serialize into the fixed 9-byte layout.
    #[must_use]
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0] = RECORD_TAG;
        buf[1..5].copy_from_slice(&self.v1.to_le_bytes());
        buf[5..9].copy_from_slice(&self.v2.to_le_bytes());
        buf
    }

    /// Serialize into a [`Bytes`] buffer suitable for a binary message.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.encode())
    }

    /// Parse a record from exactly [`RECORD_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Protocol` on a length mismatch or unknown tag.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != RECORD_LEN {
            return Err(AppError::Protocol(format!(
                "record must be {RECORD_LEN} bytes, got {}",
                buf.len()
            )));
        }
        if buf[0] != RECORD_TAG {
            return Err(AppError::Protocol(format!(
                "unknown record tag {:#04x}",
                buf[0]
            )));
        }

        let v1 = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
        let v2 = u32::from_le_bytes([buf[5], buf[6], buf[7], buf[8]]);
        Ok(Self { v1, v2 })
    }

    /// `v1` reinterpreted as a signed value.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn v1_signed(&self) -> i32 {
        self.v1 as i32
    }

    /// `v2` reinterpreted as a signed value.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn v2_signed(&self) -> i32 {
        self.v2 as i32
    }
}

/// `floor(value * AMPLITUDE)` wrapped into `u32`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_floor(value: f64) -> u32 {
    // |value| <= 1, so the floored product always fits in i32.
    (value * AMPLITUDE).floor() as i32 as u32
}
