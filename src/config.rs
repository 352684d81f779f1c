//! Global configuration parsing and validation.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Upper bound for the post-cancellation producer wait.
const MAX_PRODUCER_GRACE_MS: u64 = 10_000;

/// Producer cadence and phase settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ProducerConfig {
    /// Period between two records, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Phase increment applied after every record.
    #[serde(default = "default_phase_step")]
    pub phase_step: f64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            phase_step: default_phase_step(),
        }
    }
}

impl ProducerConfig {
    /// Tick period as a [`Duration`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Per-session teardown settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// How long the supervisor waits for a cancelled producer to hand back
    /// the send half before aborting it.
    #[serde(default = "default_producer_grace_ms")]
    pub producer_grace_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            producer_grace_ms: default_producer_grace_ms(),
        }
    }
}

impl SessionConfig {
    /// Producer grace period as a [`Duration`].
    #[must_use]
    pub fn producer_grace(&self) -> Duration {
        Duration::from_millis(self.producer_grace_ms)
    }
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    9999
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_phase_step() -> f64 {
    0.05
}

fn default_producer_grace_ms() -> u64 {
    100
}

/// Global configuration parsed from `config.toml`.
///
/// Every field has a default, so an empty document (or no file at all)
/// yields a server on `0.0.0.0:9999` ticking every 100 ms.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Interface the listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    /// TCP port the listener binds to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Producer cadence.
    #[serde(default)]
    pub producer: ProducerConfig,
    /// Session teardown behavior.
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            producer: ProducerConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Socket address the listener binds to.
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.producer.tick_interval_ms == 0 {
            return Err(AppError::Config(
                "producer.tick_interval_ms must be greater than zero".into(),
            ));
        }

        if !self.producer.phase_step.is_finite() {
            return Err(AppError::Config(
                "producer.phase_step must be a finite number".into(),
            ));
        }

        if self.session.producer_grace_ms > MAX_PRODUCER_GRACE_MS {
            return Err(AppError::Config(format!(
                "session.producer_grace_ms must not exceed {MAX_PRODUCER_GRACE_MS}"
            )));
        }

        Ok(())
    }
}
