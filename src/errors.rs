//! Error types shared across the application.

use std::fmt::{Display, Formatter};

use tokio_tungstenite::tungstenite;

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// File-system or socket operation failure outside a session.
    Io(String),
    /// Remote end closed or reset the connection.
    TransportClosed(String),
    /// Receive-side transport failure that is not an ordinary disconnect.
    Transport(String),
    /// Outbound send failed.
    Send(String),
    /// Bytes on the wire do not form a valid record.
    Protocol(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::TransportClosed(msg) => write!(f, "transport closed: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Send(msg) => write!(f, "send: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Whether this error is a routine disconnect rather than a fault.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::TransportClosed(_))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<tungstenite::Error> for AppError {
    /// Classify a receive-side WebSocket error.
    ///
    /// Closes, resets and aborted sockets map to [`AppError::TransportClosed`];
    /// everything else (protocol violations, capacity, UTF-8) maps to
    /// [`AppError::Transport`].
    fn from(err: tungstenite::Error) -> Self {
        use std::io::ErrorKind;
        use tungstenite::error::ProtocolError;

        let routine = match &err {
            tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
            tungstenite::Error::Io(io) => matches!(
                io.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            ),
            _ => false,
        };

        if routine {
            Self::TransportClosed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
