#![forbid(unsafe_code)]

//! `wavecast` — WebSocket server that streams a 9-byte sine/cosine record
//! to every client every tick while logging whatever the client sends back.

pub mod config;
pub mod errors;
pub mod record;
pub mod server;
pub mod session;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
