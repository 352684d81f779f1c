#![forbid(unsafe_code)]

//! `wavecast-probe` — command-line client for a `wavecast` server.
//!
//! Connects over WebSocket, optionally sends one text message, then reads
//! and decodes a fixed number of records and prints them.

use std::process::ExitCode;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use wavecast::record::{OutboundRecord, AMPLITUDE};
use wavecast::AppError;

#[derive(Debug, Parser)]
#[command(
    name = "wavecast-probe",
    about = "Read and decode records from a wavecast server",
    version,
    long_about = None
)]
struct Cli {
    /// Server URL.
    #[arg(long, default_value = "ws://127.0.0.1:9999")]
    url: String,

    /// Number of records to read before disconnecting.
    #[arg(long, default_value_t = 10)]
    count: u64,

    /// Text message to send right after connecting.
    #[arg(long)]
    say: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();

    match probe(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn probe(args: &Cli) -> Result<(), AppError> {
    let (mut ws, _response) = tokio_tungstenite::connect_async(args.url.as_str())
        .await
        .map_err(|err| AppError::Io(format!("cannot connect to {}: {err}", args.url)))?;

    if let Some(ref text) = args.say {
        ws.send(Message::text(text.as_str()))
            .await
            .map_err(|err| AppError::Send(err.to_string()))?;
    }

    let mut seen: u64 = 0;
    while seen < args.count {
        let Some(message) = ws.next().await else {
            return Err(AppError::TransportClosed("server closed the stream".into()));
        };

        match message? {
            Message::Binary(data) => {
                let record = OutboundRecord::decode(&data)?;
                let v1 = record.v1_signed();
                let v2 = record.v2_signed();
                println!(
                    "#{seen:<5} v1={v1:>6} v2={v2:>6}  sin~{:+.3} cos~{:+.3}",
                    f64::from(v1) / AMPLITUDE,
                    f64::from(v2) / AMPLITUDE,
                );
                seen += 1;
            }
            Message::Close(_) => {
                return Err(AppError::TransportClosed("server sent close frame".into()));
            }
            Message::Text(text) => {
                return Err(AppError::Protocol(format!(
                    "unexpected text message: {}",
                    text.as_str()
                )));
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }

    ws.close(None)
        .await
        .map_err(|err| AppError::Send(err.to_string()))?;
    Ok(())
}
