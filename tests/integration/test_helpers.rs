//! Shared helpers for integration tests.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use wavecast::record::OutboundRecord;
use wavecast::{server, GlobalConfig};

/// Client side of one session.
pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A server bound to an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub ct: CancellationToken,
    pub handle: JoinHandle<wavecast::Result<()>>,
}

/// Configuration listening on `127.0.0.1:0` with the given tick interval.
pub fn test_config(tick_interval_ms: u64) -> GlobalConfig {
    let mut config = GlobalConfig::default();
    config.bind_address = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config.port = 0;
    config.producer.tick_interval_ms = tick_interval_ms;
    config
}

/// Bind and serve `config` on a background task.
pub async fn start_server(config: GlobalConfig) -> TestServer {
    let listener = server::bind(&config).await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let ct = CancellationToken::new();
    let handle = tokio::spawn(server::serve(listener, Arc::new(config), ct.clone()));
    TestServer { addr, ct, handle }
}

/// Open a WebSocket client session against `addr`.
pub async fn connect(addr: SocketAddr) -> Client {
    let (ws, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("websocket connect");
    ws
}

/// Read the next record, skipping control frames.
pub async fn next_record(client: &mut Client) -> OutboundRecord {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("record within timeout")
            .expect("stream open")
            .expect("receive ok");
        match message {
            Message::Binary(data) => {
                assert_eq!(data.len(), 9, "record must be 9 bytes");
                return OutboundRecord::decode(&data).expect("valid record");
            }
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("unexpected message {other:?}"),
        }
    }
}
