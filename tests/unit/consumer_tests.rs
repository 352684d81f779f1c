//! Unit tests for the consumer loop's termination rules.

use std::io;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio_tungstenite::tungstenite::error::CapacityError;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use wavecast::session::consumer::{run_consumer, ConsumerExit};
use wavecast::session::SessionId;
use wavecast::AppError;

type Item = Result<Message, tungstenite::Error>;

#[tokio::test]
async fn logs_messages_until_stream_ends() {
    let mut inbound = stream::iter(vec![
        Ok(Message::text("hello")),
        Ok(Message::binary(vec![0x01, 0x02, 0x03])),
        Ok(Message::Ping(vec![9].into())),
        Ok(Message::text("bye")),
    ]);

    let report = run_consumer(SessionId::new(), &mut inbound, &CancellationToken::new()).await;

    assert_eq!(report.received, 3, "ping frames are not counted");
    assert!(
        matches!(report.exit, ConsumerExit::Closed(ref reason) if reason == "stream ended"),
        "got {:?}",
        report.exit
    );
}

#[tokio::test]
async fn close_frame_ends_loop() {
    let mut inbound = stream::iter(vec![
        Ok(Message::text("one")),
        Ok(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "done".into(),
        }))),
        Ok(Message::text("never read")),
    ]);

    let report = run_consumer(SessionId::new(), &mut inbound, &CancellationToken::new()).await;

    assert_eq!(report.received, 1);
    assert!(
        matches!(report.exit, ConsumerExit::Closed(ref reason) if reason == "close code 1000: done"),
        "got {:?}",
        report.exit
    );
    assert!(inbound.next().await.is_some(), "message after close stays unread");
}

#[tokio::test]
async fn close_without_status_ends_loop() {
    let mut inbound = stream::iter(vec![Ok::<_, tungstenite::Error>(Message::Close(None))]);

    let report = run_consumer(SessionId::new(), &mut inbound, &CancellationToken::new()).await;

    assert!(matches!(report.exit, ConsumerExit::Closed(_)));
}

#[tokio::test]
async fn connection_reset_is_routine_close() {
    let mut inbound = stream::iter(vec![
        Ok(Message::text("hi")),
        Err(tungstenite::Error::Io(io::Error::from(
            io::ErrorKind::ConnectionReset,
        ))),
    ]);

    let report = run_consumer(SessionId::new(), &mut inbound, &CancellationToken::new()).await;

    assert_eq!(report.received, 1);
    assert!(matches!(report.exit, ConsumerExit::Closed(_)), "got {:?}", report.exit);
}

#[tokio::test]
async fn unexpected_transport_error_is_reported_as_failure() {
    let mut inbound = stream::iter(vec![Err::<Message, _>(tungstenite::Error::Capacity(
        CapacityError::TooManyHeaders,
    ))]);

    let report = run_consumer(SessionId::new(), &mut inbound, &CancellationToken::new()).await;

    assert!(
        matches!(report.exit, ConsumerExit::Failed(AppError::Transport(_))),
        "got {:?}",
        report.exit
    );
}

#[tokio::test]
async fn cancellation_interrupts_blocked_receive() {
    let mut inbound = stream::iter(vec![Ok(Message::text("only"))]).chain(stream::pending::<Item>());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(1),
        run_consumer(SessionId::new(), &mut inbound, &cancel),
    )
    .await
    .expect("consumer observes cancellation");

    assert_eq!(report.received, 1);
    assert!(matches!(report.exit, ConsumerExit::Cancelled));
}
