//! Integration tests for the session state machine, driven through
//! [`relay_gateway::spawn`] with an in-memory stand-in for the transport.
//! Scenarios S1-S8 mirror the trace-based properties the core promises.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::mpsc as fmpsc;
use futures::{Sink, SinkExt, StreamExt};
use relay_gateway::{decode, spawn, GatewaySettings, ResumeData};
use relay_model::{DispatchEvent, GatewayMessage};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

/// A `Sink<WsMessage>` backed by an unbounded channel, standing in for the
/// websocket transport's write half. Errors are mapped to `AlreadyClosed`
/// since the tests never need a specific transport failure.
struct RecordingTransport(fmpsc::UnboundedSender<WsMessage>);

impl Sink<WsMessage> for RecordingTransport {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Pin::new(&mut self.get_mut().0).poll_ready(cx).map_err(|_| WsError::AlreadyClosed)
    }

    fn start_send(self: Pin<&mut Self>, item: WsMessage) -> Result<(), WsError> {
        Pin::new(&mut self.get_mut().0).start_send(item).map_err(|_| WsError::AlreadyClosed)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Pin::new(&mut self.get_mut().0).poll_flush(cx).map_err(|_| WsError::AlreadyClosed)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Pin::new(&mut self.get_mut().0).poll_close(cx).map_err(|_| WsError::AlreadyClosed)
    }
}

/// Drains every `WsMessage::Text` queued on `rx` so far, decoded back into
/// [`GatewayMessage`]s in the order they were sent.
fn drain_outbound(rx: &mut fmpsc::UnboundedReceiver<WsMessage>) -> Vec<GatewayMessage> {
    let mut out = Vec::new();
    while let Ok(Some(WsMessage::Text(text))) = rx.try_next() {
        out.push(decode(&text).expect("outbound frame should always decode"));
    }
    out
}

fn hello(ms: u32) -> Result<GatewayMessage, relay_gateway::Error> {
    Ok(GatewayMessage::Hello { heartbeat_interval_ms: ms })
}

fn dispatch(seq: u64, event: DispatchEvent) -> Result<GatewayMessage, relay_gateway::Error> {
    Ok(GatewayMessage::Dispatch { seq, event })
}

fn settings() -> GatewaySettings {
    GatewaySettings::new("test-token", (0, 1))
}

fn harness() -> (RecordingTransport, fmpsc::UnboundedReceiver<WsMessage>) {
    let (tx, rx) = fmpsc::unbounded();
    (RecordingTransport(tx), rx)
}

/// The outbound merge task runs independently of the state machine task;
/// give it a handful of scheduling turns to drain its channel before reading
/// what reached the transport.
async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn s1_fresh_identify() {
    let inbound = futures::stream::iter(vec![hello(100)]);
    let (transport, mut transport_rx) = harness();
    let dispatch_sink = futures::sink::drain();

    let session = spawn(inbound, transport, dispatch_sink, settings(), None);
    let outcome = session.outcome.await.expect("session should end cleanly");
    assert!(outcome.resume.is_none());

    settle().await;
    let sent = drain_outbound(&mut transport_rx);
    assert!(matches!(sent.as_slice(), [GatewayMessage::Identify(_), GatewayMessage::Heartbeat { seq: None }]));
}

#[tokio::test]
async fn s2_resume_on_reconnect() {
    let resume = ResumeData { token: "test-token".into(), session_id: "sid".into(), seq: 42 };
    let inbound = futures::stream::iter(vec![hello(100)]);
    let (transport, mut transport_rx) = harness();
    let dispatch_sink = futures::sink::drain();

    let session = spawn(inbound, transport, dispatch_sink, settings(), Some(resume));
    session.outcome.await.expect("session should end cleanly");

    settle().await;
    let sent = drain_outbound(&mut transport_rx);
    match sent.as_slice() {
        [GatewayMessage::Resume(resume), GatewayMessage::Heartbeat { seq: Some(42) }] => {
            assert_eq!(resume.session_id, "sid");
            assert_eq!(resume.seq, 42);
        }
        other => panic!("unexpected outbound trace: {other:?}"),
    }
}

#[tokio::test]
async fn s3_seq_tracking() {
    let inbound = futures::stream::iter(vec![
        hello(100),
        dispatch(1, DispatchEvent::Ready(Some(relay_model::ReadyData { session_id: "A".into() }))),
        dispatch(2, DispatchEvent::Other(serde_json::json!({"x": 1}))),
        dispatch(3, DispatchEvent::Other(serde_json::json!({"y": 1}))),
    ]);
    let (transport, _rx) = harness();
    let dispatch_sink = futures::sink::drain();

    let session = spawn(inbound, transport, dispatch_sink, settings(), None);
    assert!(session.successful_start.await.is_ok());
    let outcome = session.outcome.await.expect("session should end cleanly");

    let resume = outcome.resume.expect("resume should be populated after Ready");
    assert_eq!(resume.session_id, "A");
    assert_eq!(resume.seq, 3);
}

#[tokio::test]
async fn s3b_dispatch_with_bad_seq_fails_instead_of_regressing() {
    // A Dispatch frame with no usable `s` never becomes a `GatewayMessage` at
    // all: it fails at `decode`, well before `session::react` could see a
    // `seq: 0` and regress an already-populated `resume.seq`.
    let bad_seq_frame = decode(r#"{"op":0,"t":"MESSAGE_CREATE","d":{}}"#)
        .map_err(relay_gateway::Error::from);
    assert!(bad_seq_frame.is_err());

    let inbound = futures::stream::iter(vec![
        hello(100),
        dispatch(1, DispatchEvent::Ready(Some(relay_model::ReadyData { session_id: "A".into() }))),
        dispatch(5, DispatchEvent::Other(serde_json::json!({"y": 1}))),
        bad_seq_frame,
    ]);
    let (transport, _rx) = harness();
    let dispatch_sink = futures::sink::drain();

    let session = spawn(inbound, transport, dispatch_sink, settings(), None);
    let err = session.outcome.await.expect_err("a bad dispatch envelope must fail the session");
    assert!(matches!(*err, relay_gateway::Error::Decode(relay_gateway::DecodeError::BadDispatch)));
}

#[tokio::test]
async fn s4_invalid_session_unresumable_waits() {
    let inbound = futures::stream::iter(vec![hello(100), Ok(GatewayMessage::InvalidSession { resumable: false })]);
    let (transport, _rx) = harness();
    let dispatch_sink = futures::sink::drain();

    let session = spawn(inbound, transport, dispatch_sink, settings(), None);
    let outcome = session.outcome.await.expect("session should end cleanly");

    assert!(outcome.resume.is_none());
    assert!(outcome.wait);
}

#[tokio::test]
async fn s5_reconnect_resumable_no_wait() {
    let inbound = futures::stream::iter(vec![
        hello(100),
        dispatch(1, DispatchEvent::Ready(Some(relay_model::ReadyData { session_id: "B".into() }))),
        Ok(GatewayMessage::Reconnect),
    ]);
    let (transport, _rx) = harness();
    let dispatch_sink = futures::sink::drain();

    let session = spawn(inbound, transport, dispatch_sink, settings(), None);
    let outcome = session.outcome.await.expect("session should end cleanly");

    let resume = outcome.resume.expect("resume should survive a graceful reconnect");
    assert_eq!(resume.session_id, "B");
    assert_eq!(resume.seq, 1);
    assert!(!outcome.wait);
}

#[tokio::test(start_paused = true)]
async fn s6_missed_ack_is_a_liveness_timeout() {
    let inbound = futures::stream::iter(vec![hello(50)]).chain(futures::stream::pending());
    let (transport, _rx) = harness();
    let dispatch_sink = futures::sink::drain();

    let session = spawn(inbound, transport, dispatch_sink, settings(), None);

    tokio::time::advance(Duration::from_millis(120)).await;

    let outcome_err = session.outcome.await.expect_err("a missed ack should fail the session");
    assert!(matches!(*outcome_err, relay_gateway::Error::LivenessTimeout));

    let start_err = session.successful_start.await.expect_err("ready never arrived");
    assert!(matches!(*start_err, relay_gateway::Error::LivenessTimeout));
}

#[tokio::test]
async fn s7_bad_ready_payload_degrades_instead_of_failing() {
    let inbound = futures::stream::iter(vec![hello(100), dispatch(1, DispatchEvent::Ready(None))]);
    let (transport, _rx) = harness();
    let dispatch_sink = futures::sink::drain();

    let session = spawn(inbound, transport, dispatch_sink, settings(), None);
    assert!(session.successful_start.await.is_ok());
    let outcome = session.outcome.await.expect("a degraded Ready must not fail the session");

    assert!(outcome.resume.is_none());
}

#[tokio::test]
async fn s8_pre_hello_dispatch_is_a_protocol_violation() {
    let inbound =
        futures::stream::iter(vec![dispatch(1, DispatchEvent::Other(serde_json::json!({"x": 1})))]);
    let (transport, _rx) = harness();
    let dispatch_sink = futures::sink::drain();

    let session = spawn(inbound, transport, dispatch_sink, settings(), None);
    let err = session.outcome.await.expect_err("a pre-Hello dispatch must fail the session");
    assert!(matches!(*err, relay_gateway::Error::ProtocolViolation));
}

#[tokio::test]
async fn dispatch_sees_every_inbound_message_in_order() {
    let inbound = futures::stream::iter(vec![
        hello(100),
        dispatch(1, DispatchEvent::Ready(Some(relay_model::ReadyData { session_id: "A".into() }))),
        Ok(GatewayMessage::Reconnect),
    ]);
    let (transport, _rx) = harness();
    let (dispatch_tx, dispatch_rx) = fmpsc::unbounded();

    let session = spawn(inbound, transport, dispatch_tx, settings(), None);
    session.outcome.await.expect("session should end cleanly");

    let forwarded: Vec<_> = dispatch_rx.collect().await;
    assert_eq!(forwarded.len(), 3);
    assert!(matches!(forwarded[0], GatewayMessage::Hello { .. }));
    assert!(matches!(forwarded[1], GatewayMessage::Dispatch { seq: 1, .. }));
    assert!(matches!(forwarded[2], GatewayMessage::Reconnect));
}
