//! The fan-in merge between the state machine's internal control channel and
//! any externally-injected outbound messages (presence updates, voice state
//! changes, ...), feeding a single transport sink.

use futures::{Sink, SinkExt};
use relay_model::GatewayMessage;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

use crate::codec;
use crate::errors::Error;

/// Encodes typed gateway messages through the codec before handing the wire
/// text to a transport sink. Thin translation layer; holds no state of its
/// own beyond the instrumentation flag.
pub struct EncodingSink<S> {
    inner: S,
    log_sent_ws: bool,
}

impl<S> EncodingSink<S>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    pub fn new(inner: S, log_sent_ws: bool) -> Self {
        Self { inner, log_sent_ws }
    }

    /// Encodes and sends one message, awaiting until the transport accepts it.
    pub async fn send(&mut self, msg: &GatewayMessage) -> Result<(), Error> {
        let text = codec::encode(msg)?;
        if self.log_sent_ws {
            log::debug!(">> {text}");
        }
        self.inner.send(WsMessage::Text(text)).await.map_err(Error::from)
    }
}

/// Drains `control_rx` and `external_rx` into `sink` until either closes.
///
/// Control messages (heartbeats, identify, resume) always win a simultaneous
/// race against externally-submitted messages — `tokio::select!` is biased
/// with the control arm listed first. The loop ends as soon as either input
/// channel closes: once the state machine's control channel is gone the
/// session itself is over, and once the external submission channel is gone
/// there's nothing left worth prioritising against.
pub async fn drive_outbound<S>(
    mut sink: EncodingSink<S>,
    mut control_rx: mpsc::UnboundedReceiver<GatewayMessage>,
    mut external_rx: mpsc::UnboundedReceiver<GatewayMessage>,
) -> Result<(), Error>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    loop {
        let msg = tokio::select! {
            biased;
            msg = control_rx.recv() => match msg {
                Some(msg) => msg,
                None => return Ok(()),
            },
            msg = external_rx.recv() => match msg {
                Some(msg) => msg,
                None => return Ok(()),
            },
        };
        sink.send(&msg).await?;
    }
}
