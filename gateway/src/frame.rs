//! Binds raw transport messages to the payload codec: inflates binary
//! frames, decodes text frames, and produces a lazy sequence of decoded
//! gateway messages. Preserves frame order; a frame is fully resolved before
//! the next is polled.

use std::io::Read;
use std::pin::Pin;
use std::task::{Context, Poll};

use flate2::read::ZlibDecoder;
use futures::Stream;
use relay_model::GatewayMessage;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

use crate::codec;
use crate::errors::Error;

/// Wraps an inbound transport message stream and yields decoded gateway
/// messages in arrival order. A `Close` frame ends the stream gracefully
/// (yields `None`), matching the session state machine's "graceful upstream
/// end" termination path. A transport-level error or decode failure is
/// surfaced as `Some(Err(..))`, matching "upstream failure".
pub struct FrameAdapter<S> {
    inner: S,
    log_received_ws: bool,
}

impl<S> FrameAdapter<S>
where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    pub fn new(inner: S, log_received_ws: bool) -> Self {
        Self { inner, log_received_ws }
    }

    fn resolve(&self, message: WsMessage) -> Option<Result<GatewayMessage, Error>> {
        let text = match message {
            WsMessage::Text(text) => text,
            WsMessage::Binary(bytes) => {
                let mut decompressed = String::new();
                if let Err(err) = ZlibDecoder::new(&bytes[..]).read_to_string(&mut decompressed) {
                    return Some(Err(Error::Io(err)));
                }
                decompressed
            }
            WsMessage::Close(_) => return None,
            // Ping/Pong/raw Frame are handled by the transport layer itself
            // and never need to surface here.
            _ => return None,
        };

        if self.log_received_ws {
            log::debug!("<< {text}");
        }

        Some(codec::decode(&text).map_err(Error::from))
    }
}

impl<S> Stream for FrameAdapter<S>
where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    type Item = Result<GatewayMessage, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            return match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(message))) => match this.resolve(message) {
                    Some(item) => Poll::Ready(Some(item)),
                    // A Close/Ping/Pong frame resolved to "nothing to yield
                    // yet" — poll the inner stream again.
                    None => continue,
                },
                Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(Error::from(err)))),
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            };
        }
    }
}
