use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    io::Error as IoError,
    result::Result as StdResult,
};

use serde_json::Error as JsonError;
use tokio_tungstenite::tungstenite::Error as TungsteniteError;

/// A modified result type which encompasses the crate-wide error type.
pub type Result<T> = StdResult<T, Error>;

/// Why a frame or dispatch payload failed to decode.
#[derive(Debug)]
pub enum DecodeError {
    /// The frame was not valid JSON.
    BadJson(JsonError),
    /// The opcode was not one this crate understands.
    UnknownOp(u8),
    /// A `Dispatch` envelope (`op: 0`) was missing a well-formed `s` field.
    /// `seq` is mandatory, so there's no safe value to substitute.
    BadDispatch,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            DecodeError::BadJson(e) => write!(f, "malformed gateway payload: {e}"),
            DecodeError::UnknownOp(op) => write!(f, "unknown gateway opcode: {op}"),
            DecodeError::BadDispatch => write!(f, "dispatch envelope missing a well-formed sequence number"),
        }
    }
}

impl StdError for DecodeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DecodeError::BadJson(e) => Some(e),
            DecodeError::UnknownOp(_) | DecodeError::BadDispatch => None,
        }
    }
}

/// The crate-wide error type. Every fatal termination path of a [`crate::session::Session`]
/// ends up producing one of these, either as the outcome or as the successful-start failure.
#[derive(Debug)]
pub enum Error {
    /// A frame failed to decode, and it wasn't the locally-recoverable
    /// bad-Ready case.
    Decode(DecodeError),
    /// An outbound payload serialised to 4096 bytes or more.
    EncodingTooLarge,
    /// An outbound payload failed a precondition (e.g. an invalid activity
    /// embedded in a `StatusUpdate`).
    InvalidPayload,
    /// No `HeartbeatAck` arrived between two heartbeat ticks.
    LivenessTimeout,
    /// The transport stream ended without an orderly close.
    AbruptTermination,
    /// A `Dispatch` arrived before `Hello` was ever processed.
    ProtocolViolation,
    /// Propagated from the websocket transport.
    Transport(TungsteniteError),
    /// Propagated from the zlib inflate step in the frame adapter.
    Io(IoError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::Decode(e) => write!(f, "{e}"),
            Error::EncodingTooLarge => write!(f, "outbound payload exceeds the 4096-byte frame cap"),
            Error::InvalidPayload => write!(f, "outbound payload failed a precondition"),
            Error::LivenessTimeout => write!(f, "no heartbeat ack received since the last heartbeat"),
            Error::AbruptTermination => write!(f, "transport ended without an orderly close"),
            Error::ProtocolViolation => write!(f, "dispatch received before hello was processed"),
            Error::Transport(e) => write!(f, "transport error: {e}"),
            Error::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl From<TungsteniteError> for Error {
    fn from(err: TungsteniteError) -> Self {
        Error::Transport(err)
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        Error::Io(err)
    }
}
