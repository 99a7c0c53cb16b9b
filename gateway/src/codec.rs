//! Pure translation between [`GatewayMessage`] and the gateway's wire JSON
//! envelope `{op, d, s, t}`. Nothing in this module touches I/O; the frame
//! adapter (`frame.rs`) is what binds this to a transport.

use serde::de::Error as _;
use serde_json::{json, Map, Value};

use relay_model::{DispatchEvent, GatewayMessage, Opcode, ReadyData};

use crate::constants::MAX_OUTBOUND_FRAME_BYTES;
use crate::errors::{DecodeError, Error};

/// Serialises a [`GatewayMessage`] to its wire JSON text form.
///
/// Fails with [`Error::EncodingTooLarge`] if the encoded UTF-8 byte length
/// would be >= 4096, and with [`Error::InvalidPayload`] if a `StatusUpdate`
/// carries an activity that fails its can-send precondition.
pub fn encode(msg: &GatewayMessage) -> Result<String, Error> {
    if let GatewayMessage::StatusUpdate(presence) = msg {
        if !presence.can_send() {
            return Err(Error::InvalidPayload);
        }
    }

    let envelope = match msg {
        GatewayMessage::Heartbeat { seq } => envelope(Opcode::Heartbeat, json!(seq)),
        GatewayMessage::Identify(data) => envelope(Opcode::Identify, json!(data)),
        GatewayMessage::Resume(data) => envelope(Opcode::Resume, json!(data)),
        GatewayMessage::StatusUpdate(presence) => envelope(Opcode::StatusUpdate, json!(presence)),
        GatewayMessage::VoiceStateUpdate(data) => envelope(Opcode::VoiceStateUpdate, json!(data)),
        GatewayMessage::RequestGuildMembers(data) => {
            envelope(Opcode::RequestGuildMembers, json!(data))
        }
        // The remaining variants are receive-only; encoding one is a caller bug,
        // not a runtime condition, so we don't special-case them further here.
        other => envelope(other.opcode(), Value::Null),
    };

    let text = serde_json::to_string(&envelope).map_err(DecodeError::BadJson)?;
    if text.len() >= MAX_OUTBOUND_FRAME_BYTES {
        return Err(Error::EncodingTooLarge);
    }
    Ok(text)
}

fn envelope(op: Opcode, data: Value) -> Value {
    json!({ "op": op, "d": data })
}

/// Parses a decoded text frame into a [`GatewayMessage`].
///
/// Unknown opcodes yield [`DecodeError::UnknownOp`]. A `Dispatch` envelope
/// missing a well-formed `s` yields [`DecodeError::BadDispatch`] — `seq` is
/// mandatory, so there's no safe fallback that wouldn't regress
/// `resume.seq`. A structurally invalid `READY` *body* never fails decoding:
/// it comes out as `Ready(None)`, and it's the session state machine's job
/// to log that and demote resumability.
pub fn decode(text: &str) -> Result<GatewayMessage, DecodeError> {
    let mut envelope: Map<String, Value> =
        serde_json::from_str(text).map_err(DecodeError::BadJson)?;

    let op = envelope
        .remove("op")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DecodeError::BadJson(serde::de::Error::custom("missing op")))?;

    let data = envelope.remove("d").unwrap_or(Value::Null);
    let seq_field = envelope.remove("s");
    let event_name = envelope.remove("t").and_then(|v| v.as_str().map(str::to_string));

    match op {
        0 => {
            let seq = match seq_field {
                Some(Value::Null) | None => return Err(DecodeError::BadDispatch),
                Some(v) => v.as_u64().ok_or(DecodeError::BadDispatch)?,
            };
            decode_dispatch(seq, event_name.as_deref(), data)
        }
        1 => Ok(GatewayMessage::Heartbeat { seq: data.as_u64() }),
        7 => Ok(GatewayMessage::Reconnect),
        9 => Ok(GatewayMessage::InvalidSession {
            resumable: data.as_bool().unwrap_or(false),
        }),
        10 => {
            let interval = data
                .get("heartbeat_interval")
                .and_then(Value::as_u64)
                .ok_or_else(|| DecodeError::BadJson(serde::de::Error::custom("missing heartbeat_interval")))?;
            Ok(GatewayMessage::Hello { heartbeat_interval_ms: interval as u32 })
        }
        11 => Ok(GatewayMessage::HeartbeatAck),
        other => Err(DecodeError::UnknownOp(other as u8)),
    }
}

fn decode_dispatch(seq: u64, event_name: Option<&str>, data: Value) -> Result<GatewayMessage, DecodeError> {
    let event = match event_name {
        Some("READY") => DispatchEvent::Ready(serde_json::from_value::<ReadyData>(data).ok()),
        Some("RESUMED") => DispatchEvent::Resumed,
        _ => DispatchEvent::Other(data),
    };
    Ok(GatewayMessage::Dispatch { seq, event })
}
