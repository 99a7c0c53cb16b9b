//! Structs representing the various elements of the Discord gateway.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::intents::Intents;
use crate::presence::ClientPresence;

/// A set of possible Discord gateway opcodes.
#[derive(Serialize_repr, Deserialize_repr, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Dispatches a gateway event.
    Dispatch = 0,
    /// Used for sending ping and heartbeats.
    Heartbeat = 1,
    /// Used for obtaining a client handshake.
    Identify = 2,
    /// Used to update the shard's presence.
    StatusUpdate = 3,
    /// Used to join and leave voice channels.
    VoiceStateUpdate = 4,
    /// Used to resume a closed connection.
    Resume = 6,
    /// Tells clients to reconnect to the gateway.
    Reconnect = 7,
    /// Used to request guild members.
    RequestGuildMembers = 8,
    /// Used to notify the client of an invalid session.
    InvalidSession = 9,
    /// Sent immediately after connecting, contains heartbeat information.
    Hello = 10,
    /// Sent immediately after receiving a heartbeat.
    HeartbeatAck = 11,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IdentifyProperties {
    /// The client's operating system.
    #[serde(rename = "$os")]
    pub os: String,
    /// The current name of the library.
    #[serde(rename = "$browser")]
    pub browser: String,
    /// The current name of the library.
    #[serde(rename = "$device")]
    pub device: String,
}

/// Used for identifying a session with the gateway.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IdentifyPacket {
    /// The token this session will use.
    pub token: String,
    /// The properties of the client.
    pub properties: IdentifyProperties,
    /// Whether or not to request compressed packets. The core never sets this;
    /// compression is negotiated out-of-band by the transport, if at all.
    pub compress: bool,
    /// The total number of members where the gateway will stop sending offline
    /// members in the guild member list.
    pub large_threshold: u32,
    /// Holds the sharding information for this session, `[shard_id, shard_count]`.
    pub shard: [u64; 2],
    /// The initial presence of this session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<ClientPresence>,
    /// Whether to receive guild subscription events (presence updates, typing
    /// events) without needing the `GUILD_PRESENCES`/`GUILD_MESSAGE_TYPING`
    /// intents. A legacy toggle, superseded by intents, but still honoured by
    /// the gateway.
    pub guild_subscriptions: bool,
    /// The intents this session is identifying with.
    pub intents: Intents,
}

/// A packet used to resume a gateway connection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResumeSessionPacket {
    /// The token of the client.
    pub token: String,
    /// The session ID to resume.
    pub session_id: String,
    /// The last sequence number observed before the disconnect.
    pub seq: u64,
}

/// A request to receive guild member chunks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RequestGuildMembers {
    pub guild_id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub limit: u32,
}

/// A request to join, move, or leave a voice channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VoiceStateUpdate {
    pub guild_id: String,
    pub channel_id: Option<String>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

/// The subset of the `READY` payload the core needs in order to track
/// resumability. Everything else `READY` carries (user, guilds, trace, ...) is
/// opaque to the session state machine and is not modelled here.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReadyData {
    pub session_id: String,
}

/// A dispatch event payload. Only `Ready` and `Resumed` affect core state; every
/// other event name is forwarded downstream untouched as raw JSON.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// `READY`. `None` when the payload failed to parse into [`ReadyData`] —
    /// the session degrades to unresumable rather than failing outright.
    Ready(Option<ReadyData>),
    /// `RESUMED`. Carries no data relevant to core state.
    Resumed,
    /// Any other event name, passed through opaque.
    Other(Value),
}

/// A decoded, typed gateway message. This is the vocabulary the session state
/// machine and heartbeat timer operate on; see `relay_gateway::codec` for the
/// translation to and from wire JSON.
#[derive(Debug, Clone)]
pub enum GatewayMessage {
    Hello { heartbeat_interval_ms: u32 },
    Identify(IdentifyPacket),
    Resume(ResumeSessionPacket),
    Heartbeat { seq: Option<u64> },
    HeartbeatAck,
    Dispatch { seq: u64, event: DispatchEvent },
    Reconnect,
    InvalidSession { resumable: bool },
    StatusUpdate(ClientPresence),
    VoiceStateUpdate(VoiceStateUpdate),
    RequestGuildMembers(RequestGuildMembers),
}

impl GatewayMessage {
    /// The opcode this message would be sent or was received under.
    pub fn opcode(&self) -> Opcode {
        match self {
            GatewayMessage::Hello { .. } => Opcode::Hello,
            GatewayMessage::Identify(_) => Opcode::Identify,
            GatewayMessage::Resume(_) => Opcode::Resume,
            GatewayMessage::Heartbeat { .. } => Opcode::Heartbeat,
            GatewayMessage::HeartbeatAck => Opcode::HeartbeatAck,
            GatewayMessage::Dispatch { .. } => Opcode::Dispatch,
            GatewayMessage::Reconnect => Opcode::Reconnect,
            GatewayMessage::InvalidSession { .. } => Opcode::InvalidSession,
            GatewayMessage::StatusUpdate(_) => Opcode::StatusUpdate,
            GatewayMessage::VoiceStateUpdate(_) => Opcode::VoiceStateUpdate,
            GatewayMessage::RequestGuildMembers(_) => Opcode::RequestGuildMembers,
        }
    }
}
