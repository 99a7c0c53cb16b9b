use relay_model::{ClientPresence, IdentifyPacket, IdentifyProperties, Intents};

/// Read-only configuration a [`crate::session::Session`] is constructed with.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// The bot token this session authenticates with.
    pub token: String,
    /// `(shard_id, shard_count)`.
    pub shard: (u64, u64),
    /// The total number of members at which the gateway stops sending
    /// offline members in the guild member list.
    pub large_threshold: u32,
    /// The presence to identify with.
    pub presence: Option<ClientPresence>,
    /// Legacy guild-subscriptions toggle, threaded into `IdentifyPacket` at
    /// `Hello` time. Superseded by intents but still honoured by the gateway.
    pub guild_subscriptions: bool,
    /// The intents to identify with.
    pub intents: Intents,
    /// Log every raw inbound websocket frame at debug level before decoding.
    pub log_received_ws: bool,
    /// Log every raw outbound websocket frame at debug level before sending.
    pub log_sent_ws: bool,
}

impl GatewaySettings {
    pub fn new(token: impl Into<String>, shard: (u64, u64)) -> Self {
        Self {
            token: token.into(),
            shard,
            large_threshold: 50,
            presence: None,
            guild_subscriptions: true,
            intents: Intents::default(),
            log_received_ws: false,
            log_sent_ws: false,
        }
    }
}

/// A previously-established session's resumption token, kept around so a
/// reconnect can replay events since the last observed `seq` instead of a
/// full re-identify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeData {
    pub token: String,
    pub session_id: String,
    pub seq: u64,
}

/// Builds the `Identify` payload from settings. Called once, at `Hello` time,
/// when the session has no prior [`ResumeData`] to resume instead.
pub fn build_identify(settings: &GatewaySettings) -> IdentifyPacket {
    IdentifyPacket {
        token: settings.token.clone(),
        properties: IdentifyProperties {
            os: std::env::consts::OS.to_string(),
            browser: "relay".to_string(),
            device: "relay".to_string(),
        },
        compress: false,
        large_threshold: settings.large_threshold,
        shard: [settings.shard.0, settings.shard.1],
        presence: settings.presence.clone(),
        guild_subscriptions: settings.guild_subscriptions,
        intents: settings.intents,
    }
}
