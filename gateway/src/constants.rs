/// The default Discord gateway endpoint, used when a session is not given an
/// explicit resume URL.
pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// The gateway version this crate speaks.
pub const GATEWAY_VERSION: u8 = 10;

/// Discord closes the connection if an outbound frame exceeds this many bytes.
/// The codec enforces it locally so a misbehaving send fails fast and
/// diagnosably instead of as a silent disconnect.
pub const MAX_OUTBOUND_FRAME_BYTES: usize = 4096;
