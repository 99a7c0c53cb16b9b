//! Structures related to a client's presence on the gateway.
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// The maximum length, in UTF-8 characters, of an activity's name.
const MAX_ACTIVITY_NAME_LEN: usize = 128;

/// The presence a session identifies with, or later pushes via `StatusUpdate`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientPresence {
    /// Milliseconds since the client went idle, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    /// The client's current activity, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ClientActivity>,
    /// The client's status.
    pub status: Status,
    /// Whether the client is AFK.
    #[serde(default)]
    pub afk: bool,
}

impl Default for ClientPresence {
    fn default() -> Self {
        Self {
            since: None,
            activity: None,
            status: Status::Online,
            afk: false,
        }
    }
}

impl ClientPresence {
    /// Whether this presence is safe to send: an embedded activity, if any,
    /// must have a non-empty name within Discord's documented length limit.
    pub fn can_send(&self) -> bool {
        match &self.activity {
            Some(activity) => activity.can_send(),
            None => true,
        }
    }
}

/// A simplified activity payload for `Identify`/`StatusUpdate`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientActivity {
    /// The activity's name.
    pub name: String,
    /// The type of activity.
    #[serde(rename = "type")]
    pub kind: ActivityType,
    /// The stream URL, only meaningful when `kind` is `Streaming`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ClientActivity {
    fn can_send(&self) -> bool {
        !self.name.is_empty() && self.name.chars().count() <= MAX_ACTIVITY_NAME_LEN
    }
}

/// A list of possible activity types.
#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActivityType {
    Game = 0,
    Streaming = 1,
    Listening = 2,
    Watching = 3,
    Competing = 5,
}

/// A list of possible statuses.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Online,
    Dnd,
    Idle,
    Invisible,
    Offline,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Status::Online => write!(f, "online"),
            Status::Dnd => write!(f, "dnd"),
            Status::Idle => write!(f, "idle"),
            Status::Invisible => write!(f, "invisible"),
            Status::Offline => write!(f, "offline"),
        }
    }
}
