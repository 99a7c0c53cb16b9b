//! Wire types shared between the gateway session state machine and its
//! transport. This crate is deliberately thin: it knows how to serialise and
//! deserialise the handful of opcodes the core cares about, and otherwise
//! treats dispatch payloads as opaque JSON.

pub mod gateway;
pub mod intents;
pub mod presence;

pub use gateway::{
    DispatchEvent, GatewayMessage, IdentifyPacket, IdentifyProperties, Opcode, ReadyData,
    ResumeSessionPacket,
};
pub use intents::Intents;
pub use presence::{ActivityType, ClientActivity, ClientPresence, Status};
