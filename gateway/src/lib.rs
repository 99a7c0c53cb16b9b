pub use codec::{decode, encode};
pub use completion::{Outcome, SessionOutcome, SuccessfulStart};
pub use errors::{DecodeError, Error, Result};
pub use frame::FrameAdapter;
pub use session::{spawn, Session};
pub use session_state::SessionState;
pub use settings::{build_identify, GatewaySettings, ResumeData};

mod codec;
mod completion;
mod constants;
mod errors;
mod frame;
mod heartbeat;
mod outbound;
mod session;
mod session_state;
mod settings;

pub use constants::{GATEWAY_URL, GATEWAY_VERSION, MAX_OUTBOUND_FRAME_BYTES};
