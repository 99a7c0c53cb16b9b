use crate::settings::ResumeData;

/// The mutable record the session state machine owns. It is the sole source
/// of truth for whether a disconnect is resumable, and nothing outside
/// `session.rs` and `heartbeat.rs` mutates it.
#[derive(Debug)]
pub struct SessionState {
    /// The session's resume data, if a `Ready` has been observed yet.
    pub resume: Option<ResumeData>,
    /// Whether a heartbeat was sent since the last `HeartbeatAck` (or `Hello`).
    /// Initialised `true` so the very first heartbeat tick, which fires at
    /// zero delay, is permitted to send.
    pub awaiting_ack: bool,
}

impl SessionState {
    pub fn new(resume: Option<ResumeData>) -> Self {
        Self { resume, awaiting_ack: true }
    }

    /// Updates `resume.seq` to `seq` if a resume record exists. No-op
    /// otherwise — `seq` only matters once a session is resumable.
    pub fn advance_seq(&mut self, seq: u64) {
        if let Some(resume) = self.resume.as_mut() {
            resume.seq = seq;
        }
    }
}
