use std::time::Duration;

use tokio::time::{interval, Interval};

/// A periodic scheduled signal at the server-dictated cadence. The first tick
/// fires at zero delay (see `tokio::time::interval`'s documented behaviour),
/// which matters because `Hello` pre-sets `awaiting_ack = true` so that first
/// tick is allowed to immediately send a heartbeat right after Identify/Resume.
///
/// Dropping this value cancels the timer; the session owns it for exactly as
/// long as the stage is alive.
pub struct HeartbeatTimer {
    ticker: Interval,
}

impl HeartbeatTimer {
    pub fn new(interval_ms: u32) -> Self {
        Self { ticker: interval(Duration::from_millis(u64::from(interval_ms))) }
    }

    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }
}
