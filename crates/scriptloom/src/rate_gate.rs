//! Process-wide spacing between outbound calls.
//!
//! One gate is shared by every credential and every operation, since they
//! all draw from the same remote quota window.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Default minimum spacing between two calls.
pub const DEFAULT_MIN_SPACING: Duration = Duration::from_millis(10_000);

pub struct RateGate {
    min_spacing: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SPACING)
    }
}

impl RateGate {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Waits until the minimum spacing since the last call has elapsed, then
    /// stamps now. Concurrent callers queue on the gate one at a time.
    pub async fn await_turn(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_spacing;
            if Instant::now() < ready_at {
                log::debug!(
                    "Rate gate: waiting {:?} before next call",
                    ready_at - Instant::now()
                );
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Waits out a server-requested cooldown.
    ///
    /// The last-call stamp moves to the end of the cooldown so the regular
    /// spacing is measured from there.
    pub async fn await_cooldown(&self, cooldown: Duration) {
        let until = Instant::now() + cooldown;
        {
            let mut last = self.last_call.lock().await;
            *last = Some(until);
        }
        log::info!("Quota exceeded, cooling down for {:?}", cooldown);
        sleep_until(until).await;
    }

    /// Time the next `await_turn` would wait right now.
    pub async fn pending_wait(&self) -> Duration {
        match *self.last_call.lock().await {
            Some(previous) => (previous + self.min_spacing).saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }
}
