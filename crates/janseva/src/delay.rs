//! Pacing between portal round trips.
//!
//! The portals throttle aggressive clients, so every flow pauses between
//! identifiers and between retry attempts. Tests substitute
//! [`DelayPolicy::None`] to run at full speed.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayPolicy {
    None,
    Fixed(Duration),
    /// `base` plus a uniform random extra in `[0, spread]`.
    Jittered { base: Duration, spread: Duration },
}

impl DelayPolicy {
    pub fn next_delay(&self) -> Duration {
        match self {
            DelayPolicy::None => Duration::ZERO,
            DelayPolicy::Fixed(d) => *d,
            DelayPolicy::Jittered { base, spread } => {
                let extra_ms = rand::thread_rng().gen_range(0..=spread.as_millis() as u64);
                *base + Duration::from_millis(extra_ms)
            }
        }
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
