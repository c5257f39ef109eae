//! Async pacer for the guess countdown.
//!
//! Sits in the match controller's `tokio::select!` loop the same way a
//! fixed-rate scheduler would: when disarmed it pends forever, so the
//! other branches keep running and no branch needs to be conditionally
//! compiled in or out of the loop.

use std::time::Duration;

use tokio::time::{self, Instant};

/// Fires once per period while armed; pends forever while disarmed.
///
/// Armed at the start of a guessing turn, disarmed when the local guess
/// goes in (or the turn ends). The countdown *value* is not here — this
/// only decides *when* the controller should decrement it.
pub struct GuessCountdown {
    period: Duration,
    next_tick: Option<Instant>,
}

impl GuessCountdown {
    /// One-second ticks, matching the point value's decay rate.
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    /// A pacer with a custom period (tests run it fast).
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            next_tick: None,
        }
    }

    /// Starts (or restarts) ticking, first tick one period from now.
    pub fn arm(&mut self) {
        self.next_tick = Some(Instant::now() + self.period);
    }

    /// Stops ticking. Idempotent.
    pub fn disarm(&mut self) {
        self.next_tick = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Resolves at the next tick, then schedules the one after.
    ///
    /// While disarmed this future never completes — `tokio::select!`
    /// simply keeps servicing its other branches.
    pub async fn wait_for_tick(&mut self) {
        let Some(next) = self.next_tick else {
            std::future::pending::<()>().await;
            unreachable!()
        };
        time::sleep_until(next).await;
        self.next_tick = Some(next + self.period);
    }
}

impl Default for GuessCountdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_armed_pacer_ticks_repeatedly() {
        let mut pacer =
            GuessCountdown::with_period(Duration::from_millis(5));
        pacer.arm();

        for _ in 0..3 {
            tokio::time::timeout(
                Duration::from_secs(1),
                pacer.wait_for_tick(),
            )
            .await
            .expect("armed pacer must tick");
        }
    }

    #[tokio::test]
    async fn test_disarmed_pacer_pends_forever() {
        let mut pacer =
            GuessCountdown::with_period(Duration::from_millis(5));

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            pacer.wait_for_tick(),
        )
        .await;

        assert!(result.is_err(), "disarmed pacer must not tick");
    }

    #[tokio::test]
    async fn test_disarm_after_arm_stops_ticking() {
        let mut pacer =
            GuessCountdown::with_period(Duration::from_millis(5));
        pacer.arm();
        pacer.disarm();

        assert!(!pacer.is_armed());
        let result = tokio::time::timeout(
            Duration::from_millis(50),
            pacer.wait_for_tick(),
        )
        .await;
        assert!(result.is_err());
    }
}
