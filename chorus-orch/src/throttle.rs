//! Rate limiting for streaming display updates.
//!
//! [`Throttle`] is a pure state machine driven by explicit instants, so it
//! can be tested without a clock. The caller owns the timer: it sleeps until
//! [`Throttle::deadline`] and then calls [`Throttle::fire`]. Clearing the
//! deadline is the cancellation.

use std::time::Duration;

use tokio::time::Instant;

/// Default minimum spacing between display updates.
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(150);

/// Coalesces a burst of updates into at most one emission per interval.
///
/// The first window opens at `started`, so content arriving sooner than one
/// interval after the stream opened is deferred like any other.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_emit: Instant,
    pending: Option<String>,
    deadline: Option<Instant>,
}

impl Throttle {
    /// Create a throttle with the given minimum spacing whose first window
    /// opens at `started`.
    #[must_use]
    pub fn new(interval: Duration, started: Instant) -> Self {
        Self {
            interval,
            last_emit: started,
            pending: None,
            deadline: None,
        }
    }

    /// Offer new content at `now`.
    ///
    /// Returns the content if it may be shown immediately. Otherwise it is
    /// held as the pending update (replacing any older one) and a deadline
    /// is scheduled at the end of the current interval, unless one is
    /// already scheduled.
    pub fn offer(&mut self, content: String, now: Instant) -> Option<String> {
        if now.saturating_duration_since(self.last_emit) >= self.interval {
            self.cancel();
            self.last_emit = now;
            return Some(content);
        }

        self.pending = Some(content);
        if self.deadline.is_none() {
            self.deadline = Some(self.last_emit + self.interval);
        }
        None
    }

    /// When the pending update should be shown, if one is scheduled.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Emit the pending update because its deadline passed.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        self.deadline = None;
        let content = self.pending.take()?;
        self.last_emit = now;
        Some(content)
    }

    /// Drop the pending update and its deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn content_inside_first_window_is_deferred() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(DEFAULT_THROTTLE_INTERVAL, t0);
        assert_eq!(throttle.offer("a".into(), t0 + ms(10)), None);
        assert_eq!(throttle.deadline(), Some(t0 + ms(150)));
        assert_eq!(throttle.fire(t0 + ms(150)), Some("a".into()));
    }

    #[test]
    fn content_after_first_window_is_immediate() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(DEFAULT_THROTTLE_INTERVAL, t0);
        assert_eq!(throttle.offer("a".into(), t0 + ms(200)), Some("a".into()));
        assert!(throttle.deadline().is_none());
    }

    #[test]
    fn burst_is_coalesced_into_latest() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(DEFAULT_THROTTLE_INTERVAL, t0);
        assert!(throttle.offer("a".into(), t0 + ms(150)).is_some());
        assert!(throttle.offer("ab".into(), t0 + ms(160)).is_none());
        assert!(throttle.offer("abc".into(), t0 + ms(170)).is_none());

        assert_eq!(throttle.deadline(), Some(t0 + ms(300)));
        assert_eq!(throttle.fire(t0 + ms(300)), Some("abc".into()));
        assert!(throttle.deadline().is_none());
    }

    #[test]
    fn later_offers_do_not_push_deadline_back() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(DEFAULT_THROTTLE_INTERVAL, t0);
        throttle.offer("a".into(), t0);
        throttle.offer("b".into(), t0 + ms(50));
        throttle.offer("c".into(), t0 + ms(140));
        assert_eq!(throttle.deadline(), Some(t0 + ms(150)));
    }

    #[test]
    fn offer_after_interval_emits_and_clears_pending() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(DEFAULT_THROTTLE_INTERVAL, t0);
        throttle.offer("b".into(), t0 + ms(10));
        assert_eq!(throttle.offer("c".into(), t0 + ms(160)), Some("c".into()));
        assert!(throttle.deadline().is_none());
        assert_eq!(throttle.fire(t0 + ms(170)), None);
    }

    #[test]
    fn cancel_drops_pending() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(DEFAULT_THROTTLE_INTERVAL, t0);
        throttle.offer("b".into(), t0 + ms(10));
        throttle.cancel();
        assert!(throttle.deadline().is_none());
        assert_eq!(throttle.fire(t0 + ms(150)), None);
    }

    #[test]
    fn steady_burst_emits_once_per_window() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(DEFAULT_THROTTLE_INTERVAL, t0);
        let mut emitted = 0;

        // One offer every 10ms for 600ms, firing deadlines as they come due.
        for i in 0..60u64 {
            let now = t0 + ms(i * 10);
            if throttle.deadline().is_some_and(|d| d <= now) && throttle.fire(now).is_some() {
                emitted += 1;
            }
            if throttle.offer(format!("{i}"), now).is_some() {
                emitted += 1;
            }
        }

        // Windows close at 150, 300 and 450.
        assert_eq!(emitted, 3);
    }
}
