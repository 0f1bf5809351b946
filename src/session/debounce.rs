use std::time::{Duration, Instant};

/// Trailing-edge debounce timer.
///
/// Each `schedule` replaces any pending deadline, so only the last event in
/// a burst survives the quiet period. The owner polls `fire` from its tick
/// loop; there is no background thread.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the timer relative to `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once per elapsed deadline; clears the timer when it fires.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_only_after_quiet_period() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.schedule(t0);
        assert!(!debouncer.fire(t0 + Duration::from_millis(499)));
        assert!(debouncer.fire(t0 + Duration::from_millis(500)));
        assert!(!debouncer.fire(t0 + Duration::from_millis(501)));
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.schedule(t0);
        debouncer.schedule(t0 + Duration::from_millis(400));

        // The first deadline no longer exists.
        assert!(!debouncer.fire(t0 + Duration::from_millis(600)));
        assert!(debouncer.fire(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn test_cancel_disarms() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        debouncer.schedule(t0);
        debouncer.cancel();
        assert!(!debouncer.pending());
        assert!(!debouncer.fire(t0 + Duration::from_secs(1)));
    }
}
