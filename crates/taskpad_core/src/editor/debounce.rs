use std::time::{Duration, Instant};

/// Default quiet period before an edit is saved.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(900);

/// A single trailing-edge deadline.
///
/// Scheduling replaces any pending deadline; the owner polls [`Debouncer::fire`]
/// from its event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns `true` exactly once per schedule, when `now` reaches the deadline.
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

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;
    use std::time::{Duration, Instant};

    #[test]
    fn fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        debouncer.schedule(start);

        assert!(!debouncer.fire(start + Duration::from_millis(99)));
        assert!(debouncer.fire(start + Duration::from_millis(100)));
        assert!(!debouncer.fire(start + Duration::from_millis(500)));
    }

    #[test]
    fn rescheduling_pushes_the_deadline_back() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        debouncer.schedule(start);
        debouncer.schedule(start + Duration::from_millis(80));

        assert!(!debouncer.fire(start + Duration::from_millis(150)));
        assert!(debouncer.fire(start + Duration::from_millis(180)));
    }

    #[test]
    fn cancel_discards_pending_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));

        debouncer.schedule(start);
        debouncer.cancel();

        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire(start + Duration::from_secs(1)));
    }
}
