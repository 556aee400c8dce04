use std::time::{Duration, Instant};

/// A flag that stays raised for a fixed duration after being triggered.
///
/// There is only ever one deadline: triggering again while raised moves the
/// deadline instead of scheduling a second expiry.
#[derive(Debug, Clone)]
pub struct TransientFlag {
    duration: Duration,
    expires_at: Option<Instant>,
}

impl TransientFlag {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            expires_at: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn trigger(&mut self, now: Instant) {
        self.expires_at = Some(now + self.duration);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now < deadline)
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Drop an elapsed deadline. Returns true when the flag just went down.
    pub fn update(&mut self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) if now >= deadline => {
                self.expires_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.expires_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn raised_until_the_deadline() {
        let t0 = Instant::now();
        let mut flag = TransientFlag::new(1500 * MS);
        assert!(!flag.is_active(t0));

        flag.trigger(t0);
        assert!(flag.is_active(t0));
        assert!(flag.is_active(t0 + 1499 * MS));
        assert!(!flag.is_active(t0 + 1500 * MS));
    }

    #[test]
    fn retrigger_restarts_the_single_deadline() {
        let t0 = Instant::now();
        let mut flag = TransientFlag::new(1500 * MS);
        flag.trigger(t0);
        flag.trigger(t0 + 1000 * MS);

        // The first deadline no longer applies
        assert!(!flag.update(t0 + 1500 * MS));
        assert!(flag.is_active(t0 + 1500 * MS));

        assert!(flag.update(t0 + 2500 * MS));
        assert!(!flag.is_active(t0 + 2500 * MS));
        assert!(!flag.update(t0 + 3000 * MS));
    }

    #[test]
    fn clear_lowers_immediately() {
        let t0 = Instant::now();
        let mut flag = TransientFlag::new(10 * MS);
        flag.trigger(t0);
        flag.clear();
        assert!(!flag.is_active(t0));
        assert_eq!(flag.expires_at(), None);
    }
}
