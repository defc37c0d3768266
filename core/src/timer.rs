use core::time::Duration;
use web_time::Instant;

/// Play clock: time accumulated by earlier sessions plus the running span, if any.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    duration: Duration,
    start_at: Option<Instant>,
}

impl Timer {
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            start_at: None,
        }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub const fn is_running(&self) -> bool {
        self.start_at.is_some()
    }

    pub const fn start_at(&self) -> Option<Instant> {
        self.start_at
    }

    /// Accumulated duration, not counting the running span.
    pub const fn stored(&self) -> Duration {
        self.duration
    }

    pub fn start(&mut self, now: Instant) {
        self.start_at = Some(now);
    }

    /// Folds the running span into the stored duration.
    pub fn stop(&mut self, now: Instant) {
        if let Some(start_at) = self.start_at.take() {
            self.duration += now.saturating_duration_since(start_at);
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.start_at {
            Some(start_at) => now.saturating_duration_since(start_at) + self.duration,
            None => self.duration,
        }
    }

    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        self.elapsed(now).as_millis().try_into().unwrap_or(u64::MAX)
    }
}
