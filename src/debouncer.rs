use std::time::{Duration, Instant};

/// Tracks when an action should fire after a period of inactivity.
/// Used for live search: every keystroke in the term field calls `trigger`,
/// and the query is only submitted once typing pauses.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    last_event: Option<Instant>,
    pending: bool,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            last_event: None,
            pending: false,
        }
    }

    /// Register that an event occurred.
    pub fn trigger(&mut self) {
        self.last_event = Some(Instant::now());
        self.pending = true;
    }

    /// Returns true once the quiet period has elapsed since the last trigger.
    /// Consumes the pending state.
    pub fn should_execute(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        if let Some(last) = self.last_event {
            if last.elapsed() >= self.delay {
                self.pending = false;
                self.last_event = None;
                return true;
            }
        }
        false
    }

    /// Cancel any pending action.
    pub fn reset(&mut self) {
        self.last_event = None;
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
