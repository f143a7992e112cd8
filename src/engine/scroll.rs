use std::time::{Duration, Instant};

use chrono::NaiveDate;

/// Interval between edge checks while scrolling.
pub const SCROLL_THROTTLE: Duration = Duration::from_millis(100);
/// Quiet period before the scrolled-to date is written back.
pub const SCROLL_SAVE_DEBOUNCE: Duration = Duration::from_millis(400);

/// Lets an action through at most once per interval.
#[derive(Debug, Clone)]
pub struct ScrollThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ScrollThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

impl Default for ScrollThrottle {
    fn default() -> Self {
        Self::new(SCROLL_THROTTLE)
    }
}

/// Debounced write-back of the date at the viewport's left edge.
#[derive(Debug, Clone, Default)]
pub struct ScrollPersistence {
    pending: Option<NaiveDate>,
    due: Option<Instant>,
    last_saved: Option<NaiveDate>,
}

impl ScrollPersistence {
    /// Record the date under the viewport. The quiet period restarts only
    /// when the date changes, so per-frame calls at a resting offset still
    /// let the save come due.
    pub fn note(&mut self, date: NaiveDate, now: Instant) {
        let unchanged = match self.pending {
            Some(pending) => pending == date,
            None => self.last_saved == Some(date),
        };
        if unchanged {
            return;
        }
        self.pending = Some(date);
        self.due = Some(now + SCROLL_SAVE_DEBOUNCE);
    }

    pub fn due(&self) -> Option<Instant> {
        self.due
    }

    /// The date to save, once the scroll has settled.
    pub fn take_due(&mut self, now: Instant) -> Option<NaiveDate> {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                let date = self.pending.take()?;
                self.last_saved = Some(date);
                Some(date)
            }
            _ => None,
        }
    }
}
