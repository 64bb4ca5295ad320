// src/stream/watchdog.rs — Advisory warning when tokens stop arriving

use tokio::time::{Duration, Instant};

pub const DEFAULT_SILENCE_THRESHOLD: Duration = Duration::from_millis(4_000);

pub const SLOW_GENERATION_HINT: &str =
    "No new tokens for a while: the model may still be loading or generating slowly.";

/// One-shot silence timer.
///
/// The watchdog holds a deadline instead of a spawned timer task; the session
/// loop sleeps until [`SilenceWatchdog::deadline`] and then calls
/// [`SilenceWatchdog::fire`]. Re-arming simply moves the deadline, which
/// cancels the pending warning.
#[derive(Debug, Clone)]
pub struct SilenceWatchdog {
    threshold: Duration,
    deadline: Option<Instant>,
    hint: Option<String>,
}

impl SilenceWatchdog {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            deadline: None,
            hint: None,
        }
    }

    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.threshold);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
        self.hint = None;
    }

    /// Set the hint if the deadline has passed. Returns the hint when it fired.
    pub fn fire(&mut self) -> Option<&str> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                self.hint = Some(SLOW_GENERATION_HINT.to_string());
                self.hint.as_deref()
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}

impl Default for SilenceWatchdog {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_THRESHOLD)
    }
}
