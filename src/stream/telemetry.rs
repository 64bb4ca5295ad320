// src/stream/telemetry.rs — Elapsed-time display and throughput

use tokio::time::{Duration, Instant};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Wall-clock timer for one session.
///
/// The session loop calls [`Timer::tick`] every tick interval; the display
/// string only moves while the timer is running, so after [`Timer::stop`] the
/// last value stays on screen.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    started: Option<Instant>,
    running: bool,
    display: String,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            display: format_elapsed(0.0),
            ..Self::default()
        }
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.running = true;
        self.display = format_elapsed(0.0);
    }

    /// Recompute the display. Returns the new value while running.
    pub fn tick(&mut self) -> Option<&str> {
        if !self.running {
            return None;
        }
        self.display = format_elapsed(self.elapsed());
        Some(&self.display)
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Seconds since the last `start()`, 0.0 if never started.
    pub fn elapsed(&self) -> f64 {
        self.started
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Per-session counters. Created at session start, dropped at session end.
#[derive(Debug, Clone)]
pub struct SessionMetrics {
    pub tokens_seen: u64,
    pub start_time: Instant,
    pub last_event_time: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            tokens_seen: 0,
            start_time: now,
            last_event_time: now,
        }
    }

    /// Exactly one increment per token-bearing record.
    pub fn record_token(&mut self) {
        self.tokens_seen += 1;
        self.last_event_time = Instant::now();
    }

    /// Time since the last token (or since start when none arrived yet).
    pub fn since_last_event(&self) -> Duration {
        self.last_event_time.elapsed()
    }

    pub fn tokens_per_second(&self, elapsed_secs: f64) -> f64 {
        tokens_per_second(self.tokens_seen, elapsed_secs)
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// tokens / elapsed, or 0.0 whenever that would not be a finite number.
pub fn tokens_per_second(tokens: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs.is_nan() || elapsed_secs <= 0.0 {
        return 0.0;
    }
    let rate = tokens as f64 / elapsed_secs;
    if rate.is_finite() {
        rate
    } else {
        0.0
    }
}

pub fn format_rate(rate: f64) -> String {
    format!("{:.1}", rate)
}

pub fn format_elapsed(secs: f64) -> String {
    format!("{:.1}s", secs)
}
