// src/session/mod.rs — Generation session state machine
//
// One session covers one request/response cycle:
//
//   Idle -> Loading -> Streaming -> { Completed | Cancelled | Errored }
//
// Loading may also go straight to a terminal state. Every input (stream
// records, timer ticks, the silence deadline, cancellation, transport
// failures) arrives as a `SessionEvent`, and `handle_event` is the only place
// state changes. The async loop that produces those events lives in `driver`.

pub mod controller;
pub mod driver;
pub mod history;
pub mod request;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::infra::config::SessionConfig;
use crate::infra::errors::GenStreamError;
use crate::stream::event::StreamEvent;
use crate::stream::telemetry::{
    format_rate, SessionMetrics, Timer, DEFAULT_TICK_INTERVAL,
};
use crate::stream::watchdog::{SilenceWatchdog, DEFAULT_SILENCE_THRESHOLD};
use view::{Controls, SessionView, Status};

/// Timing knobs for a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Abort the request this long after submission, whatever its state.
    pub hard_timeout: Duration,
    /// Advisory hint after this long without a token.
    pub silence_threshold: Duration,
    pub tick_interval: Duration,
    /// 0 = drop malformed lines forever.
    pub max_consecutive_parse_failures: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            hard_timeout: Duration::from_secs(60),
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_consecutive_parse_failures: 16,
        }
    }
}

impl From<&SessionConfig> for SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            hard_timeout: Duration::from_secs(config.hard_timeout_secs),
            silence_threshold: Duration::from_millis(config.silence_threshold_ms),
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            max_consecutive_parse_failures: config.max_consecutive_parse_failures,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Streaming,
    Completed,
    Cancelled,
    Errored,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Loading | SessionState::Streaming)
    }
}

/// Why a session was aborted. None of these count as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Explicit cancel action.
    User,
    /// The host is shutting down.
    Teardown,
    /// The hard timeout fired.
    Timeout,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::User => write!(f, "cancelled by user"),
            CancelReason::Teardown => write!(f, "cancelled on shutdown"),
            CancelReason::Timeout => write!(f, "timed out"),
        }
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    Stream(StreamEvent),
    Tick,
    SilenceElapsed,
    Cancelled(CancelReason),
    Failed(GenStreamError),
}

/// Final numbers of a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub tokens: u64,
    pub elapsed_secs: f64,
    pub rate: f64,
}

impl Summary {
    pub fn message(&self) -> String {
        format!(
            "{} tokens in {:.1}s ({} tok/s)",
            self.tokens,
            self.elapsed_secs,
            format_rate(self.rate)
        )
    }
}

#[derive(Debug)]
pub enum Outcome {
    Completed(Summary),
    Cancelled(CancelReason),
    Errored(GenStreamError),
}

impl Outcome {
    pub fn state(&self) -> SessionState {
        match self {
            Outcome::Completed(_) => SessionState::Completed,
            Outcome::Cancelled(_) => SessionState::Cancelled,
            Outcome::Errored(_) => SessionState::Errored,
        }
    }
}

/// One in-flight generation, rendering into a borrowed view.
///
/// Cleanup (timer stopped, watchdog disarmed, controls back to idle) runs in
/// [`GenerationSession::finish`], and from `Drop` if the session is abandoned
/// mid-flight, so the view can never be left in its busy state.
pub struct GenerationSession<'v, V: SessionView> {
    id: Uuid,
    state: SessionState,
    metrics: SessionMetrics,
    timer: Timer,
    watchdog: SilenceWatchdog,
    view: &'v mut V,
    retry_available: bool,
    outcome: Option<Outcome>,
    cleaned_up: bool,
}

impl<'v, V: SessionView> GenerationSession<'v, V> {
    /// Idle -> Loading.
    pub fn start(view: &'v mut V, settings: &SessionSettings, retry_available: bool) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            metrics: SessionMetrics::new(),
            timer: Timer::new(),
            watchdog: SilenceWatchdog::new(settings.silence_threshold),
            view,
            retry_available,
            outcome: None,
            cleaned_up: false,
        };

        session.view.clear_output();
        session.view.set_summary(None);
        session.view.set_hint(None);
        session.timer.start();
        session.view.set_elapsed(session.timer.display());
        session.watchdog.arm();
        session.view.set_status(&Status::Loading);
        session.view.set_controls(Controls::busy());
        session.transition(SessionState::Loading);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        !self.state.is_active()
    }

    pub fn tokens_seen(&self) -> u64 {
        self.metrics.tokens_seen
    }

    pub fn elapsed(&self) -> f64 {
        self.timer.elapsed()
    }

    /// When the silence warning is due, if armed.
    pub fn silence_deadline(&self) -> Option<Instant> {
        self.watchdog.deadline()
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        if !self.state.is_active() {
            tracing::debug!(session = %self.id, state = ?self.state, "Ignoring event after session end: {:?}", event);
            return;
        }

        match event {
            SessionEvent::Stream(record) => self.on_record(record),
            SessionEvent::Tick => {
                if let Some(display) = self.timer.tick() {
                    self.view.set_elapsed(display);
                }
            }
            SessionEvent::SilenceElapsed => {
                if let Some(hint) = self.watchdog.fire() {
                    tracing::info!(
                        session = %self.id,
                        tokens = self.metrics.tokens_seen,
                        silent_ms = self.metrics.since_last_event().as_millis() as u64,
                        "Generation went silent"
                    );
                    self.view.set_hint(Some(hint));
                }
            }
            SessionEvent::Cancelled(reason) => self.cancel(reason),
            SessionEvent::Failed(err) => self.fail(err),
        }
    }

    /// Run cleanup and hand back the terminal outcome.
    pub fn finish(mut self) -> Outcome {
        if self.state.is_active() {
            self.fail(GenStreamError::transport("session ended without a terminal event"));
        }
        self.cleanup();
        self.outcome
            .take()
            .unwrap_or(Outcome::Cancelled(CancelReason::Teardown))
    }

    fn on_record(&mut self, record: StreamEvent) {
        // A record may carry a token and `done` together: render first.
        if let Some(token) = record.token_text() {
            self.view.append_token(token);
            self.metrics.record_token();
            self.watchdog.arm();
            if self.state == SessionState::Loading {
                self.transition(SessionState::Streaming);
            }
            let rate = format_rate(self.metrics.tokens_per_second(self.timer.elapsed()));
            self.view.set_status(&Status::Generating { rate });
        }

        if let Some(warning) = record.warning_message() {
            tracing::info!(session = %self.id, "Backend warning: {}", warning);
            self.view.set_hint(Some(warning));
        }

        if let Some(error) = record.error_message() {
            self.fail(GenStreamError::Application(error.to_string()));
            return;
        }

        if record.done {
            self.complete();
        }
    }

    fn complete(&mut self) {
        let elapsed = self.timer.elapsed();
        let summary = Summary {
            tokens: self.metrics.tokens_seen,
            elapsed_secs: elapsed,
            rate: self.metrics.tokens_per_second(elapsed),
        };
        tracing::info!(
            session = %self.id,
            tokens = summary.tokens,
            elapsed_secs = summary.elapsed_secs,
            "Generation complete"
        );
        self.view.set_status(&Status::Done);
        self.view.set_summary(Some(&summary.message()));
        self.transition(SessionState::Completed);
        self.outcome = Some(Outcome::Completed(summary));
    }

    fn cancel(&mut self, reason: CancelReason) {
        tracing::info!(session = %self.id, tokens = self.metrics.tokens_seen, "Generation {}", reason);
        self.view.set_status(&Status::Cancelled);
        self.view.set_summary(None);
        self.transition(SessionState::Cancelled);
        self.outcome = Some(Outcome::Cancelled(reason));
    }

    fn fail(&mut self, err: GenStreamError) {
        tracing::warn!(session = %self.id, "Generation failed: {}", err);
        self.view.set_status(&Status::Failed);
        self.view.set_summary(Some(&err.to_string()));
        self.transition(SessionState::Errored);
        self.outcome = Some(Outcome::Errored(err));
    }

    fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        self.timer.stop();
        self.watchdog.disarm();
        self.view.set_hint(None);
        self.view.set_controls(Controls::idle(self.retry_available));
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(session = %self.id, from = ?self.state, to = ?next, "Session transition");
        self.state = next;
    }
}

impl<V: SessionView> Drop for GenerationSession<'_, V> {
    fn drop(&mut self) {
        if self.state.is_active() {
            self.cancel(CancelReason::Teardown);
        }
        self.cleanup();
    }
}
