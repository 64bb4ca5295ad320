// src/session/view.rs — The host surface a session renders into

use std::fmt;

/// Status indicator shown next to the output.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Loading,
    Generating { rate: String },
    Done,
    Cancelled,
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => write!(f, "idle"),
            Status::Loading => write!(f, "loading..."),
            Status::Generating { rate } => write!(f, "generating... {} tok/s", rate),
            Status::Done => write!(f, "done"),
            Status::Cancelled => write!(f, "cancelled"),
            Status::Failed => write!(f, "request failed"),
        }
    }
}

/// Which of the four controls accept input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub submit: bool,
    pub cancel: bool,
    pub retry: bool,
    pub shorten: bool,
}

impl Controls {
    /// While a session runs only cancel is live.
    pub fn busy() -> Self {
        Self {
            submit: false,
            cancel: true,
            retry: false,
            shorten: false,
        }
    }

    pub fn idle(retry_available: bool) -> Self {
        Self {
            submit: true,
            cancel: false,
            retry: retry_available,
            shorten: true,
        }
    }
}

/// Everything a session writes to the screen goes through this trait.
///
/// Implementations decide how to present it: the terminal front end prints,
/// tests record the calls.
pub trait SessionView {
    fn set_status(&mut self, status: &Status);
    fn clear_output(&mut self);
    fn append_token(&mut self, token: &str);
    fn set_elapsed(&mut self, elapsed: &str);
    fn set_summary(&mut self, summary: Option<&str>);
    fn set_hint(&mut self, hint: Option<&str>);
    fn set_controls(&mut self, controls: Controls);
}
