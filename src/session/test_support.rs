// src/session/test_support.rs — Recording view for unit tests
//
// tests/common/mod.rs carries the same view for integration tests, plus a few
// extra helpers. Keep the shared helpers identical.

use super::view::{Controls, SessionView, Status};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    Status(Status),
    Clear,
    Token(String),
    Elapsed(String),
    Summary(Option<String>),
    Hint(Option<String>),
    Controls(Controls),
}

#[derive(Debug, Default)]
pub struct RecordingView {
    pub calls: Vec<ViewCall>,
}

impl RecordingView {
    /// Output text since the last clear.
    pub fn output(&self) -> String {
        let start = self
            .calls
            .iter()
            .rposition(|c| *c == ViewCall::Clear)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.calls[start..]
            .iter()
            .filter_map(|c| match c {
                ViewCall::Token(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<&Status> {
        self.calls.iter().rev().find_map(|c| match c {
            ViewCall::Status(s) => Some(s),
            _ => None,
        })
    }

    pub fn last_summary(&self) -> Option<String> {
        self.calls.iter().rev().find_map(|c| match c {
            ViewCall::Summary(s) => Some(s.clone()),
            _ => None,
        })?
    }

    pub fn last_controls(&self) -> Option<Controls> {
        self.calls.iter().rev().find_map(|c| match c {
            ViewCall::Controls(c) => Some(*c),
            _ => None,
        })
    }

    /// Every non-empty hint shown, in order.
    pub fn hints(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ViewCall::Hint(Some(h)) => Some(h.clone()),
                _ => None,
            })
            .collect()
    }
}

impl SessionView for RecordingView {
    fn set_status(&mut self, status: &Status) {
        self.calls.push(ViewCall::Status(status.clone()));
    }

    fn clear_output(&mut self) {
        self.calls.push(ViewCall::Clear);
    }

    fn append_token(&mut self, token: &str) {
        self.calls.push(ViewCall::Token(token.to_string()));
    }

    fn set_elapsed(&mut self, elapsed: &str) {
        self.calls.push(ViewCall::Elapsed(elapsed.to_string()));
    }

    fn set_summary(&mut self, summary: Option<&str>) {
        self.calls.push(ViewCall::Summary(summary.map(str::to_string)));
    }

    fn set_hint(&mut self, hint: Option<&str>) {
        self.calls.push(ViewCall::Hint(hint.map(str::to_string)));
    }

    fn set_controls(&mut self, controls: Controls) {
        self.calls.push(ViewCall::Controls(controls));
    }
}
