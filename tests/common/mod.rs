// tests/common/mod.rs — Shared fixtures: a recording view and a scripted backend

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use genstream::backend::{ByteStream, GenerateBackend, ModelInfo};
use genstream::infra::errors::GenStreamError;
use genstream::session::request::GenerationRequest;
use genstream::session::view::{Controls, SessionView, Status};

// ─── View ───────────────────────────────────────────────────────────────────

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

/// Records every call the session makes on its view.
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

    pub fn token_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ViewCall::Token(_)))
            .count()
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

    pub fn last_hint_call(&self) -> Option<Option<String>> {
        self.calls.iter().rev().find_map(|c| match c {
            ViewCall::Hint(h) => Some(h.clone()),
            _ => None,
        })
    }

    pub fn hints(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ViewCall::Hint(Some(h)) => Some(h.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_controls(&self) -> Option<Controls> {
        self.controls().last().copied()
    }

    pub fn controls(&self) -> Vec<Controls> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ViewCall::Controls(c) => Some(*c),
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

// ─── Backend ────────────────────────────────────────────────────────────────

/// One step of a scripted response body.
#[derive(Debug, Clone)]
pub enum Step {
    Bytes(Vec<u8>),
    Wait(Duration),
    ReadError(String),
}

impl Step {
    pub fn line(json: &str) -> Self {
        Step::Bytes(format!("{}\n", json).into_bytes())
    }

    pub fn token(text: &str) -> Self {
        Step::line(&serde_json::json!({ "response": text, "done": false }).to_string())
    }

    pub fn done() -> Self {
        Step::line(r#"{"response":"","done":true}"#)
    }

    pub fn wait_ms(ms: u64) -> Self {
        Step::Wait(Duration::from_millis(ms))
    }
}

/// What the server does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Stream(Vec<Step>),
    Status(u16, String),
    Refused,
}

/// Counts a body stream as open until it is dropped.
struct OpenBody(Arc<AtomicUsize>);

impl OpenBody {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for OpenBody {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-process backend that plays back canned replies in order and records
/// every request it receives.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<GenerationRequest>>,
    open_delay: Duration,
    open_bodies: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            open_delay: Duration::ZERO,
            open_bodies: Arc::default(),
        }
    }

    pub fn streaming(steps: Vec<Step>) -> Self {
        Self::new(vec![Reply::Stream(steps)])
    }

    /// Delay before the response headers "arrive".
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Response bodies handed out and not yet dropped by the consumer.
    pub fn open_bodies(&self) -> usize {
        self.open_bodies.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerateBackend for ScriptedBackend {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn open_stream(&self, request: &GenerationRequest) -> Result<ByteStream, GenStreamError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Stream(vec![Step::done()]));

        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }

        match reply {
            Reply::Status(status, message) => Err(GenStreamError::Http { status, message }),
            Reply::Refused => Err(GenStreamError::Transport {
                message: "connection refused".into(),
                retriable: true,
            }),
            Reply::Stream(steps) => {
                let body = OpenBody::new(&self.open_bodies);
                let stream = async_stream::stream! {
                    let _body = body;
                    for step in steps {
                        match step {
                            Step::Bytes(bytes) => yield Ok(bytes),
                            Step::Wait(delay) => tokio::time::sleep(delay).await,
                            Step::ReadError(message) => {
                                yield Err(GenStreamError::transport(message));
                                break;
                            }
                        }
                    }
                };
                Ok(Box::pin(stream))
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, GenStreamError> {
        Ok(vec![ModelInfo {
            name: "scripted-model".into(),
            size: None,
            modified_at: None,
        }])
    }
}
