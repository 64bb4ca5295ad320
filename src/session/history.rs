// src/session/history.rs — Snapshot of the last submitted request

use chrono::{DateTime, Utc};

use super::request::{shortened, GenerationRequest, RequestForm};

/// Holds an independent copy of the most recently sent request so it can be
/// replayed (retry) or replayed with a smaller token limit (shorten). Only
/// one snapshot is kept; a new submission replaces it.
#[derive(Debug, Clone, Default)]
pub struct RequestHistory {
    last: Option<GenerationRequest>,
    recorded_at: Option<DateTime<Utc>>,
}

impl RequestHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, request: &GenerationRequest) {
        self.last = Some(request.clone());
        self.recorded_at = Some(Utc::now());
    }

    pub fn last(&self) -> Option<&GenerationRequest> {
        self.last.as_ref()
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        self.recorded_at
    }

    pub fn has_snapshot(&self) -> bool {
        self.last.is_some()
    }

    /// A fresh copy of the snapshot to submit again.
    pub fn replay(&self) -> Option<GenerationRequest> {
        self.last.clone()
    }

    /// Halve the form's max-token value (floor, minimum 32) and carry the new
    /// value into the snapshot so the next retry uses it. Returns the new value.
    pub fn shorten(&mut self, form: &mut RequestForm) -> u32 {
        let next = shortened(form.max_tokens_value());
        form.max_tokens = next.to_string();
        if let Some(snapshot) = self.last.as_mut() {
            snapshot.num_predict = next;
        }
        next
    }
}
