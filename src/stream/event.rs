// src/stream/event.rs — One decoded record of the generation stream

use serde::{Deserialize, Serialize};

/// A single NDJSON record. Every field is optional on the wire: token records
/// carry `response`, the final record carries `done: true`, and a failing
/// backend may send `error` or `warning` instead. Whatever else the server
/// includes (timings, context, model name) lands in `extra` and is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(default)]
    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StreamEvent {
    pub fn token(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            ..Default::default()
        }
    }

    /// The text fragment, if this is a token-bearing record. The final record
    /// of an Ollama stream has `"response": ""`, which carries no token.
    pub fn token_text(&self) -> Option<&str> {
        self.response.as_deref().filter(|t| !t.is_empty())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    pub fn warning_message(&self) -> Option<&str> {
        self.warning.as_deref().filter(|w| !w.is_empty())
    }
}
