// src/infra/errors.rs — Error types for genstream

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenStreamError {
    // Input errors (nothing was sent)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A generation is already in progress")]
    Busy,

    // Transport errors
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Server returned an empty response body")]
    EmptyBody,

    #[error("Transport error: {message}")]
    Transport { message: String, retriable: bool },

    // Stream content errors
    #[error("Generation failed: {0}")]
    Application(String),

    #[error("Stream protocol error: {failures} consecutive malformed lines (last: {last_error})")]
    Protocol { failures: u32, last_error: String },

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GenStreamError {
    /// Only connection-level failures are worth another attempt. A server that
    /// answered with a status code has already made up its mind.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            GenStreamError::Transport {
                retriable: true,
                ..
            }
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        GenStreamError::Transport {
            message: message.into(),
            retriable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_mentions_status() {
        let e = GenStreamError::Http {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert!(e.to_string().contains("500"));
    }

    #[test]
    fn test_retriable_only_for_flagged_transport() {
        assert!(GenStreamError::Transport {
            message: "connection refused".into(),
            retriable: true,
        }
        .is_retriable());
        assert!(!GenStreamError::transport("reset").is_retriable());
        assert!(!GenStreamError::Http {
            status: 503,
            message: String::new(),
        }
        .is_retriable());
        assert!(!GenStreamError::EmptyBody.is_retriable());
        assert!(!GenStreamError::Application("boom".into()).is_retriable());
    }

    #[test]
    fn test_protocol_error_display() {
        let e = GenStreamError::Protocol {
            failures: 17,
            last_error: "expected value".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("17"));
        assert!(msg.contains("expected value"));
    }
}
