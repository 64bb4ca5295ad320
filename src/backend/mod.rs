// src/backend/mod.rs — Transport layer for the streaming generation endpoint

pub mod http;
pub mod retry;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::infra::errors::GenStreamError;
use crate::session::request::GenerationRequest;

pub use http::HttpBackend;
pub use retry::RetryBackend;

/// Raw response body, chunk by chunk, exactly as the transport delivered it.
/// Line framing and UTF-8 decoding are the parser's job.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, GenStreamError>> + Send>>;

/// Anything that can start a streaming generation.
#[async_trait]
pub trait GenerateBackend: Send + Sync {
    fn id(&self) -> &str;

    /// Send the request and return the body stream once the server has
    /// answered with a success status. Non-2xx and empty bodies are errors
    /// here, before any byte reaches the parser.
    async fn open_stream(&self, request: &GenerationRequest) -> Result<ByteStream, GenStreamError>;

    async fn list_models(&self) -> Result<Vec<ModelInfo>, GenStreamError>;
}

/// One entry of the server's model list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// Reachability of the server root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    Online { status: u16 },
    Offline { reason: String },
}

impl ServerStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, ServerStatus::Online { .. })
    }
}
