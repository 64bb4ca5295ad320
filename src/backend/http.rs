// src/backend/http.rs — reqwest client for the NDJSON generation endpoint

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;

use super::{ByteStream, GenerateBackend, ModelInfo, ServerStatus};
use crate::infra::config::ServerConfig;
use crate::infra::errors::GenStreamError;
use crate::session::request::GenerationRequest;
use crate::util::preview;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const MODELS_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpBackend {
    base_url: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

impl HttpBackend {
    pub fn new(config: &ServerConfig) -> Result<Self, GenStreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| GenStreamError::Config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn generate_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    /// Any HTTP answer from the server root counts as online.
    pub async fn probe(&self) -> ServerStatus {
        match self
            .client
            .get(format!("{}/", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => ServerStatus::Online {
                status: resp.status().as_u16(),
            },
            Err(e) => {
                tracing::debug!(base_url = %self.base_url, "Probe failed: {}", e);
                ServerStatus::Offline {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> GenStreamError {
    GenStreamError::Transport {
        message: e.to_string(),
        retriable: e.is_timeout() || e.is_connect(),
    }
}

/// Prefer the server's own `{"error": ...}` text, then the raw body, then the
/// status reason.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value["error"].as_str() {
            return msg.to_string();
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return preview(body, 200);
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[async_trait]
impl GenerateBackend for HttpBackend {
    fn id(&self) -> &str {
        "http"
    }

    async fn open_stream(&self, request: &GenerationRequest) -> Result<ByteStream, GenStreamError> {
        let url = self.generate_url();
        tracing::debug!(%url, model = ?request.model, num_predict = request.num_predict, "Opening stream");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenStreamError::Http {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        if response.content_length() == Some(0) {
            return Err(GenStreamError::EmptyBody);
        }

        let byte_stream = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut byte_stream = std::pin::pin!(byte_stream);
            let mut received = 0usize;
            let mut failed = false;

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        if bytes.is_empty() {
                            continue;
                        }
                        received += bytes.len();
                        yield Ok(bytes.to_vec());
                    }
                    Err(e) => {
                        failed = true;
                        yield Err(GenStreamError::Transport {
                            message: format!("Stream read error: {}", e),
                            retriable: false,
                        });
                        break;
                    }
                }
            }

            if !failed && received == 0 {
                yield Err(GenStreamError::EmptyBody);
            }
        };

        Ok(Box::pin(stream))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, GenStreamError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(MODELS_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenStreamError::Http {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let tags: TagsResponse = response.json().await.map_err(|e| {
            GenStreamError::transport(format!("Invalid model list response: {}", e))
        })?;
        Ok(tags.models)
    }
}
