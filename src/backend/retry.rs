// src/backend/retry.rs — Retry the initial connection with exponential backoff
//
// Only the request that opens the stream is retried, and only when the
// transport reports a connect failure or timeout. A server that answered with
// a status code is never asked again, and once bytes are flowing a failure
// belongs to the session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ByteStream, GenerateBackend, ModelInfo};
use crate::infra::errors::GenStreamError;
use crate::session::request::GenerationRequest;

const MAX_RETRIES: u32 = 2;
const INITIAL_DELAY_MS: u64 = 500;
const BACKOFF_FACTOR: f64 = 2.0;
const MAX_DELAY_MS: u64 = 5_000;
const JITTER_FRACTION: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay: Duration::from_millis(INITIAL_DELAY_MS),
            backoff_factor: BACKOFF_FACTOR,
            max_delay: Duration::from_millis(MAX_DELAY_MS),
            jitter_fraction: JITTER_FRACTION,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

pub struct RetryBackend {
    inner: Arc<dyn GenerateBackend>,
    config: RetryConfig,
}

impl RetryBackend {
    pub fn new(inner: Arc<dyn GenerateBackend>) -> Self {
        Self {
            inner,
            config: RetryConfig::default(),
        }
    }

    pub fn with_config(inner: Arc<dyn GenerateBackend>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Delay before retry `attempt` (0-indexed).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.config.initial_delay.as_millis() as f64
            * self.config.backoff_factor.powi(attempt as i32);
        let capped_ms = base_ms.min(self.config.max_delay.as_millis() as f64);

        let jitter = deterministic_jitter(attempt, self.config.jitter_fraction);
        let final_ms = (capped_ms * jitter).max(50.0);

        Duration::from_millis(final_ms as u64)
    }
}

/// Multiplier in [1 - fraction, 1 + fraction], fixed per attempt so test
/// timings are reproducible.
fn deterministic_jitter(attempt: u32, fraction: f64) -> f64 {
    let hash = (attempt.wrapping_mul(2654435761)) as f64 / u32::MAX as f64;
    1.0 + fraction * (2.0 * hash - 1.0)
}

#[async_trait]
impl GenerateBackend for RetryBackend {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn open_stream(&self, request: &GenerationRequest) -> Result<ByteStream, GenStreamError> {
        let mut attempt = 0;
        loop {
            match self.inner.open_stream(request).await {
                Ok(stream) => return Ok(stream),
                Err(e) if e.is_retriable() && attempt < self.config.max_retries => {
                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        backend = self.inner.id(),
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying connection after error: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, GenStreamError> {
        self.inner.list_models().await
    }
}
