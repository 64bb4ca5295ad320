// src/session/request.rs — Request body and the editable form it is built from

use serde::{Deserialize, Serialize};

use crate::infra::config::GenerationConfig;
use crate::infra::errors::GenStreamError;

pub const DEFAULT_NUM_PREDICT: u32 = 512;
pub const DEFAULT_KEEP_ALIVE: &str = "5m";
/// Shortening never goes below this.
pub const MIN_NUM_PREDICT: u32 = 32;

/// Body of the streaming generation POST.
///
/// `model` is omitted from the JSON when absent so the server picks its
/// default. `stream` is always true for requests built here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub stream: bool,
    pub keep_alive: String,
    pub num_predict: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            stream: true,
            keep_alive: DEFAULT_KEEP_ALIVE.into(),
            num_predict: DEFAULT_NUM_PREDICT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_num_predict(mut self, num_predict: u32) -> Self {
        self.num_predict = num_predict;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = keep_alive.into();
        self
    }

    /// Enforce the body invariants on a caller-supplied request: non-empty
    /// prompt, streaming on, positive token limit, blank model dropped.
    pub fn normalized(mut self) -> Result<Self, GenStreamError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(GenStreamError::Validation("prompt is required".into()));
        }
        self.prompt = prompt.to_string();
        self.model = self
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        self.stream = true;
        if self.keep_alive.trim().is_empty() {
            self.keep_alive = DEFAULT_KEEP_ALIVE.into();
        }
        if self.num_predict == 0 {
            self.num_predict = DEFAULT_NUM_PREDICT;
        }
        Ok(self)
    }
}

/// The user-editable input fields, kept as raw text like the controls they
/// mirror. Nothing is validated until [`RequestForm::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestForm {
    pub prompt: String,
    pub model: String,
    pub max_tokens: String,
    pub keep_alive: String,
}

impl RequestForm {
    pub fn build(&self) -> Result<GenerationRequest, GenStreamError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(GenStreamError::Validation("prompt is required".into()));
        }

        let model = self.model.trim();
        let keep_alive = self.keep_alive.trim();

        Ok(GenerationRequest {
            prompt: prompt.to_string(),
            model: (!model.is_empty()).then(|| model.to_string()),
            stream: true,
            keep_alive: if keep_alive.is_empty() {
                DEFAULT_KEEP_ALIVE.to_string()
            } else {
                keep_alive.to_string()
            },
            num_predict: parse_max_tokens(&self.max_tokens),
        })
    }

    /// Put a previously sent request back into the input fields.
    pub fn restore(&mut self, request: &GenerationRequest) {
        self.prompt = request.prompt.clone();
        self.model = request.model.clone().unwrap_or_default();
        self.max_tokens = request.num_predict.to_string();
        self.keep_alive = request.keep_alive.clone();
    }

    /// Current max-token value as `build()` would send it.
    pub fn max_tokens_value(&self) -> u32 {
        parse_max_tokens(&self.max_tokens)
    }
}

impl From<&GenerationConfig> for RequestForm {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            prompt: String::new(),
            model: config.model.clone().unwrap_or_default(),
            max_tokens: config.num_predict.to_string(),
            keep_alive: config.keep_alive.clone(),
        }
    }
}

/// Parse the max-token field. Anything that is not a finite number >= 1
/// falls back to the default; fractions are floored.
pub fn parse_max_tokens(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 1.0 => n.floor().min(u32::MAX as f64) as u32,
        _ => DEFAULT_NUM_PREDICT,
    }
}

/// Half of `current`, floored, never below [`MIN_NUM_PREDICT`].
pub fn shortened(current: u32) -> u32 {
    (current / 2).max(MIN_NUM_PREDICT)
}
