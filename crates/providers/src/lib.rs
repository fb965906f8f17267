//! Provider abstractions for text-generation backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod ollama;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

/// Sampling knobs sent alongside a prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub num_predict: u32,
    pub temperature: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            num_predict: 100,
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
}

#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<GenerateResponse, ProviderError>;

    /// Checks that the backend is reachable and the model can serve requests.
    async fn ensure_ready(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
