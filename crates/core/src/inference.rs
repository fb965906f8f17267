use crate::cache::{fingerprint, DecisionCache};
use crate::config::InferenceConfig;
use providers::{GenerateOptions, LlmProvider, ProviderError};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A provider bound to one model, with a caller-side deadline.
#[derive(Clone)]
pub struct InferenceClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    timeout: Duration,
    temperature: f32,
}

impl InferenceClient {
    pub fn new(provider: Arc<dyn LlmProvider>, cfg: &InferenceConfig) -> Self {
        Self {
            provider,
            model: cfg.model.clone(),
            timeout: cfg.timeout(),
            temperature: cfg.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answers from `cache` when the same prompt was already sent to this
    /// model; otherwise calls the provider and caches the trimmed response.
    pub async fn query(
        &self,
        cache: &mut DecisionCache,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let key = fingerprint(&[prompt, self.model.as_str()]);
        if let Some(hit) = cache.get(&key) {
            debug!("prompt cache hit");
            return Ok(hit.to_string());
        }

        let options = GenerateOptions {
            num_predict: max_tokens,
            temperature: self.temperature,
        };
        let response = tokio::time::timeout(self.timeout, self.provider.generate(prompt, options))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))??;

        let text = response.text.trim().to_string();
        cache.put(key, text.clone());
        Ok(text)
    }
}
