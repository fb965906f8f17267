use crate::{GenerateOptions, GenerateResponse, LlmProvider, ProviderError};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const TAGS_TIMEOUT: Duration = Duration::from_secs(10);
const PULL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// Transport-level ceiling; callers usually enforce a tighter one.
    pub request_timeout: Duration,
}

#[derive(Clone)]
pub struct OllamaProvider {
    client: Client,
    cfg: Arc<OllamaConfig>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateApiResponse {
    response: Option<String>,
}

#[derive(Deserialize)]
struct TagsApiResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

impl OllamaProvider {
    pub fn new(cfg: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }

    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    /// Names of the models the backend has installed locally.
    pub async fn installed_models(&self) -> Result<Vec<String>, ProviderError> {
        let resp = self
            .client
            .get(self.url("/api/tags"))
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|e| request_error(e, TAGS_TIMEOUT))?;
        let resp = check_status(resp).await?;
        let parsed: TagsApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    pub async fn pull_model(&self) -> Result<(), ProviderError> {
        info!(model = %self.cfg.model, "pulling model");
        let body = PullRequest {
            name: &self.cfg.model,
            stream: false,
        };
        let resp = self
            .client
            .post(self.url("/api/pull"))
            .timeout(PULL_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, PULL_TIMEOUT))?;
        check_status(resp)
            .await
            .map_err(|e| ProviderError::ModelUnavailable(format!("{}: {}", self.cfg.model, e)))?;
        Ok(())
    }
}

/// True when `installed` satisfies `wanted`, treating an untagged name as `:latest`.
pub fn model_matches(installed: &str, wanted: &str) -> bool {
    if installed == wanted {
        return true;
    }
    !wanted.contains(':') && installed == format!("{}:latest", wanted)
}

#[async_trait::async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<GenerateResponse, ProviderError> {
        let body = GenerateRequest {
            model: &self.cfg.model,
            prompt,
            stream: false,
            options,
        };
        debug!(model = %self.cfg.model, num_predict = options.num_predict, "generate");

        let resp = self
            .client
            .post(self.url("/api/generate"))
            .timeout(self.cfg.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, self.cfg.request_timeout))?;
        let resp = check_status(resp).await?;

        let parsed: GenerateApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        let text = parsed.response.ok_or_else(|| {
            ProviderError::MalformedResponse("missing `response` field".to_string())
        })?;

        Ok(GenerateResponse {
            text: text.trim().to_string(),
        })
    }

    async fn ensure_ready(&self) -> Result<(), ProviderError> {
        let models = self.installed_models().await?;
        if models.iter().any(|m| model_matches(m, &self.cfg.model)) {
            return Ok(());
        }
        warn!(model = %self.cfg.model, "model not installed");
        self.pull_model().await
    }
}

fn request_error(e: reqwest::Error, limit: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(limit.as_secs())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}

async fn check_status(resp: Response) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_model_matches_latest() {
        assert!(model_matches("llama3.2:latest", "llama3.2"));
        assert!(model_matches("gemma3:4b", "gemma3:4b"));
        assert!(!model_matches("gemma3:12b", "gemma3:4b"));
        assert!(!model_matches("gemma3:4b", "gemma3"));
    }

    #[test]
    fn generate_body_has_wire_shape() {
        let body = GenerateRequest {
            model: "gemma3:4b",
            prompt: "hi",
            stream: false,
            options: GenerateOptions {
                num_predict: 30,
                temperature: 0.1,
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "gemma3:4b");
        assert_eq!(v["stream"], false);
        assert_eq!(v["options"]["num_predict"], 30);
        assert!(v["options"]["temperature"].as_f64().unwrap() > 0.09);
    }

    #[test]
    fn tags_response_tolerates_extra_fields() {
        let raw = r#"{"models":[{"name":"gemma3:4b","size":123,"digest":"abc"}]}"#;
        let parsed: TagsApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.models[0].name, "gemma3:4b");
    }

    #[tokio::test]
    async fn unreachable_backend_is_request_failure() {
        let provider = OllamaProvider::new(OllamaConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gemma3:4b".to_string(),
            request_timeout: Duration::from_secs(2),
        });
        let err = provider
            .generate("hello", GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RequestFailed(_) | ProviderError::Timeout(_)
        ));
    }
}
