#![allow(dead_code)]

use library_core::config::AppConfig;
use library_core::notifier::Notifier;
use library_core::Organizer;
use providers::{GenerateOptions, GenerateResponse, LlmProvider, ProviderError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers categorization prompts with `category` and naming prompts with
/// `name`, counting each kind.
pub struct ScriptedProvider {
    pub category: String,
    pub name: String,
    pub delay: Option<Duration>,
    pub category_calls: AtomicUsize,
    pub rename_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            delay: None,
            category_calls: AtomicUsize::new(0),
            rename_calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn category_calls(&self) -> usize {
        self.category_calls.load(Ordering::SeqCst)
    }

    pub fn rename_calls(&self) -> usize {
        self.rename_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(
        &self,
        prompt: &str,
        _options: GenerateOptions,
    ) -> Result<GenerateResponse, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let text = if prompt.starts_with("Analyze this file") {
            self.category_calls.fetch_add(1, Ordering::SeqCst);
            self.category.clone()
        } else {
            self.rename_calls.fetch_add(1, Ordering::SeqCst);
            self.name.clone()
        };
        Ok(GenerateResponse { text })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str, subtitle: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string(), subtitle.to_string()));
    }
}

pub fn test_config(watch_root: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.watch.path = Some(watch_root.to_path_buf());
    cfg.notifications.enabled = true;
    cfg.monitor.debounce_ms = 50;
    cfg.monitor.poll_interval_ms = 20;
    cfg
}

pub fn organizer_with(
    cfg: AppConfig,
    provider: Arc<dyn LlmProvider>,
    notifier: Arc<dyn Notifier>,
) -> Organizer {
    Organizer::new(cfg, provider, notifier).unwrap()
}
