use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREFIX: &str = "AI_LIBRARY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watch: WatchConfig,
    pub inference: InferenceConfig,
    pub sampler: SamplerConfig,
    pub cache: CacheConfig,
    pub monitor: MonitorConfig,
    pub notifications: NotificationConfig,
    pub safety: SafetyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory to organize; the CLI fills in the Downloads folder when unset.
    pub path: Option<PathBuf>,
    pub library_name: String,
    pub manual_library_name: String,
    /// Glob patterns matched against entry names; matches are never touched.
    pub exclude: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            path: None,
            library_name: "AI Library".to_string(),
            manual_library_name: "Manual Library".to_string(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "gemma3:4b".to_string(),
            timeout_secs: 25,
            temperature: 0.1,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub max_content_chars: usize,
    pub large_file_bytes: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 1500,
            large_file_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_size: 500 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    /// Stray folders are swept every this many ticks.
    pub folder_sweep_every: u32,
    pub native_events: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            debounce_ms: 1000,
            folder_sweep_every: 10,
            native_events: false,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: cfg!(target_os = "macos"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub dry_run: bool,
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("watch.exclude"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
