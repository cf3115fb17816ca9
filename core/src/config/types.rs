use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,

    #[serde(default)]
    pub events_out: EventsOutConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum ModelConfig {
    #[serde(rename = "openai")]
    OpenAi(OpenAiModelConfig),
    #[serde(rename = "replay")]
    Replay(ReplayModelConfig),
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::OpenAi(OpenAiModelConfig::default())
    }
}

impl ModelConfig {
    pub fn artifact_model(&self) -> &str {
        match self {
            ModelConfig::OpenAi(c) => &c.artifact_model,
            ModelConfig::Replay(_) => "replay",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiModelConfig {
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_artifact_model")]
    pub artifact_model: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_artifact_model() -> String {
    "gpt-4o".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for OpenAiModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            api_key: String::new(),
            artifact_model: default_artifact_model(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Replays a recorded JSONL delta file instead of calling a model.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplayModelConfig {
    pub events_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Upper bound on the wait for each delta. 0 disables the bound.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default)]
    pub drop_when_full: bool,

    #[serde(default = "default_smoothing")]
    pub smoothing: bool,

    #[serde(default = "default_smoothing_delay_ms")]
    pub smoothing_delay_ms: u64,
}

fn default_idle_timeout_ms() -> u64 {
    60_000
}

fn default_channel_capacity() -> usize {
    256
}

fn default_smoothing() -> bool {
    true
}

fn default_smoothing_delay_ms() -> u64 {
    10
}

impl StreamConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }

    pub fn smoothing_delay(&self) -> Duration {
        Duration::from_millis(self.smoothing_delay_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
            channel_capacity: default_channel_capacity(),
            drop_when_full: false,
            smoothing: default_smoothing(),
            smoothing_delay_ms: default_smoothing_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum StoreConfig {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "file")]
    File(FileStoreConfig),
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File(FileStoreConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStoreConfig {
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

fn default_store_dir() -> String {
    "~/.docstream/documents".to_string()
}

impl FileStoreConfig {
    /// `dir` with `~` and `$VARS` expanded.
    pub fn resolved_dir(&self) -> std::path::PathBuf {
        match shellexpand::full(&self.dir) {
            Ok(expanded) => std::path::PathBuf::from(expanded.as_ref()),
            Err(_) => std::path::PathBuf::from(shellexpand::tilde(&self.dir).as_ref()),
        }
    }
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsOutConfig {
    #[serde(default)]
    pub enabled: bool,
    /// A file path, or `stdout:`.
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_events_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_drop_when_full")]
    pub drop_when_full: bool,
}

fn default_events_channel_capacity() -> usize {
    2048
}

fn default_drop_when_full() -> bool {
    true
}

impl Default for EventsOutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: String::new(),
            channel_capacity: default_events_channel_capacity(),
            drop_when_full: default_drop_when_full(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write daily-rolling log files here when set.
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}
