use std::path::Path;

use anyhow::Context;

use super::types::{AppConfig, FileStoreConfig, ModelConfig, StoreConfig};

/// Loads `config.toml` from the working directory when present, otherwise
/// defaults, then applies environment overrides.
pub fn load_default() -> anyhow::Result<AppConfig> {
    let cfg = if Path::new("config.toml").exists() {
        read_file(Path::new("config.toml"))?
    } else {
        AppConfig::default()
    };
    Ok(apply_env_overrides(cfg))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let cfg = read_file(path)?;
    Ok(apply_env_overrides(cfg))
}

fn read_file(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn apply_env_overrides(mut cfg: AppConfig) -> AppConfig {
    if let ModelConfig::OpenAi(ref mut model) = cfg.model {
        if let Some(v) = env_value("DOCSTREAM_MODEL_BASE_URL") {
            model.base_url = v;
        }
        if let Some(v) = env_value("DOCSTREAM_MODEL_API_KEY") {
            model.api_key = v;
        }
    }

    if let Some(dir) = env_value("DOCSTREAM_STORE_DIR") {
        match cfg.store {
            StoreConfig::File(ref mut file) => file.dir = dir,
            StoreConfig::Memory => cfg.store = StoreConfig::File(FileStoreConfig { dir }),
        }
    }

    cfg
}
