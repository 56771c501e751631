use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Environment variable overriding the concurrency bound.
pub const MAX_CONCURRENT_JOBS_ENV: &str = "UJM_MAX_CONCURRENT_JOBS";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of run attempts per job (including the first).
    pub max_runs: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_runs: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/ujm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UjmConfig {
    /// Maximum number of concurrently running upload jobs.
    pub max_concurrent_jobs: usize,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for UjmConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 10,
            retry: None,
        }
    }
}

impl UjmConfig {
    /// Retry policy from config, or built-in defaults when the section is absent.
    pub fn retry_policy(&self) -> RetryPolicy {
        match &self.retry {
            Some(r) => RetryPolicy {
                max_runs: r.max_runs.max(1),
                base_delay: Duration::from_secs_f64(r.base_delay_secs.max(0.0)),
                max_delay: Duration::from_secs(r.max_delay_secs),
            },
            None => RetryPolicy::default(),
        }
    }

    /// Applies `UJM_MAX_CONCURRENT_JOBS` when set to a positive integer;
    /// anything else is ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var(MAX_CONCURRENT_JOBS_ENV) {
            match v.parse::<usize>() {
                Ok(n) if n > 0 => self.max_concurrent_jobs = n,
                _ => tracing::warn!(value = %v, "ignoring invalid {}", MAX_CONCURRENT_JOBS_ENV),
            }
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ujm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
/// The environment override is applied after the file is read.
pub fn load_or_init() -> Result<UjmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let mut default_cfg = UjmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        default_cfg.apply_env();
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let mut cfg: UjmConfig = toml::from_str(&data)?;
    cfg.apply_env();
    Ok(cfg)
}
