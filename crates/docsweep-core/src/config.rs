use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SweepError;
use crate::template::UrlTemplate;

/// Transient-error retry parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per id (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 1.0 = one second).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

/// Static request headers sent with every GET.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36"
                .to_string(),
            accept: "application/pdf,text/html,application/xhtml+xml".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

/// Configuration loaded from `~/.config/docsweep/config.toml`.
///
/// Immutable once a run starts; CLI flags are applied on a copy before that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Target URL with a single `{id}` placeholder.
    pub url_template: String,
    /// Where `<id>.pdf` artifacts are written.
    pub download_dir: PathBuf,
    /// Where the audit log and run summary are written.
    pub data_dir: PathBuf,
    /// Politeness delay between consecutive requests, in seconds.
    pub delay_secs: f64,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Consecutive auth-required results that halt the run.
    pub auth_failure_threshold: u32,
    /// Report progress every N processed ids.
    pub progress_every: u64,
    /// Attempts per artifact write before the run is aborted.
    pub persist_attempts: u32,
    /// Optional cookie file (TOML, see `cookies` module).
    #[serde(default)]
    pub cookie_file: Option<PathBuf>,
    #[serde(default)]
    pub headers: HeaderConfig,
    /// Optional transient retry; if missing, each id gets a single attempt.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            url_template:
                "https://www.halapp.com/a/wcb/document/?for_type=customer_invoice&for_id={id}"
                    .to_string(),
            download_dir: PathBuf::from("invoices"),
            data_dir: PathBuf::from("data"),
            delay_secs: 0.5,
            timeout_secs: 30,
            connect_timeout_secs: 15,
            auth_failure_threshold: 3,
            progress_every: 100,
            persist_attempts: 3,
            cookie_file: None,
            headers: HeaderConfig::default(),
            retry: None,
        }
    }
}

impl SweepConfig {
    /// Check value ranges and parse the URL template.
    pub fn validate(&self) -> Result<UrlTemplate, SweepError> {
        if !self.delay_secs.is_finite() || self.delay_secs < 0.0 {
            return Err(SweepError::Config(format!(
                "delay_secs must be a non-negative number, got {}",
                self.delay_secs
            )));
        }
        if self.timeout_secs == 0 {
            return Err(SweepError::Config("timeout_secs must be at least 1".into()));
        }
        if self.auth_failure_threshold == 0 {
            return Err(SweepError::Config(
                "auth_failure_threshold must be at least 1".into(),
            ));
        }
        if self.progress_every == 0 {
            return Err(SweepError::Config("progress_every must be at least 1".into()));
        }
        if self.persist_attempts == 0 {
            return Err(SweepError::Config("persist_attempts must be at least 1".into()));
        }
        if let Some(retry) = &self.retry {
            if !retry.base_delay_secs.is_finite() || retry.base_delay_secs < 0.0 {
                return Err(SweepError::Config(
                    "retry.base_delay_secs must be a non-negative number".into(),
                ));
            }
        }
        UrlTemplate::parse(&self.url_template)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("docsweep")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SweepConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SweepConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<SweepConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: SweepConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
