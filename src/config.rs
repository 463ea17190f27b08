use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::query::{QueryOptions, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub queries: QueriesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Root of the REST API, e.g. "http://localhost:8000/api"
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Per-request timeout
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

/// Cache and retry settings shared by every page query
#[derive(Debug, Clone, Deserialize)]
pub struct QueriesConfig {
  #[serde(default = "default_stale_time_secs")]
  pub stale_time_secs: u64,
  #[serde(default = "default_gc_time_secs")]
  pub gc_time_secs: u64,
  /// Retries after the first failed attempt
  #[serde(default = "default_retry")]
  pub retry: u32,
  #[serde(default = "default_retry_delay_ms")]
  pub retry_delay_ms: u64,
  #[serde(default = "default_max_retry_delay_ms")]
  pub max_retry_delay_ms: u64,
}

impl Default for QueriesConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: default_stale_time_secs(),
      gc_time_secs: default_gc_time_secs(),
      retry: default_retry(),
      retry_delay_ms: default_retry_delay_ms(),
      max_retry_delay_ms: default_max_retry_delay_ms(),
    }
  }
}

impl QueriesConfig {
  pub fn query_options(&self) -> QueryOptions {
    QueryOptions {
      stale_time: Duration::from_secs(self.stale_time_secs),
      gc_time: Duration::from_secs(self.gc_time_secs),
      retry: RetryPolicy {
        max_retries: self.retry,
        base_delay: Duration::from_millis(self.retry_delay_ms),
        max_delay: Duration::from_millis(self.max_retry_delay_ms),
      },
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  10
}

fn default_stale_time_secs() -> u64 {
  5 * 60
}

fn default_gc_time_secs() -> u64 {
  10 * 60
}

fn default_retry() -> u32 {
  3
}

fn default_retry_delay_ms() -> u64 {
  1000
}

fn default_max_retry_delay_ms() -> u64 {
  30_000
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./maestro.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/maestro/config.yaml
  ///
  /// With no file found, the built-in defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("maestro.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("maestro").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file deserializes to null
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Check values that serde cannot
  pub fn validate(&self) -> Result<()> {
    let url = url::Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url {}: {}", self.api.base_url, e))?;
    if !matches!(url.scheme(), "http" | "https") {
      return Err(eyre!(
        "api.base_url must be an http(s) URL, got {}",
        self.api.base_url
      ));
    }
    if self.queries.retry_delay_ms > self.queries.max_retry_delay_ms {
      return Err(eyre!(
        "queries.retry_delay_ms ({}) exceeds queries.max_retry_delay_ms ({})",
        self.queries.retry_delay_ms,
        self.queries.max_retry_delay_ms
      ));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);

    let options = config.queries.query_options();
    assert_eq!(options.stale_time, Duration::from_millis(300_000));
    assert_eq!(options.gc_time, Duration::from_millis(600_000));
    assert_eq!(options.retry.max_retries, 3);
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let config = Config::parse("api:\n  base_url: https://catalog.example.com/api\n").unwrap();
    assert_eq!(config.api.base_url, "https://catalog.example.com/api");
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.queries.stale_time_secs, 300);
  }

  #[test]
  fn test_empty_file() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.queries.retry, 3);
  }

  #[test]
  fn test_invalid_base_url_rejected() {
    let config = Config::parse("api:\n  base_url: not a url\n").unwrap();
    assert!(config.validate().is_err());

    let config = Config::parse("api:\n  base_url: ftp://example.com\n").unwrap();
    assert!(config.validate().is_err());
  }
}
