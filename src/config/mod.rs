//! Configuration management for mangarelay

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{SqliteCache, TtlPolicy};
use crate::client::HttpClientConfig;
use crate::client::rate_limit::DEFAULT_RATE_PER_SECOND;
use crate::error::{ConfigError, Result};
use crate::remote::ResourceKind;

/// Upstream used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "https://example.com";

/// Base URL environment variables, highest priority first
pub const BASE_URL_ENV_VARS: &[&str] = &["MANGARELAY_BASE_URL", "REMOTE_API_BASE"];

/// Cache directory override
pub const CACHE_DIR_ENV_VAR: &str = "MANGARELAY_CACHE_DIR";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upstream content API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Upstream request policy
    #[serde(default)]
    pub http: HttpSettings,

    /// Response cache settings
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Retry, timeout and throttling for upstream requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Attempts after the first one
    pub retries: u32,
    /// Pause between attempts in milliseconds
    pub backoff_ms: u64,
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Request rate once the upstream has throttled us
    pub rate_limit_per_second: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let defaults = HttpClientConfig::default();
        Self {
            retries: defaults.retries,
            backoff_ms: defaults.backoff.as_millis() as u64,
            timeout_secs: defaults.timeout.as_secs(),
            rate_limit_per_second: DEFAULT_RATE_PER_SECOND,
        }
    }
}

/// Where cached responses live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// SQLite file shared across runs
    #[default]
    Sqlite,
    /// Process memory only
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,

    /// SQLite cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Entry limit for the memory backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,

    /// TTL overrides in seconds, keyed by resource kind
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub ttl: HashMap<ResourceKind, u64>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".mangarelay").join("config.yaml"))
    }

    /// Resolve the config path: explicit path or the default location
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an optional custom path
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::resolve_path(path)?)
    }

    /// Load configuration from a specific path. A missing file yields
    /// defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, contents)?;

        // Set file permissions to 600 on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Reject values no request could work with.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref base_url) = self.base_url
            && base_url.trim().is_empty()
        {
            return Err(ConfigError::Invalid("base_url is empty".to_string()).into());
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.timeout_secs must be positive".to_string()).into());
        }
        if self.cache.max_entries == Some(0) {
            return Err(ConfigError::Invalid("cache.max_entries must be positive".to_string()).into());
        }
        Ok(())
    }

    /// Effective base URL: flag, then environment, then file, then default.
    pub fn base_url(&self, flag: Option<&str>) -> String {
        self.base_url_with(flag, |name| std::env::var(name).ok())
    }

    fn base_url_with(&self, flag: Option<&str>, env: impl Fn(&str) -> Option<String>) -> String {
        flag.map(str::to_string)
            .or_else(|| {
                BASE_URL_ENV_VARS
                    .iter()
                    .find_map(|name| env(name).filter(|v| !v.trim().is_empty()))
            })
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Effective SQLite cache directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        self.cache_dir_with(|name| std::env::var(name).ok())
    }

    fn cache_dir_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
        if let Some(dir) = env(CACHE_DIR_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        if let Some(ref dir) = self.cache.dir {
            return Ok(dir.clone());
        }
        Ok(SqliteCache::cache_dir()?)
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            retries: self.http.retries,
            backoff: Duration::from_millis(self.http.backoff_ms),
            rate_limit_per_second: self.http.rate_limit_per_second,
        }
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        self.cache
            .ttl
            .iter()
            .fold(TtlPolicy::new(), |policy, (kind, secs)| {
                policy.with(*kind, Duration::from_secs(*secs))
            })
    }
}
