//! Command execution context
//!
//! Loads config and wires the HTTP client, cache and resource service
//! together for the resource commands.

use std::sync::Arc;

use log::{debug, warn};

use crate::cache::{CacheStore, MemoryCache, SqliteCache};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::HttpFetchClient;
use crate::config::{CacheBackend, Config};
use crate::error::Result;
use crate::remote::RemoteResourceService;

/// Context for command execution containing the service and runtime options.
pub struct CommandContext {
    /// Cached resource service over the upstream
    pub service: RemoteResourceService<HttpFetchClient>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// # Errors
    /// Returns error if config cannot be loaded or the base URL is unusable.
    /// A cache that cannot be opened is logged and skipped.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Config::load_at(opts.config_ref())?;

        let base_url = config.base_url(opts.base_url_ref());
        debug!("Upstream base URL: {}", base_url);
        let client = HttpFetchClient::new(&base_url, config.http_client_config())?;

        let cache = if opts.no_cache {
            None
        } else {
            open_cache(&config)
        };

        let service = RemoteResourceService::new(client, cache).with_ttl_policy(config.ttl_policy());
        if !service.is_caching() {
            debug!("Running without a response cache");
        }

        Ok(Self {
            service,
            format: opts.format,
        })
    }
}

/// Open the configured cache store, or `None` if it is unavailable.
fn open_cache(config: &Config) -> Option<Arc<dyn CacheStore>> {
    match config.cache.backend {
        CacheBackend::Memory => {
            let cache = match config.cache.max_entries {
                Some(max) => MemoryCache::with_capacity(max),
                None => MemoryCache::new(),
            };
            Some(Arc::new(cache))
        }
        CacheBackend::Sqlite => {
            let opened = config
                .cache_dir()
                .and_then(|dir| Ok(SqliteCache::open_at(&dir)?));
            match opened {
                Ok(cache) => Some(Arc::new(cache)),
                Err(e) => {
                    warn!("Cache unavailable, continuing without it: {}", e);
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn opts_with_config(dir: &TempDir, contents: &str) -> GlobalOptions {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, contents).unwrap();
        GlobalOptions {
            config: Some(path.display().to_string()),
            ..GlobalOptions::default()
        }
    }

    #[test]
    fn test_context_with_memory_cache() {
        let dir = TempDir::new().unwrap();
        let opts = opts_with_config(
            &dir,
            "base_url: http://127.0.0.1:9\ncache:\n  backend: memory\n",
        );

        let ctx = CommandContext::new(&opts).unwrap();
        assert!(ctx.service.is_caching());
        assert_eq!(ctx.service.api().base_url().as_str(), "http://127.0.0.1:9/");
    }

    #[test]
    fn test_context_with_sqlite_cache_dir_from_config() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("cache");
        let opts = opts_with_config(
            &dir,
            &format!("cache:\n  dir: {}\n", cache_dir.display()),
        );

        let ctx = CommandContext::new(&opts).unwrap();
        assert!(ctx.service.is_caching());
        assert!(cache_dir.join("cache.db").exists());
    }

    #[test]
    fn test_context_no_cache() {
        let dir = TempDir::new().unwrap();
        let mut opts = opts_with_config(&dir, "cache:\n  backend: memory\n");
        opts.no_cache = true;

        let ctx = CommandContext::new(&opts).unwrap();
        assert!(!ctx.service.is_caching());
    }

    #[test]
    fn test_context_base_url_flag_wins() {
        let dir = TempDir::new().unwrap();
        let mut opts = opts_with_config(
            &dir,
            "base_url: http://file.invalid\ncache:\n  backend: memory\n",
        );
        opts.base_url = Some("http://flag.invalid".to_string());

        let ctx = CommandContext::new(&opts).unwrap();
        assert_eq!(ctx.service.api().base_url().host_str(), Some("flag.invalid"));
    }

    #[test]
    fn test_context_rejects_bad_base_url() {
        let dir = TempDir::new().unwrap();
        let mut opts = opts_with_config(&dir, "cache:\n  backend: memory\n");
        opts.base_url = Some("not a url".to_string());

        assert!(CommandContext::new(&opts).is_err());
    }
}
