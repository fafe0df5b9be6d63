//! Status command implementation

use colored::Colorize;

use crate::cache::TtlPolicy;
use crate::cli::args::GlobalOptions;
use crate::config::{BASE_URL_ENV_VARS, CacheBackend, Config};
use crate::error::Result;
use crate::remote::ResourceKind;

/// Run the status command to display the resolved configuration
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "mangarelay Configuration Status".bold());

    let config_path = Config::resolve_path(opts.config_ref())?;
    if config_path.exists() {
        println!("Config file: {}", config_path.display().to_string().cyan());
    } else {
        println!(
            "{} No config file at {} (using defaults)",
            "○".dimmed(),
            config_path.display()
        );
        println!("  → Run '{}' to create one", "mangarelay init".cyan());
    }

    let config = match Config::load_at(opts.config_ref()) {
        Ok(config) => config,
        Err(e) => {
            println!("{} Configuration invalid: {}", "✗".red(), e);
            println!();
            return Ok(());
        }
    };

    println!();

    // Upstream
    let base_url = config.base_url(opts.base_url_ref());
    let source = if opts.base_url.is_some() {
        "--base-url".to_string()
    } else if let Some(var) = BASE_URL_ENV_VARS
        .iter()
        .find(|v| std::env::var(v).is_ok_and(|s| !s.trim().is_empty()))
    {
        format!("${}", var)
    } else if config.base_url.is_some() {
        "config file".to_string()
    } else {
        "default".to_string()
    };
    println!(
        "{} Upstream: {} {}",
        "✓".green(),
        base_url.cyan(),
        format!("({})", source).dimmed()
    );
    println!(
        "{} Requests: {} retries, {}ms backoff, {}s timeout",
        "✓".green(),
        config.http.retries,
        config.http.backoff_ms,
        config.http.timeout_secs
    );

    // Cache
    if opts.no_cache {
        println!("{} Cache disabled (--no-cache)", "⚠".yellow());
    } else {
        match config.cache.backend {
            CacheBackend::Memory => {
                println!("{} Cache: memory (per process)", "○".dimmed());
            }
            CacheBackend::Sqlite => match config.cache_dir() {
                Ok(dir) => println!("{} Cache: sqlite at {}", "✓".green(), dir.display()),
                Err(e) => println!("{} Cache directory unavailable: {}", "✗".red(), e),
            },
        }
    }

    // TTL overrides only
    let policy = config.ttl_policy();
    for kind in ResourceKind::ALL {
        let ttl = policy.ttl_for(kind);
        if ttl != TtlPolicy::default_for(kind) {
            println!("  TTL {}: {}s", kind, ttl.as_secs());
        }
    }

    println!();
    Ok(())
}
