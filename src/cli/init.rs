//! Init command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::{ConfigError, Result};

/// Run the init command
///
/// Writes a config file holding the defaults, with `--base-url` applied if
/// given. Refuses to overwrite an existing file unless `force` is set.
pub fn run(opts: &GlobalOptions, force: bool) -> Result<()> {
    let path = Config::resolve_path(opts.config_ref())?;

    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.display().to_string()).into());
    }

    let config = Config {
        base_url: opts.base_url.clone(),
        ..Config::default()
    };
    config.validate()?;
    config.save_to(&path)?;

    println!(
        "{} Configuration saved to: {}",
        "✓".green(),
        path.display()
    );
    if let Some(ref base_url) = config.base_url {
        println!("  Upstream: {}", base_url.bold());
    }

    println!("\n{}", "Try running:".bold());
    println!("  {} - Show configuration status", "mangarelay status".cyan());
    println!("  {} - Latest updates", "mangarelay latest".cyan());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn opts(path: &std::path::Path) -> GlobalOptions {
        GlobalOptions {
            config: Some(path.display().to_string()),
            ..GlobalOptions::default()
        }
    }

    #[test]
    fn test_init_writes_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut opts = opts(&path);
        opts.base_url = Some("https://manga.example".to_string());

        run(&opts, false).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://manga.example"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "base_url: https://keep.example\n").unwrap();

        let err = run(&opts(&path), false).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::AlreadyExists(_))
        ));

        run(&opts(&path), true).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert!(config.base_url.is_none());
    }
}
