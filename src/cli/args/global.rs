//! Global CLI options shared across all commands

use crate::cli::{Cli, OutputFormat};

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// For most options, the precedence is: CLI flag > environment variable > config file > default.
/// This struct captures the CLI/env layer; config file defaults are resolved later in
/// `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (json, table)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.mangarelay/config.yaml)
    pub config: Option<String>,

    /// Upstream base URL override
    pub base_url: Option<String>,

    /// Bypass cache and fetch fresh data from the upstream
    pub no_cache: bool,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            base_url: cli.base_url.clone(),
            no_cache: cli.no_cache,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Get base URL override as `Option<&str>`.
    pub fn base_url_ref(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}
