//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod args;
pub mod cache;
pub mod context;
pub mod init;
pub mod manga;
pub mod status;

pub use args::OutputFormat;
pub use context::CommandContext;

use crate::remote::ResourceKind;

/// mangarelay - cached, fail-open client for a remote manga content API
#[derive(Parser, Debug)]
#[command(name = "mangarelay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table)
    #[arg(
        long,
        global = true,
        env = "MANGARELAY_FORMAT",
        default_value = "json",
        hide_env = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "MANGARELAY_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the upstream API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "MANGARELAY_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Bypass cache, fetch fresh data from the upstream
    #[arg(long, global = true, env = "MANGARELAY_NO_CACHE", hide_env = true)]
    pub no_cache: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize mangarelay configuration
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration and cache status
    Status,

    /// Display version information
    Version,

    /// List titles, one page at a time
    List {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },

    /// Show one title
    Get {
        /// Title ID
        id: String,
    },

    /// Show the pages of a chapter
    Chapter {
        /// Chapter ID
        chapter_id: String,
    },

    /// Show a title's detail page
    Detail {
        /// Title slug, e.g. "solo-leveling"
        slug: String,
    },

    /// Show the reader page of a chapter
    Read {
        /// Title slug
        slug: String,

        /// Chapter number or slug
        chapter: String,
    },

    /// List all genres
    Genres,

    /// List titles in a genre
    Genre {
        /// Genre slug, e.g. "action"
        slug: String,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },

    /// Search titles
    Search {
        query: String,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },

    /// Browse the library
    Catalog {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },

    /// Popular manga, manhwa and manhua
    Popular,

    /// Latest updates
    Latest,

    /// Popular, genres and latest in one call
    Home,

    /// Manage local response cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,

    /// Clear cached responses
    Clear {
        /// Only clear one resource kind (e.g. list, item, genre-page)
        #[arg(long)]
        kind: Option<ResourceKind>,
    },

    /// Print cache directory path
    Path,
}
