//! mangarelay - cached, fail-open client for a remote manga content API

use clap::Parser;

mod cache;
mod cli;
mod client;
mod config;
mod error;
mod output;
mod remote;

use cli::args::GlobalOptions;
use cli::{CacheCommands, Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins over the default filter
    let default_filter = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init { force } => cli::init::run(&opts, force),
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("mangarelay version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(&opts),
            CacheCommands::Clear { kind } => cli::cache::clear(&opts, kind),
            CacheCommands::Path => cli::cache::path(&opts),
        },
        ref command => cli::manga::run(&opts, command).await,
    }
}
