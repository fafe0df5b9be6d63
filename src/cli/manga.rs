//! Resource commands
//!
//! These always print a usable value: upstream failures are logged and
//! rendered as the empty result for the command.

use crate::cli::Commands;
use crate::cli::args::GlobalOptions;
use crate::cli::CommandContext;
use crate::error::{Error, Result};
use crate::output;

/// Run one resource command and print its result.
pub async fn run(opts: &GlobalOptions, command: &Commands) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let service = &ctx.service;

    let value = match command {
        Commands::List { page } => service.list(*page).await,
        Commands::Get { id } => service.get(id).await,
        Commands::Chapter { chapter_id } => service.get_chapter(chapter_id).await,
        Commands::Detail { slug } => service.detail(slug).await,
        Commands::Read { slug, chapter } => service.read_chapter(slug, chapter).await,
        Commands::Genres => service.genres().await,
        Commands::Genre { slug, page } => service.genre(slug, *page).await,
        Commands::Search { query, page } => service.search(query, *page).await,
        Commands::Catalog { page } => service.catalog(*page).await,
        Commands::Popular => service.popular().await,
        Commands::Latest => service.latest().await,
        Commands::Home => return output::print(&service.home().await, ctx.format),
        other => {
            return Err(Error::Other(format!("{:?} is not a resource command", other)));
        }
    };

    output::print(&value, ctx.format)
}
