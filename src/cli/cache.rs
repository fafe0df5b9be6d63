//! Cache management commands

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::cache::SqliteCache;
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::Result;
use crate::remote::ResourceKind;

fn cache_dir(opts: &GlobalOptions) -> Result<PathBuf> {
    Config::load_at(opts.config_ref())?.cache_dir()
}

fn open(opts: &GlobalOptions) -> Result<SqliteCache> {
    Ok(SqliteCache::open_at(&cache_dir(opts)?)?)
}

/// Show cache status/statistics
pub fn status(opts: &GlobalOptions) -> Result<()> {
    let cache = open(opts)?;
    let stats = cache.stats()?;
    let path = cache.dir().display().to_string();

    match opts.format {
        OutputFormat::Json => {
            let by_kind: serde_json::Map<String, serde_json::Value> = stats
                .valid_by_kind
                .iter()
                .map(|(kind, count)| (kind.clone(), (*count).into()))
                .collect();
            let json = serde_json::json!({
                "total_entries": stats.total_entries,
                "valid_entries": stats.valid_entries,
                "expired_entries": stats.expired_entries,
                "valid_by_kind": by_kind,
                "total_size_bytes": stats.total_size_bytes,
                "total_size_human": format_size(stats.total_size_bytes),
                "oldest_entry_timestamp": stats.oldest_entry,
                "newest_entry_timestamp": stats.newest_entry,
                "path": path,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Table => {
            println!("Cache Status");
            println!("────────────────────────────────────────");
            println!("Location:       {}", path);
            println!("Valid entries:  {}", stats.valid_entries);
            for (kind, count) in &stats.valid_by_kind {
                println!("  {:<13} {}", kind, count);
            }
            println!("Expired:        {}", stats.expired_entries);
            println!("Total size:     {}", format_size(stats.total_size_bytes));

            if let Some(oldest) = stats.oldest_entry {
                println!("Oldest entry:   {}", format_local(oldest));
            }
            if let Some(newest) = stats.newest_entry {
                println!("Newest entry:   {}", format_local(newest));
            }
        }
    }

    Ok(())
}

/// Clear all cache entries, or only those of one kind
pub fn clear(opts: &GlobalOptions, kind: Option<ResourceKind>) -> Result<()> {
    let cache = open(opts)?;
    let stats = match kind {
        Some(kind) => cache.delete_by_kind(kind)?,
        None => cache.clear_all()?,
    };

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entries_removed": stats.entries_removed,
                "kind": kind,
                "success": true,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Table => {
            if stats.entries_removed > 0 {
                println!("Cleared {} cache entries", stats.entries_removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path
pub fn path(opts: &GlobalOptions) -> Result<()> {
    println!("{}", cache_dir(opts)?.display());
    Ok(())
}

fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Format bytes as human-readable size
fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
