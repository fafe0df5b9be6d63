//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON format - `{data, meta}` envelope for scripts (default)
    #[default]
    Json,
    /// Table format - human-readable tables
    Table,
}
