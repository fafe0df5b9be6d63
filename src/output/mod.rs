//! Output formatting for CLI results

use std::collections::BTreeMap;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::remote::{HomeFeed, Normalized, Resolved};

pub mod json;
pub mod table;

use json::JsonOutput;

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

impl Formattable for Resolved {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => {
                Ok(JsonOutput::new(self.kind.as_str(), &self.value, &[self]).to_pretty()?)
            }
            OutputFormat::Table => Ok(value_table(&self.value)),
        }
    }
}

impl Formattable for HomeFeed {
    fn format(&self, format: OutputFormat) -> Result<String> {
        let sections = self.sections();
        match format {
            OutputFormat::Json => {
                let data: BTreeMap<&str, &Normalized> = sections
                    .iter()
                    .map(|(name, part)| (*name, &part.value))
                    .collect();
                let parts = sections.map(|(_, part)| part);
                Ok(JsonOutput::new("home", data, &parts).to_pretty()?)
            }
            OutputFormat::Table => Ok(sections
                .iter()
                .map(|(name, part)| format!("== {} ==\n{}", name, value_table(&part.value)))
                .collect::<Vec<_>>()
                .join("\n\n")),
        }
    }
}

fn value_table(value: &Normalized) -> String {
    match value {
        Normalized::Items(items) => table::format_items(items),
        Normalized::Record(record) => table::format_record(record),
    }
}

/// Format and print data to stdout
pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{Origin, ResourceKind};
    use serde_json::{Value, json};

    fn resolved(kind: ResourceKind, origin: Origin, value: Normalized) -> Resolved {
        Resolved {
            kind,
            origin,
            value,
        }
    }

    #[test]
    fn test_resolved_json_is_wrapped() {
        let list = resolved(
            ResourceKind::List,
            Origin::Upstream,
            Normalized::Items(vec![json!({"id": "m1"})]),
        );
        let out = list.format(OutputFormat::Json).unwrap();

        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["data"], json!([{"id": "m1"}]));
        assert_eq!(parsed["meta"]["resource"], "list");
        assert_eq!(parsed["meta"]["sources"]["list"], "upstream");
    }

    #[test]
    fn test_fallback_record_json() {
        let item = resolved(
            ResourceKind::Item,
            Origin::Fallback,
            Normalized::empty(ResourceKind::Item),
        );
        let out = item.format(OutputFormat::Json).unwrap();

        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["data"], json!({}));
        assert_eq!(parsed["meta"]["fallback"], true);
    }

    #[test]
    fn test_home_feed_json_reports_each_section() {
        let feed = HomeFeed {
            popular: resolved(
                ResourceKind::Popular,
                Origin::Cache,
                Normalized::empty(ResourceKind::Popular),
            ),
            genres: resolved(
                ResourceKind::Genres,
                Origin::Upstream,
                Normalized::Items(vec![json!({"slug": "action"})]),
            ),
            latest: resolved(
                ResourceKind::Latest,
                Origin::Fallback,
                Normalized::Items(vec![]),
            ),
        };

        let parsed: Value =
            serde_json::from_str(&feed.format(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(parsed["data"]["genres"], json!([{"slug": "action"}]));
        assert_eq!(parsed["data"]["latest"], json!([]));
        assert_eq!(
            parsed["meta"]["sources"],
            json!({"genres": "upstream", "latest": "fallback", "popular": "cache"})
        );
        assert_eq!(parsed["meta"]["resource"], "home");
        assert_eq!(parsed["meta"]["fallback"], true);
    }

    #[test]
    fn test_home_feed_table_has_all_sections() {
        let feed = HomeFeed {
            popular: resolved(
                ResourceKind::Popular,
                Origin::Upstream,
                Normalized::Record(Default::default()),
            ),
            genres: resolved(
                ResourceKind::Genres,
                Origin::Upstream,
                Normalized::Items(vec![json!({"slug": "action"})]),
            ),
            latest: resolved(ResourceKind::Latest, Origin::Upstream, Normalized::Items(vec![])),
        };

        let out = feed.format(OutputFormat::Table).unwrap();
        assert!(out.contains("== popular =="));
        assert!(out.contains("action"));
        assert!(out.contains("== latest =="));
    }
}
