//! JSON envelope for resource commands

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use crate::remote::{Origin, Resolved};

/// `{ "data": ..., "meta": ... }` as printed by the resource commands.
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Metadata,
}

/// Provenance of the printed data.
#[derive(Debug, Serialize)]
pub struct Metadata {
    /// Command-level resource name, e.g. `item` or `home`
    pub resource: String,

    /// Origin of each part of `data`, keyed by resource kind
    pub sources: BTreeMap<&'static str, Origin>,

    /// True when any part of `data` is an empty default standing in for a
    /// failed upstream fetch
    pub fallback: bool,

    pub timestamp: String,
    pub version: String,
}

impl<T: Serialize> JsonOutput<T> {
    /// Wrap `data`, assembled from `parts`.
    pub fn new(resource: &str, data: T, parts: &[&Resolved]) -> Self {
        Self {
            data,
            meta: Metadata {
                resource: resource.to_string(),
                sources: parts.iter().map(|p| (p.kind.as_str(), p.origin)).collect(),
                fallback: parts.iter().any(|p| p.is_fallback()),
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn to_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{Normalized, ResourceKind};
    use serde_json::{Value, json};

    fn resolved(kind: ResourceKind, origin: Origin) -> Resolved {
        Resolved {
            kind,
            origin,
            value: Normalized::empty(kind),
        }
    }

    #[test]
    fn test_meta_names_resource_and_origin() {
        let item = resolved(ResourceKind::Item, Origin::Cache);
        let out = JsonOutput::new("item", &item.value, &[&item]);

        let parsed: Value = serde_json::from_str(&out.to_pretty().unwrap()).unwrap();
        assert_eq!(parsed["data"], json!({}));
        assert_eq!(parsed["meta"]["resource"], "item");
        assert_eq!(parsed["meta"]["sources"], json!({"item": "cache"}));
        assert_eq!(parsed["meta"]["fallback"], false);
        assert_eq!(parsed["meta"]["version"], env!("CARGO_PKG_VERSION"));
        assert!(parsed["meta"]["timestamp"].as_str().is_some());
    }

    #[test]
    fn test_any_fallback_part_flags_the_output() {
        let genres = resolved(ResourceKind::Genres, Origin::Upstream);
        let latest = resolved(ResourceKind::Latest, Origin::Fallback);

        let out = JsonOutput::new("home", json!({}), &[&genres, &latest]);

        assert!(out.meta.fallback);
        assert_eq!(out.meta.sources.len(), 2);
        assert_eq!(out.meta.sources["latest"], Origin::Fallback);
    }

    #[test]
    fn test_no_parts_is_not_a_fallback() {
        let out = JsonOutput::new("list", Vec::<Value>::new(), &[]);
        assert!(!out.meta.fallback);
        assert!(out.to_pretty().unwrap().contains("\"data\": []"));
    }
}
