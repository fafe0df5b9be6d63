//! Remote manga resources
//!
//! Describes what can be requested from the upstream content API, how each
//! kind of response is shaped, and the service that fetches, normalizes and
//! caches them.

pub mod failure;
pub mod normalize;
pub mod service;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use failure::{FailureSink, FetchFailure, LogFailureSink};
pub use normalize::{Normalized, normalize};
pub use service::{HomeFeed, Origin, RemoteResourceService, Resolved};

/// The request shapes the relay knows how to fetch and cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// One page of the catalog listing
    List,
    /// A single title by ID
    Item,
    /// Pages of one chapter
    Chapter,
    /// A title's detail page by slug
    Detail,
    /// A chapter's reader page by title slug and chapter
    ReadChapter,
    /// All genres
    Genres,
    /// One page of titles in a genre
    GenrePage,
    /// Search results page
    Search,
    /// One page of the library ("pustaka")
    Catalog,
    /// Popular titles grouped by format
    Popular,
    /// Latest updates
    Latest,
}

/// How a kind's payload is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A list of records
    Sequence,
    /// A single record
    Record,
    /// A page of records with paging metadata
    Page,
    /// Named lists of records
    Sections(&'static [&'static str]),
}

/// Sections returned by the popular endpoint.
pub const POPULAR_SECTIONS: &[&str] = &["manga", "manhwa", "manhua"];

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::List,
        ResourceKind::Item,
        ResourceKind::Chapter,
        ResourceKind::Detail,
        ResourceKind::ReadChapter,
        ResourceKind::Genres,
        ResourceKind::GenrePage,
        ResourceKind::Search,
        ResourceKind::Catalog,
        ResourceKind::Popular,
        ResourceKind::Latest,
    ];

    /// Stable name used in cache keys, logs and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::List => "list",
            ResourceKind::Item => "item",
            ResourceKind::Chapter => "chapter",
            ResourceKind::Detail => "detail",
            ResourceKind::ReadChapter => "read_chapter",
            ResourceKind::Genres => "genres",
            ResourceKind::GenrePage => "genre_page",
            ResourceKind::Search => "search",
            ResourceKind::Catalog => "catalog",
            ResourceKind::Popular => "popular",
            ResourceKind::Latest => "latest",
        }
    }

    /// Upstream path relative to the base URL.
    ///
    /// `{name}` segments are filled from the request params; every other
    /// param goes to the query string.
    pub fn path_template(&self) -> &'static str {
        match self {
            ResourceKind::List => "api/v1/manga",
            ResourceKind::Item => "api/v1/manga/{id}",
            ResourceKind::Chapter => "api/v1/manga/chapter/{chapter_id}",
            ResourceKind::Detail => "detail-komik/{slug}",
            ResourceKind::ReadChapter => "baca-chapter/{slug}/{chapter}",
            ResourceKind::Genres => "genre-all",
            ResourceKind::GenrePage => "genre/{slug}/{page}",
            ResourceKind::Search => "search",
            ResourceKind::Catalog => "pustaka/{page}",
            ResourceKind::Popular => "komik-populer",
            ResourceKind::Latest => "terbaru-2",
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            ResourceKind::Item | ResourceKind::Detail | ResourceKind::ReadChapter => {
                Shape::Record
            }
            ResourceKind::GenrePage => Shape::Page,
            ResourceKind::Popular => Shape::Sections(POPULAR_SECTIONS),
            ResourceKind::List
            | ResourceKind::Chapter
            | ResourceKind::Genres
            | ResourceKind::Search
            | ResourceKind::Catalog
            | ResourceKind::Latest => Shape::Sequence,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown resource kind '{}'", s))
    }
}

/// Request parameters, kept in sorted key order.
///
/// Two params built from the same pairs in any order compare equal and
/// render identically, which is what makes them usable in cache keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Pairs in canonical (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
impl RequestParams {
    /// Build from pairs in any order. Later duplicates win.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: ToString,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.0.insert(k.into(), v.to_string());
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                f.write_str("&")?;
            }
            write!(f, "{}={}", k, v)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_order_independent() {
        let a = RequestParams::from_pairs([("q", "one piece"), ("page", "2")]);
        let b = RequestParams::new().with("page", 2).with("q", "one piece");

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "page=2&q=one piece");
    }

    #[test]
    fn test_params_later_duplicate_wins() {
        let params = RequestParams::from_pairs([("page", "1"), ("page", "3")]);
        assert_eq!(params.get("page"), Some("3"));
    }

    #[test]
    fn test_empty_params_display() {
        assert_eq!(RequestParams::new().to_string(), "");
        assert!(RequestParams::new().is_empty());
    }

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>(), Ok(kind));
        }
        assert_eq!(
            "genre-page".parse::<ResourceKind>(),
            Ok(ResourceKind::GenrePage)
        );
        assert_eq!(
            "read-chapter".parse::<ResourceKind>(),
            Ok(ResourceKind::ReadChapter)
        );
        assert!("bookmarks".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_kind_shapes() {
        assert_eq!(ResourceKind::List.shape(), Shape::Sequence);
        assert_eq!(ResourceKind::Chapter.shape(), Shape::Sequence);
        assert_eq!(ResourceKind::Item.shape(), Shape::Record);
        assert_eq!(ResourceKind::Detail.shape(), Shape::Record);
        assert_eq!(ResourceKind::ReadChapter.shape(), Shape::Record);
        assert_eq!(ResourceKind::GenrePage.shape(), Shape::Page);
        assert_eq!(
            ResourceKind::Popular.shape(),
            Shape::Sections(POPULAR_SECTIONS)
        );
    }

    #[test]
    fn test_templates_are_relative() {
        for kind in ResourceKind::ALL {
            assert!(!kind.path_template().starts_with('/'), "{}", kind);
        }
    }
}
