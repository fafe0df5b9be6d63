//! Upstream response normalization
//!
//! The upstream API sometimes wraps payloads in a `{ "data": ... }` envelope
//! and sometimes returns them bare. Everything here is pure: the same raw
//! JSON always normalizes to the same value, and shapes that cannot be used
//! collapse to the empty value for the kind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ResourceKind, Shape};

/// A normalized payload: a list of records or a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Normalized {
    Items(Vec<Value>),
    Record(Map<String, Value>),
}

impl Normalized {
    /// The value handed out when the upstream cannot be used.
    pub fn empty(kind: ResourceKind) -> Self {
        match kind.shape() {
            Shape::Sequence => Normalized::Items(Vec::new()),
            Shape::Record => Normalized::Record(Map::new()),
            Shape::Page => page_record(None, Vec::new(), &Map::new()),
            Shape::Sections(sections) => sections_record(sections, &Map::new()),
        }
    }
}

#[cfg(test)]
impl Normalized {
    /// True when this is exactly the fallback value for `kind`.
    pub fn is_empty_for(&self, kind: ResourceKind) -> bool {
        *self == Normalized::empty(kind)
    }

    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Normalized::Items(items) => Some(items),
            Normalized::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Map<String, Value>> {
        match self {
            Normalized::Record(map) => Some(map),
            Normalized::Items(_) => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Normalized::Items(items) => Value::Array(items),
            Normalized::Record(map) => Value::Object(map),
        }
    }
}

/// Raw payload classified by envelope.
#[derive(Debug, PartialEq)]
enum Envelope {
    /// `{ "data": <payload>, ... }` with a non-null `data`
    Wrapped(Value),
    /// Anything else, taken as the payload itself
    Bare(Value),
}

impl Envelope {
    fn classify(raw: Value) -> Self {
        match raw {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Null) | None => Envelope::Bare(Value::Object(map)),
                Some(data) => Envelope::Wrapped(data),
            },
            other => Envelope::Bare(other),
        }
    }

    fn into_payload(self) -> Value {
        match self {
            Envelope::Wrapped(v) | Envelope::Bare(v) => v,
        }
    }
}

/// Normalize a raw upstream response for `kind`.
pub fn normalize(kind: ResourceKind, raw: Value) -> Normalized {
    match kind.shape() {
        Shape::Sequence => match Envelope::classify(raw).into_payload() {
            Value::Array(items) => Normalized::Items(items),
            _ => Normalized::empty(kind),
        },
        Shape::Record => match Envelope::classify(raw).into_payload() {
            Value::Object(map) => Normalized::Record(map),
            _ => Normalized::empty(kind),
        },
        Shape::Page => normalize_page(raw),
        Shape::Sections(sections) => match Envelope::classify(raw).into_payload() {
            Value::Object(map) => sections_record(sections, &map),
            _ => Normalized::empty(kind),
        },
    }
}

/// Paged listings keep their paging fields next to `data`, so the envelope
/// is read as a whole rather than unwrapped.
fn normalize_page(raw: Value) -> Normalized {
    match raw {
        Value::Object(map) => {
            let items = match map.get("data") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            let title = map.get("genre").and_then(Value::as_str).map(str::to_string);
            page_record(title, items, &map)
        }
        Value::Array(items) => page_record(None, items, &Map::new()),
        _ => page_record(None, Vec::new(), &Map::new()),
    }
}

fn page_record(title: Option<String>, items: Vec<Value>, meta: &Map<String, Value>) -> Normalized {
    let current_page = meta.get("currentPage").and_then(Value::as_u64).unwrap_or(1);
    let total = meta.get("totalManga").and_then(Value::as_u64).unwrap_or(0);
    let has_next_page = meta
        .get("hasNextPage")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let next_page_url = match meta.get("nextPageUrl") {
        Some(Value::String(url)) if !url.is_empty() => Value::String(url.clone()),
        _ => Value::Null,
    };

    let mut record = Map::new();
    record.insert("title".to_string(), title.map_or(Value::Null, Value::String));
    record.insert("items".to_string(), Value::Array(items));
    record.insert("current_page".to_string(), current_page.into());
    record.insert("total".to_string(), total.into());
    record.insert("has_next_page".to_string(), has_next_page.into());
    record.insert("next_page_url".to_string(), next_page_url);
    Normalized::Record(record)
}

/// Give an untitled page record `fallback` as its title, first letter
/// upper-cased. Other values are left alone.
pub fn title_page(value: &mut Normalized, fallback: &str) {
    if let Normalized::Record(record) = value
        && record.get("title").is_none_or(Value::is_null)
    {
        let mut chars = fallback.chars();
        let title = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        record.insert("title".to_string(), Value::String(title));
    }
}

/// Each section is `<name>.items` upstream, or occasionally a bare list.
fn sections_record(sections: &[&str], source: &Map<String, Value>) -> Normalized {
    let mut record = Map::new();
    for section in sections {
        let items = match source.get(*section) {
            Some(Value::Object(inner)) => match inner.get("items") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            },
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        record.insert(section.to_string(), Value::Array(items));
    }
    Normalized::Record(record)
}
