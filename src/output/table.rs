//! Table output formatting

use serde_json::{Map, Value};
use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Widest cell before truncation
const MAX_CELL_WIDTH: usize = 60;

/// One field of a record
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "FIELD")]
    pub field: String,
    #[tabled(rename = "VALUE")]
    pub value: String,
}

/// Format data as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    style(&mut table);
    table.to_string()
}

/// Format a list of JSON records, one column per scalar field.
///
/// Columns follow first appearance across the records. Nested arrays and
/// objects are left out; use JSON output for those.
pub fn format_items(items: &[Value]) -> String {
    if items.is_empty() {
        return "No results found.".to_string();
    }

    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for (key, value) in map {
                if is_scalar(value) && !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let mut builder = Builder::default();

    if columns.is_empty() {
        // Bare values such as genre names
        builder.push_record(["VALUE".to_string()]);
        for item in items {
            builder.push_record([cell(item)]);
        }
    } else {
        builder.push_record(columns.iter().map(|c| c.to_uppercase()));
        for item in items {
            builder.push_record(
                columns
                    .iter()
                    .map(|c| item.get(*c).map(cell).unwrap_or_default()),
            );
        }
    }

    let mut table = builder.build();
    style(&mut table);
    table.to_string()
}

/// Format a JSON record: scalar fields as a FIELD/VALUE table, then every
/// list field as its own titled table.
pub fn format_record(record: &Map<String, Value>) -> String {
    if record.is_empty() {
        return "No results found.".to_string();
    }

    let fields: Vec<FieldRow> = record
        .iter()
        .filter(|(_, v)| !v.is_array())
        .map(|(k, v)| FieldRow {
            field: k.clone(),
            value: cell(v),
        })
        .collect();

    let mut sections = Vec::new();
    if !fields.is_empty() {
        sections.push(format_table(&fields));
    }

    for (key, value) in record {
        if let Value::Array(items) = value {
            sections.push(format!("{} ({})\n{}", key, items.len(), format_items(items)));
        }
    }

    sections.join("\n\n")
}

fn style(table: &mut Table) {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(map) => format!("{{{} fields}}", map.len()),
        other => other.to_string(),
    };

    if text.chars().count() > MAX_CELL_WIDTH {
        let truncated: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_table_empty() {
        let rows: Vec<FieldRow> = vec![];
        assert_eq!(format_table(&rows), "No results found.");
    }

    #[test]
    fn test_format_table_uses_rounded_style() {
        let rows = vec![FieldRow {
            field: "id".to_string(),
            value: "m1".to_string(),
        }];

        let result = format_table(&rows);

        // Rounded style uses ╭ for top-left corner
        assert!(result.contains("╭"));
        assert!(result.contains("╰"));
        assert!(result.contains("FIELD"));
    }

    #[test]
    fn test_format_items_columns_from_scalar_fields() {
        let items = vec![
            json!({"id": "m1", "title": "One", "genres": ["action"]}),
            json!({"id": "m2", "title": "Two", "rating": 8.5}),
        ];

        let result = format_items(&items);

        assert!(result.contains("ID"));
        assert!(result.contains("TITLE"));
        assert!(result.contains("RATING"));
        assert!(!result.contains("GENRES"));
        assert!(result.contains("8.5"));
        assert!(result.contains("Two"));
    }

    #[test]
    fn test_format_items_bare_values() {
        let items = vec![json!("action"), json!("romance")];
        let result = format_items(&items);

        assert!(result.contains("VALUE"));
        assert!(result.contains("romance"));
    }

    #[test]
    fn test_format_items_empty() {
        assert_eq!(format_items(&[]), "No results found.");
    }

    #[test]
    fn test_format_record_with_nested_list() {
        let record = json!({
            "title": "Solo",
            "current_page": 2,
            "items": [{"id": "m1"}, {"id": "m2"}],
        });

        let result = format_record(record.as_object().unwrap());

        assert!(result.contains("current_page"));
        assert!(result.contains("Solo"));
        assert!(result.contains("items (2)"));
        assert!(result.contains("m2"));
    }

    #[test]
    fn test_long_cells_are_truncated() {
        let long = "x".repeat(200);
        let text = cell(&json!(long));
        assert_eq!(text.chars().count(), MAX_CELL_WIDTH);
        assert!(text.ends_with("..."));
    }
}
