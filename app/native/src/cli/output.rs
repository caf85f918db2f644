//! CLI output formatting utilities.
//!
//! Rounded tables for humans, highlighted JSON for `--json`.

use colored::Colorize;
use serde_json::Value;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Prints JSON with syntax highlighting.
///
/// Colors:
/// - Keys: Cyan
/// - Strings: Green
/// - Numbers: Yellow
/// - Booleans/Null: Magenta
pub fn print_highlighted_json(value: &Value) {
    println!("{}", highlight_json(value, 0));
}

/// Renders `value` as indented JSON with ANSI colors.
///
/// With colors disabled the result matches `serde_json::to_string_pretty`.
#[must_use]
pub fn highlight_json(value: &Value, depth: usize) -> String {
    let indent = "  ".repeat(depth + 1);
    let closing = "  ".repeat(depth);

    match value {
        Value::Null => "null".magenta().to_string(),
        Value::Bool(flag) => flag.to_string().magenta().to_string(),
        Value::Number(number) => number.to_string().yellow().to_string(),
        Value::String(text) => quote(text).green().to_string(),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => {
            let body: Vec<String> = items
                .iter()
                .map(|item| format!("{indent}{}", highlight_json(item, depth + 1)))
                .collect();
            format!("[\n{}\n{closing}]", body.join(",\n"))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let body: Vec<String> = map
                .iter()
                .map(|(key, item)| {
                    format!("{indent}{}: {}", quote(key).cyan(), highlight_json(item, depth + 1))
                })
                .collect();
            format!("{{\n{}\n{closing}}}", body.join(",\n"))
        }
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

/// Prints a bold `Title (count)` header followed by a rounded table.
pub fn print_table<T: Tabled>(title: &str, rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", format!("No {} found.", title.to_lowercase()).dimmed());
        return;
    }

    let count = rows.len();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", format!("{title} ({count})").bold());
    println!("{table}");
}

/// Truncates a string to a maximum number of characters, adding ellipsis if needed.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 1 {
        "…".to_string()
    } else {
        let cut = s.char_indices().nth(max_chars - 1).map_or(s.len(), |(idx, _)| idx);
        format!("{}…", &s[..cut])
    }
}

/// Formats a boolean as a colored check mark.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_highlight_json_matches_pretty_without_colors() {
        colored::control::set_override(false);
        let value = json!({
            "index": 2,
            "label": "code \"main\"",
            "windows": [5, 9],
            "empty": [],
            "meta": {},
            "focused": true,
            "display": null
        });
        assert_eq!(highlight_json(&value, 0), serde_json::to_string_pretty(&value).unwrap());
    }

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("Safari", 10), "Safari");
    }

    #[test]
    fn test_truncate_long_title() {
        assert_eq!(truncate("Visual Studio Code", 8), "Visual …");
    }

    #[test]
    fn test_truncate_min_length() {
        assert_eq!(truncate("Finder", 1), "…");
    }

    #[test]
    fn test_truncate_multibyte_utf8() {
        let s = "café crème";
        assert_eq!(truncate(s, 5), "café…");
        assert_eq!(truncate(s, 20), s);
    }

    #[test]
    fn test_format_bool() {
        assert!(format_bool(true).contains('✓'));
        assert!(format_bool(false).contains('✗'));
    }
}
