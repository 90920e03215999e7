//! CLI output formatting utilities.
//!
//! - JSON syntax highlighting for `--json` output
//! - Small colored markers for tables

use std::fmt::Write;

use colored::Colorize;

/// Prints JSON with syntax highlighting.
///
/// Colors:
/// - Keys: Cyan
/// - Strings: Green
/// - Numbers: Yellow
/// - Booleans/Null: Magenta
/// - Brackets/Braces: White (bold)
pub fn print_highlighted_json(value: &serde_json::Value) {
    println!("{}", highlight_json(value));
}

/// Renders `value` like `serde_json::to_string_pretty`, with colors.
#[must_use]
pub fn highlight_json(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &serde_json::Value, depth: usize) {
    use serde_json::Value;

    match value {
        Value::Null => push(out, "null".magenta()),
        Value::Bool(b) => push(out, b.to_string().magenta()),
        Value::Number(n) => push(out, n.to_string().yellow()),
        Value::String(s) => push(out, quoted(s).green()),
        Value::Array(items) => {
            write_container(out, ('[', ']'), items.iter().map(|item| (None, item)), depth);
        }
        Value::Object(map) => {
            write_container(out, ('{', '}'), map.iter().map(|(k, v)| (Some(k), v)), depth);
        }
    }
}

fn write_container<'a>(
    out: &mut String,
    (open, close): (char, char),
    entries: impl ExactSizeIterator<Item = (Option<&'a String>, &'a serde_json::Value)>,
    depth: usize,
) {
    push(out, open.to_string().white().bold());
    let len = entries.len();
    if len == 0 {
        push(out, close.to_string().white().bold());
        return;
    }

    let indent = "  ".repeat(depth + 1);
    for (i, (key, value)) in entries.enumerate() {
        let _ = write!(out, "\n{indent}");
        if let Some(key) = key {
            push(out, quoted(key).cyan());
            push(out, ":".white());
            out.push(' ');
        }
        write_value(out, value, depth + 1);
        if i + 1 < len {
            push(out, ",".white());
        }
    }

    let _ = write!(out, "\n{}", "  ".repeat(depth));
    push(out, close.to_string().white().bold());
}

fn quoted(s: &str) -> String { serde_json::Value::String(s.to_string()).to_string() }

fn push(out: &mut String, piece: colored::ColoredString) { let _ = write!(out, "{piece}"); }

/// Formats a boolean as a colored check mark or cross.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

/// Check mark for `true`, blank for `false`.
#[must_use]
pub fn format_check(value: bool) -> String {
    if value { "✓".green().bold().to_string() } else { String::new() }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_highlight_matches_pretty_layout_without_colors() {
        colored::control::set_override(false);
        let value = json!({
            "id": "com.apple.Safari",
            "isDefault": true,
            "tags": ["a", "b"],
            "empty": [],
            "nested": { "n": 1, "none": null },
        });

        assert_eq!(highlight_json(&value), serde_json::to_string_pretty(&value).unwrap());
    }

    #[test]
    fn test_highlight_escapes_strings() {
        colored::control::set_override(false);
        let value = json!({ "name": "say \"hi\"" });
        assert!(highlight_json(&value).contains(r#""say \"hi\"""#));
    }

    #[test]
    fn test_format_bool() {
        assert!(format_bool(true).contains('✓'));
        assert!(format_bool(false).contains('✗'));
    }

    #[test]
    fn test_format_check_blank_when_false() {
        assert!(format_check(false).is_empty());
        assert!(format_check(true).contains('✓'));
    }
}
