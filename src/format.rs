//! The delimited field format used by content files.
//!
//! ```text
//! Title: Spring Trip
//!
//! ----
//!
//! Date: 2024-05-01
//!
//! ----
//!
//! Text:
//!
//! Multi-line values start on the line after the key.
//! ```
//!
//! Fields are separated by a line holding exactly four dashes. A value line
//! that itself begins with `----` is written as `\----` so it can't be taken
//! for a separator, and the backslash is removed again on read. A line that
//! already begins with backslashes before `----` gets one more, so every
//! value reads back exactly as written.

use regex::Regex;
use std::sync::LazyLock;

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n----\s*\n*").expect("separator pattern is valid"));

const BOM: char = '\u{feff}';

/// Normalize a field key: trimmed, dashes and spaces become underscores,
/// lowercased. `Meta Title` and `meta-title` both become `meta_title`.
pub fn normalize_key(key: &str) -> String {
    key.trim().replace(['-', ' '], "_").to_lowercase()
}

/// Split raw file contents into `(key, value)` pairs in file order.
///
/// Keys are normalized with [`normalize_key`]; chunks without a colon or
/// with an empty key are dropped. A repeated key keeps its first position
/// and takes the later value.
pub fn decode(raw: &str) -> Vec<(String, String)> {
    let raw = raw.strip_prefix(BOM).unwrap_or(raw);
    let raw = raw.replace("\r\n", "\n");

    let mut fields: Vec<(String, String)> = Vec::new();
    for chunk in SEPARATOR.split(&raw) {
        let Some(pos) = chunk.find(':') else {
            continue;
        };
        let key = normalize_key(&chunk[..pos]);
        if key.is_empty() {
            continue;
        }
        let value = unescape(chunk[pos + 1..].trim());
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => fields.push((key, value)),
        }
    }
    fields
}

/// Write fields back into the delimited format.
///
/// Empty values are omitted entirely. The first letter of every key is
/// uppercased; values with a line break start on a new paragraph.
pub fn encode<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fields
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value.as_ref().trim();
            if value.is_empty() {
                return None;
            }
            let key = ucfirst(key.as_ref().trim());
            let value = escape(value);
            Some(if value.contains('\n') {
                format!("{key}: \n\n{value}")
            } else {
                format!("{key}: {value}")
            })
        })
        .collect::<Vec<_>>()
        .join("\n\n----\n\n")
}

fn ucfirst(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lines of zero or more backslashes followed by `----` gain one backslash.
fn escape(value: &str) -> String {
    map_lines(value, |line| {
        if line.trim_start_matches('\\').starts_with("----") {
            format!("\\{line}")
        } else {
            line.to_string()
        }
    })
}

/// Lines of one or more backslashes followed by `----` lose one backslash.
fn unescape(value: &str) -> String {
    map_lines(value, |line| match line.strip_prefix('\\') {
        Some(rest) if rest.trim_start_matches('\\').starts_with("----") => rest.to_string(),
        _ => line.to_string(),
    })
}

fn map_lines(value: &str, f: impl Fn(&str) -> String) -> String {
    value
        .replace("\r\n", "\n")
        .split('\n')
        .map(f)
        .collect::<Vec<_>>()
        .join("\n")
}
