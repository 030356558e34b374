//! A single named value from a content file.

use serde::Serialize;
use std::fmt;

/// One field of a [`Content`](crate::content::Content): the normalized key and
/// the raw, unparsed value. Templates convert it to whatever they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    key: String,
    value: String,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// The value, or `default` when the field is empty.
    pub fn or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.is_empty() { default } else { &self.value }
    }

    /// Split on `separator`, trimming parts and dropping empty ones.
    ///
    /// `"a, b,, c"` split on `','` gives `["a", "b", "c"]`.
    pub fn split(&self, separator: char) -> Vec<&str> {
        self.value
            .split(separator)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn to_int(&self) -> Option<i64> {
        self.value.trim().parse().ok()
    }

    pub fn to_float(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }

    /// `true`, `1`, `on` and `yes` (any case) are true; everything else false.
    pub fn to_bool(&self) -> bool {
        matches!(
            self.value.trim().to_lowercase().as_str(),
            "true" | "1" | "on" | "yes"
        )
    }

    pub fn words(&self) -> usize {
        self.value.split_whitespace().count()
    }

    pub fn lower(&self) -> String {
        self.value.to_lowercase()
    }

    pub fn upper(&self) -> String {
        self.value.to_uppercase()
    }

    /// Shorten to at most `chars` characters, cutting at the last word
    /// boundary and appending an ellipsis. Line breaks become spaces.
    pub fn excerpt(&self, chars: usize) -> String {
        let flat = self.value.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() <= chars {
            return flat;
        }
        let cut: String = flat.chars().take(chars).collect();
        let cut = match cut.rfind(' ') {
            Some(pos) if pos > 0 => &cut[..pos],
            _ => cut.as_str(),
        };
        format!("{}…", cut.trim_end())
    }

    /// Render the value as Markdown.
    pub fn markdown(&self) -> String {
        let parser = pulldown_cmark::Parser::new(&self.value);
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, parser);
        html
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for Field {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_raw_value() {
        let field = Field::new("title", "Hello");
        assert_eq!(field.to_string(), "Hello");
        assert_eq!(field.key(), "title");
    }

    #[test]
    fn or_falls_back_on_blank() {
        assert_eq!(Field::new("a", "  ").or("fallback"), "fallback");
        assert_eq!(Field::new("a", "set").or("fallback"), "set");
    }

    #[test]
    fn split_drops_empty_parts() {
        let field = Field::new("tags", "a, b,, c ");
        assert_eq!(field.split(','), vec!["a", "b", "c"]);
    }

    #[test]
    fn numeric_and_bool_coercion() {
        assert_eq!(Field::new("n", " 42 ").to_int(), Some(42));
        assert_eq!(Field::new("n", "x").to_int(), None);
        assert_eq!(Field::new("f", "1.5").to_float(), Some(1.5));
        assert!(Field::new("b", "Yes").to_bool());
        assert!(!Field::new("b", "nope").to_bool());
    }

    #[test]
    fn excerpt_cuts_at_word_boundary() {
        let field = Field::new("text", "The quick brown\nfox jumps");
        assert_eq!(field.excerpt(12), "The quick…");
        assert_eq!(field.excerpt(100), "The quick brown fox jumps");
    }

    #[test]
    fn markdown_renders_html() {
        let html = Field::new("text", "# Hi\n\n*there*").markdown();
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains("<em>there</em>"));
    }
}
