//! Full-text search over page content.
//!
//! ## Scoring
//!
//! The query is split on whitespace and commas into tokens; tokens shorter
//! than `minlength` and stopwords are dropped. For every page and every
//! searched field:
//!
//! - each token occurrence is a *hit* and adds the field's weight to the score
//! - if the field had any hit, each occurrence of the whole query string
//!   adds the weight again
//!
//! Pages without hits are dropped; the rest are ordered by score, highest
//! first, with ties keeping collection order. Hits and score are left on
//! each page ([`Page::search_hits`](crate::page::Page::search_hits)).

use crate::config::SearchConfig;
use crate::format::normalize_key;
use crate::page::SearchMark;
use crate::pages::Pages;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Tokens with fewer characters are ignored.
    pub minlength: usize,
    /// Compared case-insensitively.
    pub stopwords: Vec<String>,
    /// Fields to search; empty searches every field.
    pub fields: Vec<String>,
    /// Match tokens only as whole words.
    pub words: bool,
    /// Per-field weight; fields not listed weigh 1.
    pub score: HashMap<String, u32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            minlength: config.minlength,
            stopwords: config.stopwords.clone(),
            fields: Vec::new(),
            words: config.words,
            score: HashMap::new(),
        }
    }
}

impl SearchOptions {
    pub fn fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.fields = fields.iter().map(|f| normalize_key(f.as_ref())).collect();
        self
    }

    pub fn weight(mut self, field: &str, weight: u32) -> Self {
        self.score.insert(normalize_key(field), weight);
        self
    }

    pub fn words(mut self, words: bool) -> Self {
        self.words = words;
        self
    }

    fn weight_of(&self, field: &str) -> u32 {
        self.score.get(field).copied().unwrap_or(1)
    }

    fn searches(&self, field: &str) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f == field)
    }
}

/// Split a query into searchable tokens.
pub fn tokenize(query: &str, options: &SearchOptions) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(str::trim)
        .filter(|t| t.chars().count() >= options.minlength)
        .filter(|t| !options.stopwords.iter().any(|s| s.eq_ignore_ascii_case(t)))
        .map(str::to_string)
        .collect()
}

fn build_pattern(tokens: &[String], words: bool) -> Option<Regex> {
    let alternation = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = if words {
        format!(r"\b(?:{alternation})\b")
    } else {
        format!("(?:{alternation})")
    };
    compile(&pattern)
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "search pattern rejected");
            None
        }
    }
}

pub fn search<'s>(pages: &Pages<'s>, query: &str, options: &SearchOptions) -> Pages<'s> {
    let query = query.trim();
    let tokens = tokenize(query, options);
    if tokens.is_empty() {
        return pages.limit(0);
    }
    let Some(pattern) = build_pattern(&tokens, options.words) else {
        return pages.limit(0);
    };
    let Some(whole) = compile(&regex::escape(query)) else {
        return pages.limit(0);
    };

    let results = pages.filter(|page| {
        let content = match page.content() {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(page = %page.id(), error = %err, "page skipped by search");
                page.mark_search(None);
                return false;
            }
        };

        let mut mark = SearchMark::default();
        for field in content.fields() {
            if !options.searches(field.key()) {
                continue;
            }
            let matches = pattern.find_iter(field.value()).count();
            if matches == 0 {
                continue;
            }
            let weight = options.weight_of(field.key());
            mark.hits += matches;
            let phrases = whole.find_iter(field.value()).count();
            mark.score = mark
                .score
                .saturating_add(saturating_count(matches).saturating_mul(weight))
                .saturating_add(saturating_count(phrases).saturating_mul(weight));
        }

        let matched = mark.hits > 0;
        page.mark_search(matched.then_some(mark));
        matched
    });

    tracing::debug!(query, tokens = tokens.len(), results = results.len(), "search finished");
    results.sort_by(|a, b| b.search_score().cmp(&a.search_score()))
}

fn saturating_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
