//! Back-of-book index lookup.
//!
//! A document whose index lists the query term is promoted, and the page
//! references found next to the term are attached to the result. Matching is
//! case-insensitive and also tries the query with hyphens and spaces swapped,
//! so "p series" finds "p-series" and vice versa.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use libris_core::settings::SearchSettings;

/// A page number or a run of numbers joined by separators: `12`, `15-18`,
/// `101, 104–107`.
static PAGE_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,]*(\d+(?:[\s,–.\-]+\d+)*)").expect("static page regex"));

/// The query itself, then hyphens as spaces, then spaces as hyphens.
pub fn query_variants(query: &str) -> Vec<String> {
    let mut variants = vec![query.to_string()];
    for candidate in [query.replace('-', " "), query.replace(' ', "-")] {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

fn leading_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// The case-insensitive patterns for every spelling of one query term,
/// compiled once per query and matched against each candidate's index.
#[derive(Debug, Clone)]
pub struct IndexTerm {
    variants: Vec<Regex>,
}

impl IndexTerm {
    /// `None` for a blank query.
    pub fn new(query: &str) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() { return None; }
        let variants: Vec<Regex> = query_variants(query)
            .iter()
            .filter_map(|v| RegexBuilder::new(&regex::escape(v)).case_insensitive(true).build().ok())
            .collect();
        if variants.is_empty() { None } else { Some(Self { variants }) }
    }

    /// Page references that follow the term in `index_text`, ordered by first
    /// appearance, de-duplicated and joined with ", ". Spellings are tried in
    /// order; once pages are found, each later spelling only looks past its
    /// first occurrence. `None` when the term is not in the index or no page
    /// number follows it within `window` characters.
    pub fn pages(&self, index_text: &str, window: usize) -> Option<String> {
        if index_text.is_empty() { return None; }
        let mut pages: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for term in &self.variants {
            for found in term.find_iter(index_text) {
                let tail = leading_chars(&index_text[found.end()..], window);
                for caps in PAGE_TOKENS.captures_iter(tail) {
                    let token = caps[1].trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | '-'));
                    if !token.is_empty() && seen.insert(token.to_string()) {
                        pages.push(token.to_string());
                    }
                }
                if !pages.is_empty() { break; }
            }
        }
        if pages.is_empty() { None } else { Some(pages.join(", ")) }
    }
}

/// One-off form of [`IndexTerm::pages`].
pub fn extract_index_pages(index_text: &str, query: &str, window: usize) -> Option<String> {
    IndexTerm::new(query)?.pages(index_text, window)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexBooster {
    pub boost: f32,
    pub window: usize,
}

impl From<&SearchSettings> for IndexBooster {
    fn from(s: &SearchSettings) -> Self { Self { boost: s.index_boost, window: s.index_window_chars } }
}

impl IndexBooster {
    pub fn pages(&self, index_text: Option<&str>, term: &IndexTerm) -> Option<String> {
        term.pages(index_text?, self.window)
    }
}
