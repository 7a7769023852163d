//! In-book passages around query hits.
//!
//! Bodies carry `[[PAGE_n]]` markers where each page starts. A body passage is
//! credited to the last marker before its hit (page 1 if there is none) and is
//! shown with the markers removed. When a book has few body hits, passages
//! from its back-of-book index are added after them.
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use libris_core::types::{BookMatch, MatchPage};

pub const MAX_BOOK_MATCHES: usize = 50;
/// Index passages are added while the body produced fewer than this many.
pub const INDEX_FALLBACK_BELOW: usize = 5;

const BODY_CONTEXT_CHARS: usize = 100;
const INDEX_CONTEXT_CHARS: usize = 60;
const PAGE_LOOKBACK_CHARS: usize = 10_000;

static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[PAGE_(\d+)\]\]").expect("static page marker regex"));

/// Drops hits that fall inside a page marker, so a query like "page" does not
/// match the markers themselves.
pub fn outside_page_markers(text: &str, hits: Vec<Range<usize>>) -> Vec<Range<usize>> {
	let markers: Vec<Range<usize>> = PAGE_MARKER.find_iter(text).map(|m| m.range()).collect();
	if markers.is_empty() { return hits; }
	hits.into_iter().filter(|h| !markers.iter().any(|m| h.start < m.end && m.start < h.end)).collect()
}

/// Wraps each hit range in `<b>..</b>`. Ranges must be ascending; overlapping
/// or misaligned ones are skipped.
pub fn highlight(text: &str, hits: &[Range<usize>]) -> String {
	let mut out = String::with_capacity(text.len() + hits.len() * 7);
	let mut pos = 0;
	for hit in hits {
		let aligned = text.is_char_boundary(hit.start) && text.is_char_boundary(hit.end);
		if hit.start < pos || hit.start >= hit.end || hit.end > text.len() || !aligned { continue; }
		out.push_str(&text[pos..hit.start]);
		out.push_str("<b>");
		out.push_str(&text[hit.clone()]);
		out.push_str("</b>");
		pos = hit.end;
	}
	out.push_str(&text[pos..]);
	out
}

/// Body passages first; index passages only if the body gave fewer than
/// [`INDEX_FALLBACK_BELOW`]. At most [`MAX_BOOK_MATCHES`] overall.
pub fn collect_matches(highlighted_body: &str, highlighted_index: &str) -> Vec<BookMatch> {
	let mut found = body_matches(highlighted_body, MAX_BOOK_MATCHES);
	if found.len() < INDEX_FALLBACK_BELOW {
		found.extend(index_matches(highlighted_index, MAX_BOOK_MATCHES - found.len()));
	}
	found
}

pub fn body_matches(highlighted: &str, limit: usize) -> Vec<BookMatch> {
	marked_spans(highlighted)
		.take(limit)
		.map(|span| {
			let fragment = around(highlighted, span.clone(), BODY_CONTEXT_CHARS);
			BookMatch { snippet: PAGE_MARKER.replace_all(fragment, "").into_owned(), page: MatchPage::Number(page_before(highlighted, span.start)) }
		})
		.collect()
}

pub fn index_matches(highlighted: &str, limit: usize) -> Vec<BookMatch> {
	marked_spans(highlighted)
		.take(limit)
		.map(|span| BookMatch { snippet: around(highlighted, span, INDEX_CONTEXT_CHARS).to_string(), page: MatchPage::Index })
		.collect()
}

/// `<b>..</b>` spans in order; an unclosed tag spans just itself.
fn marked_spans(highlighted: &str) -> impl Iterator<Item = Range<usize>> + '_ {
	let mut pos = 0;
	std::iter::from_fn(move || {
		let open = pos + highlighted[pos..].find("<b>")?;
		let end = match highlighted[open..].find("</b>") {
			Some(close) => open + close + "</b>".len(),
			None => open + "<b>".len(),
		};
		pos = end;
		Some(open..end)
	})
}

fn page_before(text: &str, at: usize) -> u32 {
	let window = &text[chars_before(text, at, PAGE_LOOKBACK_CHARS)..at];
	PAGE_MARKER.captures_iter(window).last().and_then(|c| c[1].parse().ok()).unwrap_or(1)
}

fn around(text: &str, span: Range<usize>, context: usize) -> &str {
	&text[chars_before(text, span.start, context)..chars_after(text, span.end, context)]
}

fn chars_before(s: &str, at: usize, n: usize) -> usize {
	if n == 0 { return at; }
	s[..at].char_indices().rev().nth(n - 1).map(|(i, _)| i).unwrap_or(0)
}

fn chars_after(s: &str, at: usize, n: usize) -> usize {
	s[at..].char_indices().nth(n).map(|(i, _)| at + i).unwrap_or(s.len())
}
