//! Literal, case-insensitive match highlighting.
//!
//! Matches are located in the original text and the text is escaped segment by
//! segment, so emphasis markup only ever appears between escaped segments: user
//! text cannot inject markup and the `<mark>` tags cannot be escaped away.
//!
//! This is not escape-then-wrap. Matching the escaped term against escaped
//! text would let a term like `amp` or `lt` match inside the entities that
//! escaping produces, splitting `&amp;` into broken markup. Matching the raw
//! text only ever marks characters the user actually wrote.

use regex::{Regex, RegexBuilder};
use std::ops::Range;

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

/// Escape text for an HTML text or attribute context.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// A compiled search term
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    /// The term is literal: regex metacharacters in it carry no meaning.
    pub fn new(term: &str) -> Self {
        let pattern = if term.is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
                .map_err(|e| log::warn!("Cannot highlight {term:?}: {e}"))
                .ok()
        };
        Self { pattern }
    }

    /// Byte ranges of every non-overlapping occurrence
    pub fn ranges(&self, text: &str) -> Vec<Range<usize>> {
        match &self.pattern {
            Some(re) => re.find_iter(text).map(|m| m.range()).collect(),
            None => Vec::new(),
        }
    }

    /// Split `text` into `(segment, is_match)` pieces covering all of it
    pub fn segments<'t>(&self, text: &'t str) -> Vec<(&'t str, bool)> {
        split(text, &self.ranges(text))
    }

    /// Escaped HTML with every occurrence wrapped in `<mark>`
    pub fn html(&self, text: &str) -> String {
        mark_html(text, &self.ranges(text))
    }
}

/// Split `text` at precomputed, ordered, non-overlapping match ranges.
pub fn split<'t>(text: &'t str, ranges: &[Range<usize>]) -> Vec<(&'t str, bool)> {
    let mut out = Vec::new();
    let mut last = 0;
    for range in ranges {
        if range.start > last {
            out.push((&text[last..range.start], false));
        }
        out.push((&text[range.clone()], true));
        last = range.end;
    }
    if last < text.len() {
        out.push((&text[last..], false));
    }
    out
}

/// Escape `text`, wrapping each range in `<mark>`
pub fn mark_html(text: &str, ranges: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len() + ranges.len() * 13);
    for (segment, matched) in split(text, ranges) {
        if matched {
            out.push_str(MARK_OPEN);
            out.push_str(&escape_html(segment));
            out.push_str(MARK_CLOSE);
        } else {
            out.push_str(&escape_html(segment));
        }
    }
    out
}

/// One-off `Highlighter::new(term).html(text)`
pub fn highlight_html(text: &str, term: &str) -> String {
    Highlighter::new(term).html(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_before_wrapping() {
        let html = highlight_html("<b>hi</b>", "hi");
        insta::assert_snapshot!(html, @"&lt;b&gt;<mark>hi</mark>&lt;/b&gt;");
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn terms_never_match_inside_entities() {
        assert_eq!(highlight_html("a & b", "amp"), "a &amp; b");
        assert_eq!(highlight_html("x < lt", "lt"), "x &lt; <mark>lt</mark>");
    }

    #[test]
    fn matches_ignore_case_and_keep_original_casing() {
        assert_eq!(
            highlight_html("User user USER", "user"),
            "<mark>User</mark> <mark>user</mark> <mark>USER</mark>"
        );
    }

    #[test]
    fn term_is_literal() {
        assert_eq!(highlight_html("a.b axb", "a.b"), "<mark>a.b</mark> axb");
        assert_eq!(highlight_html("cost (usd) $5", "(usd) $"), "cost <mark>(usd) $</mark>5");
        assert_eq!(highlight_html("[x]*", "[x]*"), "<mark>[x]*</mark>");
    }

    #[test]
    fn markup_in_the_term_matches_literally() {
        assert_eq!(
            highlight_html("say <b> twice <B>", "<b>"),
            "say <mark>&lt;b&gt;</mark> twice <mark>&lt;B&gt;</mark>"
        );
    }

    #[test]
    fn entities_produced_by_escaping_are_not_matched() {
        // "amp" must not match inside the "&amp;" produced for '&'
        assert_eq!(highlight_html("a&b", "amp"), "a&amp;b");
    }

    #[test]
    fn empty_term_only_escapes() {
        assert_eq!(highlight_html("<i>", ""), "&lt;i&gt;");
        assert!(Highlighter::new("").ranges("anything").is_empty());
    }

    #[test]
    fn segments_cover_the_whole_text() {
        let hl = Highlighter::new("ab");
        assert_eq!(
            hl.segments("xxABxab"),
            vec![("xx", false), ("AB", true), ("x", false), ("ab", true)]
        );
        assert_eq!(hl.ranges("xxABxab"), vec![2..4, 5..7]);
        assert!(hl.segments("").is_empty());
    }

    #[test]
    fn escape_html_covers_attribute_characters() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
