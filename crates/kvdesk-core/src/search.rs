//! Key-name filtering and full-content search.
//!
//! In [`SearchMode::ByKey`] a query filters the [`KeyIndex`] synchronously. In
//! [`SearchMode::Global`] a query becomes a [`GlobalRequest`] that the caller
//! runs against the store (on a worker thread or inline) and hands back to
//! [`SearchEngine::complete`].
//!
//! Only one global request is outstanding at a time. A query typed while one
//! is pending is dropped, not queued; [`SearchEngine::needs_requery`] tells the
//! caller when the settled text differs from what was last searched. Responses
//! carry the id of their request and anything other than the awaited id is
//! discarded, so abandoning a request (mode switch, clear) is just forgetting
//! its id.

use std::ops::Range;

use crate::error::KvError;
use crate::highlight::{self, Highlighter};
use crate::key_index::KeyIndex;
use crate::store::{RecordStore, SearchHit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Case-insensitive substring match on key names
    #[default]
    ByKey,
    /// Remote search over keys and values
    Global,
}

impl SearchMode {
    pub fn toggle(self) -> Self {
        match self {
            SearchMode::ByKey => SearchMode::Global,
            SearchMode::Global => SearchMode::ByKey,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchMode::ByKey => "Key",
            SearchMode::Global => "Global",
        }
    }
}

/// A global search to run against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRequest {
    pub id: u64,
    pub term: String,
}

impl GlobalRequest {
    /// Run the search. Blocks until the store answers.
    pub fn perform(self, store: &dyn RecordStore) -> GlobalResponse {
        let outcome = store.search(&self.term);
        GlobalResponse {
            id: self.id,
            term: self.term,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalResponse {
    pub id: u64,
    pub term: String,
    pub outcome: Result<Vec<SearchHit>, KvError>,
}

/// What a call to [`SearchEngine::query`] or [`SearchEngine::set_mode`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Mode was already active
    Unchanged,
    /// Key list filtered in place
    Filtered,
    /// Run this request and pass the response to `complete`
    Issued(GlobalRequest),
    /// A global search is already in flight
    Dropped,
    /// Query text was empty; the unfiltered key list is shown
    Cleared,
}

/// A global search hit with match ranges for the key and the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub hit: SearchHit,
    pub key_ranges: Vec<Range<usize>>,
    pub preview_ranges: Vec<Range<usize>>,
}

impl ResultItem {
    fn new(hit: SearchHit, highlighter: &Highlighter) -> Self {
        let key_ranges = highlighter.ranges(&hit.key);
        let preview_ranges = highlighter.ranges(&hit.preview);
        Self {
            hit,
            key_ranges,
            preview_ranges,
        }
    }

    pub fn key(&self) -> &str {
        &self.hit.key
    }

    pub fn key_segments(&self) -> Vec<(&str, bool)> {
        highlight::split(&self.hit.key, &self.key_ranges)
    }

    pub fn preview_segments(&self) -> Vec<(&str, bool)> {
        highlight::split(&self.hit.preview, &self.preview_ranges)
    }

    pub fn key_html(&self) -> String {
        highlight::mark_html(&self.hit.key, &self.key_ranges)
    }

    pub fn preview_html(&self) -> String {
        highlight::mark_html(&self.hit.preview, &self.preview_ranges)
    }

    /// Badge labels for where the term matched
    pub fn badges(&self) -> Vec<&'static str> {
        let mut badges = Vec::with_capacity(2);
        if self.hit.match_in_key {
            badges.push("Key");
        }
        if self.hit.match_in_value {
            badges.push("Value");
        }
        badges
    }
}

/// What the key panel should currently show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchView<'a> {
    /// The key index's visible keys (filtered in key mode)
    Keys(&'a [String]),
    Searching { term: &'a str },
    Results { term: &'a str, items: &'a [ResultItem] },
    Failed { term: &'a str, message: &'a str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    id: u64,
    term: String,
}

#[derive(Debug, Default)]
pub struct SearchEngine {
    mode: SearchMode,
    text: String,
    in_flight: Option<InFlight>,
    next_id: u64,
    /// Term of the last issued global request, until cleared
    last_term: Option<String>,
    /// Term the current results (or error) belong to
    settled_term: Option<String>,
    results: Vec<ResultItem>,
    error: Option<String>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Current query text, trimmed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True while a global request is awaited
    pub fn is_searching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True when idle in global mode with query text that was never searched,
    /// which happens after a query was dropped.
    pub fn needs_requery(&self) -> bool {
        self.mode == SearchMode::Global
            && self.in_flight.is_none()
            && !self.text.is_empty()
            && self.last_term.as_deref() != Some(self.text.as_str())
    }

    pub fn results(&self) -> &[ResultItem] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Run `text` under the current mode.
    pub fn query(&mut self, index: &mut KeyIndex, text: &str) -> QueryOutcome {
        let text = text.trim();
        if text.is_empty() {
            self.clear(index);
            return QueryOutcome::Cleared;
        }
        self.text = text.to_string();

        match self.mode {
            SearchMode::ByKey => {
                index.filter(text);
                QueryOutcome::Filtered
            }
            SearchMode::Global => {
                if let Some(pending) = &self.in_flight {
                    log::debug!(
                        "Dropping search for {text:?}; #{} ({:?}) still pending",
                        pending.id,
                        pending.term
                    );
                    return QueryOutcome::Dropped;
                }
                QueryOutcome::Issued(self.issue(text.to_string()))
            }
        }
    }

    /// Re-run the current text if it was dropped while a search was pending.
    pub fn requery(&mut self, index: &mut KeyIndex) -> QueryOutcome {
        if !self.needs_requery() {
            return QueryOutcome::Unchanged;
        }
        let text = self.text.clone();
        self.query(index, &text)
    }

    fn issue(&mut self, term: String) -> GlobalRequest {
        self.next_id += 1;
        let id = self.next_id;
        log::debug!("Issuing global search #{id} for {term:?}");
        self.in_flight = Some(InFlight {
            id,
            term: term.clone(),
        });
        self.last_term = Some(term.clone());
        GlobalRequest { id, term }
    }

    /// Apply a global search response. Returns `false` if it was stale.
    pub fn complete(&mut self, response: GlobalResponse) -> bool {
        match &self.in_flight {
            Some(pending) if pending.id == response.id => {}
            _ => {
                log::debug!("Discarding stale search response #{}", response.id);
                return false;
            }
        }
        self.in_flight = None;

        match response.outcome {
            Ok(hits) => {
                let highlighter = Highlighter::new(&response.term);
                self.results = hits
                    .into_iter()
                    .map(|hit| ResultItem::new(hit, &highlighter))
                    .collect();
                self.error = None;
            }
            Err(e) => {
                log::warn!("Global search for {:?} failed: {e}", response.term);
                self.results.clear();
                self.error = Some(e.to_string());
            }
        }
        self.settled_term = Some(response.term);
        true
    }

    /// Switch modes, re-running the current text under the new mode.
    pub fn set_mode(&mut self, index: &mut KeyIndex, mode: SearchMode) -> QueryOutcome {
        if mode == self.mode {
            return QueryOutcome::Unchanged;
        }
        let text = std::mem::take(&mut self.text);
        self.clear(index);
        self.mode = mode;
        self.query(index, &text)
    }

    /// Drop the query, any results and any pending request.
    pub fn clear(&mut self, index: &mut KeyIndex) {
        if let Some(pending) = self.in_flight.take() {
            log::debug!("Abandoning global search #{}", pending.id);
        }
        self.text.clear();
        self.last_term = None;
        self.settled_term = None;
        self.results.clear();
        self.error = None;
        index.filter("");
    }

    /// Drop `key` from the settled global results.
    pub fn forget(&mut self, key: &str) {
        self.results.retain(|item| item.key() != key);
    }

    pub fn view<'a>(&'a self, index: &'a KeyIndex) -> SearchView<'a> {
        if self.mode == SearchMode::ByKey {
            return SearchView::Keys(index.visible());
        }
        if let Some(pending) = &self.in_flight {
            return SearchView::Searching {
                term: &pending.term,
            };
        }
        match (&self.settled_term, &self.error) {
            (Some(term), Some(message)) => SearchView::Failed { term, message },
            (Some(term), None) => SearchView::Results {
                term,
                items: &self.results,
            },
            (None, _) => SearchView::Keys(index.visible()),
        }
    }

    /// One-line description of the settled global search
    pub fn summary(&self) -> Option<String> {
        if self.mode != SearchMode::Global || self.in_flight.is_some() {
            return None;
        }
        let term = self.settled_term.as_deref()?;
        if self.error.is_some() {
            return Some(format!("Search for \"{term}\" failed"));
        }
        Some(match self.results.len() {
            0 => format!("No matches for \"{term}\""),
            1 => format!("Found 1 match for \"{term}\""),
            n => format!("Found {n} matches for \"{term}\""),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(keys: &[&str]) -> KeyIndex {
        let mut index = KeyIndex::new();
        index.set_all(keys.iter().copied());
        index
    }

    fn hit(key: &str, preview: &str) -> SearchHit {
        SearchHit {
            key: key.to_string(),
            preview: preview.to_string(),
            match_in_key: true,
            match_in_value: false,
        }
    }

    fn issued(outcome: QueryOutcome) -> GlobalRequest {
        match outcome {
            QueryOutcome::Issued(request) => request,
            other => panic!("expected a request, got {other:?}"),
        }
    }

    fn respond(request: &GlobalRequest, hits: Vec<SearchHit>) -> GlobalResponse {
        GlobalResponse {
            id: request.id,
            term: request.term.clone(),
            outcome: Ok(hits),
        }
    }

    #[test]
    fn key_mode_filters_synchronously() {
        let mut idx = index(&["UserA", "userB", "other"]);
        let mut engine = SearchEngine::new();

        assert_eq!(engine.query(&mut idx, "  user "), QueryOutcome::Filtered);
        assert_eq!(engine.text(), "user");
        assert_eq!(engine.view(&idx), SearchView::Keys(&["UserA".to_string(), "userB".to_string()]));

        assert_eq!(engine.query(&mut idx, "   "), QueryOutcome::Cleared);
        assert_eq!(idx.visible().len(), 3);
    }

    #[test]
    fn only_one_global_search_in_flight() {
        let mut idx = index(&["a", "ab"]);
        let mut engine = SearchEngine::new();
        engine.set_mode(&mut idx, SearchMode::Global);

        let first = issued(engine.query(&mut idx, "a"));
        assert_eq!(engine.query(&mut idx, "ab"), QueryOutcome::Dropped);
        assert!(engine.is_searching());
        assert!(!engine.needs_requery());
        assert_eq!(engine.view(&idx), SearchView::Searching { term: "a" });

        assert!(engine.complete(respond(&first, vec![hit("a", "1")])));
        assert!(!engine.is_searching());
        // "ab" was typed while "a" was pending
        assert!(engine.needs_requery());
        let second = issued(engine.requery(&mut idx));
        assert_eq!(second.term, "ab");
        assert!(second.id > first.id);
    }

    #[test]
    fn results_keep_endpoint_order_with_ranges() {
        let mut idx = index(&[]);
        let mut engine = SearchEngine::new();
        engine.set_mode(&mut idx, SearchMode::Global);
        let req = issued(engine.query(&mut idx, "Cat"));

        engine.complete(respond(&req, vec![hit("zcat", "concat"), hit("cat", "CAT")]));
        let SearchView::Results { term, items } = engine.view(&idx) else {
            panic!("expected results");
        };
        assert_eq!(term, "Cat");
        let keys: Vec<_> = items.iter().map(ResultItem::key).collect();
        assert_eq!(keys, ["zcat", "cat"]);
        assert_eq!(items[0].key_ranges, vec![1..4]);
        assert_eq!(items[0].preview_html(), "con<mark>cat</mark>");
        assert_eq!(items[1].preview_segments(), vec![("CAT", true)]);
        assert_eq!(items[0].badges(), ["Key"]);
        assert_eq!(engine.summary().as_deref(), Some("Found 2 matches for \"Cat\""));
    }

    #[test]
    fn failure_empties_results_and_keeps_message() {
        let mut idx = index(&[]);
        let mut engine = SearchEngine::new();
        engine.set_mode(&mut idx, SearchMode::Global);
        let req = issued(engine.query(&mut idx, "x"));
        engine.complete(respond(&req, vec![hit("x", "")]));

        let req = issued(engine.query(&mut idx, "y"));
        engine.complete(GlobalResponse {
            id: req.id,
            term: req.term.clone(),
            outcome: Err(KvError::Network("HTTP 500".to_string())),
        });
        assert!(engine.results().is_empty());
        assert_eq!(
            engine.view(&idx),
            SearchView::Failed {
                term: "y",
                message: "HTTP 500"
            }
        );
        assert!(!engine.is_searching());
    }

    #[test]
    fn mode_switch_reissues_the_query() {
        let mut idx = index(&["alpha", "beta"]);
        let mut engine = SearchEngine::new();
        engine.set_mode(&mut idx, SearchMode::Global);
        let req = issued(engine.query(&mut idx, "al"));
        engine.complete(respond(&req, vec![hit("alpha", "")]));
        assert_eq!(engine.results().len(), 1);

        assert_eq!(engine.set_mode(&mut idx, SearchMode::ByKey), QueryOutcome::Filtered);
        assert!(engine.results().is_empty());
        assert_eq!(idx.visible(), ["alpha"]);

        let again = issued(engine.set_mode(&mut idx, SearchMode::Global));
        assert_eq!(again.term, "al");
        assert_eq!(engine.set_mode(&mut idx, SearchMode::Global), QueryOutcome::Unchanged);
    }

    #[test]
    fn abandoned_request_is_never_displayed() {
        let mut idx = index(&["k"]);
        let mut engine = SearchEngine::new();
        engine.set_mode(&mut idx, SearchMode::Global);
        let stale = issued(engine.query(&mut idx, "k"));

        engine.set_mode(&mut idx, SearchMode::ByKey);
        let fresh = issued(engine.set_mode(&mut idx, SearchMode::Global));

        assert!(!engine.complete(respond(&stale, vec![hit("stale", "")])));
        assert!(engine.is_searching());
        assert!(engine.complete(respond(&fresh, vec![hit("k", "")])));
        assert_eq!(engine.results()[0].key(), "k");
    }

    #[test]
    fn clear_abandons_pending_search() {
        let mut idx = index(&["a", "b"]);
        let mut engine = SearchEngine::new();
        engine.set_mode(&mut idx, SearchMode::Global);
        let req = issued(engine.query(&mut idx, "a"));

        engine.clear(&mut idx);
        assert!(!engine.is_searching());
        assert!(!engine.complete(respond(&req, vec![hit("a", "")])));
        assert_eq!(engine.view(&idx), SearchView::Keys(&["a".to_string(), "b".to_string()]));
        assert_eq!(engine.summary(), None);
    }

    #[test]
    fn summary_wording() {
        let mut idx = index(&[]);
        let mut engine = SearchEngine::new();
        engine.set_mode(&mut idx, SearchMode::Global);
        let req = issued(engine.query(&mut idx, "q"));
        engine.complete(respond(&req, vec![]));
        assert_eq!(engine.summary().as_deref(), Some("No matches for \"q\""));

        let req = issued(engine.query(&mut idx, "q"));
        engine.complete(respond(&req, vec![hit("q", "")]));
        assert_eq!(engine.summary().as_deref(), Some("Found 1 match for \"q\""));
    }
}
