use crate::error::Result;
use crate::key_index::KeyIndex;
use crate::record::{RecordController, RecordEvent, RecordRequest, RecordResponse};
use crate::search::{GlobalResponse, QueryOutcome, SearchEngine, SearchMode, SearchView};
use crate::store::{RecordStore, StoreConfig};

/// All client state for one connection to a store.
///
/// Owned by a single thread. Store calls happen elsewhere (worker threads or
/// inline) and their results come back through the `apply_*` and
/// `complete_search` methods.
#[derive(Debug, Default)]
pub struct Session {
    pub keys: KeyIndex,
    pub search: SearchEngine,
    pub record: RecordController,
    /// Store configuration as last fetched or saved
    pub config: Option<StoreConfig>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh key listing, keeping an active key-name filter.
    pub fn apply_keys(&mut self, keys: Vec<String>) {
        self.keys.set_all(keys);
        if self.search.mode() == SearchMode::ByKey && !self.search.text().is_empty() {
            self.keys.filter(self.search.text());
        }
    }

    pub fn query(&mut self, text: &str) -> QueryOutcome {
        self.search.query(&mut self.keys, text)
    }

    pub fn set_mode(&mut self, mode: SearchMode) -> QueryOutcome {
        self.search.set_mode(&mut self.keys, mode)
    }

    pub fn toggle_mode(&mut self) -> QueryOutcome {
        let mode = self.search.mode().toggle();
        self.set_mode(mode)
    }

    pub fn requery(&mut self) -> QueryOutcome {
        self.search.requery(&mut self.keys)
    }

    pub fn clear_search(&mut self) {
        self.search.clear(&mut self.keys);
    }

    pub fn complete_search(&mut self, response: GlobalResponse) -> bool {
        self.search.complete(response)
    }

    pub fn apply_record(&mut self, response: RecordResponse) -> Result<RecordEvent> {
        let event = self.record.apply(&mut self.keys, response)?;
        if let RecordEvent::Deleted { key } = &event {
            self.search.forget(key);
        }
        Ok(event)
    }

    pub fn view(&self) -> SearchView<'_> {
        self.search.view(&self.keys)
    }

    /// Fetch the key list inline.
    pub fn load_keys(&mut self, store: &dyn RecordStore) -> Result<usize> {
        let keys = store.list_keys()?;
        let count = keys.len();
        self.apply_keys(keys);
        Ok(count)
    }

    /// Run a record request inline and apply its response.
    pub fn run_record(
        &mut self,
        store: &dyn RecordStore,
        request: RecordRequest,
    ) -> Result<RecordEvent> {
        let response = request.perform(store);
        self.apply_record(response)
    }

    /// Run `outcome`'s global request inline, if it issued one.
    pub fn run_search(&mut self, store: &dyn RecordStore, outcome: QueryOutcome) -> QueryOutcome {
        if let QueryOutcome::Issued(request) = &outcome {
            let response = request.clone().perform(store);
            self.complete_search(response);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_keys_keep_the_name_filter() {
        let mut session = Session::new();
        session.apply_keys(vec!["user:1".into(), "order:1".into()]);
        session.query("user");
        assert_eq!(session.keys.visible(), ["user:1"]);

        session.apply_keys(vec!["user:1".into(), "user:2".into(), "order:2".into()]);
        assert_eq!(session.keys.visible(), ["user:1", "user:2"]);
        assert_eq!(session.keys.len(), 3);
    }

    #[test]
    fn toggle_switches_modes() {
        let mut session = Session::new();
        assert_eq!(session.toggle_mode(), QueryOutcome::Cleared);
        assert_eq!(session.search.mode(), SearchMode::Global);
        assert!(matches!(session.query("x"), QueryOutcome::Issued(_)));
        assert_eq!(session.toggle_mode(), QueryOutcome::Filtered);
        assert!(!session.search.is_searching());
    }
}
