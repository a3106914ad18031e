use std::collections::HashMap;
use std::sync::Mutex;

use kvdesk_core::{
    DirectoryListing, KvError, Record, RecordStore, Result, SearchHit, StoreConfig,
};
use serde_json::Value;

/// Store operations, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListKeys,
    Fetch,
    Update,
    Delete,
    Search,
    GetConfig,
    PutConfig,
    Browse,
}

/// A call made against the store, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListKeys,
    Fetch(String),
    Update(String, String),
    Delete(String),
    Search(String),
    GetConfig,
    PutConfig(String),
    Browse(String),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::ListKeys => Op::ListKeys,
            Call::Fetch(_) => Op::Fetch,
            Call::Update(..) => Op::Update,
            Call::Delete(_) => Op::Delete,
            Call::Search(_) => Op::Search,
            Call::GetConfig => Op::GetConfig,
            Call::PutConfig(_) => Op::PutConfig,
            Call::Browse(_) => Op::Browse,
        }
    }
}

#[derive(Default)]
struct State {
    /// Raw payload text per key, in insertion order
    records: Vec<(String, String)>,
    config: StoreConfig,
    directories: HashMap<String, DirectoryListing>,
    calls: Vec<Call>,
    failures: HashMap<Op, KvError>,
}

/// In-memory store that interprets payloads the way the HTTP service does:
/// text that parses as JSON comes back structured with `is_json` set.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `(key, raw payload)` pairs
    pub fn with_records<'a>(records: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        for (key, raw) in records {
            store.insert(key, raw);
        }
        store
    }

    pub fn insert(&self, key: &str, raw: &str) {
        let mut state = self.state.lock().unwrap();
        match state.records.iter_mut().find(|(k, _)| k == key) {
            Some((_, value)) => *value = raw.to_string(),
            None => state.records.push((key.to_string(), raw.to_string())),
        }
    }

    pub fn set_config(&self, config: StoreConfig) {
        self.state.lock().unwrap().config = config;
    }

    pub fn add_directory(&self, listing: DirectoryListing) {
        let mut state = self.state.lock().unwrap();
        state.directories.insert(listing.directory.clone(), listing);
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: Op, error: KvError) {
        self.state.lock().unwrap().failures.insert(op, error);
    }

    /// Raw payload currently stored under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, raw)| raw.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.records.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls of a single kind
    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op() == op).collect()
    }

    fn begin(&self, call: Call) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        let op = call.op();
        state.calls.push(call);
        let failure = state.failures.remove(&op);
        match failure {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn to_record(key: &str, raw: &str) -> Record {
    if raw.is_empty() {
        return Record {
            key: key.to_string(),
            value: None,
            raw_value: String::new(),
            is_json: false,
        };
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Record {
            key: key.to_string(),
            value: Some(value),
            raw_value: raw.to_string(),
            is_json: true,
        },
        Err(_) => Record::text(key, raw),
    }
}

impl RecordStore for FakeStore {
    fn list_keys(&self) -> Result<Vec<String>> {
        let state = self.begin(Call::ListKeys)?;
        Ok(state.records.iter().map(|(k, _)| k.clone()).collect())
    }

    fn fetch_record(&self, key: &str) -> Result<Record> {
        let state = self.begin(Call::Fetch(key.to_string()))?;
        state
            .records
            .iter()
            .find(|(k, _)| k == key)
            .map(|(k, raw)| to_record(k, raw))
            .ok_or_else(|| KvError::Api("Key not found".to_string()))
    }

    fn update_record(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.begin(Call::Update(key.to_string(), value.to_string()))?;
        match state.records.iter_mut().find(|(k, _)| k == key) {
            Some((_, raw)) => {
                *raw = value.to_string();
                Ok(())
            }
            None => Err(KvError::Api("Record to update not found".to_string())),
        }
    }

    fn delete_record(&self, key: &str) -> Result<()> {
        let mut state = self.begin(Call::Delete(key.to_string()))?;
        let before = state.records.len();
        state.records.retain(|(k, _)| k != key);
        if state.records.len() == before {
            return Err(KvError::Api("Record to delete not found".to_string()));
        }
        Ok(())
    }

    fn search(&self, term: &str) -> Result<Vec<SearchHit>> {
        let state = self.begin(Call::Search(term.to_string()))?;
        let needle = term.to_lowercase();
        Ok(state
            .records
            .iter()
            .filter_map(|(key, raw)| {
                let match_in_key = key.to_lowercase().contains(&needle);
                let match_in_value = raw.to_lowercase().contains(&needle);
                (match_in_key || match_in_value).then(|| SearchHit {
                    key: key.clone(),
                    preview: raw.chars().take(100).collect(),
                    match_in_key,
                    match_in_value,
                })
            })
            .collect())
    }

    fn get_config(&self) -> Result<StoreConfig> {
        let state = self.begin(Call::GetConfig)?;
        Ok(state.config.clone())
    }

    fn put_config(&self, db_path: &str) -> Result<StoreConfig> {
        let mut state = self.begin(Call::PutConfig(db_path.to_string()))?;
        state.config.db_path = Some(db_path.to_string());
        Ok(state.config.clone())
    }

    fn browse(&self, directory: &str) -> Result<DirectoryListing> {
        let state = self.begin(Call::Browse(directory.to_string()))?;
        state
            .directories
            .get(directory)
            .cloned()
            .ok_or_else(|| KvError::Api(format!("Directory does not exist: {directory}")))
    }
}
