//! The record store boundary.
//!
//! Everything the core needs from the remote key/value service is expressed by
//! [`RecordStore`]. The HTTP implementation lives in `kvdesk-api`; tests use an
//! in-memory fake.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A stored record as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    /// Decoded payload. `None` when the store holds nothing (or JSON `null`).
    #[serde(default)]
    pub value: Option<Value>,
    /// Literal payload text
    #[serde(default)]
    pub raw_value: String,
    /// Store hint: treat the payload as structured JSON
    #[serde(default)]
    pub is_json: bool,
}

impl Record {
    /// Record whose payload is a JSON value.
    pub fn json(key: impl Into<String>, value: Value) -> Self {
        let raw_value = value.to_string();
        Self {
            key: key.into(),
            value: Some(value),
            raw_value,
            is_json: true,
        }
    }

    /// Record as the store holds it after `payload` was written: structured
    /// when the text parses as JSON, opaque text otherwise.
    pub fn from_payload(key: impl Into<String>, payload: String) -> Self {
        match serde_json::from_str::<Value>(&payload) {
            Ok(value) => Self {
                key: key.into(),
                value: Some(value),
                raw_value: payload,
                is_json: true,
            },
            Err(_) => Self::text(key, payload),
        }
    }

    /// Record whose payload is opaque text.
    pub fn text(key: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            key: key.into(),
            value: Some(Value::String(text.clone())),
            raw_value: text,
            is_json: false,
        }
    }
}

/// One hit from the full-content search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub key: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub match_in_key: bool,
    #[serde(default)]
    pub match_in_value: bool,
}

/// Server-side configuration. Only `db_path` is interpreted; anything else is
/// kept so that it round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Contents of a remote directory, as listed by the browse endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub items: Vec<DirEntry>,
}

/// Operations offered by the remote record store.
///
/// Calls block until the store answers; callers that must stay responsive run
/// them on a worker thread.
pub trait RecordStore: Send + Sync {
    /// All keys, in store order
    fn list_keys(&self) -> Result<Vec<String>>;

    fn fetch_record(&self, key: &str) -> Result<Record>;

    /// Replace the payload of `key` with exactly `value`
    fn update_record(&self, key: &str, value: &str) -> Result<()>;

    fn delete_record(&self, key: &str) -> Result<()>;

    /// Full-content search. Results are returned in endpoint order.
    fn search(&self, term: &str) -> Result<Vec<SearchHit>>;

    fn get_config(&self) -> Result<StoreConfig>;

    /// Point the store at a different backing file. Returns the saved config.
    fn put_config(&self, db_path: &str) -> Result<StoreConfig>;

    fn browse(&self, directory: &str) -> Result<DirectoryListing>;
}
