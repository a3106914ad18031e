//! Client-side logic for administering a remote key/value record store.
//!
//! Nothing here performs I/O on its own: store calls go through the
//! [`RecordStore`] trait and the state machines hand out request values for the
//! caller to run.

pub mod browse;
pub mod codec;
pub mod error;
pub mod highlight;
pub mod key_index;
pub mod record;
pub mod search;
pub mod session;
pub mod store;

pub use error::{KvError, Result};
pub use key_index::KeyIndex;
pub use record::{RecordController, RecordEvent, RecordRequest, RecordResponse};
pub use search::{GlobalRequest, GlobalResponse, QueryOutcome, SearchEngine, SearchMode, SearchView};
pub use session::Session;
pub use store::{DirEntry, DirectoryListing, EntryKind, Record, RecordStore, SearchHit, StoreConfig};
