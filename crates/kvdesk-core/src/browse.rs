//! Remote directory navigation for picking the store's backing file.

use crate::error::{KvError, Result};
use crate::store::{DirEntry, DirectoryListing, RecordStore, StoreConfig};

/// Directory one level up. `/a/b` gives `/a`; `/a` and `/` give `/`.
pub fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(i) if i > 0 => path[..i].to_string(),
        _ => "/".to_string(),
    }
}

/// Where the browser opens: the directory holding the current store file, or
/// the filesystem root.
pub fn start_directory(config: Option<&StoreConfig>) -> String {
    config
        .and_then(|c| c.db_path.as_deref())
        .filter(|path| path.contains('/'))
        .map(parent_of)
        .unwrap_or_else(|| "/".to_string())
}

/// Trim and check a database path entered in the settings form.
pub fn validate_db_path(input: &str) -> Result<String> {
    let path = input.trim();
    if path.is_empty() {
        return Err(KvError::usage("Enter a database path"));
    }
    Ok(path.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseRequest {
    pub ticket: u64,
    pub directory: String,
}

impl BrowseRequest {
    pub fn perform(self, store: &dyn RecordStore) -> BrowseResponse {
        let result = store.browse(&self.directory);
        BrowseResponse {
            ticket: self.ticket,
            directory: self.directory,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowseResponse {
    pub ticket: u64,
    pub directory: String,
    pub result: Result<DirectoryListing>,
}

/// File browser state. Listing requests are guarded by tickets like record
/// requests, so only the most recently opened directory is shown.
#[derive(Debug, Default)]
pub struct FileBrowser {
    directory: String,
    items: Vec<DirEntry>,
    error: Option<String>,
    selected_file: Option<String>,
    awaiting: Option<u64>,
    next_ticket: u64,
}

impl FileBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory being shown (or loading)
    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn items(&self) -> &[DirEntry] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Listed successfully and nothing in it
    pub fn is_empty_dir(&self) -> bool {
        !self.is_loading() && self.error.is_none() && self.items.is_empty()
    }

    pub fn selected_file(&self) -> Option<&str> {
        self.selected_file.as_deref()
    }

    /// Show `directory`. Clears the file selection.
    pub fn open(&mut self, directory: impl Into<String>) -> BrowseRequest {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let directory = directory.into();
        log::debug!("Listing {directory:?} (ticket {ticket})");

        self.awaiting = Some(ticket);
        self.directory = directory.clone();
        self.items.clear();
        self.error = None;
        self.selected_file = None;
        BrowseRequest { ticket, directory }
    }

    pub fn parent(&mut self) -> BrowseRequest {
        let parent = parent_of(&self.directory);
        self.open(parent)
    }

    /// Act on the entry at `index`: directories are entered, files selected.
    pub fn activate(&mut self, index: usize) -> Option<BrowseRequest> {
        let entry = self.items.get(index)?.clone();
        if entry.is_dir() {
            Some(self.open(entry.path))
        } else {
            self.selected_file = Some(entry.path);
            None
        }
    }

    /// The selected file, to be placed in the settings form
    pub fn confirm(&self) -> Option<String> {
        self.selected_file.clone()
    }

    /// Apply a listing. Returns `false` for a superseded request.
    pub fn apply(&mut self, response: BrowseResponse) -> bool {
        if self.awaiting != Some(response.ticket) {
            log::debug!("Ignoring stale listing of {:?}", response.directory);
            return false;
        }
        self.awaiting = None;

        match response.result {
            Ok(listing) => {
                if !listing.directory.is_empty() {
                    self.directory = listing.directory;
                }
                self.items = listing.items;
            }
            Err(e) => {
                log::warn!("Failed to list {:?}: {e}", response.directory);
                self.error = Some(e.to_string());
            }
        }
        true
    }
}
