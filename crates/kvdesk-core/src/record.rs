//! Selection and editing of a single record.
//!
//! ```text
//! Unselected -> Loading -> Ready -> Saving   -> Ready
//!                            \  -> Deleting -> Unselected
//! ```
//!
//! The controller never talks to the store itself. Every transition that needs
//! the store hands back a [`RecordRequest`]; the caller runs it (see
//! [`RecordRequest::perform`]) and feeds the [`RecordResponse`] to
//! [`RecordController::apply`]. Only the response to the most recent request is
//! applied.

use crate::codec::{self, Encoded};
use crate::error::{KvError, Result};
use crate::key_index::KeyIndex;
use crate::store::{Record, RecordStore};

/// Label shown for the record type. The store does not report one.
pub const KEY_TYPE_LABEL: &str = "String";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Unselected,
    Loading,
    Ready,
    Saving,
    Deleting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRequest {
    Load {
        ticket: u64,
        key: String,
    },
    Save {
        ticket: u64,
        key: String,
        payload: String,
    },
    Delete {
        ticket: u64,
        key: String,
    },
}

impl RecordRequest {
    pub fn ticket(&self) -> u64 {
        match self {
            RecordRequest::Load { ticket, .. }
            | RecordRequest::Save { ticket, .. }
            | RecordRequest::Delete { ticket, .. } => *ticket,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            RecordRequest::Load { key, .. }
            | RecordRequest::Save { key, .. }
            | RecordRequest::Delete { key, .. } => key,
        }
    }

    /// Run the request. Blocks until the store answers.
    pub fn perform(self, store: &dyn RecordStore) -> RecordResponse {
        match self {
            RecordRequest::Load { ticket, key } => {
                let result = store.fetch_record(&key);
                RecordResponse::Loaded {
                    ticket,
                    key,
                    result,
                }
            }
            RecordRequest::Save {
                ticket,
                key,
                payload,
            } => {
                let result = store.update_record(&key, &payload);
                RecordResponse::Saved {
                    ticket,
                    key,
                    result,
                }
            }
            RecordRequest::Delete { ticket, key } => {
                let result = store.delete_record(&key);
                RecordResponse::Deleted {
                    ticket,
                    key,
                    result,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordResponse {
    Loaded {
        ticket: u64,
        key: String,
        result: Result<Record>,
    },
    Saved {
        ticket: u64,
        key: String,
        result: Result<()>,
    },
    Deleted {
        ticket: u64,
        key: String,
        result: Result<()>,
    },
}

impl RecordResponse {
    pub fn ticket(&self) -> u64 {
        match self {
            RecordResponse::Loaded { ticket, .. }
            | RecordResponse::Saved { ticket, .. }
            | RecordResponse::Deleted { ticket, .. } => *ticket,
        }
    }
}

/// What applying a response changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEvent {
    Loaded { key: String },
    Saved { key: String },
    Deleted { key: String },
    /// Response to a request that is no longer awaited
    Ignored,
}

/// Snapshot of the selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub active_key: Option<String>,
    /// A fetch of the active key is in flight
    pub loading: bool,
    /// Editor text differs from what was last loaded or saved
    pub dirty: bool,
}

/// Editor text checked and ready to be saved.
///
/// Obtained from [`RecordController::prepare_save`]. When
/// [`SaveDraft::needs_confirmation`] is set the text is not JSON and the user
/// has to agree to store it as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDraft {
    key: String,
    encoded: Encoded,
}

impl SaveDraft {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn needs_confirmation(&self) -> bool {
        self.encoded.needs_confirmation()
    }

    pub fn parse_error(&self) -> Option<&str> {
        self.encoded.parse_error()
    }

    pub fn payload(&self) -> &str {
        self.encoded.payload()
    }
}

/// Proof that the user was asked before deleting `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    key: String,
}

impl DeleteConfirmation {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Prompt shown to the user
    pub fn prompt(&self) -> String {
        format!("Delete key \"{}\"? This cannot be undone.", self.key)
    }
}

#[derive(Debug, Default)]
pub struct RecordController {
    phase: Phase,
    active_key: Option<String>,
    record: Option<Record>,
    text: String,
    /// Text as last loaded or saved
    baseline: String,
    /// Payload of the save in flight
    saving: Option<String>,
    next_ticket: u64,
    awaiting: Option<u64>,
}

impl RecordController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    /// The record as last loaded or saved
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Editor text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.active_key.is_some() && self.text != self.baseline
    }

    pub fn selection(&self) -> Selection {
        Selection {
            active_key: self.active_key.clone(),
            loading: self.phase == Phase::Loading,
            dirty: self.is_dirty(),
        }
    }

    /// Size of the editor text, e.g. `1.5 KB`
    pub fn size_label(&self) -> String {
        format_bytes(self.text.len() as u64)
    }

    fn next_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.awaiting = Some(self.next_ticket);
        self.next_ticket
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.phase {
            Phase::Saving => Err(KvError::usage("A save is still in progress")),
            Phase::Deleting => Err(KvError::usage("A delete is still in progress")),
            _ => Ok(()),
        }
    }

    fn ready_key(&self) -> Result<&str> {
        let key = self
            .active_key
            .as_deref()
            .ok_or_else(|| KvError::usage("Select a key first"))?;
        match self.phase {
            Phase::Ready => Ok(key),
            Phase::Loading => Err(KvError::usage(format!("\"{key}\" is still loading"))),
            _ => {
                self.ensure_idle()?;
                Err(KvError::usage("Select a key first"))
            }
        }
    }

    /// Make `key` the active record. Selecting the active key does nothing.
    pub fn select(&mut self, key: &str) -> Result<Option<RecordRequest>> {
        if self.active_key.as_deref() == Some(key) {
            return Ok(None);
        }
        self.ensure_idle()?;
        Ok(Some(self.load(key.to_string())))
    }

    /// Fetch the active record again, discarding unsaved edits.
    pub fn reload(&mut self) -> Result<RecordRequest> {
        self.ensure_idle()?;
        let key = self
            .active_key
            .clone()
            .ok_or_else(|| KvError::usage("Select a key first"))?;
        Ok(self.load(key))
    }

    fn load(&mut self, key: String) -> RecordRequest {
        let ticket = self.next_ticket();
        log::debug!("Loading {key:?} (ticket {ticket})");
        self.phase = Phase::Loading;
        self.active_key = Some(key.clone());
        self.record = None;
        self.text.clear();
        self.baseline.clear();
        RecordRequest::Load { ticket, key }
    }

    pub fn deselect(&mut self) {
        self.phase = Phase::Unselected;
        self.active_key = None;
        self.record = None;
        self.text.clear();
        self.baseline.clear();
        self.saving = None;
        self.awaiting = None;
    }

    /// Editor change notification
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Check the editor text for saving.
    pub fn prepare_save(&self) -> Result<SaveDraft> {
        let key = self.ready_key()?;
        Ok(SaveDraft {
            key: key.to_string(),
            encoded: codec::encode(&self.text),
        })
    }

    /// Issue the save for `draft`. A draft that needs confirmation is only
    /// sent with `approve_plain_text`; otherwise nothing happens.
    pub fn commit_save(
        &mut self,
        draft: SaveDraft,
        approve_plain_text: bool,
    ) -> Result<Option<RecordRequest>> {
        let key = self.ready_key()?;
        if key != draft.key {
            return Err(KvError::usage(format!(
                "Selection changed since \"{}\" was prepared",
                draft.key
            )));
        }
        if draft.needs_confirmation() && !approve_plain_text {
            log::debug!("Save of {key:?} declined as plain text");
            return Ok(None);
        }

        let payload = draft.encoded.into_payload();
        let ticket = self.next_ticket();
        self.phase = Phase::Saving;
        self.saving = Some(payload.clone());
        Ok(Some(RecordRequest::Save {
            ticket,
            key: draft.key,
            payload,
        }))
    }

    /// Prepare and commit in one step, asking `confirm` only when the text is
    /// not JSON.
    pub fn save(
        &mut self,
        confirm: impl FnOnce(&SaveDraft) -> bool,
    ) -> Result<Option<RecordRequest>> {
        let draft = self.prepare_save()?;
        let approved = draft.needs_confirmation() && confirm(&draft);
        self.commit_save(draft, approved)
    }

    /// First step of a delete. The token must be passed to [`Self::delete`].
    pub fn request_delete(&self) -> Result<DeleteConfirmation> {
        let key = self.ready_key()?;
        Ok(DeleteConfirmation {
            key: key.to_string(),
        })
    }

    pub fn delete(&mut self, confirmation: DeleteConfirmation) -> Result<RecordRequest> {
        let key = self.ready_key()?;
        if key != confirmation.key {
            return Err(KvError::usage(format!(
                "\"{}\" is no longer selected",
                confirmation.key
            )));
        }
        let ticket = self.next_ticket();
        self.phase = Phase::Deleting;
        Ok(RecordRequest::Delete {
            ticket,
            key: confirmation.key,
        })
    }

    /// Pretty-print the editor text. On error the text is left untouched.
    pub fn format_current_text(&mut self) -> Result<()> {
        self.ready_key()?;
        self.text = codec::format_json(&self.text)?;
        Ok(())
    }

    pub fn validate_current_text(&self) -> Result<()> {
        self.ready_key()?;
        codec::validate_json(&self.text)
    }

    /// Apply a store response.
    ///
    /// Failures are returned after the state has been updated: a failed load
    /// leaves nothing selected, a failed save keeps the editor text, a failed
    /// delete keeps the record.
    pub fn apply(&mut self, index: &mut KeyIndex, response: RecordResponse) -> Result<RecordEvent> {
        if self.awaiting != Some(response.ticket()) {
            log::debug!("Ignoring stale record response (ticket {})", response.ticket());
            return Ok(RecordEvent::Ignored);
        }
        self.awaiting = None;

        match response {
            RecordResponse::Loaded { key, result, .. } => match result {
                Ok(record) => {
                    self.text = codec::editable_text(&record);
                    self.baseline = self.text.clone();
                    self.record = Some(record);
                    self.phase = Phase::Ready;
                    Ok(RecordEvent::Loaded { key })
                }
                Err(e) => {
                    log::warn!("Failed to load {key:?}: {e}");
                    self.deselect();
                    Err(e)
                }
            },
            RecordResponse::Saved { key, result, .. } => {
                self.phase = Phase::Ready;
                let payload = self.saving.take().unwrap_or_default();
                match result {
                    Ok(()) => {
                        if let Some(record) = self.record.as_mut() {
                            *record = Record::from_payload(key.clone(), payload.clone());
                        }
                        self.baseline = payload;
                        Ok(RecordEvent::Saved { key })
                    }
                    Err(e) => {
                        log::warn!("Failed to save {key:?}: {e}");
                        Err(e)
                    }
                }
            }
            RecordResponse::Deleted { key, result, .. } => match result {
                Ok(()) => {
                    index.remove(&key);
                    self.deselect();
                    Ok(RecordEvent::Deleted { key })
                }
                Err(e) => {
                    log::warn!("Failed to delete {key:?}: {e}");
                    self.phase = Phase::Ready;
                    Err(e)
                }
            },
        }
    }
}

/// Human-readable byte count: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
