//! Application state and event loop

use std::fs;
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::process::{self, ExitStatus};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use arboard::Clipboard;
use crossterm::{
    cursor::SetCursorStyle,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use kvdesk_core::browse::{FileBrowser, parent_of, start_directory, validate_db_path};
use kvdesk_core::record::{DeleteConfirmation, Phase, SaveDraft};
use kvdesk_core::{
    GlobalRequest, GlobalResponse, QueryOutcome, RecordEvent, RecordStore, SearchView, Session,
};
use ratatui::{Terminal, backend::CrosstermBackend, widgets::ListState};

use super::input::TextInput;
use super::ui;
use super::worker::{StoreEvent, StoreJob, spawn_search_worker, spawn_store_worker};

const TOAST_DURATION: Duration = Duration::from_secs(3);
const ERROR_TOAST_DURATION: Duration = Duration::from_secs(6);

/// Toast notification state
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
    pub is_error: bool,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expires_at: Instant::now() + ERROR_TOAST_DURATION,
            is_error: true,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Command palette commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Save,
    Format,
    Validate,
    Edit,
    Delete,
    Copy,
    Refresh,
    ToggleMode,
    ClearSearch,
    Settings,
    Quit,
}

impl Command {
    pub const ALL: &'static [Command] = &[
        Command::Save,
        Command::Format,
        Command::Validate,
        Command::Edit,
        Command::Delete,
        Command::Copy,
        Command::Refresh,
        Command::ToggleMode,
        Command::ClearSearch,
        Command::Settings,
        Command::Quit,
    ];

    /// Short machine-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Save => "save-record",
            Command::Format => "format-json",
            Command::Validate => "validate-json",
            Command::Edit => "edit-in-editor",
            Command::Delete => "delete-record",
            Command::Copy => "copy-value",
            Command::Refresh => "refresh",
            Command::ToggleMode => "toggle-search-mode",
            Command::ClearSearch => "clear-search",
            Command::Settings => "store-settings",
            Command::Quit => "quit",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Save => "Save the edited value (asks before saving text that is not JSON)",
            Command::Format => "Pretty-print the value as JSON",
            Command::Validate => "Check that the value is valid JSON",
            Command::Edit => "Edit the value in $VISUAL or $EDITOR",
            Command::Delete => "Delete the selected record",
            Command::Copy => "Copy the value to the clipboard",
            Command::Refresh => "Reload the key list and the open record",
            Command::ToggleMode => "Switch between key-name and global search",
            Command::ClearSearch => "Clear the search box and show every key",
            Command::Settings => "Change the store's database file",
            Command::Quit => "Exit kvdesk",
        }
    }

    pub fn shortcut(&self) -> Option<&'static str> {
        match self {
            Command::Save => Some("^s"),
            Command::Format => Some("^f"),
            Command::Validate => None,
            Command::Edit => Some("^e"),
            Command::Delete => Some("^x"),
            Command::Copy => Some("^y"),
            Command::Refresh => Some("^r"),
            Command::ToggleMode => Some("Tab"),
            Command::ClearSearch => Some("Esc"),
            Command::Settings => Some("^p"),
            Command::Quit => Some("^c"),
        }
    }

    /// Record commands need an open record
    pub fn is_enabled(&self, phase: Phase) -> bool {
        match self {
            Command::Save
            | Command::Format
            | Command::Validate
            | Command::Edit
            | Command::Delete
            | Command::Copy => phase == Phase::Ready,
            _ => true,
        }
    }

    /// Score command against a fuzzy query (higher = better match, None = no match)
    pub fn match_score(&self, query: &str) -> Option<i64> {
        use fuzzy_matcher::FuzzyMatcher;
        use fuzzy_matcher::skim::SkimMatcherV2;

        if query.is_empty() {
            return Some(0);
        }

        let matcher = SkimMatcherV2::default();
        if let Some(score) = matcher.fuzzy_match(self.name(), query) {
            return Some(score + 1000);
        }
        matcher.fuzzy_match(self.description(), query)
    }
}

/// Settings form for the store's database path
pub struct SettingsForm {
    pub input: TextInput,
    pub error: Option<String>,
    /// A config update is in flight
    pub saving: bool,
}

impl SettingsForm {
    fn new(db_path: &str) -> Self {
        Self {
            input: TextInput::with_text(db_path),
            error: None,
            saving: false,
        }
    }
}

/// File browser opened from the settings form
pub struct BrowseModal {
    pub browser: FileBrowser,
    pub list_state: ListState,
    /// Form to return to
    form: SettingsForm,
}

pub enum Modal {
    ConfirmDelete(DeleteConfirmation),
    ConfirmSave(SaveDraft),
    Settings(SettingsForm),
    Browse(BrowseModal),
}

/// Application state
pub struct App {
    pub session: Session,
    /// Search input
    pub search_input: TextInput,
    /// Selection in the key/result list
    pub list_state: ListState,
    pub should_quit: bool,
    pub toast: Option<Toast>,
    pub modal: Option<Modal>,
    /// Base URL of the store, for the title bar
    pub store_url: String,
    pub keys_loading: bool,
    /// Start of the spinner animation
    pub started_at: Instant,
    pub show_command_palette: bool,
    pub command_palette_index: usize,
    pub command_palette_input: TextInput,
    pub command_palette_filtered: Vec<Command>,
    /// Last query text handed to the search engine
    last_query: String,
    /// Debounce timer for search queries
    last_input_time: Instant,
    /// Announce the next key listing
    refresh_pending: bool,
    /// Hand the record to the external editor on the next frame
    edit_requested: bool,
    search_tx: Sender<GlobalRequest>,
    search_rx: Receiver<GlobalResponse>,
    store_tx: Sender<StoreJob>,
    store_rx: Receiver<StoreEvent>,
    clipboard: Option<Clipboard>,
}

impl App {
    /// Start the workers and request the key list and store config.
    pub fn new(store: Arc<dyn RecordStore>, store_url: impl Into<String>) -> Self {
        let (search_tx, search_req_rx) = mpsc::channel::<GlobalRequest>();
        let (search_resp_tx, search_rx) = mpsc::channel::<GlobalResponse>();
        let (store_tx, job_rx) = mpsc::channel::<StoreJob>();
        let (event_tx, store_rx) = mpsc::channel::<StoreEvent>();

        spawn_search_worker(store.clone(), search_req_rx, search_resp_tx);
        spawn_store_worker(store, job_rx, event_tx);

        let mut app = Self {
            session: Session::new(),
            search_input: TextInput::new(),
            list_state: ListState::default(),
            should_quit: false,
            toast: None,
            modal: None,
            store_url: store_url.into(),
            keys_loading: false,
            started_at: Instant::now(),
            show_command_palette: false,
            command_palette_index: 0,
            command_palette_input: TextInput::new(),
            command_palette_filtered: Command::ALL.to_vec(),
            last_query: String::new(),
            last_input_time: Instant::now(),
            refresh_pending: false,
            edit_requested: false,
            search_tx,
            search_rx,
            store_tx,
            store_rx,
            clipboard: Clipboard::new().ok(),
        };
        app.load_keys();
        app.send_job(StoreJob::GetConfig);
        app
    }

    fn send_job(&mut self, job: StoreJob) {
        if self.store_tx.send(job).is_err() {
            self.toast = Some(Toast::error("Store worker stopped"));
        }
    }

    fn load_keys(&mut self) {
        self.keys_loading = true;
        self.send_job(StoreJob::ListKeys);
    }

    fn error_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::error(message));
    }

    /// Keys currently listed, in display order
    pub fn visible_keys(&self) -> Vec<&str> {
        match self.session.view() {
            SearchView::Keys(keys) => keys.iter().map(String::as_str).collect(),
            SearchView::Results { items, .. } => items.iter().map(|item| item.key()).collect(),
            SearchView::Searching { .. } | SearchView::Failed { .. } => Vec::new(),
        }
    }

    pub fn selected_key(&self) -> Option<String> {
        let index = self.list_state.selected()?;
        self.visible_keys().get(index).map(|key| key.to_string())
    }

    fn reset_selection(&mut self) {
        let selected = (!self.visible_keys().is_empty()).then_some(0);
        self.list_state.select(selected);
    }

    /// Keep the selection in range after the list shrank
    fn clamp_selection(&mut self) {
        let len = self.visible_keys().len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            Some(_) => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.visible_keys().len();
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.list_state.select(Some(next as usize));
    }

    fn handle_outcome(&mut self, outcome: QueryOutcome) {
        match outcome {
            QueryOutcome::Issued(request) => {
                if self.search_tx.send(request).is_err() {
                    self.error_toast("Search worker stopped");
                }
                self.reset_selection();
            }
            QueryOutcome::Filtered | QueryOutcome::Cleared => self.reset_selection(),
            QueryOutcome::Dropped | QueryOutcome::Unchanged => {}
        }
    }

    /// Hand the search box text to the engine if it changed
    fn sync_query(&mut self) {
        if self.search_input.text != self.last_query {
            self.last_query = self.search_input.text.clone();
            let outcome = self.session.query(&self.last_query);
            self.handle_outcome(outcome);
        }
    }

    fn toggle_mode(&mut self) {
        self.sync_query();
        let outcome = self.session.toggle_mode();
        self.handle_outcome(outcome);
    }

    fn clear_search(&mut self) {
        self.search_input.clear();
        self.last_query.clear();
        self.session.clear_search();
        self.reset_selection();
    }

    fn open_selected(&mut self) {
        let Some(key) = self.selected_key() else {
            return;
        };
        match self.session.record.select(&key) {
            Ok(Some(request)) => self.send_job(StoreJob::Record(request)),
            Ok(None) => {}
            Err(e) => self.error_toast(e.to_string()),
        }
    }

    fn save(&mut self) {
        match self.session.record.prepare_save() {
            Ok(draft) if draft.needs_confirmation() => {
                self.modal = Some(Modal::ConfirmSave(draft));
            }
            Ok(draft) => self.commit_save(draft, false),
            Err(e) => self.error_toast(e.to_string()),
        }
    }

    fn commit_save(&mut self, draft: SaveDraft, approve_plain_text: bool) {
        match self.session.record.commit_save(draft, approve_plain_text) {
            Ok(Some(request)) => self.send_job(StoreJob::Record(request)),
            Ok(None) => self.toast = Some(Toast::info("Save cancelled")),
            Err(e) => self.error_toast(e.to_string()),
        }
    }

    fn format(&mut self) {
        match self.session.record.format_current_text() {
            Ok(()) => self.toast = Some(Toast::info("Formatted JSON")),
            Err(e) => self.error_toast(format!("Cannot format: {e}")),
        }
    }

    fn validate(&mut self) {
        match self.session.record.validate_current_text() {
            Ok(()) => self.toast = Some(Toast::info("Valid JSON")),
            Err(e) => self.error_toast(e.to_string()),
        }
    }

    fn request_delete(&mut self) {
        match self.session.record.request_delete() {
            Ok(confirmation) => self.modal = Some(Modal::ConfirmDelete(confirmation)),
            Err(e) => self.error_toast(e.to_string()),
        }
    }

    fn delete(&mut self, confirmation: DeleteConfirmation) {
        match self.session.record.delete(confirmation) {
            Ok(request) => self.send_job(StoreJob::Record(request)),
            Err(e) => self.error_toast(e.to_string()),
        }
    }

    fn request_edit(&mut self) {
        if self.session.record.phase() == Phase::Ready {
            self.edit_requested = true;
        } else {
            self.error_toast("Open a key to edit it");
        }
    }

    /// Copy the editor text to the clipboard
    fn copy_value(&mut self) {
        if self.session.record.phase() != Phase::Ready {
            self.error_toast("Nothing to copy");
            return;
        }
        let text = self.session.record.text().to_string();
        self.toast = Some(match self.clipboard.as_mut() {
            Some(clipboard) => match clipboard.set_text(text) {
                Ok(()) => Toast::info(format!("Copied {}", self.session.record.size_label())),
                Err(e) => Toast::error(format!("Failed to copy to clipboard: {e}")),
            },
            None => Toast::error("Clipboard not available"),
        });
    }

    /// Reload the key list and the open record
    fn refresh(&mut self) {
        self.refresh_pending = true;
        self.load_keys();
        if self.session.record.active_key().is_some() {
            match self.session.record.reload() {
                Ok(request) => self.send_job(StoreJob::Record(request)),
                Err(e) => self.error_toast(e.to_string()),
            }
        }
    }

    fn open_settings(&mut self) {
        let db_path = self
            .session
            .config
            .as_ref()
            .and_then(|config| config.db_path.clone())
            .unwrap_or_default();
        self.modal = Some(Modal::Settings(SettingsForm::new(&db_path)));
    }

    /// Open the file browser near the path in `form`
    fn open_browser(&mut self, form: SettingsForm) {
        let typed = form.input.text.trim();
        let directory = if typed.starts_with('/') {
            parent_of(typed)
        } else {
            start_directory(self.session.config.as_ref())
        };
        let mut browser = FileBrowser::new();
        let request = browser.open(directory);
        self.send_job(StoreJob::Browse(request));
        self.modal = Some(Modal::Browse(BrowseModal {
            browser,
            list_state: ListState::default(),
            form,
        }));
    }

    pub fn is_loading_record(&self) -> bool {
        self.session.record.selection().loading
    }

    /// Clear expired toast
    fn update_toast(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    fn poll_store(&mut self) {
        while let Ok(event) = self.store_rx.try_recv() {
            match event {
                StoreEvent::Keys(Ok(keys)) => {
                    let count = keys.len();
                    self.keys_loading = false;
                    self.session.apply_keys(keys);
                    self.clamp_selection();
                    if std::mem::take(&mut self.refresh_pending) {
                        self.toast = Some(Toast::info(format!("Refreshed {count} keys")));
                    }
                }
                StoreEvent::Keys(Err(e)) => {
                    self.keys_loading = false;
                    self.refresh_pending = false;
                    self.error_toast(format!("Failed to load keys: {e}"));
                }
                StoreEvent::Record(response) => match self.session.apply_record(response) {
                    Ok(RecordEvent::Saved { key }) => {
                        self.toast = Some(Toast::info(format!("Saved {key}")));
                    }
                    Ok(RecordEvent::Deleted { key }) => {
                        self.clamp_selection();
                        self.toast = Some(Toast::info(format!("Deleted {key}")));
                    }
                    Ok(RecordEvent::Loaded { .. } | RecordEvent::Ignored) => {}
                    Err(e) => self.error_toast(e.to_string()),
                },
                StoreEvent::Config(Ok(config)) => self.session.config = Some(config),
                StoreEvent::Config(Err(e)) => {
                    log::warn!("Failed to fetch store config: {e}");
                }
                StoreEvent::ConfigSaved(result) => self.config_saved(result),
                StoreEvent::Listing(response) => {
                    if let Some(Modal::Browse(modal)) = &mut self.modal
                        && modal.browser.apply(response)
                    {
                        let first = (!modal.browser.items().is_empty()).then_some(0);
                        modal.list_state.select(first);
                    }
                }
            }
        }
    }

    fn config_saved(&mut self, result: kvdesk_core::Result<kvdesk_core::StoreConfig>) {
        match result {
            Ok(config) => {
                let path = config.db_path.clone().unwrap_or_default();
                self.session.config = Some(config);
                if matches!(self.modal, Some(Modal::Settings(_))) {
                    self.modal = None;
                }
                // Records of the previous database are gone
                if matches!(self.session.record.phase(), Phase::Loading | Phase::Ready) {
                    self.session.record.deselect();
                }
                self.clear_search();
                self.load_keys();
                self.toast = Some(Toast::info(format!("Store now uses {path}")));
            }
            Err(e) => match &mut self.modal {
                Some(Modal::Settings(form)) => {
                    form.saving = false;
                    form.error = Some(e.to_string());
                }
                _ => self.error_toast(format!("Failed to update settings: {e}")),
            },
        }
    }

    fn poll_search(&mut self) {
        while let Ok(response) = self.search_rx.try_recv() {
            if self.session.complete_search(response) {
                self.reset_selection();
                if let Some(error) = self.session.search.error() {
                    let message = format!("Search failed: {error}");
                    self.error_toast(message);
                }
            }
        }
        if self.session.search.needs_requery() {
            let outcome = self.session.requery();
            self.handle_outcome(outcome);
        }
    }

    /// One frame of non-input work
    pub fn tick(&mut self, debounce: Duration) {
        if self.last_input_time.elapsed() >= debounce {
            self.sync_query();
        }
        self.update_toast();
        self.poll_store();
        self.poll_search();
    }

    fn execute_command(&mut self, cmd: Command) {
        match cmd {
            Command::Save => self.save(),
            Command::Format => self.format(),
            Command::Validate => self.validate(),
            Command::Edit => self.request_edit(),
            Command::Delete => self.request_delete(),
            Command::Copy => self.copy_value(),
            Command::Refresh => self.refresh(),
            Command::ToggleMode => self.toggle_mode(),
            Command::ClearSearch => self.clear_search(),
            Command::Settings => self.open_settings(),
            Command::Quit => self.should_quit = true,
        }
    }

    /// Update filtered commands based on query
    fn update_command_filter(&mut self) {
        let query = &self.command_palette_input.text;
        let mut scored: Vec<_> = Command::ALL
            .iter()
            .copied()
            .filter_map(|cmd| cmd.match_score(query).map(|score| (cmd, score)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        self.command_palette_filtered = scored.into_iter().map(|(cmd, _)| cmd).collect();
        self.command_palette_index = 0;
    }

    fn open_command_palette(&mut self) {
        self.show_command_palette = true;
        self.command_palette_index = 0;
        self.command_palette_input.clear();
        self.command_palette_filtered = Command::ALL.to_vec();
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.command_palette_input.clear();
    }

    fn handle_palette_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _)
            | (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('o'), KeyModifiers::CONTROL) => self.close_command_palette(),
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::CONTROL) => {
                self.command_palette_index = self.command_palette_index.saturating_sub(1);
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::CONTROL) => {
                let max = self.command_palette_filtered.len().saturating_sub(1);
                if self.command_palette_index < max {
                    self.command_palette_index += 1;
                }
            }
            (KeyCode::Enter, _) => {
                if let Some(&cmd) = self
                    .command_palette_filtered
                    .get(self.command_palette_index)
                {
                    self.close_command_palette();
                    self.execute_command(cmd);
                }
            }
            _ => {
                if self
                    .command_palette_input
                    .handle_key(key.code, key.modifiers)
                {
                    self.update_command_filter();
                }
            }
        }
    }

    /// Handle a key while `modal` is open. Returns the modal to show next.
    fn handle_modal_key(&mut self, modal: Modal, key: KeyEvent) -> Option<Modal> {
        let confirm = matches!(key.code, KeyCode::Char('y' | 'Y') | KeyCode::Enter);
        let cancel = matches!(key.code, KeyCode::Char('n' | 'N') | KeyCode::Esc)
            || (key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL);

        match modal {
            Modal::ConfirmDelete(confirmation) => {
                if confirm {
                    self.delete(confirmation);
                    None
                } else if cancel {
                    None
                } else {
                    Some(Modal::ConfirmDelete(confirmation))
                }
            }
            Modal::ConfirmSave(draft) => {
                if confirm {
                    self.commit_save(draft, true);
                    None
                } else if cancel {
                    self.commit_save(draft, false);
                    None
                } else {
                    Some(Modal::ConfirmSave(draft))
                }
            }
            Modal::Settings(mut form) => {
                match (key.code, key.modifiers) {
                    (KeyCode::Esc, _) => return None,
                    _ if form.saving => {}
                    (KeyCode::Char('b'), KeyModifiers::CONTROL) => {
                        self.open_browser(form);
                        return self.modal.take();
                    }
                    (KeyCode::Enter, _) => match validate_db_path(&form.input.text) {
                        Ok(path) => {
                            form.error = None;
                            form.saving = true;
                            self.send_job(StoreJob::PutConfig(path));
                        }
                        Err(e) => form.error = Some(e.to_string()),
                    },
                    _ => {
                        if form.input.handle_key(key.code, key.modifiers) {
                            form.error = None;
                        }
                    }
                }
                Some(Modal::Settings(form))
            }
            Modal::Browse(mut modal) => {
                let selected = modal.list_state.selected();
                match key.code {
                    KeyCode::Esc => return Some(Modal::Settings(modal.form)),
                    KeyCode::Up | KeyCode::Down => {
                        let len = modal.browser.items().len();
                        if len > 0 {
                            let current = selected.unwrap_or(0);
                            let next = if key.code == KeyCode::Up {
                                current.saturating_sub(1)
                            } else {
                                (current + 1).min(len - 1)
                            };
                            modal.list_state.select(Some(next));
                        }
                    }
                    KeyCode::Backspace | KeyCode::Left => {
                        let request = modal.browser.parent();
                        modal.list_state.select(None);
                        self.send_job(StoreJob::Browse(request));
                    }
                    KeyCode::Enter => {
                        let Some(index) = selected else {
                            return Some(Modal::Browse(modal));
                        };
                        let path = modal.browser.items().get(index).map(|e| e.path.clone());
                        // Enter on the already selected file uses it
                        if path.is_some() && modal.browser.selected_file() == path.as_deref() {
                            if let Some(file) = modal.browser.confirm() {
                                modal.form.input.set(file);
                                modal.form.error = None;
                            }
                            return Some(Modal::Settings(modal.form));
                        }
                        if let Some(request) = modal.browser.activate(index) {
                            modal.list_state.select(None);
                            self.send_job(StoreJob::Browse(request));
                        }
                    }
                    _ => {}
                }
                Some(Modal::Browse(modal))
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => {
                if self.search_input.text.is_empty() {
                    self.should_quit = true;
                } else {
                    self.clear_search();
                }
            }
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.should_quit = true,
            (KeyCode::Char('o'), KeyModifiers::CONTROL) => self.open_command_palette(),
            (KeyCode::Tab, _) => self.toggle_mode(),
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::CONTROL) => {
                self.move_selection(-1)
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::CONTROL) => {
                self.move_selection(1)
            }
            (KeyCode::PageUp, _) => self.move_selection(-10),
            (KeyCode::PageDown, _) => self.move_selection(10),
            (KeyCode::Enter, _) => self.open_selected(),
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => self.save(),
            (KeyCode::Char('f'), KeyModifiers::CONTROL) => self.format(),
            (KeyCode::Char('e'), KeyModifiers::CONTROL) => self.request_edit(),
            (KeyCode::Char('x'), KeyModifiers::CONTROL) => self.request_delete(),
            (KeyCode::Char('y'), KeyModifiers::CONTROL) => self.copy_value(),
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => self.refresh(),
            (KeyCode::Char('p'), KeyModifiers::CONTROL) => self.open_settings(),
            _ => {
                if self.search_input.handle_key(key.code, key.modifiers) {
                    self.last_input_time = Instant::now();
                }
            }
        }
    }

    /// Handle input event
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if self.show_command_palette {
                    self.handle_palette_key(key);
                } else if let Some(modal) = self.modal.take() {
                    self.modal = self.handle_modal_key(modal, key);
                } else {
                    self.handle_key(key);
                }
            }
            Event::Mouse(mouse) if self.modal.is_none() && !self.show_command_palette => {
                match mouse.kind {
                    MouseEventKind::ScrollUp => self.move_selection(-1),
                    MouseEventKind::ScrollDown => self.move_selection(1),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    /// Whether the record should be handed to the external editor
    fn take_edit_request(&mut self) -> bool {
        std::mem::take(&mut self.edit_requested)
    }
}

/// `$VISUAL`, then `$EDITOR`, then `vi`
fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Run `command` (which may carry arguments, like `code --wait`) on `path`
fn launch_editor(command: &str, path: &Path) -> io::Result<ExitStatus> {
    let mut parts = command.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    process::Command::new(program).args(parts).arg(path).status()
}

/// Text read back from the editor. Editors append a final newline, which is
/// dropped unless the value already ended with one.
fn edited_text(original: &str, mut edited: String) -> String {
    if !original.ends_with('\n') && edited.ends_with('\n') {
        edited.pop();
        if edited.ends_with('\r') {
            edited.pop();
        }
    }
    edited
}

/// Suspend the TUI, edit the open record in an external editor, resume.
fn edit_externally(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let Some(key) = app.session.record.active_key().map(str::to_string) else {
        return Ok(());
    };
    let original = app.session.record.text().to_string();
    let suffix = if app.session.record.record().is_some_and(|r| r.is_json) {
        ".json"
    } else {
        ".txt"
    };
    let mut file = tempfile::Builder::new()
        .prefix("kvdesk-")
        .suffix(suffix)
        .tempfile()
        .context("Failed to create a file for the editor")?;
    file.write_all(original.as_bytes())?;
    file.flush()?;

    let editor = editor_command();
    log::debug!("Editing {key:?} with {editor}");

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        SetCursorStyle::DefaultUserShape
    )?;
    let status = launch_editor(&editor, file.path());
    enable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        EnterAlternateScreen,
        EnableMouseCapture,
        SetCursorStyle::BlinkingBar
    )?;
    terminal.clear()?;

    app.toast = Some(match status {
        Ok(status) if status.success() => {
            let edited = edited_text(&original, fs::read_to_string(file.path())?);
            if edited == original {
                Toast::info("No changes")
            } else {
                app.session.record.set_text(edited);
                Toast::info(format!("Edited {key} (^s to save)"))
            }
        }
        Ok(status) => Toast::error(format!("{editor} exited with {status}")),
        Err(e) => Toast::error(format!("Failed to run {editor}: {e}")),
    });
    Ok(())
}

/// Run the TUI application
pub fn run(store: Arc<dyn RecordStore>, store_url: &str) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        SetCursorStyle::BlinkingBar
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, store_url);

    let result = run_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        SetCursorStyle::DefaultUserShape
    )?;
    terminal.show_cursor()?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    // Global searches hit the server; wait for a pause in typing
    const DEBOUNCE: Duration = Duration::from_millis(150);
    // ~60Hz
    const FRAME_TIME: Duration = Duration::from_micros(16_667);

    loop {
        let frame_start = Instant::now();

        let mut events_processed = 0usize;
        while event::poll(Duration::from_millis(0))? && events_processed < 100 {
            app.handle_event(event::read()?);
            events_processed += 1;
            if app.should_quit {
                break;
            }
        }
        if app.should_quit {
            break;
        }

        if app.take_edit_request() {
            edit_externally(terminal, app)?;
        }

        app.tick(DEBOUNCE);

        terminal.draw(|f| ui::render(f, app))?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - elapsed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::thread;

    use kvdesk_test_utils::{Call, FakeStore, Op};

    use super::*;

    fn start(store: &Arc<FakeStore>) -> App {
        let mut app = App::new(store.clone(), "http://fake");
        wait_until(&mut app, |app| !app.keys_loading);
        app
    }

    fn wait_until(app: &mut App, done: impl Fn(&App) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(app) {
            assert!(Instant::now() < deadline, "timed out waiting for the app");
            app.tick(Duration::ZERO);
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn ctrl(app: &mut App, c: char) {
        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::CONTROL,
        )));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn open(app: &mut App, key: &str) {
        let index = app.visible_keys().iter().position(|k| *k == key).unwrap();
        app.list_state.select(Some(index));
        press(app, KeyCode::Enter);
        wait_until(app, |app| app.session.record.phase() == Phase::Ready);
    }

    #[test]
    fn typing_filters_keys_by_name() {
        let store = Arc::new(FakeStore::with_records([
            ("user:1", "{}"),
            ("user:2", "{}"),
            ("order:1", "{}"),
        ]));
        let mut app = start(&store);
        assert_eq!(app.visible_keys().len(), 3);

        type_text(&mut app, "USER");
        wait_until(&mut app, |app| app.visible_keys().len() == 2);
        assert_eq!(app.selected_key().as_deref(), Some("user:1"));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.visible_keys().len(), 3);
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn plain_text_save_asks_first() {
        let store = Arc::new(FakeStore::with_records([("note", "hello")]));
        let mut app = start(&store);
        open(&mut app, "note");
        app.session.record.set_text("hello there");

        ctrl(&mut app, 's');
        assert!(matches!(app.modal, Some(Modal::ConfirmSave(_))));
        press(&mut app, KeyCode::Char('n'));
        assert!(app.modal.is_none());
        assert!(store.calls_of(Op::Update).is_empty());

        ctrl(&mut app, 's');
        press(&mut app, KeyCode::Char('y'));
        wait_until(&mut app, |app| !app.session.record.is_dirty());
        assert_eq!(store.raw("note").as_deref(), Some("hello there"));
    }

    #[test]
    fn confirmed_delete_removes_the_key() {
        let store = Arc::new(FakeStore::with_records([("a", "1"), ("b", "2")]));
        let mut app = start(&store);
        open(&mut app, "b");

        ctrl(&mut app, 'x');
        let Some(Modal::ConfirmDelete(confirmation)) = &app.modal else {
            panic!("expected a delete confirmation");
        };
        assert_eq!(confirmation.key(), "b");
        press(&mut app, KeyCode::Enter);

        wait_until(&mut app, |app| app.visible_keys() == ["a"]);
        assert_eq!(store.keys(), ["a"]);
        assert_eq!(app.session.record.active_key(), None);
    }

    #[test]
    fn tab_runs_a_global_search() {
        let store = Arc::new(FakeStore::with_records([
            ("user:1", r#"{"name":"Ada"}"#),
            ("user:2", r#"{"name":"Grace"}"#),
        ]));
        let mut app = start(&store);

        type_text(&mut app, "grace");
        press(&mut app, KeyCode::Tab);
        wait_until(&mut app, |app| !app.session.search.is_searching());
        assert_eq!(app.visible_keys(), ["user:2"]);
        assert_eq!(
            app.session.search.summary().as_deref(),
            Some("Found 1 match for \"grace\"")
        );
        assert_eq!(store.calls_of(Op::Search), [Call::Search("grace".to_string())]);
    }

    #[test]
    fn blank_database_path_is_rejected() {
        let store = Arc::new(FakeStore::new());
        let mut app = start(&store);

        ctrl(&mut app, 'p');
        ctrl(&mut app, 'u');
        press(&mut app, KeyCode::Enter);
        let Some(Modal::Settings(form)) = &app.modal else {
            panic!("expected the settings form");
        };
        assert_eq!(form.error.as_deref(), Some("Enter a database path"));
        assert!(store.calls_of(Op::PutConfig).is_empty());
    }

    #[test]
    fn palette_ranks_names_first() {
        let store = Arc::new(FakeStore::new());
        let mut app = start(&store);

        ctrl(&mut app, 'o');
        type_text(&mut app, "delete");
        assert_eq!(app.command_palette_filtered[0], Command::Delete);

        press(&mut app, KeyCode::Esc);
        assert!(!app.show_command_palette);
        assert!(!app.should_quit);
    }

    #[test]
    fn editor_newline_is_dropped() {
        assert_eq!(edited_text("{}", "{\"a\":1}\n".to_string()), "{\"a\":1}");
        assert_eq!(edited_text("x\n", "y\n".to_string()), "y\n");
    }
}
