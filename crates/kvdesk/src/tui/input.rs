//! Single-line text input used for the search box, the command palette and
//! the settings form.

use crossterm::event::{KeyCode, KeyModifiers};

/// Text plus a byte cursor that always sits on a char boundary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub text: String,
    pub cursor: usize,
}

/// Word separators. Includes the punctuation common in key names
/// (`user:42`, `cache/page`, `a.b`).
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | ':' | '.' | '-' | '_')
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn prev_boundary(&self) -> usize {
        self.text[..self.cursor]
            .char_indices()
            .next_back()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self) -> usize {
        self.text[self.cursor..]
            .chars()
            .next()
            .map_or(self.cursor, |c| self.cursor + c.len_utf8())
    }

    /// Start of the word before the cursor, skipping separators first
    fn word_start(&self) -> usize {
        let before = &self.text[..self.cursor];
        let end = before.trim_end_matches(is_separator).len();
        before[..end]
            .rfind(is_separator)
            .map_or(0, |i| i + before[i..].chars().next().map_or(1, char::len_utf8))
    }

    /// End of the word after the cursor, skipping separators first
    fn word_end(&self) -> usize {
        let after = &self.text[self.cursor..];
        let skipped = after.len() - after.trim_start_matches(is_separator).len();
        let rest = &after[skipped..];
        let word = rest.find(is_separator).unwrap_or(rest.len());
        self.cursor + skipped + word
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        let start = self.prev_boundary();
        self.text.drain(start..self.cursor);
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        let end = self.next_boundary();
        self.text.drain(self.cursor..end);
    }

    pub fn delete_word(&mut self) {
        let start = self.word_start();
        self.text.drain(start..self.cursor);
        self.cursor = start;
    }

    /// Handle a key. Returns `true` if the key was consumed.
    ///
    /// Emacs-style bindings: `^U` clear, `^W`/`Alt+Backspace` delete word,
    /// `^A`/`Home` start, `End` end, `Alt+B`/`Alt+F` and `^←`/`^→` by word.
    /// `^E` is left to the caller.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        // macOS Option may report as SUPER
        let alt = modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER);

        match code {
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char('w') if ctrl => self.delete_word(),
            KeyCode::Backspace if alt => self.delete_word(),
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.len(),
            KeyCode::Char('b') if alt => self.cursor = self.word_start(),
            KeyCode::Char('f') if alt => self.cursor = self.word_end(),
            KeyCode::Left if alt || ctrl => self.cursor = self.word_start(),
            KeyCode::Right if alt || ctrl => self.cursor = self.word_end(),
            KeyCode::Left => self.cursor = self.prev_boundary(),
            KeyCode::Right => self.cursor = self.next_boundary(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Char(c) if !ctrl && !alt => self.insert_char(c),
            _ => return false,
        }
        true
    }
}
