//! UI rendering

use std::time::Instant;

use kvdesk_core::highlight::Highlighter;
use kvdesk_core::record::{KEY_TYPE_LABEL, Phase};
use kvdesk_core::search::ResultItem;
use kvdesk_core::{SearchMode, SearchView};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, StatefulWidget, Wrap},
};

use super::app::{App, BrowseModal, Modal, SettingsForm};
use super::input::TextInput;

const SELECTION_BG: Color = Color::Rgb(38, 38, 38);

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn match_style(base: Style) -> Style {
    base.fg(Color::Black).bg(Color::Yellow)
}

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &mut App) {
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40), // Left: keys + search
            Constraint::Percentage(60), // Right: record
        ])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Key or result list
            Constraint::Length(1), // Count or search summary
            Constraint::Length(1), // Status bar (mode + shortcuts)
            Constraint::Length(1), // Toast line (notifications)
            Constraint::Length(1), // Search input
        ])
        .split(main_chunks[0]);

    render_key_list(frame, app, left_chunks[0]);
    render_count_line(frame, app, left_chunks[1]);
    render_status_bar(frame, app, left_chunks[2]);
    render_toast_line(frame, app, left_chunks[3]);
    frame.render_widget(
        Paragraph::new(input_line(&app.search_input, Color::Yellow)),
        left_chunks[4],
    );

    render_record_panel(frame, app, main_chunks[1]);

    match &mut app.modal {
        Some(Modal::ConfirmDelete(confirmation)) => {
            render_confirm(frame, &confirmation.prompt(), "Delete", Color::Red);
        }
        Some(Modal::ConfirmSave(draft)) => {
            let mut prompt = String::from("The value is not valid JSON");
            if let Some(error) = draft.parse_error() {
                prompt.push_str(&format!(" ({error})"));
            }
            prompt.push_str(&format!(". Save \"{}\" as plain text?", draft.key()));
            render_confirm(frame, &prompt, "Save", Color::Yellow);
        }
        Some(Modal::Settings(form)) => render_settings(frame, form),
        Some(Modal::Browse(modal)) => render_browser(frame, modal),
        None => {}
    }

    // Command palette overlay (rendered last, on top)
    if app.show_command_palette {
        render_command_palette(frame, app);
    }
}

/// Single-line input: bar prefix, text, and a block cursor
fn input_line(input: &TextInput, prefix: Color) -> Line<'_> {
    let cursor_style = Style::default().fg(Color::White).bg(Color::DarkGray);
    let text_style = Style::default().fg(Color::White);

    let (before, after) = input.text.split_at(input.cursor);
    let cursor_char = after.chars().next();
    let after_cursor = cursor_char.map_or("", |c| &after[c.len_utf8()..]);

    let mut spans = vec![Span::styled("▌ ", Style::default().fg(prefix))];
    if !before.is_empty() {
        spans.push(Span::styled(before, text_style));
    }
    match cursor_char {
        Some(c) => spans.push(Span::styled(c.to_string(), cursor_style)),
        None => spans.push(Span::styled("█", Style::default().fg(Color::White))),
    }
    if !after_cursor.is_empty() {
        spans.push(Span::styled(after_cursor, text_style));
    }
    Line::from(spans)
}

/// Spans for text split into matched and unmatched segments
fn highlighted<'a>(segments: Vec<(&'a str, bool)>, base: Style) -> Vec<Span<'a>> {
    segments
        .into_iter()
        .map(|(text, matched)| {
            let style = if matched { match_style(base) } else { base };
            Span::styled(text, style)
        })
        .collect()
}

fn placeholder(frame: &mut Frame, text: String, style: Style, area: Rect) {
    let y = area.y + area.height / 2;
    let line_area = Rect {
        y,
        height: 1.min(area.height),
        ..area
    };
    frame.render_widget(
        Paragraph::new(text)
            .style(style)
            .alignment(Alignment::Center),
        line_area,
    );
}

fn render_key_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = format!(" {} ", app.store_url);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(Color::Gray).add_modifier(Modifier::DIM))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let active = app.session.record.active_key().map(str::to_string);
    let selected = app.list_state.selected();

    let items: Vec<ListItem> = match app.session.view() {
        SearchView::Searching { term } => {
            let spinner = spinner_frame(app.started_at);
            placeholder(
                frame,
                format!("{spinner} Searching for \"{term}\"..."),
                Style::default().fg(Color::Yellow),
                inner,
            );
            return;
        }
        SearchView::Failed { term, message } => {
            placeholder(
                frame,
                format!("✗ Search for \"{term}\" failed: {message}"),
                Style::default().fg(Color::Red),
                inner,
            );
            return;
        }
        SearchView::Keys(keys) if keys.is_empty() => {
            let text = if app.keys_loading {
                format!("{} Loading keys...", spinner_frame(app.started_at))
            } else if app.session.keys.is_empty() {
                "No keys in the store".to_string()
            } else {
                "No keys match".to_string()
            };
            placeholder(frame, text, dim(), inner);
            return;
        }
        SearchView::Results { items, .. } if items.is_empty() => {
            placeholder(frame, "No matches".to_string(), dim(), inner);
            return;
        }
        SearchView::Keys(keys) => {
            let highlighter = Highlighter::new(app.session.search.text());
            keys.iter()
                .enumerate()
                .map(|(i, key)| {
                    key_item(
                        highlighter.segments(key),
                        selected == Some(i),
                        active.as_deref() == Some(key.as_str()),
                    )
                })
                .collect()
        }
        SearchView::Results { items, .. } => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                result_item(
                    item,
                    selected == Some(i),
                    active.as_deref() == Some(item.key()),
                    inner.width as usize,
                )
            })
            .collect(),
    };

    StatefulWidget::render(List::new(items), inner, frame.buffer_mut(), &mut app.list_state);
}

fn key_item(segments: Vec<(&str, bool)>, is_selected: bool, is_active: bool) -> ListItem<'_> {
    let base = if is_selected {
        Style::default().bg(SELECTION_BG)
    } else {
        Style::default()
    };
    let prefix = match (is_selected, is_active) {
        (true, _) => Span::styled("▌ ", base.fg(Color::LightRed)),
        (false, true) => Span::styled("• ", base.fg(Color::Green)),
        (false, false) => Span::styled("  ", base),
    };
    let text_style = if is_active {
        base.fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        base.fg(Color::White)
    };

    let mut spans = vec![prefix];
    spans.extend(highlighted(segments, text_style));
    ListItem::new(Line::from(spans)).style(base)
}

/// Two lines: key with match badges, then the value preview
fn result_item(item: &ResultItem, is_selected: bool, is_active: bool, width: usize) -> ListItem<'_> {
    let base = if is_selected {
        Style::default().bg(SELECTION_BG)
    } else {
        Style::default()
    };
    let prefix_style = if is_selected {
        base.fg(Color::LightRed)
    } else {
        base
    };
    let prefix = if is_selected { "▌ " } else { "  " };
    let key_style = if is_active {
        base.fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        base.fg(Color::White).add_modifier(Modifier::BOLD)
    };

    let mut first = vec![Span::styled(prefix, prefix_style)];
    first.extend(highlighted(item.key_segments(), key_style));
    for badge in item.badges() {
        first.push(Span::styled(" ", base));
        first.push(Span::styled(
            format!("[{badge}]"),
            base.fg(Color::Cyan).add_modifier(Modifier::DIM),
        ));
    }

    // Previews are single-line in the list
    let preview_width = width.saturating_sub(2);
    let mut second = vec![Span::styled(prefix, prefix_style)];
    let mut used = 0;
    for (text, matched) in item.preview_segments() {
        let text = text.replace(['\n', '\r'], " ");
        let remaining = preview_width.saturating_sub(used);
        if remaining == 0 {
            break;
        }
        let clipped: String = text.chars().take(remaining).collect();
        used += clipped.chars().count();
        let style = base.fg(Color::Gray);
        second.push(Span::styled(
            clipped,
            if matched { match_style(style) } else { style },
        ));
    }

    ListItem::new(vec![Line::from(first), Line::from(second)]).style(base)
}

fn render_count_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.session.search.mode() {
        SearchMode::ByKey => {
            let total = app.session.keys.len();
            let visible = app.session.keys.visible().len();
            let mut spans = vec![Span::styled(format!("  {visible}/{total} keys"), dim())];
            if app.keys_loading && total > 0 {
                spans.push(Span::styled(
                    format!(" {} refreshing", spinner_frame(app.started_at)),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::DIM),
                ));
            }
            Line::from(spans)
        }
        SearchMode::Global => match app.session.search.summary() {
            Some(summary) => {
                let style = if app.session.search.error().is_some() {
                    Style::default().fg(Color::Red).add_modifier(Modifier::DIM)
                } else {
                    dim()
                };
                Line::from(Span::styled(format!("  {summary}"), style))
            }
            None if app.session.search.text().is_empty() => {
                Line::from(Span::styled("  Type to search keys and values", dim()))
            }
            None => Line::from(""),
        },
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let bracket = dim();
    let mode = app.session.search.mode();
    let mode_color = match mode {
        SearchMode::ByKey => Color::Magenta,
        SearchMode::Global => Color::Cyan,
    };

    let mut spans = vec![
        Span::styled("  mode:", dim()),
        Span::styled(
            format!("{:<6}", mode.label()),
            Style::default().fg(mode_color).add_modifier(Modifier::BOLD),
        ),
    ];
    for hint in ["Tab mode", "↑↓ select", "Enter open", "^o cmds", "^p settings"] {
        spans.push(Span::styled(" [", bracket));
        spans.push(Span::styled(hint, dim()));
        spans.push(Span::styled("]", bracket));
    }
    let esc = if app.search_input.text.is_empty() {
        "Esc quit"
    } else {
        "Esc clear"
    };
    spans.extend([
        Span::styled(" [", bracket),
        Span::styled(esc, dim()),
        Span::styled("]", bracket),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the toast notification line (below status bar)
fn render_toast_line(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(ref toast) = app.toast {
        let bracket = dim();
        let toast_style = if toast.is_error {
            Style::default().fg(Color::Red).add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(Color::Blue).add_modifier(Modifier::DIM)
        };

        let spans = vec![
            Span::styled("  [", bracket),
            Span::styled(&toast.message, toast_style),
            Span::styled("]", bracket),
        ];
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn render_record_panel(frame: &mut Frame, app: &App, area: Rect) {
    let record = &app.session.record;
    let title = match record.active_key() {
        Some(key) => format!(" {key} "),
        None => " Record ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(Color::Gray).add_modifier(Modifier::DIM))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let phase = record.phase();
    match phase {
        Phase::Unselected => {
            placeholder(frame, "Select a key to view its value".to_string(), dim(), inner);
            return;
        }
        Phase::Loading => {
            let spinner = spinner_frame(app.started_at);
            placeholder(frame, format!("{spinner} Loading..."), dim(), inner);
            return;
        }
        Phase::Ready | Phase::Saving | Phase::Deleting => {}
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Badges, size, state
            Constraint::Length(1), // Spacer
            Constraint::Min(1),    // Value
            Constraint::Length(1), // Record shortcuts
        ])
        .split(inner);

    let is_json = record.record().is_some_and(|r| r.is_json);
    let mut header = vec![
        Span::raw(" "),
        Span::styled(
            format!(" {KEY_TYPE_LABEL} "),
            Style::default().fg(Color::Black).bg(Color::Magenta),
        ),
        Span::raw(" "),
        Span::styled(
            if is_json { " JSON " } else { " Text " },
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::styled(format!("  {}", record.size_label()), dim()),
    ];
    let state = match phase {
        Phase::Saving => Some((
            format!("{} Saving", spinner_frame(app.started_at)),
            Color::Yellow,
        )),
        Phase::Deleting => Some((
            format!("{} Deleting", spinner_frame(app.started_at)),
            Color::Red,
        )),
        _ if record.is_dirty() => Some(("● modified".to_string(), Color::Yellow)),
        _ => None,
    };
    if let Some((text, color)) = state {
        header.push(Span::raw("  "));
        header.push(Span::styled(text, Style::default().fg(color)));
    }
    frame.render_widget(Paragraph::new(Line::from(header)), chunks[0]);

    let body = Rect {
        x: chunks[2].x + 1,
        width: chunks[2].width.saturating_sub(1),
        ..chunks[2]
    };
    frame.render_widget(
        Paragraph::new(record.text())
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: false }),
        body,
    );

    let mut hints = Vec::new();
    for hint in ["^e edit", "^s save", "^f format", "^y copy", "^x delete", "^r refresh"] {
        hints.push(Span::styled(" [", dim()));
        hints.push(Span::styled(hint, dim()));
        hints.push(Span::styled("]", dim()));
    }
    frame.render_widget(Paragraph::new(Line::from(hints)), chunks[3]);
}

/// Rect of `width` x `height` centered in `area`, clamped to fit
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + area.height / 5,
        width,
        height,
    )
}

fn modal_block(title: String, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(color))
        .title(title)
}

fn hint_line(hints: &[&'static str]) -> Line<'static> {
    let mut spans = Vec::new();
    for hint in hints {
        spans.push(Span::styled(" [", dim()));
        spans.push(Span::styled(*hint, dim()));
        spans.push(Span::styled("]", dim()));
    }
    Line::from(spans)
}

fn render_confirm(frame: &mut Frame, prompt: &str, action: &'static str, color: Color) {
    let width = (frame.area().width * 50 / 100).max(40);
    let area = centered(frame.area(), width, 7);
    frame.render_widget(Clear, area);
    let block = modal_block(format!(" {action}? "), color);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(
        Paragraph::new(prompt.to_string())
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: true }),
        chunks[0],
    );
    let hints: &[&'static str] = if action == "Delete" {
        &["y/Enter delete", "n/Esc cancel"]
    } else {
        &["y/Enter save as text", "n/Esc cancel"]
    };
    frame.render_widget(Paragraph::new(hint_line(hints)), chunks[1]);
}

fn render_settings(frame: &mut Frame, form: &SettingsForm) {
    let width = (frame.area().width * 60 / 100).max(50);
    let area = centered(frame.area(), width, 8);
    frame.render_widget(Clear, area);
    let block = modal_block(" Store settings ".to_string(), Color::Green);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Label
            Constraint::Length(1), // Input
            Constraint::Length(1), // Error or status
            Constraint::Min(0),
            Constraint::Length(1), // Hints
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(Span::styled("Database path", dim())), chunks[0]);
    frame.render_widget(Paragraph::new(input_line(&form.input, Color::Green)), chunks[1]);

    let status = if form.saving {
        Some(Span::styled("Saving...", Style::default().fg(Color::Yellow)))
    } else {
        form.error
            .as_deref()
            .map(|e| Span::styled(format!("✗ {e}"), Style::default().fg(Color::Red)))
    };
    if let Some(status) = status {
        frame.render_widget(Paragraph::new(status), chunks[2]);
    }
    frame.render_widget(
        Paragraph::new(hint_line(&["Enter save", "^b browse", "Esc cancel"])),
        chunks[4],
    );
}

fn render_browser(frame: &mut Frame, modal: &mut BrowseModal) {
    let width = (frame.area().width * 60 / 100).max(50);
    let area = centered(frame.area(), width, 20);
    frame.render_widget(Clear, area);
    let block = modal_block(format!(" {} ", modal.browser.directory()), Color::Green);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let hints = hint_line(&["Enter open", "Enter again use file", "⌫ up", "Esc back"]);
    frame.render_widget(Paragraph::new(hints), chunks[1]);

    let browser = &modal.browser;
    if browser.is_loading() {
        placeholder(frame, "Loading...".to_string(), dim(), chunks[0]);
        return;
    }
    if let Some(error) = browser.error() {
        placeholder(
            frame,
            format!("✗ {error}"),
            Style::default().fg(Color::Red),
            chunks[0],
        );
        return;
    }
    if browser.is_empty_dir() {
        placeholder(
            frame,
            "No directories or database files here".to_string(),
            dim(),
            chunks[0],
        );
        return;
    }

    let selected = modal.list_state.selected();
    let items: Vec<ListItem> = browser
        .items()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let is_selected = selected == Some(i);
            let is_chosen = browser.selected_file() == Some(entry.path.as_str());
            let base = if is_selected {
                Style::default().bg(SELECTION_BG)
            } else {
                Style::default()
            };
            let prefix = if is_selected {
                Span::styled("▌ ", base.fg(Color::LightRed))
            } else {
                Span::styled("  ", base)
            };
            let name = if entry.is_dir() {
                Span::styled(format!("{}/", entry.name), base.fg(Color::Blue))
            } else if is_chosen {
                Span::styled(
                    format!("{} ✓", entry.name),
                    base.fg(Color::Green).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(entry.name.clone(), base.fg(Color::White))
            };
            ListItem::new(Line::from(vec![prefix, name])).style(base)
        })
        .collect();

    StatefulWidget::render(
        List::new(items),
        chunks[0],
        frame.buffer_mut(),
        &mut modal.list_state,
    );
}

fn spinner_frame(started_at: Instant) -> &'static str {
    const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let elapsed = started_at.elapsed().as_millis() / 80;
    FRAMES[(elapsed as usize) % FRAMES.len()]
}

/// Render the command palette overlay
fn render_command_palette(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let width = (area.width * 40 / 100)
        .max(40)
        .min(area.width.saturating_sub(4));
    let height = 20.min(area.height.saturating_sub(4));
    let x = (area.width.saturating_sub(width)) / 2;
    let y = area.height / 5;
    let palette_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, palette_area);
    let block = modal_block(" Commands ".to_string(), Color::Green);
    let inner = block.inner(palette_area);
    frame.render_widget(block, palette_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Search input
            Constraint::Length(1), // Empty line
            Constraint::Min(1),    // Commands
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(input_line(&app.command_palette_input, Color::Yellow)),
        chunks[0],
    );

    let phase = app.session.record.phase();
    let inner_width = chunks[2].width as usize;
    let items: Vec<ListItem> = app
        .command_palette_filtered
        .iter()
        .enumerate()
        .map(|(i, cmd)| {
            let is_selected = i == app.command_palette_index;
            let is_enabled = cmd.is_enabled(phase);
            let base = if is_selected {
                Style::default().bg(SELECTION_BG)
            } else {
                Style::default()
            };
            let (name_style, prefix_style) = match (is_selected, is_enabled) {
                (true, true) => (
                    base.fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    base.fg(Color::LightRed),
                ),
                (true, false) => (
                    base.fg(Color::Gray).add_modifier(Modifier::BOLD),
                    base.fg(Color::DarkGray),
                ),
                (false, true) => (base.fg(Color::White), base),
                (false, false) => (base.fg(Color::Gray).add_modifier(Modifier::DIM), base),
            };
            let desc_style = base.fg(Color::DarkGray);
            let prefix = if is_selected { "▌ " } else { "  " };

            let shortcut = cmd.shortcut().unwrap_or("");
            let name = cmd.name();
            let pad = inner_width.saturating_sub(2 + name.len() + shortcut.chars().count());
            let desc_pad = inner_width.saturating_sub(2 + cmd.description().chars().count());

            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(prefix, prefix_style),
                    Span::styled(name, name_style),
                    Span::styled(" ".repeat(pad), base),
                    Span::styled(shortcut, desc_style),
                ]),
                Line::from(vec![
                    Span::styled(prefix, prefix_style),
                    Span::styled(cmd.description(), desc_style),
                    Span::styled(" ".repeat(desc_pad), base),
                ]),
            ])
        })
        .collect();

    frame.render_widget(List::new(items), chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn centered_rect_fits_small_terminals() {
        let area = Rect::new(0, 0, 30, 10);
        let rect = centered(area, 80, 20);
        assert_eq!(rect.width, 26);
        assert_eq!(rect.height, 8);
        assert_eq!(rect.x, 2);
    }

    #[test]
    fn input_line_shows_the_cursor_in_place() {
        let mut input = TextInput::with_text("abc");
        input.cursor = 1;
        let line = input_line(&input, Color::Yellow);
        let texts: Vec<_> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, ["▌ ", "a", "b", "c"]);

        input.cursor = 3;
        let line = input_line(&input, Color::Yellow);
        let texts: Vec<_> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, ["▌ ", "abc", "█"]);
    }

    #[test]
    fn key_item_marks_matches() {
        let highlighter = Highlighter::new("ord");
        let item = key_item(highlighter.segments("user:order"), false, false);
        let backend = TestBackend::new(20, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| f.render_widget(List::new(vec![item]), f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let row: String = (0..12).map(|x| buffer[(x, 0)].symbol()).collect();
        assert_eq!(row, "  user:order");
        assert_eq!(buffer[(7, 0)].bg, Color::Yellow);
        assert_eq!(buffer[(6, 0)].bg, Color::Reset);
    }
}
