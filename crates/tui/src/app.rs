use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use games_editor_core::{
    probe::{FieldProbe, ProbeFailure, UrlStatus},
    AppConfig, Entry, Field, HttpUrlChecker, LoadError, Mode, PendingCreate, ProbeReport,
    EditSession, UrlChecker,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{sync::mpsc, task};
use tracing::{debug, error, info};

use crate::input::{FieldInput, MAX_INPUT_CHARS};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    accent: Color,
    muted: Color,
    selection_bg: Color,
    warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::Rgb(40, 44, 52),
            warning: Color::Yellow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Filter,
    EditField,
}

#[derive(Debug)]
enum Confirm {
    CreateDespiteUrls(PendingCreate),
    Delete,
    Quit,
    Reload,
}

#[derive(Debug)]
struct ConfirmModal {
    title: String,
    lines: Vec<String>,
    action: Confirm,
}

enum AppEvent {
    Input(Event),
    Tick,
    ProbeFinished(Entry, ProbeReport),
}

/// Terminal front end over an [`EditSession`].
pub struct EditorApp {
    session: EditSession,
    config: AppConfig,
    state: UiState,
    editor: Option<FieldInput>,
    modal: Option<ConfirmModal>,
    probing: bool,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl EditorApp {
    pub fn new(session: EditSession, config: AppConfig) -> Self {
        let mut state = UiState::default();
        state.set_status(format!(
            "Loaded {} games from {}",
            session.entries().len(),
            session.data_file().display()
        ));
        Self {
            session,
            config,
            state,
            editor: None,
            modal: None,
            probing: false,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    /// Surface a failed startup load; the session is already empty.
    pub fn report_load_error(&mut self, err: &LoadError) {
        self.state.set_status(format!("Failed to load: {err}"));
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) || self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if let Err(err) = self.handle_key(key) {
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            Some(AppEvent::ProbeFinished(entry, report)) => {
                self.probing = false;
                self.handle_probe_finished(entry, report);
                true
            }
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }
        if self.probing {
            self.state.set_status("Checking URLs…".to_string());
            return Ok(());
        }
        if key.modifiers == KeyModifiers::CONTROL {
            match key.code {
                KeyCode::Char('s') => {
                    self.save();
                    return Ok(());
                }
                KeyCode::Char('r') => {
                    self.request_reload();
                    return Ok(());
                }
                KeyCode::Char('c') => {
                    self.request_quit();
                    return Ok(());
                }
                _ => {}
            }
        }
        match self.state.mode {
            InputMode::Filter => self.handle_filter_key(key),
            InputMode::EditField => self.handle_edit_key(key),
            InputMode::Normal => match self.state.focus {
                Focus::List => self.handle_list_key(key),
                Focus::Form => self.handle_form_key(key),
            },
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.state.mode = InputMode::Normal;
                self.state.set_status(format!(
                    "{} of {} games shown",
                    self.session.view_len(),
                    self.session.entries().len()
                ));
            }
            KeyCode::Backspace => {
                self.state.filter.pop();
                self.apply_filter();
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.state.filter.push(c);
                    self.apply_filter();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Result<()> {
        let total = self.session.view_len();
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.request_quit(),
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1, total),
            KeyCode::Home => self.state.move_to(0, total),
            KeyCode::End => self.state.move_to(total.saturating_sub(1), total),
            KeyCode::PageDown => self.state.page(1, total),
            KeyCode::PageUp => self.state.page(-1, total),
            KeyCode::Char('/') => {
                self.state.mode = InputMode::Filter;
                self.state.set_status("Type to filter, Enter to finish".to_string());
            }
            KeyCode::Char('n') if key.modifiers.is_empty() => self.start_create(),
            KeyCode::Char('d') if key.modifiers.is_empty() => self.request_delete(),
            KeyCode::Enter => self.select_cursor()?,
            KeyCode::Tab => self.state.focus = Focus::Form,
            _ => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.move_field(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_field(-1),
            KeyCode::Enter | KeyCode::Char('e') => {
                let field = self.state.current_field();
                self.editor = Some(FieldInput::new(field, self.session.field(field)));
                self.state.mode = InputMode::EditField;
            }
            KeyCode::Char('c') if key.modifiers.is_empty() => self.commit()?,
            KeyCode::Char('x') if key.modifiers.is_empty() => {
                if self.session.mode().is_creating() {
                    self.session.cancel_create()?;
                    self.state.set_status("New entry discarded".to_string());
                }
            }
            KeyCode::Char('n') if key.modifiers.is_empty() => self.start_create(),
            KeyCode::Char('d') if key.modifiers.is_empty() => self.request_delete(),
            KeyCode::Char('q') if key.modifiers.is_empty() => self.request_quit(),
            KeyCode::Esc | KeyCode::Tab => self.state.focus = Focus::List,
            _ => {}
        }
        Ok(())
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(editor) = self.editor.as_mut() else {
            self.state.mode = InputMode::Normal;
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.editor = None;
                self.state.mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                let field = editor.field;
                let value = editor.value().to_string();
                if value != self.session.field(field) {
                    self.session.set_field(field, value);
                }
                self.editor = None;
                self.state.mode = InputMode::Normal;
                self.state.move_field(1);
            }
            KeyCode::Left => editor.move_cursor(-1),
            KeyCode::Right => editor.move_cursor(1),
            KeyCode::Home => editor.move_home(),
            KeyCode::End => editor.move_end(),
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Delete => editor.delete(),
            KeyCode::Char('u') if key.modifiers == KeyModifiers::CONTROL => editor.clear(),
            KeyCode::Char(ch) => {
                if !(key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT) {
                    return Ok(());
                }
                if editor.is_full() {
                    self.state.set_status(format!(
                        "{} is limited to {MAX_INPUT_CHARS} characters",
                        editor.field.label()
                    ));
                } else {
                    editor.insert(ch);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Result<()> {
        let accepted = match key.code {
            KeyCode::Char('y') | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Esc => false,
            _ => return Ok(()),
        };
        let Some(modal) = self.modal.take() else {
            return Ok(());
        };
        match (modal.action, accepted) {
            (Confirm::CreateDespiteUrls(pending), true) => self.finish_create(pending)?,
            (Confirm::CreateDespiteUrls(_), false) => {
                self.state.set_status("Entry not added".to_string());
            }
            (Confirm::Delete, true) => {
                let removed = self.session.delete_selected()?;
                self.state.clamp_cursor(self.session.view_len());
                self.state.set_status(format!("Deleted {}", removed.display_name()));
            }
            (Confirm::Quit, true) => self.state.should_quit = true,
            (Confirm::Reload, true) => self.reload(),
            (Confirm::Delete, false) | (Confirm::Quit, false) | (Confirm::Reload, false) => {
                self.state.set_status("Cancelled".to_string());
            }
        }
        Ok(())
    }

    fn apply_filter(&mut self) {
        let matches = self.session.search(&self.state.filter);
        self.state.move_to(0, matches);
        self.state.set_status(format!("Filter: {}", self.state.filter));
    }

    fn start_create(&mut self) {
        self.session.start_create();
        self.state.focus = Focus::Form;
        self.state.field_cursor = 0;
        self.state.set_status("Enter the details of the new game".to_string());
    }

    fn select_cursor(&mut self) -> Result<()> {
        if self.session.view_len() == 0 {
            return Ok(());
        }
        let entry = self.session.select(self.state.cursor)?;
        let status = format!("Editing {}", entry.display_name());
        self.state.set_status(status);
        self.state.focus = Focus::Form;
        self.state.field_cursor = 0;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        match self.session.mode() {
            Mode::Creating => self.begin_create(),
            Mode::Editing { .. } => match self.session.commit_update() {
                Ok(_) => {
                    if let Some(index) = self.session.selected_index() {
                        self.state.move_to(index, self.session.view_len());
                    }
                    self.state.set_status("Entry updated".to_string());
                    Ok(())
                }
                Err(err) => {
                    self.state.set_status(err.to_string());
                    Ok(())
                }
            },
        }
    }

    fn begin_create(&mut self) -> Result<()> {
        let entry = match self.session.candidate() {
            Ok(entry) => entry,
            Err(err) => {
                self.state.set_status(err.to_string());
                return Ok(());
            }
        };
        if entry.url_fields().is_empty() {
            return self.finish_create(PendingCreate::new(entry, ProbeReport::default()));
        }

        let Some(sender) = self.event_tx.clone() else {
            return Ok(());
        };
        self.probing = true;
        self.state.set_status("Checking URLs…".to_string());
        let config = self.config.clone();
        task::spawn_blocking(move || {
            let report = probe_entry(&config, &entry);
            if sender
                .blocking_send(AppEvent::ProbeFinished(entry, report))
                .is_err()
            {
                debug!("UI closed before the URL check finished");
            }
        });
        Ok(())
    }

    fn handle_probe_finished(&mut self, entry: Entry, report: ProbeReport) {
        let pending = PendingCreate::new(entry, report);
        if pending.needs_confirmation() {
            let mut lines = pending.report.lines();
            lines.push(String::new());
            lines.push("Some URLs could not be reached. Add the entry anyway?".to_string());
            self.modal = Some(ConfirmModal {
                title: format!("URL check: {}", pending.report.summary()),
                lines,
                action: Confirm::CreateDespiteUrls(pending),
            });
            return;
        }
        if let Err(err) = self.finish_create(pending) {
            self.state.set_status(format!("Error: {err}"));
        }
    }

    fn finish_create(&mut self, pending: PendingCreate) -> Result<()> {
        let summary = pending.report.summary();
        let checked = pending.report.total_checked;
        match self.session.finish_create(pending) {
            Ok(_) => {
                self.state.filter.clear();
                if let Some(index) = self.session.selected_index() {
                    self.state.move_to(index, self.session.view_len());
                }
                let message = if checked > 0 {
                    format!("Entry added ({summary})")
                } else {
                    "Entry added".to_string()
                };
                self.state.set_status(message);
            }
            Err(err) => self.state.set_status(err.to_string()),
        }
        Ok(())
    }

    fn request_delete(&mut self) {
        let Some(entry) = self.session.selected_entry() else {
            self.state.set_status("Select a game to delete".to_string());
            return;
        };
        self.modal = Some(ConfirmModal {
            title: "Delete".to_string(),
            lines: vec![format!("Delete '{}'?", entry.display_name())],
            action: Confirm::Delete,
        });
    }

    fn request_quit(&mut self) {
        if !self.session.needs_exit_confirmation() {
            self.state.should_quit = true;
            return;
        }
        self.modal = Some(ConfirmModal {
            title: "Unsaved changes".to_string(),
            lines: vec!["There are unsaved changes. Quit anyway?".to_string()],
            action: Confirm::Quit,
        });
    }

    fn request_reload(&mut self) {
        if !self.session.needs_exit_confirmation() {
            self.reload();
            return;
        }
        self.modal = Some(ConfirmModal {
            title: "Unsaved changes".to_string(),
            lines: vec!["Reloading discards unsaved changes. Continue?".to_string()],
            action: Confirm::Reload,
        });
    }

    fn save(&mut self) {
        match self.session.save() {
            Ok(report) => {
                info!(written = report.written, "Saved from UI");
                let message = match report.backup {
                    Some(backup) => format!(
                        "Saved {} games (backup: {})",
                        report.written,
                        backup.display()
                    ),
                    None => format!("Saved {} games", report.written),
                };
                let message = match self.session.backups() {
                    Ok(backups) if !backups.is_empty() => {
                        format!("{message}, {} backups kept", backups.len())
                    }
                    Ok(_) => message,
                    Err(err) => {
                        debug!(%err, "Could not list backups");
                        message
                    }
                };
                self.state.set_status(message);
            }
            Err(err) => {
                error!(%err, "Save failed");
                self.state.set_status(format!("Save failed: {err}"));
            }
        }
    }

    fn reload(&mut self) {
        match self.session.load() {
            Ok(count) => {
                self.state.filter.clear();
                self.state.move_to(0, self.session.view_len());
                self.state.set_status(format!("Reloaded {count} games"));
            }
            Err(err) => {
                error!(%err, "Reload failed");
                self.state.set_status(format!("Reload failed: {err}"));
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(4)])
            .split(size);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[0]);

        self.render_list(frame, body[0]);
        self.render_form(frame, body[1]);
        self.render_status(frame, chunks[1]);
        if let Some(modal) = &self.modal {
            self.render_modal(frame, modal);
        }
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect) {
        let total = self.session.view_len();
        self.state.list_height = area.height.saturating_sub(2) as usize;
        self.state.clamp_cursor(total);
        self.state.ensure_cursor_visible(total);

        let selected_position = match self.session.mode() {
            Mode::Editing { position } => Some(position),
            Mode::Creating => None,
        };
        let view = self.session.view();
        let end = (self.state.offset + self.state.list_height).min(view.len());
        let visible = &view[self.state.offset.min(end)..end];

        let items: Vec<ListItem> = visible
            .iter()
            .map(|(position, entry)| {
                let marker = if Some(*position) == selected_position {
                    Span::styled(
                        "● ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let mut line = vec![marker, Span::raw(entry.display_name().to_string())];
                if !entry.version.is_empty() {
                    line.push(Span::styled(
                        format!(" v{}", entry.version),
                        Style::default().fg(self.theme.muted),
                    ));
                }
                ListItem::new(Line::from(line))
            })
            .collect();

        let mut list_state = ListState::default();
        if !visible.is_empty() {
            list_state.select(Some(self.state.cursor.saturating_sub(self.state.offset)));
        }

        let mut title = format!("Games ({}/{})", total, self.session.entries().len());
        if !self.session.query().is_empty() {
            title.push_str(&format!(" /{}", self.session.query()));
        }
        let border = if self.state.focus == Focus::List {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(title),
            )
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let mut title = match self.session.mode() {
            Mode::Creating => "New game".to_string(),
            Mode::Editing { .. } => "Edit game".to_string(),
        };
        if self.session.is_dirty() {
            title.push_str(" *");
        }
        let border = if self.state.focus == Focus::Form {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default()
        };

        let label_width = Field::ALL
            .iter()
            .map(|field| field.label().chars().count())
            .max()
            .unwrap_or_default();
        let mut lines = Vec::with_capacity(Field::ALL.len());
        for (idx, field) in Field::ALL.iter().enumerate() {
            let is_current = self.state.focus == Focus::Form && idx == self.state.field_cursor;
            let (label_style, value_style) = if is_current {
                let row = Style::default().bg(self.theme.selection_bg);
                (row.fg(self.theme.accent).add_modifier(Modifier::BOLD), row)
            } else {
                (Style::default().fg(self.theme.muted), Style::default())
            };
            let value = match &self.editor {
                Some(editor) if editor.field == *field => editor.value().to_string(),
                _ => self.session.field(*field).to_string(),
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:<label_width$} ", field.label()), label_style),
                Span::styled(value, value_style),
            ]));
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title),
        );
        frame.render_widget(paragraph, area);

        if let Some(editor) = &self.editor {
            let row = Field::ALL
                .iter()
                .position(|field| *field == editor.field)
                .unwrap_or_default() as u16;
            let x = area.x + 1 + label_width as u16 + 1 + editor.cursor() as u16;
            let y = area.y + 1 + row;
            frame.set_cursor(
                x.min(area.x + area.width.saturating_sub(2)),
                y.min(area.y + area.height.saturating_sub(2)),
            );
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = match self.state.mode {
            InputMode::Filter => format!("Filter: {}", self.state.filter),
            _ => self.state.status.clone(),
        };
        let hints = match (self.state.mode, self.state.focus) {
            (InputMode::Filter, _) => "Enter/Esc done",
            (InputMode::EditField, _) => "Enter keep  Esc discard  Ctrl-u clear",
            (InputMode::Normal, Focus::List) => {
                "Enter edit  n new  d delete  / filter  Tab form  ^S save  ^R reload  q quit"
            }
            (InputMode::Normal, Focus::Form) => {
                "Enter edit field  c commit  x discard new  n new  Tab list  ^S save  q quit"
            }
        };
        let mut secondary = vec![Span::styled(hints, Style::default().fg(self.theme.muted))];
        if self.session.needs_exit_confirmation() {
            secondary.push(Span::styled(
                "  [unsaved]",
                Style::default().fg(self.theme.warning),
            ));
        }
        let paragraph = Paragraph::new(vec![Line::from(primary), Line::from(secondary)])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_modal(&self, frame: &mut Frame, modal: &ConfirmModal) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(80_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let height = (modal.lines.len() as u16 + 4)
            .min(frame_area.height.saturating_sub(2))
            .max(5_u16);
        let x = frame_area.x + (frame_area.width.saturating_sub(width)) / 2;
        let y = frame_area.y + (frame_area.height.saturating_sub(height)) / 2;
        let area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, area);

        let mut lines: Vec<Line> = modal.lines.iter().cloned().map(Line::from).collect();
        lines.push(Line::from(vec![
            Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" yes  "),
            Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" no"),
        ]));
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.warning))
                    .title(modal.title.clone()),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn probe_entry(config: &AppConfig, entry: &Entry) -> ProbeReport {
    match HttpUrlChecker::from_config(config) {
        Ok(checker) => checker.check_all(entry),
        Err(err) => {
            error!(%err, "Failed to build HTTP client");
            let results = entry
                .url_fields()
                .into_iter()
                .map(|(field, url)| FieldProbe {
                    field,
                    url: url.trim().to_string(),
                    status: UrlStatus::Invalid(ProbeFailure::Unexpected(err.to_string())),
                })
                .collect();
            ProbeReport::from_results(results)
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    cursor: usize,
    offset: usize,
    list_height: usize,
    field_cursor: usize,
    filter: String,
    status: String,
    focus: Focus,
    mode: InputMode,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cursor: 0,
            offset: 0,
            list_height: 1,
            field_cursor: 0,
            filter: String::new(),
            status: "Ready".to_string(),
            focus: Focus::Form,
            mode: InputMode::Normal,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn current_field(&self) -> Field {
        Field::ALL[self.field_cursor.min(Field::ALL.len() - 1)]
    }

    fn move_field(&mut self, delta: isize) {
        let last = Field::ALL.len() as isize - 1;
        self.field_cursor = (self.field_cursor as isize + delta).clamp(0, last) as usize;
    }

    fn move_cursor(&mut self, delta: isize, total: usize) {
        if total == 0 {
            return;
        }
        let last = total as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
        self.ensure_cursor_visible(total);
    }

    fn move_to(&mut self, index: usize, total: usize) {
        if total == 0 {
            self.cursor = 0;
            self.offset = 0;
            return;
        }
        self.cursor = index.min(total - 1);
        self.ensure_cursor_visible(total);
    }

    fn page(&mut self, direction: isize, total: usize) {
        if total == 0 || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(total) as isize;
        self.move_cursor(direction * delta, total);
    }

    fn clamp_cursor(&mut self, total: usize) {
        if total == 0 {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= total {
            self.cursor = total - 1;
        }
    }

    fn ensure_cursor_visible(&mut self, total: usize) {
        if total == 0 || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = total.saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}
