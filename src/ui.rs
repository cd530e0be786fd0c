use std::collections::HashMap;
use std::env;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use arboard::Clipboard;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use semver::Version;
use textwrap::wrap;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::markdown;
use crate::permalink::{self, CommentKey};
use crate::stash::{FetchOutcome, Stash};
use crate::storage::{CommentRecord, Status};
use crate::update;

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
const COLOR_BORDER_FOCUSED: Color = Color::Rgb(137, 180, 250);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);
const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const DETAIL_SCROLL_STEP: u16 = 5;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    List,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum FetchKind {
    Submit,
    Refresh,
    RefreshAll,
}

enum AsyncResponse {
    Fetch {
        kind: FetchKind,
        comment_id: String,
        result: Result<FetchOutcome>,
    },
    Update {
        result: Result<Option<update::UpdateInfo>>,
    },
}

struct Spinner {
    index: usize,
}

impl Spinner {
    fn new() -> Self {
        Self { index: 0 }
    }

    fn advance(&mut self) -> bool {
        self.index = (self.index + 1) % SPINNER_FRAMES.len();
        true
    }

    fn reset(&mut self) {
        self.index = 0;
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index]
    }
}

#[derive(Default)]
struct InputLine {
    value: String,
}

impl InputLine {
    fn insert_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.value.push(ch);
        }
    }

    fn backspace(&mut self) {
        self.value.pop();
    }

    fn clear(&mut self) {
        self.value.clear();
    }

    // Pasted text arrives with whatever the terminal passed through; keep
    // printable characters only, a URL never spans lines.
    fn push_str(&mut self, pasted: &str) {
        for ch in pasted.chars() {
            self.insert_char(ch);
        }
    }
}

pub struct Options {
    pub status_message: String,
    pub records: Vec<CommentRecord>,
    pub stash: Arc<Stash>,
    pub config_path: String,
}

pub struct Model {
    status_message: String,
    status_is_error: bool,
    focus: Focus,
    input: InputLine,
    records: Vec<CommentRecord>,
    body_cache: HashMap<String, Text<'static>>,
    list_state: ListState,
    detail_scroll: u16,
    pending_fetches: usize,
    spinner: Spinner,
    needs_redraw: bool,
    update_notice: Option<update::UpdateInfo>,
    update_checked: bool,
    update_check_in_progress: bool,
    current_version: Version,
    stash: Arc<Stash>,
    config_path: String,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let current_version =
            Version::parse(crate::VERSION).expect("crate version is valid semver");
        let (response_tx, response_rx) = unbounded();
        let mut model = Self {
            status_message: opts.status_message,
            status_is_error: false,
            focus: if opts.records.is_empty() {
                Focus::Input
            } else {
                Focus::List
            },
            input: InputLine::default(),
            records: opts.records,
            body_cache: HashMap::new(),
            list_state: ListState::default(),
            detail_scroll: 0,
            pending_fetches: 0,
            spinner: Spinner::new(),
            needs_redraw: true,
            update_notice: None,
            update_checked: false,
            update_check_in_progress: false,
            current_version,
            stash: opts.stash,
            config_path: opts.config_path,
            response_tx,
            response_rx,
        };
        model.rebuild_body_cache();
        if !model.records.is_empty() {
            model.list_state.select(Some(0));
        }
        model.queue_update_check();
        model
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(EnableBracketedPaste)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(DisableBracketedPaste)?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.set_error(format!("Error: {err}"));
                            }
                        }
                    }
                    Event::Paste(data) => {
                        if self.focus == Focus::Input {
                            self.input.push_str(&data);
                            self.mark_dirty();
                        }
                    }
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if self.poll_async() {
                self.mark_dirty();
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.is_loading() {
                    if self.spinner.advance() {
                        self.mark_dirty();
                    }
                } else {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::List => self.handle_list_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.focus = Focus::List;
                self.mark_dirty();
            }
            KeyCode::Enter => self.submit_input(),
            KeyCode::Backspace => {
                self.input.backspace();
                self.mark_dirty();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                self.mark_dirty();
            }
            KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.paste_from_clipboard();
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert_char(ch);
                self.mark_dirty();
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('i') | KeyCode::Char('/') => {
                self.focus = Focus::Input;
                self.mark_dirty();
            }
            KeyCode::Char('j') | KeyCode::Down => self.select_offset(1),
            KeyCode::Char('k') | KeyCode::Up => self.select_offset(-1),
            KeyCode::Char('g') | KeyCode::Home => self.select_index(0),
            KeyCode::Char('G') | KeyCode::End => {
                self.select_index(self.records.len().saturating_sub(1))
            }
            KeyCode::Char('r') => self.refresh_selected(),
            KeyCode::Char('R') => self.refresh_all(),
            KeyCode::Char('d') => self.delete_selected()?,
            KeyCode::Char('o') => self.open_selected(),
            KeyCode::Char('y') => self.copy_selected(),
            KeyCode::Char('J') | KeyCode::PageDown => {
                self.detail_scroll = self.detail_scroll.saturating_add(DETAIL_SCROLL_STEP);
                self.mark_dirty();
            }
            KeyCode::Char('K') | KeyCode::PageUp => {
                self.detail_scroll = self.detail_scroll.saturating_sub(DETAIL_SCROLL_STEP);
                self.mark_dirty();
            }
            _ => {}
        }
        Ok(false)
    }

    fn selected_record(&self) -> Option<&CommentRecord> {
        self.list_state
            .selected()
            .and_then(|index| self.records.get(index))
    }

    fn select_offset(&mut self, delta: isize) {
        if self.records.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let last = self.records.len() as isize - 1;
        let next = (current + delta).clamp(0, last) as usize;
        self.select_index(next);
    }

    fn select_index(&mut self, index: usize) {
        if self.records.is_empty() {
            return;
        }
        let index = index.min(self.records.len() - 1);
        if self.list_state.selected() != Some(index) {
            self.detail_scroll = 0;
        }
        self.list_state.select(Some(index));
        self.mark_dirty();
    }

    fn submit_input(&mut self) {
        let raw = self.input.value.trim().to_string();
        if raw.is_empty() {
            self.set_status("Paste a Reddit comment URL first.");
            return;
        }
        match permalink::parse(&raw) {
            Ok(key) => {
                self.input.clear();
                self.focus = Focus::List;
                self.set_status(format!("Fetching comment {}…", key.comment_id));
                self.spawn_fetch(FetchKind::Submit, key);
            }
            Err(_) => self.set_error("Invalid Reddit comment URL."),
        }
    }

    fn spawn_fetch(&mut self, kind: FetchKind, key: CommentKey) {
        self.pending_fetches += 1;
        let stash = self.stash.clone();
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result = stash.save(&key);
            let _ = tx.send(AsyncResponse::Fetch {
                kind,
                comment_id: key.comment_id,
                result,
            });
        });
    }

    fn refresh_selected(&mut self) {
        let Some(record) = self.selected_record() else {
            self.set_status("Nothing selected to refresh.");
            return;
        };
        let key = record.key();
        self.set_status(format!("Refreshing comment {}…", key.comment_id));
        self.spawn_fetch(FetchKind::Refresh, key);
    }

    // One independent worker per stored record; completions interleave and
    // each one re-reads the whole store. No cap and no completion barrier.
    fn refresh_all(&mut self) {
        let keys = match self.stash.keys() {
            Ok(keys) => keys,
            Err(err) => {
                self.set_error(format!("Failed to read saved comments: {err}"));
                return;
            }
        };
        if keys.is_empty() {
            self.set_status("The stash is empty; nothing to refresh.");
            return;
        }
        self.set_status(format!("Refreshing {} saved comment(s)…", keys.len()));
        for key in keys {
            self.spawn_fetch(FetchKind::RefreshAll, key);
        }
    }

    fn delete_selected(&mut self) -> Result<()> {
        let Some(record) = self.selected_record() else {
            self.set_status("Nothing selected to delete.");
            return Ok(());
        };
        let id = record.id.clone();
        match self.stash.remove(&id) {
            Ok(true) => self.set_status(format!("Deleted comment {id}.")),
            Ok(false) => self.set_status(format!("Comment {id} was already gone.")),
            Err(err) => self.set_error(format!("Failed to delete {id}: {err}")),
        }
        self.reload_records();
        Ok(())
    }

    fn open_selected(&mut self) {
        let Some(record) = self.selected_record() else {
            self.set_status("Nothing selected to open.");
            return;
        };
        let url = record.permalink.clone();
        match webbrowser::open(&url) {
            Ok(()) => self.set_status("Opened permalink in your browser."),
            Err(err) => self.set_error(format!("Failed to open browser: {err}")),
        }
    }

    fn copy_selected(&mut self) {
        let Some(record) = self.selected_record() else {
            self.set_status("Nothing selected to copy.");
            return;
        };
        let url = record.permalink.clone();
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(url)) {
            Ok(()) => self.set_status("Permalink copied to clipboard."),
            Err(err) => self.set_error(format!("Clipboard unavailable: {err}")),
        }
    }

    fn paste_from_clipboard(&mut self) {
        match Clipboard::new().and_then(|mut clipboard| clipboard.get_text()) {
            Ok(text) => {
                self.input.push_str(text.trim());
                self.mark_dirty();
            }
            Err(err) => self.set_error(format!("Clipboard unavailable: {err}")),
        }
    }

    fn queue_update_check(&mut self) {
        if self.update_checked || self.update_check_in_progress {
            return;
        }
        if cfg!(test) || env::var(update::SKIP_UPDATE_ENV).is_ok() {
            self.update_checked = true;
            return;
        }
        self.update_checked = true;
        self.update_check_in_progress = true;
        let tx = self.response_tx.clone();
        let version = self.current_version.clone();
        thread::spawn(move || {
            let result = update::check_for_update(&version);
            let _ = tx.send(AsyncResponse::Update { result });
        });
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Fetch {
                kind,
                comment_id,
                result,
            } => {
                self.pending_fetches = self.pending_fetches.saturating_sub(1);
                match result {
                    Ok(outcome) => {
                        let (text, is_error) = outcome_message(kind, &outcome);
                        if is_error {
                            self.set_error(text);
                        } else {
                            self.set_status(text);
                        }
                    }
                    Err(err) => {
                        self.set_error(format!("Fetch for {comment_id} failed: {err}"));
                    }
                }
                // Every completion re-reads the full store; there is no
                // incremental diffing.
                self.reload_records();
            }
            AsyncResponse::Update { result } => {
                self.update_check_in_progress = false;
                if let Ok(Some(info)) = result {
                    self.update_notice = Some(info);
                    self.mark_dirty();
                }
            }
        }
    }

    fn reload_records(&mut self) {
        match self.stash.all() {
            Ok(records) => {
                self.records = records;
                self.rebuild_body_cache();
                if self.records.is_empty() {
                    self.list_state.select(None);
                } else {
                    let index = self
                        .list_state
                        .selected()
                        .unwrap_or(0)
                        .min(self.records.len() - 1);
                    self.list_state.select(Some(index));
                }
                self.mark_dirty();
            }
            Err(err) => self.set_error(format!("Failed to read saved comments: {err}")),
        }
    }

    fn rebuild_body_cache(&mut self) {
        self.body_cache.clear();
        for record in &self.records {
            self.body_cache
                .insert(record.id.clone(), markdown::render(&record.body));
        }
    }

    fn is_loading(&self) -> bool {
        self.pending_fetches > 0
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status_message = message.into();
        self.status_is_error = false;
        self.mark_dirty();
    }

    fn set_error<S: Into<String>>(&mut self, message: S) {
        self.status_message = message.into();
        self.status_is_error = true;
        self.mark_dirty();
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        self.draw_status(frame, layout[0]);
        self.draw_input(frame, layout[1]);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(layout[2]);
        self.draw_list(frame, main[0]);
        self.draw_detail(frame, main[1]);

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[3]);
    }

    fn draw_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let text = if self.is_loading() {
            format!("{} {}", self.spinner.frame(), self.status_message)
                .trim()
                .to_string()
        } else {
            self.status_message.clone()
        };
        let fg = if self.status_is_error {
            COLOR_ERROR
        } else {
            COLOR_TEXT_PRIMARY
        };
        let status_line = Paragraph::new(text).style(
            Style::default()
                .fg(fg)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, area);
    }

    fn draw_input(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.pane_block("Comment URL", self.focus == Focus::Input);
        let inner_width = area.width.saturating_sub(2) as usize;
        let mut display = fit_tail(&self.input.value, inner_width.saturating_sub(1));
        if self.focus == Focus::Input {
            display.push('▏');
        }
        let style = if self.input.value.is_empty() && self.focus != Focus::Input {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        } else {
            Style::default().fg(COLOR_TEXT_PRIMARY)
        };
        let placeholder = "https://www.reddit.com/r/<subreddit>/comments/<post>/<slug>/<comment>/";
        let content = if display.is_empty() {
            placeholder.to_string()
        } else {
            display
        };
        frame.render_widget(Paragraph::new(content).style(style).block(block), area);
    }

    fn draw_list(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.pane_block("Saved Comments", self.focus == Focus::List);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut list_area = inner;
        if let Some(info) = &self.update_notice {
            let banner_area = Rect {
                height: 1.min(inner.height),
                ..inner
            };
            let banner = Paragraph::new(format!(
                "Update available: {} -> {}  {}",
                self.current_version, info.version, info.url
            ))
            .style(
                Style::default()
                    .fg(COLOR_SUCCESS)
                    .add_modifier(Modifier::BOLD),
            );
            frame.render_widget(banner, banner_area);
            list_area = Rect {
                y: inner.y.saturating_add(1),
                height: inner.height.saturating_sub(1),
                ..inner
            };
        }

        if self.records.is_empty() {
            let empty = Paragraph::new(format!(
                "No saved comments yet.\n\nPress i, paste a comment permalink, and hit Enter.\nConfig: {}",
                self.config_path
            ))
            .style(Style::default().fg(COLOR_TEXT_SECONDARY))
            .wrap(Wrap { trim: true });
            frame.render_widget(empty, list_area);
            return;
        }

        let width = list_area.width.saturating_sub(2) as usize;
        let items: Vec<ListItem<'static>> = self
            .records
            .iter()
            .map(|record| record_item(record, width))
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().bg(COLOR_PANEL_SELECTED_BG))
            .highlight_symbol("› ");
        frame.render_stateful_widget(list, list_area, &mut self.list_state);
    }

    fn draw_detail(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.pane_block("Comment", false);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(record) = self.selected_record() else {
            let placeholder = Paragraph::new("Select a saved comment to read it here.")
                .style(Style::default().fg(COLOR_TEXT_SECONDARY));
            frame.render_widget(placeholder, inner);
            return;
        };

        let mut lines: Vec<Line<'static>> = vec![
            Line::from(Span::styled(
                format!("u/{}", record.author),
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled(
                    format!("{}   ", record.created_utc),
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                ),
                Span::styled(
                    format!("▲ {}  ▼ {}   ", record.ups, record.downs),
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                ),
                status_span(record.status),
            ]),
            Line::from(Span::styled(
                record.permalink.clone(),
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::UNDERLINED),
            )),
            Line::default(),
        ];
        if let Some(body) = self.body_cache.get(&record.id) {
            lines.extend(body.lines.iter().cloned());
        }

        let paragraph = Paragraph::new(Text::from(lines))
            .style(Style::default().fg(COLOR_TEXT_PRIMARY))
            .wrap(Wrap { trim: false })
            .scroll((self.detail_scroll, 0));
        frame.render_widget(paragraph, inner);
    }

    fn pane_block(&self, title: &str, focused: bool) -> Block<'static> {
        let border_style = if focused {
            Style::default().fg(COLOR_BORDER_FOCUSED)
        } else {
            Style::default().fg(COLOR_BORDER_IDLE)
        };
        let title_style = if focused {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        };
        Block::default()
            .title(Span::styled(title.to_string(), title_style))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(COLOR_PANEL_BG))
            .padding(Padding::horizontal(1))
    }

    fn footer_text(&self) -> String {
        match self.focus {
            Focus::Input => {
                "Enter fetch · Ctrl+V paste · Ctrl+U clear · Esc back to list".to_string()
            }
            Focus::List => {
                "i URL · j/k move · r refresh · R refresh all · d delete · o open · y copy · q quit"
                    .to_string()
            }
        }
    }
}

fn outcome_message(kind: FetchKind, outcome: &FetchOutcome) -> (String, bool) {
    match outcome {
        FetchOutcome::Saved(record) => {
            let verb = match kind {
                FetchKind::Submit => "Saved",
                FetchKind::Refresh | FetchKind::RefreshAll => "Refreshed",
            };
            (
                format!("{verb} comment {} by u/{}.", record.id, record.author),
                false,
            )
        }
        FetchOutcome::MarkedInactive { id, reason } => {
            (format!("No comment found ({reason}); marked {id} inactive."), true)
        }
        FetchOutcome::Unavailable(reason) => (format!("No comment found: {reason}."), true),
    }
}

fn record_item(record: &CommentRecord, width: usize) -> ListItem<'static> {
    let header = Line::from(vec![
        Span::styled(
            format!("u/{}", record.author),
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  ▲ {}  {}  ", record.ups, record.created_utc),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        ),
        status_span(record.status),
    ]);
    let body = Line::from(Span::styled(
        snippet(&record.body, width),
        Style::default().fg(COLOR_TEXT_PRIMARY),
    ));
    ListItem::new(vec![header, body, Line::default()])
}

fn status_span(status: Status) -> Span<'static> {
    let color = match status {
        Status::Active => COLOR_SUCCESS,
        Status::Inactive => COLOR_ERROR,
    };
    Span::styled(status.as_str(), Style::default().fg(color))
}

/// First display line of a comment body, single-spaced, with an ellipsis
/// when more follows.
fn snippet(body: &str, width: usize) -> String {
    let flattened = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let wrapped = wrap(&flattened, width.max(10));
    match wrapped.first() {
        Some(first) if wrapped.len() > 1 => format!("{first}…"),
        Some(first) => first.to_string(),
        None => String::new(),
    }
}

/// Keeps the tail of an overlong value so the cursor end stays visible.
fn fit_tail(value: &str, width: usize) -> String {
    if UnicodeWidthStr::width(value) <= width {
        return value.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut tail = String::new();
    for ch in value.chars().rev() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        tail.insert(0, ch);
        used += w;
    }
    format!("…{tail}")
}
