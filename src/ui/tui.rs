//! The interactive book-search TUI.
//!
//! Event loop and mode handling. Each tick drains completed fetches from the
//! worker and checks the live-search debouncer, so the UI never blocks on
//! the network.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use regex::RegexBuilder;
use tracing::{debug, info};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::api_client::BooksClient;
use crate::config::Config;
use crate::debouncer::Debouncer;
use crate::history::{HistoryMatch, SearchHistory};
use crate::logging::LogRingBuffer;
use crate::search::{Category, Fetcher, SearchController, SearchParams, SortMode};
use crate::table_display::export_to_csv;
use crate::ui::results_view::{self, ResultsProps};

const EXPORT_FILENAME: &str = "books_export.csv";

/// TUI application modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TuiMode {
    /// Editing the search term.
    Search,
    /// Navigating the result cards.
    Results,
    /// Typing a local filter pattern.
    Filter,
    /// Fuzzy-searching past search terms.
    History,
}

pub struct BookSearchTui {
    controller: SearchController,
    fetcher: Fetcher,
    config: Config,

    input: Input,
    category: Category,
    sort: SortMode,

    mode: TuiMode,
    selected: Option<usize>,

    debouncer: Debouncer,
    history: Option<SearchHistory>,
    history_offset: Option<usize>,
    history_input: Input,
    history_matches: Vec<HistoryMatch>,
    history_selected: usize,

    filter_input: Input,
    filter_matches: Vec<usize>,

    status_message: String,
    show_logs: bool,
    log_buffer: LogRingBuffer,
    should_quit: bool,
}

impl BookSearchTui {
    pub fn new(client: BooksClient, config: Config, log_buffer: LogRingBuffer) -> Self {
        let history = if config.behavior.enable_history {
            SearchHistory::new().ok()
        } else {
            None
        };

        Self {
            controller: SearchController::new(),
            fetcher: Fetcher::spawn(client),
            debouncer: Debouncer::new(config.behavior.debounce_ms),
            config,
            input: Input::default(),
            category: Category::All,
            sort: SortMode::Relevance,
            mode: TuiMode::Search,
            selected: None,
            history,
            history_offset: None,
            history_input: Input::default(),
            history_matches: Vec::new(),
            history_selected: 0,
            filter_input: Input::default(),
            filter_matches: Vec::new(),
            status_message: String::new(),
            show_logs: false,
            log_buffer,
            should_quit: false,
        }
    }

    /// Main run loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> std::io::Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key_event(key);
                }
            }

            self.tick();

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    /// Per-tick housekeeping: apply completed fetches, fire the debouncer.
    fn tick(&mut self) {
        while let Some(outcome) = self.fetcher.try_recv() {
            self.controller.apply(outcome);
            self.clamp_selection();
            self.refresh_filter_matches();
        }

        if self.debouncer.should_execute() {
            self.submit_current(false);
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        // Global keys first.
        if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('q'))
        {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::F(5) => {
                self.show_logs = !self.show_logs;
                return;
            }
            KeyCode::Tab => {
                self.toggle_mode();
                return;
            }
            _ => {}
        }

        match self.mode {
            TuiMode::Search => self.handle_search_mode(key),
            TuiMode::Results => self.handle_results_mode(key),
            TuiMode::Filter => self.handle_filter_mode(key),
            TuiMode::History => self.handle_history_mode(key),
        }
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            TuiMode::Search => TuiMode::Results,
            TuiMode::Results | TuiMode::Filter | TuiMode::History => TuiMode::Search,
        };
    }

    fn handle_search_mode(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('r'))
        {
            self.open_history_search();
            return;
        }
        match key.code {
            KeyCode::Enter => {
                self.debouncer.reset();
                self.submit_current(true);
                if !self.controller.items().is_empty() || self.controller.is_loading() {
                    self.mode = TuiMode::Results;
                }
            }
            KeyCode::Esc => {
                self.mode = TuiMode::Results;
            }
            KeyCode::Up => self.recall_history(1),
            KeyCode::Down => self.recall_history(-1),
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() != before {
                    self.history_offset = None;
                    self.debouncer.trigger();
                }
            }
        }
    }

    fn handle_results_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if !self.filter_matches.is_empty() || !self.filter_input.value().is_empty() {
                    self.clear_filter();
                } else {
                    self.mode = TuiMode::Search;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-10),
            KeyCode::PageDown => self.move_selection(10),
            KeyCode::Home | KeyCode::Char('g') => {
                if !self.controller.items().is_empty() {
                    self.selected = Some(0);
                }
            }
            KeyCode::End | KeyCode::Char('G') => {
                let len = self.controller.items().len();
                if len > 0 {
                    self.selected = Some(len - 1);
                }
            }
            KeyCode::Enter | KeyCode::Char('m') => self.request_more(),
            KeyCode::Char('c') => self.change_category(self.category.next()),
            KeyCode::Char('C') => self.change_category(self.category.prev()),
            KeyCode::Char('o') => self.change_sort(self.sort.toggle()),
            KeyCode::Char('/') => {
                self.mode = TuiMode::Filter;
            }
            KeyCode::Char('n') => self.jump_to_match(1),
            KeyCode::Char('N') => self.jump_to_match(-1),
            KeyCode::Char('y') => self.yank_selected(),
            KeyCode::Char('e') => self.export_results(),
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_filter_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.refresh_filter_matches();
                if let Some(&first) = self.filter_matches.first() {
                    self.selected = Some(first);
                    self.status_message =
                        format!("{} matching cards", self.filter_matches.len());
                } else {
                    self.status_message = "No matching cards".to_string();
                }
                self.mode = TuiMode::Results;
            }
            KeyCode::Esc => {
                self.clear_filter();
                self.mode = TuiMode::Results;
            }
            _ => {
                self.filter_input.handle_event(&Event::Key(key));
            }
        }
    }

    fn open_history_search(&mut self) {
        let has_entries = self.history.as_ref().is_some_and(|h| !h.is_empty());
        if !has_entries {
            self.status_message = "No search history yet".to_string();
            return;
        }
        self.history_input = Input::default();
        self.history_selected = 0;
        self.refresh_history_matches();
        self.mode = TuiMode::History;
    }

    fn handle_history_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some(m) = self.history_matches.get(self.history_selected) {
                    let term = m.entry.term.clone();
                    self.input = Input::new(term.clone()).with_cursor(term.chars().count());
                    self.history_offset = None;
                    self.mode = TuiMode::Search;
                    self.debouncer.reset();
                    self.submit_current(true);
                } else {
                    self.mode = TuiMode::Search;
                }
            }
            KeyCode::Esc => {
                self.mode = TuiMode::Search;
            }
            KeyCode::Up => {
                self.history_selected = self.history_selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if !self.history_matches.is_empty() {
                    self.history_selected =
                        (self.history_selected + 1).min(self.history_matches.len() - 1);
                }
            }
            _ => {
                self.history_input.handle_event(&Event::Key(key));
                self.refresh_history_matches();
            }
        }
    }

    fn refresh_history_matches(&mut self) {
        self.history_matches = match &self.history {
            Some(history) => history.search(self.history_input.value()),
            None => Vec::new(),
        };
        self.history_selected = self
            .history_selected
            .min(self.history_matches.len().saturating_sub(1));
    }

    /// Submit a fresh query from the current term/category/sort. The term is
    /// recorded in the persisted history only for explicit submissions, not
    /// for every debounced live-search keystroke.
    fn submit_current(&mut self, record_history: bool) {
        let params = SearchParams::new(self.input.value())
            .with_category(self.category)
            .with_sort(self.sort);
        let is_empty = params.is_empty();

        if let Some(request) = self.controller.submit_query(params) {
            self.fetcher.dispatch(request);
            self.status_message.clear();
            if record_history {
                if let Some(history) = &mut self.history {
                    if let Err(e) = history.add_entry(self.input.value().to_string(), None) {
                        debug!(target: "history", "failed to record term: {e:#}");
                    }
                }
            }
        } else if is_empty {
            self.status_message = "Type a search term".to_string();
        }
        self.selected = None;
        self.clear_filter();
    }

    fn request_more(&mut self) {
        if let Some(request) = self.controller.load_more() {
            info!(target: "search", "load more: page {}", request.page);
            self.fetcher.dispatch(request);
        }
    }

    fn change_category(&mut self, category: Category) {
        self.category = category;
        if !self.input.value().trim().is_empty() {
            self.debouncer.reset();
            self.submit_current(false);
        }
    }

    fn change_sort(&mut self, sort: SortMode) {
        self.sort = sort;
        if !self.input.value().trim().is_empty() {
            self.debouncer.reset();
            self.submit_current(false);
        }
    }

    fn move_selection(&mut self, delta: i64) {
        let len = self.controller.items().len();
        if len == 0 {
            self.selected = None;
            return;
        }
        let Some(current) = self.selected else {
            // Nothing selected yet: the first movement lands on an end card.
            self.selected = Some(if delta >= 0 { 0 } else { len - 1 });
            return;
        };
        let next = (current as i64 + delta).clamp(0, len as i64 - 1) as usize;

        // Scrolling past the last card pulls the next page in.
        if delta > 0
            && next == len - 1
            && self.selected == Some(len - 1)
            && self.config.behavior.auto_load_on_scroll
        {
            self.request_more();
        }
        self.selected = Some(next);
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.items().len();
        self.selected = match (self.selected, len) {
            (_, 0) => None,
            (Some(sel), _) => Some(sel.min(len - 1)),
            (None, _) => None,
        };
    }

    fn recall_history(&mut self, direction: i64) {
        let Some(history) = &self.history else {
            return;
        };
        if history.is_empty() {
            return;
        }

        let next_offset = match (self.history_offset, direction) {
            (None, d) if d > 0 => Some(0),
            (None, _) => None,
            (Some(0), d) if d < 0 => None,
            (Some(o), d) if d > 0 => Some((o + 1).min(history.len() - 1)),
            (Some(o), _) => Some(o - 1),
        };

        self.history_offset = next_offset;
        let term = match next_offset {
            Some(offset) => history
                .recall(offset)
                .map(|e| e.term.clone())
                .unwrap_or_default(),
            None => String::new(),
        };
        self.input = Input::new(term.clone()).with_cursor(term.chars().count());
        self.debouncer.trigger();
    }

    fn refresh_filter_matches(&mut self) {
        let pattern = self.filter_input.value();
        if pattern.is_empty() {
            self.filter_matches.clear();
            return;
        }
        let Ok(regex) = RegexBuilder::new(pattern).case_insensitive(true).build() else {
            self.filter_matches.clear();
            return;
        };
        self.filter_matches = self
            .controller
            .items()
            .iter()
            .enumerate()
            .filter(|(_, v)| {
                regex.is_match(v.display_title())
                    || v.info.authors.iter().any(|a| regex.is_match(a))
            })
            .map(|(idx, _)| idx)
            .collect();
    }

    fn clear_filter(&mut self) {
        self.filter_input = Input::default();
        self.filter_matches.clear();
    }

    fn jump_to_match(&mut self, direction: i64) {
        if self.filter_matches.is_empty() {
            return;
        }
        let current = self.selected.unwrap_or(0);
        let next = if direction > 0 {
            self.filter_matches
                .iter()
                .find(|&&idx| idx > current)
                .or_else(|| self.filter_matches.first())
        } else {
            self.filter_matches
                .iter()
                .rev()
                .find(|&&idx| idx < current)
                .or_else(|| self.filter_matches.last())
        };
        self.selected = next.copied();
    }

    fn yank_selected(&mut self) {
        let Some(volume) = self.selected.and_then(|idx| self.controller.items().get(idx))
        else {
            return;
        };
        let text = format!(
            "{} by {} ({})",
            volume.display_title(),
            results_view::format_authors(&volume.info.authors),
            results_view::primary_category(volume),
        );
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
            Ok(()) => self.status_message = "Copied card to clipboard".to_string(),
            Err(e) => {
                self.status_message = format!("Clipboard unavailable: {e}");
            }
        }
    }

    fn export_results(&mut self) {
        if self.controller.items().is_empty() {
            self.status_message = "Nothing to export".to_string();
            return;
        }
        match export_to_csv(self.controller.items(), EXPORT_FILENAME) {
            Ok(()) => {
                self.status_message = format!(
                    "Exported {} books to {}",
                    self.controller.items().len(),
                    EXPORT_FILENAME
                );
            }
            Err(e) => self.status_message = format!("Export failed: {e}"),
        }
    }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search input
                Constraint::Length(1), // Category / sort selectors
                Constraint::Min(5),    // Results
                Constraint::Length(3), // Status
                Constraint::Length(1), // Help line
            ])
            .split(f.area());

        self.draw_search_input(f, chunks[0]);
        self.draw_selectors(f, chunks[1]);

        let props = ResultsProps {
            items: self.controller.items(),
            selected: self.selected,
            is_loading: self.controller.is_loading(),
            exhausted: self.controller.is_exhausted(),
            filter_matches: &self.filter_matches,
            show_thumbnail_marker: self.config.display.show_thumbnail_marker,
            show_published_date: self.config.display.show_published_date,
        };
        results_view::render_results(f, chunks[2], &props);

        self.draw_status(f, chunks[3]);
        self.draw_help(f, chunks[4]);

        if self.mode == TuiMode::Filter {
            self.draw_filter_overlay(f);
        }
        if self.mode == TuiMode::History {
            self.draw_history_overlay(f);
        }
        if self.show_logs {
            self.draw_log_overlay(f);
        }
    }

    fn draw_search_input(&self, f: &mut Frame, area: Rect) {
        let active = self.mode == TuiMode::Search;
        let style = if active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let width = area.width.saturating_sub(2) as usize;
        let scroll = self.input.visual_scroll(width);
        let widget = Paragraph::new(self.input.value())
            .scroll((0, scroll as u16))
            .block(Block::default().borders(Borders::ALL).title("Search").style(style));
        f.render_widget(widget, area);

        if active {
            let cursor_x = (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            f.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
        }
    }

    fn draw_selectors(&self, f: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled("Category: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                self.category.as_str(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  (c/C to cycle)   "),
            Span::styled("Sort: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                self.sort.as_str(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  (o to toggle)"),
        ]);
        f.render_widget(Paragraph::new(line), area);
    }

    fn draw_status(&self, f: &mut Frame, area: Rect) {
        let mut parts = vec![format!("State: {:?}", self.controller.state())];
        if !self.controller.items().is_empty() {
            parts.push(format!(
                "Page {} · {} books",
                self.controller.page(),
                self.controller.items().len()
            ));
        }
        if !self.filter_input.value().is_empty() {
            parts.push(format!(
                "Filter: {} ({} hits)",
                self.filter_input.value(),
                self.filter_matches.len()
            ));
        }
        if !self.status_message.is_empty() {
            parts.push(self.status_message.clone());
        }

        let status = Paragraph::new(parts.join(" | "))
            .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(status, area);
    }

    fn draw_help(&self, f: &mut Frame, area: Rect) {
        let text = match self.mode {
            TuiMode::Search => {
                "Type to search (auto-submits) | Enter: Search now | ↑↓: History | Ctrl+R: Search history | Tab: Results | Ctrl+Q: Quit"
            }
            TuiMode::Results => {
                "↑↓/jk: Navigate | m/Enter: Load more | c/C: Category | o: Sort | /: Filter | n/N: Match | y: Yank | e: Export | F5: Logs | q: Quit"
            }
            TuiMode::Filter => "Filter: Enter: Apply | Esc: Cancel | Type a pattern…",
            TuiMode::History => {
                "History: Type to fuzzy-match | ↑↓: Select | Enter: Search term | Esc: Cancel"
            }
        };
        let help = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, area);
    }

    fn draw_filter_overlay(&self, f: &mut Frame) {
        let popup = centered_rect(f.area(), 60, 3);
        let widget = Paragraph::new(self.filter_input.value()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Filter loaded results")
                .style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(Clear, popup);
        f.render_widget(widget, popup);
        let cursor_x = self.filter_input.visual_cursor() as u16;
        f.set_cursor_position((popup.x + cursor_x + 1, popup.y + 1));
    }

    fn draw_history_overlay(&self, f: &mut Frame) {
        let popup = centered_rect(f.area(), 60, 14);
        f.render_widget(Clear, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(popup);

        let input = Paragraph::new(self.history_input.value()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search history")
                .style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(input, chunks[0]);
        let cursor_x = self.history_input.visual_cursor() as u16;
        f.set_cursor_position((chunks[0].x + cursor_x + 1, chunks[0].y + 1));

        let visible = chunks[1].height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .history_matches
            .iter()
            .take(visible)
            .enumerate()
            .map(|(row, m)| history_match_line(m, row == self.history_selected))
            .collect();
        let list = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Matches"));
        f.render_widget(list, chunks[1]);
    }

    fn draw_log_overlay(&self, f: &mut Frame) {
        let area = f.area();
        let height = (area.height / 2).max(8);
        let popup = Rect {
            x: area.x + 2,
            y: area.height.saturating_sub(height + 1),
            width: area.width.saturating_sub(4),
            height,
        };

        let visible = popup.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .log_buffer
            .get_recent(visible)
            .into_iter()
            .map(|entry| Line::from(entry.format_for_display()))
            .collect();

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Logs (F5 to close)")
                .style(Style::default().bg(Color::Black)),
        );
        f.render_widget(Clear, popup);
        f.render_widget(widget, popup);
    }
}

/// One row of the history overlay: matched characters highlighted, repeat
/// count appended when the term was searched more than once.
fn history_match_line(m: &HistoryMatch, selected: bool) -> Line<'static> {
    let marker = if selected { "▶ " } else { "  " };
    let mut spans = vec![Span::styled(
        marker.to_string(),
        Style::default().fg(Color::Yellow),
    )];
    for (i, ch) in m.entry.term.chars().enumerate() {
        let style = if m.indices.contains(&i) {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(ch.to_string(), style));
    }
    if m.entry.execution_count > 1 {
        spans.push(Span::styled(
            format!("  (x{})", m.entry.execution_count),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let line = Line::from(spans);
    if selected {
        line.style(Style::default().add_modifier(Modifier::BOLD))
    } else {
        line
    }
}

fn centered_rect(area: Rect, width_pct: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area)[1];
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_pct) / 2),
            Constraint::Percentage(width_pct),
            Constraint::Percentage((100 - width_pct) / 2),
        ])
        .split(vertical)[1]
}

/// Set up the terminal and run the TUI until quit.
pub fn run_tui(
    client: BooksClient,
    config: Config,
    log_buffer: LogRingBuffer,
    initial_term: Option<String>,
) -> std::io::Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = BookSearchTui::new(client, config, log_buffer);
    if let Some(term) = initial_term {
        app.input = Input::new(term.clone()).with_cursor(term.chars().count());
        app.submit_current(true);
    }
    let result = app.run(&mut terminal);

    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::Volume;
    use crate::search::{FetchOutcome, FetchResult, SearchState};
    use tempfile::TempDir;

    fn test_app() -> BookSearchTui {
        let client = BooksClient::new("http://localhost:1", None);
        let mut config = Config::default();
        config.behavior.enable_history = false;
        BookSearchTui::new(client, config, LogRingBuffer::new())
    }

    fn test_app_with_history() -> (TempDir, BookSearchTui) {
        let dir = TempDir::new().unwrap();
        let mut app = test_app();
        app.history = Some(SearchHistory::with_file(dir.path().join("history.json")).unwrap());
        (dir, app)
    }

    fn type_term(app: &mut BookSearchTui, term: &str) {
        for ch in term.chars() {
            app.handle_key_event(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
    }

    fn seed_results(app: &mut BookSearchTui, n: usize) {
        let req = app
            .controller
            .submit_query(SearchParams::new("dune"))
            .unwrap();
        app.controller.apply(FetchOutcome {
            generation: req.generation,
            page: req.page,
            result: FetchResult::Page(
                (0..n)
                    .map(|i| Volume {
                        id: format!("v-{i}"),
                        ..Default::default()
                    })
                    .collect(),
            ),
        });
    }

    #[test]
    fn test_starts_in_search_mode() {
        let app = test_app();
        assert_eq!(app.mode, TuiMode::Search);
        assert!(!app.should_quit);
        assert_eq!(app.controller.state(), SearchState::Idle);
    }

    #[test]
    fn test_ctrl_q_quits_from_any_mode() {
        let mut app = test_app();
        app.handle_key_event(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_tab_toggles_mode() {
        let mut app = test_app();
        app.handle_key_event(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
        assert_eq!(app.mode, TuiMode::Results);
        app.handle_key_event(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
        assert_eq!(app.mode, TuiMode::Search);
    }

    #[test]
    fn test_typing_arms_debouncer() {
        let mut app = test_app();
        app.handle_key_event(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE));
        assert_eq!(app.input.value(), "d");
        assert!(app.debouncer.is_pending());
    }

    #[test]
    fn test_slash_enters_filter_mode() {
        let mut app = test_app();
        app.mode = TuiMode::Results;
        app.handle_key_event(KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE));
        assert_eq!(app.mode, TuiMode::Filter);
        app.handle_key_event(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(app.mode, TuiMode::Results);
    }

    #[test]
    fn test_navigation_with_no_results_is_safe() {
        let mut app = test_app();
        app.mode = TuiMode::Results;
        app.handle_key_event(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        assert_eq!(app.selected, None);
        app.handle_key_event(KeyEvent::new(KeyCode::End, KeyModifiers::NONE));
        assert_eq!(app.selected, None);
    }

    #[test]
    fn test_first_down_selects_first_card() {
        let mut app = test_app();
        seed_results(&mut app, 5);
        app.mode = TuiMode::Results;
        assert_eq!(app.selected, None);
        app.handle_key_event(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        assert_eq!(app.selected, Some(0));
        app.handle_key_event(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        assert_eq!(app.selected, Some(1));
    }

    #[test]
    fn test_first_up_selects_last_card() {
        let mut app = test_app();
        seed_results(&mut app, 5);
        app.mode = TuiMode::Results;
        app.handle_key_event(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE));
        assert_eq!(app.selected, Some(4));
    }

    #[test]
    fn test_history_records_only_explicit_submits() {
        let (_dir, mut app) = test_app_with_history();

        // Debounced live-search fetches do not touch the history.
        type_term(&mut app, "du");
        app.submit_current(false);
        assert_eq!(app.history.as_ref().unwrap().len(), 0);

        type_term(&mut app, "ne");
        app.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let history = app.history.as_ref().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.recall(0).unwrap().term, "dune");
    }

    #[test]
    fn test_ctrl_r_without_history_stays_in_search_mode() {
        let (_dir, mut app) = test_app_with_history();
        app.handle_key_event(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert_eq!(app.mode, TuiMode::Search);
        assert!(!app.status_message.is_empty());
    }

    #[test]
    fn test_ctrl_r_fuzzy_search_picks_term() {
        let (_dir, mut app) = test_app_with_history();
        {
            let history = app.history.as_mut().unwrap();
            history.add_entry("war and peace".to_string(), None).unwrap();
            history.add_entry("dune".to_string(), None).unwrap();
        }

        app.handle_key_event(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert_eq!(app.mode, TuiMode::History);
        // Empty pattern lists recent entries, newest first.
        assert_eq!(app.history_matches.len(), 2);
        assert_eq!(app.history_matches[0].entry.term, "dune");

        type_term(&mut app, "war");
        assert_eq!(app.history_matches.len(), 1);
        assert_eq!(app.history_matches[0].entry.term, "war and peace");

        app.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(app.mode, TuiMode::Search);
        assert_eq!(app.input.value(), "war and peace");
        assert_eq!(app.controller.state(), SearchState::Loading);
    }

    #[test]
    fn test_history_overlay_esc_cancels() {
        let (_dir, mut app) = test_app_with_history();
        app.history
            .as_mut()
            .unwrap()
            .add_entry("dune".to_string(), None)
            .unwrap();
        type_term(&mut app, "foundation");
        app.handle_key_event(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert_eq!(app.mode, TuiMode::History);
        app.handle_key_event(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(app.mode, TuiMode::Search);
        assert_eq!(app.input.value(), "foundation");
    }

    #[test]
    fn test_empty_submit_sets_status() {
        let mut app = test_app();
        app.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(app.controller.state(), SearchState::Idle);
        assert!(!app.status_message.is_empty());
    }
}
