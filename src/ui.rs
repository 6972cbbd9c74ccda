use crate::record::{Field, RecordForm};
use crate::search::{self, SearchQuery};
use crate::store::{LoadReport, Store};
use crate::validator::{self, FieldKind};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::{error, info};

const PAGE: usize = 20;

/// Edit form rows, top to bottom
pub const FORM_FIELDS: [Field; 6] = [
    Field::Name,
    Field::Surname,
    Field::Patronymic,
    Field::Age,
    Field::City,
    Field::Group,
];

const TABLE_FIELDS: [Field; 6] = Field::FILE_ORDER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Surname,
    Group,
}

impl SearchField {
    fn toggle(&self) -> Self {
        match self {
            SearchField::Surname => SearchField::Group,
            SearchField::Group => SearchField::Surname,
        }
    }

    fn field(&self) -> Field {
        match self {
            SearchField::Surname => Field::Surname,
            SearchField::Group => Field::Group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBar {
    pub surname: String,
    pub group: String,
    pub focus: SearchField,
}

impl Default for SearchBar {
    fn default() -> Self {
        SearchBar {
            surname: String::new(),
            group: String::new(),
            focus: SearchField::Surname,
        }
    }
}

impl SearchBar {
    fn input_mut(&mut self) -> &mut String {
        match self.focus {
            SearchField::Surname => &mut self.surname,
            SearchField::Group => &mut self.group,
        }
    }

    fn input(&self, field: SearchField) -> &str {
        match field {
            SearchField::Surname => &self.surname,
            SearchField::Group => &self.group,
        }
    }
}

/// Which record the open form writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    New,
    Existing(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub target: FormTarget,
    pub form: RecordForm,
    pub focus: usize,
    pub error: Option<String>,
}

impl FormState {
    fn focused(&self) -> Field {
        FORM_FIELDS[self.focus]
    }

    fn title(&self) -> &'static str {
        match self.target {
            FormTarget::New => " New Student ",
            FormTarget::Existing(_) => " Edit Student ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
    Form(FormState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct App {
    pub store: Store,
    /// Store positions currently shown in the table
    pub view: Vec<usize>,
    pub state: TableState,
    pub mode: Mode,
    pub search_bar: SearchBar,
    pub active_query: Option<SearchQuery>,
    pub status: String,
}

impl App {
    pub fn new(store: Store, load: Result<LoadReport>) -> Self {
        let status = match &load {
            Ok(report) => load_status(&store, report),
            Err(e) => format!("Failed to read file: {:#}", e),
        };

        let mut app = Self {
            store,
            view: Vec::new(),
            state: TableState::default(),
            mode: Mode::Browse,
            search_bar: SearchBar::default(),
            active_query: None,
            status,
        };
        app.refresh_view();
        app
    }

    /// Recompute the visible rows from the store and the active search
    pub fn refresh_view(&mut self) {
        self.view = match &self.active_query {
            Some(query) => search::search_positions(self.store.records(), query),
            None => (0..self.store.len()).collect(),
        };

        let selected = match self.state.selected() {
            _ if self.view.is_empty() => None,
            Some(i) if i >= self.view.len() => Some(self.view.len() - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.state.select(selected);
    }

    /// Store position of the highlighted row
    pub fn selected_position(&self) -> Option<usize> {
        self.state.selected().and_then(|i| self.view.get(i).copied())
    }

    fn select_position(&mut self, position: usize) {
        if let Some(i) = self.view.iter().position(|&p| p == position) {
            self.state.select(Some(i));
        }
    }

    fn show_selected(&mut self) {
        if let Some(record) = self.selected_position().and_then(|p| self.store.get(p)) {
            self.status = record.to_string();
        }
    }

    pub fn next(&mut self) {
        let len = self.view.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
        self.show_selected();
    }

    pub fn previous(&mut self) {
        let len = self.view.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
        self.show_selected();
    }

    pub fn page_down(&mut self) {
        let len = self.view.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + PAGE).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
        self.show_selected();
    }

    pub fn page_up(&mut self) {
        if self.view.is_empty() {
            return;
        }
        let i = self.state.selected().map(|i| i.saturating_sub(PAGE)).unwrap_or(0);
        self.state.select(Some(i));
        self.show_selected();
    }

    pub fn first(&mut self) {
        if !self.view.is_empty() {
            self.state.select(Some(0));
            self.show_selected();
        }
    }

    pub fn last(&mut self) {
        if !self.view.is_empty() {
            self.state.select(Some(self.view.len() - 1));
            self.show_selected();
        }
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    pub fn begin_add(&mut self) {
        self.mode = Mode::Form(FormState {
            target: FormTarget::New,
            form: RecordForm::default(),
            focus: 0,
            error: None,
        });
    }

    pub fn begin_edit(&mut self) {
        let Some(position) = self.selected_position() else {
            self.status = "Error: select a student to edit".to_string();
            return;
        };
        let Some(record) = self.store.get(position) else {
            return;
        };
        self.mode = Mode::Form(FormState {
            target: FormTarget::Existing(position),
            form: RecordForm::from_record(record),
            focus: 0,
            error: None,
        });
    }

    /// Validate the open form; on success write it to the store and save
    ///
    /// A rejected form stays open with the error shown.
    pub fn submit_form(&mut self) {
        let Mode::Form(state) = &mut self.mode else {
            return;
        };

        let record = match validator::validate_form_all(&state.form) {
            Ok(record) => record,
            Err(errors) => {
                let Some(first) = errors.first() else {
                    return;
                };
                state.error = Some(match errors.len() - 1 {
                    0 => first.to_string(),
                    more => format!("{} ({} more fields to fix)", first, more),
                });
                if let Some(i) = FORM_FIELDS.iter().position(|f| *f == first.field) {
                    state.focus = i;
                }
                self.status = format!("Error: {}", first);
                return;
            }
        };

        let target = state.target;
        let surname = record.surname.clone();
        let (position, verb) = match target {
            FormTarget::New => (self.store.add(record), "Added new student"),
            FormTarget::Existing(position) => {
                if self.store.replace_fields(position, record).is_none() {
                    self.status = "Error: student no longer exists".to_string();
                    self.mode = Mode::Browse;
                    return;
                }
                (position, "Updated student")
            }
        };

        self.mode = Mode::Browse;
        self.status = match self.store.save() {
            Ok(()) => {
                info!(position, "{}", verb);
                format!("{}: {}", verb, surname)
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Save failed");
                format!("Failed to save file: {:#}", e)
            }
        };
        self.refresh_view();
        self.select_position(position);
    }

    pub fn cancel_form(&mut self) {
        self.mode = Mode::Browse;
    }

    pub fn delete_selected(&mut self) {
        let Some(position) = self.selected_position() else {
            self.status = "Error: select a student to delete".to_string();
            return;
        };
        let Some(removed) = self.store.remove(position) else {
            return;
        };

        self.status = match self.store.save() {
            Ok(()) => {
                info!(position, "Deleted student");
                format!("Deleted: {}", removed.surname)
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Save failed");
                format!("Failed to save file: {:#}", e)
            }
        };
        self.refresh_view();
    }

    pub fn begin_search(&mut self) {
        self.mode = Mode::Search;
    }

    pub fn apply_search(&mut self) {
        match SearchQuery::new(&self.search_bar.surname, &self.search_bar.group) {
            Ok(query) => {
                self.active_query = Some(query);
                self.state.select(None);
                self.refresh_view();
                self.status = if self.view.is_empty() {
                    "No students found".to_string()
                } else {
                    format!("Found {} students", self.view.len())
                };
                self.mode = Mode::Browse;
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
            }
        }
    }

    /// Reload the file and show every student again
    pub fn reset(&mut self) {
        self.active_query = None;
        self.search_bar = SearchBar::default();
        self.mode = Mode::Browse;

        self.status = match self.store.reload() {
            Ok(report) if report.is_clean() => "Search reset, showing all students".to_string(),
            Ok(report) => format!("Search reset. {}", load_status(&self.store, &report)),
            Err(e) => format!("Failed to read file: {:#}", e),
        };
        self.state.select(None);
        self.refresh_view();
    }

    // ========================================================================
    // KEYS
    // ========================================================================

    pub fn on_key(&mut self, key: KeyEvent) -> Control {
        match self.mode {
            Mode::Browse => return self.on_browse_key(key),
            Mode::Search => self.on_search_key(key),
            Mode::Form(_) => self.on_form_key(key),
        }
        Control::Continue
    }

    fn on_browse_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Control::Quit,
            KeyCode::Char('a') => self.begin_add(),
            KeyCode::Char('e') | KeyCode::Enter => self.begin_edit(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('/') | KeyCode::Char('s') => self.begin_search(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => self.first(),
            KeyCode::End => self.last(),
            _ => {}
        }
        Control::Continue
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => self.apply_search(),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.search_bar.focus = self.search_bar.focus.toggle();
            }
            KeyCode::Backspace => {
                self.search_bar.input_mut().pop();
            }
            KeyCode::Char(c) => {
                self.search_bar.input_mut().push(c);
                let focus = self.search_bar.focus;
                self.hint_if_invalid(focus.field(), self.search_bar.input(focus).to_string());
            }
            _ => {}
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        let Mode::Form(state) = &mut self.mode else {
            return;
        };

        match key.code {
            KeyCode::Esc => self.cancel_form(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => state.focus = (state.focus + 1) % FORM_FIELDS.len(),
            KeyCode::BackTab | KeyCode::Up => {
                state.focus = (state.focus + FORM_FIELDS.len() - 1) % FORM_FIELDS.len();
            }
            KeyCode::Backspace => {
                let field = state.focused();
                state.form.get_mut(field).pop();
            }
            KeyCode::Char(c) => {
                let field = state.focused();
                if accepts_char(field, state.form.get(field), c) {
                    state.form.get_mut(field).push(c);
                    let value = state.form.get(field).to_string();
                    self.hint_if_invalid(field, value);
                }
            }
            _ => {}
        }
    }

    fn hint_if_invalid(&mut self, field: Field, value: String) {
        let kind = FieldKind::of(field);
        if !validator::is_partial_match(kind, &value) {
            self.status = format!("{} {}", field, kind.hint());
        }
    }
}

/// Form input limits: length per field, digits only for age
fn accepts_char(field: Field, current: &str, c: char) -> bool {
    if current.chars().count() >= field.max_len() {
        return false;
    }
    field != Field::Age || c.is_ascii_digit()
}

fn load_status(store: &Store, report: &LoadReport) -> String {
    if report.file_absent {
        return format!("File not found: {}", store.path().display());
    }
    match report.warnings.as_slice() {
        [] => format!("Loaded {} students", report.loaded),
        [only] => only.to_string(),
        [.., last] => format!(
            "{} lines skipped, last: {}",
            report.warnings.len(),
            last
        ),
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = %err, "UI loop failed");
    }

    res.context("UI loop failed")
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.on_key(key) == Control::Quit {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Search bar
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_search_bar(f, chunks[1], app);
    render_table(f, chunks[2], app);
    render_status_bar(f, chunks[3], app);

    if let Mode::Form(state) = &app.mode {
        render_form(f, f.size(), state);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "Students",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}", app.store.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            app.store.path().display().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    if app.active_query.is_some() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("Showing {} found", app.view.len()),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn input_style(kind: FieldKind, value: &str, focused: bool) -> Style {
    if !validator::is_partial_match(kind, value) {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_search_bar(f: &mut Frame, area: Rect, app: &App) {
    let active = app.mode == Mode::Search;
    let bar = &app.search_bar;

    let mut spans = Vec::new();
    let mut cursor = None;
    for field in [SearchField::Surname, SearchField::Group] {
        let label = format!(" {}: ", field.field());
        let value = bar.input(field);
        let focused = active && bar.focus == field;

        spans.push(Span::styled(label, Style::default().fg(Color::Cyan)));
        let offset: usize = spans.iter().map(|s| s.width()).sum();
        if focused {
            cursor = Some(offset + value.chars().count());
        }
        spans.push(Span::styled(
            value.to_string(),
            input_style(FieldKind::of(field.field()), value, focused),
        ));
        spans.push(Span::raw("   "));
    }

    let border = if active { Color::Yellow } else { Color::White };
    let paragraph = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Search (/ to edit, Enter to apply, r to reset) "),
    );
    f.render_widget(paragraph, area);

    if let Some(x) = cursor {
        f.set_cursor(area.x + 1 + x as u16, area.y + 1);
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = TABLE_FIELDS.iter().map(|field| {
        Cell::from(field.label()).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let records = app.store.records();
    let rows = app.view.iter().filter_map(|&p| records.get(p)).map(|record| {
        let cells = TABLE_FIELDS.iter().map(|field| Cell::from(record.get(*field)));
        Row::new(cells).height(1)
    });

    let title = if app.active_query.is_some() {
        " Students (search results) "
    } else {
        " Students "
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Length(16),
            Constraint::Length(18),
            Constraint::Length(5),
            Constraint::Length(18),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.view.len();

    let keys: &[(&str, &str)] = match app.mode {
        Mode::Browse => &[("a", "Add"), ("e", "Edit"), ("d", "Delete"), ("/", "Search"), ("r", "Reset"), ("q", "Quit")],
        Mode::Search => &[("Tab", "Field"), ("Enter", "Find"), ("Esc", "Back")],
        Mode::Form(_) => &[("Tab", "Field"), ("Enter", "Save"), ("Esc", "Cancel")],
    };

    let mut first_line = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];
    for (key, action) in keys {
        first_line.push(Span::raw(" | "));
        first_line.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        first_line.push(Span::raw(format!(" {}", action)));
    }

    let status_color = if app.status.starts_with("Error") || app.status.starts_with("Failed") {
        Color::Red
    } else {
        Color::Green
    };
    first_line.push(Span::raw(" | "));
    first_line.push(Span::styled(app.status.clone(), Style::default().fg(status_color)));

    let status_bar = Paragraph::new(vec![Line::from(first_line)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_form(f: &mut Frame, area: Rect, state: &FormState) {
    const LABEL_WIDTH: usize = 14;

    let popup = centered_rect(64, FORM_FIELDS.len() as u16 * 2 + 5, area);
    f.render_widget(Clear, popup);

    let mut content = vec![Line::from("")];
    for (i, field) in FORM_FIELDS.iter().enumerate() {
        let value = state.form.get(*field);
        let focused = i == state.focus;
        content.push(Line::from(vec![
            Span::styled(
                format!("  {:<width$}", format!("{}*:", field), width = LABEL_WIDTH - 2),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(value.to_string(), input_style(FieldKind::of(*field), value, focused)),
        ]));
        content.push(Line::from(""));
    }

    match &state.error {
        Some(message) => content.push(Line::from(Span::styled(
            format!("  {}", message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))),
        None => content.push(Line::from(Span::styled(
            "  Enter to save, Esc to cancel",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))),
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(state.title()),
    );
    f.render_widget(paragraph, popup);

    let value = state.form.get(state.focused());
    let x = popup.x + 1 + (LABEL_WIDTH + value.chars().count()) as u16;
    let y = popup.y + 2 + state.focus as u16 * 2;
    if cursor_inside(popup, x, y) {
        f.set_cursor(x, y);
    }
}

/// Whether (x, y) lies within the border of `area`
fn cursor_inside(area: Rect, x: u16, y: u16) -> bool {
    let right = area.x.saturating_add(area.width).saturating_sub(1);
    let bottom = area.y.saturating_add(area.height).saturating_sub(1);
    x < right && y < bottom
}
