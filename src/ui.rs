use crate::action::{self, Action};
use crate::calendar::{self, date_key, Stamps};
use crate::drag::{self, RowBounds};
use crate::model::{Board, Row};
use crate::storage::{load_stamps, save_board, save_stamps, StoreLocation, StoreScope};
use anyhow::Result;
use chrono::{Datelike, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

/// Display height of one board row in terminal cells; the drag engine works
/// in the same units.
const ROW_HEIGHT: f32 = 1.0;

pub fn run(board: Board, location: StoreLocation) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(board, location);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    board: Board,
    location: StoreLocation,
    view: ViewMode,
    selected_column: usize,
    selected_row: usize,
    scroll_offsets: Vec<usize>,
    drag: Option<DragSession>,
    calendar: CalendarView,
    last_save: Instant,
    status: String,
    mode: Mode,
}

enum Mode {
    Normal,
    EditRow {
        column: usize,
        row: usize,
        field: FieldValue,
    },
    EditTitle {
        column: usize,
        field: FieldValue,
    },
    LinkPrompt {
        column: usize,
        row: usize,
        field: FieldValue,
    },
    ConfirmDelete {
        column: usize,
        row: usize,
    },
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ViewMode {
    Board,
    Calendar,
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Board => "Board",
            ViewMode::Calendar => "Calendar",
        }
    }
}

/// The grabbed row and the synthetic pointer driving the reorder engine.
/// Transient: dropped (never persisted) state; only the row order it leaves
/// behind is durable.
#[derive(Copy, Clone)]
struct DragSession {
    column: usize,
    index: usize,
    pointer_y: f32,
}

struct CalendarView {
    year: i32,
    month: u32,
    cursor_day: u32,
    stamps: Stamps,
}

impl CalendarView {
    fn new(location: &StoreLocation) -> Self {
        let today = Local::now().date_naive();
        CalendarView {
            year: today.year(),
            month: today.month(),
            cursor_day: today.day(),
            stamps: load_stamps(location),
        }
    }

    fn clamp_cursor(&mut self) {
        let last = calendar::days_in_month(self.year, self.month);
        self.cursor_day = self.cursor_day.clamp(1, last);
    }
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl App {
    fn new(board: Board, location: StoreLocation) -> Self {
        let status = format!("Loaded store from {}", location.dir.display());
        let column_count = board.columns.len();
        let calendar = CalendarView::new(&location);
        App {
            board,
            location,
            view: ViewMode::Board,
            selected_column: 0,
            selected_row: 0,
            scroll_offsets: vec![0; column_count],
            drag: None,
            calendar,
            last_save: Instant::now(),
            status,
            mode: Mode::Normal,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::EditRow { .. } | Mode::EditTitle { .. } | Mode::LinkPrompt { .. } => {
                self.handle_prompt_key(key)
            }
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.drag.is_some() {
            return self.handle_drag_key(key);
        }
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('1') => {
                self.set_view(ViewMode::Board);
                return Ok(false);
            }
            KeyCode::Char('2') => {
                self.set_view(ViewMode::Calendar);
                return Ok(false);
            }
            _ => {}
        }
        match self.view {
            ViewMode::Board => self.handle_board_key(key),
            ViewMode::Calendar => self.handle_calendar_key(key),
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.prev_column(),
            KeyCode::Right | KeyCode::Char('l') => self.next_column(),
            KeyCode::Up | KeyCode::Char('k') => self.prev_row(),
            KeyCode::Down | KeyCode::Char('j') => self.next_row(),
            KeyCode::Char('a') => self.add_row()?,
            KeyCode::Enter | KeyCode::Char('e') => self.edit_selected_row(),
            KeyCode::Char('t') => self.edit_selected_title(),
            KeyCode::Char('u') => self.prompt_link(),
            KeyCode::Char('x') => {
                if let Some((column, row)) = self.selected_cell() {
                    self.dispatch(Action::ClearLink { column, row }, "Link cleared")?;
                }
            }
            KeyCode::Char('o') => self.open_selected_link(),
            KeyCode::Char('d') => {
                if let Some((column, row)) = self.selected_cell() {
                    self.mode = Mode::ConfirmDelete { column, row };
                    self.status = "Delete row? (y to confirm, n/Esc to cancel)".into();
                } else {
                    self.status = "No row selected to delete".into();
                }
            }
            KeyCode::Char('g') => self.start_drag(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_drag_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.move_pointer(ROW_HEIGHT),
            KeyCode::Up | KeyCode::Char('k') => self.move_pointer(-ROW_HEIGHT),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('g') => self.finish_drag()?,
            _ => {}
        }
        Ok(false)
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.calendar.cursor_day = self.calendar.cursor_day.saturating_sub(1).max(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.calendar.cursor_day += 1;
                self.calendar.clamp_cursor();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.calendar.cursor_day = self.calendar.cursor_day.saturating_sub(7).max(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.calendar.cursor_day += 7;
                self.calendar.clamp_cursor();
            }
            KeyCode::Char('n') => self.shift_month(1),
            KeyCode::Char('p') => self.shift_month(-1),
            KeyCode::Char('N') => self.shift_year(1),
            KeyCode::Char('P') => self.shift_year(-1),
            KeyCode::Char('t') => {
                let today = Local::now().date_naive();
                self.calendar.year = today.year();
                self.calendar.month = today.month();
                self.calendar.cursor_day = today.day();
                self.regenerate();
                self.status = "Jumped to today".into();
            }
            KeyCode::Char('r') => {
                self.regenerate();
                self.status = "Calendar refreshed".into();
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_stamp()?,
            _ => {}
        }
        Ok(false)
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        match &mut mode {
            Mode::EditRow { column, row, field } => {
                let (column, row) = (*column, *row);
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => {
                        close = true;
                        self.status = "Row updated".into();
                    }
                    _ => {
                        if edit_field(field, key) {
                            // the text surface persists on every input event
                            self.dispatch(
                                Action::EditText {
                                    column,
                                    row,
                                    text: field.value.clone(),
                                },
                                "Editing row",
                            )?;
                        }
                    }
                }
            }
            Mode::EditTitle { column, field } => {
                let column = *column;
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => {
                        close = true;
                        self.status = "Column renamed".into();
                    }
                    _ => {
                        if edit_field(field, key) {
                            self.dispatch(
                                Action::SetTitle {
                                    column,
                                    title: field.value.clone(),
                                },
                                "Renaming column",
                            )?;
                        }
                    }
                }
            }
            Mode::LinkPrompt { column, row, field } => {
                let (column, row) = (*column, *row);
                match key.code {
                    KeyCode::Esc => {
                        close = true;
                        self.status = "Link unchanged".into();
                    }
                    KeyCode::Enter => {
                        close = true;
                        let url = field.value.clone();
                        if url.is_empty() {
                            // cancelled/blank prompt: no mutation, no save
                            self.status = "Link unchanged".into();
                        } else {
                            self.dispatch(Action::SetLink { column, row, url }, "Link set")?;
                        }
                    }
                    _ => {
                        edit_field(field, key);
                    }
                }
            }
            Mode::ConfirmDelete { .. } | Mode::Normal => {}
        }
        self.mode = if close { Mode::Normal } else { mode };
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let (column, row) = match &self.mode {
            Mode::ConfirmDelete { column, row } => (*column, *row),
            _ => return Ok(false),
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.dispatch(Action::RemoveRow { column, row }, "Row deleted")?;
                self.mode = Mode::Normal;
                self.ensure_board_bounds();
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.view = view;
            if view == ViewMode::Calendar {
                self.regenerate();
            }
            self.status = format!("Switched to {} view", view.label());
        }
    }

    // --- board mutations ---

    /// Routes a mutation through the reducer and flushes the dirty slices.
    /// Reducer errors land on the status line rather than tearing the UI
    /// down.
    fn dispatch(&mut self, action: Action, message: impl Into<String>) -> Result<()> {
        match action::apply(&mut self.board, &mut self.calendar.stamps, action) {
            Ok(dirty) => {
                if dirty.board {
                    save_board(&self.location, &self.board)?;
                }
                if dirty.stamps {
                    save_stamps(&self.location, &self.calendar.stamps)?;
                }
                if dirty.any() {
                    self.last_save = Instant::now();
                    self.status = message.into();
                }
            }
            Err(err) => {
                self.status = format!("{}", err);
            }
        }
        Ok(())
    }

    fn add_row(&mut self) -> Result<()> {
        let column = self.selected_column;
        self.dispatch(
            Action::AddRow {
                column,
                text: String::new(),
                link: String::new(),
            },
            "Row added",
        )?;
        let Ok(col) = self.board.column(column) else {
            return Ok(());
        };
        if col.rows.is_empty() {
            return Ok(());
        }
        let row = col.rows.len() - 1;
        self.selected_row = row;
        self.mode = Mode::EditRow {
            column,
            row,
            field: FieldValue::new(""),
        };
        self.status = "New row (type text, Enter when done)".into();
        Ok(())
    }

    fn edit_selected_row(&mut self) {
        let Some((column, row)) = self.selected_cell() else {
            self.status = "No row selected to edit".into();
            return;
        };
        let Ok(current) = self.board.row(column, row) else {
            return;
        };
        self.mode = Mode::EditRow {
            column,
            row,
            field: FieldValue::new(&current.text),
        };
        self.status = "Editing row (Enter when done)".into();
    }

    fn edit_selected_title(&mut self) {
        let column = self.selected_column;
        let Ok(col) = self.board.column(column) else {
            return;
        };
        self.mode = Mode::EditTitle {
            column,
            field: FieldValue::new(&col.title),
        };
        self.status = "Renaming column (Enter when done)".into();
    }

    fn prompt_link(&mut self) {
        let Some((column, row)) = self.selected_cell() else {
            self.status = "No row selected to link".into();
            return;
        };
        self.mode = Mode::LinkPrompt {
            column,
            row,
            field: FieldValue::new(""),
        };
        self.status = "Enter a URL (empty input leaves the row unchanged)".into();
    }

    fn open_selected_link(&mut self) {
        let Some((column, row)) = self.selected_cell() else {
            self.status = "No row selected".into();
            return;
        };
        let Ok(target) = self.board.row(column, row) else {
            return;
        };
        match &target.link {
            Some(url) => match open::that(url) {
                Ok(()) => self.status = format!("Opened {}", url),
                Err(err) => self.status = format!("Could not open {}: {}", url, err),
            },
            None => self.status = "Row has no link".into(),
        }
    }

    // --- drag session ---

    fn start_drag(&mut self) {
        let column = self.selected_column;
        let Ok(col) = self.board.column(column) else {
            return;
        };
        if col.rows.is_empty() {
            self.status = "No row to move".into();
            return;
        }
        let index = self.selected_row.min(col.rows.len() - 1);
        self.selected_row = index;
        self.drag = Some(DragSession {
            column,
            index,
            pointer_y: index as f32 * ROW_HEIGHT + ROW_HEIGHT / 2.0,
        });
        self.status = "Moving row (j/k to position, Enter to drop)".into();
    }

    fn move_pointer(&mut self, delta: f32) {
        let Some(mut drag) = self.drag else {
            return;
        };
        let Ok(col) = self.board.column(drag.column) else {
            return;
        };
        let extent = col.rows.len() as f32 * ROW_HEIGHT;
        drag.pointer_y = (drag.pointer_y + delta).clamp(0.0, extent);
        self.drag = Some(drag);
        self.retarget();
    }

    /// Re-runs the reorder engine against the current display geometry and
    /// mirrors the result in the row order, so the list tracks the pointer
    /// while the grab is active. Nothing is persisted here.
    fn retarget(&mut self) {
        let Some(mut drag) = self.drag else {
            return;
        };
        let Ok(col) = self.board.column(drag.column) else {
            return;
        };
        let len = col.rows.len();
        let mut candidates = Vec::with_capacity(len.saturating_sub(1));
        for display in 0..len {
            if display == drag.index {
                continue;
            }
            candidates.push(RowBounds::new(display as f32 * ROW_HEIGHT, ROW_HEIGHT));
        }
        let target = drag::drop_target(&candidates, drag.pointer_y);
        let dest = drag::insertion_index(candidates.len(), target);
        if dest != drag.index && self.board.move_row(drag.column, drag.index, dest).is_ok() {
            drag.index = dest;
            self.selected_row = dest;
            self.drag = Some(drag);
        }
    }

    /// Drop: the order the session left behind becomes durable.
    fn finish_drag(&mut self) -> Result<()> {
        if self.drag.take().is_some() {
            save_board(&self.location, &self.board)?;
            self.last_save = Instant::now();
            self.status = "Row moved".into();
        }
        Ok(())
    }

    // --- calendar ---

    /// Re-reads the stamp record so the grid always reflects the latest
    /// persisted state.
    fn regenerate(&mut self) {
        self.calendar.stamps = load_stamps(&self.location);
        self.calendar.clamp_cursor();
    }

    fn shift_month(&mut self, delta: i32) {
        let mut month = self.calendar.month as i32 + delta;
        if month < 1 {
            month = 12;
            self.calendar.year -= 1;
        } else if month > 12 {
            month = 1;
            self.calendar.year += 1;
        }
        self.calendar.month = month as u32;
        self.regenerate();
    }

    fn shift_year(&mut self, delta: i32) {
        self.calendar.year += delta;
        self.regenerate();
    }

    fn toggle_stamp(&mut self) -> Result<()> {
        let key = date_key(
            self.calendar.year,
            self.calendar.month,
            self.calendar.cursor_day,
        );
        // flip against the latest persisted state, not a stale in-memory copy
        self.calendar.stamps = load_stamps(&self.location);
        self.dispatch(Action::ToggleStamp { key: key.clone() }, "")?;
        self.regenerate();
        self.status = if self.calendar.stamps.is_stamped(&key) {
            format!("Stamped {}", key)
        } else {
            format!("Unstamped {}", key)
        };
        Ok(())
    }

    // --- selection ---

    fn selected_cell(&self) -> Option<(usize, usize)> {
        let col = self.board.columns.get(self.selected_column)?;
        if self.selected_row < col.rows.len() {
            Some((self.selected_column, self.selected_row))
        } else {
            None
        }
    }

    fn prev_column(&mut self) {
        if self.selected_column > 0 {
            self.selected_column -= 1;
            self.selected_row = 0;
        }
    }

    fn next_column(&mut self) {
        if self.selected_column + 1 < self.board.columns.len() {
            self.selected_column += 1;
            self.selected_row = 0;
        }
    }

    fn prev_row(&mut self) {
        if self.selected_row > 0 {
            self.selected_row -= 1;
        }
    }

    fn next_row(&mut self) {
        if let Some(col) = self.board.columns.get(self.selected_column) {
            if self.selected_row + 1 < col.rows.len() {
                self.selected_row += 1;
            }
        }
    }

    fn ensure_board_bounds(&mut self) {
        if self.board.columns.is_empty() {
            self.selected_column = 0;
            self.selected_row = 0;
            return;
        }
        self.selected_column = self.selected_column.min(self.board.columns.len() - 1);
        let len = self.board.columns[self.selected_column].rows.len();
        self.selected_row = if len == 0 {
            0
        } else {
            self.selected_row.min(len - 1)
        };
    }

    // --- drawing ---

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        match self.view {
            ViewMode::Board => self.draw_board(f, layout[1]),
            ViewMode::Calendar => self.draw_calendar(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::EditRow { field, .. } => self.draw_prompt(f, "Edit Row", "Text", field),
            Mode::EditTitle { field, .. } => self.draw_prompt(f, "Rename Column", "Title", field),
            Mode::LinkPrompt { field, .. } => self.draw_prompt(f, "Set Link", "URL", field),
            Mode::ConfirmDelete { column, row } => self.draw_confirm(f, *column, *row),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let scope = match self.location.scope {
            StoreScope::Project => "project",
            StoreScope::Global => "global",
        };
        let title = Line::from(vec![
            Span::styled(
                "stampdesk ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(scope, Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.dir.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.view.label().to_lowercase()),
                Style::default().fg(Color::Magenta),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_board(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        if self.board.columns.is_empty() {
            let msg = Paragraph::new("No columns defined")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("stampdesk"));
            f.render_widget(Clear, area);
            f.render_widget(msg, area);
            return;
        }

        if self.scroll_offsets.len() < self.board.columns.len() {
            self.scroll_offsets.resize(self.board.columns.len(), 0);
        }

        let chunk_constraints = self
            .board
            .columns
            .iter()
            .map(|_| Constraint::Percentage((100 / self.board.columns.len() as u16).max(1)))
            .collect::<Vec<_>>();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(chunk_constraints)
            .split(area);

        let dragging = self.drag.map(|d| (d.column, d.index));
        for (idx, column) in self.board.columns.iter().enumerate() {
            let accent = color_for_index(idx);
            let width = chunks[idx].width.saturating_sub(2);
            let items = column
                .rows
                .iter()
                .enumerate()
                .map(|(row_idx, row)| row_item(row, width, dragging == Some((idx, row_idx))))
                .collect::<Vec<_>>();

            let mut state = ListState::default();
            let viewport = chunks[idx].height.saturating_sub(2) as usize;
            let mut offset = *self.scroll_offsets.get(idx).unwrap_or(&0);
            if idx == self.selected_column && !items.is_empty() {
                let selected = self.selected_row.min(items.len() - 1);
                offset = scrolled_offset(selected, offset, viewport, items.len());
                self.scroll_offsets[idx] = offset;
                state.select(Some(selected));
            }
            *state.offset_mut() = offset.min(items.len().saturating_sub(1));

            let title = format!("{} ({})", column.title, column.rows.len());
            let block = Block::default()
                .title(Span::styled(
                    title,
                    Style::default()
                        .fg(accent)
                        .add_modifier(if idx == self.selected_column {
                            Modifier::BOLD | Modifier::UNDERLINED
                        } else {
                            Modifier::BOLD
                        }),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent));

            let list = List::new(items).block(block).highlight_style(
                Style::default()
                    .bg(Color::LightCyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
            f.render_stateful_widget(list, chunks[idx], &mut state);
        }
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let today = Local::now().date_naive();
        let grid = calendar::month_grid(
            self.calendar.year,
            self.calendar.month,
            today,
            &self.calendar.stamps,
        );
        let Some(grid) = grid else {
            let msg = Paragraph::new("Invalid month selection")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Calendar"));
            f.render_widget(msg, area);
            return;
        };

        let mut lines = Vec::new();
        lines.push(Line::from(Span::styled(
            format!("{} {}", month_name(grid.month), grid.year),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        let headings = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
        let header_spans: Vec<Span<'static>> = headings
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let fg = if i == 0 || i == 6 {
                    Color::LightRed
                } else {
                    Color::Gray
                };
                Span::styled(format!("{:^6}", h), Style::default().fg(fg))
            })
            .collect();
        lines.push(Line::from(header_spans));

        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut weekday = 0;
        for _ in 0..grid.leading {
            spans.push(Span::raw("      "));
            weekday += 1;
        }
        for cell in &grid.days {
            let marker = if cell.stamped { "●" } else { " " };
            let text = format!("{:>3} {} ", cell.day, marker);
            let mut style = Style::default().fg(if cell.weekend {
                Color::LightRed
            } else {
                Color::Gray
            });
            if cell.stamped {
                style = style.fg(Color::LightGreen);
            }
            if cell.today {
                style = style.add_modifier(Modifier::BOLD).fg(Color::Yellow);
            }
            if cell.day == self.calendar.cursor_day {
                style = style
                    .bg(Color::Cyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(text, style));
            weekday += 1;
            if weekday == 7 {
                lines.push(Line::from(std::mem::take(&mut spans)));
                weekday = 0;
            }
        }
        if !spans.is_empty() {
            lines.push(Line::from(spans));
        }

        let stamped = grid.days.iter().filter(|cell| cell.stamped).count();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} stamped this month", stamped),
            Style::default().fg(Color::Gray),
        )));

        let block = Block::default()
            .title(Span::styled(
                "Calendar",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let (detail, title) = self.detail_content();
        let detail = Paragraph::new(detail)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(title),
            );
        f.render_widget(detail, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("1", Style::default().fg(Color::LightCyan)),
            Span::raw(" board  "),
            Span::styled("2", Style::default().fg(Color::LightCyan)),
            Span::raw(" calendar  "),
        ];
        match self.view {
            ViewMode::Board => spans.extend([
                Span::styled("←↑↓→ / h j k l", Style::default().fg(Color::LightCyan)),
                Span::raw(" move  "),
                Span::styled("a", Style::default().fg(Color::LightMagenta)),
                Span::raw(" add  "),
                Span::styled("e", Style::default().fg(Color::LightYellow)),
                Span::raw(" edit  "),
                Span::styled("u", Style::default().fg(Color::LightBlue)),
                Span::raw(" link  "),
                Span::styled("o", Style::default().fg(Color::LightBlue)),
                Span::raw(" open  "),
                Span::styled("g", Style::default().fg(Color::LightGreen)),
                Span::raw(" grab  "),
                Span::styled("d", Style::default().fg(Color::LightRed)),
                Span::raw(" delete  "),
                Span::styled("q", Style::default().fg(Color::LightRed)),
                Span::raw(" quit"),
            ]),
            ViewMode::Calendar => spans.extend([
                Span::styled("←→", Style::default().fg(Color::LightCyan)),
                Span::raw(" day  "),
                Span::styled("↑↓", Style::default().fg(Color::LightCyan)),
                Span::raw(" week  "),
                Span::styled("Space", Style::default().fg(Color::LightGreen)),
                Span::raw(" stamp  "),
                Span::styled("n/p", Style::default().fg(Color::LightYellow)),
                Span::raw(" month  "),
                Span::styled("N/P", Style::default().fg(Color::LightYellow)),
                Span::raw(" year  "),
                Span::styled("t", Style::default().fg(Color::LightMagenta)),
                Span::raw(" today  "),
                Span::styled("r", Style::default().fg(Color::LightMagenta)),
                Span::raw(" refresh  "),
                Span::styled("q", Style::default().fg(Color::LightRed)),
                Span::raw(" quit"),
            ]),
        }
        Line::from(spans)
    }

    fn detail_content(&self) -> (Vec<Line<'static>>, String) {
        match self.view {
            ViewMode::Board => {
                let Some((column, row)) = self.selected_cell() else {
                    return (vec![Line::from("No row selected")], "Selected".into());
                };
                let Ok(target) = self.board.row(column, row) else {
                    return (vec![Line::from("No row selected")], "Selected".into());
                };
                let mut spans = vec![Span::styled(
                    if target.text.is_empty() {
                        "(empty)".to_string()
                    } else {
                        target.text.clone()
                    },
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )];
                if let Some(link) = &target.link {
                    spans.push(Span::raw("  "));
                    spans.push(Span::styled(
                        link.clone(),
                        Style::default().fg(Color::LightBlue),
                    ));
                }
                (vec![Line::from(spans)], "Selected".into())
            }
            ViewMode::Calendar => {
                let key = date_key(
                    self.calendar.year,
                    self.calendar.month,
                    self.calendar.cursor_day,
                );
                let state = if self.calendar.stamps.is_stamped(&key) {
                    "stamped"
                } else {
                    "not stamped"
                };
                (
                    vec![Line::from(format!("{} ({})", key, state))],
                    "Day".into(),
                )
            }
        }
    }

    fn draw_prompt(&self, f: &mut ratatui::Frame<'_>, title: &str, label: &str, field: &FieldValue) {
        let area = centered_rect(60, 25, f.size());
        let lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("{}: ", label),
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::BOLD | Modifier::DIM),
                ),
                Span::styled(field.with_caret(), Style::default().fg(Color::Cyan)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter done • Esc close",
                Style::default().fg(Color::Gray),
            )),
        ];
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, column: usize, row: usize) {
        let area = centered_rect(50, 30, f.size());
        let text = self
            .board
            .row(column, row)
            .map(|r| {
                if r.text.is_empty() {
                    "(empty row)".to_string()
                } else {
                    r.text.clone()
                }
            })
            .unwrap_or_else(|_| "(missing row)".to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", text),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

/// Applies one key event to a single-line field. Returns whether the value
/// changed.
fn edit_field(field: &mut FieldValue, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Left => {
            field.move_left();
            false
        }
        KeyCode::Right => {
            field.move_right();
            false
        }
        KeyCode::Backspace => {
            let had_content = field.cursor > 0;
            field.backspace();
            had_content
        }
        KeyCode::Char(c) => {
            if key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
            {
                false
            } else {
                field.insert_char(c);
                true
            }
        }
        _ => false,
    }
}

fn prev_char(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_char(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or_else(|| text.len())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn row_item(row: &Row, width: u16, dragging: bool) -> ListItem<'static> {
    let width = width.max(6) as usize;
    let mut spans = Vec::new();
    if row.text.is_empty() {
        spans.push(Span::styled(
            "(empty)",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
        ));
    } else {
        spans.push(Span::styled(
            truncate_text(&row.text, width.saturating_sub(2)),
            Style::default().fg(Color::White),
        ));
    }
    if row.link.is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled("↗", Style::default().fg(Color::LightBlue)));
    }
    let mut item = ListItem::new(Line::from(spans));
    if dragging {
        item = item.style(
            Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
    }
    item
}

fn scrolled_offset(selected: usize, current: usize, viewport: usize, len: usize) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let mut offset = current.min(max_offset);
    if selected < offset {
        offset = selected;
    } else if selected >= offset + viewport {
        offset = selected + 1 - viewport;
    }
    offset.min(max_offset)
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "?",
    }
}

fn color_for_index(idx: usize) -> Color {
    let palette = [
        Color::Cyan,
        Color::LightGreen,
        Color::LightMagenta,
        Color::LightBlue,
        Color::LightYellow,
        Color::LightRed,
    ];
    palette[idx % palette.len()]
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- scrolled_offset ---

    #[test]
    fn offset_follows_selection_downward() {
        assert_eq!(scrolled_offset(0, 0, 5, 20), 0);
        assert_eq!(scrolled_offset(7, 0, 5, 20), 3);
        assert_eq!(scrolled_offset(19, 3, 5, 20), 15);
    }

    #[test]
    fn offset_follows_selection_upward() {
        assert_eq!(scrolled_offset(2, 10, 5, 20), 2);
    }

    #[test]
    fn offset_handles_degenerate_viewports() {
        assert_eq!(scrolled_offset(3, 0, 0, 20), 0);
        assert_eq!(scrolled_offset(0, 0, 5, 0), 0);
    }

    // --- truncate_text ---

    #[test]
    fn truncation_appends_ellipsis_only_when_needed() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a longer line", 8), "a lon...");
        assert_eq!(truncate_text("anything", 0), "");
    }

    // --- field editing ---

    #[test]
    fn field_insert_and_backspace() {
        let mut field = FieldValue::new("ab");
        field.insert_char('c');
        assert_eq!(field.value, "abc");
        field.backspace();
        field.backspace();
        assert_eq!(field.value, "a");
    }

    #[test]
    fn field_cursor_moves_over_multibyte_chars() {
        let mut field = FieldValue::new("héllo");
        field.move_left();
        field.move_left();
        field.move_left();
        field.move_left();
        field.insert_char('x');
        assert_eq!(field.value, "hxéllo");
    }
}
