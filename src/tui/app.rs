//! Kanban dashboard interface.
//!
//! Tasks are organized into five status columns. Selection moves with the
//! arrow keys; Ctrl+Left/Right carries the selected card into the adjacent
//! column, which runs the optimistic move protocol against the backend.
//! Search and the designer/PM/week filters re-derive the visible board, and
//! Enter opens the detail editor popup. Network confirmations are spawned
//! onto the runtime and report back over a channel, so the board never
//! blocks on the wire.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

use crate::board::{confirm_move, BoardController, DropTarget};
use crate::editor::DetailEditor;
use crate::fields::{Status, BOARD_ORDER, CANONICAL_WEEKS, EDITOR_STATUS_ORDER};
use crate::remote::TaskBackend;
use crate::store::TaskStore;
use crate::sync::{self, SyncHandle};
use crate::task::Task;
use crate::tui::colors::{status_color, text_on};
use crate::view::{self, BoardStats, TaskFilter};

const CARD_HEIGHT: usize = 4;
const COLUMN_COUNT: usize = 5;

/// Screens the dashboard can be on.
#[derive(Clone, Copy, PartialEq)]
enum AppState {
    Board,
    Detail,
    ConfirmDelete,
    Help,
}

/// Completion of a spawned network operation.
enum OpResult {
    MoveSettled { error: Option<String> },
    SaveSettled(Result<String, String>),
    DeleteSettled { error: Option<String> },
    RefreshSettled(Result<SyncHandle, String>),
}

/// One rendered row inside a column: a week header or a card.
enum BoardRow {
    Header(String),
    Card(usize),
}

struct ColumnView {
    status: Status,
    cards: Vec<Task>,
    rows: Vec<BoardRow>,
}

/// Open detail editor plus its panel state.
struct EditorPanel {
    session: DetailEditor,
    field: usize,
    busy: bool,
}

const EDIT_STATUS: usize = 0;
const EDIT_DESCRIPTION: usize = 1;
const EDIT_DESIGNER: usize = 2;
const EDIT_PM: usize = 3;
const EDIT_DEMO: usize = 4;
const EDIT_FIELD_COUNT: usize = 5;

/// Main dashboard application state.
pub struct BoardApp {
    store: Arc<TaskStore>,
    backend: Arc<dyn TaskBackend>,
    runtime: Handle,
    revision: watch::Receiver<u64>,
    results_tx: mpsc::UnboundedSender<OpResult>,
    results_rx: mpsc::UnboundedReceiver<OpResult>,
    sync_handle: Option<SyncHandle>,

    state: AppState,
    filter: TaskFilter,
    search_active: bool,
    week_grouped: bool,
    columns: Vec<ColumnView>,
    stats: BoardStats,
    designers: Vec<String>,
    pms: Vec<String>,
    selected_column: usize,
    selected_card: usize,
    scroll_offsets: [usize; COLUMN_COUNT],
    board: BoardController,
    editor: Option<EditorPanel>,
    load_error: Option<String>,
    status_message: String,
}

impl BoardApp {
    /// Build the dashboard over an already-seeded store. `load_error` carries
    /// the initial fetch failure, if any; the board still opens and shows it
    /// as a banner over empty columns.
    pub fn new(
        store: Arc<TaskStore>,
        backend: Arc<dyn TaskBackend>,
        runtime: Handle,
        sync_handle: Option<SyncHandle>,
        load_error: Option<String>,
    ) -> Self {
        let revision = store.watch();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let mut app = BoardApp {
            store,
            backend,
            runtime,
            revision,
            results_tx,
            results_rx,
            sync_handle,
            state: AppState::Board,
            filter: TaskFilter::default(),
            search_active: false,
            week_grouped: false,
            columns: Vec::new(),
            stats: BoardStats::default(),
            designers: Vec::new(),
            pms: Vec::new(),
            selected_column: 0,
            selected_card: 0,
            scroll_offsets: [0; COLUMN_COUNT],
            board: BoardController::new(),
            editor: None,
            load_error,
            status_message: String::new(),
        };
        app.rebuild();
        app
    }

    /// Re-derive columns, stats and dropdown values from the store.
    fn rebuild(&mut self) {
        let keep_id = self.selected_task().map(|t| t.id.clone());

        let snapshot = self.store.snapshot();
        self.designers = view::distinct_designers(&snapshot);
        self.pms = view::distinct_pms(&snapshot);
        let visible = view::apply_filter(&snapshot, &self.filter);
        self.stats = view::board_stats(&visible);

        self.columns = view::group_by_status(&visible)
            .into_iter()
            .map(|(status, bucket)| {
                let mut cards = Vec::new();
                let mut rows = Vec::new();
                if self.week_grouped {
                    for (label, group) in view::group_by_week(&bucket) {
                        rows.push(BoardRow::Header(label));
                        for task in group {
                            rows.push(BoardRow::Card(cards.len()));
                            cards.push(task.clone());
                        }
                    }
                } else {
                    for task in &bucket {
                        rows.push(BoardRow::Card(cards.len()));
                        cards.push((*task).clone());
                    }
                }
                ColumnView { status, cards, rows }
            })
            .collect();

        // Follow the previously selected task wherever it landed.
        if let Some(id) = keep_id {
            for (ci, column) in self.columns.iter().enumerate() {
                if let Some(pos) = column.cards.iter().position(|t| t.id == id) {
                    self.selected_column = ci;
                    self.selected_card = pos;
                    break;
                }
            }
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.selected_column >= self.columns.len() {
            self.selected_column = 0;
        }
        let len = self
            .columns
            .get(self.selected_column)
            .map(|c| c.cards.len())
            .unwrap_or(0);
        if len == 0 {
            self.selected_card = 0;
        } else if self.selected_card >= len {
            self.selected_card = len - 1;
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        self.columns
            .get(self.selected_column)
            .and_then(|c| c.cards.get(self.selected_card))
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Apply any store change notifications since the last tick.
    fn sync_revision(&mut self) {
        if self.revision.has_changed().unwrap_or(false) {
            self.revision.mark_unchanged();
            self.rebuild();
        }
    }

    /// Handle completions of spawned network operations.
    fn drain_results(&mut self) {
        while let Ok(result) = self.results_rx.try_recv() {
            match result {
                OpResult::MoveSettled { error: None } => {}
                OpResult::MoveSettled { error: Some(msg) } => {
                    self.set_status_message(format!("Move failed, reverted: {msg}"));
                }
                OpResult::SaveSettled(Ok(_)) => {
                    self.editor = None;
                    self.state = AppState::Board;
                    self.set_status_message("Changes saved");
                }
                OpResult::SaveSettled(Err(msg)) => {
                    if let Some(panel) = &mut self.editor {
                        panel.busy = false;
                    }
                    self.set_status_message(format!("Save failed: {msg}"));
                }
                OpResult::DeleteSettled { error: None } => {
                    self.editor = None;
                    self.state = AppState::Board;
                    self.set_status_message("Task deleted");
                }
                OpResult::DeleteSettled { error: Some(msg) } => {
                    if let Some(panel) = &mut self.editor {
                        panel.busy = false;
                    }
                    self.state = AppState::Detail;
                    self.set_status_message(format!("Delete failed: {msg}"));
                }
                OpResult::RefreshSettled(Ok(handle)) => {
                    self.sync_handle = Some(handle);
                    self.load_error = None;
                    self.set_status_message("Reloaded");
                }
                OpResult::RefreshSettled(Err(msg)) => {
                    self.load_error = Some(msg);
                }
            }
        }
    }

    /// Carry the selected card one column left or right. Each key press is a
    /// complete drag gesture: optimistic store move now, remote confirmation
    /// in the background, revert on failure.
    fn move_card(&mut self, dir: isize) {
        let target = self.selected_column as isize + dir;
        if !(0..COLUMN_COUNT as isize).contains(&target) {
            return;
        }
        let Some(task) = self.selected_task() else {
            return;
        };
        let task_id = task.id.clone();
        let target_status = BOARD_ORDER[target as usize];

        self.board.begin_drag(task_id);
        let Some(pending) = self.board.drop_on(&self.store, DropTarget::Column(target_status))
        else {
            return;
        };

        let store = self.store.clone();
        let backend = self.backend.clone();
        let tx = self.results_tx.clone();
        self.runtime.spawn(async move {
            let error = confirm_move(&store, backend.as_ref(), pending)
                .await
                .err()
                .map(|e| e.to_string());
            let _ = tx.send(OpResult::MoveSettled { error });
        });
        self.set_status_message(format!("Moved to {target_status}"));
    }

    fn open_detail(&mut self) {
        if let Some(task) = self.selected_task() {
            self.editor = Some(EditorPanel {
                session: DetailEditor::open(task.clone()),
                field: EDIT_STATUS,
                busy: false,
            });
            self.state = AppState::Detail;
        }
    }

    fn save_editor(&mut self) {
        let Some(panel) = &mut self.editor else {
            return;
        };
        if panel.busy {
            return;
        }
        // Validate staged input before anything leaves the machine.
        if let Err(msg) = panel.session.staged_patch() {
            self.set_status_message(msg);
            return;
        }
        panel.busy = true;
        let session = panel.session.clone();
        let store = self.store.clone();
        let backend = self.backend.clone();
        let tx = self.results_tx.clone();
        self.runtime.spawn(async move {
            let result = session
                .save(&store, backend.as_ref())
                .await
                .map(|t| t.id)
                .map_err(|e| e.to_string());
            let _ = tx.send(OpResult::SaveSettled(result));
        });
    }

    fn delete_editor_task(&mut self) {
        let Some(panel) = &mut self.editor else {
            return;
        };
        if panel.busy {
            return;
        }
        panel.busy = true;
        let session = panel.session.clone();
        let store = self.store.clone();
        let backend = self.backend.clone();
        let tx = self.results_tx.clone();
        self.runtime.spawn(async move {
            let error = session
                .delete(&store, backend.as_ref())
                .await
                .err()
                .map(|e| e.to_string());
            let _ = tx.send(OpResult::DeleteSettled { error });
        });
    }

    /// Full reload: fresh fetch plus a new live subscription. The previous
    /// subscription (if any) is torn down by the handle swap.
    fn refresh(&mut self) {
        self.sync_handle = None;
        let store = self.store.clone();
        let backend = self.backend.clone();
        let tx = self.results_tx.clone();
        self.runtime.spawn(async move {
            let result = sync::start(store, backend).await.map_err(|e| e.to_string());
            let _ = tx.send(OpResult::RefreshSettled(result));
        });
        self.set_status_message("Reloading…");
    }

    fn cycle_designer(&mut self) {
        self.filter.designer = next_option(self.filter.designer.take(), &self.designers);
        self.rebuild();
    }

    fn cycle_pm(&mut self) {
        self.filter.pm = next_option(self.filter.pm.take(), &self.pms);
        self.rebuild();
    }

    fn cycle_week(&mut self) {
        self.filter.week = match self.filter.week.take() {
            None => Some(CANONICAL_WEEKS[0].clone()),
            Some(current) => CANONICAL_WEEKS
                .iter()
                .position(|w| *w == current)
                .and_then(|i| CANONICAL_WEEKS.get(i + 1))
                .cloned(),
        };
        self.rebuild();
    }

    /// Poll for and handle keyboard events based on current application state.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if self.search_active {
                    self.handle_search_input(key.code);
                    return Ok(false);
                }
                return match self.state {
                    AppState::Board => self.handle_board_input(key.code, key.modifiers),
                    AppState::Detail => self.handle_detail_input(key.code, key.modifiers),
                    AppState::ConfirmDelete => Ok(self.handle_confirm_input(key.code)),
                    AppState::Help => {
                        self.state = AppState::Board;
                        Ok(false)
                    }
                };
            }
        }
        Ok(false)
    }

    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.search_active = false;
                self.filter.search.clear();
                self.rebuild();
            }
            KeyCode::Enter => {
                self.search_active = false;
                self.set_status_message(format!("{} tasks shown", self.stats.total));
            }
            KeyCode::Backspace => {
                self.filter.search.pop();
                self.rebuild();
            }
            KeyCode::Char(c) => {
                self.filter.search.push(c);
                self.rebuild();
            }
            _ => {}
        }
    }

    fn handle_board_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        self.status_message.clear();
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),

            KeyCode::Left if modifiers.contains(KeyModifiers::CONTROL) => self.move_card(-1),
            KeyCode::Right if modifiers.contains(KeyModifiers::CONTROL) => self.move_card(1),

            KeyCode::Left => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right => {
                if self.selected_column + 1 < self.columns.len() {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up => {
                if self.selected_card > 0 {
                    self.selected_card -= 1;
                }
            }
            KeyCode::Down => {
                let len = self
                    .columns
                    .get(self.selected_column)
                    .map(|c| c.cards.len())
                    .unwrap_or(0);
                if len > 0 && self.selected_card + 1 < len {
                    self.selected_card += 1;
                }
            }

            KeyCode::Enter => self.open_detail(),
            KeyCode::Char('/') => {
                self.search_active = true;
                self.set_status_message("Search: type to match feature or APL, Enter to keep, Esc to clear");
            }
            KeyCode::Char('d') => self.cycle_designer(),
            KeyCode::Char('p') => self.cycle_pm(),
            KeyCode::Char('w') => self.cycle_week(),
            KeyCode::Char('g') => {
                self.week_grouped = !self.week_grouped;
                self.rebuild();
            }
            KeyCode::Char('c') => {
                self.filter.clear();
                self.rebuild();
                self.set_status_message("Filters cleared");
            }
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('h') => self.state = AppState::Help,
            _ => {}
        }
        Ok(false)
    }

    fn handle_detail_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => self.save_editor(),
            KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.state = AppState::ConfirmDelete;
            }
            KeyCode::Esc => {
                self.editor = None;
                self.state = AppState::Board;
            }
            KeyCode::Tab | KeyCode::Down => {
                if let Some(panel) = &mut self.editor {
                    panel.field = (panel.field + 1) % EDIT_FIELD_COUNT;
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                if let Some(panel) = &mut self.editor {
                    panel.field = panel.field.checked_sub(1).unwrap_or(EDIT_FIELD_COUNT - 1);
                }
            }
            KeyCode::Left | KeyCode::Right => {
                if let Some(panel) = &mut self.editor {
                    if panel.field == EDIT_STATUS {
                        let step: isize = if key == KeyCode::Right { 1 } else { -1 };
                        let pos = EDITOR_STATUS_ORDER
                            .iter()
                            .position(|s| *s == panel.session.status)
                            .unwrap_or(0) as isize;
                        let next = (pos + step).rem_euclid(EDITOR_STATUS_ORDER.len() as isize);
                        panel.session.status = EDITOR_STATUS_ORDER[next as usize];
                    }
                }
            }
            KeyCode::Char(c) => {
                if let Some(panel) = &mut self.editor {
                    if let Some(value) = staged_field_mut(panel) {
                        value.push(c);
                    }
                }
            }
            KeyCode::Backspace => {
                if let Some(panel) = &mut self.editor {
                    if let Some(value) = staged_field_mut(panel) {
                        value.pop();
                    }
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_confirm_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.delete_editor_task(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state = AppState::Detail;
            }
            _ => {}
        }
        false
    }

    /// Render the header block: title line plus stats or the fetch-error
    /// banner.
    fn render_header(&self, f: &mut Frame, area: Rect) {
        let second_line = if let Some(error) = &self.load_error {
            Line::from(Span::styled(
                format!("Failed to load tasks: {error} (r to retry)"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(vec![
                Span::raw(format!("Total: {}  ", self.stats.total)),
                Span::styled(
                    format!("Completed: {}  ", self.stats.completed),
                    Style::default().fg(status_color(Status::Completed)),
                ),
                Span::styled(
                    format!("In Progress: {}  ", self.stats.in_progress),
                    Style::default().fg(status_color(Status::InProgress)),
                ),
                Span::styled(
                    format!("On Hold: {}", self.stats.on_hold),
                    Style::default().fg(status_color(Status::OnHold)),
                ),
                Span::raw(filter_summary(&self.filter, self.week_grouped)),
            ])
        };
        let header_text = vec![
            Line::from(vec![
                Span::styled("FX DESIGN TRACKER", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(
                    "Dashboard",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
                ),
            ]),
            second_line,
        ];
        let header = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let constraints: Vec<Constraint> =
            (0..COLUMN_COUNT).map(|_| Constraint::Percentage(20)).collect();
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);
        for (i, &column_area) in layout.iter().enumerate() {
            self.render_column(f, column_area, i);
        }
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, index: usize) {
        let Some(column) = self.columns.get(index) else {
            return;
        };
        let is_selected = index == self.selected_column;
        let color = status_color(column.status);

        let border_style = if is_selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let title = Span::styled(
            format!(" {} ({}) ", column.status, column.cards.len()),
            Style::default().bg(color).fg(text_on(column.status)),
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        if column.cards.is_empty() {
            let empty = Paragraph::new("No tasks match your filters")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            f.render_widget(empty, inner);
            return;
        }

        let heights: Vec<usize> = column
            .rows
            .iter()
            .map(|row| match row {
                BoardRow::Header(_) => 1,
                BoardRow::Card(_) => CARD_HEIGHT,
            })
            .collect();
        let selected_row = column
            .rows
            .iter()
            .position(|row| matches!(row, BoardRow::Card(i) if *i == self.selected_card))
            .unwrap_or(0);
        let available = inner.height as usize;

        let mut offset = self.scroll_offsets[index];
        if is_selected {
            offset = scroll_to_fit(&heights, selected_row, offset, available);
            self.scroll_offsets[index] = offset;
        } else if offset >= column.rows.len() {
            offset = 0;
            self.scroll_offsets[index] = 0;
        }

        let mut y = 0usize;
        for (row_index, row) in column.rows.iter().enumerate().skip(offset) {
            let height = heights[row_index];
            if y + height > available {
                break;
            }
            let row_area = Rect {
                x: inner.x,
                y: inner.y + y as u16,
                width: inner.width,
                height: height as u16,
            };
            match row {
                BoardRow::Header(label) => {
                    let header = Paragraph::new(format!("── {label} ──"))
                        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
                    f.render_widget(header, row_area);
                }
                BoardRow::Card(card_index) => {
                    let task = &column.cards[*card_index];
                    let selected = is_selected && *card_index == self.selected_card;
                    render_card(f, row_area, task, column.status, selected);
                }
            }
            y += height;
        }
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if self.search_active {
            format!("Search: {}▌  (Enter to keep, Esc to clear)", self.filter.search)
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            "←→↑↓: Navigate | Ctrl+←/→: Move card | Enter: Details | /: Search | d/p/w: Filter | g: Group by week | c: Clear filters | r: Reload | h: Help | q: Quit"
                .to_string()
        };
        let bar = Paragraph::new(text)
            .style(Style::default().bg(Color::Rgb(30, 41, 59)).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(bar, area);
    }

    fn render_editor(&self, f: &mut Frame) {
        let Some(panel) = &self.editor else {
            return;
        };
        let task = &panel.session.task;
        let area = centered_rect(70, 80, f.area());
        f.render_widget(Clear, area);

        let mut lines = vec![
            Line::from(Span::styled(
                task.feature_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Week:              {}", task.week_label)),
            Line::from(format!("Week Start:        {}", fmt_date(task.week_start_date))),
            Line::from(format!("FSD Presented:     {}", fmt_date(task.fsd_presented))),
            Line::from(format!("Design Start:      {}", fmt_date(task.design_start_date))),
            Line::from(format!("Design End:        {}", fmt_date(task.design_end_date))),
            Line::from(format!("APL Number(s):     {}", task.apl.as_deref().unwrap_or("—"))),
            Line::from(format!("Created:           {}", fmt_datetime(task.created_at))),
            Line::from(format!("Updated:           {}", fmt_datetime(task.updated_at))),
            Line::from(""),
        ];

        let fields: [(&str, String); EDIT_FIELD_COUNT] = [
            ("Status", format!("< {} >", panel.session.status)),
            ("Description", panel.session.description.clone()),
            ("Designer", panel.session.designer.clone()),
            ("PM", panel.session.pm.clone()),
            ("Demo Date", panel.session.demo_date.clone()),
        ];
        for (i, (label, value)) in fields.iter().enumerate() {
            let active = i == panel.field;
            let marker = if active { "▸ " } else { "  " };
            let style = if active {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("{marker}{label:<12} {value}"),
                style,
            )));
        }

        lines.push(Line::from(""));
        let footer = if panel.busy {
            "Working…"
        } else {
            "Tab: Next field | ←/→: Change status | Ctrl+S: Save | Ctrl+D: Delete | Esc: Close"
        };
        lines.push(Line::from(Span::styled(
            footer,
            Style::default().fg(Color::DarkGray),
        )));

        let popup = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task details")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(status_color(task.status))),
            )
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);
    }

    fn render_confirm(&self, f: &mut Frame) {
        let area = centered_rect(40, 20, f.area());
        f.render_widget(Clear, area);
        let popup = Paragraph::new("Are you sure you want to delete this task?\n\n(y)es / (n)o")
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Confirm delete")
                    .border_style(Style::default().fg(Color::Red)),
            )
            .alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);
    }

    fn render_help(&self, f: &mut Frame) {
        let area = centered_rect(60, 60, f.area());
        f.render_widget(Clear, area);
        let lines = vec![
            Line::from("Board"),
            Line::from("  ←→↑↓        select column / card"),
            Line::from("  Ctrl+←/→    move the selected card between columns"),
            Line::from("  Enter       open the detail editor"),
            Line::from("  /           search feature name or APL"),
            Line::from("  d / p / w   cycle designer / PM / week filters"),
            Line::from("  g           toggle week grouping inside columns"),
            Line::from("  c           clear all filters"),
            Line::from("  r           reload from the backend"),
            Line::from("  q or Esc    quit"),
            Line::from(""),
            Line::from("Detail editor"),
            Line::from("  Tab         next field, ←/→ change status"),
            Line::from("  Ctrl+S      save, Ctrl+D delete, Esc close"),
            Line::from(""),
            Line::from("Press any key to close"),
        ];
        let popup = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);
    }

    /// Main render function that dispatches to appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        match self.state {
            AppState::Detail => self.render_editor(f),
            AppState::ConfirmDelete => {
                self.render_editor(f);
                self.render_confirm(f);
            }
            AppState::Help => self.render_help(f),
            AppState::Board => {}
        }
    }

    /// Main event loop: apply async completions and store notifications,
    /// draw, then poll input.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.drain_results();
            self.sync_revision();
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        // Tear the live subscription down with the board.
        drop(self.sync_handle.take());
        Ok(())
    }
}

fn staged_field_mut(panel: &mut EditorPanel) -> Option<&mut String> {
    match panel.field {
        EDIT_DESCRIPTION => Some(&mut panel.session.description),
        EDIT_DESIGNER => Some(&mut panel.session.designer),
        EDIT_PM => Some(&mut panel.session.pm),
        EDIT_DEMO => Some(&mut panel.session.demo_date),
        _ => None,
    }
}

fn next_option(current: Option<String>, options: &[String]) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    match current {
        None => Some(options[0].clone()),
        Some(cur) => match options.iter().position(|o| *o == cur) {
            Some(i) if i + 1 < options.len() => Some(options[i + 1].clone()),
            _ => None,
        },
    }
}

fn filter_summary(filter: &TaskFilter, week_grouped: bool) -> String {
    let mut parts = Vec::new();
    if !filter.search.trim().is_empty() {
        parts.push(format!("search: {}", filter.search.trim()));
    }
    if let Some(designer) = &filter.designer {
        parts.push(format!("designer: {designer}"));
    }
    if let Some(pm) = &filter.pm {
        parts.push(format!("pm: {pm}"));
    }
    if let Some(week) = &filter.week {
        parts.push(format!("week: {week}"));
    }
    if week_grouped {
        parts.push("grouped by week".to_string());
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("   [{}]", parts.join(" | "))
    }
}

fn render_card(f: &mut Frame, area: Rect, task: &Task, status: Status, selected: bool) {
    let style = if selected {
        Style::default()
            .bg(status_color(status))
            .fg(text_on(status))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::Rgb(30, 41, 59)).fg(Color::White)
    };
    let width = area.width.saturating_sub(2) as usize;
    let meta = format!(
        "{} · {}",
        task.week_label,
        task.designer.as_deref().unwrap_or("—")
    );
    let text = vec![
        Line::from(truncate(&task.feature_name, width)),
        Line::from(truncate(&meta, width)),
    ];
    let card = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(card, area);
}

/// Advance `offset` until the row at `selected` fits in `available` lines.
fn scroll_to_fit(heights: &[usize], selected: usize, offset: usize, available: usize) -> usize {
    let mut offset = offset.min(selected);
    loop {
        let mut used = 0;
        let mut end = offset;
        for (i, h) in heights.iter().enumerate().skip(offset) {
            if used + h > available {
                break;
            }
            used += h;
            end = i + 1;
        }
        if selected < end || offset >= selected {
            return offset;
        }
        offset += 1;
    }
}

/// Centered popup area taking the given percentages of the frame.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "—".to_string())
}

fn fmt_datetime(ts: DateTime<Utc>) -> String {
    ts.format("%d/%m/%Y %H:%M").to_string()
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_option_cycles_through_and_back_to_all() {
        let options = vec!["Alex".to_string(), "Sam".to_string()];
        let step1 = next_option(None, &options);
        assert_eq!(step1.as_deref(), Some("Alex"));
        let step2 = next_option(step1, &options);
        assert_eq!(step2.as_deref(), Some("Sam"));
        assert_eq!(next_option(step2, &options), None);
        assert_eq!(next_option(None, &[]), None);
    }

    #[test]
    fn test_scroll_keeps_selected_row_visible() {
        // Four cards of height 4 in a 8-line viewport: two visible at a time.
        let heights = [4, 4, 4, 4];
        assert_eq!(scroll_to_fit(&heights, 0, 0, 8), 0);
        assert_eq!(scroll_to_fit(&heights, 1, 0, 8), 0);
        assert_eq!(scroll_to_fit(&heights, 2, 0, 8), 1);
        // Scrolling back up follows the selection.
        assert_eq!(scroll_to_fit(&heights, 0, 2, 8), 0);
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long feature name", 10), "a very lo…");
    }
}
