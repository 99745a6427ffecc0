//! Task submission form for the terminal user interface.
//!
//! Stages every field as text or a selector, validates on submit, and shows
//! per-field errors inline. A valid draft is inserted through the backend;
//! the form resets once the insert is confirmed.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::fields::{Status, WeekLabel, CANONICAL_WEEKS, EDITOR_STATUS_ORDER};
use crate::form::{
    FieldErrors, TaskDraft, FIELD_DEMO, FIELD_DESIGN_END, FIELD_DESIGN_START, FIELD_FEATURE,
    FIELD_FSD, FIELD_STATUS, FIELD_WEEK, FIELD_WEEK_START,
};
use crate::remote::TaskBackend;
use crate::tui::input::InputField;

/// Global order constants for the form fields.
pub const WEEK_ORDER: usize = 0;
pub const WEEK_START_ORDER: usize = 1;
pub const FSD_ORDER: usize = 2;
pub const STATUS_ORDER: usize = 3;
pub const DESIGN_START_ORDER: usize = 4;
pub const DESIGN_END_ORDER: usize = 5;
pub const APL_ORDER: usize = 6;
pub const FEATURE_ORDER: usize = 7;
pub const PM_ORDER: usize = 8;
pub const DESIGNER_ORDER: usize = 9;
pub const DESCRIPTION_ORDER: usize = 10;
pub const DEMO_ORDER: usize = 11;

const FIELD_COUNT: usize = 12;

enum SubmitResult {
    Accepted(String),
    Rejected(String),
}

/// Submission form application state.
pub struct SubmitApp {
    backend: Arc<dyn TaskBackend>,
    runtime: Handle,
    results_tx: mpsc::UnboundedSender<SubmitResult>,
    results_rx: mpsc::UnboundedReceiver<SubmitResult>,

    /// 0 = not selected, otherwise index+1 into `CANONICAL_WEEKS`.
    week: usize,
    /// 0 = not selected, otherwise index+1 into `EDITOR_STATUS_ORDER`.
    status: usize,
    week_start: InputField,
    fsd_presented: InputField,
    design_start: InputField,
    design_end: InputField,
    apl: InputField,
    feature_name: InputField,
    pm: InputField,
    designer: InputField,
    description: InputField,
    demo_date: InputField,

    current: usize,
    errors: FieldErrors,
    submitting: bool,
    status_message: String,
}

impl SubmitApp {
    pub fn new(backend: Arc<dyn TaskBackend>, runtime: Handle) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        SubmitApp {
            backend,
            runtime,
            results_tx,
            results_rx,
            week: 0,
            status: 0,
            week_start: InputField::new(),
            fsd_presented: InputField::new(),
            design_start: InputField::new(),
            design_end: InputField::new(),
            apl: InputField::new(),
            feature_name: InputField::new(),
            pm: InputField::new(),
            designer: InputField::new(),
            description: InputField::new(),
            demo_date: InputField::new(),
            current: 0,
            errors: FieldErrors::new(),
            submitting: false,
            status_message: String::new(),
        }
    }

    fn selected_week(&self) -> Option<WeekLabel> {
        self.week
            .checked_sub(1)
            .and_then(|i| CANONICAL_WEEKS.get(i))
            .cloned()
    }

    fn selected_status(&self) -> Option<Status> {
        self.status
            .checked_sub(1)
            .and_then(|i| EDITOR_STATUS_ORDER.get(i))
            .copied()
    }

    /// The staged draft as it stands.
    fn draft(&self) -> TaskDraft {
        TaskDraft {
            week_label: self.selected_week(),
            week_start_date: self.week_start.value.clone(),
            fsd_presented: self.fsd_presented.value.clone(),
            status: self.selected_status(),
            design_start_date: self.design_start.value.clone(),
            design_end_date: self.design_end.value.clone(),
            apl: self.apl.value.clone(),
            feature_name: self.feature_name.value.clone(),
            pm: self.pm.value.clone(),
            designer: self.designer.value.clone(),
            task_description: self.description.value.clone(),
            demo_date: self.demo_date.value.clone(),
        }
    }

    fn reset(&mut self) {
        self.week = 0;
        self.status = 0;
        self.week_start.clear();
        self.fsd_presented.clear();
        self.design_start.clear();
        self.design_end.clear();
        self.apl.clear();
        self.feature_name.clear();
        self.pm.clear();
        self.designer.clear();
        self.description.clear();
        self.demo_date.clear();
        self.current = 0;
        self.errors.clear();
        self.submitting = false;
    }

    fn active_input_mut(&mut self) -> Option<&mut InputField> {
        match self.current {
            WEEK_START_ORDER => Some(&mut self.week_start),
            FSD_ORDER => Some(&mut self.fsd_presented),
            DESIGN_START_ORDER => Some(&mut self.design_start),
            DESIGN_END_ORDER => Some(&mut self.design_end),
            APL_ORDER => Some(&mut self.apl),
            FEATURE_ORDER => Some(&mut self.feature_name),
            PM_ORDER => Some(&mut self.pm),
            DESIGNER_ORDER => Some(&mut self.designer),
            DESCRIPTION_ORDER => Some(&mut self.description),
            DEMO_ORDER => Some(&mut self.demo_date),
            _ => None,
        }
    }

    fn next_field(&mut self) {
        self.current = (self.current + 1) % FIELD_COUNT;
    }

    fn prev_field(&mut self) {
        self.current = self.current.checked_sub(1).unwrap_or(FIELD_COUNT - 1);
    }

    /// Cycle a selector field left or right.
    fn handle_left_right(&mut self, right: bool) {
        match self.current {
            WEEK_ORDER => {
                let len = CANONICAL_WEEKS.len() + 1;
                self.week = step(self.week, len, right);
            }
            STATUS_ORDER => {
                let len = EDITOR_STATUS_ORDER.len() + 1;
                self.status = step(self.status, len, right);
            }
            _ => {
                if let Some(input) = self.active_input_mut() {
                    if right {
                        input.move_right();
                    } else {
                        input.move_left();
                    }
                }
            }
        }
    }

    /// Validate and, if clean, send the insert. Submission is never
    /// attempted while the draft is invalid.
    fn submit(&mut self) {
        if self.submitting {
            return;
        }
        match self.draft().validate() {
            Err(errors) => {
                self.errors = errors;
                self.status_message = "Fix the highlighted fields".to_string();
            }
            Ok(task) => {
                self.errors.clear();
                self.submitting = true;
                self.status_message = "Submitting…".to_string();
                let backend = self.backend.clone();
                let tx = self.results_tx.clone();
                self.runtime.spawn(async move {
                    let result = match backend.insert(task).await {
                        Ok(stored) => SubmitResult::Accepted(stored.feature_name),
                        Err(e) => SubmitResult::Rejected(e.to_string()),
                    };
                    let _ = tx.send(result);
                });
            }
        }
    }

    fn drain_results(&mut self) {
        while let Ok(result) = self.results_rx.try_recv() {
            match result {
                SubmitResult::Accepted(feature) => {
                    self.reset();
                    self.status_message = format!("Task submitted: {feature}");
                }
                SubmitResult::Rejected(msg) => {
                    self.submitting = false;
                    self.status_message = format!("Failed to submit task: {msg}");
                }
            }
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Esc => return Ok(true),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(true)
                    }
                    KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.submit()
                    }
                    KeyCode::Tab | KeyCode::Down | KeyCode::Enter => self.next_field(),
                    KeyCode::BackTab | KeyCode::Up => self.prev_field(),
                    KeyCode::Left => self.handle_left_right(false),
                    KeyCode::Right => self.handle_left_right(true),
                    KeyCode::Backspace => {
                        if let Some(input) = self.active_input_mut() {
                            input.backspace();
                        }
                    }
                    KeyCode::Delete => {
                        if let Some(input) = self.active_input_mut() {
                            input.delete();
                        }
                    }
                    KeyCode::Home => {
                        if let Some(input) = self.active_input_mut() {
                            input.move_home();
                        }
                    }
                    KeyCode::End => {
                        if let Some(input) = self.active_input_mut() {
                            input.move_end();
                        }
                    }
                    KeyCode::Char(c) => {
                        if let Some(input) = self.active_input_mut() {
                            input.insert_char(c);
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(false)
    }

    fn field_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let rows: [(usize, &str, String, Option<&'static str>, bool); FIELD_COUNT] = [
            (
                WEEK_ORDER,
                "Week *",
                selector_text(self.selected_week().map(|w| w.to_string()), "Select week"),
                Some(FIELD_WEEK),
                false,
            ),
            (
                WEEK_START_ORDER,
                "Week Start Date",
                self.week_start.value.clone(),
                Some(FIELD_WEEK_START),
                true,
            ),
            (
                FSD_ORDER,
                "FSD Presented",
                self.fsd_presented.value.clone(),
                Some(FIELD_FSD),
                true,
            ),
            (
                STATUS_ORDER,
                "Status *",
                selector_text(self.selected_status().map(|s| s.to_string()), "Select status"),
                Some(FIELD_STATUS),
                false,
            ),
            (
                DESIGN_START_ORDER,
                "Design Start Date",
                self.design_start.value.clone(),
                Some(FIELD_DESIGN_START),
                true,
            ),
            (
                DESIGN_END_ORDER,
                "Design End Date",
                self.design_end.value.clone(),
                Some(FIELD_DESIGN_END),
                true,
            ),
            (APL_ORDER, "APL Number(s)", self.apl.value.clone(), None, false),
            (
                FEATURE_ORDER,
                "Feature / Project Name *",
                self.feature_name.value.clone(),
                Some(FIELD_FEATURE),
                false,
            ),
            (PM_ORDER, "PM", self.pm.value.clone(), None, false),
            (DESIGNER_ORDER, "Designer", self.designer.value.clone(), None, false),
            (
                DESCRIPTION_ORDER,
                "Task Description",
                self.description.value.clone(),
                None,
                false,
            ),
            (DEMO_ORDER, "Demo Date", self.demo_date.value.clone(), Some(FIELD_DEMO), true),
        ];

        for (order, label, value, error_key, is_date) in rows {
            let active = order == self.current;
            let marker = if active { "▸ " } else { "  " };
            let shown = if value.is_empty() && is_date {
                "YYYY-MM-DD".to_string()
            } else {
                value
            };
            let style = if active {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("{marker}{label:<26} {shown}"),
                style,
            )));
            if let Some(key) = error_key {
                if let Some(message) = self.errors.get(key) {
                    lines.push(Line::from(Span::styled(
                        format!("    {message}"),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
        }
        lines
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        let header = Paragraph::new(Line::from(vec![
            Span::styled("FX DESIGN TRACKER", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                "Submit Task",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, chunks[0]);

        let form = Paragraph::new(self.field_lines())
            .block(Block::default().borders(Borders::ALL).title(" New task "));
        f.render_widget(form, centered(chunks[1], 76));

        let hint = if self.status_message.is_empty() {
            "Tab/↑↓: Field | ←/→: Choose | Ctrl+S: Submit | Esc: Quit".to_string()
        } else {
            self.status_message.clone()
        };
        let bar = Paragraph::new(hint)
            .style(Style::default().bg(Color::Rgb(30, 41, 59)).fg(Color::White));
        f.render_widget(bar, chunks[2]);
    }

    /// Main event loop for the form.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.drain_results();
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

fn step(current: usize, len: usize, right: bool) -> usize {
    if right {
        (current + 1) % len
    } else {
        current.checked_sub(1).unwrap_or(len - 1)
    }
}

fn selector_text(selected: Option<String>, placeholder: &str) -> String {
    match selected {
        Some(value) => format!("< {value} >"),
        None => format!("< {placeholder} >"),
    }
}

/// Center a column of the given width inside `area`.
fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y,
        width,
        height: area.height,
    }
}
