//! Terminal setup and teardown for the TUI entry points.

use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::tui::app::BoardApp;
use crate::tui::form::SubmitApp;

/// Initialise and run the dashboard board interface.
pub fn run_board_tui(app: &mut BoardApp) -> io::Result<()> {
    with_terminal(|terminal| app.run(terminal))
}

/// Initialise and run the submission form interface.
pub fn run_submit_tui(app: &mut SubmitApp) -> io::Result<()> {
    with_terminal(|terminal| app.run(terminal))
}

/// Enter the alternate screen, run the app, and restore the terminal even
/// when the app errors.
fn with_terminal<T>(
    f: impl FnOnce(&mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<T>,
) -> io::Result<T> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = f(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
