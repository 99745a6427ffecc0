//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Status;

// Column header colors match the web dashboard's palette.

/// Used for "Yet to start"
pub const COLUMN_BLUE: Color = Color::Rgb(59, 130, 246);
/// Used for "Not started yet"
pub const COLUMN_RED: Color = Color::Rgb(239, 68, 68);
/// Used for "In progress"
pub const COLUMN_ORANGE: Color = Color::Rgb(249, 115, 22);
/// Used for "On hold"
pub const COLUMN_YELLOW: Color = Color::Rgb(234, 179, 8);
/// Used for "Completed"
pub const COLUMN_GREEN: Color = Color::Rgb(34, 197, 94);

/// Header color for a status column.
pub fn status_color(status: Status) -> Color {
    match status {
        Status::YetToStart => COLUMN_BLUE,
        Status::NotStartedYet => COLUMN_RED,
        Status::InProgress => COLUMN_ORANGE,
        Status::OnHold => COLUMN_YELLOW,
        Status::Completed => COLUMN_GREEN,
    }
}

/// Foreground that stays readable on a given column color.
pub fn text_on(status: Status) -> Color {
    match status {
        Status::OnHold => Color::Rgb(20, 20, 20),
        _ => Color::White,
    }
}
