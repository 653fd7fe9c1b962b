//! Terminal styling helpers
//! `colored` honours NO_COLOR and non-tty output on its own

use colored::Colorize;

/// Styling used by the report and summary printers
pub struct Theme;

impl Theme {
    pub fn header(text: &str) -> String {
        text.bold().to_string()
    }

    pub fn section(text: &str) -> String {
        text.cyan().bold().to_string()
    }

    pub fn category(text: &str) -> String {
        text.to_string()
    }

    pub fn size(text: &str) -> String {
        text.yellow().to_string()
    }

    pub fn value(text: &str) -> String {
        text.bold().to_string()
    }

    pub fn muted(text: &str) -> String {
        text.dimmed().to_string()
    }

    pub fn success(text: &str) -> String {
        text.green().to_string()
    }

    pub fn warning(text: &str) -> String {
        text.yellow().bold().to_string()
    }

    pub fn error(text: &str) -> String {
        text.red().bold().to_string()
    }

    /// Marker for an item that is selected by default
    pub fn selected(selected: bool) -> String {
        if selected {
            "[x]".green().to_string()
        } else {
            "[ ]".dimmed().to_string()
        }
    }

    /// Plain divider line
    pub fn divider(width: usize) -> String {
        "-".repeat(width)
    }

    /// Plain double divider
    pub fn divider_bold(width: usize) -> String {
        "=".repeat(width)
    }
}
