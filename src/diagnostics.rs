//! Shared diagnostics helpers for consistent, colored output.

use colored::Colorize;

/// Print a warning with a colored prefix.
pub fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", "WARN".yellow().bold(), message.as_ref());
}

/// Print a progress note with a colored prefix.
pub fn note(message: impl AsRef<str>) {
    eprintln!("{} {}", "NOTE".cyan().bold(), message.as_ref());
}

/// Format an error message with a colored prefix.
pub fn error_message(message: impl AsRef<str>) -> String {
    format!("{} {}", "ERROR".red().bold(), message.as_ref())
}
