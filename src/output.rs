//! Console output helpers
//!
//! Progress lines and status tags. Everything here writes to stdout except
//! [`error`], which goes to stderr.

use colored::{ColoredString, Colorize};

/// Print a section header
pub fn section(title: &str) {
    println!("\n{}", format!(">>> [{title}]").cyan().bold());
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), msg);
}

/// Green `PASS` or red `FAIL`
pub fn verdict(passed: bool) -> ColoredString {
    if passed {
        "PASS".green()
    } else {
        "FAIL".red()
    }
}

pub fn timeout_tag() -> ColoredString {
    "TIMEOUT".red()
}

pub fn error_tag(cause: &str) -> ColoredString {
    format!("ERROR: {cause}").red()
}

/// Globally enable or disable ANSI styling
pub fn set_color(enabled: bool) {
    if enabled {
        colored::control::unset_override();
    } else {
        let _color = color_lock();
        colored::control::set_override(false);
    }
}

/// Serializes tests that flip the process-wide color override
pub(crate) fn color_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_text() {
        let _color = color_lock();
        colored::control::set_override(false);
        assert_eq!(verdict(true).to_string(), "PASS");
        assert_eq!(verdict(false).to_string(), "FAIL");
    }

    #[test]
    fn test_error_tag_includes_cause() {
        let _color = color_lock();
        colored::control::set_override(false);
        assert_eq!(error_tag("No such file").to_string(), "ERROR: No such file");
        assert_eq!(timeout_tag().to_string(), "TIMEOUT");
    }
}
