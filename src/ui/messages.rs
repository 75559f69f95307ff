//! Terminal notifications. Colours are dropped when `NO_COLOR` is set.

use std::env;
use std::fmt;

/// ANSI colors
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

const FG_BLUE: &str = "\x1b[34m";
const FG_GREEN: &str = "\x1b[32m";
const FG_YELLOW: &str = "\x1b[33m";
const FG_RED: &str = "\x1b[31m";

/// Icons
const ICON_INFO: &str = "ℹ️";
const ICON_OK: &str = "✅";
const ICON_WARN: &str = "⚠️";
const ICON_ERR: &str = "❌";

fn colors_enabled() -> bool {
    env::var_os("NO_COLOR").is_none_or(|v| v.is_empty())
}

fn format_line(color: &str, icon: &str, msg: &dyn fmt::Display, colored: bool) -> String {
    if colored {
        format!("{color}{BOLD}{icon}{RESET} {msg}")
    } else {
        format!("{icon} {msg}")
    }
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", format_line(FG_BLUE, ICON_INFO, &msg, colors_enabled()));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", format_line(FG_GREEN, ICON_OK, &msg, colors_enabled()));
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", format_line(FG_YELLOW, ICON_WARN, &msg, colors_enabled()));
}

/// The only channel that writes to stderr.
pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", format_line(FG_RED, ICON_ERR, &msg, colors_enabled()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_has_no_escape_codes() {
        let line = format_line(FG_RED, ICON_ERR, &"boom", false);
        assert_eq!(line, "❌ boom");
    }

    #[test]
    fn colored_line_resets_after_icon() {
        let line = format_line(FG_GREEN, ICON_OK, &"done", true);
        assert!(line.starts_with(FG_GREEN));
        assert!(line.ends_with(&format!("{RESET} done")));
    }
}
