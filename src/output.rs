//! Status lines for the rcdgen CLI.
//!
//! Every line goes to stderr as a right-aligned verb followed by a message,
//! the way Cargo reports progress. stdout stays free for `inspect --json`.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use crate::validation::Severity;

const VERB_WIDTH: usize = 12;

/// Colour of a verb or label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Progress,
    Done,
    Detail,
    Info,
    Warning,
    Error,
}

impl Tone {
    fn ansi(self) -> &'static str {
        match self {
            Tone::Progress | Tone::Done => "\x1b[1;32m",
            Tone::Detail => "\x1b[2m",
            Tone::Info => "\x1b[1;36m",
            Tone::Warning => "\x1b[1;33m",
            Tone::Error => "\x1b[1;31m",
        }
    }
}

impl From<Severity> for Tone {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => Tone::Warning,
            Severity::Error => Tone::Error,
        }
    }
}

/// Writes status lines, coloured when stderr is a terminal.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    color: bool,
    verbose: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
            verbose: false,
        }
    }

    /// A printer that never colours, whatever stderr is.
    pub fn plain() -> Self {
        Self {
            color: false,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// `   Compiling shops.rcd.yaml`
    pub fn status(&self, verb: &str, message: &str) {
        self.line(Tone::Progress, verb, message);
    }

    /// `    Finished 3 RCD files in dist`
    pub fn success(&self, verb: &str, message: &str) {
        self.line(Tone::Done, verb, message);
    }

    /// Dim detail, dropped unless verbose.
    pub fn verbose(&self, verb: &str, message: &str) {
        if self.verbose {
            self.line(Tone::Detail, verb, message);
        }
    }

    pub fn info(&self, verb: &str, message: &str) {
        self.line(Tone::Info, verb, message);
    }

    pub fn warning(&self, verb: &str, message: &str) {
        self.line(Tone::Warning, verb, message);
    }

    pub fn error(&self, verb: &str, message: &str) {
        self.line(Tone::Error, verb, message);
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(Tone::Detail, text)
    }

    /// A diagnostic label such as `warning` or `error`.
    pub fn severity(&self, severity: Severity) -> String {
        self.paint(severity.into(), &severity.to_string())
    }

    /// Wrap `text` in the tone's colour, if colouring.
    pub fn paint(&self, tone: Tone, text: &str) -> String {
        if self.color {
            format!("{}{}\x1b[0m", tone.ansi(), text)
        } else {
            text.to_string()
        }
    }

    fn format_line(&self, tone: Tone, verb: &str, message: &str) -> String {
        let verb = format!("{verb:>VERB_WIDTH$}");
        format!("{} {}", self.paint(tone, &verb), message)
    }

    fn line(&self, tone: Tone, verb: &str, message: &str) {
        let _ = writeln!(io::stderr().lock(), "{}", self.format_line(tone, verb, message));
    }
}

/// `plural(1, "block", "blocks")` is "1 block".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    format!("{} {}", n, if n == 1 { singular } else { pluralized })
}

/// The path relative to the working directory when it lies below it.
pub fn display_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf));
    match relative {
        Some(p) if p.as_os_str().is_empty() => ".".to_string(),
        Some(p) => p.display().to_string(),
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "block", "blocks"), "1 block");
        assert_eq!(plural(0, "block", "blocks"), "0 blocks");
        assert_eq!(plural(5, "sprite", "sprites"), "5 sprites");
    }

    #[test]
    fn test_verbose_flag() {
        let printer = Printer::plain();
        assert!(!printer.is_verbose());
        assert!(printer.with_verbose(true).is_verbose());
    }

    #[test]
    fn test_plain_lines_are_aligned() {
        let printer = Printer::plain();
        assert_eq!(
            printer.format_line(Tone::Progress, "Compiling", "shops.rcd.yaml"),
            "   Compiling shops.rcd.yaml"
        );
        assert_eq!(
            printer.format_line(Tone::Done, "Finished", "2 RCD files"),
            "    Finished 2 RCD files"
        );
        assert_eq!(printer.severity(Severity::Warning), "warning");
    }

    #[test]
    fn test_paint_wraps_in_colour() {
        let printer = Printer {
            color: true,
            verbose: false,
        };
        assert_eq!(printer.paint(Tone::Error, "error"), "\x1b[1;31merror\x1b[0m");
    }

    #[test]
    fn test_display_path_outside_cwd() {
        let p = Path::new("/nonexistent/path/to/file");
        assert_eq!(display_path(p), "/nonexistent/path/to/file");
    }
}
