//! Console publishing
//!
//! The fallback loggers never write output themselves; they hand a
//! [`PublishedEntry`] to a [`Publisher`].

use super::format::{render_line, DEFAULT_FORMAT};
use crate::core::{CallerInfo, Level, Thrown};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// One line of console output, before formatting
#[derive(Clone, Copy)]
pub struct PublishedEntry<'a> {
    pub logger: &'a str,
    pub level: Level,
    /// Name of the level as issued, which may be a platform level
    pub level_name: &'a str,
    pub caller: Option<&'a CallerInfo>,
    pub message: &'a str,
    pub thrown: Option<&'a Thrown>,
    pub timestamp: DateTime<Utc>,
}

pub trait Publisher: Send + Sync {
    fn publish(&self, entry: &PublishedEntry<'_>);
}

/// Publisher writing formatted lines to stderr
pub struct ConsolePublisher {
    use_colors: bool,
    format: String,
    skip_prefixes: Vec<String>,
}

impl ConsolePublisher {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
            format: DEFAULT_FORMAT.to_string(),
            skip_prefixes: Vec::new(),
        }
    }

    /// Set the format template
    ///
    /// # Example
    ///
    /// ```
    /// use rust_bootstrap_logger::console::ConsolePublisher;
    ///
    /// let publisher = ConsolePublisher::new()
    ///     .with_format("{timestamp} {level} {logger} - {message}");
    /// ```
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors && cfg!(feature = "console");
        self
    }

    #[must_use]
    pub fn with_skip_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.skip_prefixes = prefixes;
        self
    }

    pub fn format_entry(&self, entry: &PublishedEntry<'_>) -> String {
        render_line(&self.format, entry, &self.skip_prefixes)
    }

    #[cfg(feature = "console")]
    fn colorize(&self, line: String, level: Level) -> String {
        use colored::Colorize;
        if self.use_colors {
            line.color(level.color_code()).to_string()
        } else {
            line
        }
    }

    #[cfg(not(feature = "console"))]
    fn colorize(&self, line: String, _level: Level) -> String {
        line
    }
}

impl Default for ConsolePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for ConsolePublisher {
    fn publish(&self, entry: &PublishedEntry<'_>) {
        let line = self.colorize(self.format_entry(entry), entry.level);
        eprintln!("{}", line);
    }
}

/// Publisher keeping formatted lines in memory
///
/// Useful for tests and for capturing startup output to show later.
pub struct BufferPublisher {
    format: String,
    lines: Mutex<Vec<String>>,
}

impl BufferPublisher {
    pub fn new() -> Self {
        Self::with_format("{level} {logger}: {message}")
    }

    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl Default for BufferPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for BufferPublisher {
    fn publish(&self, entry: &PublishedEntry<'_>) {
        let line = render_line(&self.format, entry, &[]);
        self.lines.lock().push(line);
    }
}
