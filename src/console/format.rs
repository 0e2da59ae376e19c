//! Console line formatting
//!
//! A format template is plain text with `{name}` placeholders:
//!
//! | placeholder   | value                                              |
//! |---------------|----------------------------------------------------|
//! | `{timestamp}` | capture time, ISO 8601 with milliseconds           |
//! | `{source}`    | caller class and method, or the logger name        |
//! | `{logger}`    | logger name                                        |
//! | `{level}`     | level name                                         |
//! | `{message}`   | rendered message                                   |
//! | `{thrown}`    | attached error and its causes, on following lines  |
//!
//! Unknown placeholders are copied through unchanged.

use super::publisher::PublishedEntry;

/// Built-in template used when none is configured
pub const DEFAULT_FORMAT: &str = "[{timestamp}] {level} {source}: {message}{thrown}";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Render `entry` with `template`
///
/// Caller frames matching one of `skip_prefixes` are treated as internal
/// and `{source}` falls back to the logger name.
pub fn render_line(template: &str, entry: &PublishedEntry<'_>, skip_prefixes: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + entry.message.len() + 32);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        match name {
            "timestamp" => out.push_str(&entry.timestamp.format(TIMESTAMP_FORMAT).to_string()),
            "source" => out.push_str(&source_of(entry, skip_prefixes)),
            "logger" => out.push_str(entry.logger),
            "level" => out.push_str(entry.level_name),
            "message" => out.push_str(entry.message),
            "thrown" => out.push_str(&thrown_of(entry)),
            _ => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

fn source_of(entry: &PublishedEntry<'_>, skip_prefixes: &[String]) -> String {
    match entry.caller {
        Some(caller) if !caller.is_skipped(skip_prefixes) => caller.to_string(),
        _ => entry.logger.to_string(),
    }
}

fn thrown_of(entry: &PublishedEntry<'_>) -> String {
    let Some(thrown) = entry.thrown else {
        return String::new();
    };

    let mut out = format!("\n{}", thrown);
    let mut cause = thrown.source();
    while let Some(err) = cause {
        out.push_str(&format!("\nCaused by: {}", err));
        cause = err.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallerInfo, Level, Thrown};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn entry<'a>(caller: Option<&'a CallerInfo>, thrown: Option<&'a Thrown>) -> PublishedEntry<'a> {
        PublishedEntry {
            logger: "early.boot",
            level: Level::Warning,
            level_name: "WARNING",
            caller,
            message: "disk almost full",
            thrown,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap(),
        }
    }

    #[test]
    fn test_default_format() {
        let line = render_line(DEFAULT_FORMAT, &entry(None, None), &[]);
        assert_eq!(
            line,
            "[2025-01-08T10:30:45.000Z] WARNING early.boot: disk almost full"
        );
    }

    #[test]
    fn test_source_uses_caller_unless_skipped() {
        let caller = CallerInfo::new("app::disk", "check");
        let line = render_line("{source}", &entry(Some(&caller), None), &[]);
        assert_eq!(line, "app::disk check");

        let line = render_line("{source}", &entry(Some(&caller), None), &["app::".to_string()]);
        assert_eq!(line, "early.boot");
    }

    #[test]
    fn test_thrown_lists_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "device busy");
        let thrown: Thrown = Arc::new(io);
        let line = render_line("{message}{thrown}", &entry(None, Some(&thrown)), &[]);
        assert_eq!(line, "disk almost full\ndevice busy");
    }

    #[test]
    fn test_unknown_and_unclosed_placeholders() {
        let line = render_line("{level} {pid} {oops", &entry(None, None), &[]);
        assert_eq!(line, "WARNING {pid} {oops");
    }
}
