//! Simple console logger
//!
//! The plain fallback logger: a fixed threshold and a [`Publisher`]. It is
//! what loggers resolve to when no backend provider is installed, and what
//! the provider loader uses for its own warnings.

use super::publisher::{PublishedEntry, Publisher};
use crate::bootstrap::{LoggerFinder, UnitHandle};
use crate::core::{Level, LogRecord, PlatformBridge, PlatformLevel, SystemLogger};
use chrono::Utc;
use std::sync::Arc;

pub struct SimpleConsoleLogger {
    name: String,
    threshold: Level,
    publisher: Arc<dyn Publisher>,
}

impl SimpleConsoleLogger {
    pub fn new(name: impl Into<String>, threshold: Level, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            name: name.into(),
            threshold,
            publisher,
        }
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    pub fn publisher(&self) -> &Arc<dyn Publisher> {
        &self.publisher
    }
}

/// Publish one record on behalf of logger `name`
pub(crate) fn publish_record<L: Copy>(
    publisher: &dyn Publisher,
    name: &str,
    level: Level,
    level_name: &str,
    record: &LogRecord<L>,
) {
    let message = record.render();
    publisher.publish(&PublishedEntry {
        logger: name,
        level,
        level_name,
        caller: record.caller.as_ref(),
        message: &message,
        thrown: record.thrown.as_ref(),
        timestamp: record.timestamp.unwrap_or_else(Utc::now),
    });
}

impl SystemLogger for SimpleConsoleLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_loggable(&self, level: Level) -> bool {
        level.passes(self.threshold)
    }

    fn log_record(&self, record: LogRecord<Level>) {
        if !self.is_loggable(record.level) {
            return;
        }
        publish_record(
            self.publisher.as_ref(),
            &self.name,
            record.level,
            record.level.to_str(),
            &record,
        );
    }

    fn as_bridge(self: Arc<Self>) -> Option<Arc<dyn PlatformBridge>> {
        Some(self)
    }
}

impl PlatformBridge for SimpleConsoleLogger {
    fn logger_name(&self) -> &str {
        &self.name
    }

    fn is_platform_loggable(&self, level: PlatformLevel) -> bool {
        level.passes(self.threshold.to_platform())
    }

    fn log_platform(&self, record: LogRecord<PlatformLevel>) {
        if !self.is_platform_loggable(record.level) {
            return;
        }
        publish_record(
            self.publisher.as_ref(),
            &self.name,
            record.level.to_system(),
            record.level.to_str(),
            &record,
        );
    }
}

/// Finder handing out [`SimpleConsoleLogger`]s, used when no provider is
/// installed or loading one failed
pub struct ConsoleFinder {
    threshold: Level,
    publisher: Arc<dyn Publisher>,
}

impl ConsoleFinder {
    pub fn new(threshold: Level, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            threshold,
            publisher,
        }
    }
}

impl LoggerFinder for ConsoleFinder {
    fn get_logger(&self, name: &str, _unit: &UnitHandle) -> Arc<dyn SystemLogger> {
        Arc::new(SimpleConsoleLogger::new(
            name,
            self.threshold,
            Arc::clone(&self.publisher),
        ))
    }
}
