//! Surrogate loggers
//!
//! While the default backend is present but not yet configured, loggers
//! publish through a [`SurrogateLogger`]: console output with a threshold
//! that can be changed. Once the application reports the backend
//! configured, the redirect coordinator swaps every surrogate for the real
//! logger, carrying over any threshold set in the meantime, and retires
//! the surrogate. A retired surrogate accepts calls and discards them.

use crate::console::simple::publish_record;
use crate::console::Publisher;
use crate::core::{Configurable, Level, LogRecord, PlatformBridge, PlatformLevel, SystemLogger};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct SurrogateLogger {
    name: String,
    default_level: Level,
    level: RwLock<Option<PlatformLevel>>,
    publisher: Arc<dyn Publisher>,
    superseded: AtomicBool,
    retired: AtomicBool,
}

impl SurrogateLogger {
    pub fn new(name: impl Into<String>, default_level: Level, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            name: name.into(),
            default_level,
            level: RwLock::new(None),
            publisher,
            superseded: AtomicBool::new(false),
            retired: AtomicBool::new(false),
        }
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Mark the surrogate as replaced; it keeps publishing until retired
    pub(crate) fn supersede(&self) {
        self.superseded.store(true, Ordering::Release);
    }

    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    fn effective_threshold(&self) -> PlatformLevel {
        self.level
            .read()
            .unwrap_or_else(|| self.default_level.to_platform())
    }
}

impl SystemLogger for SurrogateLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_loggable(&self, level: Level) -> bool {
        !self.is_retired() && level.to_platform().passes(self.effective_threshold())
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

    fn is_superseded(&self) -> bool {
        self.superseded.load(Ordering::Acquire)
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }

    fn as_bridge(self: Arc<Self>) -> Option<Arc<dyn PlatformBridge>> {
        Some(self)
    }
}

impl PlatformBridge for SurrogateLogger {
    fn logger_name(&self) -> &str {
        &self.name
    }

    fn is_platform_loggable(&self, level: PlatformLevel) -> bool {
        !self.is_retired() && level.passes(self.effective_threshold())
    }

    fn is_enabled(&self) -> bool {
        !self.is_retired()
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

    fn platform_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }
}

impl Configurable for SurrogateLogger {
    fn platform_level(&self) -> Option<PlatformLevel> {
        *self.level.read()
    }

    fn set_platform_level(&self, level: Option<PlatformLevel>) {
        *self.level.write() = level;
    }
}
