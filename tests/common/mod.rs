//! Recording backend shared by the integration suites

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rust_bootstrap_logger::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub logger: String,
    pub level: Level,
    pub message: String,
    pub caller: Option<CallerInfo>,
    pub timestamp: Option<DateTime<Utc>>,
    pub thread: Option<String>,
}

/// Finder whose loggers record everything they are given
#[derive(Default)]
pub struct RecordingFinder {
    pub entries: Arc<Mutex<Vec<Recorded>>>,
    pub created: Arc<AtomicUsize>,
}

impl RecordingFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }
}

impl LoggerFinder for RecordingFinder {
    fn get_logger(&self, name: &str, _unit: &UnitHandle) -> Arc<dyn SystemLogger> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(RecordingLogger {
            name: name.to_string(),
            entries: Arc::clone(&self.entries),
            level: RwLock::new(None),
        })
    }
}

pub struct RecordingLogger {
    name: String,
    entries: Arc<Mutex<Vec<Recorded>>>,
    level: RwLock<Option<PlatformLevel>>,
}

impl SystemLogger for RecordingLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_loggable(&self, level: Level) -> bool {
        match *self.level.read() {
            Some(threshold) => level.to_platform().passes(threshold),
            None => level.passes(Level::Trace),
        }
    }

    fn log_record(&self, record: LogRecord<Level>) {
        if !self.is_loggable(record.level) {
            return;
        }
        self.entries.lock().push(Recorded {
            logger: self.name.clone(),
            level: record.level,
            message: record.render(),
            caller: record.caller.clone(),
            timestamp: record.timestamp,
            thread: std::thread::current().name().map(String::from),
        });
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }
}

impl Configurable for RecordingLogger {
    fn platform_level(&self) -> Option<PlatformLevel> {
        *self.level.read()
    }

    fn set_platform_level(&self, level: Option<PlatformLevel>) {
        *self.level.write() = level;
    }
}

/// Registry with `finder` as the default provider, sharing its records
pub fn default_provider(finder: &RecordingFinder) -> Arc<ProviderRegistry> {
    let registry = Arc::new(ProviderRegistry::new());
    let entries = Arc::clone(&finder.entries);
    let created = Arc::clone(&finder.created);
    registry.set_default("recording", move || {
        Ok(RecordingFinder {
            entries: Arc::clone(&entries),
            created: Arc::clone(&created),
        })
    });
    registry
}

/// Configuration marking the default backend as configured
pub fn configured() -> BootstrapConfig {
    BootstrapConfig {
        backend_config: Some("logging.json".to_string()),
        ..BootstrapConfig::default()
    }
}
