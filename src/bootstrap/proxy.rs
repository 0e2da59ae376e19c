//! Bootstrap proxies
//!
//! Before startup is complete an accessor's current logger is a
//! [`BootstrapProxy`]. Every call first checks readiness:
//!
//! - not ready: the call is captured as a [`LogEvent`] and queued, then
//!   readiness is checked again, since it may have flipped between the
//!   check and the enqueue;
//! - ready: the deferred queue is drained and replayed (waiting for the
//!   replay), then the proxy asks its accessor for the concrete logger and
//!   forwards the call there.
//!
//! Waiting for the replay keeps the triggering call after every event
//! deferred before it.

use super::accessor::LoggerAccessor;
use super::event::{EventPayload, LogEvent, ReplayTarget};
use super::logic::BootstrapLogic;
use crate::core::{
    BootstrapError, Level, LogRecord, PlatformBridge, PlatformLevel, Result, SystemLogger,
};
use std::sync::{Arc, Weak};

/// Threshold answered by `is_loggable` while startup is in progress
pub const BOOTSTRAP_THRESHOLD: Level = Level::Info;

pub struct BootstrapProxy {
    name: String,
    accessor: Weak<LoggerAccessor>,
    logic: Arc<BootstrapLogic>,
    this: Weak<BootstrapProxy>,
}

impl BootstrapProxy {
    pub(crate) fn new(accessor: &Arc<LoggerAccessor>, logic: Arc<BootstrapLogic>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            name: accessor.name().to_string(),
            accessor: Arc::downgrade(accessor),
            logic,
            this: this.clone(),
        })
    }

    /// Returns true while calls must be deferred; once ready, replays
    /// whatever is queued before returning false
    fn still_bootstrapping(&self) -> bool {
        if self.logic.readiness.uses_deferred_queueing() {
            return true;
        }
        // Replay failures are reported where they happen
        let _ = self.logic.flush();
        false
    }

    fn push(&self, payload: EventPayload) {
        if let Some(this) = self.this.upgrade() {
            let event = Arc::new(LogEvent::new(this, payload));
            if self.logic.queue.enqueue(event) {
                self.logic.metrics.record_deferred();
            }
        }
        self.still_bootstrapping();
    }

    fn accessor(&self) -> Result<Arc<LoggerAccessor>> {
        self.accessor.upgrade().ok_or_else(|| {
            BootstrapError::other(format!("logger '{}' is no longer registered", self.name))
        })
    }

    fn concrete(&self) -> Result<Arc<dyn SystemLogger>> {
        self.accessor()?.get_concrete_logger(self)
    }

    fn concrete_platform(&self) -> Result<Arc<dyn PlatformBridge>> {
        self.accessor()?.get_concrete_platform(self)
    }
}

impl SystemLogger for BootstrapProxy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_loggable(&self, level: Level) -> bool {
        if self.still_bootstrapping() {
            return level.passes(BOOTSTRAP_THRESHOLD);
        }
        match self.concrete() {
            Ok(logger) => logger.is_loggable(level),
            Err(e) => super::fatal(e),
        }
    }

    fn log_record(&self, record: LogRecord<Level>) {
        if self.still_bootstrapping() {
            self.push(EventPayload::System(record));
            return;
        }
        match self.concrete() {
            Ok(logger) => logger.log_record(record),
            Err(e) => super::fatal(e),
        }
    }

    fn as_bridge(self: Arc<Self>) -> Option<Arc<dyn PlatformBridge>> {
        Some(self)
    }
}

impl PlatformBridge for BootstrapProxy {
    fn logger_name(&self) -> &str {
        &self.name
    }

    fn is_platform_loggable(&self, level: PlatformLevel) -> bool {
        if self.still_bootstrapping() {
            return level.passes(BOOTSTRAP_THRESHOLD.to_platform());
        }
        match self.concrete_platform() {
            Ok(bridge) => bridge.is_platform_loggable(level),
            Err(e) => super::fatal(e),
        }
    }

    fn is_enabled(&self) -> bool {
        if self.still_bootstrapping() {
            return true;
        }
        match self.concrete_platform() {
            Ok(bridge) => bridge.is_enabled(),
            Err(e) => super::fatal(e),
        }
    }

    fn log_platform(&self, record: LogRecord<PlatformLevel>) {
        if self.still_bootstrapping() {
            self.push(EventPayload::Platform(record));
            return;
        }
        match self.concrete_platform() {
            Ok(bridge) => bridge.log_platform(record),
            Err(e) => super::fatal(e),
        }
    }
}

impl ReplayTarget for BootstrapProxy {
    fn target_name(&self) -> &str {
        &self.name
    }

    fn replay(&self, payload: EventPayload) -> Result<()> {
        match payload {
            EventPayload::System(record) => self.concrete()?.log_record(record),
            EventPayload::Platform(record) => self.concrete_platform()?.log_platform(record),
        }
        Ok(())
    }
}
