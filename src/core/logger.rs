//! Logger call surfaces
//!
//! [`SystemLogger`] is the surface applications log through.
//! [`PlatformBridge`] is the surface platform code logs through; it uses
//! [`PlatformLevel`] and carries caller-qualified calls. Every logger can
//! be viewed as a bridge: loggers that implement it natively return
//! themselves from [`SystemLogger::as_bridge`], the others are wrapped in a
//! [`LevelMappingBridge`].
//!
//! The required trait methods are kept small and object safe; the full
//! call surface lives in the [`SystemLoggerExt`] and [`PlatformBridgeExt`]
//! extension traits, implemented for every logger.

use super::level::{Level, PlatformLevel};
use super::record::{CallerInfo, LogRecord, Message, Param, ResourceBundle, Thrown};
use std::sync::Arc;

pub trait SystemLogger: Send + Sync {
    fn name(&self) -> &str;

    fn is_loggable(&self, level: Level) -> bool;

    fn log_record(&self, record: LogRecord<Level>);

    /// Threshold control, when the logger supports it
    fn as_configurable(&self) -> Option<&dyn Configurable> {
        None
    }

    /// Native platform view, when the logger implements [`PlatformBridge`]
    fn as_bridge(self: Arc<Self>) -> Option<Arc<dyn PlatformBridge>> {
        None
    }

    /// True once this logger has been replaced; accessors never install
    /// a superseded logger
    fn is_superseded(&self) -> bool {
        false
    }
}

pub trait PlatformBridge: Send + Sync {
    fn logger_name(&self) -> &str;

    fn is_platform_loggable(&self, level: PlatformLevel) -> bool;

    fn is_enabled(&self) -> bool {
        true
    }

    fn log_platform(&self, record: LogRecord<PlatformLevel>);

    fn platform_configurable(&self) -> Option<&dyn Configurable> {
        None
    }
}

/// Get/set access to a logger's severity threshold
///
/// `None` means the logger falls back to its default threshold.
pub trait Configurable: Send + Sync {
    fn platform_level(&self) -> Option<PlatformLevel>;

    fn set_platform_level(&self, level: Option<PlatformLevel>);
}

/// Full logging call surface for [`SystemLogger`]
pub trait SystemLoggerExt: SystemLogger {
    fn log(&self, level: Level, msg: impl Into<String>) {
        self.log_record(LogRecord::new(level, Message::Text(msg.into())));
    }

    fn log_lazy<F>(&self, level: Level, supplier: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.log_record(LogRecord::new(level, Message::lazy(supplier)));
    }

    fn log_thrown(&self, level: Level, msg: impl Into<String>, thrown: Thrown) {
        self.log_record(LogRecord::new(level, Message::Text(msg.into())).with_thrown(thrown));
    }

    fn log_lazy_thrown<F>(&self, level: Level, supplier: F, thrown: Thrown)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.log_record(LogRecord::new(level, Message::lazy(supplier)).with_thrown(thrown));
    }

    fn log_format(&self, level: Level, format: impl Into<String>, params: Vec<Param>) {
        self.log_record(LogRecord::new(level, Message::Text(format.into())).with_params(params));
    }

    fn log_bundle(
        &self,
        level: Level,
        bundle: Arc<dyn ResourceBundle>,
        key: impl Into<String>,
        params: Vec<Param>,
    ) {
        self.log_record(
            LogRecord::new(level, Message::Text(key.into()))
                .with_bundle(bundle)
                .with_params(params),
        );
    }

    fn log_bundle_thrown(
        &self,
        level: Level,
        bundle: Arc<dyn ResourceBundle>,
        key: impl Into<String>,
        thrown: Thrown,
    ) {
        self.log_record(
            LogRecord::new(level, Message::Text(key.into()))
                .with_bundle(bundle)
                .with_thrown(thrown),
        );
    }
}

impl<T: SystemLogger + ?Sized> SystemLoggerExt for T {}

/// Full logging call surface for [`PlatformBridge`]
pub trait PlatformBridgeExt: PlatformBridge {
    fn plog(&self, level: PlatformLevel, msg: impl Into<String>) {
        self.log_platform(LogRecord::new(level, Message::Text(msg.into())));
    }

    fn plog_lazy<F>(&self, level: PlatformLevel, supplier: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.log_platform(LogRecord::new(level, Message::lazy(supplier)));
    }

    fn plog_thrown(&self, level: PlatformLevel, msg: impl Into<String>, thrown: Thrown) {
        self.log_platform(LogRecord::new(level, Message::Text(msg.into())).with_thrown(thrown));
    }

    fn plog_format(&self, level: PlatformLevel, format: impl Into<String>, params: Vec<Param>) {
        self.log_platform(LogRecord::new(level, Message::Text(format.into())).with_params(params));
    }

    /// Log with an explicit source class and method
    fn logp(
        &self,
        level: PlatformLevel,
        source_class: impl Into<String>,
        source_method: impl Into<String>,
        msg: impl Into<String>,
    ) {
        self.log_platform(
            LogRecord::new(level, Message::Text(msg.into()))
                .with_caller(CallerInfo::new(source_class, source_method)),
        );
    }

    fn logp_lazy<F>(
        &self,
        level: PlatformLevel,
        source_class: impl Into<String>,
        source_method: impl Into<String>,
        supplier: F,
    ) where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.log_platform(
            LogRecord::new(level, Message::lazy(supplier))
                .with_caller(CallerInfo::new(source_class, source_method)),
        );
    }

    fn logp_thrown(
        &self,
        level: PlatformLevel,
        source_class: impl Into<String>,
        source_method: impl Into<String>,
        msg: impl Into<String>,
        thrown: Thrown,
    ) {
        self.log_platform(
            LogRecord::new(level, Message::Text(msg.into()))
                .with_caller(CallerInfo::new(source_class, source_method))
                .with_thrown(thrown),
        );
    }

    fn logp_format(
        &self,
        level: PlatformLevel,
        source_class: impl Into<String>,
        source_method: impl Into<String>,
        format: impl Into<String>,
        params: Vec<Param>,
    ) {
        self.log_platform(
            LogRecord::new(level, Message::Text(format.into()))
                .with_caller(CallerInfo::new(source_class, source_method))
                .with_params(params),
        );
    }

    /// Caller-qualified call localized through a resource bundle
    fn logrb(
        &self,
        level: PlatformLevel,
        source_class: impl Into<String>,
        source_method: impl Into<String>,
        bundle: Arc<dyn ResourceBundle>,
        key: impl Into<String>,
        params: Vec<Param>,
    ) {
        self.log_platform(
            LogRecord::new(level, Message::Text(key.into()))
                .with_caller(CallerInfo::new(source_class, source_method))
                .with_bundle(bundle)
                .with_params(params),
        );
    }
}

impl<T: PlatformBridge + ?Sized> PlatformBridgeExt for T {}

/// Platform view of a logger that has no native bridge
pub struct LevelMappingBridge {
    inner: Arc<dyn SystemLogger>,
}

impl LevelMappingBridge {
    pub fn new(inner: Arc<dyn SystemLogger>) -> Self {
        Self { inner }
    }
}

impl PlatformBridge for LevelMappingBridge {
    fn logger_name(&self) -> &str {
        self.inner.name()
    }

    fn is_platform_loggable(&self, level: PlatformLevel) -> bool {
        self.inner.is_loggable(level.to_system())
    }

    fn log_platform(&self, record: LogRecord<PlatformLevel>) {
        self.inner.log_record(record.map_level(|l| l.to_system()));
    }

    fn platform_configurable(&self) -> Option<&dyn Configurable> {
        self.inner.as_configurable()
    }
}

/// Platform view of `logger`: its native bridge, or a level-mapping adapter
pub fn platform_view_of(logger: &Arc<dyn SystemLogger>) -> Arc<dyn PlatformBridge> {
    match Arc::clone(logger).as_bridge() {
        Some(bridge) => bridge,
        None => Arc::new(LevelMappingBridge::new(Arc::clone(logger))),
    }
}
