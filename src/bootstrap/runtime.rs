//! Bootstrap facade
//!
//! [`Bootstrap`] owns the shared state and the name-keyed accessor
//! registry. Applications ask it for loggers at any time, including before
//! any backend can be loaded, and report the two lifecycle milestones:
//! startup complete ([`Bootstrap::mark_ready`]) and backend configured
//! ([`Bootstrap::backend_configured`]).

use super::accessor::{LoggerAccessor, LoggerFactory, LoggerResolver};
use super::classifier::BackendKind;
use super::finder::{FinderLoader, ProviderRegistry, ProviderSource};
use super::logic::BootstrapLogic;
use super::redirect::RedirectReport;
use super::unit::UnitHandle;
use crate::console::{ConsolePublisher, Publisher};
use crate::core::{
    BootstrapConfig, BootstrapError, BootstrapMetrics, Level, LogRecord, PlatformBridge,
    PlatformLevel, Result, SystemLogger,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

static GLOBAL: OnceLock<Bootstrap> = OnceLock::new();

pub struct Bootstrap {
    logic: Arc<BootstrapLogic>,
    loggers: RwLock<HashMap<String, Arc<LazyLogger>>>,
}

impl Bootstrap {
    pub fn builder() -> BootstrapBuilder {
        BootstrapBuilder::new()
    }

    /// Bootstrap over `source` with the console publisher
    pub fn new(config: BootstrapConfig, source: Arc<dyn ProviderSource>) -> Self {
        Self::builder().config(config).providers(source).build()
    }

    /// The process-wide instance, created with defaults and no providers
    /// if none was installed
    pub fn global() -> &'static Bootstrap {
        GLOBAL.get_or_init(|| Bootstrap::builder().build())
    }

    /// Install `bootstrap` as the process-wide instance
    pub fn install_global(bootstrap: Bootstrap) -> Result<&'static Bootstrap> {
        GLOBAL
            .set(bootstrap)
            .map_err(|_| BootstrapError::other("a global bootstrap is already installed"))?;
        Ok(Self::global())
    }

    /// The logger named `name`, owned by `unit`
    ///
    /// Loggers are registered by name; asking again returns the same
    /// handle whatever the unit.
    pub fn get_logger(&self, name: &str, unit: &UnitHandle) -> Arc<LazyLogger> {
        if let Some(logger) = self.loggers.read().get(name) {
            return Arc::clone(logger);
        }

        let mut loggers = self.loggers.write();
        let logger = loggers.entry(name.to_string()).or_insert_with(|| {
            let resolver: Arc<dyn LoggerResolver> = self.logic.clone();
            let accessor = LoggerAccessor::new(
                name,
                unit.clone(),
                finder_factory(Arc::clone(&self.logic.loader)),
                resolver,
            );
            Arc::new(LazyLogger { accessor })
        });
        Arc::clone(logger)
    }

    /// Platform view of the logger named `name`
    pub fn get_platform_logger(&self, name: &str, unit: &UnitHandle) -> Arc<dyn PlatformBridge> {
        self.get_logger(name, unit)
    }

    /// Names of every registered logger
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Report startup complete; returns true for the call that flipped it
    ///
    /// Deferred events are not replayed here; the next logging call does
    /// it, or [`flush`](Self::flush).
    pub fn mark_ready(&self) -> bool {
        self.logic.readiness.mark_ready()
    }

    pub fn is_ready(&self) -> bool {
        self.logic.is_ready()
    }

    /// Report the backend configured, redirecting every surrogate
    ///
    /// One-shot: a second call fails with
    /// [`BootstrapError::AlreadyRedirected`].
    pub fn backend_configured(&self) -> Result<RedirectReport> {
        let kind = self.logic.classifier.kind();
        self.logic.coordinator.redrain_and_close(kind)
    }

    /// Replay everything deferred so far and wait for it
    ///
    /// Does nothing before startup is complete.
    pub fn flush(&self) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        self.logic.flush()
    }

    /// Wait until the replay worker has run everything submitted so far
    pub fn await_idle(&self) -> Result<()> {
        self.logic.dispatcher.await_idle()
    }

    pub fn kind(&self) -> BackendKind {
        self.logic.classifier.kind()
    }

    /// Returns true while loggers are served by redirectable surrogates
    pub fn uses_surrogate(&self) -> bool {
        self.logic.uses_surrogate()
    }

    /// Number of events waiting for replay
    pub fn deferred_len(&self) -> usize {
        self.logic.queue.len()
    }

    pub fn metrics(&self) -> &BootstrapMetrics {
        &self.logic.metrics
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.logic.config
    }

    /// Restore the startup state
    ///
    /// Clears readiness, the backend classification, the redirect, the
    /// loaded finder, the registry and the metrics. Queued events are
    /// discarded.
    #[doc(hidden)]
    pub fn reset_for_testing(&self) {
        self.loggers.write().clear();
        drop(self.logic.queue.drain_all());
        self.logic.readiness.reset_for_testing();
        self.logic.classifier.reset_for_testing();
        self.logic.coordinator.reset_for_testing();
        self.logic.loader.reset_for_testing();
        self.logic.metrics.reset();
    }
}

impl Drop for Bootstrap {
    fn drop(&mut self) {
        // Queued events hold their proxies, which hold the shared state
        if self.is_ready() {
            if let Err(e) = self.logic.flush() {
                eprintln!("[BOOTSTRAP ERROR] Final replay failed during shutdown: {}", e);
            }
            return;
        }
        let discarded = self.logic.queue.drain_all();
        if !discarded.is_empty() {
            eprintln!(
                "[BOOTSTRAP WARNING] {} deferred event(s) discarded; startup never completed",
                discarded.len()
            );
        }
    }
}

fn finder_factory(loader: Arc<FinderLoader>) -> LoggerFactory {
    Arc::new(move |name: &str, unit: &UnitHandle| {
        let finder = loader.finder()?;
        Ok(finder.get_logger(name, unit))
    })
}

/// Builder for [`Bootstrap`]
#[must_use]
pub struct BootstrapBuilder {
    config: BootstrapConfig,
    source: Option<Arc<dyn ProviderSource>>,
    publisher: Option<Arc<dyn Publisher>>,
    idle_timeout: Option<Duration>,
}

impl BootstrapBuilder {
    pub fn new() -> Self {
        Self {
            config: BootstrapConfig::default(),
            source: None,
            publisher: None,
            idle_timeout: None,
        }
    }

    pub fn config(mut self, config: BootstrapConfig) -> Self {
        self.config = config;
        self
    }

    /// Provider source; an empty [`ProviderRegistry`] if not set
    pub fn providers(mut self, source: Arc<dyn ProviderSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Console publisher; a [`ConsolePublisher`] built from the
    /// configuration if not set
    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Replay worker idle timeout, overriding the configured one
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Bootstrap {
        let config = self.config;
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(ProviderRegistry::new()));
        let publisher = self.publisher.unwrap_or_else(|| {
            let mut console =
                ConsolePublisher::new().with_skip_prefixes(config.skip_prefixes.clone());
            if let Some(format) = &config.format {
                console = console.with_format(format.clone());
            }
            Arc::new(console)
        });
        let idle_timeout = self
            .idle_timeout
            .unwrap_or_else(|| Duration::from_secs(config.idle_timeout_secs));

        Bootstrap {
            logic: BootstrapLogic::new(config, source, publisher, idle_timeout),
            loggers: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for BootstrapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-facing logger handle
///
/// Every call goes to whatever logger the accessor currently holds, so the
/// same handle defers during startup, publishes through a surrogate or
/// reaches the real backend as the process moves along.
///
/// # Panics
///
/// Logging calls panic if the real logger has to be created after the
/// owning unit was unloaded.
pub struct LazyLogger {
    accessor: Arc<LoggerAccessor>,
}

impl LazyLogger {
    pub fn accessor(&self) -> &Arc<LoggerAccessor> {
        &self.accessor
    }

    fn logger(&self) -> Arc<dyn SystemLogger> {
        self.accessor
            .wrapped()
            .unwrap_or_else(|e| super::fatal(e))
    }

    fn bridge(&self) -> Arc<dyn PlatformBridge> {
        self.accessor
            .platform_view()
            .unwrap_or_else(|e| super::fatal(e))
    }

    /// Threshold of the current logger, if it supports one
    pub fn level(&self) -> Option<PlatformLevel> {
        self.logger()
            .as_configurable()
            .and_then(|c| c.platform_level())
    }

    /// Set the threshold of the current logger; false if it has none
    pub fn set_level(&self, level: Option<PlatformLevel>) -> bool {
        let logger = self.logger();
        match logger.as_configurable() {
            Some(configurable) => {
                configurable.set_platform_level(level);
                true
            }
            None => false,
        }
    }
}

impl SystemLogger for LazyLogger {
    fn name(&self) -> &str {
        self.accessor.name()
    }

    fn is_loggable(&self, level: Level) -> bool {
        self.logger().is_loggable(level)
    }

    fn log_record(&self, record: LogRecord<Level>) {
        self.logger().log_record(record);
    }

    fn as_bridge(self: Arc<Self>) -> Option<Arc<dyn PlatformBridge>> {
        Some(self)
    }
}

impl PlatformBridge for LazyLogger {
    fn logger_name(&self) -> &str {
        self.accessor.name()
    }

    fn is_platform_loggable(&self, level: PlatformLevel) -> bool {
        self.bridge().is_platform_loggable(level)
    }

    fn is_enabled(&self) -> bool {
        self.bridge().is_enabled()
    }

    fn log_platform(&self, record: LogRecord<PlatformLevel>) {
        self.bridge().log_platform(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{BufferPublisher, ConsoleFinder};
    use crate::core::SystemLoggerExt;

    fn bootstrap_with_default(
        config: BootstrapConfig,
    ) -> (Bootstrap, Arc<BufferPublisher>, Arc<BufferPublisher>) {
        let console = Arc::new(BufferPublisher::new());
        let backend = Arc::new(BufferPublisher::new());
        let registry = Arc::new(ProviderRegistry::new());
        let backend_out = Arc::clone(&backend);
        registry.set_default("default", move || {
            Ok(ConsoleFinder::new(Level::Debug, backend_out.clone()))
        });
        let bootstrap = Bootstrap::builder()
            .config(config)
            .providers(registry)
            .publisher(console.clone())
            .build();
        (bootstrap, console, backend)
    }

    #[test]
    fn test_registry_returns_same_handle() {
        let bootstrap = Bootstrap::builder().build();
        let a = bootstrap.get_logger("same", &UnitHandle::system());
        let b = bootstrap.get_logger("same", &UnitHandle::system());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(bootstrap.logger_names(), vec!["same"]);
    }

    #[test]
    fn test_defers_until_ready() {
        let (bootstrap, console, backend) = bootstrap_with_default(BootstrapConfig {
            backend_config: Some("app.json".to_string()),
            ..BootstrapConfig::default()
        });
        let logger = bootstrap.get_logger("early", &UnitHandle::system());

        logger.log(Level::Info, "a");
        logger.log(Level::Debug, "b");
        assert!(logger.is_loggable(Level::Info));
        assert!(!logger.is_loggable(Level::Debug));
        assert_eq!(bootstrap.deferred_len(), 2);
        assert!(backend.is_empty());

        assert!(bootstrap.mark_ready());
        logger.log(Level::Info, "c");

        assert_eq!(bootstrap.kind(), BackendKind::DefaultConfigured);
        assert_eq!(
            backend.lines(),
            vec!["INFO early: a", "DEBUG early: b", "INFO early: c"]
        );
        assert!(console.is_empty());
        assert_eq!(bootstrap.metrics().events_deferred(), 2);
        assert_eq!(bootstrap.metrics().events_replayed(), 2);
    }

    #[test]
    fn test_surrogate_then_redirect() {
        let (bootstrap, console, backend) = bootstrap_with_default(BootstrapConfig::default());
        bootstrap.mark_ready();
        let logger = bootstrap.get_logger("net", &UnitHandle::system());

        logger.log(Level::Info, "via surrogate");
        assert!(bootstrap.uses_surrogate());
        assert_eq!(console.lines(), vec!["INFO net: via surrogate"]);

        let report = bootstrap.backend_configured().unwrap();
        assert_eq!(report.redirected, 1);
        assert!(!bootstrap.uses_surrogate());

        logger.log(Level::Info, "via backend");
        assert_eq!(backend.lines(), vec!["INFO net: via backend"]);
        assert!(matches!(
            bootstrap.backend_configured(),
            Err(BootstrapError::AlreadyRedirected)
        ));
    }

    #[test]
    fn test_flush_before_ready_is_noop() {
        let (bootstrap, _, backend) = bootstrap_with_default(BootstrapConfig::default());
        bootstrap.get_logger("x", &UnitHandle::system()).log(Level::Warning, "held");
        bootstrap.flush().unwrap();
        assert_eq!(bootstrap.deferred_len(), 1);
        assert!(backend.is_empty());
    }

    #[test]
    fn test_reset_for_testing() {
        let (bootstrap, _, _) = bootstrap_with_default(BootstrapConfig::default());
        bootstrap.get_logger("x", &UnitHandle::system()).log(Level::Info, "held");
        bootstrap.mark_ready();
        bootstrap.kind();
        bootstrap.backend_configured().unwrap();

        bootstrap.reset_for_testing();
        assert!(!bootstrap.is_ready());
        assert_eq!(bootstrap.deferred_len(), 0);
        assert!(bootstrap.logger_names().is_empty());
        assert!(bootstrap.backend_configured().is_ok());
    }

    #[test]
    fn test_drop_replays_when_ready() {
        let (bootstrap, _, backend) = bootstrap_with_default(BootstrapConfig {
            backend_config: Some("app.json".to_string()),
            ..BootstrapConfig::default()
        });
        bootstrap.get_logger("late", &UnitHandle::system()).log(Level::Info, "pending");
        bootstrap.mark_ready();
        assert!(backend.is_empty());

        drop(bootstrap);
        assert_eq!(backend.lines(), vec!["INFO late: pending"]);
    }
}
