//! Logger finder providers
//!
//! A [`LoggerFinder`] is the backend's entry point: it turns a logger name
//! and an owning unit into a real logger. Finders come from a
//! [`ProviderSource`], which can report which providers exist without
//! instantiating any of them.
//!
//! [`FinderLoader`] instantiates the finder once, applying the configured
//! [`FailPolicy`] when that goes wrong:
//!
//! | policy         | on failure                                        |
//! |----------------|---------------------------------------------------|
//! | `Error`        | return a fatal configuration error                |
//! | `Warn`         | warn on the console, use the console finder       |
//! | `WarnVerbose`  | as `Warn`, with the failure detail attached       |
//! | `Silent`       | use the console finder                            |
//!
//! Failures are not memoized; the next request tries again.

use super::unit::UnitHandle;
use crate::console::{ConsoleFinder, Publisher, SimpleConsoleLogger};
use crate::core::{
    BootstrapConfig, BootstrapError, FailPolicy, Level, Result, SystemLogger, SystemLoggerExt,
};
use parking_lot::{Mutex, RwLock};
use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const LOADER_LOGGER_NAME: &str = "rust_bootstrap_logger::finder";

pub trait LoggerFinder: Send + Sync {
    fn get_logger(&self, name: &str, unit: &UnitHandle) -> Arc<dyn SystemLogger>;
}

/// Which providers a source can supply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderPresence {
    /// Number of custom providers
    pub custom: usize,
    pub has_default: bool,
}

pub trait ProviderSource: Send + Sync {
    /// Report provider presence without instantiating anything
    fn probe(&self) -> Result<ProviderPresence>;

    /// Instantiate the first custom provider
    fn load_custom(&self) -> Result<Arc<dyn LoggerFinder>>;

    /// Instantiate the default provider
    fn load_default(&self) -> Result<Arc<dyn LoggerFinder>>;
}

pub type FinderFactory = Arc<dyn Fn() -> Result<Arc<dyn LoggerFinder>> + Send + Sync>;

struct ProviderEntry {
    name: String,
    factory: FinderFactory,
}

/// In-process provider registry
///
/// Providers are registered as factories and only run when the loader
/// asks for them.
#[derive(Default)]
pub struct ProviderRegistry {
    custom: RwLock<Vec<ProviderEntry>>,
    default: RwLock<Option<ProviderEntry>>,
    probes: AtomicUsize,
    instantiations: AtomicUsize,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_custom<F, T>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
        T: LoggerFinder + 'static,
    {
        self.custom.write().push(ProviderEntry {
            name: name.into(),
            factory: erase(factory),
        });
    }

    pub fn set_default<F, T>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
        T: LoggerFinder + 'static,
    {
        *self.default.write() = Some(ProviderEntry {
            name: name.into(),
            factory: erase(factory),
        });
    }

    /// Names of the registered custom providers, in registration order
    pub fn custom_names(&self) -> Vec<String> {
        self.custom.read().iter().map(|e| e.name.clone()).collect()
    }

    pub fn default_name(&self) -> Option<String> {
        self.default.read().as_ref().map(|e| e.name.clone())
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    /// Number of provider factories run so far
    pub fn instantiation_count(&self) -> usize {
        self.instantiations.load(Ordering::Relaxed)
    }

    fn instantiate(&self, entry: &ProviderEntry) -> Result<Arc<dyn LoggerFinder>> {
        self.instantiations.fetch_add(1, Ordering::Relaxed);
        (entry.factory)().map_err(|e| {
            BootstrapError::service_caused_by(
                format!("provider '{}' could not be instantiated", entry.name),
                e,
            )
        })
    }
}

fn erase<F, T>(factory: F) -> FinderFactory
where
    F: Fn() -> Result<T> + Send + Sync + 'static,
    T: LoggerFinder + 'static,
{
    Arc::new(move || factory().map(|finder| Arc::new(finder) as Arc<dyn LoggerFinder>))
}

impl ProviderSource for ProviderRegistry {
    fn probe(&self) -> Result<ProviderPresence> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        Ok(ProviderPresence {
            custom: self.custom.read().len(),
            has_default: self.default.read().is_some(),
        })
    }

    fn load_custom(&self) -> Result<Arc<dyn LoggerFinder>> {
        let custom = self.custom.read();
        let entry = custom
            .first()
            .ok_or_else(|| BootstrapError::service("no custom provider registered"))?;
        self.instantiate(entry)
    }

    fn load_default(&self) -> Result<Arc<dyn LoggerFinder>> {
        let default = self.default.read();
        let entry = default
            .as_ref()
            .ok_or_else(|| BootstrapError::service("no default provider registered"))?;
        self.instantiate(entry)
    }
}

thread_local! {
    static LOADING: Cell<bool> = const { Cell::new(false) };
}

struct LoadingGuard;

impl LoadingGuard {
    fn enter() -> Self {
        LOADING.with(|flag| flag.set(true));
        LoadingGuard
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        LOADING.with(|flag| flag.set(false));
    }
}

/// Loads and memoizes the process-wide logger finder
pub struct FinderLoader {
    source: Arc<dyn ProviderSource>,
    policy: FailPolicy,
    singleton: bool,
    default_level: Level,
    publisher: Arc<dyn Publisher>,
    finder: Mutex<Option<Arc<dyn LoggerFinder>>>,
}

impl FinderLoader {
    pub fn new(
        source: Arc<dyn ProviderSource>,
        config: &BootstrapConfig,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            source,
            policy: config.fail_policy,
            singleton: config.singleton,
            default_level: config.default_level,
            publisher,
            finder: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> FailPolicy {
        self.policy
    }

    /// Returns true once a finder has been loaded
    pub fn is_loaded(&self) -> bool {
        self.finder.lock().is_some()
    }

    /// The process-wide finder, loading it on first call
    ///
    /// A provider that asks for a logger while it is being loaded gets a
    /// console logger instead of deadlocking on itself.
    pub fn finder(&self) -> Result<Arc<dyn LoggerFinder>> {
        if LOADING.with(|flag| flag.get()) {
            return Ok(self.console_finder());
        }

        let mut slot = self.finder.lock();
        if let Some(finder) = slot.as_ref() {
            return Ok(Arc::clone(finder));
        }

        let finder = {
            let _loading = LoadingGuard::enter();
            self.load()?
        };
        *slot = Some(Arc::clone(&finder));
        Ok(finder)
    }

    fn load(&self) -> Result<Arc<dyn LoggerFinder>> {
        match self.try_load() {
            Ok(finder) => Ok(finder),
            Err(e) => self.on_failure(e),
        }
    }

    fn try_load(&self) -> Result<Arc<dyn LoggerFinder>> {
        let presence = self.source.probe()?;
        if presence.custom > 1 && self.singleton {
            return Err(BootstrapError::service(format!(
                "{} logger finder providers installed, at most one is allowed",
                presence.custom
            )));
        }

        if presence.custom > 0 {
            self.source.load_custom()
        } else if presence.has_default {
            self.source.load_default()
        } else {
            Ok(self.console_finder())
        }
    }

    fn on_failure(&self, error: BootstrapError) -> Result<Arc<dyn LoggerFinder>> {
        match self.policy {
            FailPolicy::Error => {
                let message = format!("failed to load the logger finder: {}", error);
                Err(BootstrapError::service_caused_by(message, error))
            }
            FailPolicy::Silent => Ok(self.console_finder()),
            FailPolicy::Warn | FailPolicy::WarnVerbose => {
                let logger = SimpleConsoleLogger::new(
                    LOADER_LOGGER_NAME,
                    Level::Warning,
                    Arc::clone(&self.publisher),
                );
                if self.policy == FailPolicy::WarnVerbose {
                    logger.log_thrown(
                        Level::Warning,
                        "Failed to load the logger finder, using the console",
                        Arc::new(error),
                    );
                } else {
                    logger.log(
                        Level::Warning,
                        format!(
                            "Failed to load the logger finder, using the console: {}",
                            error
                        ),
                    );
                }
                Ok(self.console_finder())
            }
        }
    }

    fn console_finder(&self) -> Arc<dyn LoggerFinder> {
        Arc::new(ConsoleFinder::new(
            self.default_level,
            Arc::clone(&self.publisher),
        ))
    }

    #[doc(hidden)]
    pub fn reset_for_testing(&self) {
        self.finder.lock().take();
    }
}
