//! Surrogate redirection
//!
//! The coordinator hands out at most one [`SurrogateLogger`] per accessor
//! while the default backend is unconfigured, and performs the one-shot
//! redirect when the application reports it configured. The redirect
//! closes the coordinator and snapshots the surrogate map under the lock,
//! then releases each accessor with the lock dropped.

use super::accessor::LoggerAccessor;
use super::classifier::BackendKind;
use super::surrogate::SurrogateLogger;
use crate::console::Publisher;
use crate::core::{BootstrapError, BootstrapMetrics, Configurable, Level, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

type SurrogateEntry = (Weak<LoggerAccessor>, Arc<SurrogateLogger>);

#[derive(Default)]
struct RedirectState {
    closed: bool,
    surrogates: HashMap<u64, SurrogateEntry>,
}

/// Outcome of a redirect
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RedirectReport {
    /// Accessors switched to the real backend
    pub redirected: usize,
    /// Accessors whose replacement could not be created
    pub failed: usize,
    /// Surrogates whose accessor no longer exists
    pub orphaned: usize,
}

pub struct RedirectCoordinator {
    state: Mutex<RedirectState>,
    default_level: Level,
    publisher: Arc<dyn Publisher>,
    metrics: Arc<BootstrapMetrics>,
}

impl RedirectCoordinator {
    pub fn new(
        default_level: Level,
        publisher: Arc<dyn Publisher>,
        metrics: Arc<BootstrapMetrics>,
    ) -> Self {
        Self {
            state: Mutex::new(RedirectState::default()),
            default_level,
            publisher,
            metrics,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of live surrogates
    pub fn len(&self) -> usize {
        self.state.lock().surrogates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The surrogate for `accessor`, created on first request
    ///
    /// Fails with [`BootstrapError::RedirectClosed`] once the redirect has
    /// happened.
    pub fn get(&self, accessor: &Arc<LoggerAccessor>) -> Result<Arc<SurrogateLogger>> {
        self.surrogate_if_open(accessor)
            .ok_or(BootstrapError::RedirectClosed)
    }

    /// Like [`get`](Self::get), but `None` once closed, so the caller can
    /// go straight to the real backend
    pub fn surrogate_if_open(&self, accessor: &Arc<LoggerAccessor>) -> Option<Arc<SurrogateLogger>> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }

        if let Some((owner, surrogate)) = state.surrogates.get(&accessor.id()) {
            if owner.strong_count() > 0 {
                return Some(Arc::clone(surrogate));
            }
        }

        let surrogate = Arc::new(SurrogateLogger::new(
            accessor.name(),
            self.default_level,
            Arc::clone(&self.publisher),
        ));
        state.surrogates.insert(
            accessor.id(),
            (Arc::downgrade(accessor), Arc::clone(&surrogate)),
        );
        self.metrics.record_surrogate_created();
        Some(surrogate)
    }

    /// Switch every surrogate to the real backend, exactly once
    ///
    /// Every surrogate is superseded under the lock, so an accessor that
    /// fetched one just before the close resolves again instead of
    /// installing it. For the default backend kinds the replacement is
    /// created eagerly and inherits any threshold set on the surrogate;
    /// for other kinds the accessor picks up the real logger on its next
    /// call.
    pub fn redrain_and_close(&self, kind: BackendKind) -> Result<RedirectReport> {
        let snapshot = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(BootstrapError::AlreadyRedirected);
            }
            state.closed = true;
            let surrogates = std::mem::take(&mut state.surrogates);
            for (_, surrogate) in surrogates.values() {
                surrogate.supersede();
            }
            surrogates
        };

        let force_eager = kind.is_default();
        let mut report = RedirectReport::default();

        for (owner, surrogate) in snapshot.into_values() {
            let Some(accessor) = owner.upgrade() else {
                surrogate.retire();
                report.orphaned += 1;
                continue;
            };

            let carried = surrogate.platform_level().filter(|_| force_eager);
            match accessor.release(surrogate.as_ref(), force_eager) {
                Ok(replacement) => {
                    if let (Some(level), Some(logger)) = (carried, replacement) {
                        if let Some(configurable) = logger.as_configurable() {
                            configurable.set_platform_level(Some(level));
                        }
                    }
                    report.redirected += 1;
                    self.metrics.record_surrogate_redirected();
                }
                Err(e) => {
                    report.failed += 1;
                    eprintln!(
                        "[BOOTSTRAP ERROR] Failed to redirect logger '{}': {}",
                        accessor.name(),
                        e
                    );
                }
            }
            surrogate.retire();
        }

        Ok(report)
    }

    #[doc(hidden)]
    pub fn reset_for_testing(&self) {
        let mut state = self.state.lock();
        state.closed = false;
        state.surrogates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::accessor::{LoggerFactory, LoggerResolver};
    use crate::bootstrap::unit::UnitHandle;
    use crate::console::BufferPublisher;
    use crate::core::{PlatformLevel, SystemLogger};
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    /// Resolves to the coordinator's surrogate while open
    struct ViaCoordinator(Arc<RedirectCoordinator>);

    impl LoggerResolver for ViaCoordinator {
        fn resolve(&self, accessor: &Arc<LoggerAccessor>) -> Result<Arc<dyn SystemLogger>> {
            match self.0.surrogate_if_open(accessor) {
                Some(surrogate) => Ok(surrogate),
                None => accessor.create_logger(),
            }
        }
    }

    fn setup() -> (Arc<RedirectCoordinator>, Arc<BootstrapMetrics>, LoggerFactory) {
        let metrics = Arc::new(BootstrapMetrics::new());
        let coordinator = Arc::new(RedirectCoordinator::new(
            Level::Info,
            Arc::new(BufferPublisher::new()),
            Arc::clone(&metrics),
        ));
        let factory: LoggerFactory = Arc::new(|name: &str, _unit: &UnitHandle| {
            Ok(Arc::new(SurrogateLogger::new(
                format!("real:{}", name),
                Level::Info,
                Arc::new(BufferPublisher::new()),
            )) as Arc<dyn SystemLogger>)
        });
        (coordinator, metrics, factory)
    }

    fn accessor(
        name: &str,
        coordinator: &Arc<RedirectCoordinator>,
        factory: &LoggerFactory,
    ) -> Arc<LoggerAccessor> {
        LoggerAccessor::new(
            name,
            UnitHandle::system(),
            Arc::clone(factory),
            Arc::new(ViaCoordinator(Arc::clone(coordinator))),
        )
    }

    #[test]
    fn test_one_surrogate_per_accessor() {
        let (coordinator, metrics, factory) = setup();
        let a = accessor("a", &coordinator, &factory);

        let first = coordinator.get(&a).unwrap();
        let second = coordinator.get(&a).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(metrics.surrogates_created(), 1);
        assert_eq!(coordinator.len(), 1);
    }

    #[test]
    fn test_redirect_is_one_shot() {
        let (coordinator, _, factory) = setup();
        let a = accessor("a", &coordinator, &factory);
        a.wrapped().unwrap();

        let report = coordinator
            .redrain_and_close(BackendKind::DefaultUnconfigured)
            .unwrap();
        assert_eq!(report.redirected, 1);
        assert!(coordinator.is_closed());

        assert!(matches!(
            coordinator.redrain_and_close(BackendKind::DefaultUnconfigured),
            Err(BootstrapError::AlreadyRedirected)
        ));
        assert!(matches!(coordinator.get(&a), Err(BootstrapError::RedirectClosed)));
        assert!(coordinator.surrogate_if_open(&a).is_none());
    }

    #[test]
    fn test_threshold_carries_over_on_default_backend() {
        let (coordinator, _, factory) = setup();
        let tuned = accessor("tuned", &coordinator, &factory);
        let plain = accessor("plain", &coordinator, &factory);

        let surrogate = tuned.wrapped().unwrap();
        surrogate
            .as_configurable()
            .unwrap()
            .set_platform_level(Some(PlatformLevel::Finest));
        plain.wrapped().unwrap();

        coordinator
            .redrain_and_close(BackendKind::DefaultUnconfigured)
            .unwrap();

        let real = tuned.current().expect("resolved eagerly");
        assert_eq!(real.name(), "real:tuned");
        assert_eq!(
            real.as_configurable().unwrap().platform_level(),
            Some(PlatformLevel::Finest)
        );
        let other = plain.current().expect("resolved eagerly");
        assert_eq!(other.as_configurable().unwrap().platform_level(), None);
        assert!(!surrogate.is_loggable(Level::Error));
    }

    #[test]
    fn test_custom_backend_stays_lazy() {
        let (coordinator, _, factory) = setup();
        let tuned = accessor("tuned", &coordinator, &factory);

        let surrogate = tuned.wrapped().unwrap();
        surrogate
            .as_configurable()
            .unwrap()
            .set_platform_level(Some(PlatformLevel::Finest));

        let report = coordinator
            .redrain_and_close(BackendKind::CustomBackend)
            .unwrap();
        assert_eq!(report.redirected, 1);
        assert!(tuned.current().is_none());
        assert!(!surrogate.is_loggable(Level::Error));

        let real = tuned.wrapped().unwrap();
        assert_eq!(real.name(), "real:tuned");
        assert_eq!(real.as_configurable().unwrap().platform_level(), None);
    }

    /// Resolver that parks the first caller after it fetched a surrogate
    /// and holds the second caller until the first one has installed its
    /// result
    struct Interleaved {
        coordinator: Arc<RedirectCoordinator>,
        calls: AtomicUsize,
        fetched: Sender<()>,
        resume: Receiver<()>,
        resume_tx: Sender<()>,
        installed: Receiver<()>,
    }

    impl LoggerResolver for Interleaved {
        fn resolve(&self, accessor: &Arc<LoggerAccessor>) -> Result<Arc<dyn SystemLogger>> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => {
                    let surrogate = self
                        .coordinator
                        .surrogate_if_open(accessor)
                        .expect("coordinator still open");
                    self.fetched.send(()).unwrap();
                    self.resume.recv().unwrap();
                    Ok(surrogate)
                }
                1 => {
                    let real = accessor.create_logger()?;
                    self.resume_tx.send(()).unwrap();
                    let _ = self.installed.recv_timeout(Duration::from_secs(5));
                    Ok(real)
                }
                _ => match self.coordinator.surrogate_if_open(accessor) {
                    Some(surrogate) => Ok(surrogate),
                    None => accessor.create_logger(),
                },
            }
        }
    }

    #[test]
    fn test_surrogate_fetched_before_close_is_not_installed() {
        let (coordinator, _, factory) = setup();
        let (fetched_tx, fetched_rx) = unbounded();
        let (resume_tx, resume_rx) = unbounded();
        let (installed_tx, installed_rx) = unbounded();
        let resolver = Arc::new(Interleaved {
            coordinator: Arc::clone(&coordinator),
            calls: AtomicUsize::new(0),
            fetched: fetched_tx,
            resume: resume_rx,
            resume_tx,
            installed: installed_rx,
        });
        let race = LoggerAccessor::new("race", UnitHandle::system(), factory, resolver);

        let early = {
            let race = Arc::clone(&race);
            thread::spawn(move || {
                let logger = race.wrapped().unwrap();
                installed_tx.send(()).unwrap();
                logger.name().to_string()
            })
        };

        // The early caller holds the surrogate but has not stored it yet
        fetched_rx.recv().unwrap();
        let report = coordinator
            .redrain_and_close(BackendKind::DefaultUnconfigured)
            .unwrap();
        let early_name = early.join().expect("early caller panicked");

        assert_eq!(report, RedirectReport { redirected: 1, failed: 0, orphaned: 0 });
        assert_eq!(early_name, "real:race");
        let current = race.current().expect("logger installed");
        assert_eq!(current.name(), "real:race");
        assert!(!current.is_superseded());
        assert!(current.is_loggable(Level::Error));
    }
}
