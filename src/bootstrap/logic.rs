//! Shared bootstrap state and the logger selection rule

use super::accessor::{LoggerAccessor, LoggerResolver};
use super::classifier::{BackendClassifier, BackendKind, Readiness};
use super::dispatcher::{on_worker_thread, SelfExpiringDispatcher};
use super::finder::{FinderLoader, ProviderSource};
use super::proxy::BootstrapProxy;
use super::queue::{DeferredQueue, DrainedChain};
use super::redirect::RedirectCoordinator;
use crate::console::Publisher;
use crate::core::{BootstrapConfig, BootstrapError, BootstrapMetrics, Result, SystemLogger};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;

pub(crate) struct BootstrapLogic {
    pub(crate) config: BootstrapConfig,
    pub(crate) readiness: Readiness,
    pub(crate) classifier: BackendClassifier,
    pub(crate) queue: DeferredQueue,
    pub(crate) dispatcher: SelfExpiringDispatcher,
    pub(crate) coordinator: RedirectCoordinator,
    pub(crate) loader: Arc<FinderLoader>,
    pub(crate) metrics: Arc<BootstrapMetrics>,
    flush_order: Mutex<()>,
    this: Weak<BootstrapLogic>,
}

impl BootstrapLogic {
    pub(crate) fn new(
        config: BootstrapConfig,
        source: Arc<dyn ProviderSource>,
        publisher: Arc<dyn Publisher>,
        idle_timeout: Duration,
    ) -> Arc<Self> {
        let metrics = Arc::new(BootstrapMetrics::new());
        Arc::new_cyclic(|this| Self {
            readiness: Readiness::new(),
            classifier: BackendClassifier::new(Arc::clone(&source), config.has_backend_config()),
            queue: DeferredQueue::new(),
            dispatcher: SelfExpiringDispatcher::with_idle_timeout(
                idle_timeout,
                Arc::clone(&metrics),
            ),
            coordinator: RedirectCoordinator::new(
                config.default_level,
                Arc::clone(&publisher),
                Arc::clone(&metrics),
            ),
            loader: Arc::new(FinderLoader::new(source, &config, publisher)),
            metrics,
            config,
            flush_order: Mutex::new(()),
            this: this.clone(),
        })
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    /// Loggers are currently served by surrogates
    pub(crate) fn uses_surrogate(&self) -> bool {
        self.is_ready() && self.classifier.uses_surrogate(self.coordinator.is_closed())
    }

    /// Drain the deferred queue and replay it on the dispatcher, waiting
    /// for the replay to finish
    ///
    /// Draining and submitting happen under `flush_order`, so a flush that
    /// finds the queue empty still waits behind a batch another thread
    /// drained first. On the worker thread the batch replays inline. If no
    /// worker can be started the batch replays on the calling thread.
    pub(crate) fn flush(&self) -> Result<()> {
        if on_worker_thread() {
            replay_chain(self.queue.drain_all(), &self.metrics);
            return Ok(());
        }

        let completion = {
            let _order = self.flush_order.lock();
            let chain = self.queue.drain_all();
            if chain.is_empty() && self.dispatcher.pending() == 0 {
                return Ok(());
            }

            let slot = Arc::new(Mutex::new(Some(chain)));
            let task_slot = Arc::clone(&slot);
            let metrics = Arc::clone(&self.metrics);
            match self.dispatcher.submit_tracked(move || {
                let chain = task_slot.lock().take();
                if let Some(chain) = chain {
                    replay_chain(chain, &metrics);
                }
                Ok(())
            }) {
                Ok(completion) => completion,
                Err(BootstrapError::DispatcherUnavailable(reason)) => {
                    eprintln!(
                        "[BOOTSTRAP WARNING] Replay worker unavailable ({}), replaying on the calling thread",
                        reason
                    );
                    let chain = slot.lock().take();
                    drop(_order);
                    if let Some(chain) = chain {
                        replay_chain(chain, &self.metrics);
                    }
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        };
        completion.wait()
    }
}

fn replay_chain(chain: DrainedChain, metrics: &BootstrapMetrics) {
    let stats = chain.replay_all();
    metrics.record_replayed(stats.replayed as u64);
    if stats.failed > 0 {
        metrics.record_replay_failures(stats.failed as u64);
    }
}

impl LoggerResolver for BootstrapLogic {
    fn resolve(&self, accessor: &Arc<LoggerAccessor>) -> Result<Arc<dyn SystemLogger>> {
        if self.readiness.uses_deferred_queueing() {
            let logic = self
                .this
                .upgrade()
                .ok_or_else(|| BootstrapError::other("bootstrap state is being dropped"))?;
            return Ok(BootstrapProxy::new(accessor, logic));
        }

        if self.classifier.kind() == BackendKind::DefaultUnconfigured {
            if let Some(surrogate) = self.coordinator.surrogate_if_open(accessor) {
                return Ok(surrogate);
            }
        }
        accessor.create_logger()
    }
}
