//! Deferred bootstrap engine
//!
//! Loggers handed out here are usable from the first instruction of the
//! process. Until startup is reported complete, calls are captured and
//! queued; the first call afterwards replays the queue on a background
//! worker and waits for it. When the default backend is present but not
//! yet configured, loggers publish through surrogates until the
//! application reports the backend configured.

pub mod accessor;
pub mod classifier;
pub mod dispatcher;
pub mod event;
pub mod finder;
mod logic;
pub mod proxy;
pub mod queue;
pub mod redirect;
pub mod runtime;
pub mod surrogate;
pub mod unit;

pub use accessor::{LoggerAccessor, LoggerFactory, LoggerResolver};
pub use classifier::{BackendClassifier, BackendKind, Readiness};
pub use dispatcher::{on_worker_thread, SelfExpiringDispatcher, DEFAULT_IDLE_TIMEOUT};
pub use event::{CapturedContext, EventPayload, LinkState, LogEvent, ReplayTarget};
pub use finder::{
    FinderFactory, FinderLoader, LoggerFinder, ProviderPresence, ProviderRegistry, ProviderSource,
};
pub use proxy::{BootstrapProxy, BOOTSTRAP_THRESHOLD};
pub use queue::{DeferredQueue, DrainedChain, ReplayStats};
pub use redirect::{RedirectCoordinator, RedirectReport};
pub use runtime::{Bootstrap, BootstrapBuilder, LazyLogger};
pub use surrogate::SurrogateLogger;
pub use unit::{LivenessCheck, Unit, UnitHandle};

use crate::core::BootstrapError;

/// Abort the calling logging operation on an unrecoverable state error
pub(crate) fn fatal(error: BootstrapError) -> ! {
    panic!("[BOOTSTRAP FATAL] {}", error)
}
