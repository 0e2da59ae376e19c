//! Backend classification and readiness
//!
//! Which kind of backend serves loggers is decided once, on first demand,
//! from provider presence and configuration. Detection only probes the
//! [`ProviderSource`]; it never instantiates a provider, so classifying
//! cannot recurse into logging.

use super::finder::ProviderSource;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BackendKind {
    /// Not classified yet
    Undetected = 0,
    /// No provider at all; loggers publish to the console
    NoBackend = 1,
    /// Default provider present, no backend configuration recognized
    DefaultUnconfigured = 2,
    /// Default provider present with a recognized backend configuration
    DefaultConfigured = 3,
    /// At least one custom provider is installed
    CustomBackend = 4,
}

impl BackendKind {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => BackendKind::NoBackend,
            2 => BackendKind::DefaultUnconfigured,
            3 => BackendKind::DefaultConfigured,
            4 => BackendKind::CustomBackend,
            _ => BackendKind::Undetected,
        }
    }

    /// Returns true for the two default-backend kinds
    pub fn is_default(self) -> bool {
        matches!(
            self,
            BackendKind::DefaultUnconfigured | BackendKind::DefaultConfigured
        )
    }

    pub fn to_str(self) -> &'static str {
        match self {
            BackendKind::Undetected => "UNDETECTED",
            BackendKind::NoBackend => "NO_BACKEND",
            BackendKind::DefaultUnconfigured => "DEFAULT_UNCONFIGURED",
            BackendKind::DefaultConfigured => "DEFAULT_CONFIGURED",
            BackendKind::CustomBackend => "CUSTOM_BACKEND",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Memoized, double-checked backend classification
pub struct BackendClassifier {
    state: AtomicU8,
    detect_lock: Mutex<()>,
    source: Arc<dyn ProviderSource>,
    backend_configured: bool,
    detections: AtomicUsize,
}

impl BackendClassifier {
    /// `backend_configured` is whether a recognized backend configuration
    /// source was present at startup
    pub fn new(source: Arc<dyn ProviderSource>, backend_configured: bool) -> Self {
        Self {
            state: AtomicU8::new(BackendKind::Undetected as u8),
            detect_lock: Mutex::new(()),
            source,
            backend_configured,
            detections: AtomicUsize::new(0),
        }
    }

    /// The backend kind, detecting it on first call
    pub fn kind(&self) -> BackendKind {
        let current = self.peek();
        if current != BackendKind::Undetected {
            return current;
        }

        let _guard = self.detect_lock.lock();
        let current = self.peek();
        if current != BackendKind::Undetected {
            return current;
        }
        let detected = self.detect();
        self.state.store(detected as u8, Ordering::Release);
        detected
    }

    /// The memoized kind, without triggering detection
    pub fn peek(&self) -> BackendKind {
        BackendKind::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns true if loggers must go through a redirectable surrogate
    ///
    /// `redirected` is whether the application already reported the
    /// backend configured.
    pub fn uses_surrogate(&self, redirected: bool) -> bool {
        !redirected && self.kind() == BackendKind::DefaultUnconfigured
    }

    /// Number of detections run so far
    pub fn detections(&self) -> usize {
        self.detections.load(Ordering::Relaxed)
    }

    fn detect(&self) -> BackendKind {
        self.detections.fetch_add(1, Ordering::Relaxed);
        match self.source.probe() {
            Ok(presence) if presence.custom > 0 => BackendKind::CustomBackend,
            Ok(presence) if presence.has_default => {
                if self.backend_configured {
                    BackendKind::DefaultConfigured
                } else {
                    BackendKind::DefaultUnconfigured
                }
            }
            Ok(_) => BackendKind::NoBackend,
            // Reported by the finder loader under its fail policy
            Err(_) => BackendKind::NoBackend,
        }
    }

    #[doc(hidden)]
    pub fn reset_for_testing(&self) {
        let _guard = self.detect_lock.lock();
        self.state
            .store(BackendKind::Undetected as u8, Ordering::Release);
        self.detections.store(0, Ordering::Relaxed);
    }
}

/// One-way startup readiness flag
#[derive(Debug, Default)]
pub struct Readiness {
    ready: AtomicBool,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Mark startup complete; returns true for the call that flipped it
    pub fn mark_ready(&self) -> bool {
        !self.ready.swap(true, Ordering::AcqRel)
    }

    /// Returns true while calls must be deferred
    pub fn uses_deferred_queueing(&self) -> bool {
        !self.is_ready()
    }

    #[doc(hidden)]
    pub fn reset_for_testing(&self) {
        self.ready.store(false, Ordering::Release);
    }
}
