//! Owning units
//!
//! Every logger is requested on behalf of a unit (a plugin, a module, a
//! dynamically loaded component). Accessors keep a [`UnitHandle`] and
//! check it before creating a real logger: creating a logger for a unit
//! that has been unloaded is a fatal state error.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Liveness check of a unit
pub type LivenessCheck = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Clone)]
pub struct UnitHandle {
    name: Arc<str>,
    liveness: LivenessCheck,
}

impl UnitHandle {
    pub fn new<F>(name: impl Into<Arc<str>>, liveness: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            liveness: Arc::new(liveness),
        }
    }

    /// Handle of the process itself, always alive
    pub fn system() -> Self {
        Self::new("system", || true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        (self.liveness)()
    }
}

impl fmt::Debug for UnitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitHandle")
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// A loadable unit; its handles report dead once it is unloaded or dropped
#[derive(Debug)]
pub struct Unit {
    name: Arc<str>,
    loaded: Arc<AtomicBool>,
}

impl Unit {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            loaded: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> UnitHandle {
        let loaded = Arc::clone(&self.loaded);
        UnitHandle {
            name: Arc::clone(&self.name),
            liveness: Arc::new(move || loaded.load(Ordering::Acquire)),
        }
    }

    pub fn unload(&self) {
        self.loaded.store(false, Ordering::Release);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

impl Drop for Unit {
    fn drop(&mut self) {
        self.unload();
    }
}
