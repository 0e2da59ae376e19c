//! Lazy logger accessors
//!
//! A [`LoggerAccessor`] is the stable handle behind one logger name. It
//! holds two cells: the current logger and its memoized platform view.
//! The current logger moves through phases (bootstrap proxy, then a
//! surrogate or the real logger) and every transition is a
//! compare-and-clear against the logger being replaced, so a stale
//! caller can never clear a newer value.
//!
//! Construction happens outside the accessor lock. Two threads racing on
//! an empty cell may both construct a candidate; the first one stored wins
//! and the other is discarded.

use super::unit::UnitHandle;
use crate::core::{platform_view_of, BootstrapError, PlatformBridge, Result, SystemLogger};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_ACCESSOR_ID: AtomicU64 = AtomicU64::new(1);

/// Creates the real logger for a name and owning unit
pub type LoggerFactory =
    Arc<dyn Fn(&str, &UnitHandle) -> Result<Arc<dyn SystemLogger>> + Send + Sync>;

/// Decides which logger an accessor should currently install
pub trait LoggerResolver: Send + Sync {
    fn resolve(&self, accessor: &Arc<LoggerAccessor>) -> Result<Arc<dyn SystemLogger>>;
}

#[derive(Default)]
struct Cells {
    logger: Option<Arc<dyn SystemLogger>>,
    platform: Option<Arc<dyn PlatformBridge>>,
}

pub struct LoggerAccessor {
    id: u64,
    name: String,
    unit: UnitHandle,
    factory: LoggerFactory,
    resolver: Arc<dyn LoggerResolver>,
    cells: RwLock<Cells>,
    this: Weak<LoggerAccessor>,
}

fn data_ptr<T: ?Sized>(value: &T) -> *const () {
    value as *const T as *const ()
}

fn holds(cell: &Option<Arc<dyn SystemLogger>>, expected: *const ()) -> bool {
    cell.as_ref()
        .is_some_and(|current| Arc::as_ptr(current) as *const () == expected)
}

impl LoggerAccessor {
    pub fn new(
        name: impl Into<String>,
        unit: UnitHandle,
        factory: LoggerFactory,
        resolver: Arc<dyn LoggerResolver>,
    ) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|this| Self {
            id: NEXT_ACCESSOR_ID.fetch_add(1, Ordering::Relaxed),
            name,
            unit,
            factory,
            resolver,
            cells: RwLock::new(Cells::default()),
            this: this.clone(),
        })
    }

    /// Process-unique identity of this accessor
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &UnitHandle {
        &self.unit
    }

    /// The logger currently installed, if any, without resolving one
    pub fn current(&self) -> Option<Arc<dyn SystemLogger>> {
        self.cells.read().logger.clone()
    }

    /// The current logger, resolving and installing one if the cell is empty
    ///
    /// A candidate that was superseded while it was being resolved is
    /// dropped and resolution starts over.
    pub fn wrapped(&self) -> Result<Arc<dyn SystemLogger>> {
        loop {
            if let Some(logger) = self.current() {
                return Ok(logger);
            }

            let this = self.this.upgrade().ok_or_else(|| {
                BootstrapError::other(format!("accessor for '{}' is being dropped", self.name))
            })?;
            let candidate = self.resolver.resolve(&this)?;

            let mut cells = self.cells.write();
            if let Some(existing) = &cells.logger {
                return Ok(Arc::clone(existing));
            }
            if candidate.is_superseded() {
                continue;
            }
            cells.logger = Some(Arc::clone(&candidate));
            return Ok(candidate);
        }
    }

    /// Platform view of the current logger, memoized alongside it
    pub fn platform_view(&self) -> Result<Arc<dyn PlatformBridge>> {
        if let Some(view) = self.cells.read().platform.clone() {
            return Ok(view);
        }

        let logger = self.wrapped()?;
        let view = platform_view_of(&logger);

        let mut cells = self.cells.write();
        if let Some(existing) = &cells.platform {
            return Ok(Arc::clone(existing));
        }
        // Only memoize a view of the logger that is still current
        if holds(&cells.logger, Arc::as_ptr(&logger) as *const ()) {
            cells.platform = Some(Arc::clone(&view));
        }
        Ok(view)
    }

    /// Replace `expected` by whatever the current phase calls for
    ///
    /// Clears both cells if they still hold `expected`; otherwise leaves
    /// them alone. Either way returns the logger now in force.
    pub fn get_concrete_logger(&self, expected: &dyn SystemLogger) -> Result<Arc<dyn SystemLogger>> {
        self.clear_if_current(data_ptr(expected));
        self.wrapped()
    }

    /// Platform counterpart of [`get_concrete_logger`](Self::get_concrete_logger)
    pub fn get_concrete_platform(
        &self,
        expected: &dyn SystemLogger,
    ) -> Result<Arc<dyn PlatformBridge>> {
        self.clear_if_current(data_ptr(expected));
        self.platform_view()
    }

    /// Clear both cells if they still hold `expected`
    ///
    /// With `force_eager` the replacement is resolved immediately and
    /// returned; otherwise the next call resolves it.
    pub fn release(
        &self,
        expected: &dyn SystemLogger,
        force_eager: bool,
    ) -> Result<Option<Arc<dyn SystemLogger>>> {
        self.clear_if_current(data_ptr(expected));
        if force_eager {
            self.wrapped().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Create the real logger through the factory
    ///
    /// Fails with [`BootstrapError::UnitUnloaded`] once the owning unit
    /// is gone.
    pub fn create_logger(&self) -> Result<Arc<dyn SystemLogger>> {
        if !self.unit.is_alive() {
            return Err(BootstrapError::unit_unloaded(&self.name, self.unit.name()));
        }
        (self.factory)(&self.name, &self.unit)
    }

    fn clear_if_current(&self, expected: *const ()) {
        let mut cells = self.cells.write();
        if holds(&cells.logger, expected) {
            cells.logger = None;
            cells.platform = None;
        }
    }
}

impl fmt::Debug for LoggerAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerAccessor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("unit", &self.unit.name())
            .field("resolved", &self.cells.read().logger.is_some())
            .finish()
    }
}
