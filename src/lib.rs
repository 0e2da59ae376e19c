//! # Rust Bootstrap Logger
//!
//! Logging that works before the logging backend does.
//!
//! ## Features
//!
//! - **Deferred Capture**: calls made during startup are queued with their
//!   original timestamp and thread, then replayed in order
//! - **Background Replay**: replay runs on a self-expiring worker thread
//! - **Backend Detection**: custom, default or no backend, decided once
//! - **Surrogates**: console loggers with settable thresholds until the
//!   default backend is configured, then a one-shot redirect
//! - **Console Fallback**: formatted stderr output when no backend exists
//!
//! ## Example
//!
//! ```
//! use rust_bootstrap_logger::prelude::*;
//!
//! let bootstrap = Bootstrap::builder().build();
//! let logger = bootstrap.get_logger("app.start", &UnitHandle::system());
//!
//! logger.log(Level::Info, "captured before startup completes");
//! bootstrap.mark_ready();
//! bootstrap.flush().unwrap();
//! ```

pub mod bootstrap;
pub mod console;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::bootstrap::{
        Bootstrap, BootstrapBuilder, BackendKind, LazyLogger, LoggerFinder, ProviderRegistry,
        ProviderSource, Unit, UnitHandle,
    };
    pub use crate::console::{BufferPublisher, ConsoleFinder, ConsolePublisher, Publisher};
    pub use crate::core::{
        BootstrapConfig, BootstrapError, BootstrapMetrics, CallerInfo, Configurable, FailPolicy,
        Level, LogRecord, MapBundle, Param, PlatformBridge, PlatformBridgeExt, PlatformLevel,
        Result, SystemLogger, SystemLoggerExt,
    };
}

pub use bootstrap::{
    Bootstrap, BootstrapBuilder, BackendKind, LazyLogger, LoggerFinder, ProviderRegistry,
    ProviderSource, RedirectReport, Unit, UnitHandle,
};
pub use self::core::{
    BootstrapConfig, BootstrapError, BootstrapMetrics, CallerInfo, Configurable, FailPolicy,
    Level, LogRecord, MapBundle, Message, Param, PlatformBridge, PlatformBridgeExt, PlatformLevel,
    ResourceBundle, Result, SystemLogger, SystemLoggerExt, Thrown,
};
