//! Logging macros with `format!`-style arguments
//!
//! Each macro accepts anything that dereferences to a [`SystemLogger`],
//! including the `Arc<LazyLogger>` handles returned by
//! [`Bootstrap::get_logger`].
//!
//! # Examples
//!
//! ```
//! use rust_bootstrap_logger::prelude::*;
//! use rust_bootstrap_logger::info;
//!
//! let bootstrap = Bootstrap::builder().build();
//! let logger = bootstrap.get_logger("app.http", &UnitHandle::system());
//!
//! info!(logger, "Server starting");
//! let port = 8080;
//! info!(logger, "Listening on port {}", port);
//! ```
//!
//! [`SystemLogger`]: crate::SystemLogger
//! [`Bootstrap::get_logger`]: crate::Bootstrap::get_logger

/// Log a formatted message at `level`.
///
/// # Examples
///
/// ```
/// # use rust_bootstrap_logger::prelude::*;
/// # let logger = Bootstrap::builder().build().get_logger("doc", &UnitHandle::system());
/// use rust_bootstrap_logger::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        use $crate::SystemLoggerExt as _;
        $logger.log($level, format!($($arg)+))
    }};
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_bootstrap_logger::prelude::*;
/// # let logger = Bootstrap::builder().build().get_logger("doc", &UnitHandle::system());
/// use rust_bootstrap_logger::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::console::{BufferPublisher, SimpleConsoleLogger};
    use crate::core::Level;
    use std::sync::Arc;

    #[test]
    fn test_level_macros() {
        let buffer = Arc::new(BufferPublisher::new());
        let logger = Arc::new(SimpleConsoleLogger::new("macros", Level::Trace, buffer.clone()));

        trace!(logger, "t {}", 1);
        debug!(logger, "d");
        info!(logger, "i {}-{}", "a", 2);
        warn!(logger, "w");
        error!(logger, "e");
        log!(logger, Level::Info, "plain");

        assert_eq!(
            buffer.lines(),
            vec![
                "TRACE macros: t 1",
                "DEBUG macros: d",
                "INFO macros: i a-2",
                "WARNING macros: w",
                "ERROR macros: e",
                "INFO macros: plain",
            ]
        );
    }
}
