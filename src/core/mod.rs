//! Core types: levels, records, logger traits, errors, configuration

pub mod config;
pub mod error;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod record;

pub use config::{property_keys, BootstrapConfig, FailPolicy};
pub use error::{BootstrapError, Result};
pub use level::{Level, PlatformLevel};
pub use logger::{
    platform_view_of, Configurable, LevelMappingBridge, PlatformBridge, PlatformBridgeExt,
    SystemLogger, SystemLoggerExt,
};
pub use metrics::BootstrapMetrics;
pub use record::{
    format_positional, CallerInfo, LogRecord, MapBundle, Message, MessageSupplier, Param,
    ResourceBundle, Thrown,
};
