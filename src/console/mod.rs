//! Console fallback output

pub mod format;
pub mod publisher;
pub mod simple;

pub use format::{render_line, DEFAULT_FORMAT};
pub use publisher::{BufferPublisher, ConsolePublisher, PublishedEntry, Publisher};
pub use simple::{ConsoleFinder, SimpleConsoleLogger};
