//! Log records: the arguments of one logging call
//!
//! A record carries everything a logging call can pass: the message (text
//! or a lazily evaluated supplier), an optional resource bundle used to
//! localize the message key, positional parameters, an attached error and
//! the logical caller. [`LogRecord::render`] produces the final text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lazily evaluated message producer
pub type MessageSupplier = Arc<dyn Fn() -> String + Send + Sync>;

/// Error value attached to a logging call
pub type Thrown = Arc<dyn std::error::Error + Send + Sync>;

/// Positional parameter for `{N}` message formatting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::String(s) => write!(f, "{}", s),
            Param::Int(i) => write!(f, "{}", i),
            Param::Float(fl) => write!(f, "{}", fl),
            Param::Bool(b) => write!(f, "{}", b),
            Param::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::String(s)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::String(s.to_string())
    }
}

impl From<i64> for Param {
    fn from(i: i64) -> Self {
        Param::Int(i)
    }
}

impl From<i32> for Param {
    fn from(i: i32) -> Self {
        Param::Int(i as i64)
    }
}

impl From<u32> for Param {
    fn from(i: u32) -> Self {
        Param::Int(i as i64)
    }
}

impl From<f64> for Param {
    fn from(f: f64) -> Self {
        Param::Float(f)
    }
}

impl From<bool> for Param {
    fn from(b: bool) -> Self {
        Param::Bool(b)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Param::Null)
    }
}

/// Source of localized message strings
pub trait ResourceBundle: Send + Sync {
    fn name(&self) -> &str;
    fn get_string(&self, key: &str) -> Option<String>;
}

/// In-memory bundle backed by a map
#[derive(Debug, Clone, Default)]
pub struct MapBundle {
    name: String,
    entries: HashMap<String, String>,
}

impl MapBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl ResourceBundle for MapBundle {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Message of a logging call
#[derive(Clone)]
pub enum Message {
    Text(String),
    Lazy(MessageSupplier),
}

impl Message {
    pub fn lazy<F>(supplier: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Message::Lazy(Arc::new(supplier))
    }

    /// Evaluate the message; suppliers run on every call
    pub fn resolve(&self) -> String {
        match self {
            Message::Text(s) => s.clone(),
            Message::Lazy(supplier) => supplier(),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Message::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::Text(s)
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::Text(s.to_string())
    }
}

/// Logical calling frame of a logging call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerInfo {
    pub class: String,
    pub method: Option<String>,
}

impl CallerInfo {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: Some(method.into()),
        }
    }

    pub fn class_only(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: None,
        }
    }

    /// Returns true if the frame belongs to one of the given name prefixes
    pub fn is_skipped(&self, prefixes: &[String]) -> bool {
        prefixes.iter().any(|p| self.class.starts_with(p.as_str()))
    }
}

impl fmt::Display for CallerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{} {}", self.class, method),
            None => write!(f, "{}", self.class),
        }
    }
}

/// The arguments of one logging call, at level kind `L`
#[derive(Clone)]
pub struct LogRecord<L> {
    pub level: L,
    pub message: Message,
    pub bundle: Option<Arc<dyn ResourceBundle>>,
    pub params: Vec<Param>,
    pub thrown: Option<Thrown>,
    pub caller: Option<CallerInfo>,
    /// Capture time for records replayed after the bootstrap window
    pub timestamp: Option<DateTime<Utc>>,
}

impl<L: Copy> LogRecord<L> {
    pub fn new(level: L, message: impl Into<Message>) -> Self {
        Self {
            level,
            message: message.into(),
            bundle: None,
            params: Vec::new(),
            thrown: None,
            caller: None,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_bundle(mut self, bundle: Arc<dyn ResourceBundle>) -> Self {
        self.bundle = Some(bundle);
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_thrown(mut self, thrown: Thrown) -> Self {
        self.thrown = Some(thrown);
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: CallerInfo) -> Self {
        self.caller = Some(caller);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Same record at a different level kind
    pub fn map_level<M: Copy>(self, f: impl FnOnce(L) -> M) -> LogRecord<M> {
        LogRecord {
            level: f(self.level),
            message: self.message,
            bundle: self.bundle,
            params: self.params,
            thrown: self.thrown,
            caller: self.caller,
            timestamp: self.timestamp,
        }
    }

    /// Produce the final message text
    ///
    /// The message is looked up in the bundle when one is attached (a
    /// missing key yields the key itself), then formatted with the
    /// positional parameters. A malformed format yields the raw string.
    pub fn render(&self) -> String {
        let raw = self.message.resolve();
        let text = match &self.bundle {
            Some(bundle) => bundle.get_string(&raw).unwrap_or(raw),
            None => raw,
        };
        format_positional(&text, &self.params)
    }
}

impl<L: fmt::Debug> fmt::Debug for LogRecord<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("level", &self.level)
            .field("message", &self.message)
            .field("bundle", &self.bundle.as_ref().map(|b| b.name().to_string()))
            .field("params", &self.params)
            .field("thrown", &self.thrown.as_ref().map(|t| t.to_string()))
            .field("caller", &self.caller)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Substitute `{N}` placeholders with positional parameters
///
/// Indices without a parameter are left as written. Returns the format
/// unchanged when there are no parameters or the format is malformed.
pub fn format_positional(format: &str, params: &[Param]) -> String {
    if params.is_empty() {
        return format.to_string();
    }

    let mut out = String::with_capacity(format.len() + params.len() * 8);
    let mut chars = format.char_indices();

    while let Some((start, c)) = chars.next() {
        match c {
            '{' => {
                let mut index = String::new();
                let mut closed = false;
                for (_, d) in chars.by_ref() {
                    if d == '}' {
                        closed = true;
                        break;
                    }
                    index.push(d);
                }
                if !closed {
                    return format.to_string();
                }
                match index.trim().parse::<usize>() {
                    Ok(i) => match params.get(i) {
                        Some(param) => out.push_str(&param.to_string()),
                        None => out.push_str(&format[start..start + index.len() + 2]),
                    },
                    Err(_) => return format.to_string(),
                }
            }
            '}' => return format.to_string(),
            _ => out.push(c),
        }
    }

    out
}
