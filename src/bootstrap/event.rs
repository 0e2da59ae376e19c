//! Deferred log events
//!
//! A [`LogEvent`] is the immutable capture of one logging call made during
//! the bootstrap window. Its only mutable part is the link state, which
//! moves `Unlinked -> Linked -> Drained` exactly once and guards both
//! double enqueueing and double consumption.

use crate::core::{Level, LogRecord, PlatformLevel, Result};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Position of an event relative to the deferred queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkState {
    Unlinked = 0,
    Linked = 1,
    Drained = 2,
}

impl LinkState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LinkState::Unlinked,
            1 => LinkState::Linked,
            _ => LinkState::Drained,
        }
    }
}

/// Execution context captured when the call was made
#[derive(Debug, Clone)]
pub struct CapturedContext {
    pub timestamp: DateTime<Utc>,
    pub monotonic: Instant,
    pub thread_id: String,
    pub thread_name: Option<String>,
}

impl CapturedContext {
    pub fn capture() -> Self {
        Self {
            timestamp: Utc::now(),
            monotonic: Instant::now(),
            thread_id: current_thread_id(),
            thread_name: current_thread_name(),
        }
    }

    /// Time elapsed since capture, on the monotonic clock
    pub fn age(&self) -> std::time::Duration {
        self.monotonic.elapsed()
    }

    pub fn thread_label(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(&self.thread_id)
    }
}

/// The call carried by an event, at its original level kind
#[derive(Debug, Clone)]
pub enum EventPayload {
    System(LogRecord<Level>),
    Platform(LogRecord<PlatformLevel>),
}

impl EventPayload {
    fn stamped(&self, timestamp: DateTime<Utc>) -> Self {
        match self {
            EventPayload::System(r) => EventPayload::System(r.clone().with_timestamp(timestamp)),
            EventPayload::Platform(r) => {
                EventPayload::Platform(r.clone().with_timestamp(timestamp))
            }
        }
    }

    pub fn render(&self) -> String {
        match self {
            EventPayload::System(r) => r.render(),
            EventPayload::Platform(r) => r.render(),
        }
    }
}

/// Receiver of replayed events
pub trait ReplayTarget: Send + Sync {
    /// Name of the logger the event was issued on
    fn target_name(&self) -> &str;

    fn replay(&self, payload: EventPayload) -> Result<()>;
}

pub struct LogEvent {
    target: Arc<dyn ReplayTarget>,
    payload: EventPayload,
    context: CapturedContext,
    link: AtomicU8,
}

impl LogEvent {
    pub fn new(target: Arc<dyn ReplayTarget>, payload: EventPayload) -> Self {
        Self {
            target,
            payload,
            context: CapturedContext::capture(),
            link: AtomicU8::new(LinkState::Unlinked as u8),
        }
    }

    pub fn system(target: Arc<dyn ReplayTarget>, record: LogRecord<Level>) -> Self {
        Self::new(target, EventPayload::System(record))
    }

    pub fn platform(target: Arc<dyn ReplayTarget>, record: LogRecord<PlatformLevel>) -> Self {
        Self::new(target, EventPayload::Platform(record))
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn context(&self) -> &CapturedContext {
        &self.context
    }

    pub fn target_name(&self) -> &str {
        self.target.target_name()
    }

    pub fn link_state(&self) -> LinkState {
        LinkState::from_u8(self.link.load(Ordering::Acquire))
    }

    /// `Unlinked -> Linked`; false if the event was ever enqueued
    pub(crate) fn try_link(&self) -> bool {
        self.link
            .compare_exchange(
                LinkState::Unlinked as u8,
                LinkState::Linked as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// `Linked -> Drained`; false if already consumed or never enqueued
    fn try_consume(&self) -> bool {
        self.link
            .compare_exchange(
                LinkState::Linked as u8,
                LinkState::Drained as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Replay the call against its target, at most once
    ///
    /// Returns `Ok(false)` when the event was already consumed.
    pub fn consume(&self) -> Result<bool> {
        if !self.try_consume() {
            return Ok(false);
        }
        self.target
            .replay(self.payload.stamped(self.context.timestamp))?;
        Ok(true)
    }
}

impl fmt::Debug for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEvent")
            .field("target", &self.target.target_name())
            .field("payload", &self.payload)
            .field("thread", &self.context.thread_label())
            .field("link", &self.link_state())
            .finish()
    }
}
