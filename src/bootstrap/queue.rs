//! Deferred event queue
//!
//! Append/drain structure shared by every bootstrap proxy. The mutex is
//! held only to splice the chain, never while an event is replayed.

use super::event::LogEvent;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct DeferredQueue {
    chain: Mutex<Vec<Arc<LogEvent>>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self {
            chain: Mutex::new(Vec::new()),
        }
    }

    /// Append `event` to the tail of the queue
    ///
    /// Returns false, without queueing, if the event was already enqueued.
    pub fn enqueue(&self, event: Arc<LogEvent>) -> bool {
        let mut chain = self.chain.lock();
        if !event.try_link() {
            return false;
        }
        chain.push(event);
        true
    }

    /// Detach every queued event, leaving the queue empty
    pub fn drain_all(&self) -> DrainedChain {
        let events = std::mem::take(&mut *self.chain.lock());
        DrainedChain { events }
    }

    pub fn len(&self) -> usize {
        self.chain.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.lock().is_empty()
    }
}

/// Events detached from the queue, in enqueue order
#[derive(Debug, Default)]
pub struct DrainedChain {
    events: Vec<Arc<LogEvent>>,
}

/// Outcome of replaying a drained chain
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub replayed: usize,
    pub failed: usize,
}

impl DrainedChain {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Arc<LogEvent>] {
        &self.events
    }

    /// Replay every event in order; one failure never stops the walk
    pub fn replay_all(self) -> ReplayStats {
        let mut stats = ReplayStats::default();
        for event in self.events {
            match event.consume() {
                Ok(true) => stats.replayed += 1,
                Ok(false) => {}
                Err(e) => {
                    stats.failed += 1;
                    eprintln!(
                        "[BOOTSTRAP ERROR] Replay of deferred event for '{}' (thread {}) failed: {}",
                        event.target_name(),
                        event.context().thread_label(),
                        e
                    );
                }
            }
        }
        stats
    }
}

impl IntoIterator for DrainedChain {
    type Item = Arc<LogEvent>;
    type IntoIter = std::vec::IntoIter<Arc<LogEvent>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::event::{EventPayload, LinkState, ReplayTarget};
    use crate::core::{BootstrapError, Level, LogRecord, Result};

    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl ReplayTarget for Recorder {
        fn target_name(&self) -> &str {
            "recorder"
        }

        fn replay(&self, payload: EventPayload) -> Result<()> {
            let text = payload.render();
            if text == "boom" {
                return Err(BootstrapError::other("replay failure"));
            }
            self.seen.lock().push(text);
            Ok(())
        }
    }

    fn event(target: &Arc<Recorder>, msg: &str) -> Arc<LogEvent> {
        Arc::new(LogEvent::system(
            target.clone(),
            LogRecord::new(Level::Info, msg),
        ))
    }

    #[test]
    fn test_fifo_drain() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let queue = DeferredQueue::new();
        for msg in ["a", "b", "c"] {
            assert!(queue.enqueue(event(&recorder, msg)));
        }
        assert_eq!(queue.len(), 3);

        let chain = queue.drain_all();
        assert!(queue.is_empty());
        assert_eq!(chain.len(), 3);

        let stats = chain.replay_all();
        assert_eq!(stats, ReplayStats { replayed: 3, failed: 0 });
        assert_eq!(*recorder.seen.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_double_enqueue_is_noop() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let queue = DeferredQueue::new();
        let e = event(&recorder, "once");

        assert!(queue.enqueue(Arc::clone(&e)));
        assert!(!queue.enqueue(Arc::clone(&e)));
        assert_eq!(queue.len(), 1);

        let chain = queue.drain_all();
        // Still linked until consumed, so a racing enqueue cannot requeue it
        assert!(!queue.enqueue(Arc::clone(&e)));
        chain.replay_all();
        assert_eq!(e.link_state(), LinkState::Drained);
        assert!(!queue.enqueue(e));
        assert_eq!(recorder.seen.lock().len(), 1);
    }

    #[test]
    fn test_failure_does_not_stop_replay() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let queue = DeferredQueue::new();
        for msg in ["a", "boom", "c"] {
            queue.enqueue(event(&recorder, msg));
        }

        let stats = queue.drain_all().replay_all();
        assert_eq!(stats, ReplayStats { replayed: 2, failed: 1 });
        assert_eq!(*recorder.seen.lock(), vec!["a", "c"]);
    }
}
