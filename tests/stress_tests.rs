//! Stress tests for concurrent bootstrap use
//!
//! These tests verify:
//! - Logger lookup and resolution hand every thread the same instance
//! - Backend detection probes the providers once
//! - No event is lost or duplicated while readiness flips mid-stream
//! - Per-thread order survives the switch from deferred to direct calls

mod common;

use common::{configured, default_provider, RecordingFinder};
use rust_bootstrap_logger::bootstrap::BackendClassifier;
use rust_bootstrap_logger::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 8;

fn shared_bootstrap(finder: &RecordingFinder) -> Arc<Bootstrap> {
    Arc::new(
        Bootstrap::builder()
            .config(configured())
            .providers(default_provider(finder))
            .publisher(Arc::new(BufferPublisher::new()))
            .build(),
    )
}

#[test]
fn test_concurrent_lookup_returns_same_handle() {
    let finder = RecordingFinder::new();
    let bootstrap = shared_bootstrap(&finder);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let bootstrap = Arc::clone(&bootstrap);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                bootstrap.get_logger("shared.lookup", &UnitHandle::system())
            })
        })
        .collect();

    let loggers: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("lookup thread panicked"))
        .collect();

    for logger in &loggers[1..] {
        assert!(Arc::ptr_eq(&loggers[0], logger));
    }
    assert_eq!(bootstrap.logger_names(), vec!["shared.lookup"]);
}

#[test]
fn test_concurrent_resolution_agrees_on_one_logger() {
    let finder = RecordingFinder::new();
    let bootstrap = shared_bootstrap(&finder);
    bootstrap.mark_ready();
    let logger = bootstrap.get_logger("shared.resolve", &UnitHandle::system());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let logger = Arc::clone(&logger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let resolved = logger.accessor().wrapped().expect("resolution failed");
                Arc::as_ptr(&resolved) as *const () as usize
            })
        })
        .collect();

    let addresses: Vec<usize> = handles
        .into_iter()
        .map(|h| h.join().expect("resolution thread panicked"))
        .collect();

    assert!(addresses.iter().all(|a| *a == addresses[0]));
    let current = logger.accessor().current().expect("logger stored");
    assert_eq!(Arc::as_ptr(&current) as *const () as usize, addresses[0]);

    // Racing callers may each build a candidate; only one is ever handed out
    let created = finder.created.load(Ordering::SeqCst);
    assert!(
        (1..=THREADS).contains(&created),
        "factory ran {} times",
        created
    );
}

#[test]
fn test_detection_probes_once() {
    let finder = RecordingFinder::new();
    let registry = default_provider(&finder);
    let classifier = Arc::new(BackendClassifier::new(registry.clone(), false));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let classifier = Arc::clone(&classifier);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                classifier.kind()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(
            handle.join().expect("detection thread panicked"),
            BackendKind::DefaultUnconfigured
        );
    }
    assert_eq!(registry.probe_count(), 1);
    assert_eq!(classifier.detections(), 1);
    assert_eq!(registry.instantiation_count(), 0);
}

#[test]
fn test_no_loss_while_readiness_flips() {
    const PER_THREAD: usize = 200;

    let finder = RecordingFinder::new();
    let bootstrap = shared_bootstrap(&finder);
    let logger = bootstrap.get_logger("shared.flip", &UnitHandle::system());
    let barrier = Arc::new(Barrier::new(THREADS + 1));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for k in 0..PER_THREAD {
                    logger.log(Level::Info, format!("{}:{}", t, k));
                    if k % 50 == 0 {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    barrier.wait();
    thread::sleep(Duration::from_millis(2));
    bootstrap.mark_ready();

    for handle in handles {
        handle.join().expect("logging thread panicked");
    }
    bootstrap.flush().unwrap();

    let messages = finder.messages();
    assert_eq!(messages.len(), THREADS * PER_THREAD);

    let mut next: HashMap<usize, usize> = HashMap::new();
    for message in &messages {
        let (thread_id, seq) = message
            .split_once(':')
            .map(|(t, k)| (t.parse::<usize>().unwrap(), k.parse::<usize>().unwrap()))
            .expect("malformed message");
        let expected = next.entry(thread_id).or_insert(0);
        assert_eq!(seq, *expected, "thread {} out of order", thread_id);
        *expected += 1;
    }
    assert!(next.values().all(|n| *n == PER_THREAD));

    let metrics = bootstrap.metrics();
    assert_eq!(metrics.events_deferred(), metrics.events_replayed());
    assert_eq!(metrics.replay_failures(), 0);
    assert_eq!(bootstrap.deferred_len(), 0);
}

#[test]
fn test_concurrent_flush_replays_each_event_once() {
    const EVENTS: usize = 500;

    let finder = RecordingFinder::new();
    let bootstrap = shared_bootstrap(&finder);
    let logger = bootstrap.get_logger("shared.flush", &UnitHandle::system());

    for i in 0..EVENTS {
        logger.log(Level::Warning, format!("deferred {}", i));
    }
    assert_eq!(bootstrap.deferred_len(), EVENTS);

    bootstrap.mark_ready();
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let bootstrap = Arc::clone(&bootstrap);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                bootstrap.flush()
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("flush thread panicked").unwrap();
    }

    let expected: Vec<String> = (0..EVENTS).map(|i| format!("deferred {}", i)).collect();
    assert_eq!(finder.messages(), expected);
    assert_eq!(bootstrap.metrics().events_replayed(), EVENTS as u64);
}
