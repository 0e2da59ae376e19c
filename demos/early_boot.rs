//! Early boot example
//!
//! Demonstrates logging before the backend exists: calls are captured during
//! startup, replayed once startup completes, and surrogates are redirected to
//! the real backend when it is configured.
//!
//! Run with: cargo run --example early_boot

use rust_bootstrap_logger::prelude::*;
use rust_bootstrap_logger::{info, warn};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Bootstrap Logger - Early Boot Example ===\n");

    // The default backend is present but not configured yet
    let registry = Arc::new(ProviderRegistry::new());
    registry.set_default("console", || {
        Ok(ConsoleFinder::new(
            Level::Debug,
            Arc::new(ConsolePublisher::new().with_format("[backend] {level} {logger}: {message}")),
        ))
    });

    let bootstrap = Bootstrap::builder()
        .config(BootstrapConfig::default())
        .providers(registry)
        .build();

    println!("1. Logging during startup (deferred):");
    let boot = bootstrap.get_logger("app.boot", &UnitHandle::system());
    info!(boot, "loading modules");
    for i in 0..3 {
        boot.log(Level::Info, format!("module {} loaded", i));
        thread::sleep(Duration::from_millis(5));
    }
    println!("   {} event(s) waiting for replay", bootstrap.deferred_len());

    println!("\n2. Startup complete, replaying:");
    bootstrap.mark_ready();
    bootstrap.flush()?;
    println!("   backend kind: {}", bootstrap.kind());
    println!("   replayed: {}", bootstrap.metrics().events_replayed());

    println!("\n3. Logging through a surrogate:");
    let net = bootstrap.get_logger("app.net", &UnitHandle::system());
    net.set_level(Some(PlatformLevel::Fine));
    net.log(Level::Debug, "surrogate honours its own threshold");
    warn!(net, "backend not configured yet");
    println!("   surrogates in use: {}", bootstrap.uses_surrogate());

    println!("\n4. Backend configured, redirecting:");
    let report = bootstrap.backend_configured()?;
    println!(
        "   redirected {} logger(s), {} failed",
        report.redirected, report.failed
    );
    net.log(Level::Debug, "now on the real backend, threshold carried over");
    boot.log(Level::Info, "startup finished");

    println!("\n=== Example completed successfully ===");
    Ok(())
}
