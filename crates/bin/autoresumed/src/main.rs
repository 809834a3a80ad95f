//! # autoresumed — autoresume daemon
//!
//! Composition root that wires the scheduler to a host document and runs it.
//!
//! ## Responsibilities
//! - Load configuration (`autoresume.toml`, env vars)
//! - Initialize logging
//! - Start the simulated host rendering into a `VirtualDocument`
//! - Construct the scheduler and run its event loop
//! - Serve the operator console on stdin
//! - Handle graceful shutdown (ctrl-c or `quit`), removing the control
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod console;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use autoresume_adapter_virtual_dom::{SimulatedHost, VirtualDocument};
use autoresume_app::ports::MonotonicClock;
use autoresume_app::scheduler::Scheduler;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Host
    let document = Arc::new(VirtualDocument::new());
    let host = SimulatedHost::start(Arc::clone(&document), config.demo);

    // Scheduler
    let (scheduler, handle) = Scheduler::new(
        Arc::clone(&document),
        MonotonicClock::new(),
        config.automation,
        config.layout,
    )?;
    let mut scheduler = tokio::spawn(scheduler.run());

    // Console
    let console = tokio::spawn(console::run(console::stdin_lines(), handle.clone()));
    eprintln!("autoresumed running; type `status`, `toggle`, `reset` or `quit`");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("interrupt received, shutting down");
            let _ = handle.shutdown().await;
            scheduler.await?;
        }
        result = &mut scheduler => result?,
    }

    console.abort();
    host.abort();
    tracing::info!(nodes = document.node_count(), "autoresumed stopped");
    Ok(())
}
