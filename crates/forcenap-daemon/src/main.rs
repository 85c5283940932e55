//! ForceNap Daemon
//!
//! Suspends tracked applications while they are out of focus. The poll loop
//! runs on its own thread; the main thread waits for Ctrl-C, SIGTERM or a
//! `quit` command and then resumes everything before exiting.

mod console;

use anyhow::{Context, Result};
use clap::Parser;
use console::Console;
use forcenap_core::{Config, FocusPoller, NapService, SuspendController};
use forcenap_host::{HostFocus, PosixSignals, ProcessTree};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "forcenapd")]
#[command(about = "Suspend tracked applications while they are not focused")]
#[command(version)]
struct Args {
    /// Applications to track from the start
    apps: Vec<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Extra applications that must never be suspended
    #[arg(short, long = "allow")]
    allow: Vec<String>,

    /// Do not read toggle commands from stdin
    #[arg(long)]
    no_stdin: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("forcenap=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(ms) = args.interval_ms {
        config.poll_interval_ms = ms;
    }
    config.allow_list.extend(args.allow);
    config.tracked.extend(args.apps);
    config.validate()?;

    info!("ForceNap daemon starting...");

    // Without a handler an interrupt would leave stopped processes behind
    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let interrupt_tx = shutdown_tx.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        let _ = interrupt_tx.send(());
    })
    .context("Failed to set Ctrl-C handler")?;

    let allow = config.allow();
    let controller = SuspendController::new(ProcessTree, PosixSignals, allow.clone());
    let policy = controller.policy_handle();
    for name in &config.tracked {
        if allow.contains(&name.as_str().into()) {
            warn!("{} is in the do not suspend list, not tracking it", name);
            continue;
        }
        info!("Tracking {}", name);
        policy.set_tracked(name.as_str(), true);
    }

    let poller = FocusPoller::new(HostFocus, config.app_list_every);
    let mut service = NapService::start(poller, controller, config.poll_interval())?;

    if !args.no_stdin {
        let mut console = Console::new(policy, allow, HostFocus, shutdown_tx);
        thread::Builder::new()
            .name("forcenap-console".to_string())
            .spawn(move || {
                if let Err(e) = console.run(io::stdin().lock(), io::stdout()) {
                    error!("Console error: {}", e);
                }
            })?;
        info!("Type 'help' for commands (press Ctrl+C to stop)...");
    } else {
        info!("Running (press Ctrl+C to stop)...");
    }

    let _ = shutdown_rx.recv();

    info!("Quitting with cleanup...");
    let report = service.stop()?;
    if !report.resumed.is_empty() {
        info!("Resumed {} processes", report.resumed.len());
    }
    for (pid, e) in &report.failed {
        error!("Could not resume {}: {}", pid, e);
    }

    info!("ForceNap daemon stopped");
    Ok(())
}
