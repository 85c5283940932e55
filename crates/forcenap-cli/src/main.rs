//! ForceNap CLI
//!
//! Lists running applications and controls the background daemon.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use forcenap_core::{
    AllowList, ApplicationIdentity, Config, FocusSource, ProcessGroupResolver, ProcessTable,
};
use forcenap_host::{HostFocus, ProcessTree};
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

const DAEMON: &str = "forcenapd";

#[derive(Parser)]
#[command(name = "forcenap")]
#[command(about = "Suspend background applications while they are out of focus")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show running applications and their process groups
    Apps {
        /// Config file used for the do not suspend list
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show daemon status
    Status,

    /// Start the daemon
    Start {
        /// Applications to track
        apps: Vec<String>,
    },

    /// Stop the daemon, resuming everything it suspended
    Stop,
}

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "PID")]
    pid: u32,
    #[tabled(rename = "Processes")]
    processes: usize,
    #[tabled(rename = "Focused")]
    focused: String,
    #[tabled(rename = "Protected")]
    protected: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("forcenap=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apps { config } => {
            let config = match config {
                Some(path) => Config::load(path)?,
                None => Config::load_default()?,
            };
            show_apps(&config.allow())
        }
        Commands::Status => show_daemon_status(),
        Commands::Start { apps } => start_daemon(&apps),
        Commands::Stop => stop_daemon(),
    }
}

fn show_apps(allow: &AllowList) -> Result<()> {
    let apps = HostFocus
        .running_apps()
        .context("Failed to list running applications")?;

    if apps.is_empty() {
        println!("\n{}", "No applications found.".yellow());
        return Ok(());
    }

    let focused = match HostFocus.focused_app() {
        Ok(focused) => focused,
        Err(e) => {
            tracing::debug!("Could not query focus: {}", e);
            None
        }
    };

    println!("\n{}", "Running Applications".bold().cyan());
    println!("{}", "─".repeat(60));

    let resolver = ProcessGroupResolver::new(ProcessTree);
    let rows = app_rows(apps, focused.as_ref(), &resolver, allow);
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    Ok(())
}

fn app_rows<P: ProcessTable>(
    mut apps: Vec<ApplicationIdentity>,
    focused: Option<&ApplicationIdentity>,
    resolver: &ProcessGroupResolver<P>,
    allow: &AllowList,
) -> Vec<AppRow> {
    apps.sort_by(|a, b| a.name.cmp(&b.name).then(a.pid.cmp(&b.pid)));

    let mark = |yes: bool| if yes { "yes".to_string() } else { String::new() };
    apps.into_iter()
        .map(|app| AppRow {
            processes: resolver.resolve(&app).len(),
            focused: mark(focused == Some(&app)),
            protected: mark(allow.contains(&app.name)),
            pid: app.pid,
            app: app.name.to_string(),
        })
        .collect()
}

#[cfg(unix)]
fn daemon_pids() -> Vec<String> {
    use std::process::Command;

    match Command::new("pgrep").args(["-x", DAEMON]).output() {
        Ok(out) => String::from_utf8_lossy(&out.stdout)
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(windows)]
fn daemon_pids() -> Vec<String> {
    use std::process::Command;

    let image = format!("{}.exe", DAEMON);
    match Command::new("tasklist")
        .args(["/FI", &format!("IMAGENAME eq {}", image), "/NH"])
        .output()
    {
        Ok(out) => String::from_utf8_lossy(&out.stdout)
            .lines()
            .filter(|line| line.starts_with(&image))
            .filter_map(|line| line.split_whitespace().nth(1).map(str::to_string))
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn show_daemon_status() -> Result<()> {
    let pids = daemon_pids();
    if pids.is_empty() {
        println!("{}", "✗ Daemon is not running".red());
    } else {
        println!("{} (PID: {})", "✓ Daemon is running".green(), pids.join(", "));
    }
    Ok(())
}

fn start_daemon(apps: &[String]) -> Result<()> {
    use std::process::{Command, Stdio};

    if !daemon_pids().is_empty() {
        println!("{}", "Daemon is already running".yellow());
        return Ok(());
    }

    // Without a terminal the daemon can only be told what to track up front
    let result = Command::new(DAEMON)
        .args(apps)
        .arg("--no-stdin")
        .stdin(Stdio::null())
        .spawn();

    match result {
        Ok(child) => println!("{} (PID: {})", "✓ Daemon started".green(), child.id()),
        Err(e) => println!("{}: {}", "✗ Failed to start daemon".red(), e),
    }

    Ok(())
}

fn stop_daemon() -> Result<()> {
    use std::process::Command;

    // SIGTERM goes through the daemon's cleanup path; never force-kill it
    #[cfg(unix)]
    let result = Command::new("pkill").args(["-TERM", "-x", DAEMON]).output();

    #[cfg(windows)]
    let result = Command::new("taskkill")
        .args(["/IM", &format!("{}.exe", DAEMON)])
        .output();

    match result {
        Ok(out) if out.status.success() => {
            println!("{}", "✓ Daemon stopped".green());
        }
        _ => {
            println!("{}", "Daemon was not running".yellow());
        }
    }

    Ok(())
}
