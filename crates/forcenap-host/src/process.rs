//! Process tree discovery
//!
//! Linux reads parent pids from procfs. Other Unix systems ask `pgrep -P`.

use forcenap_core::{HostError, Pid, ProcessTable};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTree;

impl ProcessTable for ProcessTree {
    fn children_of(&self, pid: Pid) -> Result<Vec<Pid>, HostError> {
        children_of(pid)
    }

    fn is_running(&self, pid: Pid) -> bool {
        is_running(pid)
    }

    fn parent_of(&self, pid: Pid) -> Option<Pid> {
        parent_of(pid)
    }
}

#[cfg(target_os = "linux")]
fn children_of(pid: Pid) -> Result<Vec<Pid>, HostError> {
    let entries = std::fs::read_dir("/proc")
        .map_err(|e| HostError::Query(format!("Failed to read /proc: {}", e)))?;

    let mut children = Vec::new();
    for entry in entries.flatten() {
        let Some(candidate) = entry.file_name().to_str().and_then(|s| s.parse::<Pid>().ok()) else {
            continue;
        };
        // Processes may exit while we scan
        let Ok(stat) = std::fs::read_to_string(entry.path().join("stat")) else {
            continue;
        };
        if parse_stat_ppid(&stat) == Some(pid) {
            children.push(candidate);
        }
    }
    children.sort_unstable();
    Ok(children)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn children_of(pid: Pid) -> Result<Vec<Pid>, HostError> {
    use std::process::Command;

    let output = Command::new("pgrep")
        .args(["-P", &pid.to_string()])
        .output()
        .map_err(|e| HostError::Query(format!("Failed to run pgrep: {}", e)))?;

    // pgrep exits with 1 when nothing matched
    match output.status.code() {
        Some(0) | Some(1) => Ok(parse_pid_list(&output.stdout)),
        _ => Err(HostError::Query(format!(
            "pgrep -P {} failed: {}",
            pid,
            String::from_utf8_lossy(&output.stderr).trim()
        ))),
    }
}

#[cfg(not(unix))]
fn children_of(_pid: Pid) -> Result<Vec<Pid>, HostError> {
    Err(HostError::Unsupported)
}

#[cfg(target_os = "linux")]
fn parent_of(pid: Pid) -> Option<Pid> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    parse_stat_ppid(&stat)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn parent_of(pid: Pid) -> Option<Pid> {
    use std::process::Command;

    let output = Command::new("ps")
        .args(["-o", "ppid=", "-p", &pid.to_string()])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_pid_list(&output.stdout).first().copied()
}

#[cfg(not(unix))]
fn parent_of(_pid: Pid) -> Option<Pid> {
    None
}

#[cfg(unix)]
fn is_running(pid: Pid) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid as NixPid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }

    // Signal 0 only checks for existence. EPERM means it exists but is not ours.
    match kill(NixPid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_running(_pid: Pid) -> bool {
    true
}

/// Parent pid from the contents of `/proc/<pid>/stat`
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_stat_ppid(stat: &str) -> Option<Pid> {
    // The command name is in parentheses and may itself contain spaces or ')'
    let after_comm = &stat[stat.rfind(')')? + 1..];
    let mut fields = after_comm.split_whitespace();
    let _state = fields.next()?;
    fields.next()?.parse().ok()
}

/// Whitespace separated pids, as printed by pgrep and ps
#[cfg_attr(target_os = "linux", allow(dead_code))]
fn parse_pid_list(output: &[u8]) -> Vec<Pid> {
    String::from_utf8_lossy(output)
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect()
}
