//! Target location: resolving a running service process by name hint.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// Scope under which resource numbers were measured. Two aggregates with
/// different scopes are not directly comparable — a system-wide sample
/// includes every unrelated process on the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementScope {
    ProcessScoped,
    SystemScoped,
}

impl fmt::Display for MeasurementScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProcessScoped => write!(f, "process"),
            Self::SystemScoped => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Process,
    System,
    NotFound,
}

/// What gets measured: a single process, the whole machine, or nothing
/// (locator miss — callers must check before sampling).
#[derive(Debug, Clone)]
pub struct Target {
    pub kind: TargetKind,
    pub pid: Option<Pid>,
    pub label: String,
}

impl Target {
    pub fn process(pid: Pid, label: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Process,
            pid: Some(pid),
            label: label.into(),
        }
    }

    pub fn system(label: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::System,
            pid: None,
            label: label.into(),
        }
    }

    pub fn not_found(label: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::NotFound,
            pid: None,
            label: label.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self.kind, TargetKind::NotFound)
    }

    pub fn scope(&self) -> MeasurementScope {
        match self.kind {
            TargetKind::System => MeasurementScope::SystemScoped,
            _ => MeasurementScope::ProcessScoped,
        }
    }
}

/// Resolve a running process by name hint.
///
/// Matches if the short process name or any command-line token contains
/// `name_hint` case-insensitively. First match in ascending-pid order
/// wins. Never fails — a miss is `Target { kind: NotFound }`.
pub fn locate(name_hint: &str) -> Target {
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
    );

    // The harness's own argv contains the hint, so skip ourselves.
    let own_pid = Pid::from_u32(std::process::id());

    let mut pids: Vec<Pid> = sys.processes().keys().copied().collect();
    pids.sort_unstable();

    for pid in pids {
        if pid == own_pid {
            continue;
        }
        let Some(process) = sys.process(pid) else {
            continue;
        };
        let name = process.name().to_string_lossy();
        if matches_hint(&name, process.cmd(), name_hint) {
            return Target::process(pid, name.to_string());
        }
    }

    Target::not_found(name_hint)
}

fn matches_hint(name: &str, cmd: &[OsString], hint: &str) -> bool {
    let hint = hint.trim().to_lowercase();
    if hint.is_empty() {
        return false;
    }
    if name.to_lowercase().contains(&hint) {
        return true;
    }
    cmd.iter()
        .any(|token| token.to_string_lossy().to_lowercase().contains(&hint))
}
