use crate::error::{ResmonError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Names such as "2.1.17" that some runtimes report instead of the binary name.
static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+(\.\d+)?$").expect("Invalid version pattern regex"));

/// A process as reported by the OS, before any naming heuristics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProcess {
    pub pid: i32,
    pub parent_pid: Option<i32>,
    pub name: String,
    pub exe_path: Option<PathBuf>,
    pub command_line: String,
    pub cpu_percent: Option<f32>,
    pub memory_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: i32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

/// Several processes merged under one application name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessGroup {
    /// PID of the first process that seeded the group.
    pub pid: i32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_mb: f64,
    pub child_count: usize,
    pub child_pids: Vec<i32>,
    pub is_grouped: bool,
}

/// One row of a process listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessInfo {
    Group(ProcessGroup),
    Single(ProcessRecord),
}

impl ProcessInfo {
    pub fn pid(&self) -> i32 {
        match self {
            ProcessInfo::Single(p) => p.pid,
            ProcessInfo::Group(g) => g.pid,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ProcessInfo::Single(p) => &p.name,
            ProcessInfo::Group(g) => &g.name,
        }
    }

    pub fn cpu_percent(&self) -> f32 {
        match self {
            ProcessInfo::Single(p) => p.cpu_percent,
            ProcessInfo::Group(g) => g.cpu_percent,
        }
    }

    pub fn memory_mb(&self) -> f64 {
        match self {
            ProcessInfo::Single(p) => p.memory_mb,
            ProcessInfo::Group(g) => g.memory_mb,
        }
    }
}

impl ProcessGroup {
    pub fn seed(name: String, record: &ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            name,
            cpu_percent: record.cpu_percent,
            memory_mb: record.memory_mb,
            child_count: 1,
            child_pids: vec![record.pid],
            is_grouped: true,
        }
    }

    pub fn absorb(&mut self, record: &ProcessRecord) {
        self.cpu_percent += record.cpu_percent;
        self.memory_mb += record.memory_mb;
        self.child_count += 1;
        self.child_pids.push(record.pid);
    }
}

impl RawProcess {
    /// Converts to a listing record, or `None` when the process has no usable
    /// name or its memory could not be read.
    pub fn to_record(&self) -> Option<ProcessRecord> {
        let name = resolve_name(self);
        if name.is_empty() {
            return None;
        }
        let memory_bytes = self.memory_bytes?;

        Some(ProcessRecord {
            pid: self.pid,
            name,
            cpu_percent: self.cpu_percent.unwrap_or(0.0),
            memory_mb: memory_bytes as f64 / (1024.0 * 1024.0),
        })
    }
}

pub fn looks_like_version(name: &str) -> bool {
    VERSION_PATTERN.is_match(name)
}

/// Best-effort human-readable name for a process.
///
/// Falls back to the executable's file name, then to the first token of the
/// command line, while the reported name is empty or a bare version string.
pub fn resolve_name(process: &RawProcess) -> String {
    let mut name = process.name.clone();

    if name.is_empty() || looks_like_version(&name) {
        if let Some(base) = process.exe_path.as_deref().and_then(base_name) {
            name = base;
        }
    }

    if looks_like_version(&name) {
        if let Some(base) = process
            .command_line
            .split_whitespace()
            .next()
            .and_then(|first| base_name(Path::new(first)))
        {
            name = base;
        }
    }

    name
}

fn base_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KillSignal {
    Sigterm,
    Sigkill,
}

impl From<KillSignal> for nix::sys::signal::Signal {
    fn from(signal: KillSignal) -> Self {
        match signal {
            KillSignal::Sigterm => nix::sys::signal::Signal::SIGTERM,
            KillSignal::Sigkill => nix::sys::signal::Signal::SIGKILL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillRequest {
    #[serde(default)]
    pub pid: i32,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub include_children: bool,
}

impl KillRequest {
    pub fn validate(&self) -> Result<()> {
        if self.pid <= 0 {
            return Err(ResmonError::InvalidPid(self.pid));
        }
        Ok(())
    }

    pub fn signal(&self) -> KillSignal {
        if self.force {
            KillSignal::Sigkill
        } else {
            KillSignal::Sigterm
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillOutcome {
    pub pid: i32,
    pub signal: KillSignal,
    pub children_signalled: Vec<i32>,
    pub children_failed: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> RawProcess {
        RawProcess {
            pid: 42,
            name: name.to_string(),
            memory_bytes: Some(0),
            ..RawProcess::default()
        }
    }

    #[test]
    fn plain_name_is_kept() {
        let mut p = raw("nginx");
        p.exe_path = Some(PathBuf::from("/usr/sbin/other"));
        assert_eq!(resolve_name(&p), "nginx");
    }

    #[test]
    fn version_name_falls_back_to_exe() {
        let mut p = raw("2.1.17");
        p.exe_path = Some(PathBuf::from("/opt/homebrew/bin/claude"));
        assert_eq!(resolve_name(&p), "claude");
    }

    #[test]
    fn empty_name_falls_back_to_exe() {
        let mut p = raw("");
        p.exe_path = Some(PathBuf::from("/usr/bin/python3"));
        assert_eq!(resolve_name(&p), "python3");
    }

    #[test]
    fn version_exe_falls_back_to_command_line() {
        let mut p = raw("1.2");
        p.exe_path = Some(PathBuf::from("/nix/store/1.2"));
        p.command_line = "/usr/local/bin/node server.js --port 3000".to_string();
        assert_eq!(resolve_name(&p), "node");
    }

    #[test]
    fn version_name_without_alternatives_is_returned_as_is() {
        assert_eq!(resolve_name(&raw("3.11")), "3.11");
        assert_eq!(resolve_name(&raw("")), "");
    }

    #[test]
    fn version_pattern_is_anchored() {
        assert!(looks_like_version("2.1"));
        assert!(looks_like_version("2.1.17"));
        assert!(!looks_like_version("2"));
        assert!(!looks_like_version("2.1.17.4"));
        assert!(!looks_like_version("python3.11"));
    }

    #[test]
    fn record_requires_name_and_memory() {
        assert!(raw("").to_record().is_none());

        let mut no_mem = raw("bash");
        no_mem.memory_bytes = None;
        assert!(no_mem.to_record().is_none());

        let mut p = raw("bash");
        p.memory_bytes = Some(3 * 1024 * 1024);
        let record = p.to_record().unwrap();
        assert_eq!(record.cpu_percent, 0.0);
        assert_eq!(record.memory_mb, 3.0);
    }

    #[test]
    fn kill_request_rejects_non_positive_pid() {
        let req = KillRequest { pid: 0, force: false, include_children: false };
        assert!(matches!(req.validate(), Err(ResmonError::InvalidPid(0))));

        let req = KillRequest { pid: -7, force: true, include_children: false };
        assert!(req.validate().is_err());

        let req = KillRequest { pid: 1, force: true, include_children: false };
        assert!(req.validate().is_ok());
        assert_eq!(req.signal(), KillSignal::Sigkill);
    }

    #[test]
    fn kill_request_without_pid_decodes_as_invalid() {
        let req: KillRequest = serde_json::from_str(r#"{"force":true}"#).unwrap();
        assert_eq!(req.pid, 0);
        assert!(req.force);
        assert!(matches!(req.validate(), Err(ResmonError::InvalidPid(0))));
    }

    #[test]
    fn group_serializes_in_listing_shape() {
        let record = ProcessRecord { pid: 7, name: "Chrome".into(), cpu_percent: 1.0, memory_mb: 2.0 };
        let info = ProcessInfo::Group(ProcessGroup::seed("Chrome".into(), &record));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["pid"], 7);
        assert_eq!(json["child_count"], 1);
        assert_eq!(json["is_grouped"], true);

        let single = serde_json::to_value(ProcessInfo::Single(record)).unwrap();
        assert!(single.get("child_pids").is_none());
    }
}
