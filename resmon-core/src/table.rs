use crate::error::{ResmonError, Result};
use crate::process::RawProcess;
use parking_lot::Mutex;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System};

/// Enumerates the live processes on the host.
pub trait ProcessTable: Send + Sync {
    /// All live processes, ordered by PID.
    fn processes(&self) -> Result<Vec<RawProcess>>;
}

/// `ProcessTable` backed by sysinfo.
///
/// The `System` is kept between calls so per-process CPU usage is measured
/// over the interval since the previous listing.
pub struct SysinfoProcessTable {
    system: Mutex<System>,
}

impl SysinfoProcessTable {
    pub fn new() -> Self {
        let mut system = System::new();
        refresh(&mut system);
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

fn refresh(system: &mut System) {
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::everything(),
    );
}

impl ProcessTable for SysinfoProcessTable {
    fn processes(&self) -> Result<Vec<RawProcess>> {
        let mut system = self.system.lock();
        refresh(&mut system);

        let real_pids = live_pids()?;

        let mut processes: Vec<RawProcess> = system
            .processes()
            .iter()
            .filter(|(pid, _)| real_pids.as_ref().map_or(true, |set| set.contains(&to_i32(**pid))))
            .map(|(pid, process)| to_raw(*pid, process))
            .collect();

        if processes.is_empty() {
            return Err(ResmonError::Enumeration("process table is empty".to_string()));
        }

        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }
}

/// PIDs listed under /proc. Thread IDs are reachable as /proc/<tid> but are
/// not part of the directory listing, so this drops sysinfo's task entries.
#[cfg(target_os = "linux")]
fn live_pids() -> Result<Option<std::collections::HashSet<i32>>> {
    let iter = procfs::process::all_processes()
        .map_err(|e| ResmonError::Enumeration(e.to_string()))?;
    Ok(Some(iter.filter_map(|p| p.ok()).map(|p| p.pid).collect()))
}

#[cfg(not(target_os = "linux"))]
fn live_pids() -> Result<Option<std::collections::HashSet<i32>>> {
    Ok(None)
}

fn to_i32(pid: Pid) -> i32 {
    pid.as_u32() as i32
}

fn to_raw(pid: Pid, process: &Process) -> RawProcess {
    let memory_bytes = resident_memory(process.memory(), process.virtual_memory(), || {
        statm_resident(to_i32(pid))
    });

    RawProcess {
        pid: to_i32(pid),
        parent_pid: process.parent().map(to_i32),
        name: process.name().to_string_lossy().to_string(),
        exe_path: process.exe().map(|p| p.to_path_buf()),
        command_line: process
            .cmd()
            .iter()
            .map(|s| s.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" "),
        cpu_percent: Some(process.cpu_usage()),
        memory_bytes,
    }
}

/// Resident bytes, or `None` when the process could not be inspected.
///
/// sysinfo reports zero for both sizes when inspection fails, but kernel
/// threads read as zero too, so that combination is settled by `confirm`.
fn resident_memory(rss: u64, virt: u64, confirm: impl FnOnce() -> Option<u64>) -> Option<u64> {
    match (rss, virt) {
        (0, 0) => confirm(),
        (rss, _) => Some(rss),
    }
}

#[cfg(target_os = "linux")]
fn statm_resident(pid: i32) -> Option<u64> {
    let statm = procfs::process::Process::new(pid)
        .and_then(|p| p.statm())
        .ok()?;
    Some(statm.resident * procfs::page_size())
}

#[cfg(not(target_os = "linux"))]
fn statm_resident(_pid: i32) -> Option<u64> {
    None
}
