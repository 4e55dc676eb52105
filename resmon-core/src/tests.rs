//! Checks against the live host rather than fakes.

use crate::grouping::SortKey;
use crate::manager::ProcessManager;
use crate::monitor::MetricSampler;
use crate::table::{ProcessTable, SysinfoProcessTable};
use std::collections::HashSet;

#[test]
fn test_live_snapshot_is_sane() {
    let sampler = MetricSampler::system();
    sampler.prime();
    std::thread::sleep(std::time::Duration::from_millis(200));
    let snapshot = sampler.sample();

    if let Some(cpu) = snapshot.cpu {
        assert!(cpu.core_count > 0);
        assert!(cpu.usage_percent.is_finite(), "CPU percent should always be finite");
    }

    let memory = snapshot.memory.expect("memory should be readable on a live host");
    assert!(memory.total_bytes > 0);
    assert!(memory.usage_percent >= 0.0 && memory.usage_percent <= 100.0);

    if let Some(disk) = snapshot.disk {
        assert!(disk.used_bytes <= disk.total_bytes);
    }
}

#[test]
fn test_own_process_is_listed() {
    let table = SysinfoProcessTable::new();
    let processes = table.processes().unwrap();

    let own = std::process::id() as i32;
    assert!(
        processes.iter().any(|p| p.pid == own),
        "PID {} of the test runner not found",
        own
    );

    let pids: HashSet<i32> = processes.iter().map(|p| p.pid).collect();
    assert_eq!(pids.len(), processes.len(), "duplicate PIDs in listing");

    let mut sorted = processes.iter().map(|p| p.pid).collect::<Vec<_>>();
    sorted.sort();
    assert_eq!(sorted, processes.iter().map(|p| p.pid).collect::<Vec<_>>());
}

#[cfg(target_os = "linux")]
#[test]
fn test_listed_pids_exist_in_proc() {
    let table = SysinfoProcessTable::new();
    let processes = table.processes().unwrap();

    let mut proc_pids = HashSet::new();
    if let Ok(entries) = std::fs::read_dir("/proc") {
        for entry in entries.flatten() {
            if let Ok(file_name) = entry.file_name().into_string() {
                if let Ok(pid) = file_name.parse::<i32>() {
                    proc_pids.insert(pid);
                }
            }
        }
    }

    let matched = processes.iter().filter(|p| proc_pids.contains(&p.pid)).count();
    let match_rate = matched as f64 / processes.len() as f64 * 100.0;
    // Allow for processes exiting between the two listings.
    assert!(
        match_rate > 90.0,
        "Only {:.1}% of listed PIDs matched /proc. Matched: {}/{}",
        match_rate,
        matched,
        processes.len()
    );
}

#[test]
fn test_live_listing_respects_limit() {
    let manager = ProcessManager::system();
    let list = manager.list_processes(SortKey::Memory, 3, false).unwrap();
    assert!(list.len() <= 3);
    assert!(list.windows(2).all(|w| w[0].memory_mb() >= w[1].memory_mb()));

    let grouped = manager.list_processes(SortKey::Cpu, 50, true).unwrap();
    let names: HashSet<&str> = grouped.iter().map(|p| p.name()).collect();
    assert_eq!(names.len(), grouped.len(), "group names must be unique");
}
