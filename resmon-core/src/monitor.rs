use crate::error::{ResmonError, Result};
use crate::metrics::*;
use crate::network::{CounterReading, NetworkRateTracker};
use parking_lot::Mutex;
use std::path::Path;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};
use tracing::debug;

/// Source of raw host metrics. Each group is read independently.
pub trait HostProbe: Send + Sync {
    fn cpu(&self) -> Result<CpuMetrics>;
    fn memory(&self) -> Result<MemoryMetrics>;
    fn root_disk(&self) -> Result<DiskMetrics>;
    fn network_totals(&self) -> Result<CounterReading>;
}

/// `HostProbe` backed by long-lived sysinfo handles.
///
/// CPU usage from sysinfo is relative to the previous refresh, so keeping the
/// `System` around turns every read into a point sample since the last call.
pub struct SysinfoProbe {
    system: Mutex<System>,
    disks: Mutex<Disks>,
    networks: Mutex<Networks>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new().with_cpu_usage())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );

        Self {
            system: Mutex::new(system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }
}

impl HostProbe for SysinfoProbe {
    fn cpu(&self) -> Result<CpuMetrics> {
        let mut system = self.system.lock();
        system.refresh_cpu_usage();

        let core_count = system.cpus().len();
        if core_count == 0 {
            return Err(ResmonError::MetricUnavailable("cpu"));
        }

        Ok(CpuMetrics {
            usage_percent: system.global_cpu_usage(),
            core_count,
        })
    }

    fn memory(&self) -> Result<MemoryMetrics> {
        let mut system = self.system.lock();
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return Err(ResmonError::MetricUnavailable("memory"));
        }

        Ok(MemoryMetrics::from_totals(
            total,
            system.used_memory(),
            system.available_memory(),
        ))
    }

    fn root_disk(&self) -> Result<DiskMetrics> {
        let mut disks = self.disks.lock();
        disks.refresh();
        if disks.list().is_empty() {
            disks.refresh_list();
        }

        disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .filter(|disk| disk.total_space() > 0)
            .map(|disk| DiskMetrics::from_capacity(disk.total_space(), disk.available_space()))
            .ok_or(ResmonError::MetricUnavailable("disk"))
    }

    fn network_totals(&self) -> Result<CounterReading> {
        let mut networks = self.networks.lock();
        networks.refresh();
        if networks.iter().next().is_none() {
            networks.refresh_list();
        }

        if networks.iter().next().is_none() {
            return Err(ResmonError::MetricUnavailable("network"));
        }

        Ok(networks.iter().fold(CounterReading::default(), |acc, (_, data)| {
            CounterReading {
                sent_bytes: acc.sent_bytes.saturating_add(data.total_transmitted()),
                recv_bytes: acc.recv_bytes.saturating_add(data.total_received()),
            }
        }))
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds `SystemSnapshot`s from a probe, owning the network baseline.
pub struct MetricSampler {
    probe: Box<dyn HostProbe>,
    rates: NetworkRateTracker,
}

impl MetricSampler {
    pub fn new(probe: Box<dyn HostProbe>) -> Self {
        Self {
            probe,
            rates: NetworkRateTracker::new(),
        }
    }

    /// Sampler over the local host.
    pub fn system() -> Self {
        Self::new(Box::new(SysinfoProbe::new()))
    }

    /// Takes a throwaway sample so the first client request already has a
    /// CPU and network baseline to compare against.
    pub fn prime(&self) {
        let _ = self.sample();
    }

    pub fn sample(&self) -> SystemSnapshot {
        SystemSnapshot {
            timestamp: chrono::Utc::now(),
            cpu: available(self.probe.cpu()),
            memory: available(self.probe.memory()),
            disk: available(self.probe.root_disk()),
            network: available(self.rates.sample_with(|| self.probe.network_totals())),
        }
    }
}

fn available<T>(reading: Result<T>) -> Option<T> {
    match reading {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("skipping metric group: {}", e);
            None
        }
    }
}
