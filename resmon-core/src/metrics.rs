use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub usage_percent: f32,
    pub core_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub usage_percent: f64,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub total_gb: f64,
    pub used_gb: f64,
    pub available_gb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskMetrics {
    pub usage_percent: f64,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
}

/// Per-second network throughput derived from two counter readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRate {
    pub bytes_sent_per_sec: u64,
    pub bytes_recv_per_sec: u64,
}

/// One point-in-time reading of host metrics.
///
/// A group is `None` when the OS could not provide it, which is distinct
/// from a group that reads as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub cpu: Option<CpuMetrics>,
    pub memory: Option<MemoryMetrics>,
    pub disk: Option<DiskMetrics>,
    pub network: Option<NetworkRate>,
}

impl MemoryMetrics {
    pub fn from_totals(total_bytes: u64, used_bytes: u64, available_bytes: u64) -> Self {
        Self {
            usage_percent: percent(used_bytes, total_bytes),
            total_bytes,
            used_bytes,
            available_bytes,
            total_gb: gibibytes(total_bytes),
            used_gb: gibibytes(used_bytes),
            available_gb: gibibytes(available_bytes),
        }
    }
}

impl DiskMetrics {
    pub fn from_capacity(total_bytes: u64, free_bytes: u64) -> Self {
        let used_bytes = total_bytes.saturating_sub(free_bytes);
        Self {
            usage_percent: percent(used_bytes, total_bytes),
            total_bytes,
            used_bytes,
            free_bytes,
            total_gb: gibibytes(total_bytes),
            used_gb: gibibytes(used_bytes),
            free_gb: gibibytes(free_bytes),
        }
    }
}

fn gibibytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0 * 1024.0)
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl Default for SystemSnapshot {
    fn default() -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            cpu: None,
            memory: None,
            disk: None,
            network: None,
        }
    }
}
