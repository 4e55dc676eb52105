pub mod alerts;
pub mod control;
pub mod error;
pub mod grouping;
pub mod manager;
pub mod metrics;
pub mod monitor;
pub mod network;
pub mod process;
pub mod table;

#[cfg(test)]
mod tests;

pub use alerts::{Alert, AlertCategory, AlertEvaluator, AlertLevel, AlertRule};
pub use control::{CachePurger, NixSignalSender, SignalSender, SystemCachePurger};
pub use error::{ResmonError, Result};
pub use grouping::{AppRule, AppRules, SortKey, APP_RULES_VERSION};
pub use manager::ProcessManager;
pub use metrics::*;
pub use monitor::{HostProbe, MetricSampler, SysinfoProbe};
pub use network::{CounterReading, NetworkRateTracker};
pub use process::{KillOutcome, KillRequest, KillSignal, ProcessGroup, ProcessInfo, ProcessRecord, RawProcess};
pub use table::{ProcessTable, SysinfoProcessTable};
