use crate::control::{CachePurger, NixSignalSender, SignalSender, SystemCachePurger};
use crate::error::Result;
use crate::grouping::{sort_and_limit, AppRules, SortKey};
use crate::process::{KillOutcome, KillRequest, ProcessInfo};
use crate::table::{ProcessTable, SysinfoProcessTable};
use tracing::{debug, info, warn};

/// Process listing and control actions.
pub struct ProcessManager {
    table: Box<dyn ProcessTable>,
    signals: Box<dyn SignalSender>,
    purger: Box<dyn CachePurger>,
    rules: AppRules,
}

impl ProcessManager {
    pub fn new(
        table: Box<dyn ProcessTable>,
        signals: Box<dyn SignalSender>,
        purger: Box<dyn CachePurger>,
    ) -> Self {
        Self {
            table,
            signals,
            purger,
            rules: AppRules::builtin(),
        }
    }

    /// Manager over the local host's process table.
    pub fn system() -> Self {
        Self::new(
            Box::new(SysinfoProcessTable::new()),
            Box::new(NixSignalSender),
            Box::new(SystemCachePurger),
        )
    }

    pub fn with_rules(mut self, rules: AppRules) -> Self {
        self.rules = rules;
        self
    }

    /// Top `limit` processes by `sort`, optionally merged per application.
    pub fn list_processes(
        &self,
        sort: SortKey,
        limit: usize,
        grouped: bool,
    ) -> Result<Vec<ProcessInfo>> {
        let raw = self.table.processes()?;
        let total = raw.len();

        let records: Vec<_> = raw.iter().filter_map(|p| p.to_record()).collect();
        debug!("listed {} processes, {} usable", total, records.len());

        let entries: Vec<ProcessInfo> = if grouped {
            self.rules
                .group(records)
                .into_iter()
                .map(ProcessInfo::Group)
                .collect()
        } else {
            records.into_iter().map(ProcessInfo::Single).collect()
        };

        Ok(sort_and_limit(entries, sort, limit))
    }

    /// Signals `req.pid`, after its direct children when requested.
    ///
    /// Child failures are logged and reported in the outcome; only a failure
    /// to signal the target itself is an error.
    pub fn kill_process(&self, req: &KillRequest) -> Result<KillOutcome> {
        req.validate()?;
        let signal = req.signal();

        let mut outcome = KillOutcome {
            pid: req.pid,
            signal,
            children_signalled: Vec::new(),
            children_failed: Vec::new(),
        };

        if req.include_children {
            match self.table.processes() {
                Ok(processes) => {
                    for child in processes.iter().filter(|p| p.parent_pid == Some(req.pid)) {
                        match self.signals.send(child.pid, signal) {
                            Ok(()) => outcome.children_signalled.push(child.pid),
                            Err(e) => {
                                warn!("failed to signal child {} of {}: {}", child.pid, req.pid, e);
                                outcome.children_failed.push(child.pid);
                            }
                        }
                    }
                }
                Err(e) => warn!("could not look up children of {}: {}", req.pid, e),
            }
        }

        self.signals.send(req.pid, signal)?;
        info!(
            "sent {:?} to {} ({} children)",
            signal,
            req.pid,
            outcome.children_signalled.len()
        );

        Ok(outcome)
    }

    pub fn purge_cache(&self) -> Result<()> {
        self.purger.purge()?;
        info!("purged file cache");
        Ok(())
    }
}
