use crate::process::{ProcessGroup, ProcessInfo, ProcessRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bumped whenever `APP_RULES` or `STRIPPED_SUFFIXES` change.
pub const APP_RULES_VERSION: u32 = 1;

/// Substring rules mapping helper processes onto their application.
pub const APP_RULES: &[(&str, &str)] = &[
    ("Google Chrome Helper", "Chrome"),
    ("Google Chrome", "Chrome"),
    ("Chrome Helper", "Chrome"),
    ("Safari Web Content", "Safari"),
    ("Safari Networking", "Safari"),
    ("Code Helper", "VS Code"),
    ("Electron Helper", "Electron"),
    ("Firefox Content", "Firefox"),
    ("plugin-container", "Firefox"),
];

pub const STRIPPED_SUFFIXES: &[&str] = &[" Helper", " Agent", " Renderer", " GPU", " Utility"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRule {
    pub pattern: String,
    pub app: String,
}

/// Ordered name normalization rules.
///
/// Substring rules are tried longest pattern first, so "Google Chrome Helper"
/// wins over "Chrome Helper" regardless of table order.
#[derive(Debug, Clone)]
pub struct AppRules {
    rules: Vec<AppRule>,
    suffixes: Vec<String>,
}

impl AppRules {
    pub fn new(rules: Vec<AppRule>, suffixes: Vec<String>) -> Self {
        let mut rules = rules;
        rules.sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
        Self { rules, suffixes }
    }

    pub fn builtin() -> Self {
        Self::new(
            APP_RULES
                .iter()
                .map(|(pattern, app)| AppRule {
                    pattern: pattern.to_string(),
                    app: app.to_string(),
                })
                .collect(),
            STRIPPED_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn rules(&self) -> &[AppRule] {
        &self.rules
    }

    pub fn normalize(&self, name: &str) -> String {
        if let Some(rule) = self.rules.iter().find(|r| name.contains(r.pattern.as_str())) {
            return rule.app.clone();
        }

        for suffix in &self.suffixes {
            if let Some(stripped) = name.strip_suffix(suffix.as_str()) {
                return stripped.to_string();
            }
        }

        name.to_string()
    }

    /// Merges records by normalized name, keeping first-seen order.
    pub fn group(&self, records: Vec<ProcessRecord>) -> Vec<ProcessGroup> {
        let mut groups: Vec<ProcessGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in &records {
            let app = self.normalize(&record.name);
            match index.get(&app) {
                Some(&i) => groups[i].absorb(record),
                None => {
                    index.insert(app.clone(), groups.len());
                    groups.push(ProcessGroup::seed(app, record));
                }
            }
        }

        groups
    }
}

impl Default for AppRules {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Cpu,
    Memory,
}

impl From<&str> for SortKey {
    fn from(s: &str) -> Self {
        match s {
            "memory" | "mem" => SortKey::Memory,
            _ => SortKey::Cpu,
        }
    }
}

/// Stable descending sort by `key`, then truncation to `limit` rows.
pub fn sort_and_limit(mut entries: Vec<ProcessInfo>, key: SortKey, limit: usize) -> Vec<ProcessInfo> {
    match key {
        SortKey::Memory => entries.sort_by(|a, b| b.memory_mb().total_cmp(&a.memory_mb())),
        SortKey::Cpu => entries.sort_by(|a, b| b.cpu_percent().total_cmp(&a.cpu_percent())),
    }
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: i32, name: &str, cpu: f32, mem: f64) -> ProcessRecord {
        ProcessRecord { pid, name: name.to_string(), cpu_percent: cpu, memory_mb: mem }
    }

    #[test]
    fn substring_rules_map_helpers_to_apps() {
        let rules = AppRules::builtin();
        assert_eq!(rules.normalize("Google Chrome Helper (Renderer)"), "Chrome");
        assert_eq!(rules.normalize("Google Chrome"), "Chrome");
        assert_eq!(rules.normalize("Safari Networking"), "Safari");
        assert_eq!(rules.normalize("Code Helper (Plugin)"), "VS Code");
        assert_eq!(rules.normalize("plugin-container"), "Firefox");
    }

    #[test]
    fn suffixes_are_stripped_when_no_rule_matches() {
        let rules = AppRules::builtin();
        assert_eq!(rules.normalize("Slack Helper"), "Slack");
        assert_eq!(rules.normalize("Spotlight Agent"), "Spotlight");
        assert_eq!(rules.normalize("Discord GPU"), "Discord");
        assert_eq!(rules.normalize("postgres"), "postgres");
    }

    #[test]
    fn longest_pattern_wins_over_table_order() {
        let rules = AppRules::new(
            vec![
                AppRule { pattern: "Helper".into(), app: "Generic".into() },
                AppRule { pattern: "Chrome Helper".into(), app: "Chrome".into() },
            ],
            Vec::new(),
        );
        assert_eq!(rules.normalize("Chrome Helper"), "Chrome");
        assert_eq!(rules.normalize("Mail Helper"), "Generic");
    }

    #[test]
    fn grouping_sums_usage_per_app() {
        let rules = AppRules::builtin();
        let groups = rules.group(vec![
            record(10, "Google Chrome", 5.0, 100.0),
            record(11, "bash", 0.5, 4.0),
            record(12, "Google Chrome Helper", 2.5, 50.0),
            record(13, "Chrome Helper (GPU)", 1.0, 25.5),
        ]);

        assert_eq!(groups.len(), 2);
        let chrome = &groups[0];
        assert_eq!(chrome.name, "Chrome");
        assert_eq!(chrome.pid, 10);
        assert_eq!(chrome.child_count, 3);
        assert_eq!(chrome.child_pids, vec![10, 12, 13]);
        assert_eq!(chrome.cpu_percent, 8.5);
        assert_eq!(chrome.memory_mb, 175.5);
        assert!(chrome.is_grouped);

        assert_eq!(groups[1].name, "bash");
        assert_eq!(groups[1].child_count, 1);
    }

    #[test]
    fn sort_by_memory_then_limit() {
        let entries = vec![
            ProcessInfo::Single(record(1, "a", 0.0, 10.0)),
            ProcessInfo::Single(record(2, "b", 0.0, 50.0)),
            ProcessInfo::Single(record(3, "c", 0.0, 5.0)),
        ];

        let sorted = sort_and_limit(entries.clone(), SortKey::Memory, 10);
        let mems: Vec<f64> = sorted.iter().map(|p| p.memory_mb()).collect();
        assert_eq!(mems, vec![50.0, 10.0, 5.0]);

        let top = sort_and_limit(entries, SortKey::Memory, 2);
        let pids: Vec<i32> = top.iter().map(|p| p.pid()).collect();
        assert_eq!(pids, vec![2, 1]);
    }

    #[test]
    fn cpu_sort_keeps_ties_in_input_order() {
        let entries = vec![
            ProcessInfo::Single(record(1, "a", 1.0, 0.0)),
            ProcessInfo::Single(record(2, "b", 3.0, 0.0)),
            ProcessInfo::Single(record(3, "c", 1.0, 0.0)),
        ];
        let pids: Vec<i32> = sort_and_limit(entries, SortKey::Cpu, 5)
            .iter()
            .map(|p| p.pid())
            .collect();
        assert_eq!(pids, vec![2, 1, 3]);
    }

    #[test]
    fn sort_key_parsing() {
        assert_eq!(SortKey::from("memory"), SortKey::Memory);
        assert_eq!(SortKey::from("mem"), SortKey::Memory);
        assert_eq!(SortKey::from("cpu"), SortKey::Cpu);
        assert_eq!(SortKey::from("anything"), SortKey::Cpu);
    }
}
