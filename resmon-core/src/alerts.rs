use crate::metrics::SystemSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Cpu,
    Memory,
    Disk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    #[serde(rename = "type")]
    pub category: AlertCategory,
    pub message: String,
}

/// Inclusive usage thresholds for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub category: AlertCategory,
    pub warning_percent: f64,
    pub critical_percent: f64,
}

pub struct AlertEvaluator {
    rules: Vec<AlertRule>,
}

impl AlertEvaluator {
    pub fn new() -> Self {
        Self {
            rules: Self::default_rules(),
        }
    }

    pub fn with_rules(rules: Vec<AlertRule>) -> Self {
        Self { rules }
    }

    fn default_rules() -> Vec<AlertRule> {
        vec![
            AlertRule {
                category: AlertCategory::Memory,
                warning_percent: 80.0,
                critical_percent: 90.0,
            },
            AlertRule {
                category: AlertCategory::Cpu,
                warning_percent: 80.0,
                critical_percent: 90.0,
            },
            AlertRule {
                category: AlertCategory::Disk,
                warning_percent: 85.0,
                critical_percent: 95.0,
            },
        ]
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// At most one alert per rule; critical takes precedence over warning.
    /// Unavailable metric groups never alert.
    pub fn evaluate(&self, snapshot: &SystemSnapshot) -> Vec<Alert> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let usage = usage_for(snapshot, rule.category)?;
                let (level, threshold) = if usage >= rule.critical_percent {
                    (AlertLevel::Critical, rule.critical_percent)
                } else if usage >= rule.warning_percent {
                    (AlertLevel::Warning, rule.warning_percent)
                } else {
                    return None;
                };

                Some(Alert {
                    level,
                    category: rule.category,
                    message: alert_message(rule.category, level, threshold),
                })
            })
            .collect()
    }
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn usage_for(snapshot: &SystemSnapshot, category: AlertCategory) -> Option<f64> {
    match category {
        AlertCategory::Cpu => snapshot.cpu.map(|c| c.usage_percent as f64),
        AlertCategory::Memory => snapshot.memory.map(|m| m.usage_percent),
        AlertCategory::Disk => snapshot.disk.map(|d| d.usage_percent),
    }
}

fn alert_message(category: AlertCategory, level: AlertLevel, threshold: f64) -> String {
    match (category, level) {
        (AlertCategory::Memory, AlertLevel::Critical) => {
            format!("Memory usage critically high (>={}%)", threshold)
        }
        (AlertCategory::Memory, AlertLevel::Warning) => {
            format!("Memory usage high (>={}%)", threshold)
        }
        (AlertCategory::Cpu, AlertLevel::Critical) => {
            format!("CPU usage critically high (>={}%)", threshold)
        }
        (AlertCategory::Cpu, AlertLevel::Warning) => format!("CPU usage high (>={}%)", threshold),
        (AlertCategory::Disk, AlertLevel::Critical) => {
            format!("Disk space critically low (>={}% used)", threshold)
        }
        (AlertCategory::Disk, AlertLevel::Warning) => {
            format!("Disk space low (>={}% used)", threshold)
        }
    }
}
