//! Dashboard payloads: `/statistics`, `/status`, `/health`.

use crate::format;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_tags: u64,
    #[serde(default)]
    pub opcua_connections: u64,
    #[serde(default)]
    pub monitored_variables: u64,
    #[serde(default)]
    pub active_alarms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub version: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub uptime: u64,
    /// Bytes.
    #[serde(default)]
    pub memory_usage: u64,
    /// Percent.
    #[serde(default)]
    pub cpu_usage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: String,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// System information panel, already formatted. Fields are `-` while unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub version: String,
    pub uptime: String,
    pub memory: String,
    pub cpu: String,
}

impl SystemInfo {
    pub fn from_status(status: Option<&SystemStatus>) -> Self {
        match status {
            Some(s) => Self {
                version: s
                    .version
                    .clone()
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
                uptime: format::uptime(s.uptime),
                memory: format::memory(s.memory_usage),
                cpu: format::percentage(s.cpu_usage),
            },
            None => Self {
                version: DEFAULT_VERSION.to_string(),
                uptime: "-".to_string(),
                memory: "-".to_string(),
                cpu: "-".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub level: ActivityLevel,
    pub message: String,
    /// Epoch seconds.
    pub at: f64,
}

/// Recent activity derived from the latest health probe.
/// `None` means the probe failed.
pub fn activity_from_health(health: Option<&HealthReport>, now_secs: f64) -> Vec<ActivityEntry> {
    match health {
        Some(h) if h.is_healthy() => vec![ActivityEntry {
            level: ActivityLevel::Success,
            message: "System running normally".to_string(),
            at: now_secs,
        }],
        Some(h) => vec![ActivityEntry {
            level: ActivityLevel::Warning,
            message: format!("Backend reports status '{}'", h.status),
            at: now_secs,
        }],
        None => vec![ActivityEntry {
            level: ActivityLevel::Danger,
            message: "Connection error with the server".to_string(),
            at: now_secs,
        }],
    }
}
