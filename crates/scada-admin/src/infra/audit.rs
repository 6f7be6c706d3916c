//! Audit trail of administrative changes made against the backend.
//!
//! Every operation that mutates backend state is appended as one JSON line,
//! together with the session start and end.

use scada_core::clock::{self, SessionClock};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Types of events that are logged in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    SessionStart,
    SessionEnd,
    TagCreated,
    TagUpdated,
    /// Parent tag together with all of its variables
    TagDeleted,
    VariableDeleted,
    OpcuaValueWritten,
    OpcuaTagAssigned,
    OpcuaTagUnassigned,
    BackupCreated,
    BackupRestored,
    BackupDownloaded,
    ConfigUpdated,
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Microseconds since the session started
    pub timestamp_us: u64,
    /// Wall-clock Unix timestamp in microseconds
    pub unix_us: u64,
    pub event_type: AuditEventType,
    /// Backend the change was sent to
    pub backend: String,
    pub details: serde_json::Value,
}

/// Thread-safe audit logger that writes to a JSONL file
pub struct AuditLogger {
    writer: Mutex<BufWriter<File>>,
}

impl AuditLogger {
    /// Opens `path` in append mode, creating parent directories.
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::with_capacity(8192, file)),
        })
    }

    pub fn log(&self, entry: &AuditEntry) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "audit writer poisoned"))?;
        serde_json::to_writer(&mut *writer, entry)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

/// Session-scoped handle: stamps entries and never fails the caller.
#[derive(Clone)]
pub struct AuditTrail {
    logger: Option<Arc<AuditLogger>>,
    clock: SessionClock,
    backend: String,
}

impl AuditTrail {
    pub fn disabled() -> Self {
        Self {
            logger: None,
            clock: SessionClock::new(),
            backend: String::new(),
        }
    }

    pub fn open(path: Option<&Path>, backend: &str) -> io::Result<Self> {
        let logger = match path {
            Some(path) => {
                let logger = AuditLogger::new(path)?;
                info!(path = %path.display(), "Audit logging enabled");
                Some(Arc::new(logger))
            }
            None => None,
        };
        Ok(Self {
            logger,
            clock: SessionClock::new(),
            backend: backend.to_string(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.logger.is_some()
    }

    pub fn record(&self, event_type: AuditEventType, details: serde_json::Value) {
        let Some(logger) = &self.logger else {
            return;
        };
        let entry = AuditEntry {
            timestamp_us: self.clock.elapsed_us(),
            unix_us: clock::unix_us(),
            event_type,
            backend: self.backend.clone(),
            details,
        };
        if let Err(e) = logger.log(&entry) {
            warn!(error = %e, event = ?event_type, "Failed to write audit entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Read;
    use tempfile::tempdir;

    fn read_lines(path: &Path) -> Vec<AuditEntry> {
        let mut content = String::new();
        File::open(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn trail_writes_jsonl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/audit.jsonl");

        let trail = AuditTrail::open(Some(&path), "http://scada:8080").unwrap();
        assert!(trail.is_enabled());
        trail.record(AuditEventType::TagCreated, json!({"name": "FIT_100"}));
        trail.record(
            AuditEventType::OpcuaValueWritten,
            json!({"index": 3, "value": 12.5}),
        );

        let entries = read_lines(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event_type, AuditEventType::TagCreated);
        assert_eq!(entries[0].backend, "http://scada:8080");
        assert_eq!(entries[1].details["index"], 3);
        assert!(entries[1].timestamp_us >= entries[0].timestamp_us);
    }

    #[test]
    fn appends_across_sessions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        AuditTrail::open(Some(&path), "a")
            .unwrap()
            .record(AuditEventType::SessionStart, json!({}));
        AuditTrail::open(Some(&path), "a")
            .unwrap()
            .record(AuditEventType::SessionEnd, json!({}));

        let entries = read_lines(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].event_type, AuditEventType::SessionEnd);
    }

    #[test]
    fn event_names_are_snake_case() {
        let raw = serde_json::to_string(&AuditEventType::OpcuaTagUnassigned).unwrap();
        assert_eq!(raw, "\"opcua_tag_unassigned\"");
    }

    #[test]
    fn disabled_trail_is_silent() {
        let trail = AuditTrail::disabled();
        assert!(!trail.is_enabled());
        trail.record(AuditEventType::ConfigUpdated, json!({}));
    }
}
