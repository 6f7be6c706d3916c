//! Backup listing and configuration validation payloads.

use crate::format;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub filename: String,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Bytes.
    #[serde(default)]
    pub size: Option<u64>,
}

impl BackupEntry {
    pub fn display_size(&self) -> String {
        match self.size {
            Some(bytes) if bytes > 0 => format::file_size(bytes),
            _ => "-".to_string(),
        }
    }

    pub fn display_created(&self) -> &str {
        self.created_at
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("-")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    #[serde(default)]
    pub total_tags: u64,
    #[serde(default)]
    pub total_templates: u64,
    #[serde(default)]
    pub opcua_indices: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub summary: Option<ValidationSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Valid with nothing to report.
    Clean,
    /// Valid, with warnings.
    Warnings,
    Invalid,
}

impl ValidationReport {
    pub fn verdict(&self) -> Verdict {
        if !self.valid || !self.errors.is_empty() {
            Verdict::Invalid
        } else if !self.warnings.is_empty() {
            Verdict::Warnings
        } else {
            Verdict::Clean
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_display_fallbacks() {
        let entry: BackupEntry = serde_json::from_str(r#"{"filename":"b.json"}"#).unwrap();
        assert_eq!(entry.display_size(), "-");
        assert_eq!(entry.display_created(), "-");

        let sized = BackupEntry {
            size: Some(2048),
            ..entry
        };
        assert_eq!(sized.display_size(), "2 KB");
    }

    #[test]
    fn verdicts() {
        let clean: ValidationReport = serde_json::from_str(r#"{"valid":true}"#).unwrap();
        assert_eq!(clean.verdict(), Verdict::Clean);

        let warned = ValidationReport {
            warnings: vec!["unused template".into()],
            ..clean.clone()
        };
        assert_eq!(warned.verdict(), Verdict::Warnings);

        let errored = ValidationReport {
            errors: vec!["duplicate index 3".into()],
            ..clean
        };
        assert_eq!(errored.verdict(), Verdict::Invalid);

        // A report without `valid` is not trusted.
        let missing: ValidationReport = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.verdict(), Verdict::Invalid);
    }
}
