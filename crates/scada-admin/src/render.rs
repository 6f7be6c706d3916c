//! Terminal presentation of backend state.
//!
//! Surfaces and commands never print directly; they hand view data to a
//! [`Renderer`], which keeps them testable without a terminal.

use chrono::{DateTime, Utc};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use scada_core::backup::Verdict;
use scada_core::opcua::{self, StructureNode};
use scada_core::system::{ActivityEntry, ActivityLevel};
use scada_core::{
    format, BackupEntry, MetricsPoint, OpcSlot, ParentTag, Quality, Statistics, SystemInfo,
    ValidationReport,
};
use scada_io::ConnectionStatus;
use serde_json::Value;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Everything the dashboard shows after one refresh.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// `None` while the counters are unavailable.
    pub statistics: Option<Statistics>,
    pub system: SystemInfo,
    pub connection: ConnectionStatus,
    pub history: Vec<MetricsPoint>,
    pub activity: Vec<ActivityEntry>,
}

pub trait Renderer: Send + Sync {
    fn dashboard(&self, view: &DashboardView);
    fn statistics(&self, statistics: Option<&Statistics>);
    fn system(&self, info: &SystemInfo);
    fn tags(&self, tags: &[&ParentTag]);
    fn opcua_table(&self, slots: &[OpcSlot]);
    fn opcua_structure(&self, root: &StructureNode);
    fn backups(&self, backups: &[BackupEntry]);
    fn validation(&self, report: &ValidationReport);
    fn templates(&self, templates: &[Value]);
    fn document(&self, title: &str, document: &Value);
    /// Transient message; never blocks the caller.
    fn notify(&self, level: Level, message: &str);
}

/// Renders tables to a writer (stdout by default) and notifications to stderr.
pub struct TerminalRenderer {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalRenderer {
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn emit(&self, text: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(e) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            warn!(error = %e, "failed to write output");
        }
    }

    fn table(headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(
                headers
                    .iter()
                    .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan))
                    .collect::<Vec<_>>(),
            );
        table
    }
}

fn quality_color(quality: Quality) -> Color {
    match quality {
        Quality::Good => Color::Green,
        Quality::Bad => Color::Red,
        Quality::Uncertain | Quality::Unknown => Color::Yellow,
    }
}

fn activity_color(level: ActivityLevel) -> Color {
    match level {
        ActivityLevel::Success => Color::Green,
        ActivityLevel::Info => Color::Cyan,
        ActivityLevel::Warning => Color::Yellow,
        ActivityLevel::Danger => Color::Red,
    }
}

fn timestamp(epoch_secs: f64) -> String {
    let secs = epoch_secs.trunc() as i64;
    let nanos = (epoch_secs.fract() * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn statistics_rows(table: &mut Table, statistics: Option<&Statistics>) {
    let rows = [
        ("Total tags", statistics.map(|s| s.total_tags)),
        ("OPC UA connections", statistics.map(|s| s.opcua_connections)),
        ("Monitored variables", statistics.map(|s| s.monitored_variables)),
        ("Active alarms", statistics.map(|s| s.active_alarms)),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            Cell::new(format::counter(value)),
        ]);
    }
}

fn system_rows(table: &mut Table, info: &SystemInfo) {
    for (label, value) in [
        ("Version", &info.version),
        ("Uptime", &info.uptime),
        ("Memory", &info.memory),
        ("CPU", &info.cpu),
    ] {
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            Cell::new(value),
        ]);
    }
}

impl Renderer for TerminalRenderer {
    fn dashboard(&self, view: &DashboardView) {
        let mut overview = Self::table(&["Dashboard", ""]);
        let (badge, color) = if view.connection.online {
            ("Online", Color::Green)
        } else {
            ("Offline", Color::Red)
        };
        overview.add_row(vec![
            Cell::new("Backend").add_attribute(Attribute::Bold),
            Cell::new(badge).fg(color),
        ]);
        statistics_rows(&mut overview, view.statistics.as_ref());
        system_rows(&mut overview, &view.system);

        let mut history = Self::table(&["Time", "CPU", "Memory", "Tags"]);
        for point in view.history.iter().rev().take(5) {
            history.add_row(vec![
                Cell::new(timestamp(point.at)),
                Cell::new(format::percentage(point.cpu_percent)),
                Cell::new(format!("{:.1} MB", point.memory_mb)),
                Cell::new(point.total_tags),
            ]);
        }

        let mut activity = Self::table(&["Time", "Activity"]);
        for entry in &view.activity {
            activity.add_row(vec![
                Cell::new(timestamp(entry.at)),
                Cell::new(&entry.message).fg(activity_color(entry.level)),
            ]);
        }

        self.emit(&format!("{overview}\n{history}\n{activity}"));
    }

    fn statistics(&self, statistics: Option<&Statistics>) {
        let mut table = Self::table(&["Statistics", ""]);
        statistics_rows(&mut table, statistics);
        self.emit(&table.to_string());
    }

    fn system(&self, info: &SystemInfo) {
        let mut table = Self::table(&["System", ""]);
        system_rows(&mut table, info);
        self.emit(&table.to_string());
    }

    fn tags(&self, tags: &[&ParentTag]) {
        if tags.is_empty() {
            self.emit("No tags found");
            return;
        }
        let mut table = Self::table(&[
            "Name",
            "Type",
            "Category",
            "Description",
            "Units",
            "Variables",
            "Alarms",
            "Quality",
            "Last update",
        ]);
        for parent in tags {
            table.add_row(vec![
                Cell::new(&parent.name).add_attribute(Attribute::Bold),
                Cell::new(parent.kind),
                Cell::new(&parent.category),
                Cell::new(&parent.description),
                Cell::new(&parent.units),
                Cell::new(parent.variable_count),
                Cell::new(parent.alarm_count),
                Cell::new(parent.quality).fg(quality_color(parent.quality)),
                Cell::new(timestamp(parent.last_update)),
            ]);
            if !parent.is_expanded {
                continue;
            }
            for variable in &parent.variables {
                let name = if variable.is_alarm {
                    format!("  └ {} (alarm)", variable.name)
                } else {
                    format!("  └ {}", variable.name)
                };
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(""),
                    Cell::new(variable.category.as_deref().unwrap_or("")),
                    Cell::new(variable.description.as_deref().unwrap_or("")),
                    Cell::new(variable.units.as_deref().unwrap_or("")),
                    Cell::new(&variable.value),
                    Cell::new(""),
                    Cell::new(variable.quality).fg(quality_color(variable.quality)),
                    Cell::new(variable.last_update.map(timestamp).unwrap_or_default()),
                ]);
            }
        }
        self.emit(&table.to_string());
    }

    fn opcua_table(&self, slots: &[OpcSlot]) {
        if slots.is_empty() {
            self.emit("OPC UA table is empty");
            return;
        }
        let mut table = Self::table(&["Index", "Hex", "Value", "Type", "Assigned tag"]);
        for row in opcua::rows(slots) {
            table.add_row(vec![
                Cell::new(row.index),
                Cell::new(row.hex_index),
                Cell::new(row.value),
                Cell::new(row.data_type),
                Cell::new(row.assigned_tag),
            ]);
        }
        self.emit(&table.to_string());
    }

    fn opcua_structure(&self, root: &StructureNode) {
        self.emit(&root.lines().join("\n"));
    }

    fn backups(&self, backups: &[BackupEntry]) {
        if backups.is_empty() {
            self.emit("No backups available");
            return;
        }
        let mut table = Self::table(&["Filename", "Created", "Size"]);
        for backup in backups {
            table.add_row(vec![
                Cell::new(&backup.filename),
                Cell::new(backup.display_created()),
                Cell::new(backup.display_size()),
            ]);
        }
        self.emit(&table.to_string());
    }

    fn validation(&self, report: &ValidationReport) {
        let (headline, color) = match report.verdict() {
            Verdict::Clean => ("Configuration is valid", Color::Green),
            Verdict::Warnings => ("Configuration is valid with warnings", Color::Yellow),
            Verdict::Invalid => ("Configuration has errors", Color::Red),
        };
        let mut table = Self::table(&["Validation", ""]);
        table.add_row(vec![
            Cell::new("Result").add_attribute(Attribute::Bold),
            Cell::new(headline).fg(color),
        ]);
        for message in &report.errors {
            table.add_row(vec![Cell::new("Error").fg(Color::Red), Cell::new(message)]);
        }
        for message in &report.warnings {
            table.add_row(vec![
                Cell::new("Warning").fg(Color::Yellow),
                Cell::new(message),
            ]);
        }
        if let Some(summary) = &report.summary {
            table.add_row(vec![Cell::new("Tags"), Cell::new(summary.total_tags)]);
            table.add_row(vec![
                Cell::new("Templates"),
                Cell::new(summary.total_templates),
            ]);
            table.add_row(vec![
                Cell::new("OPC UA indices"),
                Cell::new(summary.opcua_indices),
            ]);
        }
        self.emit(&table.to_string());
    }

    fn templates(&self, templates: &[Value]) {
        if templates.is_empty() {
            self.emit("No templates defined");
            return;
        }
        let mut table = Self::table(&["Template", "Description"]);
        for template in templates {
            let name = match template {
                Value::String(name) => name.as_str(),
                other => other.get("name").and_then(Value::as_str).unwrap_or("-"),
            };
            let description = template
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("");
            table.add_row(vec![Cell::new(name), Cell::new(description)]);
        }
        self.emit(&table.to_string());
    }

    fn document(&self, title: &str, document: &Value) {
        let body = serde_json::to_string_pretty(document).unwrap_or_else(|_| document.to_string());
        self.emit(&format!("{title}\n{body}"));
    }

    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Info | Level::Success => info!(%message, "notification"),
            Level::Warning => warn!(%message, "notification"),
            Level::Error => error!(%message, "notification"),
        }
        let tag = match level {
            Level::Info => "info",
            Level::Success => "ok",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        eprintln!("[{tag}] {message}");
    }
}
