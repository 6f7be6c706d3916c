//! Display formatting shared by every view.

use crate::model::VALUE_PLACEHOLDER;

/// `3725` → `1h 2m`.
pub fn uptime(seconds: u64) -> String {
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

/// Bytes rendered in MiB with one decimal.
pub fn memory(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

pub fn percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// Binary-scaled size, at most two decimals, trailing zeros dropped.
pub fn file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut scaled = bytes as f64;
    let mut unit = 0;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{scaled:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

pub fn hex_index(index: u32) -> String {
    format!("0x{index:04X}")
}

pub fn table_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => VALUE_PLACEHOLDER.to_string(),
    }
}

/// Counter that may be unknown while the backend is unreachable.
pub fn counter(value: Option<u64>) -> String {
    value.map_or_else(|| VALUE_PLACEHOLDER.to_string(), |v| v.to_string())
}
