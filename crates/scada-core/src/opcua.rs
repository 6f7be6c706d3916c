//! OPC UA index table and the address-space preview shown beside it.

use crate::format;
use crate::model::{lenient, FlatTag, Quality};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DATA_TYPE: &str = "Float";
pub const ROOT_FOLDER: &str = "Objects";
pub const PLANT_FOLDER: &str = "PlantaGas";

/// One row of `/opcua-table`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpcSlot {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value: Option<f64>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub assigned_tag: Option<String>,
}

impl OpcSlot {
    pub fn assigned(&self) -> Option<&str> {
        self.assigned_tag.as_deref().filter(|t| !t.is_empty())
    }

    pub fn data_type(&self) -> &str {
        self.data_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_DATA_TYPE)
    }
}

/// Row as displayed: the slot index falls back to its table position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRow {
    pub index: u32,
    pub hex_index: String,
    pub value: String,
    pub data_type: String,
    pub assigned_tag: String,
}

pub fn rows(slots: &[OpcSlot]) -> Vec<SlotRow> {
    slots
        .iter()
        .enumerate()
        .map(|(position, slot)| {
            let index = slot.index.unwrap_or(position as u32);
            SlotRow {
                index,
                hex_index: format::hex_index(index),
                value: format::table_value(slot.value),
                data_type: slot.data_type().to_string(),
                assigned_tag: slot.assigned().unwrap_or("-").to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotValueError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("value must be finite")]
    NonFinite,
}

/// Parse an operator-entered slot value.
pub fn parse_value(raw: &str) -> Result<f64, SlotValueError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| SlotValueError::NotANumber(raw.to_string()))?;
    if !value.is_finite() {
        return Err(SlotValueError::NonFinite);
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureNode {
    pub name: String,
    pub kind: NodeKind,
    pub quality: Option<Quality>,
    pub children: Vec<StructureNode>,
}

impl StructureNode {
    fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Folder,
            quality: None,
            children: Vec::new(),
        }
    }

    /// `Objects/PlantaGas/<text before first '_'>/<tag>`, groups in order
    /// of first appearance.
    pub fn preview(tags: &[FlatTag]) -> Self {
        let mut plant = Self::folder(PLANT_FOLDER);
        for tag in tags {
            let group = tag.name.split('_').next().unwrap_or_default();
            let pos = match plant.children.iter().position(|c| c.name == group) {
                Some(pos) => pos,
                None => {
                    plant.children.push(Self::folder(group));
                    plant.children.len() - 1
                }
            };
            plant.children[pos].children.push(StructureNode {
                name: tag.name.clone(),
                kind: NodeKind::Variable,
                quality: tag.quality,
                children: Vec::new(),
            });
        }

        let mut root = Self::folder(ROOT_FOLDER);
        root.children.push(plant);
        root
    }

    /// Indented text rendering, two spaces per level.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.push_lines(0, &mut out);
        out
    }

    fn push_lines(&self, depth: usize, out: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        match (self.kind, self.quality) {
            (NodeKind::Folder, _) => out.push(format!("{indent}{}/", self.name)),
            (NodeKind::Variable, Some(q)) => out.push(format!("{indent}{} [{q}]", self.name)),
            (NodeKind::Variable, None) => out.push(format!("{indent}{}", self.name)),
        }
        for child in &self.children {
            child.push_lines(depth + 1, out);
        }
    }
}
