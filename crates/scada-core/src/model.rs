use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Coarse validity flag the backend attaches to a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    Good,
    Bad,
    Uncertain,
    #[serde(other)]
    Unknown,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Good => "Good",
            Quality::Bad => "Bad",
            Quality::Uncertain => "Uncertain",
            Quality::Unknown => "Unknown",
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, Quality::Good)
    }

    /// Case-insensitive name as the backend spells it (`Good`, `GOOD`).
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "good" => Quality::Good,
            "bad" => Quality::Bad,
            "uncertain" => Quality::Uncertain,
            _ => Quality::Unknown,
        }
    }

    /// Numeric quality code: 0 good, 1 bad, 2 uncertain, anything else unknown.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Quality::Good,
            1 => Quality::Bad,
            2 => Quality::Uncertain,
            _ => Quality::Unknown,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Instrument,
    Controller,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Instrument => "instrument",
            TagKind::Controller => "controller",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record of the backend's flat tag listing.
///
/// `name` is either a parent (`FIT_100`) or a `<parent>.<variable>` pair
/// (`FIT_100.PV`). Fields the backend adds beyond these are ignored, and an
/// optional field of an unexpected JSON type never fails the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatTag {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub units: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::quality")]
    pub quality: Option<Quality>,
    /// Epoch seconds.
    #[serde(default, deserialize_with = "lenient::number")]
    pub last_update: Option<f64>,
}

impl FlatTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_last_update(mut self, epoch_secs: f64) -> Self {
        self.last_update = Some(epoch_secs);
        self
    }
}

/// Field decoders that degrade off-type values instead of rejecting them.
pub(crate) mod lenient {
    use super::*;

    /// Strings as-is, numbers and booleans as their text, anything else absent.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Numbers, or strings holding one.
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Quality names or numeric codes; other shapes are unknown quality.
    pub fn quality<'de, D>(deserializer: D) -> Result<Option<Quality>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(Quality::from_name(&s)),
            Some(Value::Number(n)) => {
                Some(n.as_i64().map_or(Quality::Unknown, Quality::from_code))
            }
            Some(_) => Some(Quality::Unknown),
        })
    }
}

/// Placeholder shown until a live value is known.
pub const VALUE_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub units: Option<String>,
    pub category: Option<String>,
    pub quality: Quality,
    pub last_update: Option<f64>,
    pub is_alarm: bool,
    pub value: String,
}

impl Variable {
    pub fn is_alarm_name(name: &str) -> bool {
        name.contains("ALARM")
    }
}

/// Aggregate of one industrial point and the variables addressed under it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentTag {
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TagKind,
    pub units: String,
    pub variables: Vec<Variable>,
    pub variable_count: usize,
    pub alarm_count: usize,
    pub quality: Quality,
    pub last_update: f64,
    pub is_expanded: bool,
}

impl ParentTag {
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn full_variable_name(&self, variable: &str) -> String {
        format!("{}.{}", self.name, variable)
    }
}
