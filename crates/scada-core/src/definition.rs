//! Tag creation documents.
//!
//! A [`TagDefinition`] starts [`Unvalidated`] from operator input and can
//! only be submitted to the backend once [`TagDefinition::validate`] has
//! turned it into a `TagDefinition<Validated>`.

use crate::model::TagKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unvalidated;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validated;

pub const DATA_TYPE_FLOAT: &str = "FLOAT";

pub const INSTRUMENT_VARIABLES: &[&str] = &[
    "PV",
    "SV",
    "SetHH",
    "SetH",
    "SetL",
    "SetLL",
    "Input",
    "percent",
    "min",
    "max",
    "SIM_Value",
];

pub const CONTROLLER_VARIABLES: &[&str] = &[
    "PV",
    "SP",
    "CV",
    "KP",
    "KI",
    "KD",
    "auto_manual",
    "OUTPUT_HIGH",
    "OUTPUT_LOW",
    "PID_ENABLE",
];

pub fn value_table_for(name: &str) -> String {
    format!("TBL_{}", name.to_uppercase())
}

pub fn alarm_table_for(name: &str) -> String {
    format!("TBL_TA_{}", name.to_uppercase())
}

/// Alarm thresholds for an instrument. Only the keys that were set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlarmSettings {
    #[serde(rename = "SetHH", skip_serializing_if = "Option::is_none")]
    pub set_hh: Option<f64>,
    #[serde(rename = "SetH", skip_serializing_if = "Option::is_none")]
    pub set_h: Option<f64>,
    #[serde(rename = "SetL", skip_serializing_if = "Option::is_none")]
    pub set_l: Option<f64>,
    #[serde(rename = "SetLL", skip_serializing_if = "Option::is_none")]
    pub set_ll: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl AlarmSettings {
    pub fn is_empty(&self) -> bool {
        self.values().all(|v| v.is_none())
    }

    fn values(&self) -> impl Iterator<Item = Option<f64>> {
        [
            self.set_hh,
            self.set_h,
            self.set_l,
            self.set_ll,
            self.min,
            self.max,
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PidSettings {
    #[serde(rename = "KP")]
    pub kp: f64,
    #[serde(rename = "KI")]
    pub ki: f64,
    #[serde(rename = "KD")]
    pub kd: f64,
    #[serde(rename = "OUTPUT_LOW")]
    pub output_low: i64,
    #[serde(rename = "OUTPUT_HIGH")]
    pub output_high: i64,
    #[serde(rename = "PID_ENABLE")]
    pub pid_enable: bool,
    pub auto_manual: bool,
}

impl Default for PidSettings {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.1,
            kd: 0.01,
            output_low: 0,
            output_high: 100,
            pid_enable: true,
            auto_manual: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("non-finite value for {field}")]
    NonFinite { field: &'static str },
    #[error("{field}: low {low} is above high {high}")]
    InvertedRange {
        field: &'static str,
        low: String,
        high: String,
    },
}

/// Document posted to `POST /tags`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagDefinition<State = Unvalidated> {
    pub name: String,
    pub opcua_name: String,
    pub value_table: String,
    pub alarm_table: String,
    pub description: String,
    pub units: String,
    pub category: String,
    pub opcua_table_index: u32,
    pub variables: Vec<String>,
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_settings: Option<AlarmSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid_settings: Option<PidSettings>,
    #[serde(skip)]
    kind: TagKind,
    #[serde(skip)]
    _state: PhantomData<State>,
}

impl TagDefinition<Unvalidated> {
    /// Pre-fills everything derivable from the name: OPC UA name, both
    /// tables, the default variable list and the suggested category/units.
    pub fn new(name: impl Into<String>, kind: TagKind) -> Self {
        let name = name.into();
        let suggestion = FormSuggestion::for_name(kind, &name);
        let (variables, pid_settings) = match kind {
            TagKind::Instrument => (INSTRUMENT_VARIABLES, None),
            TagKind::Controller => (CONTROLLER_VARIABLES, Some(PidSettings::default())),
        };
        Self {
            opcua_name: name.clone(),
            value_table: value_table_for(&name),
            alarm_table: alarm_table_for(&name),
            description: String::new(),
            units: suggestion.map(|s| s.units.to_string()).unwrap_or_default(),
            category: suggestion.map(|s| s.category.to_string()).unwrap_or_default(),
            opcua_table_index: 0,
            variables: variables.iter().map(|v| v.to_string()).collect(),
            data_type: DATA_TYPE_FLOAT.to_string(),
            alarm_settings: None,
            pid_settings,
            name,
            kind,
            _state: PhantomData,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_value_table(mut self, table: impl Into<String>) -> Self {
        self.value_table = table.into();
        self
    }

    pub fn with_alarm_table(mut self, table: impl Into<String>) -> Self {
        self.alarm_table = table.into();
        self
    }

    pub fn with_opcua_index(mut self, index: u32) -> Self {
        self.opcua_table_index = index;
        self
    }

    /// Ignored for controllers.
    pub fn with_alarm_settings(mut self, settings: AlarmSettings) -> Self {
        if self.kind == TagKind::Instrument {
            self.alarm_settings = (!settings.is_empty()).then_some(settings);
        }
        self
    }

    /// Ignored for instruments.
    pub fn with_pid_settings(mut self, settings: PidSettings) -> Self {
        if self.kind == TagKind::Controller {
            self.pid_settings = Some(settings);
        }
        self
    }

    pub fn validate(self) -> Result<TagDefinition<Validated>, DefinitionError> {
        let required = [
            ("name", &self.name),
            ("category", &self.category),
            ("units", &self.units),
            ("value_table", &self.value_table),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DefinitionError::MissingField(field));
            }
        }

        if let Some(alarms) = &self.alarm_settings {
            let named = [
                ("SetHH", alarms.set_hh),
                ("SetH", alarms.set_h),
                ("SetL", alarms.set_l),
                ("SetLL", alarms.set_ll),
                ("min", alarms.min),
                ("max", alarms.max),
            ];
            for (field, value) in named {
                if value.is_some_and(|v| !v.is_finite()) {
                    return Err(DefinitionError::NonFinite { field });
                }
            }
            if let (Some(min), Some(max)) = (alarms.min, alarms.max) {
                if min > max {
                    return Err(DefinitionError::InvertedRange {
                        field: "min/max",
                        low: min.to_string(),
                        high: max.to_string(),
                    });
                }
            }
        }

        if let Some(pid) = &self.pid_settings {
            for (field, value) in [("KP", pid.kp), ("KI", pid.ki), ("KD", pid.kd)] {
                if !value.is_finite() {
                    return Err(DefinitionError::NonFinite { field });
                }
            }
            if pid.output_low > pid.output_high {
                return Err(DefinitionError::InvertedRange {
                    field: "OUTPUT_LOW/OUTPUT_HIGH",
                    low: pid.output_low.to_string(),
                    high: pid.output_high.to_string(),
                });
            }
        }

        Ok(TagDefinition {
            name: self.name,
            opcua_name: self.opcua_name,
            value_table: self.value_table,
            alarm_table: self.alarm_table,
            description: self.description,
            units: self.units,
            category: self.category,
            opcua_table_index: self.opcua_table_index,
            variables: self.variables,
            data_type: self.data_type,
            alarm_settings: self.alarm_settings,
            pid_settings: self.pid_settings,
            kind: self.kind,
            _state: PhantomData,
        })
    }
}

impl<State> TagDefinition<State> {
    pub fn kind(&self) -> TagKind {
        self.kind
    }
}

/// Category/units pre-selected in a creation form for a known prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSuggestion {
    pub prefix: &'static str,
    pub kind: TagKind,
    pub category: &'static str,
    pub units: &'static str,
}

const FORM_SUGGESTIONS: &[FormSuggestion] = &[
    FormSuggestion {
        prefix: "ET_",
        kind: TagKind::Instrument,
        category: "FLOW_TRANSMITTER",
        units: "m3/h",
    },
    FormSuggestion {
        prefix: "FIT_",
        kind: TagKind::Instrument,
        category: "FLOW_INDICATOR",
        units: "m3/h",
    },
    FormSuggestion {
        prefix: "TIT_",
        kind: TagKind::Instrument,
        category: "TEMPERATURE_INDICATOR",
        units: "°C",
    },
    FormSuggestion {
        prefix: "PIT_",
        kind: TagKind::Instrument,
        category: "PRESSURE_INDICATOR",
        units: "bar",
    },
    FormSuggestion {
        prefix: "LIT_",
        kind: TagKind::Instrument,
        category: "LEVEL_INDICATOR",
        units: "m",
    },
    FormSuggestion {
        prefix: "PDIT_",
        kind: TagKind::Instrument,
        category: "PRESSURE_DIFFERENTIAL",
        units: "bar",
    },
    FormSuggestion {
        prefix: "FRC_",
        kind: TagKind::Controller,
        category: "FLOW_CONTROLLER",
        units: "m3/h",
    },
    FormSuggestion {
        prefix: "TRC_",
        kind: TagKind::Controller,
        category: "TEMPERATURE_CONTROLLER",
        units: "°C",
    },
    FormSuggestion {
        prefix: "PRC_",
        kind: TagKind::Controller,
        category: "PRESSURE_CONTROLLER",
        units: "bar",
    },
];

impl FormSuggestion {
    /// Suggestions only apply within the form of the matching kind.
    pub fn for_name(kind: TagKind, name: &str) -> Option<&'static FormSuggestion> {
        let upper = name.to_uppercase();
        FORM_SUGGESTIONS
            .iter()
            .find(|s| s.kind == kind && upper.starts_with(s.prefix))
    }
}

/// Free-form `PUT /tag/{name}` body built from `key=value` pairs.
///
/// Values that parse as JSON (numbers, booleans, quoted strings) keep their
/// type; anything else is sent as a string.
pub fn update_document<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> BTreeMap<String, serde_json::Value> {
    pairs
        .into_iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
            (key.to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn instrument_prefill() {
        let def = TagDefinition::new("fit_200", TagKind::Instrument);
        assert_eq!(def.opcua_name, "fit_200");
        assert_eq!(def.value_table, "TBL_FIT_200");
        assert_eq!(def.alarm_table, "TBL_TA_FIT_200");
        assert_eq!(def.category, "FLOW_INDICATOR");
        assert_eq!(def.units, "m3/h");
        assert_eq!(def.variables.len(), 11);
        assert_eq!(def.data_type, "FLOAT");
        assert!(def.pid_settings.is_none());
    }

    #[test]
    fn controller_prefill_has_pid_defaults() {
        let def = TagDefinition::new("TRC_7", TagKind::Controller);
        assert_eq!(def.category, "TEMPERATURE_CONTROLLER");
        assert_eq!(def.units, "°C");
        assert_eq!(def.variables[0], "PV");
        assert_eq!(def.variables.last().map(String::as_str), Some("PID_ENABLE"));
        assert_eq!(def.pid_settings, Some(PidSettings::default()));
    }

    #[test]
    fn suggestion_requires_matching_form() {
        assert!(FormSuggestion::for_name(TagKind::Controller, "PIT_1").is_none());
        assert!(FormSuggestion::for_name(TagKind::Instrument, "PUMP_1").is_none());
    }

    #[test]
    fn missing_units_rejected() {
        let err = TagDefinition::new("PUMP_1", TagKind::Instrument)
            .with_category("PUMPS")
            .validate()
            .unwrap_err();
        assert_eq!(err, DefinitionError::MissingField("units"));
    }

    #[test]
    fn inverted_alarm_range_rejected() {
        let err = TagDefinition::new("LIT_1", TagKind::Instrument)
            .with_alarm_settings(AlarmSettings {
                min: Some(10.0),
                max: Some(0.0),
                ..Default::default()
            })
            .validate()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::InvertedRange { .. }));
    }

    #[test]
    fn non_finite_gain_rejected() {
        let err = TagDefinition::new("PRC_1", TagKind::Controller)
            .with_pid_settings(PidSettings {
                kp: f64::NAN,
                ..Default::default()
            })
            .validate()
            .unwrap_err();
        assert_eq!(err, DefinitionError::NonFinite { field: "KP" });
    }

    #[test]
    fn empty_alarm_settings_are_dropped() {
        let def = TagDefinition::new("LIT_1", TagKind::Instrument)
            .with_alarm_settings(AlarmSettings::default());
        assert!(def.alarm_settings.is_none());
    }

    #[test]
    fn serializes_only_provided_alarm_keys() {
        let def = TagDefinition::new("PIT_9", TagKind::Instrument)
            .with_alarm_settings(AlarmSettings {
                set_hh: Some(90.0),
                min: Some(0.0),
                ..Default::default()
            })
            .validate()
            .unwrap();
        let body = serde_json::to_value(&def).unwrap();
        assert_eq!(body["alarm_settings"], json!({"SetHH": 90.0, "min": 0.0}));
        assert!(body.get("pid_settings").is_none());
        assert!(body.get("kind").is_none());
        assert_eq!(body["opcua_table_index"], 0);
    }

    #[test]
    fn serializes_pid_keys() {
        let def = TagDefinition::new("FRC_3", TagKind::Controller)
            .validate()
            .unwrap();
        let body = serde_json::to_value(&def).unwrap();
        assert_eq!(
            body["pid_settings"],
            json!({
                "KP": 1.0, "KI": 0.1, "KD": 0.01,
                "OUTPUT_LOW": 0, "OUTPUT_HIGH": 100,
                "PID_ENABLE": true, "auto_manual": false
            })
        );
        assert_eq!(def.kind(), TagKind::Controller);
    }

    #[test]
    fn update_document_keeps_json_types() {
        let doc = update_document([("units", "bar"), ("opcua_table_index", "12"), ("enabled", "true")]);
        assert_eq!(doc["units"], json!("bar"));
        assert_eq!(doc["opcua_table_index"], json!(12));
        assert_eq!(doc["enabled"], json!(true));
    }
}
