use crate::model::TagKind;

pub const CATEGORY_INSTRUMENTS: &str = "Instrumentos";
pub const CATEGORY_CONTROLLERS: &str = "ControladorsPID";
pub const CATEGORY_OTHER: &str = "Otros";

/// Naming-convention row: everything inferred about a parent tag from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPrefix {
    pub prefix: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub kind: TagKind,
    pub units: &'static str,
}

pub const FLOW_TRANSMITTER: TagPrefix = TagPrefix {
    prefix: "ET_",
    description: "Flow Transmitter",
    category: CATEGORY_INSTRUMENTS,
    kind: TagKind::Instrument,
    units: "SCFH",
};

pub const FLOW_INDICATOR_TRANSMITTER: TagPrefix = TagPrefix {
    prefix: "FIT_",
    description: "Flow Indicator Transmitter",
    category: CATEGORY_INSTRUMENTS,
    kind: TagKind::Instrument,
    units: "SCFH",
};

pub const TEMPERATURE_INDICATOR_TRANSMITTER: TagPrefix = TagPrefix {
    prefix: "TIT_",
    description: "Temperature Indicator Transmitter",
    category: CATEGORY_INSTRUMENTS,
    kind: TagKind::Instrument,
    units: "°F",
};

pub const PRESSURE_INDICATOR_TRANSMITTER: TagPrefix = TagPrefix {
    prefix: "PIT_",
    description: "Pressure Indicator Transmitter",
    category: CATEGORY_INSTRUMENTS,
    kind: TagKind::Instrument,
    units: "PSI",
};

pub const LEVEL_INDICATOR_TRANSMITTER: TagPrefix = TagPrefix {
    prefix: "LIT_",
    description: "Level Indicator Transmitter",
    category: CATEGORY_INSTRUMENTS,
    kind: TagKind::Instrument,
    units: "%",
};

pub const DIFFERENTIAL_PRESSURE_TRANSMITTER: TagPrefix = TagPrefix {
    prefix: "PDIT_",
    description: "Differential Pressure Indicator Transmitter",
    category: CATEGORY_INSTRUMENTS,
    kind: TagKind::Instrument,
    units: "PSI",
};

pub const PRESSURE_RATE_CONTROLLER: TagPrefix = TagPrefix {
    prefix: "PRC_",
    description: "Pressure Rate Controller",
    category: CATEGORY_CONTROLLERS,
    kind: TagKind::Controller,
    units: "PSI",
};

pub const TEMPERATURE_RATE_CONTROLLER: TagPrefix = TagPrefix {
    prefix: "TRC_",
    description: "Temperature Rate Controller",
    category: CATEGORY_CONTROLLERS,
    kind: TagKind::Controller,
    units: "°F",
};

pub const FLOW_RATE_CONTROLLER: TagPrefix = TagPrefix {
    prefix: "FRC_",
    description: "Flow Rate Controller",
    category: CATEGORY_CONTROLLERS,
    kind: TagKind::Controller,
    units: "SCFH",
};

/// Row used when no prefix matches.
pub const UNCLASSIFIED: TagPrefix = TagPrefix {
    prefix: "",
    description: "Industrial Tag",
    category: CATEGORY_OTHER,
    kind: TagKind::Instrument,
    units: "",
};

// Mutually exclusive: no entry is a prefix of another.
pub const PREFIXES: &[TagPrefix] = &[
    FLOW_TRANSMITTER,
    FLOW_INDICATOR_TRANSMITTER,
    TEMPERATURE_INDICATOR_TRANSMITTER,
    PRESSURE_INDICATOR_TRANSMITTER,
    LEVEL_INDICATOR_TRANSMITTER,
    DIFFERENTIAL_PRESSURE_TRANSMITTER,
    PRESSURE_RATE_CONTROLLER,
    TEMPERATURE_RATE_CONTROLLER,
    FLOW_RATE_CONTROLLER,
];

/// Case-sensitive lookup; falls back to [`UNCLASSIFIED`].
pub fn classify(name: &str) -> &'static TagPrefix {
    PREFIXES
        .iter()
        .find(|row| name.starts_with(row.prefix))
        .unwrap_or(&UNCLASSIFIED)
}

pub fn describe(name: &str) -> String {
    format!("{} {}", classify(name).description, name)
}

/// Kind of a tag typed by an operator. Case-insensitive, and `None` for
/// names that follow no known convention.
pub fn detect_kind(name: &str) -> Option<TagKind> {
    let upper = name.to_uppercase();
    PREFIXES
        .iter()
        .find(|row| upper.starts_with(row.prefix))
        .map(|row| row.kind)
}
