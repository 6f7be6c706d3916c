pub mod backup;
pub mod clock;
pub mod definition;
pub mod filter;
pub mod format;
pub mod hierarchy;
mod hierarchy_proptest;
pub mod history;
pub mod model;
pub mod opcua;
pub mod system;
pub mod tags;

pub use backup::{BackupEntry, ValidationReport, ValidationSummary, Verdict};
pub use clock::SessionClock;
pub use definition::{
    AlarmSettings, DefinitionError, FormSuggestion, PidSettings, TagDefinition, Unvalidated,
    Validated,
};
pub use filter::{StatusFilter, TagFilter};
pub use hierarchy::build;
pub use history::{MetricsHistory, MetricsPoint};
pub use model::{FlatTag, ParentTag, Quality, TagKind, Variable};
pub use opcua::{OpcSlot, SlotValueError, StructureNode};
pub use system::{HealthReport, Statistics, SystemInfo, SystemStatus};
