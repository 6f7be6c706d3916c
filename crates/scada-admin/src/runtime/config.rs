use clap::{Args, Parser, Subcommand, ValueEnum};
use scada_core::{StatusFilter, TagKind};
use scada_io::{ClientConfig, DEFAULT_BASE_URL};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "scada-admin")]
#[command(about = "Administration client for the SCADA tag and OPC UA backend")]
#[command(version)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "SCADA_API_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds (default: none)
    #[arg(long, env = "SCADA_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// PEM bundle of extra CA certificates for HTTPS backends
    #[arg(long, env = "SCADA_CA_CERT")]
    pub ca_cert: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Also write logs to this file
    #[arg(long, env = "SCADA_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9100)
    #[arg(long, env = "SCADA_METRICS_ADDR")]
    pub metrics_addr: Option<String>,

    /// Append administrative changes to this JSONL file
    #[arg(long, env = "SCADA_AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Dashboard polling period
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub dashboard_interval: Duration,

    /// OPC UA table polling period
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub opcua_interval: Duration,

    /// Connection monitor period
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub health_interval: Duration,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe backend health
    Health,
    /// Show backend version, uptime and resource usage
    Status,
    /// Show tag, connection and alarm counters
    Stats,
    /// Live view with polling surfaces
    Watch(WatchArgs),
    #[command(subcommand)]
    Tags(TagsCommand),
    #[command(subcommand)]
    Templates(TemplatesCommand),
    #[command(subcommand)]
    Opcua(OpcuaCommand),
    #[command(subcommand)]
    Backup(BackupCommand),
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Subcommand name as typed, for logs and the audit trail.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Health => "health",
            Command::Status => "status",
            Command::Stats => "stats",
            Command::Watch(_) => "watch",
            Command::Tags(_) => "tags",
            Command::Templates(_) => "templates",
            Command::Opcua(_) => "opcua",
            Command::Backup(_) => "backup",
            Command::Config(_) => "config",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tab {
    Dashboard,
    Tags,
    Opcua,
    Backups,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Surface shown first
    #[arg(long, value_enum, default_value_t = Tab::Dashboard)]
    pub surface: Tab,

    /// Stop after this many seconds (default: until Ctrl-C)
    #[arg(long)]
    pub run_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Instrument,
    Controller,
}

impl From<KindArg> for TagKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Instrument => TagKind::Instrument,
            KindArg::Controller => TagKind::Controller,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Active,
    Inactive,
}

impl From<StatusArg> for StatusFilter {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Active => StatusFilter::Active,
            StatusArg::Inactive => StatusFilter::Inactive,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    /// List parent tags
    List {
        /// Case-insensitive match on name or description
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Show variables under each parent
        #[arg(long)]
        expand: bool,
    },
    /// Show one tag as stored by the backend
    Show { name: String },
    /// Create a measuring instrument
    CreateInstrument(InstrumentArgs),
    /// Create a PID controller
    CreateController(ControllerArgs),
    /// Update fields of a tag with key=value pairs
    Update {
        name: String,
        #[arg(required = true, value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
    /// Delete a parent tag and all of its variables
    Delete { name: String },
    /// Delete a single variable of a parent tag
    DeleteVariable { parent: String, variable: String },
}

#[derive(Debug, Args)]
pub struct CommonTagArgs {
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Defaults to the suggestion for the name prefix
    #[arg(long)]
    pub category: Option<String>,
    /// Defaults to the suggestion for the name prefix
    #[arg(long)]
    pub units: Option<String>,
    /// Defaults to TBL_<NAME>
    #[arg(long)]
    pub value_table: Option<String>,
    /// Defaults to TBL_TA_<NAME>
    #[arg(long)]
    pub alarm_table: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub opcua_index: u32,
}

#[derive(Debug, Args)]
pub struct InstrumentArgs {
    #[command(flatten)]
    pub common: CommonTagArgs,
    #[arg(long)]
    pub set_hh: Option<f64>,
    #[arg(long)]
    pub set_h: Option<f64>,
    #[arg(long)]
    pub set_l: Option<f64>,
    #[arg(long)]
    pub set_ll: Option<f64>,
    #[arg(long)]
    pub min: Option<f64>,
    #[arg(long)]
    pub max: Option<f64>,
}

#[derive(Debug, Args)]
pub struct ControllerArgs {
    #[command(flatten)]
    pub common: CommonTagArgs,
    #[arg(long, default_value_t = 1.0)]
    pub kp: f64,
    #[arg(long, default_value_t = 0.1)]
    pub ki: f64,
    #[arg(long, default_value_t = 0.01)]
    pub kd: f64,
    #[arg(long, default_value_t = 0)]
    pub output_low: i64,
    #[arg(long, default_value_t = 100)]
    pub output_high: i64,
    /// Create with the PID loop disabled
    #[arg(long)]
    pub pid_disabled: bool,
    /// Start in automatic mode
    #[arg(long)]
    pub auto: bool,
}

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    List,
    Show { name: String },
}

#[derive(Debug, Subcommand)]
pub enum OpcuaCommand {
    /// Show the index table
    Table,
    /// Show the address space preview
    Structure,
    /// Write a value to a slot
    Set { index: u32, value: String },
    /// Bind a tag to a slot
    Assign { index: u32, tag_name: String },
    /// Clear the tag bound to a slot
    Unassign { index: u32 },
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    Create,
    List,
    Restore { filename: String },
    /// Save a backup locally
    Download {
        filename: String,
        /// Destination file (default: ./<filename>)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    Show,
    Validate,
    /// Replace the configuration with a JSON document
    Update {
        /// JSON file; `-` reads stdin
        file: PathBuf,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

/// Process-wide settings resolved from the command line.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub ca_cert: Option<PathBuf>,
    pub json_logs: bool,
    pub log_file: Option<PathBuf>,
    pub metrics_addr: Option<String>,
    pub audit_path: Option<PathBuf>,
    pub assume_yes: bool,
    pub dashboard_interval: Duration,
    pub opcua_interval: Duration,
    pub health_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            ca_cert: None,
            json_logs: false,
            log_file: None,
            metrics_addr: None,
            audit_path: None,
            assume_yes: false,
            dashboard_interval: Duration::from_secs(5),
            opcua_interval: Duration::from_secs(10),
            health_interval: Duration::from_secs(30),
        }
    }
}

impl RuntimeConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            base_url: cli.base_url.clone(),
            timeout: cli.timeout_secs.map(Duration::from_secs),
            ca_cert: cli.ca_cert.clone(),
            json_logs: cli.json_logs,
            log_file: cli.log_file.clone(),
            metrics_addr: cli.metrics_addr.clone(),
            audit_path: cli.audit_log.clone(),
            assume_yes: cli.yes,
            dashboard_interval: cli.dashboard_interval,
            opcua_interval: cli.opcua_interval,
            health_interval: cli.health_interval,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            ca_cert: self.ca_cert.clone(),
        }
    }
}
