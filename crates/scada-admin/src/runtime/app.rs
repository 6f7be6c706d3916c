use crate::commands::{self, CommandContext};
use crate::confirm::{AssumeYes, Confirmer, StdinConfirmer};
use crate::infra::audit::{AuditEventType, AuditTrail};
use crate::render::{Level, Renderer, TerminalRenderer};
use crate::runtime::config::{Cli, Command, RuntimeConfig};
use crate::runtime::{logging::init_tracing, telemetry};
use clap::Parser;
use scada_io::{format_error, ScadaClient};
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

pub fn run_from_args() -> ExitCode {
    let cli = Cli::parse();
    let config = RuntimeConfig::from_cli(&cli);
    run(config, cli.command)
}

pub fn run(config: RuntimeConfig, command: Command) -> ExitCode {
    let _log_guard = init_tracing(config.json_logs, config.log_file.as_deref());
    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(config.metrics_addr.as_deref());

    let renderer: Arc<dyn Renderer> = Arc::new(TerminalRenderer::stdout());

    let client = match ScadaClient::new(&config.client_config()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build API client");
            renderer.notify(Level::Error, &format_error(&e));
            return ExitCode::FAILURE;
        }
    };

    let audit = match init_audit_trail(&config, client.base_url()) {
        Ok(audit) => audit,
        Err(message) => {
            renderer.notify(Level::Error, &message);
            return ExitCode::FAILURE;
        }
    };

    let confirmer: Arc<dyn Confirmer> = if config.assume_yes {
        Arc::new(AssumeYes)
    } else {
        Arc::new(StdinConfirmer)
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            renderer.notify(Level::Error, &format!("Failed to start async runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    let command_name = command.name();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = command_name,
        backend = client.base_url(),
        "scada-admin starting"
    );
    audit.record(
        AuditEventType::SessionStart,
        json!({ "version": env!("CARGO_PKG_VERSION"), "command": command_name }),
    );

    let ctx = CommandContext {
        client: client.clone(),
        renderer: Arc::clone(&renderer),
        confirmer,
        audit: audit.clone(),
        config,
    };
    let result = runtime.block_on(commands::execute(&ctx, command));
    // A pending stdin read would otherwise hold up shutdown.
    runtime.shutdown_background();

    let code = match &result {
        Ok(()) => 0,
        Err(e) => {
            let level = match e {
                commands::CommandError::Cancelled(_) => Level::Warning,
                _ => Level::Error,
            };
            renderer.notify(level, &e.user_message());
            e.exit_code()
        }
    };
    audit.record(
        AuditEventType::SessionEnd,
        json!({ "exit_code": code, "backend_online": client.is_online() }),
    );
    info!(command = command_name, exit_code = code, "scada-admin finished");
    ExitCode::from(code)
}

fn init_audit_trail(config: &RuntimeConfig, backend: &str) -> Result<AuditTrail, String> {
    AuditTrail::open(config.audit_path.as_deref(), backend).map_err(|e| {
        let path = config
            .audit_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        error!(error = %e, path = %path, "failed to open audit log");
        format!("Failed to open audit log {path}: {e}")
    })
}
