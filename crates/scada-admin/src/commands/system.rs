use super::{CommandContext, CommandError};
use crate::infra::audit::AuditEventType;
use crate::render::Level;
use crate::runtime::config::{ConfigCommand, TemplatesCommand};
use scada_core::backup::Verdict;
use scada_core::SystemInfo;
use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;

pub(super) async fn health(ctx: &CommandContext) -> Result<(), CommandError> {
    let report = ctx.client.health().await?;
    if report.is_healthy() {
        ctx.renderer.notify(Level::Success, "Backend is healthy");
    } else {
        ctx.renderer.notify(
            Level::Warning,
            &format!("Backend reports status '{}'", report.status),
        );
    }
    Ok(())
}

pub(super) async fn status(ctx: &CommandContext) -> Result<(), CommandError> {
    let status = ctx.client.status().await?;
    ctx.renderer.system(&SystemInfo::from_status(Some(&status)));
    Ok(())
}

pub(super) async fn statistics(ctx: &CommandContext) -> Result<(), CommandError> {
    let statistics = ctx.client.statistics().await?;
    ctx.renderer.statistics(Some(&statistics));
    Ok(())
}

pub(super) async fn templates(
    ctx: &CommandContext,
    command: TemplatesCommand,
) -> Result<(), CommandError> {
    match command {
        TemplatesCommand::List => {
            let templates = ctx.client.templates().await?;
            ctx.renderer.templates(&templates);
        }
        TemplatesCommand::Show { name } => {
            let template = ctx.client.template(&name).await?;
            ctx.renderer.document(&name, &template);
        }
    }
    Ok(())
}

pub(super) async fn config(ctx: &CommandContext, command: ConfigCommand) -> Result<(), CommandError> {
    match command {
        ConfigCommand::Show => {
            let config = ctx.client.config().await?;
            ctx.renderer.document("Configuration", &config);
            Ok(())
        }
        ConfigCommand::Validate => {
            let report = ctx.client.validate_config().await?;
            ctx.renderer.validation(&report);
            match report.verdict() {
                Verdict::Invalid => Err(CommandError::InvalidInput(format!(
                    "Configuration has {} errors",
                    report.errors.len()
                ))),
                Verdict::Clean | Verdict::Warnings => Ok(()),
            }
        }
        ConfigCommand::Update { file } => {
            let document = read_document(&file)?;
            ctx.client.update_config(&document).await?;
            ctx.audit.record(
                AuditEventType::ConfigUpdated,
                json!({ "source": file.display().to_string() }),
            );
            ctx.renderer
                .notify(Level::Success, "Configuration updated");
            Ok(())
        }
    }
}

/// JSON from a file, or from stdin for `-`.
fn read_document(path: &Path) -> Result<Value, CommandError> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|e| CommandError::io(path, e))?;
        raw
    } else {
        std::fs::read_to_string(path).map_err(|e| CommandError::io(path, e))?
    };
    serde_json::from_str(&raw).map_err(|e| {
        CommandError::InvalidInput(format!("{} is not valid JSON: {e}", path.display()))
    })
}
