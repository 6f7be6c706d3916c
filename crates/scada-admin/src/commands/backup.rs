use super::{CommandContext, CommandError};
use crate::infra::audit::AuditEventType;
use crate::render::Level;
use crate::runtime::config::BackupCommand;
use crate::surfaces::BackupsSurface;
use scada_core::format;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub(super) async fn execute(ctx: &CommandContext, command: BackupCommand) -> Result<(), CommandError> {
    match command {
        BackupCommand::Create => create(ctx).await,
        BackupCommand::List => {
            BackupsSurface::new(ctx.client.clone(), Arc::clone(&ctx.renderer))
                .load()
                .await?;
            Ok(())
        }
        BackupCommand::Restore { filename } => restore(ctx, &filename).await,
        BackupCommand::Download { filename, output } => download(ctx, &filename, output).await,
    }
}

async fn create(ctx: &CommandContext) -> Result<(), CommandError> {
    let ack = ctx.client.create_backup().await?;
    let filename = ack.field("filename").map(str::to_string);
    ctx.audit.record(
        AuditEventType::BackupCreated,
        json!({ "filename": filename }),
    );
    let message = match &filename {
        Some(name) => format!("Backup created: {name}"),
        None => "Backup created".to_string(),
    };
    ctx.renderer.notify(Level::Success, &message);
    Ok(())
}

async fn restore(ctx: &CommandContext, filename: &str) -> Result<(), CommandError> {
    let prompt = format!("Restore backup {filename}? The current configuration will be replaced.");
    if !ctx.confirmer.confirm(&prompt) {
        return Err(CommandError::Cancelled("Restore cancelled".into()));
    }
    ctx.client.restore_backup(filename).await?;
    info!(filename, "backup restored");
    ctx.audit
        .record(AuditEventType::BackupRestored, json!({ "filename": filename }));
    ctx.renderer
        .notify(Level::Success, &format!("Backup {filename} restored"));
    Ok(())
}

/// Local destination: the explicit path, else the archive's base name in the
/// working directory.
fn destination(filename: &str, output: Option<PathBuf>) -> Result<PathBuf, CommandError> {
    if let Some(output) = output {
        return Ok(output);
    }
    Path::new(filename)
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| CommandError::InvalidInput(format!("Invalid backup name '{filename}'")))
}

async fn download(
    ctx: &CommandContext,
    filename: &str,
    output: Option<PathBuf>,
) -> Result<(), CommandError> {
    let path = destination(filename, output)?;
    let bytes = ctx.client.download_backup(filename).await?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| CommandError::io(&path, e))?;

    let digest = format!("{:x}", Sha256::digest(&bytes));
    info!(filename, path = %path.display(), bytes = bytes.len(), sha256 = %digest, "backup downloaded");
    ctx.audit.record(
        AuditEventType::BackupDownloaded,
        json!({
            "filename": filename,
            "path": path.display().to_string(),
            "bytes": bytes.len(),
            "sha256": digest,
        }),
    );
    ctx.renderer.notify(
        Level::Success,
        &format!(
            "Saved {} ({}), sha256 {digest}",
            path.display(),
            format::file_size(bytes.len() as u64)
        ),
    );
    Ok(())
}
