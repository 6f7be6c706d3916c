use super::{CommandContext, CommandError};
use crate::infra::audit::AuditEventType;
use crate::render::Level;
use crate::runtime::config::{CommonTagArgs, ControllerArgs, InstrumentArgs, TagsCommand};
use crate::surfaces::TagsSurface;
use scada_core::definition::{self, AlarmSettings, PidSettings, TagDefinition};
use scada_core::{TagFilter, TagKind};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Parents with more variables than this need the name typed back.
const TYPED_CONFIRMATION_THRESHOLD: usize = 5;

pub(super) async fn execute(ctx: &CommandContext, command: TagsCommand) -> Result<(), CommandError> {
    match command {
        TagsCommand::List {
            search,
            kind,
            status,
            expand,
        } => {
            let filter = TagFilter {
                search,
                kind: kind.map(Into::into),
                status: status.map(Into::into),
            };
            list(ctx, filter, expand).await
        }
        TagsCommand::Show { name } => {
            let document = ctx.client.tag(&name).await?;
            ctx.renderer.document(&name, &document);
            Ok(())
        }
        TagsCommand::CreateInstrument(args) => create_instrument(ctx, args).await,
        TagsCommand::CreateController(args) => create_controller(ctx, args).await,
        TagsCommand::Update { name, fields } => update(ctx, &name, &fields).await,
        TagsCommand::Delete { name } => delete_parent(ctx, &name).await,
        TagsCommand::DeleteVariable { parent, variable } => {
            delete_variable(ctx, &parent, &variable).await
        }
    }
}

fn surface(ctx: &CommandContext) -> TagsSurface {
    TagsSurface::new(ctx.client.clone(), Arc::clone(&ctx.renderer))
}

async fn list(ctx: &CommandContext, filter: TagFilter, expand: bool) -> Result<(), CommandError> {
    let mut surface = surface(ctx).with_filter(filter);
    if expand {
        surface = surface.expand_on_load();
    }
    surface.load().await?;
    Ok(())
}

fn base_definition(common: CommonTagArgs, kind: TagKind) -> TagDefinition {
    let mut definition = TagDefinition::new(common.name, kind).with_opcua_index(common.opcua_index);
    if let Some(description) = common.description {
        definition = definition.with_description(description);
    }
    if let Some(category) = common.category {
        definition = definition.with_category(category);
    }
    if let Some(units) = common.units {
        definition = definition.with_units(units);
    }
    if let Some(table) = common.value_table {
        definition = definition.with_value_table(table);
    }
    if let Some(table) = common.alarm_table {
        definition = definition.with_alarm_table(table);
    }
    definition
}

async fn create_instrument(ctx: &CommandContext, args: InstrumentArgs) -> Result<(), CommandError> {
    let alarms = AlarmSettings {
        set_hh: args.set_hh,
        set_h: args.set_h,
        set_l: args.set_l,
        set_ll: args.set_ll,
        min: args.min,
        max: args.max,
    };
    let definition = base_definition(args.common, TagKind::Instrument)
        .with_alarm_settings(alarms)
        .validate()?;
    create(ctx, definition).await
}

async fn create_controller(ctx: &CommandContext, args: ControllerArgs) -> Result<(), CommandError> {
    let pid = PidSettings {
        kp: args.kp,
        ki: args.ki,
        kd: args.kd,
        output_low: args.output_low,
        output_high: args.output_high,
        pid_enable: !args.pid_disabled,
        auto_manual: args.auto,
    };
    let definition = base_definition(args.common, TagKind::Controller)
        .with_pid_settings(pid)
        .validate()?;
    create(ctx, definition).await
}

async fn create(
    ctx: &CommandContext,
    definition: TagDefinition<definition::Validated>,
) -> Result<(), CommandError> {
    let ack = ctx.client.create_tag(&definition).await?;
    info!(tag = %definition.name, kind = %definition.kind(), "tag created");
    ctx.audit.record(
        AuditEventType::TagCreated,
        json!({
            "name": definition.name,
            "kind": definition.kind(),
            "opcua_table_index": definition.opcua_table_index,
        }),
    );
    let message = ack
        .message
        .unwrap_or_else(|| format!("Tag {} created", definition.name));
    ctx.renderer.notify(Level::Success, &message);
    Ok(())
}

async fn update(
    ctx: &CommandContext,
    name: &str,
    fields: &[(String, String)],
) -> Result<(), CommandError> {
    let document =
        definition::update_document(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    ctx.client.update_tag(name, &document).await?;
    ctx.audit.record(
        AuditEventType::TagUpdated,
        json!({ "name": name, "fields": document }),
    );
    ctx.renderer
        .notify(Level::Success, &format!("Tag {name} updated"));
    Ok(())
}

/// Removes every variable by full name, then the parent. Stops at the first
/// failed request.
async fn delete_parent(ctx: &CommandContext, name: &str) -> Result<(), CommandError> {
    let flat = ctx.client.tags().await?;
    let parent = scada_core::build(&flat)
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| CommandError::NotFound(format!("Tag {name} not found")))?;

    let prompt = format!(
        "Delete tag {name} with {} variables and {} alarms? This cannot be undone.",
        parent.variable_count, parent.alarm_count
    );
    if !ctx.confirmer.confirm(&prompt) {
        return Err(CommandError::Cancelled("Deletion cancelled".into()));
    }
    if parent.variable_count > TYPED_CONFIRMATION_THRESHOLD {
        let prompt = format!("Type {name} to confirm deleting all of its variables:");
        if !ctx.confirmer.confirm_typed(&prompt, name) {
            return Err(CommandError::Cancelled(
                "Confirmation incorrect, cancelled".into(),
            ));
        }
    }

    for variable in &parent.variables {
        ctx.client.delete_tag(&variable.full_name).await?;
    }
    ctx.client.delete_tag(name).await?;

    info!(tag = name, variables = parent.variable_count, "tag deleted");
    ctx.audit.record(
        AuditEventType::TagDeleted,
        json!({ "name": name, "variables": parent.variable_count }),
    );
    ctx.renderer.notify(
        Level::Success,
        &format!(
            "Tag {name} and {} variables deleted",
            parent.variable_count
        ),
    );
    Ok(())
}

async fn delete_variable(
    ctx: &CommandContext,
    parent: &str,
    variable: &str,
) -> Result<(), CommandError> {
    let full_name = format!("{parent}.{variable}");
    if !ctx
        .confirmer
        .confirm(&format!("Delete variable {full_name}?"))
    {
        return Err(CommandError::Cancelled("Deletion cancelled".into()));
    }
    if !ctx.confirmer.confirm(&format!(
        "Last confirmation: {full_name} will be permanently removed. Continue?"
    )) {
        return Err(CommandError::Cancelled("Deletion cancelled".into()));
    }

    ctx.client.delete_tag(&full_name).await?;
    ctx.audit.record(
        AuditEventType::VariableDeleted,
        json!({ "parent": parent, "variable": variable }),
    );
    ctx.renderer
        .notify(Level::Success, &format!("Variable {full_name} deleted"));
    Ok(())
}
