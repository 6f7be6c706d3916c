use super::{CommandContext, CommandError};
use crate::infra::audit::AuditEventType;
use crate::render::Level;
use crate::runtime::config::OpcuaCommand;
use crate::surfaces::OpcuaSurface;
use scada_core::opcua;
use serde_json::json;
use std::sync::Arc;

pub(super) async fn execute(ctx: &CommandContext, command: OpcuaCommand) -> Result<(), CommandError> {
    match command {
        OpcuaCommand::Table => {
            surface(ctx).load_table().await?;
            Ok(())
        }
        OpcuaCommand::Structure => {
            surface(ctx).load_structure().await?;
            Ok(())
        }
        OpcuaCommand::Set { index, value } => set_value(ctx, index, &value).await,
        OpcuaCommand::Assign { index, tag_name } => assign(ctx, index, &tag_name).await,
        OpcuaCommand::Unassign { index } => unassign(ctx, index).await,
    }
}

fn surface(ctx: &CommandContext) -> OpcuaSurface {
    OpcuaSurface::new(
        ctx.client.clone(),
        Arc::clone(&ctx.renderer),
        ctx.config.opcua_interval,
    )
}

async fn set_value(ctx: &CommandContext, index: u32, raw: &str) -> Result<(), CommandError> {
    let value = opcua::parse_value(raw)?;
    ctx.client.set_opcua_value(index, value).await?;
    ctx.audit.record(
        AuditEventType::OpcuaValueWritten,
        json!({ "index": index, "value": value }),
    );
    ctx.renderer.notify(
        Level::Success,
        &format!("Value {value} written to index {index}"),
    );
    Ok(())
}

async fn assign(ctx: &CommandContext, index: u32, tag_name: &str) -> Result<(), CommandError> {
    let tag_name = tag_name.trim();
    if tag_name.is_empty() {
        return Err(CommandError::InvalidInput(
            "A tag name is required; use unassign to clear a slot".into(),
        ));
    }
    ctx.client.assign_opcua(tag_name, index).await?;
    ctx.audit.record(
        AuditEventType::OpcuaTagAssigned,
        json!({ "index": index, "tag_name": tag_name }),
    );
    ctx.renderer.notify(
        Level::Success,
        &format!("Tag {tag_name} assigned to index {index}"),
    );
    Ok(())
}

async fn unassign(ctx: &CommandContext, index: u32) -> Result<(), CommandError> {
    let prompt = format!("Remove the tag assigned to OPC UA index {index}?");
    if !ctx.confirmer.confirm(&prompt) {
        return Err(CommandError::Cancelled("Unassign cancelled".into()));
    }
    ctx.client.assign_opcua("", index).await?;
    ctx.audit
        .record(AuditEventType::OpcuaTagUnassigned, json!({ "index": index }));
    ctx.renderer
        .notify(Level::Success, &format!("Index {index} unassigned"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{audit_events, harness};
    use crate::render::testing::Rendered;
    use scada_core::SlotValueError;
    use serde_json::Value;
    use tempfile::tempdir;

    #[tokio::test]
    async fn set_value_writes_number() {
        let dir = tempdir().unwrap();
        let audit = dir.path().join("audit.jsonl");
        let h = harness([], Some(&audit));
        h.backend
            .route_json("PUT", "/opcua-table/7", &json!({"success": true}));

        execute(
            &h.ctx,
            OpcuaCommand::Set {
                index: 7,
                value: " 42.5 ".into(),
            },
        )
        .await
        .unwrap();

        let body: Value = serde_json::from_str(&h.backend.requests()[0].body).unwrap();
        assert_eq!(body, json!({"value": 42.5}));
        let events = audit_events(&audit);
        assert_eq!(events[0]["event_type"], "opcua_value_written");
        assert_eq!(events[0]["details"]["index"], 7);
    }

    #[tokio::test]
    async fn non_numeric_value_is_rejected_locally() {
        let h = harness([], None);
        for raw in ["abc", "NaN"] {
            let err = execute(
                &h.ctx,
                OpcuaCommand::Set {
                    index: 1,
                    value: raw.into(),
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(
                err,
                CommandError::SlotValue(SlotValueError::NotANumber(_) | SlotValueError::NonFinite)
            ));
        }
        assert!(h.backend.requests().is_empty());
    }

    #[tokio::test]
    async fn unassign_confirms_then_clears() {
        let h = harness(["y"], None);
        h.backend
            .route_json("POST", "/opcua-assign", &json!({"success": true}));

        execute(&h.ctx, OpcuaCommand::Unassign { index: 3 })
            .await
            .unwrap();

        let body: Value = serde_json::from_str(&h.backend.requests()[0].body).unwrap();
        assert_eq!(body, json!({"tag_name": "", "index": 3}));
    }

    #[tokio::test]
    async fn declined_unassign_sends_nothing() {
        let h = harness(["n"], None);
        let err = execute(&h.ctx, OpcuaCommand::Unassign { index: 3 })
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(h.backend.requests().is_empty());
    }

    #[tokio::test]
    async fn assign_requires_a_tag() {
        let h = harness([], None);
        let err = execute(
            &h.ctx,
            OpcuaCommand::Assign {
                index: 3,
                tag_name: "  ".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CommandError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn table_renders_rows() {
        let h = harness([], None);
        h.backend.route_json(
            "GET",
            "/opcua-table",
            &json!([{"index": 0, "value": 10.0, "assigned_tag": "FIT_100.PV"}]),
        );

        execute(&h.ctx, OpcuaCommand::Table).await.unwrap();

        assert!(matches!(
            h.renderer.calls().as_slice(),
            [Rendered::OpcuaTable(slots)] if slots[0].assigned() == Some("FIT_100.PV")
        ));
    }
}
