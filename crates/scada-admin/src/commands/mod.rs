//! One-shot administrative commands and the interactive `watch` session.
//!
//! Every command reports through the renderer; failures are returned to the
//! caller, which turns them into a notification and a non-zero exit status.

mod backup;
mod opcua;
mod system;
mod tags;
mod watch;

use crate::confirm::Confirmer;
use crate::infra::audit::AuditTrail;
use crate::render::Renderer;
use crate::runtime::config::{Command, RuntimeConfig};
use scada_core::{DefinitionError, SlotValueError};
use scada_io::{format_error, ClientError, ScadaClient};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub struct CommandContext {
    pub client: ScadaClient,
    pub renderer: Arc<dyn Renderer>,
    pub confirmer: Arc<dyn Confirmer>,
    pub audit: AuditTrail,
    pub config: RuntimeConfig,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Invalid tag definition: {0}")]
    Definition(#[from] DefinitionError),

    #[error("Invalid value: {0}")]
    SlotValue(#[from] SlotValueError),

    /// The operator declined a confirmation.
    #[error("{0}")]
    Cancelled(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),
}

impl CommandError {
    /// Text shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => format_error(e),
            other => other.to_string(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Cancelled(_) => 2,
            _ => 1,
        }
    }

    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub async fn execute(ctx: &CommandContext, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Health => system::health(ctx).await,
        Command::Status => system::status(ctx).await,
        Command::Stats => system::statistics(ctx).await,
        Command::Watch(args) => watch::run(ctx, args).await,
        Command::Tags(command) => tags::execute(ctx, command).await,
        Command::Templates(command) => system::templates(ctx, command).await,
        Command::Opcua(command) => opcua::execute(ctx, command).await,
        Command::Backup(command) => backup::execute(ctx, command).await,
        Command::Config(command) => system::config(ctx, command).await,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::confirm::testing::ScriptedConfirmer;
    use crate::render::testing::RecordingRenderer;
    use scada_io::mock::MockBackend;
    use scada_io::ClientConfig;
    use std::path::Path;

    pub struct Harness {
        pub backend: MockBackend,
        pub renderer: Arc<RecordingRenderer>,
        pub confirmer: Arc<ScriptedConfirmer>,
        pub ctx: CommandContext,
    }

    /// Context against a fresh fake backend, answering confirmations from
    /// `answers` and auditing to `audit` when given.
    pub fn harness<'a>(
        answers: impl IntoIterator<Item = &'a str>,
        audit: Option<&Path>,
    ) -> Harness {
        let backend = MockBackend::start().unwrap();
        let client = ScadaClient::new(&ClientConfig {
            base_url: backend.base_url().to_string(),
            ..Default::default()
        })
        .unwrap();
        let renderer = Arc::new(RecordingRenderer::default());
        let confirmer = Arc::new(ScriptedConfirmer::new(answers));
        let ctx = CommandContext {
            client,
            renderer: renderer.clone(),
            confirmer: confirmer.clone(),
            audit: AuditTrail::open(audit, backend.base_url()).unwrap(),
            config: RuntimeConfig::default(),
        };
        Harness {
            backend,
            renderer,
            confirmer,
            ctx,
        }
    }

    pub fn audit_events(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_has_its_own_exit_code() {
        assert_eq!(CommandError::Cancelled("no".into()).exit_code(), 2);
        assert_eq!(CommandError::NotFound("x".into()).exit_code(), 1);
    }

    #[test]
    fn client_errors_use_friendly_text() {
        let err = CommandError::from(ClientError::Http {
            status: 404,
            reason: "Not Found".into(),
        });
        assert_eq!(err.user_message(), "Resource not found");

        let err = CommandError::from(ClientError::Application {
            message: "Tag already exists".into(),
        });
        assert_eq!(err.user_message(), "Error: Tag already exists");
    }
}
