use super::{Poller, Surface};
use crate::render::{Level, Renderer};
use futures::future::BoxFuture;
use futures::FutureExt;
use scada_core::BackupEntry;
use scada_io::{format_error, ClientError, ScadaClient};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

struct Inner {
    client: ScadaClient,
    renderer: Arc<dyn Renderer>,
    backups: Mutex<Vec<BackupEntry>>,
}

impl Inner {
    async fn load(&self) -> Result<usize, ClientError> {
        let backups = self.client.backups().await?;
        self.renderer.backups(&backups);
        let count = backups.len();
        if let Ok(mut current) = self.backups.lock() {
            *current = backups;
        }
        debug!(backups = count, "backups loaded");
        Ok(count)
    }

    async fn refresh(&self) {
        if let Err(e) = self.load().await {
            warn!(error = %e, "backup list refresh failed");
            self.renderer.notify(Level::Error, &format_error(&e));
        }
    }
}

/// Backup archive list. Loads once per activation.
pub struct BackupsSurface {
    inner: Arc<Inner>,
    poller: Poller,
}

impl BackupsSurface {
    pub fn new(client: ScadaClient, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                renderer,
                backups: Mutex::new(Vec::new()),
            }),
            poller: Poller::new("backups", None),
        }
    }

    pub async fn load(&self) -> Result<usize, ClientError> {
        self.inner.load().await
    }

    pub fn backups(&self) -> Vec<BackupEntry> {
        self.inner
            .backups
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }
}

impl Surface for BackupsSurface {
    fn name(&self) -> &'static str {
        "backups"
    }

    fn start(&self) {
        let inner = Arc::clone(&self.inner);
        self.poller.start(move || {
            let inner = Arc::clone(&inner);
            async move { inner.refresh().await }
        });
    }

    fn stop(&self) {
        self.poller.stop();
    }

    fn refresh(&self) -> BoxFuture<'_, ()> {
        self.inner.refresh().boxed()
    }

    fn is_active(&self) -> bool {
        self.poller.is_active()
    }
}
