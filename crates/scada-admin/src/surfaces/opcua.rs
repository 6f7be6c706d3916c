use super::{Poller, Surface};
use crate::render::{Level, Renderer};
use futures::future::BoxFuture;
use futures::FutureExt;
use scada_core::{OpcSlot, StructureNode};
use scada_io::{format_error, ClientError, ScadaClient};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

struct Inner {
    client: ScadaClient,
    renderer: Arc<dyn Renderer>,
    slots: Mutex<Vec<OpcSlot>>,
    /// Set on every activation; the next refresh also rebuilds the structure.
    structure_pending: AtomicBool,
}

/// OPC UA index table, plus the address-space preview loaded on activation.
pub struct OpcuaSurface {
    inner: Arc<Inner>,
    poller: Poller,
}

impl OpcuaSurface {
    pub fn new(client: ScadaClient, renderer: Arc<dyn Renderer>, period: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                renderer,
                slots: Mutex::new(Vec::new()),
                structure_pending: AtomicBool::new(false),
            }),
            poller: Poller::new("opcua", Some(period)),
        }
    }

    /// Fetch and render the table, propagating failures.
    pub async fn load_table(&self) -> Result<usize, ClientError> {
        self.inner.load_table().await
    }

    /// Fetch tags and render the structure preview, propagating failures.
    pub async fn load_structure(&self) -> Result<(), ClientError> {
        self.inner.load_structure().await
    }

    pub fn slots(&self) -> Vec<OpcSlot> {
        self.inner
            .slots
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Inner {
    async fn load_table(&self) -> Result<usize, ClientError> {
        let slots = self.client.opcua_table().await?;
        self.renderer.opcua_table(&slots);
        let count = slots.len();
        if let Ok(mut current) = self.slots.lock() {
            *current = slots;
        }
        debug!(slots = count, "opcua table loaded");
        Ok(count)
    }

    async fn load_structure(&self) -> Result<(), ClientError> {
        let tags = self.client.tags().await?;
        self.renderer.opcua_structure(&StructureNode::preview(&tags));
        Ok(())
    }

    async fn refresh(&self) {
        if self.structure_pending.swap(false, Ordering::AcqRel) {
            if let Err(e) = self.load_structure().await {
                warn!(error = %e, "opcua structure load failed");
                self.renderer.notify(Level::Error, &format_error(&e));
            }
        }

        if let Err(e) = self.load_table().await {
            warn!(error = %e, "opcua table refresh failed");
            self.renderer.notify(Level::Error, &format_error(&e));
        }
    }
}

impl Surface for OpcuaSurface {
    fn name(&self) -> &'static str {
        "opcua"
    }

    fn start(&self) {
        if self.poller.is_active() {
            return;
        }
        self.inner.structure_pending.store(true, Ordering::Release);
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
