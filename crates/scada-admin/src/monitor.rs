//! Background reachability probe, independent of the visible surface.

use crate::surfaces::{Poller, Surface};
use futures::future::BoxFuture;
use futures::FutureExt;
use scada_io::ScadaClient;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

struct Inner {
    client: ScadaClient,
    /// `None` until the first probe completes.
    last_online: Mutex<Option<bool>>,
}

impl Inner {
    async fn probe(&self) {
        match self.client.health().await {
            Ok(report) if !report.is_healthy() => {
                warn!(status = %report.status, "backend reports degraded health");
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "health probe failed"),
        }

        let online = self.client.is_online();
        let Ok(mut last) = self.last_online.lock() else {
            return;
        };
        match (*last, online) {
            (Some(previous), now) if previous == now => {}
            (_, true) => info!(backend = self.client.base_url(), "backend online"),
            (_, false) => warn!(backend = self.client.base_url(), "backend offline"),
        }
        *last = Some(online);
    }
}

pub struct ConnectionMonitor {
    inner: Arc<Inner>,
    poller: Poller,
}

impl ConnectionMonitor {
    pub fn new(client: ScadaClient, period: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                last_online: Mutex::new(None),
            }),
            poller: Poller::new("monitor", Some(period)),
        }
    }

    pub fn last_online(&self) -> Option<bool> {
        self.inner.last_online.lock().ok().and_then(|l| *l)
    }
}

impl Surface for ConnectionMonitor {
    fn name(&self) -> &'static str {
        "monitor"
    }

    fn start(&self) {
        let inner = Arc::clone(&self.inner);
        self.poller.start(move || {
            let inner = Arc::clone(&inner);
            async move { inner.probe().await }
        });
    }

    fn stop(&self) {
        self.poller.stop();
    }

    fn refresh(&self) -> BoxFuture<'_, ()> {
        self.inner.probe().boxed()
    }

    fn is_active(&self) -> bool {
        self.poller.is_active()
    }
}
