//! Polling surfaces: one per view, each with its own refresh schedule.
//!
//! A surface fetches immediately when started, then on its period if it has
//! one. Stopping never cancels a request already on the wire; the polling
//! task exits once the in-flight refresh has finished.

mod backups;
mod dashboard;
mod opcua;
mod tags;

pub use backups::BackupsSurface;
pub use dashboard::DashboardSurface;
pub use opcua::OpcuaSurface;
pub use tags::TagsSurface;

use futures::future::BoxFuture;
use scada_io::metrics::SURFACE_REFRESHES;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Lifecycle shared by every view and by the connection monitor.
pub trait Surface: Send + Sync {
    fn name(&self) -> &'static str;

    /// Begin polling with an immediate fetch. No-op while already active.
    fn start(&self);

    /// Suspend polling. In-flight requests are allowed to complete.
    fn stop(&self);

    /// One fetch-and-render pass. Failures are reported, never returned.
    fn refresh(&self) -> BoxFuture<'_, ()>;

    fn is_active(&self) -> bool;
}

#[derive(Default)]
struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

struct Running {
    signal: Arc<StopSignal>,
    task: JoinHandle<()>,
}

/// Drives a refresh closure on a tokio task.
///
/// `period: None` refreshes once per activation.
pub struct Poller {
    name: &'static str,
    period: Option<Duration>,
    running: Mutex<Option<Running>>,
}

impl Poller {
    pub fn new(name: &'static str, period: Option<Duration>) -> Self {
        Self {
            name,
            period,
            running: Mutex::new(None),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&self, refresh: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Ok(mut running) = self.running.lock() else {
            return;
        };
        if running.is_some() {
            return;
        }
        let signal = Arc::new(StopSignal::default());
        let task = tokio::spawn(poll(self.name, self.period, Arc::clone(&signal), refresh));
        debug!(surface = self.name, period = ?self.period, "polling started");
        *running = Some(Running { signal, task });
    }

    pub fn stop(&self) {
        let Some(running) = self.running.lock().ok().and_then(|mut r| r.take()) else {
            return;
        };
        running.signal.stopped.store(true, Ordering::Release);
        // notify_one keeps a permit if the task is mid-refresh
        running.signal.notify.notify_one();
        debug!(surface = self.name, "polling stop requested");
    }

    pub fn is_active(&self) -> bool {
        self.running.lock().map(|r| r.is_some()).unwrap_or(false)
    }

    /// Stop and wait for the polling task to exit.
    #[cfg(test)]
    pub async fn stop_and_join(&self) {
        let running = self.running.lock().ok().and_then(|mut r| r.take());
        if let Some(running) = running {
            running.signal.stopped.store(true, Ordering::Release);
            running.signal.notify.notify_one();
            let _ = running.task.await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll<F, Fut>(
    name: &'static str,
    period: Option<Duration>,
    signal: Arc<StopSignal>,
    refresh: F,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    let Some(period) = period else {
        if !signal.stopped.load(Ordering::Acquire) {
            refresh().await;
            SURFACE_REFRESHES.with_label_values(&[name]).inc();
        }
        return;
    };

    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = signal.notify.notified() => {}
        }
        if signal.stopped.load(Ordering::Acquire) {
            break;
        }
        refresh().await;
        SURFACE_REFRESHES.with_label_values(&[name]).inc();
    }
    debug!(surface = name, "polling stopped");
}
