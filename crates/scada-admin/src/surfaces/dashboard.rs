use super::{Poller, Surface};
use crate::render::{DashboardView, Level, Renderer};
use futures::future::BoxFuture;
use futures::FutureExt;
use scada_core::clock;
use scada_core::system::{self, ActivityEntry};
use scada_core::{MetricsHistory, MetricsPoint, Statistics, SystemInfo, SystemStatus};
use scada_io::{format_error, ClientError, ScadaClient};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Default)]
struct DashboardState {
    statistics: Option<Statistics>,
    status: Option<SystemStatus>,
    history: MetricsHistory,
    activity: Vec<ActivityEntry>,
    /// Last error shown to the user; repeated failures are not re-notified.
    last_error: Option<String>,
}

struct Inner {
    client: ScadaClient,
    renderer: Arc<dyn Renderer>,
    state: Mutex<DashboardState>,
}

/// Counters, system information, connection badge, metrics history and
/// recent activity.
pub struct DashboardSurface {
    inner: Arc<Inner>,
    poller: Poller,
}

impl DashboardSurface {
    pub fn new(client: ScadaClient, renderer: Arc<dyn Renderer>, period: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                renderer,
                state: Mutex::new(DashboardState::default()),
            }),
            poller: Poller::new("dashboard", Some(period)),
        }
    }

    pub fn history_len(&self) -> usize {
        self.inner
            .state
            .lock()
            .map(|s| s.history.len())
            .unwrap_or_default()
    }
}

impl Inner {
    async fn refresh(&self) {
        let (statistics, status, health) = tokio::join!(
            self.client.statistics(),
            self.client.status(),
            self.client.health(),
        );
        let now = clock::unix_secs();

        let mut failures: Vec<ClientError> = Vec::new();
        let statistics = statistics.map_err(|e| failures.push(e)).ok();
        let status = status.map_err(|e| failures.push(e)).ok();
        let health = health.map_err(|e| failures.push(e)).ok();

        let (view, notice) = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };

            if let Some(status) = &status {
                let total_tags = statistics
                    .as_ref()
                    .map(|s| s.total_tags)
                    .or_else(|| state.history.latest().map(|p| p.total_tags))
                    .unwrap_or_default();
                state.history.push(MetricsPoint {
                    at: now,
                    cpu_percent: status.cpu_usage,
                    memory_mb: status.memory_usage as f64 / BYTES_PER_MB,
                    total_tags,
                });
            }
            state.statistics = statistics;
            state.status = status;
            state.activity = system::activity_from_health(health.as_ref(), now);

            let message = failures.first().map(format_error);
            let notice = match (&message, &state.last_error) {
                (Some(new), Some(old)) if new == old => None,
                (Some(new), _) => Some(new.clone()),
                (None, _) => None,
            };
            state.last_error = message;

            let view = DashboardView {
                statistics: state.statistics.clone(),
                system: SystemInfo::from_status(state.status.as_ref()),
                connection: self.client.connection_status(),
                history: state.history.iter().copied().collect(),
                activity: state.activity.clone(),
            };
            (view, notice)
        };

        for failure in &failures {
            warn!(error = %failure, "dashboard fetch failed");
        }
        if let Some(message) = notice {
            self.renderer.notify(Level::Error, &message);
        }
        self.renderer.dashboard(&view);
    }
}

impl Surface for DashboardSurface {
    fn name(&self) -> &'static str {
        "dashboard"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::RecordingRenderer;
    use scada_core::system::ActivityLevel;
    use scada_io::mock::MockBackend;
    use scada_io::ClientConfig;
    use serde_json::json;

    fn surface(backend: &MockBackend) -> (DashboardSurface, Arc<RecordingRenderer>) {
        let client = ScadaClient::new(&ClientConfig {
            base_url: backend.base_url().to_string(),
            ..Default::default()
        })
        .unwrap();
        let renderer = Arc::new(RecordingRenderer::default());
        let surface = DashboardSurface::new(client, renderer.clone(), Duration::from_millis(50));
        (surface, renderer)
    }

    fn healthy_backend() -> MockBackend {
        let backend = MockBackend::start().unwrap();
        backend.route_json(
            "GET",
            "/statistics",
            &json!({"success": true, "data": {"total_tags": 42, "opcua_connections": 2,
                "monitored_variables": 120, "active_alarms": 1}}),
        );
        backend.route_json(
            "GET",
            "/status",
            &json!({"version": "2.1.0", "uptime": 7260, "memory_usage": 52428800, "cpu_usage": 12.5}),
        );
        backend.route_json("GET", "/health", &json!({"status": "healthy"}));
        backend
    }

    #[tokio::test]
    async fn refresh_builds_full_view() {
        let backend = healthy_backend();
        let (surface, renderer) = surface(&backend);

        surface.refresh().await;

        let views = renderer.dashboards();
        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.statistics.as_ref().map(|s| s.total_tags), Some(42));
        assert_eq!(view.system.version, "2.1.0");
        assert_eq!(view.system.uptime, "2h 1m");
        assert_eq!(view.system.memory, "50.0 MB");
        assert_eq!(view.system.cpu, "12.5%");
        assert!(view.connection.online);
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].total_tags, 42);
        assert_eq!(view.activity[0].level, ActivityLevel::Success);
        assert!(renderer.notices().is_empty());
    }

    #[tokio::test]
    async fn partial_failure_shows_placeholders() {
        let backend = healthy_backend();
        backend.route("GET", "/statistics", 500, "boom");
        let (surface, renderer) = surface(&backend);

        surface.refresh().await;

        let view = renderer.dashboards().pop().unwrap();
        assert!(view.statistics.is_none());
        assert_eq!(view.system.version, "2.1.0");
        assert_eq!(
            renderer.notices(),
            vec![(Level::Error, "Internal server error".to_string())]
        );
    }

    #[tokio::test]
    async fn unreachable_backend_notifies_once() {
        let backend = MockBackend::start().unwrap();
        let base_url = backend.base_url().to_string();
        drop(backend);
        let client = ScadaClient::new(&ClientConfig {
            base_url,
            ..Default::default()
        })
        .unwrap();
        let renderer = Arc::new(RecordingRenderer::default());
        let surface = DashboardSurface::new(client, renderer.clone(), Duration::from_secs(5));

        surface.refresh().await;
        surface.refresh().await;

        let views = renderer.dashboards();
        assert_eq!(views.len(), 2);
        assert!(!views[1].connection.online);
        assert_eq!(views[1].system.uptime, "-");
        assert_eq!(views[1].activity[0].level, ActivityLevel::Danger);
        assert_eq!(renderer.notices().len(), 1);
        assert_eq!(surface.history_len(), 0);
    }

    #[tokio::test]
    async fn polling_accumulates_history_until_stopped() {
        let backend = healthy_backend();
        let (surface, _renderer) = surface(&backend);

        surface.start();
        assert!(surface.is_active());
        tokio::time::sleep(Duration::from_millis(230)).await;
        surface.poller.stop_and_join().await;
        assert!(!surface.is_active());

        let polled = backend.hits("GET", "/status");
        assert!(polled >= 3, "only {polled} polls");
        assert_eq!(surface.history_len(), polled);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(backend.hits("GET", "/status"), polled);
    }
}
