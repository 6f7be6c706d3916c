//! Tab switching and visibility: exactly one surface polls at a time.

use crate::render::Renderer;
use crate::runtime::config::{RuntimeConfig, Tab};
use crate::surfaces::{BackupsSurface, DashboardSurface, OpcuaSurface, Surface, TagsSurface};
use scada_io::ScadaClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct Navigator {
    surfaces: Vec<(Tab, Arc<dyn Surface>)>,
    current: Mutex<Tab>,
    visible: AtomicBool,
    tags: Option<Arc<TagsSurface>>,
}

impl Navigator {
    /// Nothing polls until [`Navigator::show`] or [`Navigator::set_visible`].
    pub fn new(surfaces: Vec<(Tab, Arc<dyn Surface>)>, initial: Tab) -> Self {
        Self {
            surfaces,
            current: Mutex::new(initial),
            visible: AtomicBool::new(false),
            tags: None,
        }
    }

    /// Dashboard, tags, OPC UA and backups surfaces sharing one client.
    pub fn standard(
        client: &ScadaClient,
        renderer: Arc<dyn Renderer>,
        config: &RuntimeConfig,
        initial: Tab,
    ) -> Self {
        let tags = Arc::new(TagsSurface::new(client.clone(), Arc::clone(&renderer)));
        let surfaces: Vec<(Tab, Arc<dyn Surface>)> = vec![
            (
                Tab::Dashboard,
                Arc::new(DashboardSurface::new(
                    client.clone(),
                    Arc::clone(&renderer),
                    config.dashboard_interval,
                )),
            ),
            (Tab::Tags, Arc::clone(&tags) as Arc<dyn Surface>),
            (
                Tab::Opcua,
                Arc::new(OpcuaSurface::new(
                    client.clone(),
                    Arc::clone(&renderer),
                    config.opcua_interval,
                )),
            ),
            (
                Tab::Backups,
                Arc::new(BackupsSurface::new(client.clone(), renderer)),
            ),
        ];
        Self {
            tags: Some(tags),
            ..Self::new(surfaces, initial)
        }
    }

    /// The tags surface, for filter and expansion input.
    pub fn tags(&self) -> Option<&Arc<TagsSurface>> {
        self.tags.as_ref()
    }

    pub fn current(&self) -> Tab {
        self.current.lock().map(|t| *t).unwrap_or(Tab::Dashboard)
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    pub fn surface(&self, tab: Tab) -> Option<&Arc<dyn Surface>> {
        self.surfaces
            .iter()
            .find(|(t, _)| *t == tab)
            .map(|(_, surface)| surface)
    }

    /// Switch tabs and make the view visible.
    pub fn show(&self, tab: Tab) {
        let previous = match self.current.lock() {
            Ok(mut current) => std::mem::replace(&mut *current, tab),
            Err(_) => return,
        };
        if previous != tab {
            if let Some(surface) = self.surface(previous) {
                surface.stop();
            }
        }
        self.visible.store(true, Ordering::Release);
        if let Some(surface) = self.surface(tab) {
            info!(surface = surface.name(), "showing surface");
            surface.start();
        }
    }

    /// Hidden views stop polling; becoming visible again fetches immediately.
    pub fn set_visible(&self, visible: bool) {
        let was_visible = self.visible.swap(visible, Ordering::AcqRel);
        if was_visible == visible {
            return;
        }
        let Some(surface) = self.surface(self.current()) else {
            return;
        };
        if visible {
            info!(surface = surface.name(), "view visible, resuming");
            surface.start();
        } else {
            info!(surface = surface.name(), "view hidden, pausing");
            surface.stop();
        }
    }

    /// Stop every surface.
    pub fn shutdown(&self) {
        self.visible.store(false, Ordering::Release);
        for (_, surface) in &self.surfaces {
            surface.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::AtomicUsize;

    /// Records lifecycle calls without any I/O.
    #[derive(Default)]
    struct Probe {
        active: AtomicBool,
        starts: AtomicUsize,
    }

    impl Surface for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn start(&self) {
            if !self.active.swap(true, Ordering::SeqCst) {
                self.starts.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn stop(&self) {
            self.active.store(false, Ordering::SeqCst);
        }

        fn refresh(&self) -> BoxFuture<'_, ()> {
            async {}.boxed()
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }

    fn navigator() -> (Navigator, Vec<Arc<Probe>>) {
        let probes: Vec<Arc<Probe>> = (0..4).map(|_| Arc::new(Probe::default())).collect();
        let tabs = [Tab::Dashboard, Tab::Tags, Tab::Opcua, Tab::Backups];
        let surfaces = tabs
            .iter()
            .zip(&probes)
            .map(|(tab, probe)| (*tab, Arc::clone(probe) as Arc<dyn Surface>))
            .collect();
        (Navigator::new(surfaces, Tab::Dashboard), probes)
    }

    fn active(probes: &[Arc<Probe>]) -> Vec<bool> {
        probes.iter().map(|p| p.is_active()).collect()
    }

    #[test]
    fn only_the_shown_surface_polls() {
        let (nav, probes) = navigator();
        assert_eq!(active(&probes), vec![false; 4]);

        nav.show(Tab::Dashboard);
        assert_eq!(active(&probes), vec![true, false, false, false]);

        nav.show(Tab::Opcua);
        assert_eq!(nav.current(), Tab::Opcua);
        assert_eq!(active(&probes), vec![false, false, true, false]);
    }

    #[test]
    fn hiding_pauses_and_showing_resumes() {
        let (nav, probes) = navigator();
        nav.show(Tab::Tags);
        nav.set_visible(false);
        assert_eq!(active(&probes), vec![false; 4]);

        nav.set_visible(true);
        assert_eq!(active(&probes), vec![false, true, false, false]);
        assert_eq!(probes[1].starts.load(Ordering::SeqCst), 2);

        nav.set_visible(true);
        assert_eq!(probes[1].starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn returning_to_a_tab_restarts_it() {
        let (nav, probes) = navigator();
        nav.show(Tab::Dashboard);
        nav.show(Tab::Backups);
        nav.show(Tab::Dashboard);
        assert_eq!(probes[0].starts.load(Ordering::SeqCst), 2);
        assert_eq!(probes[3].starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shutdown_stops_everything() {
        let (nav, probes) = navigator();
        nav.show(Tab::Opcua);
        nav.shutdown();
        assert_eq!(active(&probes), vec![false; 4]);
        assert!(!nav.is_visible());
    }
}
