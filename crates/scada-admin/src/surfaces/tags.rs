use super::{Poller, Surface};
use crate::render::{Level, Renderer};
use futures::future::BoxFuture;
use futures::FutureExt;
use scada_core::{hierarchy, ParentTag, TagFilter};
use scada_io::metrics::PARENT_TAGS_LOADED;
use scada_io::{format_error, ClientError, ScadaClient};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Default)]
struct TagsState {
    parents: Vec<ParentTag>,
    filter: TagFilter,
    /// Survives reloads so a refresh keeps the operator's expansions.
    expanded: HashSet<String>,
    /// Expand every parent of the next load, then fall back to `expanded`.
    expand_next_load: bool,
}

impl TagsState {
    fn render(&self, renderer: &dyn Renderer) {
        renderer.tags(&self.filter.apply(&self.parents));
    }
}

/// Totals reported after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub parents: usize,
    pub variables: usize,
}

struct Inner {
    client: ScadaClient,
    renderer: Arc<dyn Renderer>,
    state: Mutex<TagsState>,
}

impl Inner {
    async fn load(&self) -> Result<LoadSummary, ClientError> {
        let flat = self.client.tags().await?;
        let mut parents = hierarchy::build(&flat);
        let summary = LoadSummary {
            parents: parents.len(),
            variables: parents.iter().map(|p| p.variable_count).sum(),
        };
        PARENT_TAGS_LOADED.set(summary.parents as i64);

        if let Ok(mut state) = self.state.lock() {
            if std::mem::take(&mut state.expand_next_load) {
                state.expanded = parents.iter().map(|p| p.name.clone()).collect();
            }
            for parent in &mut parents {
                parent.is_expanded = state.expanded.contains(&parent.name);
            }
            state.parents = parents;
            state.render(self.renderer.as_ref());
        }

        info!(
            parents = summary.parents,
            variables = summary.variables,
            "tag hierarchy loaded"
        );
        self.renderer.notify(
            Level::Success,
            &format!(
                "Loaded {} parent tags with {} variables",
                summary.parents, summary.variables
            ),
        );
        Ok(summary)
    }

    async fn refresh(&self) {
        if let Err(e) = self.load().await {
            warn!(error = %e, "tag load failed");
            PARENT_TAGS_LOADED.set(0);
            if let Ok(mut state) = self.state.lock() {
                state.parents.clear();
                state.render(self.renderer.as_ref());
            }
            self.renderer.notify(Level::Error, &format_error(&e));
        }
    }
}

/// Parent-tag hierarchy with filtering and per-parent expansion.
pub struct TagsSurface {
    inner: Arc<Inner>,
    poller: Poller,
}

impl TagsSurface {
    pub fn new(client: ScadaClient, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                renderer,
                state: Mutex::new(TagsState::default()),
            }),
            poller: Poller::new("tags", None),
        }
    }

    /// Initial filter, applied without rendering.
    pub fn with_filter(self, filter: TagFilter) -> Self {
        if let Ok(mut state) = self.inner.state.lock() {
            state.filter = filter;
        }
        self
    }

    /// Expand every parent the first load brings in.
    pub fn expand_on_load(self) -> Self {
        if let Ok(mut state) = self.inner.state.lock() {
            state.expand_next_load = true;
        }
        self
    }

    /// Fetch, rebuild and render, propagating failures.
    pub async fn load(&self) -> Result<LoadSummary, ClientError> {
        self.inner.load().await
    }

    /// Replace the filter and re-render from the loaded hierarchy.
    pub fn set_filter(&self, filter: TagFilter) {
        self.with_state(|state| {
            state.filter = filter;
        });
    }

    /// Expand or collapse every loaded parent. Parents that first appear in
    /// a later load start collapsed.
    pub fn set_expand_all(&self, expanded: bool) {
        self.with_state(|state| {
            state.expanded.clear();
            for parent in &mut state.parents {
                parent.is_expanded = expanded;
                if expanded {
                    state.expanded.insert(parent.name.clone());
                }
            }
        });
    }

    /// Expand or collapse one parent. Returns `false` when no such parent
    /// is loaded.
    pub fn set_expanded(&self, name: &str, expanded: bool) -> bool {
        let mut found = false;
        self.with_state(|state| {
            let Some(parent) = state.parents.iter_mut().find(|p| p.name == name) else {
                return;
            };
            parent.is_expanded = expanded;
            if expanded {
                state.expanded.insert(name.to_string());
            } else {
                state.expanded.remove(name);
            }
            found = true;
        });
        found
    }

    pub fn parents(&self) -> Vec<ParentTag> {
        self.inner
            .state
            .lock()
            .map(|s| s.parents.clone())
            .unwrap_or_default()
    }

    fn with_state(&self, update: impl FnOnce(&mut TagsState)) {
        if let Ok(mut state) = self.inner.state.lock() {
            update(&mut state);
            state.render(self.inner.renderer.as_ref());
        }
    }
}

impl Surface for TagsSurface {
    fn name(&self) -> &'static str {
        "tags"
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
