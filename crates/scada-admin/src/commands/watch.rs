//! Live session: one visible surface plus the connection monitor.
//!
//! Lines typed on stdin switch tabs (`dashboard`, `tags`, `opcua`,
//! `backups`), pause (`hide`), resume (`show`), re-fetch (`refresh`) or end
//! the session (`quit`). On the tags tab, `expand NAME`, `expand all`,
//! `collapse all` and `filter TEXT` adjust the hierarchy view. Closed stdin
//! just disables input.

use super::{CommandContext, CommandError};
use crate::monitor::ConnectionMonitor;
use crate::navigator::Navigator;
use crate::render::{Level, Renderer};
use crate::runtime::config::{Tab, WatchArgs};
use crate::surfaces::{Surface, TagsSurface};
use clap::ValueEnum;
use scada_core::TagFilter;
use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Show(Tab),
    Hide,
    Resume,
    Refresh,
    Quit,
    Expand(String, bool),
    ExpandAll(bool),
    Search(String),
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match (word.to_ascii_lowercase().as_str(), rest) {
        ("expand", "all") => Some(Input::ExpandAll(true)),
        ("collapse", "all") => Some(Input::ExpandAll(false)),
        ("expand", name) if !name.is_empty() => Some(Input::Expand(name.to_string(), true)),
        ("collapse", name) if !name.is_empty() => Some(Input::Expand(name.to_string(), false)),
        ("filter", text) => Some(Input::Search(text.to_string())),
        (_, rest) if !rest.is_empty() => None,
        ("hide" | "pause", _) => Some(Input::Hide),
        ("show" | "resume", _) => Some(Input::Resume),
        ("r" | "refresh", _) => Some(Input::Refresh),
        ("q" | "quit" | "exit", _) => Some(Input::Quit),
        (other, _) => Tab::from_str(other, true).ok().map(Input::Show),
    }
}

fn adjust_tags(tags: &TagsSurface, input: Input, renderer: &dyn Renderer) {
    match input {
        Input::Expand(name, expanded) => {
            if !tags.set_expanded(&name, expanded) {
                renderer.notify(Level::Warning, &format!("No parent tag named {name}"));
            }
        }
        Input::ExpandAll(expand) => tags.set_expand_all(expand),
        Input::Search(search) => tags.set_filter(TagFilter {
            search,
            ..Default::default()
        }),
        _ => {}
    }
}

/// Refresh off the input loop so Ctrl-C and the deadline stay responsive.
/// A request still in flight from an earlier `refresh` is not doubled.
fn spawn_refresh(surface: Option<&Arc<dyn Surface>>, running: &mut Option<JoinHandle<()>>) {
    if running.as_ref().is_some_and(|task| !task.is_finished()) {
        return;
    }
    if let Some(surface) = surface {
        let surface = Arc::clone(surface);
        *running = Some(tokio::spawn(async move { surface.refresh().await }));
    }
}

pub(super) async fn run(ctx: &CommandContext, args: WatchArgs) -> Result<(), CommandError> {
    let navigator = Navigator::standard(
        &ctx.client,
        Arc::clone(&ctx.renderer),
        &ctx.config,
        args.surface,
    );
    let monitor = ConnectionMonitor::new(ctx.client.clone(), ctx.config.health_interval);

    info!(surface = ?args.surface, run_seconds = ?args.run_seconds, "watch session started");
    monitor.start();
    navigator.show(args.surface);

    let deadline = async {
        match args.run_seconds {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let mut manual_refresh: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            line = lines.next_line(), if input_open => {
                let Ok(Some(line)) = line else {
                    input_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_input(&line) {
                    Some(Input::Show(tab)) => navigator.show(tab),
                    Some(Input::Hide) => navigator.set_visible(false),
                    Some(Input::Resume) => navigator.set_visible(true),
                    Some(Input::Refresh) => {
                        spawn_refresh(navigator.surface(navigator.current()), &mut manual_refresh);
                    }
                    Some(Input::Quit) => break,
                    Some(input) => match navigator.tags() {
                        Some(tags) if navigator.current() == Tab::Tags => {
                            adjust_tags(tags, input, ctx.renderer.as_ref());
                        }
                        _ => ctx.renderer.notify(
                            Level::Warning,
                            "Expand and filter apply to the tags view",
                        ),
                    },
                    None => ctx.renderer.notify(
                        Level::Warning,
                        &format!("Unknown input '{}'", line.trim()),
                    ),
                }
            }
        }
    }

    if let Some(task) = manual_refresh {
        task.abort();
    }
    navigator.shutdown();
    monitor.stop();
    info!("watch session ended");
    Ok(())
}
