use std::sync::Arc;

use crossterm::event::{MouseEvent, MouseEventKind};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::diff::{DiffRenderer, DiffState};
use crate::error::{AppError, Result};
use crate::event::Event;
use crate::handler;
use crate::source::ChangesetSource;
use crate::theme::ThemeColors;
use crate::tree::controller::{ExpandOutcome, LoadController, LoadState};
use crate::tree::node::{Node, NodeId};
use crate::tree::policy::ExpansionPolicy;
use crate::tree::view::TreeView;

/// Lines moved per diff page.
pub const DIFF_PAGE: usize = 20;

/// Main application state.
///
/// All mutation happens on the event loop. Fetches run as spawned tasks
/// that only post their results back as events.
pub struct App {
    pub controller: LoadController,
    pub view: TreeView,
    pub diff: DiffState,
    pub theme: ThemeColors,
    pub use_icons: bool,
    pub should_quit: bool,
    /// Set when the session cannot continue; `main` reports it on exit.
    pub fatal: Option<AppError>,
    pub initial_loading: bool,
    pub status_message: Option<(String, bool)>,
    source: Arc<dyn ChangesetSource>,
    renderer: Box<dyn DiffRenderer>,
    tx: UnboundedSender<Event>,
}

impl App {
    pub fn new(
        source: Arc<dyn ChangesetSource>,
        policy: ExpansionPolicy,
        renderer: Box<dyn DiffRenderer>,
        theme: ThemeColors,
        use_icons: bool,
        tx: UnboundedSender<Event>,
    ) -> Self {
        Self {
            controller: LoadController::new(policy),
            view: TreeView::new(),
            diff: DiffState::default(),
            theme,
            use_icons,
            should_quit: false,
            fatal: None,
            initial_loading: false,
            status_message: None,
            source,
            renderer,
            tx,
        }
    }

    pub fn source_name(&self) -> String {
        self.source.describe()
    }

    /// Kick off the root listing fetch.
    pub fn start(&mut self) {
        self.initial_loading = true;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.initial_listing().await;
            let _ = tx.send(Event::InitialLoaded(result));
        });
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => handler::handle_key_event(self, key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Tick | Event::Resize(_, _) => {}
            Event::InitialLoaded(result) => self.on_initial_loaded(result),
            Event::ChildrenLoaded { id, result } => self.on_children_loaded(&id, result),
            Event::DiffLoaded { id, result } => {
                if let Err(e) = &result {
                    warn!(%id, error = %e, "diff unavailable");
                }
                self.diff.complete(&id, result, self.renderer.as_ref());
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollDown => self.view.select_next(),
            MouseEventKind::ScrollUp => self.view.select_prev(),
            _ => {}
        }
    }

    fn on_initial_loaded(&mut self, result: Result<Vec<Node>>) {
        self.initial_loading = false;
        match result.and_then(|nodes| self.controller.load_initial(nodes)) {
            Ok(()) => {
                self.view.rebuild(&self.controller);
                if self.controller.snapshot().is_empty() {
                    self.set_status_message("No changes".to_string(), false);
                }
            }
            Err(e) => self.fail(e, "initial listing failed"),
        }
    }

    fn on_children_loaded(&mut self, id: &NodeId, result: Result<Vec<Node>>) {
        match self.controller.complete_load(id, result) {
            Ok(more) => {
                for child in more {
                    self.spawn_children_fetch(child);
                }
            }
            Err(e) if e.is_fatal() => self.fail(e, "inconsistent listing"),
            Err(e) => self.set_status_message(format!("{}: {}", id, e), true),
        }
        self.view.rebuild(&self.controller);
    }

    /// Stop the session: the error is kept for `main` to report.
    fn fail(&mut self, e: AppError, what: &str) {
        error!(error = %e, "{}", what);
        self.fatal = Some(e);
        self.should_quit = true;
    }

    fn spawn_children_fetch(&self, id: NodeId) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.children(&id).await;
            let _ = tx.send(Event::ChildrenLoaded { id, result });
        });
    }

    fn spawn_diff_fetch(&self, id: NodeId) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.diff_lines(&id).await;
            let _ = tx.send(Event::DiffLoaded { id, result });
        });
    }

    fn expand(&mut self, id: &NodeId) {
        if self.controller.request_expand(id) == ExpandOutcome::Fetch {
            self.spawn_children_fetch(id.clone());
        }
        self.view.rebuild(&self.controller);
    }

    /// Expand the selected node, fetching its children if needed.
    pub fn expand_selected(&mut self) {
        if let Some(id) = self.view.selected_id().cloned() {
            self.expand(&id);
        }
    }

    /// Collapse the selected node, or jump to its parent row.
    pub fn collapse_selected(&mut self) {
        let Some(item) = self.view.selected() else {
            return;
        };
        if item.is_expanded {
            let id = item.id.clone();
            self.controller.collapse(&id);
            self.view.rebuild(&self.controller);
        } else {
            self.view.select_parent();
        }
    }

    /// Enter: open or close a directory, show the diff of anything else.
    pub fn toggle_selected(&mut self) {
        let Some(item) = self.view.selected() else {
            return;
        };
        if item.is_leaf {
            self.show_diff_selected();
        } else if item.is_expanded {
            self.collapse_selected();
        } else {
            self.expand_selected();
        }
    }

    /// Re-issue the fetch of a node whose last load failed.
    pub fn retry_selected(&mut self) {
        let Some(item) = self.view.selected() else {
            return;
        };
        if matches!(item.load_state, LoadState::Failed(_)) {
            let id = item.id.clone();
            info!(%id, "retrying");
            self.clear_status_message();
            self.expand(&id);
        }
    }

    /// Request the diff of the selected node; newer requests supersede it.
    pub fn show_diff_selected(&mut self) {
        let Some(id) = self.view.selected_id().cloned() else {
            return;
        };
        if self.diff.request(&id) {
            self.spawn_diff_fetch(id);
        }
    }

    pub fn select_next(&mut self) {
        self.view.select_next();
    }

    pub fn select_prev(&mut self) {
        self.view.select_prev();
    }

    pub fn select_first(&mut self) {
        self.view.select_first();
    }

    pub fn select_last(&mut self) {
        self.view.select_last();
    }

    pub fn set_status_message(&mut self, msg: String, is_error: bool) {
        self.status_message = Some((msg, is_error));
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
