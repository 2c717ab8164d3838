//! Central application state.
//!
//! All mutable frontend state lives here so that rendering is a pure function
//! over `&AppState` and event/response handling mutates `&mut AppState`.

use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::config::AppConfig;
use crate::core::{
    diagram::Diagram,
    view::{ViewError, ViewNode, VisibleNode},
};
use crate::ui::tree_widget::TreeWidgetState;

use super::backend::{BackendHandle, Route};
use super::relay::InFlight;

/// Top-level application state.
pub struct AppState {
    /// Last tree received from `get_current`.  `None` until the first reply.
    pub view: Option<ViewNode>,
    /// Layout and running transition.
    pub diagram: Diagram,
    /// Scroll position of the diagram pane.
    pub tree_state: TreeWidgetState,
    /// Request side of the backend.
    pub backend: BackendHandle,
    /// Tokens for `key_event` requests.
    pub key_requests: InFlight,
    /// Tokens for `get_current` requests.
    pub tree_requests: InFlight,
    pub config: AppConfig,
    /// Full terminal area, refreshed every draw (used for mouse hit-testing).
    pub terminal_area: Rect,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(backend: BackendHandle, config: AppConfig) -> Self {
        Self {
            view: None,
            diagram: Diagram::new(Duration::from_millis(config.animation_ms)),
            tree_state: TreeWidgetState::default(),
            backend,
            key_requests: InFlight::default(),
            tree_requests: InFlight::default(),
            config,
            terminal_area: Rect::default(),
            should_quit: false,
            status_message: None,
        }
    }

    /// Ask the backend for the current tree.
    pub fn request_tree(&mut self) {
        let token = self.tree_requests.begin();
        if !self.backend.send(token, Route::GetCurrent) {
            self.status_message = Some("backend stopped".into());
        }
    }

    /// Relay one key to the backend.
    pub fn send_key(&mut self, key: char) {
        let token = self.key_requests.begin();
        tracing::debug!(token, %key, "relaying key");
        if !self.backend.send(token, Route::KeyEvent(key.to_string())) {
            self.status_message = Some("backend stopped".into());
        }
    }

    /// Fold or unfold `id` and animate from it.  Returns `false` when
    /// nothing changed: no such node, or a leaf.
    pub fn toggle(&mut self, id: u64, now: Instant) -> bool {
        let Some(view) = self.view.as_mut() else {
            return false;
        };
        if !view.toggle(id) {
            tracing::debug!(id, "toggle: unknown id or leaf");
            return false;
        }
        if let Some(node) = view.find(id) {
            tracing::debug!(id, fold = ?node.fold, "toggled");
        }
        let visible = view.visible();
        self.tree_state.focus = cursor_row(view, &visible);
        self.diagram.update(&visible, id, now);
        true
    }

    /// Replace the tree with a `get_current` body, keeping the fold state of
    /// nodes that still exist.  On error the current tree stays untouched.
    pub fn load_tree(&mut self, body: &str, now: Instant) -> Result<(), ViewError> {
        let mut fresh = ViewNode::from_json(body)?;
        if let Some(old) = &self.view {
            fresh.restore_collapsed(&old.collapsed_ids());
        }
        let visible = fresh.visible();
        self.diagram.update(&visible, fresh.id, now);
        self.tree_state.focus = cursor_row(&fresh, &visible);
        self.view = Some(fresh);
        Ok(())
    }
}

/// Row of the cursor node, if it is visible.
fn cursor_row(view: &ViewNode, visible: &[VisibleNode]) -> Option<usize> {
    let id = view.cursor_id()?;
    visible.iter().position(|n| n.id == id)
}
