//! Input handling — maps key/mouse events and backend responses to state
//! mutations.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use serde_json::Value;

use crate::config::Command;
use crate::core::context::{FRONTEND_ACTIONS, REFRESH_ACTION, TOGGLE_ACTION};
use crate::ui::layout::AppLayout;
use crate::ui::tree_widget;

use super::backend::{Response, RouteKind};
use super::relay::{arg_u64, ActionRegistry, RelayError};
use super::state::AppState;

// ── Frontend actions ────────────────────────────────────────────

fn toggle_action(state: &mut AppState, args: &[Value]) -> Result<(), RelayError> {
    let id = arg_u64(TOGGLE_ACTION, args, 0)?;
    state.toggle(id, Instant::now());
    Ok(())
}

fn refresh_action(state: &mut AppState, _args: &[Value]) -> Result<(), RelayError> {
    state.request_tree();
    Ok(())
}

/// Build the registry of actions the backend may name.  Fails if a name is
/// registered twice or an action the backend emits has no handler.
pub fn frontend_actions() -> Result<ActionRegistry<AppState>, RelayError> {
    let mut registry = ActionRegistry::default();
    registry.register(TOGGLE_ACTION, toggle_action)?;
    registry.register(REFRESH_ACTION, refresh_action)?;

    for &name in FRONTEND_ACTIONS {
        if !registry.contains(name) {
            return Err(RelayError::UnknownAction(name.to_string()));
        }
    }
    Ok(registry)
}

// ── Backend responses ───────────────────────────────────────────

/// Apply one backend response if it is still current.
pub fn handle_response(
    state: &mut AppState,
    registry: &ActionRegistry<AppState>,
    response: Response,
    now: Instant,
) {
    match response.route {
        RouteKind::GetCurrent => {
            if !state.tree_requests.accept(response.token) {
                tracing::debug!(token = response.token, "dropping stale tree");
                return;
            }
            match state.load_tree(&response.body, now) {
                Ok(()) => state.status_message = None,
                Err(e) => {
                    tracing::warn!("get_current failed: {e}");
                    state.status_message = Some(format!("get_current: {e}"));
                }
            }
        }
        RouteKind::KeyEvent => {
            if !state.key_requests.accept(response.token) {
                tracing::debug!(token = response.token, "dropping stale key response");
                return;
            }
            // The backend answers keys it does not know with an empty body.
            if response.body.is_empty() {
                tracing::debug!(token = response.token, "key not bound in the backend");
                return;
            }
            match registry.dispatch(state, &response.body) {
                Ok(outcome) => {
                    if let Some(e) = outcome.errors.first() {
                        state.status_message = Some(format!("key_event: {e}"));
                    }
                }
                Err(e) => {
                    tracing::warn!("key_event failed: {e}");
                    state.status_message = Some(format!("key_event: {e}"));
                }
            }
        }
    }
}

// ── Keyboard ────────────────────────────────────────────────────

/// Process a key event: local commands first, then relay printable keys.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    if let Some(command) = state.config.match_key(key) {
        let page = tree_pane_height(state).max(1);
        match command {
            Command::Quit => state.should_quit = true,
            Command::ScrollUp => state.tree_state.scroll_by(-(page as isize)),
            Command::ScrollDown => state.tree_state.scroll_by(page as isize),
            Command::Refresh => state.request_tree(),
        }
        return;
    }

    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return;
    }
    if let KeyCode::Char(c) = key.code {
        state.send_key(c);
    }
}

fn tree_pane_height(state: &AppState) -> usize {
    tree_widget::inner_area(AppLayout::from_area(state.terminal_area).tree_area).height as usize
}

// ── Mouse ───────────────────────────────────────────────────────

/// Left click on a node toggles it.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(view) = &state.view else {
                return;
            };
            let area = tree_widget::inner_area(AppLayout::from_area(state.terminal_area).tree_area);
            let hit = tree_widget::node_at(
                &view.visible(),
                area,
                state.tree_state.offset,
                mouse.column,
                mouse.row,
            );
            if let Some(id) = hit {
                state.toggle(id, Instant::now());
            }
        }
        MouseEventKind::ScrollUp => state.tree_state.scroll_by(-3),
        MouseEventKind::ScrollDown => state.tree_state.scroll_by(3),
        _ => {}
    }
}
