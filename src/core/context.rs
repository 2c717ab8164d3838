//! Backend contexts, modes and the actions their keymaps trigger.
//!
//! A [`GlobalContext`] owns every open context and routes a key to the active
//! one.  An [`AstContext`] owns one display tree, its cursor and the
//! [`Mode`]s whose keymaps decide what a key does.  Performing an action
//! mutates the tree and yields an [`Effect`] listing what the frontend has to
//! do next.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use super::source::{self, SourceError};
use super::tree::DisplayTree;
use super::wire::{WireAction, WireNode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("no action associated with {0:?}")]
    UnrecognizedKey(String),
}

// ───────────────────────────────────────── effects ───────────

/// Frontend action that folds or unfolds one node: `toggle(id)`.
pub const TOGGLE_ACTION: &str = "toggle";
/// Frontend action that re-fetches the tree: `refresh_ast()`.
pub const REFRESH_ACTION: &str = "refresh_ast";
/// Every action name the backend can emit.
pub const FRONTEND_ACTIONS: &[&str] = &[TOGGLE_ACTION, REFRESH_ACTION];

/// A named call the frontend should run.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontendEffect {
    pub action_name: &'static str,
    pub action_args: Vec<Value>,
}

impl FrontendEffect {
    pub fn new(action_name: &'static str, action_args: Vec<Value>) -> Self {
        Self {
            action_name,
            action_args,
        }
    }

    pub fn to_wire(&self) -> WireAction {
        WireAction {
            action: self.action_name.to_string(),
            args: self.action_args.clone(),
        }
    }
}

/// Outcome of performing an action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effect {
    pub frontend_effects: Vec<FrontendEffect>,
}

impl Effect {
    fn refresh() -> Self {
        Self {
            frontend_effects: vec![FrontendEffect::new(REFRESH_ACTION, Vec::new())],
        }
    }
}

// ───────────────────────────────────────── actions ───────────

/// Everything a key can do inside an [`AstContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstAction {
    CursorShallower,
    CursorDeeper,
    CursorDown,
    CursorUp,
    Toggle,
}

impl AstAction {
    pub fn perform(self, tree: &mut DisplayTree) -> Effect {
        if self == AstAction::Toggle {
            return match tree.cursor_node() {
                Some(id) => Effect {
                    frontend_effects: vec![FrontendEffect::new(
                        TOGGLE_ACTION,
                        vec![Value::from(tree.get(id).id)],
                    )],
                },
                None => Effect::default(),
            };
        }

        let Some(current) = tree.cursor_node() else {
            if let Some(root) = tree.cursor_root() {
                tree.move_cursor(root);
            }
            return Effect::refresh();
        };

        let target = match self {
            AstAction::CursorShallower => tree.cursor_parent(current),
            AstAction::CursorDeeper => tree.get(current).children.first().copied(),
            AstAction::CursorDown => tree.sibling(current, 1),
            AstAction::CursorUp => tree.sibling(current, -1),
            AstAction::Toggle => None,
        };
        if let Some(target) = target {
            tree.move_cursor(target);
        }
        Effect::refresh()
    }
}

// ───────────────────────────────────────── modes ─────────────

/// A named keymap.
#[derive(Debug, Clone)]
pub struct Mode {
    pub name: &'static str,
    pub keymap: HashMap<String, AstAction>,
}

impl Mode {
    /// Vim-style cursor movement plus `t` to toggle the node under the cursor.
    pub fn ast() -> Self {
        let keymap = [
            ("h", AstAction::CursorShallower),
            ("l", AstAction::CursorDeeper),
            ("j", AstAction::CursorDown),
            ("k", AstAction::CursorUp),
            ("t", AstAction::Toggle),
        ]
        .into_iter()
        .map(|(k, a)| (k.to_string(), a))
        .collect();
        Self { name: "ast", keymap }
    }
}

// ───────────────────────────────────────── contexts ──────────

/// A parsed module and the modes that act on it.
#[derive(Debug, Clone)]
pub struct AstContext {
    pub tree: DisplayTree,
    pub modes: Vec<Mode>,
}

impl AstContext {
    /// Wrap a display tree and put the cursor on its cursor root.
    pub fn new(mut tree: DisplayTree) -> Self {
        if let Some(root) = tree.cursor_root() {
            tree.move_cursor(root);
        }
        Self {
            tree,
            modes: vec![Mode::ast()],
        }
    }

    pub fn from_source(source: &str) -> Result<Self, SourceError> {
        Ok(Self::new(source::build_tree(source)?))
    }

    pub fn can_perform_action(&self, key: &str) -> bool {
        self.modes.iter().any(|m| m.keymap.contains_key(key))
    }

    pub fn do_action(&mut self, key: &str) -> Result<Vec<WireAction>, ContextError> {
        let (mode, action) = self
            .modes
            .iter()
            .find_map(|m| m.keymap.get(key).map(|&a| (m.name, a)))
            .ok_or_else(|| ContextError::UnrecognizedKey(key.to_string()))?;
        tracing::debug!(mode, ?action, key, "performing action");
        let effect = action.perform(&mut self.tree);
        Ok(effect.frontend_effects.iter().map(FrontendEffect::to_wire).collect())
    }

    pub fn display(&self) -> WireNode {
        self.tree.to_wire()
    }
}

/// All open contexts plus the one receiving keys.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    pub contexts: Vec<AstContext>,
    pub active: Option<usize>,
}

impl GlobalContext {
    pub fn new(context: AstContext) -> Self {
        Self {
            contexts: vec![context],
            active: Some(0),
        }
    }

    fn active_context_mut(&mut self) -> Option<&mut AstContext> {
        self.contexts.get_mut(self.active?)
    }

    pub fn do_action(&mut self, key: &str) -> Result<Vec<WireAction>, ContextError> {
        match self.active_context_mut() {
            Some(ctx) if ctx.can_perform_action(key) => ctx.do_action(key),
            _ => Err(ContextError::UnrecognizedKey(key.to_string())),
        }
    }

    /// Tree of the first context, which is what the renderer shows.
    pub fn current_display(&self) -> Option<WireNode> {
        self.contexts.first().map(AstContext::display)
    }
}
