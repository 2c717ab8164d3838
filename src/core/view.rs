//! Renderer-side tree: what the diagram shows and which subtrees are folded.
//!
//! Every [`ViewNode`] always owns its full child list; folding a subtree only
//! flips its [`Fold`] state, and [`ViewNode::visible`] filters on it.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use super::wire::WireNode;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("malformed tree payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Whether a node's children are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fold {
    #[default]
    Expanded,
    Collapsed,
}

/// Colour class of a rendered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Cursor,
    Collapsed,
    Expanded,
    Leaf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    pub id: u64,
    pub name: String,
    pub cursor: bool,
    pub fold: Fold,
    pub children: Vec<ViewNode>,
}

/// One visible node, flattened in pre-order.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleNode {
    pub id: u64,
    pub parent: Option<u64>,
    pub depth: usize,
    pub name: String,
    pub fill: Fill,
}

impl From<WireNode> for ViewNode {
    fn from(wire: WireNode) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            cursor: wire.cursor,
            fold: Fold::Expanded,
            children: wire
                .children
                .unwrap_or_default()
                .into_iter()
                .map(ViewNode::from)
                .collect(),
        }
    }
}

impl ViewNode {
    /// Decode a `get_current` body.  Every display level costs two levels
    /// of JSON nesting, so serde_json's recursion limit is lifted and the
    /// stack grown on demand instead.
    pub fn from_json(body: &str) -> Result<Self, ViewError> {
        let mut de = serde_json::Deserializer::from_str(body);
        de.disable_recursion_limit();
        let wire = WireNode::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(wire.into())
    }

    pub fn fill(&self) -> Fill {
        if self.cursor {
            Fill::Cursor
        } else if self.children.is_empty() {
            Fill::Leaf
        } else {
            match self.fold {
                Fold::Collapsed => Fill::Collapsed,
                Fold::Expanded => Fill::Expanded,
            }
        }
    }

    pub fn find(&self, id: u64) -> Option<&ViewNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: u64) -> Option<&mut ViewNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Flip the fold state of `id`.  Returns `false` when nothing changed:
    /// the id is unknown or the node is a leaf.
    pub fn toggle(&mut self, id: u64) -> bool {
        let Some(node) = self.find_mut(id) else {
            return false;
        };
        if node.children.is_empty() {
            return false;
        }
        node.fold = match node.fold {
            Fold::Expanded => Fold::Collapsed,
            Fold::Collapsed => Fold::Expanded,
        };
        true
    }

    /// Pre-order list of every node whose ancestors are all expanded.
    pub fn visible(&self) -> Vec<VisibleNode> {
        let mut out = Vec::new();
        self.collect_visible(None, 0, &mut out);
        out
    }

    fn collect_visible(&self, parent: Option<u64>, depth: usize, out: &mut Vec<VisibleNode>) {
        out.push(VisibleNode {
            id: self.id,
            parent,
            depth,
            name: self.name.clone(),
            fill: self.fill(),
        });
        if self.fold == Fold::Expanded {
            for child in &self.children {
                child.collect_visible(Some(self.id), depth + 1, out);
            }
        }
    }

    /// Ids of every collapsed node in the subtree.
    pub fn collapsed_ids(&self) -> HashSet<u64> {
        let mut out = HashSet::new();
        self.collect_collapsed(&mut out);
        out
    }

    fn collect_collapsed(&self, out: &mut HashSet<u64>) {
        if self.fold == Fold::Collapsed {
            out.insert(self.id);
        }
        for child in &self.children {
            child.collect_collapsed(out);
        }
    }

    /// Collapse every node whose id is in `ids`.
    pub fn restore_collapsed(&mut self, ids: &HashSet<u64>) {
        if ids.contains(&self.id) && !self.children.is_empty() {
            self.fold = Fold::Collapsed;
        }
        for child in &mut self.children {
            child.restore_collapsed(ids);
        }
    }

    /// The node carrying the cursor, if any.
    pub fn cursor_id(&self) -> Option<u64> {
        if self.cursor {
            return Some(self.id);
        }
        self.children.iter().find_map(ViewNode::cursor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "module", "id": 0,
        "children": [
            {"name": "body = list", "id": 1, "cursor": true, "children": [
                {"name": "0 = a", "id": 2},
                {"name": "1 = b", "id": 3, "children": [{"name": "left = x", "id": 4}]}
            ]}
        ]
    }"#;

    fn ids(nodes: &[VisibleNode]) -> Vec<u64> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn toggle_hides_and_restores_children_in_order() {
        let mut root = ViewNode::from_json(SAMPLE).unwrap();
        let before = root.find(1).unwrap().children.clone();
        assert_eq!(ids(&root.visible()), vec![0, 1, 2, 3, 4]);

        assert!(root.toggle(1));
        assert_eq!(ids(&root.visible()), vec![0, 1]);

        assert!(root.toggle(1));
        assert_eq!(ids(&root.visible()), vec![0, 1, 2, 3, 4]);
        assert_eq!(root.find(1).unwrap().children, before);
    }

    #[test]
    fn collapsing_the_root_leaves_only_the_root() {
        let mut root = ViewNode::from_json(SAMPLE).unwrap();
        root.toggle(0);
        assert_eq!(ids(&root.visible()), vec![0]);
    }

    #[test]
    fn toggling_a_leaf_or_unknown_id_changes_nothing() {
        let mut root = ViewNode::from_json(SAMPLE).unwrap();
        assert!(!root.toggle(2));
        assert_eq!(root.find(2).unwrap().fold, Fold::Expanded);
        assert!(!root.toggle(99));
        assert_eq!(root.visible().len(), 5);
    }

    #[test]
    fn childless_tree_is_a_single_leaf() {
        let root = ViewNode::from_json(r#"{"name": "module"}"#).unwrap();
        let visible = root.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].fill, Fill::Leaf);
    }

    #[test]
    fn fill_follows_cursor_then_fold() {
        let mut root = ViewNode::from_json(SAMPLE).unwrap();
        let fills: Vec<Fill> = root.visible().iter().map(|n| n.fill).collect();
        assert_eq!(
            fills,
            vec![Fill::Expanded, Fill::Cursor, Fill::Leaf, Fill::Expanded, Fill::Leaf]
        );
        root.toggle(3);
        assert_eq!(root.find(3).unwrap().fill(), Fill::Collapsed);
        // The cursor colour wins over the fold state.
        root.toggle(1);
        assert_eq!(root.find(1).unwrap().fill(), Fill::Cursor);
    }

    #[test]
    fn fold_state_survives_a_reload() {
        let mut old = ViewNode::from_json(SAMPLE).unwrap();
        old.toggle(3);
        let mut fresh = ViewNode::from_json(SAMPLE).unwrap();
        fresh.restore_collapsed(&old.collapsed_ids());
        assert_eq!(ids(&fresh.visible()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(ViewNode::from_json("").is_err());
        assert!(ViewNode::from_json("[1, 2]").is_err());
        assert!(ViewNode::from_json(r#"{"name": "module"} trailing"#).is_err());
    }

    #[test]
    fn deeply_nested_tree_decodes() {
        const DEPTH: u64 = 500;
        let mut body = String::new();
        for id in 0..DEPTH {
            body.push_str(&format!(r#"{{"name":"n{id}","id":{id},"children":["#));
        }
        body.push_str(&format!(r#"{{"name":"leaf","id":{DEPTH}}}"#));
        for _ in 0..DEPTH {
            body.push_str("]}");
        }

        let root = ViewNode::from_json(&body).unwrap();
        let visible = root.visible();
        assert_eq!(visible.len() as u64, DEPTH + 1);
        assert_eq!(visible.last().unwrap().depth as u64, DEPTH);
    }

    #[test]
    fn cursor_is_found() {
        let root = ViewNode::from_json(SAMPLE).unwrap();
        assert_eq!(root.cursor_id(), Some(1));
    }
}
