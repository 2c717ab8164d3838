//! In-memory display tree that mirrors the field layout of a syntax tree.
//!
//! Every [`DisplayNode`] is one *field slot* of the parsed module: a named
//! field, a list, an element of a list, or a primitive value.  Nodes live in a
//! flat arena (the [`DisplayTree`] struct) and link to each other by index,
//! which keeps parent lookups and sibling walks trivial.

use super::wire::WireNode;

// ───────────────────────────────────────── node kinds ────────

/// What a display node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// The module itself.  Always the arena root.
    Container,
    /// A field holding a single syntax node.
    Field,
    /// A field holding a sequence of syntax nodes.
    List,
    /// One element of a [`SlotKind::List`].
    ListItem,
    /// A leaf value rendered from its source text.
    Primitive,
}

// ───────────────────────────────────────── tree node ─────────

/// Index into [`DisplayTree::nodes`].
pub type NodeId = usize;

/// A single node in the arena-allocated tree.
#[derive(Debug, Clone)]
pub struct DisplayNode {
    /// Stable identifier sent over the wire.  The container is `0`, every
    /// other node is numbered in pre-order starting at `1`.
    pub id: u64,
    pub kind: SlotKind,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Whether the cursor currently sits on this node.
    pub cursor: bool,
}

// ───────────────────────────────────────── arena tree ────────

/// Arena-backed display tree.
#[derive(Debug, Clone)]
pub struct DisplayTree {
    pub nodes: Vec<DisplayNode>,
    pub root: NodeId,
}

impl DisplayTree {
    /// Create a new tree holding only the container node.
    pub fn new(name: impl Into<String>) -> Self {
        let root = DisplayNode {
            id: 0,
            kind: SlotKind::Container,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            cursor: false,
        };
        Self {
            nodes: vec![root],
            root: 0,
        }
    }

    /// Add a child under `parent_id` and return its [`NodeId`].
    pub fn add_child(&mut self, parent_id: NodeId, kind: SlotKind, name: String) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DisplayNode {
            id: id as u64,
            kind,
            name,
            parent: Some(parent_id),
            children: Vec::new(),
            cursor: false,
        });
        self.nodes[parent_id].children.push(id);
        id
    }

    pub fn get(&self, id: NodeId) -> &DisplayNode {
        &self.nodes[id]
    }

    // ── cursor ──────────────────────────────────────────────────

    /// The node the cursor is confined to: the container's first slot.
    pub fn cursor_root(&self) -> Option<NodeId> {
        self.nodes[self.root].children.first().copied()
    }

    /// The node carrying the cursor, searched within the cursor root's
    /// subtree.
    pub fn cursor_node(&self) -> Option<NodeId> {
        let mut stack = vec![self.cursor_root()?];
        while let Some(id) = stack.pop() {
            if self.nodes[id].cursor {
                return Some(id);
            }
            stack.extend(self.nodes[id].children.iter().rev());
        }
        None
    }

    /// Move the cursor from wherever it is onto `target`.
    pub fn move_cursor(&mut self, target: NodeId) {
        for node in &mut self.nodes {
            node.cursor = false;
        }
        self.nodes[target].cursor = true;
    }

    /// Parent of `id`, as long as it stays inside the cursor root's subtree.
    pub fn cursor_parent(&self, id: NodeId) -> Option<NodeId> {
        if Some(id) == self.cursor_root() {
            return None;
        }
        self.nodes[id].parent
    }

    /// Sibling `offset` positions away from `id` (negative = earlier).
    pub fn sibling(&self, id: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.cursor_parent(id)?;
        let siblings = &self.nodes[parent].children;
        let index = siblings.iter().position(|&c| c == id)?;
        let target = index.checked_add_signed(offset)?;
        siblings.get(target).copied()
    }

    // ── wire form ───────────────────────────────────────────────

    /// Serialise the subtree rooted at the container.
    pub fn to_wire(&self) -> WireNode {
        self.wire_node(self.root)
    }

    fn wire_node(&self, id: NodeId) -> WireNode {
        let node = &self.nodes[id];
        let mut wire = WireNode::leaf(node.id, node.name.clone());
        wire.cursor = node.cursor;
        if !node.children.is_empty() {
            wire.children = Some(node.children.iter().map(|&c| self.wire_node(c)).collect());
        }
        wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// module → body = list → [0 = a, 1 = b]
    fn small_tree() -> DisplayTree {
        let mut tree = DisplayTree::new("module");
        let body = tree.add_child(tree.root, SlotKind::List, "body = list".into());
        tree.add_child(body, SlotKind::ListItem, "0 = a".into());
        tree.add_child(body, SlotKind::ListItem, "1 = b".into());
        tree
    }

    #[test]
    fn ids_follow_insertion_order() {
        let tree = small_tree();
        let ids: Vec<u64> = tree.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn cursor_stays_inside_cursor_root() {
        let mut tree = small_tree();
        let body = tree.cursor_root().unwrap();
        assert_eq!(tree.cursor_parent(body), None);
        assert_eq!(tree.cursor_parent(2), Some(body));

        tree.move_cursor(2);
        assert_eq!(tree.cursor_node(), Some(2));
        tree.move_cursor(3);
        assert_eq!(tree.cursor_node(), Some(3));
        assert!(!tree.get(2).cursor);
    }

    #[test]
    fn sibling_lookup_is_bounded() {
        let tree = small_tree();
        assert_eq!(tree.sibling(2, 1), Some(3));
        assert_eq!(tree.sibling(3, -1), Some(2));
        assert_eq!(tree.sibling(2, -1), None);
        assert_eq!(tree.sibling(3, 1), None);
    }

    #[test]
    fn wire_form_nests_children() {
        let mut tree = small_tree();
        tree.move_cursor(1);
        let wire = tree.to_wire();
        assert_eq!(wire.name, "module");
        let body = &wire.children.as_ref().unwrap()[0];
        assert!(body.cursor);
        let items = body.children.as_ref().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].children.is_none());
    }
}
