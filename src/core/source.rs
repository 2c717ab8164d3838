//! Parse Python source and populate a [`DisplayTree`].
//!
//! Parsing is delegated to tree-sitter.  For each syntax node we group its
//! children by field name (in source order) and turn every group into a
//! display slot: a single node becomes a field (or a primitive when it is a
//! leaf), a repeated or unnamed group becomes a list.

use thiserror::Error;
use tree_sitter::{Node, Parser};

use super::tree::{DisplayTree, NodeId, SlotKind};

/// Label for children that tree-sitter does not attach to a field.
const UNNAMED_FIELD: &str = "body";
/// Used instead of [`UNNAMED_FIELD`] when the node has a real `body` field.
const UNNAMED_FALLBACK: &str = "children";

/// Longest primitive text shown in a label before it is cut.
const MAX_PRIMITIVE_LEN: usize = 40;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to load the Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("the parser produced no tree")]
    NoTree,
}

/// Parse `source` and build its display tree.
pub fn build_tree(source: &str) -> Result<DisplayTree, SourceError> {
    let mut parser = Parser::new();
    parser.set_language(tree_sitter_python::language())?;
    let syntax = parser.parse(source, None).ok_or(SourceError::NoTree)?;

    let module = syntax.root_node();
    let mut tree = DisplayTree::new(module.kind());
    let root = tree.root;
    push_slots(&mut tree, root, module, source.as_bytes());

    tracing::debug!(
        nodes = tree.nodes.len(),
        errors = module.has_error(),
        "built display tree"
    );
    Ok(tree)
}

/// One field of a syntax node and the syntax nodes it holds.
struct FieldGroup<'t> {
    name: Option<&'static str>,
    nodes: Vec<Node<'t>>,
}

/// Children of `syntax` grouped by field name, groups in first-seen order.
fn field_groups(syntax: Node<'_>) -> Vec<FieldGroup<'_>> {
    let mut groups: Vec<FieldGroup<'_>> = Vec::new();
    let mut cursor = syntax.walk();
    if !cursor.goto_first_child() {
        return groups;
    }
    loop {
        let child = cursor.node();
        let field = cursor.field_name();
        // Punctuation only matters when the grammar names it (e.g. `operator`).
        if !child.is_extra() && (child.is_named() || field.is_some()) {
            match groups.iter_mut().find(|g| g.name == field) {
                Some(group) => group.nodes.push(child),
                None => groups.push(FieldGroup {
                    name: field,
                    nodes: vec![child],
                }),
            }
        }
        if !cursor.goto_next_sibling() {
            break;
        }
    }
    groups
}

/// Append one display slot per field of `syntax` under `parent`.
fn push_slots(tree: &mut DisplayTree, parent: NodeId, syntax: Node<'_>, src: &[u8]) {
    let groups = field_groups(syntax);
    let unnamed = if groups.iter().any(|g| g.name == Some(UNNAMED_FIELD)) {
        UNNAMED_FALLBACK
    } else {
        UNNAMED_FIELD
    };
    for group in groups {
        let field = group.name.unwrap_or(unnamed);
        match group.nodes.as_slice() {
            [single] if group.name.is_some() => {
                if is_leaf(*single) {
                    let text = primitive_text(*single, src);
                    tree.add_child(parent, SlotKind::Primitive, format!("{field} = {text}"));
                } else {
                    let id = tree.add_child(
                        parent,
                        SlotKind::Field,
                        format!("{field} = {}", single.kind()),
                    );
                    push_slots(tree, id, *single, src);
                }
            }
            items => {
                let list = tree.add_child(parent, SlotKind::List, format!("{field} = list"));
                for (index, item) in items.iter().enumerate() {
                    let label = if is_leaf(*item) {
                        format!("{index} = {}", primitive_text(*item, src))
                    } else {
                        format!("{index} = {}", item.kind())
                    };
                    let id = tree.add_child(list, SlotKind::ListItem, label);
                    push_slots(tree, id, *item, src);
                }
            }
        }
    }
}

fn is_leaf(node: Node<'_>) -> bool {
    node.named_child_count() == 0
}

/// Source text of a leaf, flattened to one line and shortened.
fn primitive_text(node: Node<'_>, src: &[u8]) -> String {
    let text = node.utf8_text(src).unwrap_or("?");
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > MAX_PRIMITIVE_LEN {
        let cut: String = flat.chars().take(MAX_PRIMITIVE_LEN - 1).collect();
        format!("{cut}…")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(tree: &DisplayTree, id: NodeId) -> Vec<String> {
        tree.get(id)
            .children
            .iter()
            .map(|&c| tree.get(c).name.clone())
            .collect()
    }

    #[test]
    fn module_body_is_a_list_of_statements() {
        let tree = build_tree("a = 10\nb = a + 4\nc = \"hello world\"\n").unwrap();
        assert_eq!(tree.get(tree.root).name, "module");

        let body = tree.cursor_root().unwrap();
        assert_eq!(tree.get(body).name, "body = list");
        assert_eq!(tree.get(body).kind, SlotKind::List);
        assert_eq!(
            labels(&tree, body),
            vec![
                "0 = expression_statement",
                "1 = expression_statement",
                "2 = expression_statement",
            ]
        );
    }

    #[test]
    fn assignment_fields_become_slots() {
        let tree = build_tree("a = 10\n").unwrap();
        let body = tree.cursor_root().unwrap();
        let stmt = tree.get(body).children[0];
        // expression_statement holds an unnamed assignment child.
        let inner = tree.get(stmt).children[0];
        assert_eq!(tree.get(inner).name, "body = list");
        let assignment = tree.get(inner).children[0];
        assert_eq!(tree.get(assignment).name, "0 = assignment");
        assert_eq!(labels(&tree, assignment), vec!["left = a", "right = 10"]);
        for &c in &tree.get(assignment).children {
            assert_eq!(tree.get(c).kind, SlotKind::Primitive);
        }
    }

    #[test]
    fn named_punctuation_is_kept() {
        let tree = build_tree("b = a + 4\n").unwrap();
        let binary = tree
            .nodes
            .iter()
            .position(|n| n.name == "right = binary_operator")
            .expect("binary operator slot");
        assert_eq!(
            labels(&tree, binary),
            vec!["left = a", "operator = +", "right = 4"]
        );
    }

    #[test]
    fn unnamed_children_never_share_a_label_with_body() {
        let tree = build_tree("with open(f) as g:\n    pass\n").unwrap();
        let with = tree
            .nodes
            .iter()
            .position(|n| n.name == "0 = with_statement")
            .expect("with statement slot");
        assert_eq!(labels(&tree, with), vec!["children = list", "body = block"]);
    }

    #[test]
    fn ids_are_preorder() {
        let tree = build_tree("a = 10\nb = 2\n").unwrap();
        let mut order = Vec::new();
        let mut stack = vec![tree.root];
        while let Some(id) = stack.pop() {
            order.push(tree.get(id).id);
            stack.extend(tree.get(id).children.iter().rev());
        }
        let expected: Vec<u64> = (0..tree.nodes.len() as u64).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn empty_module_has_no_cursor_root() {
        let tree = build_tree("").unwrap();
        assert!(tree.cursor_root().is_none());
        assert!(tree.to_wire().children.is_none());
    }

    #[test]
    fn long_primitives_are_shortened() {
        let long = "x".repeat(80);
        let tree = build_tree(&format!("a = {long}\n")).unwrap();
        let slot = tree
            .nodes
            .iter()
            .find(|n| n.name.starts_with("right = "))
            .unwrap();
        assert!(slot.name.ends_with('…'));
        assert!(slot.name.chars().count() <= "right = ".len() + MAX_PRIMITIVE_LEN);
    }
}
