//! JSON payloads exchanged between the backend and the frontend.
//!
//! The backend answers `get_current` with a [`WireNode`] tree and `key_event`
//! with a list of [`WireAction`]s.  Both travel as plain strings so the
//! frontend has to cope with whatever body it receives.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One node of the tree sent by `get_current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub name: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub cursor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<WireNode>>,
}

impl WireNode {
    /// A node with no children.
    pub fn leaf(id: u64, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id,
            cursor: false,
            children: None,
        }
    }
}

/// One named action returned by `key_event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
    pub action: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_omit_children() {
        let json = serde_json::to_string(&WireNode::leaf(3, "id = a")).unwrap();
        assert_eq!(json, r#"{"name":"id = a","id":3,"cursor":false}"#);
    }

    #[test]
    fn missing_optional_fields_default() {
        let node: WireNode = serde_json::from_str(r#"{"name":"root"}"#).unwrap();
        assert_eq!(node.id, 0);
        assert!(!node.cursor);
        assert!(node.children.is_none());

        let action: WireAction = serde_json::from_str(r#"{"action":"refresh_ast"}"#).unwrap();
        assert!(action.args.is_empty());
    }
}
