//! Selection model

use crate::NodePath;
use serde::{Deserialize, Serialize};

/// The editor selection: either a caret inside a textblock or a whole node
/// selected as a unit (embeds are selected this way after insertion)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Collapsed caret at a character offset inside the textblock at `path`
    Caret { path: NodePath, offset: usize },
    /// The node at `path` selected as a unit
    Node { path: NodePath },
}

impl Selection {
    pub fn caret(path: NodePath, offset: usize) -> Self {
        Selection::Caret { path, offset }
    }

    pub fn node(path: NodePath) -> Self {
        Selection::Node { path }
    }

    /// Path of the node the selection sits in (caret) or selects
    pub fn path(&self) -> &NodePath {
        match self {
            Selection::Caret { path, .. } | Selection::Node { path } => path,
        }
    }

    pub fn is_node_selection(&self) -> bool {
        matches!(self, Selection::Node { .. })
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Caret {
            path: NodePath::root(),
            offset: 0,
        }
    }
}
