//! Node addressing by child indices

use serde::{Deserialize, Serialize};

/// Location of a node in the document tree, as the sequence of child indices
/// walked from the root. The empty path addresses the root itself.
///
/// Paths order lexicographically, which is document order: an ancestor sorts
/// before its descendants and earlier siblings before later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// The path of the root node
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_indices(indices: impl Into<Vec<usize>>) -> Self {
        Self(indices.into())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of the `index`th child of this node
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Path of the parent node, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// Index of this node within its parent, `None` for the root
    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Whether `other` lies strictly inside the subtree rooted here
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/")?;
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("/"))
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_and_child() {
        let path = NodePath::from_indices(vec![2, 0]);
        assert_eq!(path.parent(), Some(NodePath::from_indices(vec![2])));
        assert_eq!(path.last_index(), Some(0));
        assert_eq!(NodePath::root().parent(), None);
        assert_eq!(NodePath::root().child(3), NodePath::from_indices(vec![3]));
    }

    #[test]
    fn test_document_order() {
        let banner = NodePath::from_indices(vec![0]);
        let heading = NodePath::from_indices(vec![0, 0]);
        let byline = NodePath::from_indices(vec![1]);
        assert!(banner < heading);
        assert!(heading < byline);
        assert!(banner.is_ancestor_of(&heading));
        assert!(!heading.is_ancestor_of(&banner));
        assert!(!banner.is_ancestor_of(&banner));
    }

    #[test]
    fn test_display() {
        assert_eq!(NodePath::root().to_string(), "/");
        assert_eq!(NodePath::from_indices(vec![0, 1]).to_string(), "/0/1");
    }
}
