//! Finding where a node may be inserted
//!
//! Insertability is decided from the parent's content automaton alone, so no
//! trial edit is ever applied.

use doc_model::{Node, NodeKind, NodePath, Schema};

/// A gap between children: before child `index` of the node at `parent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPoint {
    pub parent: NodePath,
    pub index: usize,
}

impl InsertPoint {
    /// Path the inserted node will have
    pub fn path(&self) -> NodePath {
        self.parent.child(self.index)
    }
}

fn sequence_fits(schema: &Schema, parent: NodeKind, kinds: impl IntoIterator<Item = NodeKind>) -> bool {
    schema
        .content_match(parent)
        .and_then(|start| start.match_sequence(kinds))
        .is_some_and(|end| end.valid_end())
}

/// Whether inserting a `kind` node as child `index` of `parent` leaves the
/// parent's content valid
pub fn can_insert(schema: &Schema, doc: &Node, parent: &NodePath, index: usize, kind: NodeKind) -> bool {
    let Some(parent_node) = doc.node_at(parent) else {
        return false;
    };
    let content = parent_node.content();
    if index > content.len() {
        return false;
    }

    let before = content[..index].iter().map(Node::kind);
    let after = content[index..].iter().map(Node::kind);
    sequence_fits(
        schema,
        parent_node.kind(),
        before.chain(std::iter::once(kind)).chain(after),
    )
}

/// Whether the node at `path` may be swapped for a `kind` node
pub fn can_replace(schema: &Schema, doc: &Node, path: &NodePath, kind: NodeKind) -> bool {
    let (Some(parent), Some(index)) = (path.parent(), path.last_index()) else {
        // the root may only be replaced by another root
        return kind == NodeKind::Doc;
    };
    let Some(parent_node) = doc.node_at(&parent) else {
        return false;
    };
    let content = parent_node.content();
    if index >= content.len() {
        return false;
    }

    let kinds = content
        .iter()
        .enumerate()
        .map(|(i, child)| if i == index { kind } else { child.kind() });
    sequence_fits(schema, parent_node.kind(), kinds)
}

/// First point in document order after `from` where a `kind` node can be
/// inserted, `None` if there is nowhere valid
pub fn find_insert_position(
    schema: &Schema,
    doc: &Node,
    from: &NodePath,
    kind: NodeKind,
) -> Option<InsertPoint> {
    let mut points = Vec::new();
    doc.walk(&mut |node, path| {
        if node.is_container() {
            for index in 0..=node.content().len() {
                points.push(InsertPoint {
                    parent: path.clone(),
                    index,
                });
            }
        }
    });
    points.sort_by_key(InsertPoint::path);

    points
        .into_iter()
        .filter(|point| point.path() > *from)
        .find(|point| can_insert(schema, doc, &point.parent, point.index, kind))
}
