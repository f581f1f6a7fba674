//! The canonical article skeleton and accessors for its fixed parts

use crate::{Node, NodeKind, NodePath};

/// Path of the banner in a well-formed article
pub fn banner_path() -> NodePath {
    NodePath::from_indices(vec![0])
}

/// Path of the banner heading (the article title) in a well-formed article
pub fn title_path() -> NodePath {
    NodePath::from_indices(vec![0, 0])
}

/// Path of the banner paragraph (the subheading) in a well-formed article
pub fn subheading_path() -> NodePath {
    NodePath::from_indices(vec![0, 1])
}

/// A new, empty article: a banner holding an empty title heading and an empty
/// subheading paragraph, a byline, and one empty body paragraph
pub fn empty_article() -> Node {
    Node::doc(vec![
        Node::banner(Node::heading(1, Vec::new()), Node::paragraph(Vec::new())),
        Node::byline(),
        Node::paragraph(Vec::new()),
    ])
}

/// The first banner among the document's top-level children
pub fn find_banner(doc: &Node) -> Option<&Node> {
    doc.content().iter().find(|n| n.kind() == NodeKind::Banner)
}
