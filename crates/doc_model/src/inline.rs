//! Character-offset helpers for the inline content of textblocks
//!
//! Offsets count Unicode scalar values of text nodes; every non-text inline
//! node (a hard break) occupies a single offset.

use crate::{Mark, Node};

/// Width of an inline node in offsets
pub fn inline_width(node: &Node) -> usize {
    match node.text_str() {
        Some(text) => text.chars().count(),
        None => 1,
    }
}

/// Total width of a textblock's inline content
pub fn inline_len(content: &[Node]) -> usize {
    content.iter().map(inline_width).sum()
}

/// Split inline content at `offset`, cutting a text node in two if needed
pub fn split_inline(content: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0;

    for node in content {
        let width = inline_width(node);
        if pos + width <= offset {
            before.push(node.clone());
        } else if pos >= offset {
            after.push(node.clone());
        } else if let Node::Text { text, marks } = node {
            let cut = offset - pos;
            let head: String = text.chars().take(cut).collect();
            let tail: String = text.chars().skip(cut).collect();
            before.push(Node::marked_text(head, marks.clone()));
            after.push(Node::marked_text(tail, marks.clone()));
        } else {
            after.push(node.clone());
        }
        pos += width;
    }

    (normalize_inline(before), normalize_inline(after))
}

/// Drop empty text nodes and merge adjacent text nodes with identical marks
pub fn normalize_inline(content: Vec<Node>) -> Vec<Node> {
    let mut result: Vec<Node> = Vec::with_capacity(content.len());
    for node in content {
        if let Node::Text { text, marks } = &node {
            if text.is_empty() {
                continue;
            }
            if let Some(Node::Text {
                text: prev_text,
                marks: prev_marks,
            }) = result.last_mut()
            {
                if prev_marks == marks {
                    prev_text.push_str(text);
                    continue;
                }
            }
        }
        result.push(node);
    }
    result
}

/// Marks a character typed at `offset` inherits: those of the text before it,
/// or of the text after it at the start of the block
pub fn marks_at(content: &[Node], offset: usize) -> Vec<Mark> {
    let mut pos = 0;
    let mut following = None;
    for node in content {
        let width = inline_width(node);
        if offset > pos && offset <= pos + width {
            return node.marks().to_vec();
        }
        if following.is_none() && offset == pos {
            following = Some(node.marks().to_vec());
        }
        pos += width;
    }
    following.unwrap_or_default()
}

/// Inline content with the range `from..to` removed
pub fn delete_inline(content: &[Node], from: usize, to: usize) -> Vec<Node> {
    let (before, rest) = split_inline(content, from);
    let (_, after) = split_inline(&rest, to.saturating_sub(from));
    let mut merged = before;
    merged.extend(after);
    normalize_inline(merged)
}

/// Apply `update` to the marks of every text segment inside `from..to`
pub fn map_marks_in_range(
    content: &[Node],
    from: usize,
    to: usize,
    update: &dyn Fn(&mut Vec<Mark>),
) -> Vec<Node> {
    let (before, rest) = split_inline(content, from);
    let (middle, after) = split_inline(&rest, to.saturating_sub(from));
    let middle = middle.into_iter().map(|node| match node {
        Node::Text { text, mut marks } => {
            update(&mut marks);
            Node::Text { text, marks }
        }
        other => other,
    });
    let mut merged = before;
    merged.extend(middle);
    merged.extend(after);
    normalize_inline(merged)
}
