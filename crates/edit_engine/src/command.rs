//! Command system for document editing
//!
//! Commands never mutate the document they are given. Each one reads a
//! snapshot and returns the next snapshot, the selection to show afterwards,
//! and the command that takes the document back.

use doc_model::{
    delete_inline, inline_len, map_marks_in_range, marks_at, normalize_inline, split_inline,
    DocModelError, Mark, Node, NodeKind, NodePath, Selection,
};
use serde_json::{Map, Value};
use std::any::Any;

use crate::{EditError, Result};

/// Result of applying a command
#[derive(Debug)]
pub struct CommandResult {
    /// The new document after the command
    pub doc: Node,
    /// The new selection after the command
    pub selection: Selection,
    /// The inverse command (for undo)
    pub inverse: Box<dyn Command>,
}

/// Trait for all editing commands
pub trait Command: std::fmt::Debug + Send + Sync {
    /// Apply this command to a document snapshot
    fn apply(&self, doc: &Node, selection: &Selection) -> Result<CommandResult>;

    /// Try to merge this command with one that directly follows it
    fn merge_with(&self, _other: &dyn Command) -> Option<Box<dyn Command>> {
        None
    }

    /// Get a display name for this command
    fn display_name(&self) -> &str;

    /// Clone this command into a box
    fn clone_box(&self) -> Box<dyn Command>;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Command> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn node_at<'a>(doc: &'a Node, path: &NodePath) -> Result<&'a Node> {
    doc.node_at(path)
        .ok_or_else(|| EditError::DocModel(DocModelError::InvalidPath(path.clone())))
}

fn textblock_at<'a>(doc: &'a Node, path: &NodePath) -> Result<&'a Node> {
    let node = node_at(doc, path)?;
    if !node.is_textblock() {
        return Err(DocModelError::NotATextblock(path.clone()).into());
    }
    Ok(node)
}

fn check_offset(block: &Node, path: &NodePath, offset: usize) -> Result<()> {
    let len = inline_len(block.content());
    if offset > len {
        return Err(DocModelError::OffsetOutOfRange {
            path: path.clone(),
            offset,
            len,
        }
        .into());
    }
    Ok(())
}

fn with_inline(block: &Node, content: Vec<Node>) -> Node {
    let mut block = block.clone();
    if let Some(slot) = block.content_mut() {
        *slot = content;
    }
    block
}

fn split_parent(path: &NodePath) -> Result<(NodePath, usize)> {
    match (path.parent(), path.last_index()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(EditError::InvalidCommand(format!(
            "node at {} has no parent",
            path
        ))),
    }
}

/// The selection to show after `path` is inserted: a caret at the start of
/// the first textblock reached by descending first children, or the node
/// itself selected as a unit
pub fn selection_into(doc: &Node, path: &NodePath) -> Selection {
    let mut current = path.clone();
    while let Some(node) = doc.node_at(&current) {
        if node.is_textblock() {
            return Selection::caret(current, 0);
        }
        if node.content().is_empty() {
            break;
        }
        current = current.child(0);
    }
    Selection::node(path.clone())
}

/// Undo entry that puts `old` back at `path` and restores `selection`
fn restore(path: NodePath, old: &Node, selection: &Selection) -> Box<dyn Command> {
    Box::new(ReplaceNode {
        path,
        node: old.clone(),
        selection: Some(selection.clone()),
    })
}

// ============================================================================
// Text commands
// ============================================================================

/// Insert text at a caret offset inside a textblock
#[derive(Debug, Clone, PartialEq)]
pub struct InsertText {
    pub path: NodePath,
    pub offset: usize,
    pub text: String,
}

impl InsertText {
    pub fn new(path: NodePath, offset: usize, text: impl Into<String>) -> Self {
        Self {
            path,
            offset,
            text: text.into(),
        }
    }
}

impl Command for InsertText {
    fn apply(&self, doc: &Node, selection: &Selection) -> Result<CommandResult> {
        let block = textblock_at(doc, &self.path)?;
        check_offset(block, &self.path, self.offset)?;

        // code blocks hold plain text only
        let marks = if block.kind() == NodeKind::CodeBlock {
            Vec::new()
        } else {
            marks_at(block.content(), self.offset)
        };
        let (mut content, after) = split_inline(block.content(), self.offset);
        content.push(Node::marked_text(self.text.clone(), marks));
        content.extend(after);

        let new_doc = doc.replace_at(&self.path, with_inline(block, normalize_inline(content)))?;
        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::caret(self.path.clone(), self.offset + self.text.chars().count()),
            inverse: restore(self.path.clone(), block, selection),
        })
    }

    fn merge_with(&self, other: &dyn Command) -> Option<Box<dyn Command>> {
        let next = other.as_any().downcast_ref::<InsertText>()?;
        if next.path != self.path || next.offset != self.offset + self.text.chars().count() {
            return None;
        }
        Some(Box::new(InsertText {
            path: self.path.clone(),
            offset: self.offset,
            text: format!("{}{}", self.text, next.text),
        }))
    }

    fn display_name(&self) -> &str {
        "Insert Text"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Delete the inline range `from..to` of a textblock
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteText {
    pub path: NodePath,
    pub from: usize,
    pub to: usize,
}

impl DeleteText {
    pub fn new(path: NodePath, from: usize, to: usize) -> Self {
        Self { path, from, to }
    }
}

impl Command for DeleteText {
    fn apply(&self, doc: &Node, selection: &Selection) -> Result<CommandResult> {
        if self.from > self.to {
            return Err(EditError::InvalidCommand(format!(
                "range {}..{} is reversed",
                self.from, self.to
            )));
        }
        let block = textblock_at(doc, &self.path)?;
        check_offset(block, &self.path, self.to)?;

        let content = delete_inline(block.content(), self.from, self.to);
        let new_doc = doc.replace_at(&self.path, with_inline(block, content))?;
        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::caret(self.path.clone(), self.from),
            inverse: restore(self.path.clone(), block, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Delete Text"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Split a textblock in two at a caret offset (the Enter key)
#[derive(Debug, Clone, PartialEq)]
pub struct SplitBlock {
    pub path: NodePath,
    pub offset: usize,
}

impl SplitBlock {
    pub fn new(path: NodePath, offset: usize) -> Self {
        Self { path, offset }
    }
}

impl Command for SplitBlock {
    fn apply(&self, doc: &Node, selection: &Selection) -> Result<CommandResult> {
        let block = textblock_at(doc, &self.path)?;
        check_offset(block, &self.path, self.offset)?;
        let (parent, index) = split_parent(&self.path)?;
        let old_parent = node_at(doc, &parent)?;

        let (before, after) = split_inline(block.content(), self.offset);
        // Enter at the end of a heading continues with a paragraph
        let second = if block.kind() == NodeKind::Heading && after.is_empty() {
            Node::paragraph(Vec::new())
        } else {
            with_inline(block, after)
        };

        let new_doc = doc
            .replace_at(&self.path, with_inline(block, before))?
            .insert_at(&parent, index + 1, second)?;

        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::caret(parent.child(index + 1), 0),
            inverse: restore(parent, old_parent, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Split Block"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Replace the whole text of a textblock with plain, unmarked text
#[derive(Debug, Clone, PartialEq)]
pub struct SetText {
    pub path: NodePath,
    pub text: String,
}

impl SetText {
    pub fn new(path: NodePath, text: impl Into<String>) -> Self {
        Self {
            path,
            text: text.into(),
        }
    }
}

impl Command for SetText {
    fn apply(&self, doc: &Node, selection: &Selection) -> Result<CommandResult> {
        let block = textblock_at(doc, &self.path)?;
        let content = if self.text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(self.text.clone())]
        };
        let new_doc = doc.replace_at(&self.path, with_inline(block, content))?;
        Ok(CommandResult {
            doc: new_doc,
            selection: Selection::caret(self.path.clone(), self.text.chars().count()),
            inverse: restore(self.path.clone(), block, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Set Text"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Structural commands
// ============================================================================

/// Insert a node as child `index` of the node at `parent`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertNode {
    pub parent: NodePath,
    pub index: usize,
    pub node: Node,
}

impl InsertNode {
    pub fn new(parent: NodePath, index: usize, node: Node) -> Self {
        Self {
            parent,
            index,
            node,
        }
    }
}

impl Command for InsertNode {
    fn apply(&self, doc: &Node, _selection: &Selection) -> Result<CommandResult> {
        let new_doc = doc.insert_at(&self.parent, self.index, self.node.clone())?;
        let path = self.parent.child(self.index);
        let selection = selection_into(&new_doc, &path);
        Ok(CommandResult {
            doc: new_doc,
            selection,
            inverse: Box::new(RemoveNode::new(path)),
        })
    }

    fn display_name(&self) -> &str {
        "Insert Node"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Remove the node at `path`
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveNode {
    pub path: NodePath,
}

impl RemoveNode {
    pub fn new(path: NodePath) -> Self {
        Self { path }
    }
}

impl Command for RemoveNode {
    fn apply(&self, doc: &Node, _selection: &Selection) -> Result<CommandResult> {
        let (parent, index) = split_parent(&self.path)?;
        let (new_doc, removed) = doc.remove_at(&self.path)?;

        let remaining = new_doc.node_at(&parent).map_or(0, |p| p.content().len());
        let selection = if index < remaining {
            selection_into(&new_doc, &parent.child(index))
        } else if index > 0 {
            selection_into(&new_doc, &parent.child(index - 1))
        } else {
            Selection::node(parent.clone())
        };

        Ok(CommandResult {
            doc: new_doc,
            selection,
            inverse: Box::new(InsertNode::new(parent, index, removed)),
        })
    }

    fn display_name(&self) -> &str {
        "Remove Node"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Replace the node at `path` in one step. Without an explicit selection the
/// replacement is selected the way [`selection_into`] does.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceNode {
    pub path: NodePath,
    pub node: Node,
    pub selection: Option<Selection>,
}

impl ReplaceNode {
    pub fn new(path: NodePath, node: Node) -> Self {
        Self {
            path,
            node,
            selection: None,
        }
    }

    /// Replace and select the new node as a unit
    pub fn selecting_node(path: NodePath, node: Node) -> Self {
        let selection = Some(Selection::node(path.clone()));
        Self {
            path,
            node,
            selection,
        }
    }
}

impl Command for ReplaceNode {
    fn apply(&self, doc: &Node, selection: &Selection) -> Result<CommandResult> {
        let old = node_at(doc, &self.path)?;
        let new_doc = doc.replace_at(&self.path, self.node.clone())?;
        let new_selection = self
            .selection
            .clone()
            .unwrap_or_else(|| selection_into(&new_doc, &self.path));
        Ok(CommandResult {
            doc: new_doc,
            selection: new_selection,
            inverse: restore(self.path.clone(), old, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Replace Node"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Merge attribute values into the node at `path`. Values are given in
/// document JSON form (camelCase names).
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAttrs {
    pub path: NodePath,
    pub attrs: Map<String, Value>,
}

impl UpdateAttrs {
    pub fn new(path: NodePath, attrs: Map<String, Value>) -> Self {
        Self { path, attrs }
    }
}

impl Command for UpdateAttrs {
    fn apply(&self, doc: &Node, selection: &Selection) -> Result<CommandResult> {
        let old = node_at(doc, &self.path)?;
        let mut value = old.to_json()?;
        let object = value.as_object_mut().ok_or_else(|| {
            EditError::ExecutionFailed(format!("node at {} is not a JSON object", self.path))
        })?;
        let attrs = object
            .entry("attrs")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(existing) = attrs {
            for (name, attr) in &self.attrs {
                existing.insert(name.clone(), attr.clone());
            }
        }

        let updated = Node::from_json(value)?;
        let new_doc = doc.replace_at(&self.path, updated)?;
        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: restore(self.path.clone(), old, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Update Attributes"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mark commands
// ============================================================================

/// Apply a mark to the inline range `from..to`, replacing any mark of the
/// same kind (a new link href wins over the old one)
#[derive(Debug, Clone, PartialEq)]
pub struct AddMark {
    pub path: NodePath,
    pub from: usize,
    pub to: usize,
    pub mark: Mark,
}

impl AddMark {
    pub fn new(path: NodePath, from: usize, to: usize, mark: Mark) -> Self {
        Self {
            path,
            from,
            to,
            mark,
        }
    }
}

impl Command for AddMark {
    fn apply(&self, doc: &Node, selection: &Selection) -> Result<CommandResult> {
        let block = textblock_at(doc, &self.path)?;
        check_offset(block, &self.path, self.to)?;
        if block.kind() == NodeKind::CodeBlock {
            return Err(EditError::InvalidCommand(format!(
                "{} mark is not allowed inside codeBlock",
                self.mark.name()
            )));
        }

        let content = map_marks_in_range(block.content(), self.from, self.to, &|marks| {
            marks.retain(|m| !m.same_kind(&self.mark));
            marks.push(self.mark.clone());
        });
        let new_doc = doc.replace_at(&self.path, with_inline(block, content))?;
        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: restore(self.path.clone(), block, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Add Mark"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Remove every mark of the given kind from the inline range `from..to`
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveMark {
    pub path: NodePath,
    pub from: usize,
    pub to: usize,
    pub mark: Mark,
}

impl RemoveMark {
    pub fn new(path: NodePath, from: usize, to: usize, mark: Mark) -> Self {
        Self {
            path,
            from,
            to,
            mark,
        }
    }
}

impl Command for RemoveMark {
    fn apply(&self, doc: &Node, selection: &Selection) -> Result<CommandResult> {
        let block = textblock_at(doc, &self.path)?;
        check_offset(block, &self.path, self.to)?;

        let content = map_marks_in_range(block.content(), self.from, self.to, &|marks| {
            marks.retain(|m| !m.same_kind(&self.mark));
        });
        let new_doc = doc.replace_at(&self.path, with_inline(block, content))?;
        Ok(CommandResult {
            doc: new_doc,
            selection: selection.clone(),
            inverse: restore(self.path.clone(), block, selection),
        })
    }

    fn display_name(&self) -> &str {
        "Remove Mark"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
