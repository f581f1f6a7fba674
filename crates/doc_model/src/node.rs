//! Node kinds and the document tree node type

use crate::{
    BylineAttrs, CodeBlockAttrs, DocModelError, HeadingAttrs, ImageAttrs, LearningResourceAttrs,
    Mark, MediaEmbedAttrs, NodePath, OrderedListAttrs, Result, TaskItemAttrs,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Enumeration of all node kinds an article document can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Doc,
    Banner,
    Byline,
    Heading,
    Paragraph,
    Text,
    HardBreak,
    BulletList,
    OrderedList,
    ListItem,
    TaskList,
    TaskItem,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    Divider,
    Image,
    MediaEmbed,
    MediaEmbedInput,
    LearningResource,
    LearningResourceInput,
}

impl NodeKind {
    pub const ALL: [NodeKind; 21] = [
        NodeKind::Doc,
        NodeKind::Banner,
        NodeKind::Byline,
        NodeKind::Heading,
        NodeKind::Paragraph,
        NodeKind::Text,
        NodeKind::HardBreak,
        NodeKind::BulletList,
        NodeKind::OrderedList,
        NodeKind::ListItem,
        NodeKind::TaskList,
        NodeKind::TaskItem,
        NodeKind::Blockquote,
        NodeKind::CodeBlock,
        NodeKind::HorizontalRule,
        NodeKind::Divider,
        NodeKind::Image,
        NodeKind::MediaEmbed,
        NodeKind::MediaEmbedInput,
        NodeKind::LearningResource,
        NodeKind::LearningResourceInput,
    ];

    /// The `type` string used in the document JSON format
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Banner => "banner",
            NodeKind::Byline => "byline",
            NodeKind::Heading => "heading",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Text => "text",
            NodeKind::HardBreak => "hardBreak",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::TaskList => "taskList",
            NodeKind::TaskItem => "taskItem",
            NodeKind::Blockquote => "blockquote",
            NodeKind::CodeBlock => "codeBlock",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::Divider => "divider",
            NodeKind::Image => "image",
            NodeKind::MediaEmbed => "mediaEmbed",
            NodeKind::MediaEmbedInput => "mediaEmbedInput",
            NodeKind::LearningResource => "learningResource",
            NodeKind::LearningResourceInput => "learningResourceInput",
        }
    }

    /// Look up a kind by its `type` string
    pub fn from_name(name: &str) -> Option<NodeKind> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }

    /// Textblocks hold inline content directly
    pub fn is_textblock(self) -> bool {
        matches!(self, NodeKind::Heading | NodeKind::Paragraph | NodeKind::CodeBlock)
    }

    pub fn is_inline(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::HardBreak)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = DocModelError;

    fn from_str(s: &str) -> Result<Self> {
        NodeKind::from_name(s).ok_or_else(|| DocModelError::UnknownNodeType(s.to_string()))
    }
}

/// A node of the document tree.
///
/// The serialized form is the editor's document JSON: a `type` tag, optional
/// `attrs`, optional `content`, and `text`/`marks` on text nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Doc {
        #[serde(default)]
        content: Vec<Node>,
    },
    Banner {
        #[serde(default)]
        content: Vec<Node>,
    },
    Byline {
        #[serde(default)]
        attrs: BylineAttrs,
    },
    Heading {
        #[serde(default)]
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
    HardBreak,
    BulletList {
        #[serde(default)]
        content: Vec<Node>,
    },
    OrderedList {
        #[serde(default)]
        attrs: OrderedListAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    ListItem {
        #[serde(default)]
        content: Vec<Node>,
    },
    TaskList {
        #[serde(default)]
        content: Vec<Node>,
    },
    TaskItem {
        #[serde(default)]
        attrs: TaskItemAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    Blockquote {
        #[serde(default)]
        content: Vec<Node>,
    },
    CodeBlock {
        #[serde(default)]
        attrs: CodeBlockAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    HorizontalRule,
    Divider,
    Image {
        #[serde(default)]
        attrs: ImageAttrs,
    },
    MediaEmbed {
        #[serde(default)]
        attrs: MediaEmbedAttrs,
    },
    MediaEmbedInput {
        #[serde(default)]
        content: Vec<Node>,
    },
    LearningResource {
        #[serde(default)]
        attrs: LearningResourceAttrs,
    },
    LearningResourceInput {
        #[serde(default)]
        content: Vec<Node>,
    },
}

impl Node {
    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn doc(content: Vec<Node>) -> Self {
        Node::Doc { content }
    }

    pub fn banner(heading: Node, subheading: Node) -> Self {
        Node::Banner {
            content: vec![heading, subheading],
        }
    }

    pub fn byline() -> Self {
        Node::Byline {
            attrs: BylineAttrs::default(),
        }
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Self {
        Node::Heading {
            attrs: HeadingAttrs { level },
            content,
        }
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Node::Paragraph { content }
    }

    /// A paragraph holding a single unmarked text run (empty for `""`)
    pub fn paragraph_with_text(text: &str) -> Self {
        if text.is_empty() {
            Node::paragraph(Vec::new())
        } else {
            Node::paragraph(vec![Node::text(text)])
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked_text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Node::Text {
            text: text.into(),
            marks,
        }
    }

    pub fn learning_resource(resource_id: u64, href: Option<String>) -> Self {
        Node::LearningResource {
            attrs: LearningResourceAttrs {
                resource_id: Some(resource_id),
                href,
                editable: true,
            },
        }
    }

    /// Build a node tree from document JSON
    pub fn from_json(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to document JSON
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Doc { .. } => NodeKind::Doc,
            Node::Banner { .. } => NodeKind::Banner,
            Node::Byline { .. } => NodeKind::Byline,
            Node::Heading { .. } => NodeKind::Heading,
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Text { .. } => NodeKind::Text,
            Node::HardBreak => NodeKind::HardBreak,
            Node::BulletList { .. } => NodeKind::BulletList,
            Node::OrderedList { .. } => NodeKind::OrderedList,
            Node::ListItem { .. } => NodeKind::ListItem,
            Node::TaskList { .. } => NodeKind::TaskList,
            Node::TaskItem { .. } => NodeKind::TaskItem,
            Node::Blockquote { .. } => NodeKind::Blockquote,
            Node::CodeBlock { .. } => NodeKind::CodeBlock,
            Node::HorizontalRule => NodeKind::HorizontalRule,
            Node::Divider => NodeKind::Divider,
            Node::Image { .. } => NodeKind::Image,
            Node::MediaEmbed { .. } => NodeKind::MediaEmbed,
            Node::MediaEmbedInput { .. } => NodeKind::MediaEmbedInput,
            Node::LearningResource { .. } => NodeKind::LearningResource,
            Node::LearningResourceInput { .. } => NodeKind::LearningResourceInput,
        }
    }

    /// Child nodes; empty for leaves
    pub fn content(&self) -> &[Node] {
        match self {
            Node::Doc { content }
            | Node::Banner { content }
            | Node::Heading { content, .. }
            | Node::Paragraph { content }
            | Node::BulletList { content }
            | Node::OrderedList { content, .. }
            | Node::ListItem { content }
            | Node::TaskList { content }
            | Node::TaskItem { content, .. }
            | Node::Blockquote { content }
            | Node::CodeBlock { content, .. }
            | Node::MediaEmbedInput { content }
            | Node::LearningResourceInput { content } => content,
            Node::Byline { .. }
            | Node::Text { .. }
            | Node::HardBreak
            | Node::HorizontalRule
            | Node::Divider
            | Node::Image { .. }
            | Node::MediaEmbed { .. }
            | Node::LearningResource { .. } => &[],
        }
    }

    /// Mutable child list; `None` for nodes that cannot hold children
    pub fn content_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Doc { content }
            | Node::Banner { content }
            | Node::Heading { content, .. }
            | Node::Paragraph { content }
            | Node::BulletList { content }
            | Node::OrderedList { content, .. }
            | Node::ListItem { content }
            | Node::TaskList { content }
            | Node::TaskItem { content, .. }
            | Node::Blockquote { content }
            | Node::CodeBlock { content, .. }
            | Node::MediaEmbedInput { content }
            | Node::LearningResourceInput { content } => Some(content),
            Node::Byline { .. }
            | Node::Text { .. }
            | Node::HardBreak
            | Node::HorizontalRule
            | Node::Divider
            | Node::Image { .. }
            | Node::MediaEmbed { .. }
            | Node::LearningResource { .. } => None,
        }
    }

    /// Whether this node can hold child nodes at all
    pub fn is_container(&self) -> bool {
        match self {
            Node::Doc { .. }
            | Node::Banner { .. }
            | Node::Heading { .. }
            | Node::Paragraph { .. }
            | Node::BulletList { .. }
            | Node::OrderedList { .. }
            | Node::ListItem { .. }
            | Node::TaskList { .. }
            | Node::TaskItem { .. }
            | Node::Blockquote { .. }
            | Node::CodeBlock { .. }
            | Node::MediaEmbedInput { .. }
            | Node::LearningResourceInput { .. } => true,
            Node::Byline { .. }
            | Node::Text { .. }
            | Node::HardBreak
            | Node::HorizontalRule
            | Node::Divider
            | Node::Image { .. }
            | Node::MediaEmbed { .. }
            | Node::LearningResource { .. } => false,
        }
    }

    pub fn is_textblock(&self) -> bool {
        self.kind().is_textblock()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text { .. })
    }

    pub fn text_str(&self) -> Option<&str> {
        match self {
            Node::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Marks on a text node; empty for every other node
    pub fn marks(&self) -> &[Mark] {
        match self {
            Node::Text { marks, .. } => marks,
            _ => &[],
        }
    }

    /// Concatenated text of all descendant text nodes, without separators
    pub fn text_content(&self) -> String {
        match self {
            Node::Text { text, .. } => text.clone(),
            other => other.content().iter().map(Node::text_content).collect(),
        }
    }

    /// Whether the node has no children (and, for text, no characters)
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Text { text, .. } => text.is_empty(),
            other => other.content().is_empty(),
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content().get(index)
    }

    /// Node at `path` relative to this node
    pub fn node_at(&self, path: &NodePath) -> Option<&Node> {
        path.indices()
            .iter()
            .try_fold(self, |node, &index| node.child(index))
    }

    pub fn node_at_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let mut node = self;
        for &index in path.indices() {
            node = node.content_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// Return a copy of this tree with the node at `path` replaced
    pub fn replace_at(&self, path: &NodePath, replacement: Node) -> Result<Node> {
        let mut tree = self.clone();
        let slot = tree
            .node_at_mut(path)
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        *slot = replacement;
        Ok(tree)
    }

    /// Return a copy of this tree with `node` inserted as child `index` of `parent`
    pub fn insert_at(&self, parent: &NodePath, index: usize, node: Node) -> Result<Node> {
        let mut tree = self.clone();
        let target = tree
            .node_at_mut(parent)
            .ok_or_else(|| DocModelError::InvalidPath(parent.clone()))?;
        let content = target
            .content_mut()
            .ok_or_else(|| DocModelError::NotAContainer(parent.clone()))?;
        if index > content.len() {
            return Err(DocModelError::InvalidPath(parent.child(index)));
        }
        content.insert(index, node);
        Ok(tree)
    }

    /// Return a copy of this tree without the node at `path`, plus the removed node
    pub fn remove_at(&self, path: &NodePath) -> Result<(Node, Node)> {
        let parent = path
            .parent()
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        let index = path
            .last_index()
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        let mut tree = self.clone();
        let content = tree
            .node_at_mut(&parent)
            .and_then(Node::content_mut)
            .ok_or_else(|| DocModelError::InvalidPath(path.clone()))?;
        if index >= content.len() {
            return Err(DocModelError::InvalidPath(path.clone()));
        }
        let removed = content.remove(index);
        Ok((tree, removed))
    }

    /// Visit every node in document order with its path
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node, &NodePath)) {
        fn go<'a>(node: &'a Node, path: &NodePath, visit: &mut dyn FnMut(&'a Node, &NodePath)) {
            visit(node, path);
            for (index, child) in node.content().iter().enumerate() {
                go(child, &path.child(index), visit);
            }
        }
        go(self, &NodePath::root(), visit);
    }

    /// Path of the first node (document order) satisfying `predicate`
    pub fn find_path(&self, predicate: impl Fn(&Node) -> bool) -> Option<NodePath> {
        let mut found = None;
        self.walk(&mut |node, path| {
            if found.is_none() && predicate(node) {
                found = Some(path.clone());
            }
        });
        found
    }
}
