//! Node type definitions and the article schema

use crate::content::{ContentExpr, ContentMatch};
use crate::{DocModelError, Node, NodeKind, Result};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Placeholder shown in an empty textblock when no specific rule applies
pub const DEFAULT_PLACEHOLDER: &str = "Add some text";

/// Name of the group every top-level body node belongs to
pub const BLOCK_GROUP: &str = "block";

/// Name of the group of nodes allowed inside textblocks
pub const INLINE_GROUP: &str = "inline";

/// An attribute a node type declares, with its default value
#[derive(Debug, Clone, PartialEq)]
pub struct AttrSpec {
    pub name: &'static str,
    pub default: Value,
}

impl AttrSpec {
    pub fn new(name: &'static str, default: Value) -> Self {
        Self { name, default }
    }
}

/// Definition of one node type: grammar, groups, attributes and editing flags
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTypeDefinition {
    pub kind: NodeKind,
    /// Content expression source, compiled when the schema is built
    pub content: String,
    pub groups: Vec<&'static str>,
    pub attrs: Vec<AttrSpec>,
    /// Atomic nodes have no editable children and are edited as a unit
    pub atom: bool,
    /// Whether the node can be selected as a unit
    pub selectable: bool,
    /// Whether text children may carry marks
    pub allows_marks: bool,
    /// Placeholder shown when this node is empty
    pub placeholder: Option<&'static str>,
    /// Placeholders for empty children of this node, by child kind
    pub child_placeholders: Vec<(NodeKind, &'static str)>,
}

impl NodeTypeDefinition {
    pub fn new(kind: NodeKind, content: &str) -> Self {
        Self {
            kind,
            content: content.to_string(),
            groups: Vec::new(),
            attrs: Vec::new(),
            atom: false,
            selectable: false,
            allows_marks: true,
            placeholder: None,
            child_placeholders: Vec::new(),
        }
    }

    /// An atomic, selectable leaf
    pub fn atom(kind: NodeKind) -> Self {
        Self {
            atom: true,
            selectable: true,
            ..Self::new(kind, "")
        }
    }

    pub fn in_group(mut self, group: &'static str) -> Self {
        self.groups.push(group);
        self
    }

    pub fn attr(mut self, name: &'static str, default: Value) -> Self {
        self.attrs.push(AttrSpec::new(name, default));
        self
    }

    pub fn selectable(mut self) -> Self {
        self.selectable = true;
        self
    }

    pub fn without_marks(mut self) -> Self {
        self.allows_marks = false;
        self
    }

    pub fn placeholder(mut self, text: &'static str) -> Self {
        self.placeholder = Some(text);
        self
    }

    pub fn child_placeholder(mut self, child: NodeKind, text: &'static str) -> Self {
        self.child_placeholders.push((child, text));
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn is_in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| *g == group)
    }

    /// Attribute map with every declared default, overridden by `attrs`
    pub fn attrs_with_defaults(&self, attrs: &Map<String, Value>) -> Map<String, Value> {
        let mut merged: Map<String, Value> = self
            .attrs
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default.clone()))
            .collect();
        for (name, value) in attrs {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}

/// The set of node type definitions for one document kind, with each
/// definition's content expression compiled
#[derive(Debug, Clone)]
pub struct Schema {
    definitions: BTreeMap<NodeKind, NodeTypeDefinition>,
    content: BTreeMap<NodeKind, ContentExpr>,
}

impl Schema {
    /// Build a schema, compiling every content expression against the
    /// definitions' type names and groups
    pub fn new(definitions: Vec<NodeTypeDefinition>) -> Result<Self> {
        let definitions: BTreeMap<NodeKind, NodeTypeDefinition> = definitions
            .into_iter()
            .map(|def| (def.kind, def))
            .collect();

        let resolve = |name: &str| -> Option<Vec<NodeKind>> {
            if let Some(kind) = NodeKind::from_name(name) {
                if definitions.contains_key(&kind) {
                    return Some(vec![kind]);
                }
            }
            let members: Vec<NodeKind> = definitions
                .values()
                .filter(|def| def.is_in_group(name))
                .map(|def| def.kind)
                .collect();
            (!members.is_empty()).then_some(members)
        };

        let mut content = BTreeMap::new();
        for def in definitions.values() {
            content.insert(def.kind, ContentExpr::parse(&def.content, &resolve)?);
        }

        Ok(Self {
            definitions,
            content,
        })
    }

    pub fn definition(&self, kind: NodeKind) -> Option<&NodeTypeDefinition> {
        self.definitions.get(&kind)
    }

    /// Look up a definition by its `type` string
    pub fn definition_by_name(&self, name: &str) -> Option<&NodeTypeDefinition> {
        NodeKind::from_name(name).and_then(|kind| self.definition(kind))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &NodeTypeDefinition> {
        self.definitions.values()
    }

    pub fn content_expr(&self, kind: NodeKind) -> Option<&ContentExpr> {
        self.content.get(&kind)
    }

    /// Match state at the start of `kind`'s content
    pub fn content_match(&self, kind: NodeKind) -> Option<ContentMatch<'_>> {
        self.content_expr(kind).map(ContentExpr::start)
    }

    pub fn group_members(&self, group: &str) -> Vec<NodeKind> {
        self.definitions
            .values()
            .filter(|def| def.is_in_group(group))
            .map(|def| def.kind)
            .collect()
    }

    pub fn is_in_group(&self, kind: NodeKind, group: &str) -> bool {
        self.definition(kind).is_some_and(|def| def.is_in_group(group))
    }

    /// Placeholder text for an empty node given its parent. Parent-specific
    /// rules win over the node's own placeholder; empty textblocks without
    /// either fall back to [`DEFAULT_PLACEHOLDER`]. Non-empty nodes get none.
    pub fn placeholder(&self, node: &Node, parent: Option<&Node>) -> Option<&'static str> {
        if !node.is_empty() {
            return None;
        }
        let kind = node.kind();

        let from_parent = parent
            .and_then(|p| self.definition(p.kind()))
            .and_then(|def| {
                def.child_placeholders
                    .iter()
                    .find(|(child, _)| *child == kind)
                    .map(|(_, text)| *text)
            });

        from_parent
            .or_else(|| self.definition(kind).and_then(|def| def.placeholder))
            .or_else(|| kind.is_textblock().then_some(DEFAULT_PLACEHOLDER))
    }

    /// Build a node of type `name`, filling attribute defaults from its
    /// definition
    pub fn create_node(&self, name: &str, attrs: Map<String, Value>) -> Result<Node> {
        let def = self
            .definition_by_name(name)
            .ok_or_else(|| DocModelError::UnknownNodeType(name.to_string()))?;
        let mut value = json!({ "type": def.name() });
        if !def.attrs.is_empty() || !attrs.is_empty() {
            value["attrs"] = Value::Object(def.attrs_with_defaults(&attrs));
        }
        Node::from_json(value)
    }

    /// Build a node of type `name` and give it the minimal children its
    /// grammar requires, created empty themselves
    pub fn create_and_fill(&self, name: &str, attrs: Map<String, Value>) -> Result<Node> {
        let node = self.create_node(name, attrs)?;
        self.fill(node, 0)
    }

    fn fill(&self, mut node: Node, depth: usize) -> Result<Node> {
        const MAX_FILL_DEPTH: usize = 8;
        let Some(start) = self.content_match(node.kind()) else {
            return Ok(node);
        };
        if start.valid_end() || depth >= MAX_FILL_DEPTH {
            return Ok(node);
        }

        let kinds = start
            .fill_to_end(&|kind| kind != NodeKind::Text && self.definition(kind).is_some())
            .ok_or_else(|| DocModelError::InvalidContentExpression {
                expr: self
                    .content_expr(node.kind())
                    .map(|expr| expr.source().to_string())
                    .unwrap_or_default(),
                reason: format!("{} cannot be filled with empty content", node.kind()),
            })?;

        let mut children = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let child = self.create_node(kind.as_str(), Map::new())?;
            children.push(self.fill(child, depth + 1)?);
        }
        if let Some(content) = node.content_mut() {
            *content = children;
        }
        Ok(node)
    }
}

/// The schema for articles: a banner (title and subheading), a byline, and a
/// body of one or more block nodes
pub fn article_schema() -> Result<Schema> {
    use NodeKind::*;

    Schema::new(vec![
        NodeTypeDefinition::new(Doc, "banner byline block+"),
        NodeTypeDefinition::new(Banner, "heading paragraph")
            .child_placeholder(Heading, "Add a title")
            .child_placeholder(Paragraph, "Add a subheading"),
        NodeTypeDefinition::atom(Byline)
            .attr("authorName", Value::Null)
            .attr("publishedOn", Value::Null),
        NodeTypeDefinition::new(Heading, "inline*")
            .in_group(BLOCK_GROUP)
            .attr("level", json!(1)),
        NodeTypeDefinition::new(Paragraph, "inline*")
            .in_group(BLOCK_GROUP)
            .placeholder(DEFAULT_PLACEHOLDER),
        NodeTypeDefinition::new(Text, "").in_group(INLINE_GROUP),
        NodeTypeDefinition::new(HardBreak, "").in_group(INLINE_GROUP),
        NodeTypeDefinition::new(BulletList, "listItem+").in_group(BLOCK_GROUP),
        NodeTypeDefinition::new(OrderedList, "listItem+")
            .in_group(BLOCK_GROUP)
            .attr("start", json!(1)),
        NodeTypeDefinition::new(ListItem, "paragraph block*"),
        NodeTypeDefinition::new(TaskList, "taskItem+").in_group(BLOCK_GROUP),
        NodeTypeDefinition::new(TaskItem, "paragraph block*").attr("checked", json!(false)),
        NodeTypeDefinition::new(Blockquote, "block+").in_group(BLOCK_GROUP),
        NodeTypeDefinition::new(CodeBlock, "text*")
            .in_group(BLOCK_GROUP)
            .attr("language", Value::Null)
            .without_marks(),
        NodeTypeDefinition::atom(HorizontalRule).in_group(BLOCK_GROUP),
        NodeTypeDefinition::atom(Divider).in_group(BLOCK_GROUP),
        NodeTypeDefinition::atom(Image)
            .in_group(BLOCK_GROUP)
            .attr("src", Value::Null)
            .attr("alt", Value::Null)
            .attr("title", Value::Null)
            .attr("caption", Value::Null)
            .attr("layout", json!("default"))
            .attr("editable", json!(true))
            .attr("uploadId", Value::Null),
        NodeTypeDefinition::atom(MediaEmbed)
            .in_group(BLOCK_GROUP)
            .attr("src", Value::Null)
            .attr("caption", Value::Null)
            .attr("layout", json!("default"))
            .attr("editable", json!(true)),
        NodeTypeDefinition::new(MediaEmbedInput, "paragraph")
            .in_group(BLOCK_GROUP)
            .selectable()
            .child_placeholder(Paragraph, "Paste a video URL and press Enter"),
        NodeTypeDefinition::atom(LearningResource)
            .in_group(BLOCK_GROUP)
            .attr("resourceId", Value::Null)
            .attr("href", Value::Null)
            .attr("editable", json!(true)),
        NodeTypeDefinition::new(LearningResourceInput, "paragraph")
            .in_group(BLOCK_GROUP)
            .selectable()
            .child_placeholder(Paragraph, "Paste a resource URL and press Enter"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        article_schema().unwrap()
    }

    #[test]
    fn test_every_kind_is_defined() {
        let schema = schema();
        for kind in NodeKind::ALL {
            assert!(schema.definition(kind).is_some(), "missing {}", kind);
        }
    }

    #[test]
    fn test_doc_grammar() {
        let schema = schema();
        let doc = schema.content_expr(NodeKind::Doc).unwrap();
        assert!(doc.matches([NodeKind::Banner, NodeKind::Byline, NodeKind::Paragraph]));
        assert!(doc.matches([
            NodeKind::Banner,
            NodeKind::Byline,
            NodeKind::LearningResource,
            NodeKind::BulletList,
        ]));
        assert!(!doc.matches([NodeKind::Banner, NodeKind::Byline]));
        assert!(!doc.matches([NodeKind::Byline, NodeKind::Banner, NodeKind::Paragraph]));
        // list items are not blocks on their own
        assert!(!doc.matches([NodeKind::Banner, NodeKind::Byline, NodeKind::ListItem]));
    }

    #[test]
    fn test_block_group_membership() {
        let schema = schema();
        let blocks = schema.group_members(BLOCK_GROUP);
        assert!(blocks.contains(&NodeKind::Paragraph));
        assert!(blocks.contains(&NodeKind::LearningResourceInput));
        assert!(!blocks.contains(&NodeKind::Banner));
        assert!(!blocks.contains(&NodeKind::Text));
        assert!(schema.is_in_group(NodeKind::Text, INLINE_GROUP));
    }

    #[test]
    fn test_placeholders() {
        let schema = schema();
        let empty_heading = Node::heading(1, Vec::new());
        let empty_paragraph = Node::paragraph(Vec::new());
        let banner = Node::banner(empty_heading.clone(), empty_paragraph.clone());
        let doc = Node::doc(Vec::new());

        assert_eq!(schema.placeholder(&empty_heading, Some(&banner)), Some("Add a title"));
        assert_eq!(
            schema.placeholder(&empty_paragraph, Some(&banner)),
            Some("Add a subheading")
        );
        assert_eq!(schema.placeholder(&empty_paragraph, Some(&doc)), Some("Add some text"));
        assert_eq!(schema.placeholder(&empty_heading, Some(&doc)), Some("Add some text"));
        assert_eq!(schema.placeholder(&empty_heading, None), Some("Add some text"));
        assert_eq!(
            schema.placeholder(&Node::paragraph_with_text("x"), Some(&banner)),
            None
        );
        assert_eq!(schema.placeholder(&Node::Divider, Some(&doc)), None);
    }

    #[test]
    fn test_create_node_fills_defaults() {
        let schema = schema();
        let mut attrs = Map::new();
        attrs.insert("resourceId".to_string(), json!(12));
        let node = schema.create_node("learningResource", attrs).unwrap();
        match node {
            Node::LearningResource { attrs } => {
                assert_eq!(attrs.resource_id, Some(12));
                assert!(attrs.editable);
            }
            other => panic!("unexpected node {:?}", other),
        }
        assert!(schema.create_node("table", Map::new()).is_err());
    }

    #[test]
    fn test_loaded_attrs_match_definition_defaults() {
        let schema = schema();
        for def in schema.definitions().filter(|def| !def.attrs.is_empty()) {
            let created = schema.create_node(def.name(), Map::new()).unwrap();
            let loaded = Node::from_json(json!({"type": def.name()})).unwrap();
            assert_eq!(loaded, created, "defaults differ for {}", def.name());
        }
    }

    #[test]
    fn test_create_and_fill_input_node() {
        let schema = schema();
        let node = schema
            .create_and_fill("learningResourceInput", Map::new())
            .unwrap();
        assert_eq!(node.content(), &[Node::paragraph(Vec::new())]);

        let list = schema.create_and_fill("bulletList", Map::new()).unwrap();
        assert_eq!(list.content().len(), 1);
        assert_eq!(list.content()[0].content(), &[Node::paragraph(Vec::new())]);
    }

    #[test]
    fn test_invalid_grammar_is_rejected() {
        let result = Schema::new(vec![NodeTypeDefinition::new(NodeKind::Doc, "chapter+")]);
        assert!(matches!(
            result,
            Err(DocModelError::InvalidContentExpression { .. })
        ));
    }
}
