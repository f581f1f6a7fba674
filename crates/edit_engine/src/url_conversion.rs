//! URL-to-node conversion
//!
//! A rule recognizes a resource reference typed into a paragraph and turns
//! it into an embed node. The same rules decide which auto-linked URLs lose
//! their link mark.

use doc_model::{normalize_inline, Mark, Node, NodeKind, NodePath, Schema, Selection};
use regex_lite::Regex;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::{can_replace, Result};

type ExtractFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
type CreateAttrsFn = Arc<dyn Fn(&str, &str) -> Map<String, Value> + Send + Sync>;

/// Turns text typed into an input node into an embed node
#[derive(Clone)]
pub struct ConversionRule {
    /// Placeholder node the URL is typed into
    pub input_node_type: NodeKind,
    /// Embed node the placeholder becomes
    pub output_node_type: NodeKind,
    extract_value: ExtractFn,
    create_attrs: CreateAttrsFn,
}

impl std::fmt::Debug for ConversionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionRule")
            .field("input_node_type", &self.input_node_type)
            .field("output_node_type", &self.output_node_type)
            .finish_non_exhaustive()
    }
}

impl ConversionRule {
    pub fn new(
        input_node_type: NodeKind,
        output_node_type: NodeKind,
        extract_value: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
        create_attrs: impl Fn(&str, &str) -> Map<String, Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            input_node_type,
            output_node_type,
            extract_value: Arc::new(extract_value),
            create_attrs: Arc::new(create_attrs),
        }
    }

    /// Catalog links such as `https://learn.example.edu/search?resource=123`
    pub fn learning_resource() -> Result<Self> {
        let pattern = Regex::new(r"resource=(\d+)")?;
        Ok(Self::new(
            NodeKind::LearningResourceInput,
            NodeKind::LearningResource,
            move |text| {
                let captured = pattern.captures(text)?.get(1)?.as_str();
                // IDs too large for u64 are not references
                captured.parse::<u64>().ok().map(|id| id.to_string())
            },
            |value, raw| {
                let mut attrs = Map::new();
                let id = value.parse::<u64>().map(Value::from).unwrap_or(Value::Null);
                attrs.insert("resourceId".into(), id);
                attrs.insert("href".into(), json!(raw));
                attrs.insert("editable".into(), json!(true));
                attrs
            },
        ))
    }

    /// YouTube and Vimeo video links
    pub fn media_embed() -> Result<Self> {
        let youtube = Regex::new(
            r"^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/watch\?(?:\S*&)?v=|youtu\.be/)[A-Za-z0-9_-]{11}",
        )?;
        let vimeo = Regex::new(r"^(?:https?://)?(?:www\.)?vimeo\.com/\d+")?;
        Ok(Self::new(
            NodeKind::MediaEmbedInput,
            NodeKind::MediaEmbed,
            move |text| {
                (youtube.is_match(text) || vimeo.is_match(text)).then(|| text.to_string())
            },
            |value, _raw| {
                let mut attrs = Map::new();
                attrs.insert("src".into(), json!(value));
                attrs
            },
        ))
    }

    /// The value this rule recognizes in `text`, if any
    pub fn extract_value(&self, text: &str) -> Option<String> {
        (self.extract_value)(text)
    }

    pub fn create_attrs(&self, value: &str, raw: &str) -> Map<String, Value> {
        (self.create_attrs)(value, raw)
    }
}

/// The built-in rules: learning resources, then media embeds
pub fn default_rules() -> Result<Vec<ConversionRule>> {
    Ok(vec![
        ConversionRule::learning_resource()?,
        ConversionRule::media_embed()?,
    ])
}

/// A conversion ready to apply: replace the node at `span` with `node`
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPlan {
    pub span: NodePath,
    pub node: Node,
}

/// Work out what Enter should convert, if anything. The caret must sit in a
/// paragraph whose trimmed text a rule recognizes. The span is the enclosing
/// input node when the paragraph's parent is the rule's input type, otherwise
/// the paragraph itself. Conversions the schema would not accept at that
/// position are skipped.
pub fn plan_conversion(
    rules: &[ConversionRule],
    schema: &Schema,
    doc: &Node,
    selection: &Selection,
) -> Option<ConversionPlan> {
    let Selection::Caret { path, .. } = selection else {
        return None;
    };
    let paragraph = doc.node_at(path)?;
    if paragraph.kind() != NodeKind::Paragraph {
        return None;
    }
    let text = paragraph.text_content();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parent_path = path.parent();
    let parent_kind = parent_path
        .as_ref()
        .and_then(|p| doc.node_at(p))
        .map(Node::kind);

    for rule in rules {
        let Some(value) = rule.extract_value(text) else {
            continue;
        };
        let span = match &parent_path {
            Some(parent) if parent_kind == Some(rule.input_node_type) => parent.clone(),
            _ => path.clone(),
        };
        let attrs = rule.create_attrs(&value, text);
        let Ok(node) = schema.create_node(rule.output_node_type.as_str(), attrs) else {
            continue;
        };
        if can_replace(schema, doc, &span, node.kind()) {
            return Some(ConversionPlan { span, node });
        }
    }
    None
}

/// Strip link marks from text that is exactly a recognized URL. Links whose
/// visible text differs from the href are left alone. Returns `None` when
/// nothing changed.
pub fn strip_recognized_links(rules: &[ConversionRule], doc: &Node) -> Option<Node> {
    let recognized = |href: &str| rules.iter().any(|rule| rule.extract_value(href).is_some());
    let (stripped, changed) = strip_node(doc, &recognized);
    changed.then_some(stripped)
}

fn strip_node(node: &Node, recognized: &dyn Fn(&str) -> bool) -> (Node, bool) {
    if node.content().is_empty() {
        return (node.clone(), false);
    }

    let (children, changed) = if node.is_textblock() {
        strip_inline(node.content(), recognized)
    } else {
        let mut changed = false;
        let children: Vec<Node> = node
            .content()
            .iter()
            .map(|child| {
                let (child, child_changed) = strip_node(child, recognized);
                changed |= child_changed;
                child
            })
            .collect();
        (children, changed)
    };
    if !changed {
        return (node.clone(), false);
    }

    let mut updated = node.clone();
    if let Some(content) = updated.content_mut() {
        *content = if node.is_textblock() {
            normalize_inline(children)
        } else {
            children
        };
    }
    (updated, true)
}

fn link_mark(node: &Node) -> Option<&Mark> {
    node.marks().iter().find(|mark| mark.href().is_some())
}

/// Remove a link from each run of adjacent text nodes sharing it when the
/// run's combined text is exactly the recognized href
fn strip_inline(children: &[Node], recognized: &dyn Fn(&str) -> bool) -> (Vec<Node>, bool) {
    let mut out = children.to_vec();
    let mut changed = false;
    let mut start = 0;
    while start < out.len() {
        let Some(link) = link_mark(&out[start]).cloned() else {
            start += 1;
            continue;
        };
        let mut end = start + 1;
        while end < out.len() && link_mark(&out[end]) == Some(&link) {
            end += 1;
        }

        let text: String = out[start..end].iter().filter_map(Node::text_str).collect();
        if link.href().is_some_and(|href| href == text.as_str() && recognized(href)) {
            for node in &mut out[start..end] {
                if let Node::Text { marks, .. } = node {
                    marks.retain(|mark| mark != &link);
                }
            }
            changed = true;
        }
        start = end;
    }
    (out, changed)
}
