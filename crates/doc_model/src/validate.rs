//! Schema validation with first-failure diagnostics
//!
//! Validation runs in two phases. A cheap structural pre-check walks the raw
//! JSON: the root's child sequence is run through the `doc` grammar and every
//! nested `type` string is looked up in the schema. Only then is the JSON
//! deserialized into [`Node`]s (which can fail on malformed attributes or
//! unknown marks), and the grammar of every node in the built tree is checked.

use crate::content::ContentMatch;
use crate::{Node, NodeKind, NodePath, Schema};
use serde_json::Value;
use thiserror::Error;

/// What kind of rule a document broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A `type` with no definition in the schema
    UnknownNodeType,
    /// A child the parent's grammar does not accept at its position
    NotAllowed,
    /// The parent's grammar needs more children
    ContentNotSatisfied,
    /// A mark on text inside a node that does not allow marks
    DisallowedMark,
    /// Input that is not a document tree at all, or fails to build
    Malformed,
}

/// The first point at which a document fails the schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SchemaViolation {
    pub kind: ViolationKind,
    /// Type name of the offending node, when it has one
    pub node_type: Option<String>,
    /// Index of the offending node among its siblings
    pub index: Option<usize>,
    /// Path of the offending node (or of the parent, for unsatisfied content)
    pub path: NodePath,
    pub message: String,
}

impl SchemaViolation {
    fn unknown_type(type_value: Option<&Value>, path: NodePath) -> Self {
        let shown = match type_value {
            Some(Value::String(name)) => format!("\"{}\"", name),
            Some(other) => other.to_string(),
            None => "(missing)".to_string(),
        };
        Self {
            kind: ViolationKind::UnknownNodeType,
            node_type: type_value.and_then(Value::as_str).map(str::to_string),
            index: path.last_index(),
            path,
            message: format!("node type {} not found in schema", shown),
        }
    }

    fn not_allowed(name: &str, path: NodePath) -> Self {
        Self {
            kind: ViolationKind::NotAllowed,
            node_type: Some(name.to_string()),
            index: path.last_index(),
            path,
            message: format!("{} is not allowed in this position", name),
        }
    }

    fn content_not_satisfied(parent: &str, path: NodePath) -> Self {
        Self {
            kind: ViolationKind::ContentNotSatisfied,
            node_type: Some(parent.to_string()),
            index: None,
            path,
            message: format!("{}: content specification not satisfied", parent),
        }
    }

    fn disallowed_mark(mark: &str, parent: &str, path: NodePath) -> Self {
        Self {
            kind: ViolationKind::DisallowedMark,
            node_type: Some("text".to_string()),
            index: path.last_index(),
            path,
            message: format!("{} mark is not allowed inside {}", mark, parent),
        }
    }

    fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::Malformed,
            node_type: None,
            index: None,
            path: NodePath::root(),
            message: message.into(),
        }
    }
}

/// Validate untrusted document JSON, returning the built tree when valid
pub fn validate_json(schema: &Schema, value: &Value) -> Result<Node, SchemaViolation> {
    precheck(schema, value)?;
    let node = Node::from_json(value.clone())
        .map_err(|e| SchemaViolation::malformed(format!("invalid document content: {}", e)))?;
    check_node(schema, &node)?;
    Ok(node)
}

/// Check an in-memory tree rooted at `doc` against the schema, at every level
pub fn check_node(schema: &Schema, node: &Node) -> Result<(), SchemaViolation> {
    if node.kind() != NodeKind::Doc {
        return Err(SchemaViolation::not_allowed(
            node.kind().as_str(),
            NodePath::root(),
        ));
    }
    check_subtree(schema, node, &NodePath::root())
}

/// Check the content of `node` and, recursively, of all its descendants
pub fn check_subtree(schema: &Schema, node: &Node, path: &NodePath) -> Result<(), SchemaViolation> {
    let kind = node.kind();
    let def = schema.definition(kind).ok_or_else(|| {
        SchemaViolation::unknown_type(Some(&Value::String(kind.as_str().to_string())), path.clone())
    })?;
    let Some(start) = schema.content_match(kind) else {
        return Ok(());
    };

    let children = node.content().iter().enumerate().map(|(index, child)| {
        let child_kind = child.kind();
        let known = schema.definition(child_kind).map(|_| child_kind);
        (index, known, Value::String(child_kind.as_str().to_string()))
    });
    match_children(start, kind.as_str(), path, children)?;

    for (index, child) in node.content().iter().enumerate() {
        let child_path = path.child(index);
        if !def.allows_marks {
            if let Some(mark) = child.marks().first() {
                return Err(SchemaViolation::disallowed_mark(
                    mark.name(),
                    kind.as_str(),
                    child_path,
                ));
            }
        }
        check_subtree(schema, child, &child_path)?;
    }
    Ok(())
}

/// Run a child sequence through a grammar, reporting the first failure
fn match_children<'a>(
    start: ContentMatch<'a>,
    parent: &str,
    path: &NodePath,
    children: impl Iterator<Item = (usize, Option<NodeKind>, Value)>,
) -> Result<ContentMatch<'a>, SchemaViolation> {
    let mut state = start;
    for (index, kind, type_value) in children {
        let child_path = path.child(index);
        let kind =
            kind.ok_or_else(|| SchemaViolation::unknown_type(Some(&type_value), child_path.clone()))?;
        state = state
            .match_kind(kind)
            .ok_or_else(|| SchemaViolation::not_allowed(kind.as_str(), child_path))?;
    }
    if !state.valid_end() {
        return Err(SchemaViolation::content_not_satisfied(parent, path.clone()));
    }
    Ok(state)
}

/// Structural pre-check over raw JSON: root grammar, then every nested type
fn precheck(schema: &Schema, value: &Value) -> Result<(), SchemaViolation> {
    let root = value
        .as_object()
        .ok_or_else(|| SchemaViolation::malformed("document must be a JSON object"))?;

    let root_type = root.get("type");
    match root_type.and_then(Value::as_str) {
        Some("doc") => {}
        Some(name) if schema.definition_by_name(name).is_some() => {
            return Err(SchemaViolation::not_allowed(name, NodePath::root()));
        }
        _ => return Err(SchemaViolation::unknown_type(root_type, NodePath::root())),
    }

    let children = content_array(value, &NodePath::root())?;
    let start = schema
        .content_match(NodeKind::Doc)
        .ok_or_else(|| SchemaViolation::unknown_type(root_type, NodePath::root()))?;

    match_children(start, "doc", &NodePath::root(), resolve_children(schema, children))?;

    for (index, child) in children.iter().enumerate() {
        precheck_types(schema, child, &NodePath::root().child(index))?;
    }
    Ok(())
}

/// Pair each raw child with its schema kind, if its `type` names one
fn resolve_children<'a>(
    schema: &'a Schema,
    children: &'a [Value],
) -> impl Iterator<Item = (usize, Option<NodeKind>, Value)> + 'a {
    children.iter().enumerate().map(move |(index, child)| {
        let type_value = child.get("type").cloned().unwrap_or(Value::Null);
        let kind = type_value
            .as_str()
            .and_then(|name| schema.definition_by_name(name))
            .map(|def| def.kind);
        (index, kind, type_value)
    })
}

fn content_array<'a>(value: &'a Value, path: &NodePath) -> Result<&'a [Value], SchemaViolation> {
    match value.get("content") {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(SchemaViolation::malformed(format!(
            "content of node at {} must be an array",
            path
        ))),
    }
}

fn precheck_types(schema: &Schema, value: &Value, path: &NodePath) -> Result<(), SchemaViolation> {
    if !value.is_object() {
        return Err(SchemaViolation::malformed(format!(
            "node at {} must be a JSON object",
            path
        )));
    }
    let type_value = value.get("type");
    let Some(def) = type_value
        .and_then(Value::as_str)
        .and_then(|name| schema.definition_by_name(name))
    else {
        return Err(SchemaViolation::unknown_type(type_value, path.clone()));
    };

    if def.kind == NodeKind::Text {
        if value.get("content").is_some() {
            return Err(SchemaViolation::malformed(format!(
                "text node at {} cannot have content",
                path
            )));
        }
        if value.get("text").and_then(Value::as_str) == Some("") {
            return Err(SchemaViolation::malformed(format!(
                "text node at {} is empty",
                path
            )));
        }
        return Ok(());
    }

    let children = content_array(value, path)?;
    let start = schema
        .content_match(def.kind)
        .ok_or_else(|| SchemaViolation::unknown_type(type_value, path.clone()))?;
    match_children(start, def.name(), path, resolve_children(schema, children))?;

    for (index, child) in children.iter().enumerate() {
        precheck_types(schema, child, &path.child(index))?;
    }
    Ok(())
}
