//! Command execution engine

use crate::{
    default_rules, find_insert_position, plan_conversion, strip_recognized_links, Command,
    ConversionRule, EditError, EditorConfig, InsertNode, InsertText, ReplaceNode, Result, SetText,
    SplitBlock, UndoManager,
};
use doc_model::{
    check_node, empty_article, title_path, Node, NodeKind, NodePath, Schema, SchemaViolation,
    Selection,
};
use serde_json::Map;
use std::sync::Arc;
use std::time::Duration;

/// What pressing Enter did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterOutcome {
    /// A recognized URL became an embed node, now selected at `path`
    Converted { path: NodePath, kind: NodeKind },
    /// The textblock was split at the caret
    Split,
}

/// The main editing engine that manages document state and command execution
pub struct EditingEngine {
    schema: Arc<Schema>,
    config: EditorConfig,
    rules: Vec<ConversionRule>,
    /// Current document
    doc: Node,
    /// Current selection
    selection: Selection,
    /// Undo manager
    undo_manager: UndoManager,
    /// Latest validation failure
    diagnostic: Option<SchemaViolation>,
    dismissed: bool,
    /// Whether any command ran since load or the last save
    touched: bool,
}

impl EditingEngine {
    /// Create an editing engine holding the empty article skeleton
    pub fn new(schema: Arc<Schema>, config: EditorConfig) -> Result<Self> {
        Self::with_document(schema, config, empty_article())
    }

    /// Create an editing engine with a specific document
    pub fn with_document(schema: Arc<Schema>, config: EditorConfig, doc: Node) -> Result<Self> {
        let undo_manager = UndoManager::with_limits(config.max_undo, Duration::from_millis(500));
        let selection = if doc.node_at(&title_path()).is_some_and(Node::is_textblock) {
            Selection::caret(title_path(), 0)
        } else {
            Selection::default()
        };

        let mut engine = Self {
            schema,
            config,
            rules: default_rules()?,
            doc,
            selection,
            undo_manager,
            diagnostic: None,
            dismissed: false,
            touched: false,
        };
        engine.revalidate();
        Ok(engine)
    }

    /// Replace the conversion rules
    pub fn with_rules(mut self, rules: Vec<ConversionRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn rules(&self) -> &[ConversionRule] {
        &self.rules
    }

    /// Get the current document
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    /// Get the current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Set the selection
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Whether the document changed since load or the last successful save
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn mark_untouched(&mut self) {
        self.touched = false;
    }

    /// The current validation failure, unless dismissed
    pub fn diagnostic(&self) -> Option<&SchemaViolation> {
        if self.dismissed {
            None
        } else {
            self.diagnostic.as_ref()
        }
    }

    /// Hide the current diagnostic until a different one appears
    pub fn dismiss_diagnostic(&mut self) {
        self.dismissed = true;
    }

    /// Show a diagnostic found outside the engine, e.g. while loading
    pub fn set_diagnostic(&mut self, violation: SchemaViolation) {
        self.diagnostic = Some(violation);
        self.dismissed = false;
    }

    /// Execute a command
    pub fn execute(&mut self, command: Box<dyn Command>) -> Result<()> {
        let result = command.apply(&self.doc, &self.selection)?;
        tracing::debug!(command = command.display_name(), "applied command");

        // Record for undo
        self.undo_manager.push(command, result.inverse);

        // Update state
        self.doc = result.doc;
        self.selection = result.selection;
        self.after_change();

        Ok(())
    }

    /// Undo the last command
    pub fn undo(&mut self) -> Result<()> {
        let inverse = self.undo_manager.pop_undo()?;
        let result = inverse.apply(&self.doc, &self.selection)?;

        self.doc = result.doc;
        self.selection = result.selection;
        self.after_change();

        Ok(())
    }

    /// Redo the last undone command
    pub fn redo(&mut self) -> Result<()> {
        let command = self.undo_manager.pop_redo()?;
        let result = command.apply(&self.doc, &self.selection)?;
        self.undo_manager.push_redone(command, result.inverse);

        self.doc = result.doc;
        self.selection = result.selection;
        self.after_change();

        Ok(())
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.undo_manager.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.undo_manager.can_redo()
    }

    /// Type text at the caret
    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        let Selection::Caret { path, offset } = &self.selection else {
            return Err(EditError::InvalidCommand(
                "typing needs a caret selection".to_string(),
            ));
        };
        let command = InsertText::new(path.clone(), *offset, text);
        self.execute(Box::new(command))
    }

    /// Set the banner heading text
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.execute(Box::new(SetText::new(title_path(), title)))
    }

    /// Handle the Enter key: convert a recognized URL in the caret's
    /// paragraph into an embed node, otherwise split the textblock
    pub fn press_enter(&mut self) -> Result<EnterOutcome> {
        if self.config.convert_urls {
            if let Some(plan) = plan_conversion(&self.rules, &self.schema, &self.doc, &self.selection) {
                let kind = plan.node.kind();
                let path = plan.span.clone();
                tracing::info!(%path, node_type = %kind, "converted URL to embed");
                self.execute(Box::new(ReplaceNode::selecting_node(plan.span, plan.node)))?;
                return Ok(EnterOutcome::Converted { path, kind });
            }
        }

        let Selection::Caret { path, offset } = &self.selection else {
            return Err(EditError::InvalidCommand(
                "cannot split a node selection".to_string(),
            ));
        };
        let command = SplitBlock::new(path.clone(), *offset);
        self.execute(Box::new(command))?;
        Ok(EnterOutcome::Split)
    }

    /// Insert a fresh node of `kind` (typically a URL input node) with its
    /// required children at the first valid position after the selection
    pub fn insert_input_node(&mut self, kind: NodeKind) -> Result<Option<NodePath>> {
        let node = self.schema.create_and_fill(kind.as_str(), Map::new())?;
        self.insert_node(node)
    }

    /// Insert `node` at the first position after the selection where the
    /// schema allows it. Returns its path, or `None` when there is no such
    /// position.
    pub fn insert_node(&mut self, node: Node) -> Result<Option<NodePath>> {
        let kind = node.kind();
        let Some(point) = find_insert_position(&self.schema, &self.doc, self.selection.path(), kind)
        else {
            tracing::debug!(node_type = %kind, "no valid insertion point");
            return Ok(None);
        };

        let path = point.path();
        self.execute(Box::new(InsertNode::new(point.parent, point.index, node)))?;
        Ok(Some(path))
    }

    /// Post-edit passes: link-mark suppression, then validation
    fn after_change(&mut self) {
        self.touched = true;
        if self.config.suppress_resource_links {
            if let Some(stripped) = strip_recognized_links(&self.rules, &self.doc) {
                tracing::debug!("removed link marks from recognized URLs");
                self.doc = stripped;
            }
        }
        self.revalidate();
    }

    fn revalidate(&mut self) {
        if !self.config.validate {
            return;
        }
        let violation = check_node(&self.schema, &self.doc).err();
        if violation != self.diagnostic {
            if let Some(v) = &violation {
                tracing::debug!(path = %v.path, "document failed validation: {}", v);
            }
            self.dismissed = false;
        }
        self.diagnostic = violation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RemoveNode;
    use doc_model::{article_schema, Mark, ViolationKind};

    const RESOURCE_URL: &str = "https://learn.example.edu/search?resource=12";

    fn engine() -> EditingEngine {
        EditingEngine::new(Arc::new(article_schema().unwrap()), EditorConfig::default()).unwrap()
    }

    fn body() -> NodePath {
        NodePath::from_indices(vec![2])
    }

    #[test]
    fn test_new_engine_is_valid_and_untouched() {
        let engine = engine();
        assert_eq!(engine.doc(), &empty_article());
        assert_eq!(engine.selection(), &Selection::caret(title_path(), 0));
        assert!(engine.diagnostic().is_none());
        assert!(!engine.is_touched());
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_typing_touches_and_undo_restores() {
        let mut engine = engine();
        engine.insert_text("My ").unwrap();
        engine.insert_text("Article").unwrap();
        assert!(engine.is_touched());
        assert_eq!(doc_model::article_title(engine.doc()), "My Article");

        engine.undo().unwrap();
        assert_eq!(engine.doc(), &empty_article());
        assert!(engine.can_redo());

        engine.redo().unwrap();
        assert_eq!(doc_model::article_title(engine.doc()), "My Article");
        assert!(engine.can_undo());
        assert!(!engine.can_redo());
    }

    #[test]
    fn test_enter_converts_resource_input() {
        let mut engine = engine();
        let path = engine
            .insert_input_node(NodeKind::LearningResourceInput)
            .unwrap()
            .unwrap();
        assert_eq!(path, body());
        assert_eq!(
            engine.selection(),
            &Selection::caret(NodePath::from_indices(vec![2, 0]), 0)
        );

        engine.insert_text(RESOURCE_URL).unwrap();
        let outcome = engine.press_enter().unwrap();
        assert_eq!(
            outcome,
            EnterOutcome::Converted {
                path: body(),
                kind: NodeKind::LearningResource
            }
        );
        assert_eq!(
            engine.doc().node_at(&body()),
            Some(&Node::learning_resource(12, Some(RESOURCE_URL.to_string())))
        );
        assert_eq!(engine.selection(), &Selection::node(body()));
        assert!(engine.diagnostic().is_none());
    }

    #[test]
    fn test_enter_without_url_splits() {
        let mut engine = engine();
        engine.set_selection(Selection::caret(body(), 0));
        engine.insert_text("plain words").unwrap();
        assert_eq!(engine.press_enter().unwrap(), EnterOutcome::Split);
        assert_eq!(engine.doc().content().len(), 4);
    }

    #[test]
    fn test_conversion_disabled_by_config() {
        let config = EditorConfig::default().with_url_conversion(false);
        let mut engine =
            EditingEngine::new(Arc::new(article_schema().unwrap()), config).unwrap();
        engine.set_selection(Selection::caret(body(), 0));
        engine.insert_text(RESOURCE_URL).unwrap();
        assert_eq!(engine.press_enter().unwrap(), EnterOutcome::Split);
    }

    #[test]
    fn test_link_suppression_runs_after_every_change() {
        let mut engine = engine();
        engine.set_selection(Selection::caret(body(), 0));
        engine.insert_text(RESOURCE_URL).unwrap();
        let len = RESOURCE_URL.chars().count();
        engine
            .execute(Box::new(crate::AddMark::new(body(), 0, len, Mark::link(RESOURCE_URL))))
            .unwrap();
        assert_eq!(
            engine.doc().node_at(&body()).unwrap().content(),
            &[Node::text(RESOURCE_URL)]
        );

        engine.set_selection(Selection::caret(body(), len));
        engine.insert_text(" more").unwrap();
        engine
            .execute(Box::new(crate::AddMark::new(body(), 0, len + 5, Mark::link(RESOURCE_URL))))
            .unwrap();
        assert_eq!(
            engine.doc().node_at(&body()).unwrap().content()[0].marks(),
            &[Mark::link(RESOURCE_URL)]
        );
    }

    #[test]
    fn test_diagnostic_is_advisory_and_dismissible() {
        let mut engine = engine();
        engine
            .execute(Box::new(RemoveNode::new(NodePath::from_indices(vec![1]))))
            .unwrap();
        let violation = engine.diagnostic().unwrap().clone();
        assert_eq!(violation.kind, ViolationKind::NotAllowed);
        assert_eq!(violation.message, "paragraph is not allowed in this position");

        engine.dismiss_diagnostic();
        assert!(engine.diagnostic().is_none());

        // editing continues while the document is invalid
        engine.set_selection(Selection::caret(NodePath::from_indices(vec![1]), 0));
        engine.insert_text("still editing").unwrap();
        assert!(engine.diagnostic().is_none());

        engine.undo().unwrap();
        engine.undo().unwrap();
        assert!(engine.diagnostic().is_none());
        assert_eq!(engine.doc(), &empty_article());
    }

    #[test]
    fn test_validation_disabled() {
        let config = EditorConfig::default().with_validation(false);
        let mut engine =
            EditingEngine::new(Arc::new(article_schema().unwrap()), config).unwrap();
        engine
            .execute(Box::new(RemoveNode::new(NodePath::from_indices(vec![1]))))
            .unwrap();
        assert!(engine.diagnostic().is_none());
    }

    #[test]
    fn test_enter_on_node_selection_fails() {
        let mut engine = engine();
        engine.set_selection(Selection::node(NodePath::from_indices(vec![1])));
        assert!(matches!(engine.press_enter(), Err(EditError::InvalidCommand(_))));
    }
}
