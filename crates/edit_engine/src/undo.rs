//! Undo/redo manager with command batching

use crate::{Command, EditError, Result};
use std::time::{Duration, Instant};

/// An entry in the undo stack
struct UndoEntry {
    /// The original command
    command: Box<dyn Command>,
    /// The inverse command (for undo)
    inverse: Box<dyn Command>,
    /// When this entry was created
    timestamp: Instant,
}

/// Manages undo and redo stacks
pub struct UndoManager {
    /// Stack of commands that can be undone
    undo_stack: Vec<UndoEntry>,
    /// Stack of commands that can be redone
    redo_stack: Vec<Box<dyn Command>>,
    /// Maximum number of undo entries
    max_entries: usize,
    /// Time threshold for batching (commands within this time are merged)
    batch_threshold: Duration,
}

impl UndoManager {
    /// Create a new undo manager
    pub fn new() -> Self {
        Self::with_limits(100, Duration::from_millis(500))
    }

    /// Create with custom limits
    pub fn with_limits(max_entries: usize, batch_threshold: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries,
            batch_threshold,
        }
    }

    /// Push a command onto the undo stack
    pub fn push(&mut self, command: Box<dyn Command>, inverse: Box<dyn Command>) {
        // Clear redo stack on new command
        self.redo_stack.clear();

        let now = Instant::now();

        // Merge with the previous command if within the batch threshold. The
        // earlier inverse already restores the state before both commands.
        if let Some(last) = self.undo_stack.last_mut() {
            if now.duration_since(last.timestamp) < self.batch_threshold {
                if let Some(merged) = last.command.merge_with(command.as_ref()) {
                    last.command = merged;
                    last.timestamp = now;
                    return;
                }
            }
        }

        self.undo_stack.push(UndoEntry {
            command,
            inverse,
            timestamp: now,
        });

        // Enforce max entries
        if self.undo_stack.len() > self.max_entries {
            let excess = self.undo_stack.len() - self.max_entries;
            self.undo_stack.drain(..excess);
        }
    }

    /// Pop the last command for undo
    pub fn pop_undo(&mut self) -> Result<Box<dyn Command>> {
        let entry = self.undo_stack.pop().ok_or(EditError::UndoStackEmpty)?;

        // Push to redo stack
        self.redo_stack.push(entry.command);

        Ok(entry.inverse)
    }

    /// Pop a command for redo
    pub fn pop_redo(&mut self) -> Result<Box<dyn Command>> {
        self.redo_stack.pop().ok_or(EditError::RedoStackEmpty)
    }

    /// Put a redone command back on the undo stack without touching redo
    pub fn push_redone(&mut self, command: Box<dyn Command>, inverse: Box<dyn Command>) {
        self.undo_stack.push(UndoEntry {
            command,
            inverse,
            timestamp: Instant::now(),
        });
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InsertText, RemoveNode};
    use doc_model::NodePath;
    use proptest::prelude::*;

    fn insert(offset: usize, text: &str) -> Box<dyn Command> {
        Box::new(InsertText::new(NodePath::from_indices(vec![2]), offset, text))
    }

    fn other() -> Box<dyn Command> {
        Box::new(RemoveNode::new(NodePath::from_indices(vec![3])))
    }

    #[test]
    fn test_empty_stacks() {
        let mut undo = UndoManager::new();
        assert!(!undo.can_undo());
        assert!(matches!(undo.pop_undo(), Err(EditError::UndoStackEmpty)));
        assert!(matches!(undo.pop_redo(), Err(EditError::RedoStackEmpty)));
    }

    #[test]
    fn test_typing_batches_into_one_entry() {
        let mut undo = UndoManager::new();
        undo.push(insert(0, "a"), other());
        undo.push(insert(1, "b"), other());
        undo.push(insert(2, "c"), other());
        assert_eq!(undo.undo_len(), 1);
    }

    #[test]
    fn test_no_batching_without_threshold() {
        let mut undo = UndoManager::with_limits(10, Duration::ZERO);
        undo.push(insert(0, "a"), other());
        undo.push(insert(1, "b"), other());
        assert_eq!(undo.undo_len(), 2);
    }

    #[test]
    fn test_limit_and_redo_clearing() {
        let mut undo = UndoManager::with_limits(2, Duration::ZERO);
        undo.push(other(), other());
        undo.push(other(), other());
        undo.push(other(), other());
        assert_eq!(undo.undo_len(), 2);

        undo.pop_undo().unwrap();
        assert!(undo.can_redo());
        undo.push(other(), other());
        assert!(!undo.can_redo());
    }

    proptest! {
        #[test]
        fn prop_undo_stack_never_exceeds_limit(limit in 1usize..8, pushes in 0usize..30) {
            let mut undo = UndoManager::with_limits(limit, Duration::ZERO);
            for _ in 0..pushes {
                undo.push(other(), other());
            }
            prop_assert_eq!(undo.undo_len(), pushes.min(limit));
        }
    }
}
