//! Error types for document model operations

use crate::NodePath;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocModelError {
    #[error("No node at path {0}")]
    InvalidPath(NodePath),

    #[error("Node at {0} is not a textblock")]
    NotATextblock(NodePath),

    #[error("Node at {0} cannot hold child content")]
    NotAContainer(NodePath),

    #[error("Offset {offset} is out of range for node at {path} (length {len})")]
    OffsetOutOfRange {
        path: NodePath,
        offset: usize,
        len: usize,
    },

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Invalid content expression `{expr}`: {reason}")]
    InvalidContentExpression { expr: String, reason: String },

    #[error("Cannot build node from JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
