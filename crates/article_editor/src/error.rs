//! Error types for editing sessions

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Edit error: {0}")]
    Edit(#[from] edit_engine::EditError),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Invalid session config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("No place in the document accepts a {0} node")]
    NoInsertPosition(doc_model::NodeKind),
}

pub type Result<T> = std::result::Result<T, SessionError>;
