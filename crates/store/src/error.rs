//! Error types for storage operations

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Validation failed: {}", describe_fields(.0))]
    Validation(BTreeMap<String, Vec<String>>),

    #[error("Article not found: {0}")]
    NotFound(u64),

    #[error("Resource not found: {0}")]
    ResourceNotFound(u64),

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("A title is required")]
    TitleRequired,

    #[error("Save not allowed: {0}")]
    SaveNotAllowed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Upload aborted")]
    UploadAborted,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// A validation error for a single field
    pub fn field(field: &str, message: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), vec![message.to_string()]);
        StoreError::Validation(fields)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<doc_model::DocModelError> for StoreError {
    fn from(err: doc_model::DocModelError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

fn describe_fields(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = StoreError::field("title", "This field may not be blank.");
        assert_eq!(
            err.to_string(),
            "Validation failed: title: This field may not be blank."
        );
    }
}
