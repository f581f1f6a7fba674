//! Session configuration

use doc_model::DEFAULT_WORDS_PER_MINUTE;
use edit_engine::EditorConfig;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Options for an [`ArticleEditorSession`](crate::ArticleEditorSession),
/// passed in at construction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Offer "save as draft" next to publish
    pub draft_support: bool,
    /// Author recorded on saved articles
    pub author_name: String,
    /// Reading speed for read-time estimates
    pub words_per_minute: u32,
    pub editor: EditorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            draft_support: false,
            author_name: String::new(),
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            editor: EditorConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_draft_support(mut self, enabled: bool) -> Self {
        self.draft_support = enabled;
        self
    }

    pub fn with_author(mut self, author_name: impl Into<String>) -> Self {
        self.author_name = author_name.into();
        self
    }

    pub fn with_words_per_minute(mut self, words_per_minute: u32) -> Self {
        self.words_per_minute = words_per_minute;
        self
    }

    pub fn with_editor(mut self, editor: EditorConfig) -> Self {
        self.editor = editor;
        self
    }
}
