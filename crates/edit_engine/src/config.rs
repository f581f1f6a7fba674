//! Editor configuration

use serde::{Deserialize, Serialize};

/// Options passed to an [`EditingEngine`](crate::EditingEngine) at construction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Re-validate the document after every change
    pub validate: bool,
    /// Convert recognized URLs into embed nodes when Enter is pressed
    pub convert_urls: bool,
    /// Strip link marks from bare recognized URLs after every change
    pub suppress_resource_links: bool,
    /// Maximum number of undo entries kept
    pub max_undo: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            validate: true,
            convert_urls: true,
            suppress_resource_links: true,
            max_undo: 100,
        }
    }
}

impl EditorConfig {
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_url_conversion(mut self, convert_urls: bool) -> Self {
        self.convert_urls = convert_urls;
        self
    }

    pub fn with_link_suppression(mut self, suppress: bool) -> Self {
        self.suppress_resource_links = suppress;
        self
    }

    pub fn with_max_undo(mut self, max_undo: usize) -> Self {
        self.max_undo = max_undo;
        self
    }
}
