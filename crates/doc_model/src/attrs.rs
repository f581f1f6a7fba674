//! Typed attribute sets for nodes that carry attributes

use serde::{Deserialize, Serialize};

/// Display width of an embedded block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedLayout {
    #[default]
    Default,
    Wide,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingAttrs {
    pub level: u8,
}

impl Default for HeadingAttrs {
    fn default() -> Self {
        Self { level: 1 }
    }
}

/// Author line shown under the banner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BylineAttrs {
    pub author_name: Option<String>,
    pub published_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderedListAttrs {
    pub start: u32,
}

impl Default for OrderedListAttrs {
    fn default() -> Self {
        Self { start: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskItemAttrs {
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeBlockAttrs {
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageAttrs {
    pub src: Option<String>,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub layout: EmbedLayout,
    pub editable: bool,
    /// Key of an upload still in flight; cleared once `src` is known
    pub upload_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaEmbedAttrs {
    pub src: Option<String>,
    pub caption: Option<String>,
    pub layout: EmbedLayout,
    pub editable: bool,
}

/// Reference to a catalog resource. Only the reference is stored; the
/// resource itself is looked up by ID when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LearningResourceAttrs {
    pub resource_id: Option<u64>,
    pub href: Option<String>,
    pub editable: bool,
}

impl Default for ImageAttrs {
    fn default() -> Self {
        Self {
            src: None,
            alt: None,
            title: None,
            caption: None,
            layout: EmbedLayout::Default,
            editable: true,
            upload_id: None,
        }
    }
}

impl Default for MediaEmbedAttrs {
    fn default() -> Self {
        Self {
            src: None,
            caption: None,
            layout: EmbedLayout::Default,
            editable: true,
        }
    }
}

impl Default for LearningResourceAttrs {
    fn default() -> Self {
        Self {
            resource_id: None,
            href: None,
            editable: true,
        }
    }
}
