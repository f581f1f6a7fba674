//! Inline formatting marks carried by text nodes

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkAttrs {
    pub href: String,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightAttrs {
    pub color: Option<String>,
}

/// An inline annotation on a run of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Superscript,
    Subscript,
    Highlight {
        #[serde(default)]
        attrs: HighlightAttrs,
    },
    Link {
        #[serde(default)]
        attrs: LinkAttrs,
    },
}

impl Mark {
    /// Create a link mark
    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link {
            attrs: LinkAttrs {
                href: href.into(),
                target: None,
            },
        }
    }

    /// The mark's name in the document JSON format
    pub fn name(&self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Strike => "strike",
            Mark::Code => "code",
            Mark::Superscript => "superscript",
            Mark::Subscript => "subscript",
            Mark::Highlight { .. } => "highlight",
            Mark::Link { .. } => "link",
        }
    }

    /// The link target, if this is a link mark
    pub fn href(&self) -> Option<&str> {
        match self {
            Mark::Link { attrs } => Some(&attrs.href),
            _ => None,
        }
    }

    /// Whether two marks are of the same kind, ignoring attributes
    pub fn same_kind(&self, other: &Mark) -> bool {
        self.name() == other.name()
    }
}
