//! Values derived from a document without changing it: plain text, word
//! count, estimated read time, embedded resource IDs, and titles

use crate::{find_banner, Node, NodeKind};

/// Reading speed used when none is configured
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 250;

/// Short title used when the banner has no heading text
pub const DEFAULT_SHORT_TITLE: &str = "Article";

/// Word limit for short titles
pub const SHORT_TITLE_WORDS: usize = 5;

/// All text of `node`, each node's children joined by a single space
pub fn extract_plain_text(node: &Node) -> String {
    match node {
        Node::Text { text, .. } => text.clone(),
        other => other
            .content()
            .iter()
            .map(extract_plain_text)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Number of whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated minutes to read `content`, `None` when there is nothing to read
pub fn estimate_read_time(content: Option<&Node>, words_per_minute: u32) -> Option<u32> {
    let words = count_words(&extract_plain_text(content?));
    if words == 0 || words_per_minute == 0 {
        return None;
    }
    Some((words as f64 / words_per_minute as f64).round() as u32)
}

/// IDs of every embedded learning resource, deduplicated, in first-occurrence order
pub fn extract_embed_resource_ids(content: &Node) -> Vec<u64> {
    let mut ids = Vec::new();
    content.walk(&mut |node, _| {
        if let Node::LearningResource { attrs } = node {
            if let Some(id) = attrs.resource_id {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    });
    ids
}

/// Breadcrumb title from a banner: the heading text cut to five words
pub fn extract_title(banner: &Node) -> String {
    let heading_text = banner
        .content()
        .iter()
        .find(|n| n.kind() == NodeKind::Heading)
        .map(Node::text_content)
        .unwrap_or_default();

    let words: Vec<&str> = heading_text.split_whitespace().collect();
    if words.is_empty() {
        return DEFAULT_SHORT_TITLE.to_string();
    }
    if words.len() > SHORT_TITLE_WORDS {
        format!("{}...", words[..SHORT_TITLE_WORDS].join(" "))
    } else {
        heading_text.trim().to_string()
    }
}

/// The article's canonical title: the banner heading's text, trimmed
pub fn article_title(doc: &Node) -> String {
    find_banner(doc)
        .and_then(|banner| banner.content().iter().find(|n| n.kind() == NodeKind::Heading))
        .map(|heading| heading.text_content().trim().to_string())
        .unwrap_or_default()
}
