//! Article model and the article store API

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doc_model::Node;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

pub type ArticleId = u64;

/// A persisted article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    /// Document JSON, stored verbatim
    pub content: Value,
    pub author_name: String,
    pub is_published: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// Payload for create and update. Always the full article, never a diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: Value,
    pub author_name: String,
    pub is_published: bool,
}

impl ArticleDraft {
    /// Serialize a document snapshot into a save payload
    pub fn from_document(
        title: impl Into<String>,
        doc: &Node,
        author_name: impl Into<String>,
        is_published: bool,
    ) -> Result<Self> {
        Ok(Self {
            title: title.into(),
            content: doc.to_json()?,
            author_name: author_name.into(),
            is_published,
        })
    }
}

/// Remote article persistence
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn create_article(&self, draft: &ArticleDraft) -> Result<Article>;

    async fn update_article(&self, id: ArticleId, draft: &ArticleDraft) -> Result<Article>;

    async fn get_article_by_id(&self, id: ArticleId) -> Result<Article>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::empty_article;
    use serde_json::json;

    #[test]
    fn test_draft_carries_full_document() {
        let draft = ArticleDraft::from_document("T", &empty_article(), "Ada", true).unwrap();
        assert_eq!(draft.content["type"], json!("doc"));
        assert_eq!(draft.content["content"].as_array().unwrap().len(), 3);
        assert!(draft.is_published);

        let payload = serde_json::to_value(&draft).unwrap();
        assert_eq!(payload["author_name"], json!("Ada"));
        assert_eq!(payload["is_published"], json!(true));
    }
}
