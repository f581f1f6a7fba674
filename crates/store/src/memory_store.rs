//! In-memory article store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Article, ArticleDraft, ArticleId, ArticleStore, Result, StoreError};

/// Article store kept in memory. Mirrors the remote API's behavior: blank
/// titles are rejected and slugs are assigned once on create.
#[derive(Debug, Default)]
pub struct MemoryArticleStore {
    articles: RwLock<BTreeMap<ArticleId, Article>>,
    next_id: AtomicU64,
    requests: AtomicUsize,
    /// Error returned by the next write, then cleared
    fail_next: RwLock<Option<StoreError>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next create or update fail with `error`
    pub async fn fail_next_with(&self, error: StoreError) {
        *self.fail_next.write().await = Some(error);
    }

    /// Put an article in place as if it had been saved earlier
    pub async fn insert(&self, article: Article) {
        self.next_id.fetch_max(article.id, Ordering::SeqCst);
        self.articles.write().await.insert(article.id, article);
    }

    /// Number of create and update requests received
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.articles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.articles.read().await.is_empty()
    }

    async fn check_write(&self, draft: &ArticleDraft) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_next.write().await.take() {
            return Err(error);
        }
        if draft.title.trim().is_empty() {
            return Err(StoreError::field("title", "This field may not be blank."));
        }
        Ok(())
    }
}

/// Lowercase words of `title` joined by hyphens, plus a short unique suffix
pub fn slugify(title: &str) -> String {
    let words: Vec<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect();
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];
    if words.is_empty() {
        suffix.to_string()
    } else {
        format!("{}-{}", words.join("-"), suffix)
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn create_article(&self, draft: &ArticleDraft) -> Result<Article> {
        self.check_write(draft).await?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let article = Article {
            id,
            title: draft.title.clone(),
            slug: slugify(&draft.title),
            content: draft.content.clone(),
            author_name: draft.author_name.clone(),
            is_published: draft.is_published,
            created_on: now,
            updated_on: now,
        };
        self.articles.write().await.insert(id, article.clone());
        tracing::debug!(id, slug = %article.slug, "created article");
        Ok(article)
    }

    async fn update_article(&self, id: ArticleId, draft: &ArticleDraft) -> Result<Article> {
        self.check_write(draft).await?;

        let mut articles = self.articles.write().await;
        let article = articles.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        article.title = draft.title.clone();
        article.content = draft.content.clone();
        article.author_name = draft.author_name.clone();
        article.is_published = draft.is_published;
        article.updated_on = Utc::now();
        Ok(article.clone())
    }

    async fn get_article_by_id(&self, id: ArticleId) -> Result<Article> {
        self.articles
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}
