//! Save state machine
//!
//! Maps the editor's document, title and author onto create/update calls of
//! an [`ArticleStore`], tracking the pending save and the last outcome.

use serde::{Deserialize, Serialize};

use crate::{Article, ArticleDraft, ArticleId, ArticleStore, Result, StoreError};

/// What the operator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveIntent {
    /// Save without publishing
    Draft,
    /// Publish, or update an already published article
    Publish,
}

impl SaveIntent {
    pub fn is_published(self) -> bool {
        matches!(self, SaveIntent::Publish)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOperation {
    Create,
    Update(ArticleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving(SaveOperation),
}

/// Tracks one editing session's saves. Creates the article on the first
/// successful save and updates it from then on.
#[derive(Debug, Clone, Default)]
pub struct SaveController {
    status: SaveStatus,
    article_id: Option<ArticleId>,
    slug: Option<String>,
    /// Whether the stored article is published
    published: bool,
    draft_support: bool,
    last_error: Option<StoreError>,
    last_saved: Option<Article>,
}

impl SaveController {
    /// Controller for an article that has not been saved yet
    pub fn new(draft_support: bool) -> Self {
        Self {
            draft_support,
            ..Default::default()
        }
    }

    /// Controller for an article loaded from the store
    pub fn for_article(article: &Article, draft_support: bool) -> Self {
        Self {
            article_id: Some(article.id),
            slug: Some(article.slug.clone()),
            published: article.is_published,
            draft_support,
            ..Default::default()
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.status, SaveStatus::Saving(_))
    }

    pub fn article_id(&self) -> Option<ArticleId> {
        self.article_id
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn draft_support(&self) -> bool {
        self.draft_support
    }

    /// Error from the last save, cleared by the next success
    pub fn last_error(&self) -> Option<&StoreError> {
        self.last_error.as_ref()
    }

    pub fn last_saved(&self) -> Option<&Article> {
        self.last_saved.as_ref()
    }

    /// Operation the next save will perform
    pub fn next_operation(&self) -> SaveOperation {
        match self.article_id {
            Some(id) => SaveOperation::Update(id),
            None => SaveOperation::Create,
        }
    }

    /// Why a save with these inputs is not allowed, if it is not
    pub fn check_save(&self, title: &str, touched: bool, intent: SaveIntent) -> Result<()> {
        if title.trim().is_empty() {
            return Err(StoreError::TitleRequired);
        }
        if self.is_saving() {
            return Err(StoreError::SaveInProgress);
        }
        match intent {
            SaveIntent::Draft if !self.draft_support => Err(StoreError::SaveNotAllowed(
                "saving drafts is not enabled".to_string(),
            )),
            SaveIntent::Publish if self.published && !touched => Err(
                StoreError::SaveNotAllowed("the published article has no changes".to_string()),
            ),
            _ => Ok(()),
        }
    }

    pub fn can_save(&self, title: &str, touched: bool, intent: SaveIntent) -> bool {
        self.check_save(title, touched, intent).is_ok()
    }

    /// Enter the saving state, returning the operation to perform
    pub fn begin_save(&mut self, title: &str, touched: bool, intent: SaveIntent) -> Result<SaveOperation> {
        self.check_save(title, touched, intent)?;
        let operation = self.next_operation();
        self.status = SaveStatus::Saving(operation);
        tracing::info!(?operation, ?intent, "saving article");
        Ok(operation)
    }

    /// Leave the saving state with the store's answer. Failures are kept for
    /// display; nothing the caller holds is rolled back.
    pub fn finish_save(&mut self, outcome: Result<Article>) -> Result<Article> {
        self.status = SaveStatus::Idle;
        match outcome {
            Ok(article) => {
                tracing::info!(id = article.id, slug = %article.slug, "article saved");
                self.article_id = Some(article.id);
                self.slug = Some(article.slug.clone());
                self.published = article.is_published;
                self.last_error = None;
                self.last_saved = Some(article.clone());
                Ok(article)
            }
            Err(err) => {
                tracing::warn!("Save failed: {}", err);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Run a whole save against `store`. The intent is taken from the draft's
    /// publish flag.
    pub async fn save(
        &mut self,
        store: &dyn ArticleStore,
        draft: &ArticleDraft,
        touched: bool,
    ) -> Result<Article> {
        let intent = if draft.is_published {
            SaveIntent::Publish
        } else {
            SaveIntent::Draft
        };
        let operation = self.begin_save(&draft.title, touched, intent)?;
        let mut guard = SavingGuard(self);
        let outcome = match operation {
            SaveOperation::Create => store.create_article(draft).await,
            SaveOperation::Update(id) => store.update_article(id, draft).await,
        };
        guard.0.finish_save(outcome)
    }
}

/// Reopens the latch if a save future is dropped before the store answers
struct SavingGuard<'a>(&'a mut SaveController);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        if self.0.is_saving() {
            tracing::warn!("Save cancelled before the store answered");
            self.0.status = SaveStatus::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryArticleStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Store whose writes never complete
    struct HangingStore;

    #[async_trait]
    impl ArticleStore for HangingStore {
        async fn create_article(&self, _draft: &ArticleDraft) -> Result<Article> {
            std::future::pending().await
        }

        async fn update_article(&self, _id: ArticleId, _draft: &ArticleDraft) -> Result<Article> {
            std::future::pending().await
        }

        async fn get_article_by_id(&self, id: ArticleId) -> Result<Article> {
            Err(StoreError::NotFound(id))
        }
    }

    fn draft(title: &str, intent: SaveIntent) -> ArticleDraft {
        ArticleDraft {
            title: title.to_string(),
            content: json!({"type": "doc"}),
            author_name: "Ada".to_string(),
            is_published: intent.is_published(),
        }
    }

    #[test]
    fn test_title_gating() {
        let controller = SaveController::new(true);
        assert_eq!(
            controller.check_save("", true, SaveIntent::Publish),
            Err(StoreError::TitleRequired)
        );
        assert!(!controller.can_save("   ", true, SaveIntent::Publish));
        // touched does not matter before first publish
        assert!(controller.can_save("Title", false, SaveIntent::Publish));
        assert!(controller.can_save("Title", false, SaveIntent::Draft));
    }

    #[test]
    fn test_draft_requires_support() {
        let controller = SaveController::new(false);
        assert!(matches!(
            controller.check_save("Title", true, SaveIntent::Draft),
            Err(StoreError::SaveNotAllowed(_))
        ));
        assert!(controller.can_save("Title", true, SaveIntent::Publish));
    }

    #[test]
    fn test_latch_rejects_second_save() {
        let mut controller = SaveController::new(true);
        let operation = controller
            .begin_save("Title", true, SaveIntent::Publish)
            .unwrap();
        assert_eq!(operation, SaveOperation::Create);
        assert_eq!(controller.status(), SaveStatus::Saving(SaveOperation::Create));
        assert_eq!(
            controller.begin_save("Title", true, SaveIntent::Publish),
            Err(StoreError::SaveInProgress)
        );

        assert!(controller
            .finish_save(Err(StoreError::Transport("timeout".into())))
            .is_err());
        assert_eq!(controller.status(), SaveStatus::Idle);
        assert_eq!(
            controller.last_error(),
            Some(&StoreError::Transport("timeout".into()))
        );
        assert!(controller.can_save("Title", true, SaveIntent::Publish));
    }

    #[tokio::test]
    async fn test_create_then_update() {
        let store = MemoryArticleStore::new();
        let mut controller = SaveController::new(true);

        let created = controller
            .save(&store, &draft("First", SaveIntent::Draft), true)
            .await
            .unwrap();
        assert!(!created.is_published);
        assert_eq!(controller.next_operation(), SaveOperation::Update(created.id));
        assert_eq!(controller.slug(), Some(created.slug.as_str()));

        let published = controller
            .save(&store, &draft("First", SaveIntent::Publish), true)
            .await
            .unwrap();
        assert_eq!(published.id, created.id);
        assert_eq!(published.slug, created.slug);
        assert!(controller.is_published());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_published_update_requires_touched() {
        let store = MemoryArticleStore::new();
        let mut controller = SaveController::new(true);
        controller
            .save(&store, &draft("Live", SaveIntent::Publish), true)
            .await
            .unwrap();

        assert!(matches!(
            controller
                .save(&store, &draft("Live", SaveIntent::Publish), false)
                .await,
            Err(StoreError::SaveNotAllowed(_))
        ));
        assert_eq!(store.request_count(), 1);

        // unpublishing to a draft stays possible
        assert!(controller.can_save("Live", false, SaveIntent::Draft));
        assert!(controller.can_save("Live", true, SaveIntent::Publish));
    }

    #[tokio::test]
    async fn test_failure_is_retained_and_retry_works() {
        let store = MemoryArticleStore::new();
        let mut controller = SaveController::new(true);
        store
            .fail_next_with(StoreError::field("title", "Too long."))
            .await;

        let failed = controller
            .save(&store, &draft("Title", SaveIntent::Publish), true)
            .await;
        assert!(matches!(failed, Err(StoreError::Validation(_))));
        assert!(controller.last_error().is_some());
        assert_eq!(controller.next_operation(), SaveOperation::Create);

        controller
            .save(&store, &draft("Title", SaveIntent::Publish), true)
            .await
            .unwrap();
        assert!(controller.last_error().is_none());
        assert!(controller.last_saved().is_some());
    }

    #[tokio::test]
    async fn test_cancelled_save_reopens_latch() {
        let mut controller = SaveController::new(true);
        let payload = draft("Title", SaveIntent::Publish);

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            controller.save(&HangingStore, &payload, true),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(controller.status(), SaveStatus::Idle);
        assert!(controller.can_save("Title", true, SaveIntent::Publish));

        let store = MemoryArticleStore::new();
        let saved = controller.save(&store, &payload, true).await.unwrap();
        assert_eq!(controller.article_id(), Some(saved.id));
    }
}
