//! Article editing session

use doc_model::{
    article_title, empty_article, estimate_read_time, extract_embed_resource_ids, extract_title,
    find_banner, validate_json, Node, NodeKind, NodePath, Schema, SchemaViolation,
    DEFAULT_SHORT_TITLE,
};
use edit_engine::{EditingEngine, UpdateAttrs};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use store::{
    upload_with_tracking, AbortHandle, Article, ArticleDraft, ArticleId, ArticleStore, MediaFile,
    MediaUploader, ResourceCache, ResourceCatalog, SaveController, SaveIntent, UploadState,
    UploadTracker,
};

use crate::{Result, SessionConfig, SessionError};

/// One article open in the editor
pub struct ArticleEditorSession {
    config: SessionConfig,
    engine: EditingEngine,
    saver: SaveController,
    resources: Arc<ResourceCache>,
    uploads: UploadTracker,
    /// Title stored with the loaded article, used when the document has no banner
    loaded_title: Option<String>,
}

impl ArticleEditorSession {
    /// A session for a new article, starting from the empty skeleton
    pub fn new(schema: Arc<Schema>, config: SessionConfig) -> Result<Self> {
        let engine = EditingEngine::new(schema, config.editor.clone())?;
        let saver = SaveController::new(config.draft_support);
        Ok(Self {
            config,
            engine,
            saver,
            resources: Arc::new(ResourceCache::new()),
            uploads: UploadTracker::new(),
            loaded_title: None,
        })
    }

    /// Fetch an article from the store and open it
    pub async fn load(
        store: &dyn ArticleStore,
        id: ArticleId,
        schema: Arc<Schema>,
        config: SessionConfig,
    ) -> Result<Self> {
        let article = store.get_article_by_id(id).await?;
        Self::from_article(&article, schema, config)
    }

    /// Open an already fetched article. Invalid content never fails the
    /// load: the violation becomes the editor's diagnostic, and content that
    /// cannot be built into a document at all is replaced by the empty
    /// skeleton.
    pub fn from_article(
        article: &Article,
        schema: Arc<Schema>,
        config: SessionConfig,
    ) -> Result<Self> {
        let (doc, violation) = open_content(&schema, &article.content);
        if let Some(violation) = &violation {
            tracing::warn!(id = article.id, "Loaded article content is invalid: {}", violation);
        }

        let mut engine = EditingEngine::with_document(schema, config.editor.clone(), doc)?;
        if let Some(violation) = violation {
            engine.set_diagnostic(violation);
        }

        let mut config = config;
        if config.author_name.is_empty() {
            config.author_name = article.author_name.clone();
        }
        let saver = SaveController::for_article(article, config.draft_support);
        tracing::debug!(id = article.id, "opened article");

        Ok(Self {
            config,
            engine,
            saver,
            resources: Arc::new(ResourceCache::new()),
            uploads: UploadTracker::new(),
            loaded_title: Some(article.title.clone()),
        })
    }

    /// Share a resource cache with other sessions
    pub fn with_resource_cache(mut self, resources: Arc<ResourceCache>) -> Self {
        self.resources = resources;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn engine(&self) -> &EditingEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EditingEngine {
        &mut self.engine
    }

    pub fn doc(&self) -> &Node {
        self.engine.doc()
    }

    pub fn save_controller(&self) -> &SaveController {
        &self.saver
    }

    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    pub fn diagnostic(&self) -> Option<&SchemaViolation> {
        self.engine.diagnostic()
    }

    pub fn dismiss_diagnostic(&mut self) {
        self.engine.dismiss_diagnostic();
    }

    pub fn is_touched(&self) -> bool {
        self.engine.is_touched()
    }

    // ========================================================================
    // Derived values
    // ========================================================================

    /// The canonical title: the banner heading's trimmed text
    pub fn title(&self) -> String {
        let doc = self.engine.doc();
        match (find_banner(doc), &self.loaded_title) {
            (None, Some(loaded)) => loaded.trim().to_string(),
            _ => article_title(doc),
        }
    }

    /// Breadcrumb title, at most five words
    pub fn short_title(&self) -> String {
        find_banner(self.engine.doc())
            .map(extract_title)
            .unwrap_or_else(|| DEFAULT_SHORT_TITLE.to_string())
    }

    /// Estimated minutes to read the article
    pub fn read_time(&self) -> Option<u32> {
        estimate_read_time(Some(self.engine.doc()), self.config.words_per_minute)
    }

    pub fn embedded_resource_ids(&self) -> Vec<u64> {
        extract_embed_resource_ids(self.engine.doc())
    }

    // ========================================================================
    // Saving
    // ========================================================================

    pub fn can_save(&self, intent: SaveIntent) -> bool {
        self.saver
            .can_save(&self.title(), self.engine.is_touched(), intent)
    }

    /// The payload a save with `intent` would send
    pub fn draft(&self, intent: SaveIntent) -> Result<ArticleDraft> {
        Ok(ArticleDraft::from_document(
            self.title(),
            self.engine.doc(),
            self.config.author_name.clone(),
            intent.is_published(),
        )?)
    }

    /// Save the whole document. On success the document counts as untouched
    /// again; on failure the error stays on the save controller and the
    /// document is kept as is.
    pub async fn save(&mut self, store: &dyn ArticleStore, intent: SaveIntent) -> Result<Article> {
        let draft = self.draft(intent)?;
        let article = self
            .saver
            .save(store, &draft, self.engine.is_touched())
            .await?;
        self.engine.mark_untouched();
        self.loaded_title = Some(article.title.clone());
        Ok(article)
    }

    // ========================================================================
    // Embedded resources
    // ========================================================================

    /// Fetch every embedded resource that is not cached yet
    pub async fn prefetch_embeds(&self, catalog: &dyn ResourceCatalog) -> Result<usize> {
        let ids = self.embedded_resource_ids();
        Ok(self.resources.prefetch(catalog, &ids).await?)
    }

    // ========================================================================
    // Media uploads
    // ========================================================================

    pub fn upload_state(&self, upload_id: &str) -> Option<UploadState> {
        self.uploads.state(upload_id)
    }

    /// Insert a pending image node after the selection and register its
    /// upload. Returns the upload ID and the node's path.
    pub fn begin_image_upload(&mut self) -> Result<(String, NodePath)> {
        let upload_id = self.uploads.start();
        let mut attrs = Map::new();
        attrs.insert("uploadId".into(), json!(upload_id));
        let image = self
            .engine
            .schema()
            .create_node(NodeKind::Image.as_str(), attrs)?;

        match self.engine.insert_node(image)? {
            Some(path) => Ok((upload_id, path)),
            None => {
                self.uploads.remove(&upload_id);
                Err(SessionError::NoInsertPosition(NodeKind::Image))
            }
        }
    }

    /// Point the pending image for `upload_id` at its uploaded URL. Returns
    /// false when the node was removed in the meantime.
    pub fn complete_image_upload(&mut self, upload_id: &str, url: &str) -> Result<bool> {
        let Some(path) = find_pending_image(self.engine.doc(), upload_id) else {
            return Ok(false);
        };
        let mut attrs = Map::new();
        attrs.insert("src".into(), json!(url));
        attrs.insert("uploadId".into(), Value::Null);
        self.engine.execute(Box::new(UpdateAttrs::new(path, attrs)))?;
        Ok(true)
    }

    /// Upload `file` into a new image node, returning the upload ID and URL.
    /// A failed or aborted upload leaves the pending node in place and its
    /// failure in the upload tracker.
    pub async fn upload_image(
        &mut self,
        uploader: &dyn MediaUploader,
        file: MediaFile,
        abort: AbortHandle,
    ) -> Result<(String, String)> {
        let (upload_id, _) = self.begin_image_upload()?;
        let media = upload_with_tracking(uploader, &self.uploads, &upload_id, file, abort).await?;
        self.complete_image_upload(&upload_id, &media.url)?;
        Ok((upload_id, media.url))
    }
}

/// Build the document for stored content, with the first violation if the
/// content is invalid
fn open_content(schema: &Schema, content: &Value) -> (Node, Option<SchemaViolation>) {
    match validate_json(schema, content) {
        Ok(doc) => (doc, None),
        Err(violation) => match Node::from_json(content.clone()) {
            Ok(doc) if doc.kind() == NodeKind::Doc => (doc, Some(violation)),
            _ => (empty_article(), Some(violation)),
        },
    }
}

fn find_pending_image(doc: &Node, upload_id: &str) -> Option<NodePath> {
    doc.find_path(|node| match node {
        Node::Image { attrs } => attrs.upload_id.as_deref() == Some(upload_id),
        _ => false,
    })
}
