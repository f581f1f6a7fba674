//! End-to-end editing session tests

use article_editor::{ArticleEditorSession, SessionConfig, SessionError};
use chrono::Utc;
use doc_model::{
    article_schema, empty_article, title_path, Mark, Node, NodeKind, NodePath, Schema, Selection,
    ViolationKind,
};
use edit_engine::{AddMark, EnterOutcome, InsertNode};
use serde_json::{json, Value};
use std::sync::Arc;
use store::{
    AbortHandle, Article, ArticleStore, LearningResource, MediaFile, MemoryArticleStore,
    MemoryMediaUploader, MemoryResourceCatalog, SaveIntent, StoreError, UploadState,
};

const RESOURCE_URL: &str = "https://learn.example.edu/search?resource=42";

fn schema() -> Arc<Schema> {
    Arc::new(article_schema().unwrap())
}

fn new_session() -> ArticleEditorSession {
    let config = SessionConfig::default()
        .with_author("Ada Lovelace")
        .with_draft_support(true);
    ArticleEditorSession::new(schema(), config).unwrap()
}

fn stored_article(id: u64, content: Value, is_published: bool) -> Article {
    let now = Utc::now();
    Article {
        id,
        title: "Stored".to_string(),
        slug: "stored-0000aaaa".to_string(),
        content,
        author_name: "Grace".to_string(),
        is_published,
        created_on: now,
        updated_on: now,
    }
}

fn body() -> NodePath {
    NodePath::from_indices(vec![2])
}

#[tokio::test]
async fn test_create_flow_payload() {
    let store = MemoryArticleStore::new();
    let mut session = new_session();
    session.engine_mut().set_title("My Article").unwrap();

    let article = session.save(&store, SaveIntent::Publish).await.unwrap();
    assert_eq!(article.title, "My Article");
    assert!(article.is_published);
    assert_eq!(article.author_name, "Ada Lovelace");

    let expected = empty_article()
        .replace_at(&title_path(), Node::heading(1, vec![Node::text("My Article")]))
        .unwrap()
        .to_json()
        .unwrap();
    assert_eq!(article.content, expected);
    assert_eq!(
        article.content["content"][0]["content"][0]["content"][0],
        json!({"type": "text", "text": "My Article"})
    );
    assert!(!session.is_touched());
}

#[tokio::test]
async fn test_second_save_updates_same_article() {
    let store = MemoryArticleStore::new();
    let mut session = new_session();
    session.engine_mut().set_title("Draft one").unwrap();
    let first = session.save(&store, SaveIntent::Draft).await.unwrap();

    session.engine_mut().set_title("Draft two").unwrap();
    let second = session.save(&store, SaveIntent::Publish).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.slug, first.slug);
    assert_eq!(store.len().await, 1);
    assert_eq!(store.get_article_by_id(first.id).await.unwrap().title, "Draft two");
}

#[tokio::test]
async fn test_save_gating() {
    let mut session = new_session();
    assert!(!session.can_save(SaveIntent::Publish));

    session.engine_mut().set_title("   ").unwrap();
    assert!(!session.can_save(SaveIntent::Publish));

    session.engine_mut().set_title("Title").unwrap();
    assert!(session.can_save(SaveIntent::Publish));

    // an untouched published article cannot be re-published
    let published = stored_article(3, session.doc().to_json().unwrap(), true);
    let session = ArticleEditorSession::from_article(&published, schema(), SessionConfig::default())
        .unwrap();
    assert!(!session.is_touched());
    assert!(!session.can_save(SaveIntent::Publish));
}

#[tokio::test]
async fn test_published_article_saves_after_edit() {
    let store = MemoryArticleStore::new();
    let content = empty_article()
        .replace_at(&title_path(), Node::heading(1, vec![Node::text("Live")]))
        .unwrap()
        .to_json()
        .unwrap();
    store.insert(stored_article(7, content, true)).await;

    let mut session = ArticleEditorSession::load(&store, 7, schema(), SessionConfig::default())
        .await
        .unwrap();
    assert_eq!(session.title(), "Live");
    assert_eq!(session.config().author_name, "Grace");
    assert!(matches!(
        session.save(&store, SaveIntent::Publish).await,
        Err(SessionError::Store(StoreError::SaveNotAllowed(_)))
    ));

    session
        .engine_mut()
        .set_selection(Selection::caret(body(), 0));
    session.engine_mut().insert_text("New body text").unwrap();
    let saved = session.save(&store, SaveIntent::Publish).await.unwrap();
    assert_eq!(saved.id, 7);
    assert_eq!(saved.slug, "stored-0000aaaa");
}

#[tokio::test]
async fn test_failed_save_keeps_document() {
    let store = MemoryArticleStore::new();
    let mut session = new_session();
    session.engine_mut().set_title("Keep me").unwrap();
    let before = session.doc().clone();

    store
        .fail_next_with(StoreError::Transport("connection reset".into()))
        .await;
    assert!(session.save(&store, SaveIntent::Publish).await.is_err());
    assert_eq!(session.doc(), &before);
    assert!(session.is_touched());
    assert_eq!(
        session.save_controller().last_error(),
        Some(&StoreError::Transport("connection reset".into()))
    );

    assert!(session.save(&store, SaveIntent::Publish).await.is_ok());
    assert!(session.save_controller().last_error().is_none());
}

#[tokio::test]
async fn test_malformed_load_surfaces_violation() {
    let store = MemoryArticleStore::new();
    let content = json!({
        "type": "doc",
        "content": [{"type": "paragraph", "content": [{"type": "text", "text": "x"}]}]
    });
    store.insert(stored_article(11, content, false)).await;

    let session = ArticleEditorSession::load(&store, 11, schema(), SessionConfig::default())
        .await
        .unwrap();
    let violation = session.diagnostic().unwrap();
    assert_eq!(violation.kind, ViolationKind::NotAllowed);
    assert!(violation
        .message
        .contains("paragraph is not allowed in this position"));
    assert_eq!(session.title(), "Stored");
}

#[tokio::test]
async fn test_unbuildable_load_uses_skeleton() {
    let store = MemoryArticleStore::new();
    let content = json!({
        "type": "doc",
        "content": [{"type": "paragraph", "content": [{"type": "text", "text": "x", "marks": [{"type": "blink"}]}]}]
    });
    store.insert(stored_article(12, content, false)).await;

    let session = ArticleEditorSession::load(&store, 12, schema(), SessionConfig::default())
        .await
        .unwrap();
    assert_eq!(session.doc(), &empty_article());
    assert!(session.diagnostic().is_some());
}

#[tokio::test]
async fn test_load_missing_article() {
    let store = MemoryArticleStore::new();
    let result = ArticleEditorSession::load(&store, 99, schema(), SessionConfig::default()).await;
    assert!(matches!(
        result,
        Err(SessionError::Store(StoreError::NotFound(99)))
    ));
}

#[test]
fn test_url_conversion_end_to_end() {
    let mut session = new_session();
    let engine = session.engine_mut();
    engine.set_selection(Selection::caret(body(), 0));
    let input = engine
        .insert_input_node(NodeKind::LearningResourceInput)
        .unwrap()
        .unwrap();
    assert_eq!(input, NodePath::from_indices(vec![3]));

    engine.insert_text(RESOURCE_URL).unwrap();
    let outcome = engine.press_enter().unwrap();
    assert_eq!(
        outcome,
        EnterOutcome::Converted {
            path: input.clone(),
            kind: NodeKind::LearningResource
        }
    );
    assert_eq!(
        engine.doc().node_at(&input),
        Some(&Node::learning_resource(42, Some(RESOURCE_URL.to_string())))
    );
    assert_eq!(engine.selection(), &Selection::node(input));
    assert!(session.diagnostic().is_none());
    assert_eq!(session.embedded_resource_ids(), vec![42]);

    session.engine_mut().undo().unwrap();
    assert!(session.embedded_resource_ids().is_empty());
}

#[test]
fn test_link_suppression_selectivity() {
    let mut session = new_session();
    let engine = session.engine_mut();
    engine.set_selection(Selection::caret(body(), 0));
    engine.insert_text(RESOURCE_URL).unwrap();
    let next = NodePath::from_indices(vec![3]);
    engine
        .execute(Box::new(InsertNode::new(
            NodePath::root(),
            3,
            Node::paragraph_with_text("Take this course"),
        )))
        .unwrap();

    let len = RESOURCE_URL.chars().count();
    engine
        .execute(Box::new(AddMark::new(body(), 0, len, Mark::link(RESOURCE_URL))))
        .unwrap();
    engine
        .execute(Box::new(AddMark::new(next.clone(), 0, 16, Mark::link(RESOURCE_URL))))
        .unwrap();

    // the bare URL loses its link, the authored link text keeps it
    let bare = &engine.doc().node_at(&body()).unwrap().content()[0];
    assert!(bare.marks().is_empty());
    let authored = &engine.doc().node_at(&next).unwrap().content()[0];
    assert_eq!(authored.marks(), &[Mark::link(RESOURCE_URL)]);
    assert!(session.diagnostic().is_none());
}

#[tokio::test]
async fn test_prefetch_embeds() {
    let catalog = MemoryResourceCatalog::new([
        LearningResource::new(5, "Five"),
        LearningResource::new(7, "Seven"),
    ]);
    let content = empty_article()
        .insert_at(&NodePath::root(), 3, Node::learning_resource(5, None))
        .unwrap()
        .insert_at(&NodePath::root(), 4, Node::learning_resource(7, None))
        .unwrap()
        .insert_at(&NodePath::root(), 5, Node::learning_resource(5, None))
        .unwrap()
        .to_json()
        .unwrap();
    let session = ArticleEditorSession::from_article(
        &stored_article(1, content, false),
        schema(),
        SessionConfig::default(),
    )
    .unwrap();
    assert!(session.diagnostic().is_none());
    assert_eq!(session.embedded_resource_ids(), vec![5, 7]);

    assert_eq!(session.prefetch_embeds(&catalog).await.unwrap(), 2);
    assert_eq!(session.prefetch_embeds(&catalog).await.unwrap(), 0);
    assert_eq!(catalog.requests().await, vec![vec![5, 7]]);
    assert_eq!(session.resources().get(7).await.unwrap().title, "Seven");

    // prefetching never touches the document
    assert!(!session.is_touched());
}

#[tokio::test]
async fn test_image_upload_fills_src() {
    let uploader = MemoryMediaUploader::new("https://cdn.example.com/media");
    let mut session = new_session();
    session
        .engine_mut()
        .set_selection(Selection::caret(body(), 0));

    let (upload_id, url) = session
        .upload_image(
            &uploader,
            MediaFile::new("diagram.png", "image/png", vec![1; 128]),
            AbortHandle::new(),
        )
        .await
        .unwrap();
    assert_eq!(url, "https://cdn.example.com/media/diagram.png");
    assert_eq!(
        session.upload_state(&upload_id),
        Some(UploadState::Completed { url: url.clone() })
    );

    match session.doc().node_at(&NodePath::from_indices(vec![3])).unwrap() {
        Node::Image { attrs } => {
            assert_eq!(attrs.src.as_deref(), Some(url.as_str()));
            assert!(attrs.upload_id.is_none());
        }
        other => panic!("expected image, got {:?}", other),
    }
    assert!(session.diagnostic().is_none());
}

#[tokio::test]
async fn test_aborted_upload_leaves_pending_node() {
    let uploader = MemoryMediaUploader::new("https://cdn.example.com/media");
    let mut session = new_session();
    session
        .engine_mut()
        .set_selection(Selection::caret(body(), 0));

    let abort = AbortHandle::new();
    abort.abort();
    let result = session
        .upload_image(
            &uploader,
            MediaFile::new("big.mov", "video/quicktime", vec![0; 16]),
            abort,
        )
        .await;
    assert!(matches!(
        result,
        Err(SessionError::Store(StoreError::UploadAborted))
    ));

    let pending = session.doc().node_at(&NodePath::from_indices(vec![3])).unwrap();
    let upload_id = match pending {
        Node::Image { attrs } => {
            assert!(attrs.src.is_none());
            attrs.upload_id.clone().unwrap()
        }
        other => panic!("expected image, got {:?}", other),
    };
    assert!(matches!(
        session.upload_state(&upload_id),
        Some(UploadState::Failed { .. })
    ));
}
