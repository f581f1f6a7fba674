//! Media uploads with progress tracking and cancellation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::{Result, StoreError};

/// A file picked for upload
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Share uploaded, from 0.0 to 1.0
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.loaded as f64 / self.total as f64).min(1.0) as f32
    }
}

/// Shared cancellation flag for an upload
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub type ProgressCallback<'a> = &'a (dyn Fn(UploadProgress) + Send + Sync);

/// Remote media upload
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload `file`, reporting progress, until done or `abort` fires
    async fn upload(
        &self,
        file: MediaFile,
        on_progress: ProgressCallback<'_>,
        abort: AbortHandle,
    ) -> Result<UploadedMedia>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum UploadState {
    Pending { progress: f32 },
    Failed { message: String },
    Completed { url: String },
}

/// State of every upload started in a session, keyed by upload ID
#[derive(Debug, Default)]
pub struct UploadTracker {
    uploads: RwLock<HashMap<String, UploadState>>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, UploadState>> {
        self.uploads.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new pending upload and return its ID
    pub fn start(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.write()
            .insert(id.clone(), UploadState::Pending { progress: 0.0 });
        id
    }

    pub fn set_progress(&self, id: &str, progress: f32) {
        if let Some(state @ UploadState::Pending { .. }) = self.write().get_mut(id) {
            *state = UploadState::Pending { progress };
        }
    }

    pub fn complete(&self, id: &str, url: impl Into<String>) {
        self.write()
            .insert(id.to_string(), UploadState::Completed { url: url.into() });
    }

    pub fn fail(&self, id: &str, message: impl Into<String>) {
        self.write().insert(
            id.to_string(),
            UploadState::Failed {
                message: message.into(),
            },
        );
    }

    pub fn state(&self, id: &str) -> Option<UploadState> {
        self.uploads
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &str) -> Option<UploadState> {
        self.write().remove(id)
    }
}

/// Run an upload and record its progress and outcome under `upload_id`
pub async fn upload_with_tracking(
    uploader: &dyn MediaUploader,
    tracker: &UploadTracker,
    upload_id: &str,
    file: MediaFile,
    abort: AbortHandle,
) -> Result<UploadedMedia> {
    let on_progress = |progress: UploadProgress| tracker.set_progress(upload_id, progress.fraction());
    let outcome = uploader.upload(file, &on_progress, abort.clone()).await;

    let outcome = match outcome {
        Ok(_) if abort.is_aborted() => Err(StoreError::UploadAborted),
        other => other,
    };
    match &outcome {
        Ok(media) => {
            tracing::info!(upload_id, url = %media.url, "upload completed");
            tracker.complete(upload_id, media.url.clone());
        }
        Err(err) => {
            tracing::warn!(upload_id, "Upload failed: {}", err);
            tracker.fail(upload_id, err.to_string());
        }
    }
    outcome
}

/// Uploader that "stores" files under a base URL after reporting progress in
/// two steps. Optionally fails every upload with a fixed message.
#[derive(Debug, Clone)]
pub struct MemoryMediaUploader {
    base_url: String,
    failure: Option<String>,
}

impl MemoryMediaUploader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            base_url: String::new(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl MediaUploader for MemoryMediaUploader {
    async fn upload(
        &self,
        file: MediaFile,
        on_progress: ProgressCallback<'_>,
        abort: AbortHandle,
    ) -> Result<UploadedMedia> {
        let total = file.bytes.len() as u64;
        on_progress(UploadProgress {
            loaded: total / 2,
            total,
        });
        tokio::task::yield_now().await;
        if abort.is_aborted() {
            return Err(StoreError::UploadAborted);
        }
        if let Some(message) = &self.failure {
            return Err(StoreError::UploadFailed(message.clone()));
        }
        on_progress(UploadProgress {
            loaded: total,
            total,
        });
        Ok(UploadedMedia {
            url: format!("{}/{}", self.base_url.trim_end_matches('/'), file.name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> MediaFile {
        MediaFile::new("cat.png", "image/png", vec![0; 64])
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(UploadProgress { loaded: 0, total: 0 }.fraction(), 0.0);
        assert_eq!(UploadProgress { loaded: 32, total: 64 }.fraction(), 0.5);
        assert_eq!(UploadProgress { loaded: 80, total: 64 }.fraction(), 1.0);
    }

    #[test]
    fn test_abort_handle_is_shared() {
        let handle = AbortHandle::new();
        let clone = handle.clone();
        clone.abort();
        assert!(handle.is_aborted());
    }

    #[tokio::test]
    async fn test_successful_upload_is_tracked() {
        let uploader = MemoryMediaUploader::new("https://cdn.example.com/media/");
        let tracker = UploadTracker::new();
        let id = tracker.start();
        assert_eq!(tracker.state(&id), Some(UploadState::Pending { progress: 0.0 }));

        let media = upload_with_tracking(&uploader, &tracker, &id, png(), AbortHandle::new())
            .await
            .unwrap();
        assert_eq!(media.url, "https://cdn.example.com/media/cat.png");
        assert_eq!(
            tracker.state(&id),
            Some(UploadState::Completed { url: media.url.clone() })
        );
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_message() {
        let uploader = MemoryMediaUploader::failing("file too large");
        let tracker = UploadTracker::new();
        let id = tracker.start();

        let result = upload_with_tracking(&uploader, &tracker, &id, png(), AbortHandle::new()).await;
        assert_eq!(result, Err(StoreError::UploadFailed("file too large".into())));
        assert_eq!(
            tracker.state(&id),
            Some(UploadState::Failed {
                message: "Upload failed: file too large".into()
            })
        );
    }

    #[tokio::test]
    async fn test_aborted_upload() {
        let uploader = MemoryMediaUploader::new("https://cdn.example.com");
        let tracker = UploadTracker::new();
        let id = tracker.start();
        let abort = AbortHandle::new();
        abort.abort();

        let result = upload_with_tracking(&uploader, &tracker, &id, png(), abort).await;
        assert_eq!(result, Err(StoreError::UploadAborted));
        assert!(matches!(tracker.state(&id), Some(UploadState::Failed { .. })));
    }

    #[test]
    fn test_progress_ignored_once_finished() {
        let tracker = UploadTracker::new();
        let id = tracker.start();
        tracker.set_progress(&id, 0.25);
        assert_eq!(tracker.state(&id), Some(UploadState::Pending { progress: 0.25 }));
        tracker.complete(&id, "https://cdn.example.com/x.png");
        tracker.set_progress(&id, 0.5);
        assert!(matches!(tracker.state(&id), Some(UploadState::Completed { .. })));
        assert!(tracker.remove(&id).is_some());
        assert!(tracker.state(&id).is_none());
    }
}
