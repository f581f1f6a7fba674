//! Learning resource lookup and prefetch cache
//!
//! Embed nodes only hold a resource ID. The resource itself is fetched from
//! the catalog into a cache keyed by ID; nothing here writes into documents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{Result, StoreError};

/// A catalog entry shown by a learning resource embed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
}

impl LearningResource {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            url: None,
            image_url: None,
            resource_type: None,
        }
    }
}

/// Remote catalog of learning resources
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    async fn get_resource_by_id(&self, id: u64) -> Result<LearningResource>;

    /// Resources for the given IDs. Unknown IDs are left out.
    async fn list_resources_by_ids(&self, ids: &[u64]) -> Result<Vec<LearningResource>>;
}

/// Read-through cache of catalog resources
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<HashMap<u64, LearningResource>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: u64) -> Option<LearningResource> {
        self.entries.read().await.get(&id).cloned()
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.entries.read().await.contains_key(&id)
    }

    pub async fn insert(&self, resource: LearningResource) {
        self.entries.write().await.insert(resource.id, resource);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Fetch the IDs not cached yet in one bulk request. Returns how many
    /// resources were added.
    pub async fn prefetch(&self, catalog: &dyn ResourceCatalog, ids: &[u64]) -> Result<usize> {
        let missing: Vec<u64> = {
            let entries = self.entries.read().await;
            let mut missing = Vec::new();
            for id in ids {
                if !entries.contains_key(id) && !missing.contains(id) {
                    missing.push(*id);
                }
            }
            missing
        };
        if missing.is_empty() {
            return Ok(0);
        }

        let fetched = catalog.list_resources_by_ids(&missing).await?;
        let count = fetched.len();
        let mut entries = self.entries.write().await;
        for resource in fetched {
            entries.insert(resource.id, resource);
        }
        tracing::debug!(requested = missing.len(), fetched = count, "prefetched resources");
        Ok(count)
    }

    /// Cached resource, fetched individually on a miss
    pub async fn get_or_fetch(&self, catalog: &dyn ResourceCatalog, id: u64) -> Result<LearningResource> {
        if let Some(resource) = self.get(id).await {
            return Ok(resource);
        }
        let resource = catalog.get_resource_by_id(id).await?;
        self.insert(resource.clone()).await;
        Ok(resource)
    }
}

/// Catalog backed by a fixed set of resources. Records every bulk request.
#[derive(Debug, Default)]
pub struct MemoryResourceCatalog {
    resources: HashMap<u64, LearningResource>,
    requests: RwLock<Vec<Vec<u64>>>,
}

impl MemoryResourceCatalog {
    pub fn new(resources: impl IntoIterator<Item = LearningResource>) -> Self {
        Self {
            resources: resources.into_iter().map(|r| (r.id, r)).collect(),
            requests: RwLock::new(Vec::new()),
        }
    }

    /// ID lists of the bulk requests received so far
    pub async fn requests(&self) -> Vec<Vec<u64>> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl ResourceCatalog for MemoryResourceCatalog {
    async fn get_resource_by_id(&self, id: u64) -> Result<LearningResource> {
        self.resources
            .get(&id)
            .cloned()
            .ok_or(StoreError::ResourceNotFound(id))
    }

    async fn list_resources_by_ids(&self, ids: &[u64]) -> Result<Vec<LearningResource>> {
        self.requests.write().await.push(ids.to_vec());
        Ok(ids
            .iter()
            .filter_map(|id| self.resources.get(id).cloned())
            .collect())
    }
}
