//! In-process object store
//!
//! Keeps objects in memory, listing them in insertion order. Used by the
//! `serve --memory` development mode and by the router tests.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{presign_seconds, BucketSummary, ObjectStore, ObjectSummary, StoredObject};
use crate::error::{Error, Result};

/// Object store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    buckets: RwLock<BTreeMap<String, Vec<StoredObject>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket (no-op if it exists)
    pub async fn create_bucket(&self, bucket: &str) {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
    }

    /// Store an object with user metadata
    pub async fn insert(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        content_type: &str,
        metadata: BTreeMap<String, String>,
    ) {
        let body: Bytes = data.into();
        let object = StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            content_length: body.len() as u64,
            last_modified: None,
            e_tag: None,
            metadata,
            body,
        };

        let mut buckets = self.buckets.write().await;
        let objects = buckets.entry(bucket.to_string()).or_default();
        match objects.iter_mut().find(|o| o.key == key) {
            Some(existing) => *existing = object,
            None => objects.push(object),
        }
    }

    /// Whether an object exists
    pub async fn contains(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.iter().any(|o| o.key == key))
            .unwrap_or(false)
    }
}

fn no_such_bucket(bucket: &str) -> Error {
    Error::BucketNotFound(bucket.to_string())
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>> {
        Ok(self
            .buckets
            .read()
            .await
            .keys()
            .map(|name| BucketSummary {
                name: name.clone(),
                creation_date: None,
            })
            .collect())
    }

    async fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectSummary>> {
        let buckets = self.buckets.read().await;
        let objects = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let prefix = prefix.unwrap_or_default();

        Ok(objects
            .iter()
            .filter(|o| o.key.starts_with(prefix))
            .map(|o| ObjectSummary {
                key: o.key.clone(),
                size: o.content_length,
                last_modified: o.last_modified.clone(),
                e_tag: o.e_tag.clone(),
                storage_class: Some("STANDARD".to_string()),
            })
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.iter().find(|o| o.key == key))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        if !self.buckets.read().await.contains_key(bucket) {
            return Err(no_such_bucket(bucket));
        }
        self.insert(bucket, key, data, content_type, BTreeMap::new())
            .await;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        objects.retain(|o| o.key != key);
        Ok(())
    }

    async fn presign_get(&self, bucket: &str, key: &str, expiry: Duration) -> Result<String> {
        let seconds = presign_seconds(expiry)?;
        Ok(format!(
            "memory://{}/{}?expires={}",
            bucket,
            urlencoding::encode(key),
            seconds
        ))
    }
}
