//! Object Storage Module
//!
//! The `ObjectStore` trait is the seam between the HTTP front-ends and the
//! storage backend. Every operation is a single pass-through call; no
//! caching or retries happen at this layer.

mod memory;
mod s3_store;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use memory::MemoryStore;
pub use s3_store::S3Store;

/// Longest validity a SigV4 presigned URL may have
pub const MAX_PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A bucket as returned by ListBuckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

/// One entry of an object listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub e_tag: Option<String>,
    #[serde(default)]
    pub storage_class: Option<String>,
}

/// A fetched object: body plus response metadata
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub content_length: u64,
    pub last_modified: Option<String>,
    pub e_tag: Option<String>,
    /// User metadata (`x-amz-meta-*`) with the header prefix removed
    pub metadata: BTreeMap<String, String>,
    pub body: Bytes,
}

/// Object storage backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all buckets visible to the configured credentials
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>>;

    /// List every object in `bucket` whose key starts with `prefix`
    async fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectSummary>>;

    /// Fetch an object with its body
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject>;

    /// Store an object, replacing any existing one with the same key
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Delete an object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Generate a time-limited GET link for an object
    async fn presign_get(&self, bucket: &str, key: &str, expiry: Duration) -> Result<String>;
}

/// Validate a presign expiry and convert it to whole seconds
pub(crate) fn presign_seconds(expiry: Duration) -> Result<u32> {
    if expiry.as_secs() == 0 || expiry > MAX_PRESIGN_EXPIRY {
        return Err(Error::InvalidRequest(format!(
            "link expiry must be between 1 and {} seconds, got {}",
            MAX_PRESIGN_EXPIRY.as_secs(),
            expiry.as_secs()
        )));
    }
    // Bounded by MAX_PRESIGN_EXPIRY above
    Ok(expiry.as_secs() as u32)
}

/// Split `x-amz-meta-*` headers out of a response header map
pub(crate) fn user_metadata<'a, I>(headers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    headers
        .into_iter()
        .filter_map(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            lower
                .strip_prefix("x-amz-meta-")
                .map(|meta| (meta.to_string(), value.clone()))
        })
        .collect()
}
