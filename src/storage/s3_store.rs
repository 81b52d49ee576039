//! S3-compatible backend built on `rust-s3`
//!
//! A `Bucket` handle is built per call from the injected region and
//! credentials; handles are cheap and hold no connection state of their own.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use s3::Bucket;
use tracing::debug;

use super::{presign_seconds, user_metadata, BucketSummary, ObjectStore, ObjectSummary, StoredObject};
use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// Object store talking to an S3-compatible endpoint
#[derive(Clone)]
pub struct S3Store {
    region: Region,
    credentials: Credentials,
    path_style: bool,
}

impl S3Store {
    /// Build a store from the storage section of the configuration
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| Error::Config(format!("invalid storage region {}: {}", config.region, e)))?,
        };

        // Keys come from config or its env overrides only; no profile lookup
        let credentials = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                Credentials::new(Some(access_key.as_str()), Some(secret_key.as_str()), None, None, None)?
            }
            _ => Credentials::anonymous()?,
        };

        Ok(Self {
            region,
            credentials,
            path_style: config.path_style,
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())?;
        if self.path_style {
            Ok(bucket.with_path_style())
        } else {
            Ok(bucket)
        }
    }
}

/// Map a failed S3 call on `bucket` (and `key`, for object calls) to a storage error
fn s3_error(err: S3Error, bucket: &str, key: Option<&str>) -> Error {
    match err {
        S3Error::HttpFailWithBody(404, body) => match key {
            Some(key) if !body.contains("<Code>NoSuchBucket</Code>") => Error::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => Error::BucketNotFound(bucket.to_string()),
        },
        S3Error::HttpFailWithBody(code, body) => Error::Storage(format!(
            "{} on {}/{}: {}",
            code,
            bucket,
            key.unwrap_or_default(),
            body
        )),
        other => other.into(),
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>> {
        let response = Bucket::list_buckets(self.region.clone(), self.credentials.clone()).await?;
        Ok(response
            .bucket_names()
            .map(|name| BucketSummary {
                name,
                creation_date: None,
            })
            .collect())
    }

    async fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectSummary>> {
        let handle = self.bucket(bucket)?;
        let pages = handle
            .list(prefix.unwrap_or_default().to_string(), None)
            .await
            .map_err(|e| s3_error(e, bucket, None))?;

        let objects: Vec<ObjectSummary> = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| ObjectSummary {
                key: object.key,
                size: object.size,
                last_modified: Some(object.last_modified),
                e_tag: object.e_tag,
                storage_class: object.storage_class,
            })
            .collect();

        debug!("Listed {} objects in {} (prefix {:?})", objects.len(), bucket, prefix);
        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let handle = self.bucket(bucket)?;
        let response = handle
            .get_object(key)
            .await
            .map_err(|e| s3_error(e, bucket, Some(key)))?;

        let headers = response.headers();
        let body = response.bytes().clone();

        Ok(StoredObject {
            key: key.to_string(),
            content_type: headers
                .get("content-type")
                .cloned()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            content_length: body.len() as u64,
            last_modified: headers.get("last-modified").cloned(),
            e_tag: headers.get("etag").cloned(),
            metadata: user_metadata(&headers),
            body,
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        let handle = self.bucket(bucket)?;
        handle
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| s3_error(e, bucket, Some(key)))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let handle = self.bucket(bucket)?;
        handle
            .delete_object(key)
            .await
            .map_err(|e| s3_error(e, bucket, Some(key)))?;
        Ok(())
    }

    async fn presign_get(&self, bucket: &str, key: &str, expiry: Duration) -> Result<String> {
        let seconds = presign_seconds(expiry)?;
        let handle = self.bucket(bucket)?;
        Ok(handle.presign_get(key, seconds, None).await?)
    }
}
