//! Multipart upload handling
//!
//! Forms are read completely before anything is stored, so the bucket field
//! may appear before or after the file parts.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::storage::ObjectStore;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file part of an upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// A fully read upload form
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl UploadForm {
    /// Read every part of `multipart`. Parts named `file_field` are kept as
    /// files, everything else as text fields.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::InvalidRequest(format!("malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == file_field {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidRequest(format!("failed to read {}: {}", file_name, e)))?;

                // Browsers send an empty, unnamed part when no file was picked
                if file_name.is_empty() {
                    continue;
                }

                form.files.push(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::InvalidRequest(format!("failed to read field {}: {}", name, e)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Non-empty text field value
    pub fn field(&self, name: &str) -> Result<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::InvalidRequest(format!("missing form field '{}'", name)))
    }

    /// Store every file under its original file name in `bucket`
    pub async fn store_all(self, store: &dyn ObjectStore, bucket: &str) -> Result<usize> {
        if self.files.is_empty() {
            return Err(Error::InvalidRequest("no files in upload".into()));
        }

        let count = self.files.len();
        for file in self.files {
            store
                .put_object(bucket, &file.file_name, file.data, &file.content_type)
                .await?;
            tracing::info!("Uploaded {} to bucket {}", file.file_name, bucket);
        }

        Ok(count)
    }
}
