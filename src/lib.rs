//! BucketView - Object Storage Browser
//!
//! Thin HTTP front-ends over an S3-compatible object store: list buckets,
//! browse objects as folders, preview, share, delete and upload.
//!
//! # Architecture
//!
//! Every operation is a single call through the [`storage::ObjectStore`]
//! trait. The one piece of real logic is [`hierarchy::build_hierarchy`],
//! which turns a flat key listing into a files-and-subfolders view.
//!
//! # Front-ends
//!
//! - `json`: JSON API
//! - `html`: minimal server-rendered pages
//! - `browser`: folder browser with previews, share links and an uploader

pub mod api;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod preview;
pub mod storage;

pub use config::BucketViewConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{AppState, HttpServer};
    pub use crate::config::{BucketViewConfig, Variant};
    pub use crate::error::{Error, Result};
    pub use crate::hierarchy::{build_hierarchy, Grouping};
    pub use crate::preview::{classify_preview, Preview};
    pub use crate::storage::{MemoryStore, ObjectStore, ObjectSummary, S3Store};
}
