//! JSON API front-end

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::upload::UploadForm;
use super::AppState;
use crate::error::Result;
use crate::hierarchy::{build_hierarchy, Grouping};
use crate::storage::{BucketSummary, ObjectSummary};

pub(super) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_list_buckets))
        .route("/bucket/:name", get(handle_list_objects))
        .route("/bucket/:name/:key", get(handle_get_object))
        .route("/bucket/:name/:key/link", get(handle_link))
        .route("/delete/:name/:key", get(handle_delete))
        .route("/upload", post(handle_upload))
        .with_state(state)
}

// ============ Request/Response Types ============

/// Bucket list response
#[derive(Debug, Serialize)]
pub struct BucketsResponse {
    pub result: Vec<BucketSummary>,
}

/// Listing query
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub prefix: Option<String>,
}

/// Object listing response
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub name: String,
    pub prefix: Option<String>,
    pub contents: Vec<ObjectSummary>,
    pub folders: Grouping,
}

/// Object response; the body is base64 encoded
#[derive(Debug, Serialize)]
pub struct ObjectResponse {
    pub key: String,
    pub content_type: String,
    pub content_length: u64,
    pub last_modified: Option<String>,
    pub e_tag: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub body: String,
}

/// Result message response
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub result: String,
}

/// Presigned link response
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub url: String,
}

// ============ Handlers ============

async fn handle_list_buckets(State(state): State<Arc<AppState>>) -> Result<Json<BucketsResponse>> {
    let result = state.store.list_buckets().await?;
    Ok(Json(BucketsResponse { result }))
}

async fn handle_list_objects(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>> {
    let prefix = query.prefix.filter(|p| !p.is_empty());
    let contents = state.store.list_objects(&name, prefix.as_deref()).await?;
    let folders = build_hierarchy(prefix.as_deref(), contents.clone());

    Ok(Json(ListResponse {
        name,
        prefix,
        contents,
        folders,
    }))
}

async fn handle_get_object(
    State(state): State<Arc<AppState>>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<ObjectResponse>> {
    let object = state.store.get_object(&name, &key).await?;

    Ok(Json(ObjectResponse {
        key: object.key,
        content_type: object.content_type,
        content_length: object.content_length,
        last_modified: object.last_modified,
        e_tag: object.e_tag,
        metadata: object.metadata,
        body: base64::engine::general_purpose::STANDARD.encode(&object.body),
    }))
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<ResultResponse>> {
    state.store.delete_object(&name, &key).await?;
    tracing::info!("Deleted {} from bucket {}", key, name);

    Ok(Json(ResultResponse {
        result: format!("{} was successfully deleted from bucket {}", key, name),
    }))
}

async fn handle_link(
    State(state): State<Arc<AppState>>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<LinkResponse>> {
    let url = state
        .store
        .presign_get(&name, &key, state.links.link_expiry())
        .await?;
    Ok(Json(LinkResponse { url }))
}

async fn handle_upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Result<String> {
    let form = UploadForm::read(multipart, "file").await?;
    let bucket = form.field("bucket")?.to_string();
    form.store_all(state.store.as_ref(), &bucket).await?;

    Ok(format!("File uploaded to bucket {}", bucket))
}
