//! Minimal HTML front-end
//!
//! Plain pages: bucket list, object list, object preview with its user
//! metadata, and a download link page.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Router,
};
use base64::Engine;

use super::render::{html_escape, list, page, PageError};
use super::AppState;

pub(super) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_buckets))
        .route("/bucket/:name", get(handle_objects))
        .route("/bucket/:name/:key", get(handle_object).delete(handle_delete))
        .route("/bucket/:name/:key/link", get(handle_link))
        .with_state(state)
}

type PageResult = std::result::Result<Html<String>, PageError>;

async fn handle_buckets(State(state): State<Arc<AppState>>) -> PageResult {
    let buckets = state
        .store
        .list_buckets()
        .await
        .map_err(|e| PageError::new("Error listing buckets", e))?;

    let body = format!(
        "<h1>Buckets:</h1>\n{}",
        list(buckets.iter().map(|b| html_escape(&b.name)))
    );
    Ok(page("Buckets", &body))
}

async fn handle_objects(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> PageResult {
    let objects = state
        .store
        .list_objects(&name, None)
        .await
        .map_err(|e| PageError::new(format!("Error listing objects in bucket {}", name), e))?;

    let body = format!(
        "<h1>Objects in bucket {}:</h1>\n{}",
        html_escape(&name),
        list(objects.iter().map(|o| html_escape(&o.key)))
    );
    Ok(page(&name, &body))
}

async fn handle_object(
    State(state): State<Arc<AppState>>,
    Path((name, key)): Path<(String, String)>,
) -> PageResult {
    let object = state.store.get_object(&name, &key).await.map_err(|e| {
        PageError::new(format!("Error getting object {} from bucket {}", key, name), e)
    })?;

    let data = base64::engine::general_purpose::STANDARD.encode(&object.body);
    let properties = list(
        object
            .metadata
            .iter()
            .map(|(k, v)| format!("<b>{}:</b> {}", html_escape(k), html_escape(v))),
    );

    let body = format!(
        "<h1>Object: {}</h1>\n\
         <h2>Preview:</h2>\n\
         <img src=\"data:{};base64,{}\" alt=\"Object preview\" />\n\
         <h2>Properties:</h2>\n\
         {}",
        html_escape(&key),
        html_escape(&object.content_type),
        data,
        properties
    );
    Ok(page(&key, &body))
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path((name, key)): Path<(String, String)>,
) -> std::result::Result<String, PageError> {
    state.store.delete_object(&name, &key).await.map_err(|e| {
        PageError::new(format!("Error deleting object {} from bucket {}", key, name), e)
    })?;
    tracing::info!("Deleted {} from bucket {}", key, name);

    Ok(format!("Object {} was deleted from bucket {}", key, name))
}

async fn handle_link(
    State(state): State<Arc<AppState>>,
    Path((name, key)): Path<(String, String)>,
) -> PageResult {
    let url = state
        .store
        .presign_get(&name, &key, state.links.link_expiry())
        .await
        .map_err(|e| PageError::new(format!("Error creating link for {}", key), e))?;

    let url = html_escape(&url);
    let body = format!(
        "<h1>Object: {}</h1>\n\
         <h2>Download link:</h2>\n\
         <a href=\"{}\">{}</a>",
        html_escape(&key),
        url,
        url
    );
    Ok(page(&key, &body))
}
