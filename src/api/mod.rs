//! HTTP Front-ends
//!
//! Three front-ends share one set of storage calls and differ only in how
//! they format responses: a JSON API, minimal HTML pages, and an HTML
//! browser with folder view, previews and an uploader.

mod browser;
mod html;
mod json;
mod render;
mod upload;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{ApiConfig, LinkConfig, Variant};
use crate::error::{Error, Result};
use crate::storage::ObjectStore;

pub use render::{html_escape, PageError};
pub use upload::{UploadForm, UploadedFile};

/// Shared application state
pub struct AppState {
    /// Storage backend
    pub store: Arc<dyn ObjectStore>,
    /// Presigned link lifetimes
    pub links: LinkConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, links: LinkConfig) -> Self {
        Self { store, links }
    }
}

/// Build the router for one front-end variant
pub fn router(variant: Variant, state: Arc<AppState>) -> Router {
    match variant {
        Variant::Json => json::router(state),
        Variant::Html => html::router(state),
        Variant::Browser => browser::router(state),
    }
}

/// HTTP API server
pub struct HttpServer {
    config: ApiConfig,
    max_upload_bytes: usize,
    state: Arc<AppState>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: ApiConfig, store: Arc<dyn ObjectStore>, links: LinkConfig) -> Self {
        let max_upload_bytes = config.max_upload_bytes();
        Self {
            config,
            max_upload_bytes,
            state: Arc::new(AppState::new(store, links)),
        }
    }

    /// Get the state for sharing with other components
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Create the router with the configured layers
    pub fn create_router(&self) -> Router {
        let mut app = router(self.config.variant, self.state())
            .layer(DefaultBodyLimit::max(self.max_upload_bytes))
            .layer(TraceLayer::new_for_http());

        if self.config.cors_enabled {
            app = app.layer(CorsLayer::permissive());
        }

        app
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<()> {
        let app = self.create_router();

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address).await?;
        tracing::info!(
            "{} front-end listening on {}",
            self.config.variant,
            self.config.bind_address
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down HTTP server");
}

#[cfg(test)]
pub(crate) mod testing {
    //! Router test helpers

    use std::collections::BTreeMap;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderMap, Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    use super::AppState;
    use crate::config::LinkConfig;
    use crate::storage::MemoryStore;

    pub const BOUNDARY: &str = "----bucketview-test-boundary";

    /// Store with a small photo bucket and an empty bucket
    pub async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let mut meta = BTreeMap::new();
        meta.insert("owner".to_string(), "alice".to_string());

        store
            .insert("photos", "cover.png", &b"\x89PNG"[..], "image/png", meta)
            .await;
        store
            .insert("photos", "2024/beach.jpg", &b"jpeg"[..], "image/jpeg", BTreeMap::new())
            .await;
        store
            .insert("photos", "2024/notes.txt", &b"sunny <day>"[..], "text/plain", BTreeMap::new())
            .await;
        store
            .insert("photos", "2024/raw/img1.dng", &b"dng"[..], "image/x-adobe-dng", BTreeMap::new())
            .await;
        store.create_bucket("empty").await;
        store
    }

    pub fn state(store: Arc<MemoryStore>) -> Arc<AppState> {
        Arc::new(AppState::new(store, LinkConfig::default()))
    }

    pub struct TestResponse {
        pub status: StatusCode,
        pub headers: HeaderMap,
        pub body: String,
    }

    impl TestResponse {
        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap()
        }
    }

    pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn fetch(router: Router, uri: &str) -> TestResponse {
        send(
            router,
            Request::builder().uri(uri).body(Body::empty()).unwrap(),
        )
        .await
    }

    /// Multipart body from text fields and `(field, file name, content type, data)` files
    pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &str, &str)]) -> String {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            ));
        }
        for (name, file_name, content_type, data) in files {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n{}\r\n",
                BOUNDARY, name, file_name, content_type, data
            ));
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        body
    }

    pub async fn post_multipart(router: Router, uri: &str, body: String) -> TestResponse {
        send(
            router,
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}
