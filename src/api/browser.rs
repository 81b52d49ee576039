//! Browser front-end
//!
//! Folder-style navigation over flat keys, file previews, share links,
//! deletion and a multi-file uploader. `/buckets` and `/bucket?api` return
//! JSON for scripts driving the uploader.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;

use super::render::{encode_segment, html_escape, list, page, PageError};
use super::upload::UploadForm;
use super::AppState;
use crate::error::Result;
use crate::hierarchy::{build_hierarchy, Grouping};
use crate::preview::{classify_preview, Preview};
use crate::storage::{BucketSummary, StoredObject};

/// Form field carrying the target bucket
const BUCKET_FIELD: &str = "selectBucket";
/// Form field carrying the files
const FILES_FIELD: &str = "uploadFilesInput";

/// Lists the chosen files, posts the form in place and shows the reply
const UPLOAD_SCRIPT: &str = r#"<script>
(() => {
  "use strict";
  const form = document.getElementById("uploadForm");
  const input = document.getElementById("uploadFilesInput");
  const count = document.getElementById("filesListCount");
  const files = document.getElementById("filesList");
  const message = document.getElementById("uploadMessage");
  const reset = document.getElementById("resetForm");

  input.addEventListener("change", () => {
    files.replaceChildren();
    count.textContent = "You have selected " + input.files.length + " file(s) for uploading.";
    for (const file of input.files) {
      const item = document.createElement("li");
      item.textContent = file.name;
      files.appendChild(item);
    }
  });

  form.addEventListener("submit", (e) => {
    e.preventDefault();
    message.hidden = false;
    message.textContent = "Uploading...";
    fetch(form.action, { method: "POST", body: new FormData(form) })
      .then((response) => response.text())
      .then((text) => { message.textContent = text; })
      .catch(() => {
        message.textContent = "An error occurred during upload; check your network connection.";
      })
      .finally(() => { reset.hidden = false; });
  });

  reset.addEventListener("click", () => {
    form.reset();
    files.replaceChildren();
    count.textContent = "";
    message.textContent = "";
    message.hidden = true;
    reset.hidden = true;
  });
})();
</script>"#;

pub(super) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/bucket") }))
        .route("/bucket", get(handle_index))
        .route("/buckets", get(handle_buckets_json))
        .route("/bucket/:bucket", get(handle_bucket_root))
        .route("/bucket/:bucket/:folder", get(handle_folder))
        .route("/file/:bucket/:key", get(handle_file))
        .route("/share/:bucket/:key", get(handle_share))
        .route("/delete/:bucket/:key", post(handle_delete))
        .route("/upload", get(handle_upload_form).post(handle_upload))
        .with_state(state)
}

type PageResult<T = Html<String>> = std::result::Result<T, PageError>;

// ============ Buckets ============

async fn list_buckets(state: &AppState) -> PageResult<Vec<BucketSummary>> {
    state
        .store
        .list_buckets()
        .await
        .map_err(|e| PageError::new("Error listing buckets", e))
}

async fn handle_index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> PageResult<Response> {
    let buckets = list_buckets(&state).await?;

    if query.contains_key("api") {
        return Ok(Json(buckets).into_response());
    }

    let items = buckets.iter().map(|b| {
        format!(
            "<a href=\"/bucket/{}\">{}</a>",
            html_escape(&encode_segment(&b.name)),
            html_escape(&b.name)
        )
    });
    let body = format!(
        "<h1>Buckets</h1>\n{}\n<p><a href=\"/upload\">Upload files</a></p>",
        list(items)
    );
    Ok(page("Buckets", &body).into_response())
}

async fn handle_buckets_json(State(state): State<Arc<AppState>>) -> PageResult<Json<Vec<BucketSummary>>> {
    Ok(Json(list_buckets(&state).await?))
}

// ============ Folder view ============

async fn handle_bucket_root(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> PageResult {
    folder_view(&state, &bucket, None).await
}

async fn handle_folder(
    State(state): State<Arc<AppState>>,
    Path((bucket, folder)): Path<(String, String)>,
) -> PageResult {
    folder_view(&state, &bucket, Some(&folder)).await
}

async fn folder_view(state: &AppState, bucket: &str, folder: Option<&str>) -> PageResult {
    let objects = state
        .store
        .list_objects(bucket, folder)
        .await
        .map_err(|e| PageError::new("Error listing objects", e))?;

    let grouping = build_hierarchy(folder, objects);
    let base = folder.map(|f| format!("{}/", f)).unwrap_or_default();

    Ok(page(
        &format!("{}/{}", bucket, base),
        &render_folder(bucket, &base, &grouping),
    ))
}

/// Render a grouping; `base` is the key prefix (with trailing `/`) the
/// grouping was built under.
fn render_folder(bucket: &str, base: &str, grouping: &Grouping) -> String {
    let bucket_url = encode_segment(bucket);
    let mut html = format!(
        "<h1>{}/{}</h1>\n<p><a href=\"/bucket\">All buckets</a> | <a href=\"/upload\">Upload files</a></p>\n",
        html_escape(bucket),
        html_escape(base)
    );

    html.push_str("<h2>Folders</h2>\n");
    html.push_str(&list(grouping.folders().map(|(label, entries)| {
        format!(
            "<a href=\"/bucket/{}/{}\">{}/</a> ({} objects)",
            bucket_url,
            html_escape(&encode_segment(&format!("{}{}", base, label))),
            html_escape(label),
            entries.len()
        )
    })));

    html.push_str("\n<h2>Files</h2>\n");
    html.push_str(&list(grouping.files().iter().map(|entry| {
        let key = encode_segment(&format!("{}{}", base, entry.key));
        let key = html_escape(&key);
        format!(
            "<a href=\"/file/{bucket}/{key}\">{name}</a> ({size} bytes) \
             <a href=\"/share/{bucket}/{key}\">share</a> \
             <form method=\"post\" action=\"/delete/{bucket}/{key}\" style=\"display:inline\">\
             <button type=\"submit\">delete</button></form>",
            bucket = bucket_url,
            key = key,
            name = html_escape(&entry.key),
            size = entry.size
        )
    })));

    html
}

// ============ Files ============

async fn handle_file(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
) -> PageResult {
    let object = state
        .store
        .get_object(&bucket, &key)
        .await
        .map_err(|e| PageError::new("Error getting object", e))?;

    Ok(page(&key, &render_file(&bucket, &object)))
}

fn render_file(bucket: &str, object: &StoredObject) -> String {
    let preview = match classify_preview(&object.key) {
        Preview::Text => format!(
            "<pre>{}</pre>",
            html_escape(&String::from_utf8_lossy(&object.body))
        ),
        Preview::Image => format!(
            "<img src=\"data:{};base64,{}\" alt=\"{}\" />",
            html_escape(&object.content_type),
            base64::engine::general_purpose::STANDARD.encode(&object.body),
            html_escape(&object.key)
        ),
    };

    let mut properties = vec![
        format!("<b>Content-Type:</b> {}", html_escape(&object.content_type)),
        format!("<b>Size:</b> {} bytes", object.content_length),
    ];
    if let Some(modified) = &object.last_modified {
        properties.push(format!("<b>Last-Modified:</b> {}", html_escape(modified)));
    }
    properties.extend(
        object
            .metadata
            .iter()
            .map(|(k, v)| format!("<b>{}:</b> {}", html_escape(k), html_escape(v))),
    );

    let bucket_url = encode_segment(bucket);
    let key_url = html_escape(&encode_segment(&object.key));
    format!(
        "<h1>{key}</h1>\n\
         <p><a href=\"/bucket/{bucket}\">Back to {bucket_name}</a> | \
         <a href=\"/share/{bucket}/{key_url}\">share</a></p>\n\
         <h2>Preview</h2>\n{preview}\n\
         <h2>Properties</h2>\n{properties}\n\
         <form method=\"post\" action=\"/delete/{bucket}/{key_url}\">\
         <button type=\"submit\">Delete</button></form>",
        key = html_escape(&object.key),
        bucket = bucket_url,
        bucket_name = html_escape(bucket),
        key_url = key_url,
        preview = preview,
        properties = list(properties)
    )
}

async fn handle_share(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
) -> PageResult<String> {
    state
        .store
        .presign_get(&bucket, &key, state.links.share_expiry())
        .await
        .map_err(|e| PageError::new("Error getting object", e))
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
) -> PageResult<Redirect> {
    state
        .store
        .delete_object(&bucket, &key)
        .await
        .map_err(|e| PageError::new("Error deleting object", e))?;
    tracing::info!("Deleted {} from bucket {}", key, bucket);

    Ok(Redirect::to(&parent_folder_url(&bucket, &key)))
}

/// Folder page holding `key`
fn parent_folder_url(bucket: &str, key: &str) -> String {
    match key.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => format!(
            "/bucket/{}/{}",
            encode_segment(bucket),
            encode_segment(parent)
        ),
        _ => format!("/bucket/{}", encode_segment(bucket)),
    }
}

// ============ Upload ============

async fn handle_upload_form(State(state): State<Arc<AppState>>) -> PageResult {
    let buckets = list_buckets(&state).await?;

    let options: String = buckets
        .iter()
        .map(|b| {
            let name = html_escape(&b.name);
            format!("    <option value=\"{}\">{}</option>\n", name, name)
        })
        .collect();

    let body = format!(
        "<h1>Upload files</h1>\n\
         <form id=\"uploadForm\" method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n\
         <label for=\"{bucket_field}\">Bucket</label>\n\
         <select id=\"{bucket_field}\" name=\"{bucket_field}\">\n{options}</select>\n\
         <input type=\"file\" id=\"{files_field}\" name=\"{files_field}\" multiple />\n\
         <button type=\"submit\" id=\"submitButton\">Upload</button>\n\
         </form>\n\
         <p id=\"filesListCount\"></p>\n\
         <ul id=\"filesList\"></ul>\n\
         <p id=\"uploadMessage\" hidden></p>\n\
         <button type=\"button\" id=\"resetForm\" hidden>Upload more files</button>\n\
         <p><a href=\"/bucket\">All buckets</a></p>\n\
         {script}",
        bucket_field = BUCKET_FIELD,
        files_field = FILES_FIELD,
        options = options,
        script = UPLOAD_SCRIPT
    );
    Ok(page("Upload files", &body))
}

async fn handle_upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> PageResult<Response> {
    store_upload(&state, multipart)
        .await
        .map_err(|e| PageError::new("Error uploading files", e))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "File(s) uploaded successfully",
    )
        .into_response())
}

async fn store_upload(state: &AppState, multipart: Multipart) -> Result<usize> {
    let form = UploadForm::read(multipart, FILES_FIELD).await?;
    let bucket = form.field(BUCKET_FIELD)?.to_string();
    form.store_all(state.store.as_ref(), &bucket).await
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use crate::storage::ObjectStore;

    #[tokio::test]
    async fn test_root_redirects() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/").await;

        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.headers.get("location").unwrap(), "/bucket");
    }

    #[tokio::test]
    async fn test_index_html_and_api() {
        let store = seeded_store().await;

        let response = fetch(router(state(store.clone())), "/bucket").await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("<a href=\"/bucket/photos\">photos</a>"));

        let response = fetch(router(state(store.clone())), "/bucket?api=true").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()[1]["name"], "photos");

        let response = fetch(router(state(store)), "/buckets").await;
        assert_eq!(response.json().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bucket_root_view() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/bucket/photos").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response
            .body
            .contains("<a href=\"/bucket/photos/2024\">2024/</a> (3 objects)"));
        assert!(response
            .body
            .contains("<a href=\"/file/photos/cover.png\">cover.png</a> (4 bytes)"));
    }

    #[tokio::test]
    async fn test_folder_view() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/bucket/photos/2024").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response
            .body
            .contains("<a href=\"/file/photos/2024%2Fbeach.jpg\">beach.jpg</a>"));
        assert!(response
            .body
            .contains("<a href=\"/share/photos/2024%2Fnotes.txt\">share</a>"));
        assert!(response
            .body
            .contains("<a href=\"/bucket/photos/2024%2Fraw\">raw/</a> (1 objects)"));
        assert!(!response.body.contains("cover.png"));
    }

    #[tokio::test]
    async fn test_nested_folder_view() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/bucket/photos/2024%2Fraw").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response
            .body
            .contains("<a href=\"/file/photos/2024%2Fraw%2Fimg1.dng\">img1.dng</a>"));
    }

    #[tokio::test]
    async fn test_folder_view_missing_bucket() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/bucket/nope").await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.body.starts_with("Error listing objects: "));
    }

    #[tokio::test]
    async fn test_text_preview_is_escaped() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/file/photos/2024%2Fnotes.txt").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("<pre>sunny &lt;day&gt;</pre>"));
    }

    #[tokio::test]
    async fn test_image_preview() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/file/photos/cover.png").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response
            .body
            .contains("<img src=\"data:image/png;base64,iVBORw==\""));
        assert!(response.body.contains("<b>owner:</b> alice"));
    }

    #[tokio::test]
    async fn test_share_uses_share_expiry() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/share/photos/2024%2Fbeach.jpg").await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body,
            "memory://photos/2024%2Fbeach.jpg?expires=86400"
        );
    }

    #[tokio::test]
    async fn test_delete_redirects_to_parent() {
        let store = seeded_store().await;
        let response = send(
            router(state(store.clone())),
            Request::builder()
                .method("POST")
                .uri("/delete/photos/2024%2Fraw%2Fimg1.dng")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers.get("location").unwrap(),
            "/bucket/photos/2024%2Fraw"
        );
        assert!(!store.contains("photos", "2024/raw/img1.dng").await);

        let response = send(
            router(state(store.clone())),
            Request::builder()
                .method("POST")
                .uri("/delete/photos/cover.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.headers.get("location").unwrap(), "/bucket/photos");
    }

    #[tokio::test]
    async fn test_upload_form_lists_buckets() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/upload").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("<option value=\"photos\">photos</option>"));
        assert!(response.body.contains("name=\"uploadFilesInput\" multiple"));
    }

    #[tokio::test]
    async fn test_upload_form_submits_in_place() {
        let app = router(state(seeded_store().await));
        let response = fetch(app, "/upload").await;

        assert!(response.body.contains("<ul id=\"filesList\"></ul>"));
        assert!(response.body.contains("<p id=\"uploadMessage\" hidden></p>"));
        assert!(response.body.contains("id=\"resetForm\" hidden"));
        assert!(response.body.contains("message.textContent = \"Uploading...\";"));
        assert!(response.body.contains("fetch(form.action, { method: \"POST\", body: new FormData(form) })"));
        assert!(response.body.trim_end().ends_with("</script>\n</body>\n</html>"));
    }

    #[tokio::test]
    async fn test_upload_multiple_files() {
        let store = seeded_store().await;
        let body = multipart_body(
            &[],
            &[
                ("uploadFilesInput", "one.txt", "text/plain", "1"),
                ("uploadFilesInput", "two.txt", "text/plain", "22"),
            ],
        );
        // Bucket field after the files
        let body = body.replace(
            &format!("--{}--\r\n", BOUNDARY),
            &format!(
                "--{}\r\nContent-Disposition: form-data; name=\"selectBucket\"\r\n\r\nempty\r\n--{}--\r\n",
                BOUNDARY, BOUNDARY
            ),
        );

        let response = post_multipart(router(state(store.clone())), "/upload", body).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "File(s) uploaded successfully");
        assert!(store.contains("empty", "one.txt").await);
        assert_eq!(store.get_object("empty", "two.txt").await.unwrap().content_length, 2);
    }

    #[tokio::test]
    async fn test_upload_without_files() {
        let app = router(state(seeded_store().await));
        let body = multipart_body(&[("selectBucket", "empty")], &[]);
        let response = post_multipart(app, "/upload", body).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body.starts_with("Error uploading files: "));
    }
}
