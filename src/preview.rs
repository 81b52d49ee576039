//! Preview classification for the file page

use std::path::Path;

/// How an object's body is previewed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview {
    /// Rendered inline as escaped text
    Text,
    /// Rendered as an `<img>` with a data URI
    Image,
}

const TEXT_EXTENSIONS: &[&str] = &["txt", "dart", "js"];

/// Pick the preview kind from the key's extension
pub fn classify_preview(key: &str) -> Preview {
    let is_text = Path::new(key)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t)))
        .unwrap_or(false);

    if is_text {
        Preview::Text
    } else {
        Preview::Image
    }
}
