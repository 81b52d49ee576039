//! HTML rendering helpers shared by the page-based front-ends

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::error::Error;

/// Escape text for HTML element content and quoted attribute values
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode one path segment (`/` included)
pub fn encode_segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Wrap a body fragment in a complete document
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{}</title>\n\
         </head>\n\
         <body>\n\
         {}\n\
         </body>\n\
         </html>\n",
        html_escape(title),
        body
    ))
}

/// `<ul>` of already-rendered `<li>` contents
pub fn list<I>(items: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut html = String::from("<ul>\n");
    for item in items {
        html.push_str("  <li>");
        html.push_str(&item);
        html.push_str("</li>\n");
    }
    html.push_str("</ul>");
    html
}

/// Error reported by page handlers as `<context>: <error>` text
#[derive(Debug)]
pub struct PageError {
    context: String,
    error: Error,
}

impl PageError {
    pub fn new(context: impl Into<String>, error: Error) -> Self {
        Self {
            context: context.into(),
            error,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!("{}: {}", self.context, self.error);
        let status: StatusCode = self.error.status_code();
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{}: {}", self.context, self.error),
        )
            .into_response()
    }
}
