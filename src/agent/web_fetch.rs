//! HTTP GET for the `requests_get` tool.
//!
//! HTML pages are converted to markdown with page chrome (header, footer,
//! navigation, scripts, styles) removed. JSON and plain text are returned
//! as-is. Errors are returned as JSON strings, never `Err`.

use std::time::Duration;

use serde_json::json;

/// Character limit applied to fetched content before it reaches the model.
pub const MAX_FETCH_CHARS: usize = 20_000;

const SKIPPED_TAGS: [&str; 6] = ["header", "footer", "nav", "script", "style", "noscript"];

/// Fetch a URL and return its content, truncated to `max_length` characters.
pub async fn fetch_url(url: &str, max_length: Option<usize>) -> String {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(concat!("Mozilla/5.0 (compatible; KubeWizard/", env!("CARGO_PKG_VERSION"), ")"))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return json!({"error": format!("requests_get: failed to build client: {e}")})
                .to_string();
        }
    };

    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => return json!({"error": format!("requests_get: {e}")}).to_string(),
    };

    let status = response.status();
    if !status.is_success() {
        return json!({"error": format!("requests_get: HTTP {status}")}).to_string();
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = match response.text().await {
        Ok(t) => t,
        Err(e) => {
            return json!({"error": format!("requests_get: failed to read body: {e}")})
                .to_string();
        }
    };

    let output = if content_type.contains("text/html") {
        html_to_markdown(&body)
    } else {
        body
    };

    maybe_truncate(&output, max_length)
}

/// Convert an HTML document to markdown, dropping page chrome. Falls back to
/// the raw HTML if conversion fails.
pub fn html_to_markdown(html: &str) -> String {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();
    match converter.convert(html) {
        Ok(markdown) => markdown,
        Err(e) => {
            tracing::debug!("HTML conversion failed, returning raw body: {}", e);
            html.to_string()
        }
    }
}

/// Truncate content to `max_length` characters if specified, appending a
/// summary of where it was cut.
fn maybe_truncate(content: &str, max_length: Option<usize>) -> String {
    let Some(limit) = max_length else {
        return content.to_string();
    };
    match content.char_indices().nth(limit) {
        Some((cut, _)) => format!(
            "{}...\n[truncated at {} chars, total {}]",
            &content[..cut],
            limit,
            content.chars().count()
        ),
        None => content.to_string(),
    }
}
