//! DuckDuckGo web search for the agent.
//!
//! Scrapes the lite HTML endpoint, which needs no API key, and returns
//! structured [`SearchResult`] objects serialized as a JSON string. Requests
//! are spaced by a minimum interval to avoid being blocked upstream.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::json;

const DDG_LITE_URL: &str = "https://lite.duckduckgo.com/lite/";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

/// Minimum spacing between two DuckDuckGo requests.
pub const DDG_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// A single search result with title, URL, and snippet.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

static DDG_LAST_REQUEST: Mutex<Option<Instant>> = Mutex::new(None);

/// Search DuckDuckGo, waiting first if the previous request was too recent.
///
/// Returns a JSON array of at most `count` results, or a JSON error object.
pub async fn search(query: &str, count: usize) -> String {
    enforce_rate_limit(&DDG_LAST_REQUEST, DDG_MIN_INTERVAL).await;
    search_duckduckgo(query, count).await
}

async fn search_duckduckgo(query: &str, count: usize) -> String {
    let client = match reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(15))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return json!({"error": format!("web_search: failed to build client: {e}")}).to_string();
        }
    };

    let resp = match client.get(DDG_LITE_URL).query(&[("q", query)]).send().await {
        Ok(r) => r,
        Err(e) => {
            return json!({"error": format!("web_search: DuckDuckGo request failed: {e}")})
                .to_string();
        }
    };

    if !resp.status().is_success() {
        return json!({"error": format!("web_search: DuckDuckGo HTTP {}", resp.status())})
            .to_string();
    }

    let html = match resp.text().await {
        Ok(t) => t,
        Err(e) => {
            return json!({"error": format!("web_search: failed to read response: {e}")})
                .to_string();
        }
    };

    let results = parse_ddg_lite_html(&html, count);
    tracing::debug!(query, results = results.len(), "Web search finished");

    serde_json::to_string(&results).unwrap_or_else(|e| {
        json!({"error": format!("web_search: failed to serialize results: {e}")}).to_string()
    })
}

/// Extract results from the DuckDuckGo lite page.
///
/// The page is a table where each `a.result-link` row is followed by a
/// `td.result-snippet` row, so links and snippets pair up by position.
/// Links with no title or no target are dropped.
fn parse_ddg_lite_html(html: &str, count: usize) -> Vec<SearchResult> {
    use scraper::{ElementRef, Html, Selector};

    let (Ok(links), Ok(snippets)) = (
        Selector::parse("a.result-link"),
        Selector::parse("td.result-snippet"),
    ) else {
        return Vec::new();
    };

    let text_of = |el: ElementRef| el.text().collect::<String>().trim().to_string();

    let document = Html::parse_document(html);
    let mut snippet_texts = document.select(&snippets).map(text_of);

    let mut results = Vec::new();
    for link in document.select(&links) {
        let snippet = snippet_texts.next().unwrap_or_default();
        let title = text_of(link);
        let url = link.value().attr("href").map(str::trim).unwrap_or_default();
        if title.is_empty() || url.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title,
            url: url.to_string(),
            snippet,
        });
        if results.len() == count {
            break;
        }
    }
    results
}

/// Wait if necessary to enforce a minimum interval between requests,
/// then update the last-request timestamp.
async fn enforce_rate_limit(tracker: &Mutex<Option<Instant>>, min_interval: Duration) {
    let remaining = {
        let guard = tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.and_then(|last| min_interval.checked_sub(last.elapsed()))
    };

    if let Some(wait) = remaining {
        tokio::time::sleep(wait).await;
    }

    let mut guard = tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(Instant::now());
}
