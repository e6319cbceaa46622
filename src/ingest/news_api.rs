//! NewsAPI client for live regional weather news.
//!
//! Live news is optional. With the demo key no request is made and the
//! caller falls back to the built-in catalog.

use rand::Rng;
use serde::Deserialize;

use crate::config::DEMO_NEWS_KEY;
use crate::logging::{self, DataSource};
use crate::model::{AudienceTarget, WxError};

pub const NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";
pub const PAGE_SIZE: u32 = 10;

/// Search terms; one is picked per request.
pub const SEARCH_QUERIES: [&str; 3] = [
    "Philippines weather news",
    "weather forecast Philippines",
    "climate Philippines",
];

const NO_DESCRIPTION: &str = "No description available";
const NO_HEADLINE_DESCRIPTION: &str = "Breaking weather news";

const HEADLINES_COUNTRY: &str = "ph";
const HEADLINE_ID_PREFIX: &str = "ph-headline";
const HEADLINE_CATEGORY: &str = "news";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    source: Option<ArticleSource>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// One live article, shaped for the news panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveNewsItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: String,
    /// Audience id for regional searches, `"news"` for headlines.
    pub category: String,
}

// ---------------------------------------------------------------------------
// Request building and parsing
// ---------------------------------------------------------------------------

/// Regional search against the `everything` endpoint.
pub fn everything_request(
    client: &reqwest::blocking::Client,
    query: &str,
    api_key: &str,
) -> reqwest::blocking::RequestBuilder {
    let page_size = PAGE_SIZE.to_string();
    client
        .get(format!("{}/everything", NEWS_API_BASE_URL))
        .query(&[
            ("q", query),
            ("sortBy", "publishedAt"),
            ("language", "en"),
            ("pageSize", page_size.as_str()),
            ("apiKey", api_key),
        ])
}

/// Country headlines from the `top-headlines` endpoint.
pub fn headlines_request(
    client: &reqwest::blocking::Client,
    api_key: &str,
) -> reqwest::blocking::RequestBuilder {
    let page_size = PAGE_SIZE.to_string();
    client
        .get(format!("{}/top-headlines", NEWS_API_BASE_URL))
        .query(&[
            ("country", HEADLINES_COUNTRY),
            ("category", "weather"),
            ("pageSize", page_size.as_str()),
            ("apiKey", api_key),
        ])
}

/// Article list to items. Articles without a title or URL are skipped;
/// ids keep the article's position in the response.
fn parse_articles(
    body: &str,
    id_prefix: &str,
    category: &str,
    content_fallback: bool,
    no_description: &str,
) -> Result<Vec<LiveNewsItem>, WxError> {
    let response: NewsResponse = serde_json::from_str(body)?;

    let items = response
        .articles
        .into_iter()
        .enumerate()
        .filter_map(|(i, a)| {
            let content = if content_fallback { a.content } else { None };
            Some(LiveNewsItem {
                id: format!("{}-{}", id_prefix, i),
                title: a.title?,
                description: a
                    .description
                    .or(content)
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| no_description.to_string()),
                source: a.source.and_then(|s| s.name).unwrap_or_default(),
                url: a.url?,
                image_url: a.url_to_image,
                published_at: a.published_at.unwrap_or_default(),
                category: category.to_string(),
            })
        })
        .collect();

    Ok(items)
}

/// Maps an `everything` response body to regional news items with ids
/// `{region}-{audience}-{i}`.
pub fn parse_news_response(
    body: &str,
    region: &str,
    audience: AudienceTarget,
) -> Result<Vec<LiveNewsItem>, WxError> {
    parse_articles(
        body,
        &format!("{}-{}", region, audience.id()),
        audience.id(),
        true,
        NO_DESCRIPTION,
    )
}

/// Maps a `top-headlines` response body to items with ids `ph-headline-{i}`.
pub fn parse_headlines_response(body: &str) -> Result<Vec<LiveNewsItem>, WxError> {
    parse_articles(
        body,
        HEADLINE_ID_PREFIX,
        HEADLINE_CATEGORY,
        false,
        NO_HEADLINE_DESCRIPTION,
    )
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetches live news for a region, picking one of `SEARCH_QUERIES` at
/// random.
///
/// Returns an empty list without a request when `region` is empty or the
/// key is the demo key. HTTP and parse failures are logged and returned.
pub fn fetch_live_news(
    client: &reqwest::blocking::Client,
    api_key: &str,
    region: &str,
    audience: AudienceTarget,
) -> Result<Vec<LiveNewsItem>, WxError> {
    let query = SEARCH_QUERIES[rand::rng().random_range(0..SEARCH_QUERIES.len())];
    fetch_live_news_with_query(client, api_key, region, audience, query)
}

pub fn fetch_live_news_with_query(
    client: &reqwest::blocking::Client,
    api_key: &str,
    region: &str,
    audience: AudienceTarget,
    query: &str,
) -> Result<Vec<LiveNewsItem>, WxError> {
    if region.trim().is_empty() {
        return Ok(Vec::new());
    }
    if api_key == DEMO_NEWS_KEY {
        logging::warn(
            DataSource::News,
            Some(region),
            "Using demo API key; set NEWS_API_KEY for live news",
        );
        return Ok(Vec::new());
    }

    let result = send_for_body(everything_request(client, query, api_key))
        .and_then(|body| parse_news_response(&body, region, audience));
    log_outcome(region, "Live news fetch", &result);
    result
}

/// Fetches the country's weather headlines. Same demo-key and failure
/// handling as `fetch_live_news`.
pub fn fetch_headlines(
    client: &reqwest::blocking::Client,
    api_key: &str,
) -> Result<Vec<LiveNewsItem>, WxError> {
    if api_key == DEMO_NEWS_KEY {
        return Ok(Vec::new());
    }

    let result = send_for_body(headlines_request(client, api_key))
        .and_then(|body| parse_headlines_response(&body));
    log_outcome(HEADLINES_COUNTRY, "Headlines fetch", &result);
    result
}

fn send_for_body(request: reqwest::blocking::RequestBuilder) -> Result<String, WxError> {
    let response = request
        .header("Accept", "application/json")
        .send()
        .map_err(|e| WxError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(WxError::Http(response.status().as_u16()));
    }

    response.text().map_err(|e| WxError::Request(e.to_string()))
}

fn log_outcome(subject: &str, operation: &str, result: &Result<Vec<LiveNewsItem>, WxError>) {
    match result {
        Ok(items) => logging::info(
            DataSource::News,
            Some(subject),
            &format!("{}: {} articles", operation, items.len()),
        ),
        Err(e) => logging::log_news_failure(subject, operation, e),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
