use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

use crate::api::{TimelineResponse, UserLookupResponse};
use crate::error::{FetchError, LookupError};

const API_BASE: &str = "https://api.twitter.com/2";

/// Rate-limit state read fresh from every response's headers. Never cached
/// across requests; a prior page's values may already be stale.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimit {
    pub remaining: Option<i64>,
    pub reset_epoch: Option<u64>,
}

impl RateLimit {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            remaining: parse_header(headers, "x-rate-limit-remaining"),
            reset_epoch: parse_header(headers, "x-rate-limit-reset"),
        }
    }
}

fn parse_header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Outcome of one page request that got an HTTP response back.
#[derive(Debug)]
pub enum PageStatus {
    Page {
        body: TimelineResponse,
        rate: RateLimit,
    },
    /// HTTP 429; `reset_epoch` is 0 when the header was missing.
    RateLimited { reset_epoch: u64 },
}

/// Source of timeline pages. The collector only talks to this trait, so
/// tests script page sequences without a network.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    async fn fetch_page(
        &self,
        user_id: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<PageStatus, FetchError>;
}

pub struct TwitterClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TwitterClient {
    pub fn new(token: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("tweetdump/0.1 (+https://github.com/aatrey56/tweetdump)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: API_BASE.to_string(),
            token,
        }
    }

    /// Map a handle to the account's opaque stable id.
    ///
    /// One authoritative call: any non-success status is reported as
    /// `NotFound` with the status attached, never retried.
    pub async fn resolve_user(&self, handle: &str) -> Result<String, LookupError> {
        let url = format!("{}/users/by/username/{}", self.base_url, handle);
        log::debug!("GET {}", url);

        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::NotFound {
                status: status.as_u16(),
            });
        }

        let body: UserLookupResponse = response.json().await?;
        Ok(body.data.id)
    }
}

/// Query parameters for one timeline page: field/expansion config to get
/// reference metadata, replies excluded, cursor passed back verbatim.
fn timeline_query(page_size: u32, cursor: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("max_results", page_size.to_string()),
        (
            "tweet.fields",
            "created_at,referenced_tweets,author_id".to_string(),
        ),
        (
            "expansions",
            "referenced_tweets.id,referenced_tweets.id.author_id".to_string(),
        ),
        ("exclude", "replies".to_string()),
    ];
    if let Some(cursor) = cursor {
        query.push(("pagination_token", cursor.to_string()));
    }
    query
}

#[async_trait]
impl TimelineSource for TwitterClient {
    async fn fetch_page(
        &self,
        user_id: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<PageStatus, FetchError> {
        let url = format!("{}/users/{}/tweets", self.base_url, user_id);
        log::debug!("GET {} cursor={:?}", url, cursor);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&timeline_query(page_size, cursor))
            .send()
            .await?;

        let rate = RateLimit::from_headers(response.headers());
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            log::debug!("rate limited, reset at {:?}", rate.reset_epoch);
            return Ok(PageStatus::RateLimited {
                reset_epoch: rate.reset_epoch.unwrap_or(0),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: TimelineResponse = response.json().await?;
        Ok(PageStatus::Page { body, rate })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_rate_limit_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("42"));
        headers.insert(
            "x-rate-limit-reset",
            HeaderValue::from_static("1700000000"),
        );

        let rate = RateLimit::from_headers(&headers);
        assert_eq!(rate.remaining, Some(42));
        assert_eq!(rate.reset_epoch, Some(1_700_000_000));
    }

    #[test]
    fn test_rate_limit_missing_headers() {
        let rate = RateLimit::from_headers(&HeaderMap::new());
        assert_eq!(rate.remaining, None);
        assert_eq!(rate.reset_epoch, None);
    }

    #[test]
    fn test_rate_limit_unparseable_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("soon"));
        let rate = RateLimit::from_headers(&headers);
        assert_eq!(rate.remaining, None);
    }

    #[test]
    fn test_timeline_query_first_page_has_no_cursor() {
        let query = timeline_query(100, None);
        assert!(query.iter().any(|(k, v)| *k == "max_results" && v == "100"));
        assert!(query.iter().any(|(k, v)| *k == "exclude" && v == "replies"));
        assert!(query
            .iter()
            .any(|(k, v)| *k == "expansions" && v.contains("referenced_tweets.id")));
        assert!(!query.iter().any(|(k, _)| *k == "pagination_token"));
    }

    #[test]
    fn test_timeline_query_passes_cursor_verbatim() {
        let query = timeline_query(50, Some("7140dibdnow9c7btw482nlrxkxngrh3ovmg"));
        assert!(query
            .iter()
            .any(|(k, v)| *k == "pagination_token" && v == "7140dibdnow9c7btw482nlrxkxngrh3ovmg"));
    }
}
