//! Response shapes for the two Twitter v2 endpoints this tool consumes.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct UserLookupResponse {
    pub data: ApiUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: String,
    pub name: String,
    pub username: String,
}

/// One page of `/users/{id}/tweets`.
///
/// `data` is absent (not just empty) when the timeline is exhausted, and
/// `meta.next_token` disappears on the last page, so both stay `Option`.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineResponse {
    pub data: Option<Vec<ApiTweet>>,
    pub includes: Option<Includes>,
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTweet {
    pub id: String,
    pub text: String,
    pub created_at: String,
    #[serde(default)]
    pub referenced_tweets: Vec<TweetReference>,
    pub author_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetReference {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

/// Side-loaded expansion payload: full objects for tweets referenced by the
/// page's main items.
#[derive(Debug, Clone, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub tweets: Vec<IncludedTweet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncludedTweet {
    pub id: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub next_token: Option<String>,
    pub result_count: Option<i64>,
    pub newest_id: Option<String>,
    pub oldest_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_page_with_references() {
        let body = r#"{
            "data": [
                {"id": "1", "text": "hello", "created_at": "2024-01-02T03:04:05.000Z"},
                {"id": "2", "text": "RT @x: hi", "created_at": "2024-01-02T03:05:05.000Z",
                 "referenced_tweets": [{"type": "retweeted", "id": "99"}]}
            ],
            "includes": {"tweets": [{"id": "99", "text": "hi", "created_at": "2024-01-01T00:00:00.000Z"}]},
            "meta": {"next_token": "abc", "result_count": 2, "newest_id": "2", "oldest_id": "1"}
        }"#;
        let page: TimelineResponse = serde_json::from_str(body).unwrap();
        let data = page.data.unwrap();
        assert_eq!(data.len(), 2);
        assert!(data[0].referenced_tweets.is_empty());
        assert_eq!(data[1].referenced_tweets[0].kind, "retweeted");
        assert_eq!(data[1].referenced_tweets[0].id, "99");
        assert_eq!(page.includes.unwrap().tweets[0].id, "99");
        assert_eq!(page.meta.unwrap().next_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_timeline_page_without_data() {
        let body = r#"{"meta": {"result_count": 0}}"#;
        let page: TimelineResponse = serde_json::from_str(body).unwrap();
        assert!(page.data.is_none());
        assert!(page.includes.is_none());
        assert!(page.meta.unwrap().next_token.is_none());
    }

    #[test]
    fn test_user_lookup() {
        let body = r#"{"data": {"id": "12345", "name": "Some User", "username": "someuser"}}"#;
        let user: UserLookupResponse = serde_json::from_str(body).unwrap();
        assert_eq!(user.data.id, "12345");
        assert_eq!(user.data.username, "someuser");
    }
}
