use serde::Serialize;

/// How a tweet relates to other tweets, derived from the API's reference
/// metadata. Serializes as `post` / `retweet` / `quote_tweet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TweetKind {
    Post,
    Retweet,
    QuoteTweet,
}

/// One collected tweet as it appears in the output file.
///
/// The referenced fields are only filled for retweets and quote tweets whose
/// referenced tweet showed up in the page's expansion payload, and are
/// omitted from the JSON entirely when absent.
#[derive(Debug, Clone, Serialize)]
pub struct Tweet {
    #[serde(rename = "type")]
    pub kind: TweetKind,
    /// Creation time, the API's ISO-8601 string passed through untouched.
    pub date: String,
    pub content: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&TweetKind::Post).unwrap(), r#""post""#);
        assert_eq!(
            serde_json::to_string(&TweetKind::Retweet).unwrap(),
            r#""retweet""#
        );
        assert_eq!(
            serde_json::to_string(&TweetKind::QuoteTweet).unwrap(),
            r#""quote_tweet""#
        );
    }

    #[test]
    fn test_absent_referenced_fields_are_omitted() {
        let tweet = Tweet {
            kind: TweetKind::Post,
            date: "2024-01-02T03:04:05.000Z".to_string(),
            content: "hello".to_string(),
            id: "1".to_string(),
            referenced_content: None,
            referenced_date: None,
        };
        let json = serde_json::to_string(&tweet).unwrap();
        assert!(!json.contains("referenced_content"));
        assert!(!json.contains("null"));
        assert!(json.contains(r#""type":"post""#));
    }

    #[test]
    fn test_present_referenced_fields_are_written() {
        let tweet = Tweet {
            kind: TweetKind::QuoteTweet,
            date: "2024-01-02T03:04:05.000Z".to_string(),
            content: "look at this".to_string(),
            id: "2".to_string(),
            referenced_content: Some("the original".to_string()),
            referenced_date: Some("2024-01-01T00:00:00.000Z".to_string()),
        };
        let json = serde_json::to_string(&tweet).unwrap();
        assert!(json.contains(r#""referenced_content":"the original""#));
        assert!(json.contains(r#""referenced_date":"2024-01-01T00:00:00.000Z""#));
    }
}
