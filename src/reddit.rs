use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Local, TimeZone};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::permalink::CommentKey;
use crate::storage::{CommentRecord, Status};

pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
/// Stored in place of a body the upstream payload does not carry.
pub const BODY_PLACEHOLDER: &str = "No content";

// Permalinks come back host-relative; display wants an absolute URL.
const PERMALINK_ORIGIN: &str = "https://www.reddit.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

/// `Status` and `NotFound` together are the "comment unavailable" condition:
/// callers flip an existing record to Inactive instead of failing hard.
/// `Transport` and `Payload` are genuine errors and propagate.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("reddit returned status {0}")]
    Status(StatusCode),
    #[error("comment {0} not in the top-level listing")]
    NotFound(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected comments payload: {0}")]
    Payload(&'static str),
}

impl FetchError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchError::Status(_) | FetchError::NotFound(_))
    }
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("reddit client user agent required");
        }

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url).with_context(|| format!("reddit: invalid base url {base_url}"))?;

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// One unauthenticated GET against the post's public comment listing,
    /// then a single-level scan for the comment id.
    pub fn fetch_comment(&self, key: &CommentKey) -> Result<CommentRecord, FetchError> {
        let url = format!(
            "{}/r/{}/comments/{}.json",
            self.base_url, key.subreddit, key.post_id
        );
        let resp = self
            .http
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let payload: Vec<Value> = resp.json()?;
        let node = extract_comment(&payload, &key.comment_id)?;
        Ok(normalize(key, node))
    }
}

/// Scans the comment listing's direct children only. Replies are not
/// descended into, so a comment nested in a thread reports as not found
/// even though it exists upstream. Documented contract, not fixed here.
fn extract_comment(payload: &[Value], comment_id: &str) -> Result<CommentNode, FetchError> {
    if payload.len() < 2 {
        return Err(FetchError::Payload("expected [post, comments] listing pair"));
    }
    let listing: ListingEnvelope<CommentNode> = serde_json::from_value(payload[1].clone())
        .map_err(|_| FetchError::Payload("malformed comment listing"))?;
    listing
        .data
        .children
        .into_iter()
        .map(|thing| thing.data)
        .find(|node| node.id == comment_id)
        .ok_or_else(|| FetchError::NotFound(comment_id.to_string()))
}

fn normalize(key: &CommentKey, node: CommentNode) -> CommentRecord {
    let body = match node.body {
        Some(body) if !body.is_empty() => body,
        _ => BODY_PLACEHOLDER.to_string(),
    };
    CommentRecord {
        id: node.id.clone(),
        subreddit: key.subreddit.clone(),
        post_id: key.post_id.clone(),
        comment_id: node.id,
        author: node.author,
        body,
        created_utc: format_created(node.created_utc),
        permalink: absolutize(&node.permalink),
        ups: node.ups,
        downs: node.downs,
        status: Status::Active,
    }
}

// Formatted once at fetch time; never recomputed on later reads.
fn format_created(epoch: f64) -> String {
    Local
        .timestamp_opt(epoch as i64, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

fn absolutize(permalink: &str) -> String {
    if permalink.starts_with("http://") || permalink.starts_with("https://") {
        permalink.to_string()
    } else {
        format!("{PERMALINK_ORIGIN}{permalink}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ListingEnvelope<T> {
    kind: String,
    data: Listing<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Listing<T> {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    before: Option<String>,
    children: Vec<Thing<T>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Thing<T> {
    kind: String,
    data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommentNode {
    #[serde(default)]
    id: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    downs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing_payload(children: Vec<Value>) -> Vec<Value> {
        vec![
            json!({"kind": "Listing", "data": {"children": []}}),
            json!({"kind": "Listing", "data": {"children": children}}),
        ]
    }

    fn node(id: &str) -> Value {
        json!({
            "kind": "t1",
            "data": {
                "id": id,
                "author": "u1",
                "body": "hello",
                "ups": 5,
                "downs": 0,
                "created_utc": 1_700_000_000.0,
                "permalink": format!("/r/test/comments/p1/x/{id}/"),
            }
        })
    }

    #[test]
    fn finds_top_level_comment_and_normalizes() {
        let payload = listing_payload(vec![node("zzz"), node("abc123")]);
        let found = extract_comment(&payload, "abc123").unwrap();
        let key = CommentKey {
            subreddit: "test".into(),
            post_id: "p1".into(),
            comment_id: "abc123".into(),
        };
        let record = normalize(&key, found);
        assert_eq!(record.id, "abc123");
        assert_eq!(record.comment_id, "abc123");
        assert_eq!(record.author, "u1");
        assert_eq!(record.body, "hello");
        assert_eq!(record.ups, 5);
        assert_eq!(
            record.permalink,
            "https://www.reddit.com/r/test/comments/p1/x/abc123/"
        );
        assert!(!record.created_utc.is_empty());
        assert_eq!(record.status, Status::Active);
    }

    #[test]
    fn nested_reply_is_not_found() {
        // The reply sits under a top-level comment's replies listing; the
        // single-level scan must miss it.
        let parent = json!({
            "kind": "t1",
            "data": {
                "id": "parent",
                "author": "u1",
                "body": "top",
                "replies": {"kind": "Listing", "data": {"children": [node("nested1")]}},
            }
        });
        let payload = listing_payload(vec![parent]);
        let err = extract_comment(&payload, "nested1").unwrap_err();
        assert!(matches!(err, FetchError::NotFound(id) if id == "nested1"));
    }

    #[test]
    fn short_payload_is_a_payload_error() {
        let payload = vec![json!({"kind": "Listing", "data": {"children": []}})];
        let err = extract_comment(&payload, "abc123").unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
        assert!(!err.is_unavailable());
    }

    #[test]
    fn absent_body_defaults_to_placeholder() {
        let bare = json!({
            "kind": "t1",
            "data": {"id": "abc123", "author": "u1", "created_utc": 1_700_000_000.0}
        });
        let payload = listing_payload(vec![bare]);
        let found = extract_comment(&payload, "abc123").unwrap();
        let key = CommentKey {
            subreddit: "test".into(),
            post_id: "p1".into(),
            comment_id: "abc123".into(),
        };
        let record = normalize(&key, found);
        assert_eq!(record.body, BODY_PLACEHOLDER);
    }

    #[test]
    fn http_statuses_count_as_unavailable() {
        assert!(FetchError::Status(StatusCode::NOT_FOUND).is_unavailable());
        assert!(FetchError::NotFound("abc123".into()).is_unavailable());
    }

    #[test]
    fn client_requires_user_agent() {
        assert!(Client::new(ClientConfig::default()).is_err());
    }

    #[test]
    fn client_rejects_bad_base_url() {
        let result = Client::new(ClientConfig {
            user_agent: "redstash-test/0.1".into(),
            base_url: Some("not a url".into()),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
