use std::sync::Arc;

use crate::permalink::CommentKey;
use crate::reddit::{self, FetchError};
use crate::storage::{CommentRecord, Status};

/// Seam between the stash and the network so the controller can be driven
/// by a scripted fetcher in tests.
pub trait CommentFetcher: Send + Sync {
    fn fetch(&self, key: &CommentKey) -> Result<CommentRecord, FetchError>;
}

pub struct RedditCommentFetcher {
    client: Arc<reddit::Client>,
}

impl RedditCommentFetcher {
    pub fn new(client: Arc<reddit::Client>) -> Self {
        Self { client }
    }
}

impl CommentFetcher for RedditCommentFetcher {
    fn fetch(&self, key: &CommentKey) -> Result<CommentRecord, FetchError> {
        self.client.fetch_comment(key)
    }
}

/// Answers every key with a canned record built from the key itself.
#[derive(Default)]
pub struct MockCommentFetcher;

impl CommentFetcher for MockCommentFetcher {
    fn fetch(&self, key: &CommentKey) -> Result<CommentRecord, FetchError> {
        Ok(CommentRecord {
            id: key.comment_id.clone(),
            subreddit: key.subreddit.clone(),
            post_id: key.post_id.clone(),
            comment_id: key.comment_id.clone(),
            author: "redstash".into(),
            body: "Sample comment provided for offline use.".into(),
            created_utc: "1970-01-01 00:00:00".into(),
            permalink: format!(
                "https://www.reddit.com/r/{}/comments/{}/comment/{}/",
                key.subreddit, key.post_id, key.comment_id
            ),
            ups: 1,
            downs: 0,
            status: Status::Active,
        })
    }
}
