use once_cell::sync::Lazy;
use regex::Regex;

// Four slash-delimited segments after /r/: subreddit, "comments", post id,
// slug, comment id. The slug is captured and discarded.
static COMMENT_PERMALINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"reddit\.com/r/([^/]+)/comments/([^/]+)/([^/]+)/([^/]+)")
        .expect("comment permalink pattern is valid")
});

/// Everything needed to locate one comment upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentKey {
    pub subreddit: String,
    pub post_id: String,
    pub comment_id: String,
}

#[derive(Debug, thiserror::Error)]
#[error("not a Reddit comment permalink")]
pub struct InvalidUrl;

/// Extracts the (subreddit, post id, comment id) key from a pasted comment
/// permalink. Query strings and fragments are not stripped beyond what the
/// pattern tolerates.
pub fn parse(input: &str) -> Result<CommentKey, InvalidUrl> {
    let caps = COMMENT_PERMALINK.captures(input).ok_or(InvalidUrl)?;
    Ok(CommentKey {
        subreddit: caps[1].to_string(),
        post_id: caps[2].to_string(),
        comment_id: caps[4].to_string(),
    })
}
