use std::sync::Arc;

use anyhow::{Context, Result};

use crate::data::CommentFetcher;
use crate::permalink::{self, CommentKey};
use crate::storage::{CommentRecord, Status, Store};

/// What a fetch-and-persist cycle did to the store.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Fetched and upserted; the stored record is the returned one.
    Saved(CommentRecord),
    /// Comment unavailable upstream; the existing record's status flipped
    /// to Inactive with every other field untouched.
    MarkedInactive { id: String, reason: String },
    /// Comment unavailable and nothing was stored for it. No state change.
    Unavailable(String),
}

/// The controller core: parse, fetch, persist. Every operation takes the
/// comment key as an explicit value; there is no shared "current URL" state.
pub struct Stash {
    store: Arc<Store>,
    fetcher: Arc<dyn CommentFetcher>,
}

impl Stash {
    pub fn new(store: Arc<Store>, fetcher: Arc<dyn CommentFetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Parse then save. A parse failure stops here with no fetch and no
    /// store mutation.
    pub fn add_from_url(&self, input: &str) -> Result<FetchOutcome> {
        let key = permalink::parse(input)?;
        self.save(&key)
    }

    pub fn save(&self, key: &CommentKey) -> Result<FetchOutcome> {
        match self.fetcher.fetch(key) {
            Ok(record) => {
                self.store
                    .upsert_comment(&record)
                    .context("save fetched comment")?;
                Ok(FetchOutcome::Saved(record))
            }
            Err(err) if err.is_unavailable() => {
                // Soft failure: the comment was likely deleted upstream.
                // set_status touches zero rows when a concurrent delete
                // already removed the record.
                let flipped = self
                    .store
                    .set_status(&key.comment_id, Status::Inactive)
                    .context("mark comment inactive")?;
                if flipped {
                    Ok(FetchOutcome::MarkedInactive {
                        id: key.comment_id.clone(),
                        reason: err.to_string(),
                    })
                } else {
                    Ok(FetchOutcome::Unavailable(err.to_string()))
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        self.store.delete_comment(id)
    }

    pub fn all(&self) -> Result<Vec<CommentRecord>> {
        self.store.list_comments()
    }

    /// Re-fetch keys for every stored record, for the refresh-all fan-out.
    pub fn keys(&self) -> Result<Vec<CommentKey>> {
        Ok(self.all()?.iter().map(CommentRecord::key).collect())
    }
}
