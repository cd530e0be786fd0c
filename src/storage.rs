use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail, Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::permalink::CommentKey;

#[derive(Debug, Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

/// One saved Reddit comment. `comment_id` duplicates `id`; both are kept so
/// a record carries the full re-fetch key.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub id: String,
    pub subreddit: String,
    pub post_id: String,
    pub comment_id: String,
    pub author: String,
    pub body: String,
    pub created_utc: String,
    pub permalink: String,
    pub ups: i64,
    pub downs: i64,
    pub status: Status,
}

impl CommentRecord {
    pub fn key(&self) -> CommentKey {
        CommentKey {
            subreddit: self.subreddit.clone(),
            post_id: self.post_id.clone(),
            comment_id: self.comment_id.clone(),
        }
    }
}

/// Inactive marks a comment that could not be re-confirmed upstream. It is
/// never set on insert; a missing or unknown stored value reads as Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive",
        }
    }

    fn from_column(raw: &str) -> Self {
        match raw {
            "Inactive" => Status::Inactive,
            _ => Status::Active,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Options {
    pub path: Option<PathBuf>,
}

impl Store {
    pub fn open(opts: Options) -> Result<Self> {
        let path = if let Some(path) = opts.path {
            path
        } else {
            default_path().context("storage: resolve default path")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("storage: create directory {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("storage: open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", &"WAL")
            .context("storage: set WAL")?;
        conn.pragma_update(None, "foreign_keys", &"ON")
            .context("storage: enable foreign keys")?;
        conn.pragma_update(None, "busy_timeout", &5000)
            .context("storage: set busy timeout")?;
        migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn close(self) -> Result<()> {
        let conn = Arc::try_unwrap(self.conn)
            .map_err(|_| anyhow!("storage: connection still in use"))?
            .into_inner();
        conn.close()
            .map_err(|(_, err)| err)
            .context("storage: close connection")
    }

    /// Idempotent full overwrite keyed by `id`. Partial updates go through
    /// [`Store::set_status`] instead.
    pub fn upsert_comment(&self, record: &CommentRecord) -> Result<()> {
        if record.id.is_empty() {
            bail!("storage: comment id required");
        }
        let conn = self.conn.lock();
        conn.execute(
            r#"
INSERT INTO comments (id, subreddit, post_id, comment_id, author, body, created_utc, permalink, ups, downs, status)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
ON CONFLICT(id) DO UPDATE SET
  subreddit = excluded.subreddit,
  post_id = excluded.post_id,
  comment_id = excluded.comment_id,
  author = excluded.author,
  body = excluded.body,
  created_utc = excluded.created_utc,
  permalink = excluded.permalink,
  ups = excluded.ups,
  downs = excluded.downs,
  status = excluded.status
"#,
            params![
                record.id,
                record.subreddit,
                record.post_id,
                record.comment_id,
                record.author,
                record.body,
                record.created_utc,
                record.permalink,
                record.ups,
                record.downs,
                record.status.as_str(),
            ],
        )
        .context("storage: upsert comment")?;
        Ok(())
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            r#"
SELECT id, subreddit, post_id, comment_id, author, body, created_utc, permalink, ups, downs, status
FROM comments
WHERE id = ?1
"#,
            params![id],
            comment_from_row,
        )
        .optional()
        .context("storage: query comment by id")
    }

    /// All saved comments in primary-key order. The contract leaves order
    /// implementation-defined; key order is stable across reloads.
    pub fn list_comments(&self) -> Result<Vec<CommentRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
SELECT id, subreddit, post_id, comment_id, author, body, created_utc, permalink, ups, downs, status
FROM comments
ORDER BY id
"#,
        )?;
        let rows = stmt
            .query_map([], comment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Returns false when no row had that id (deleting an absent comment is
    /// a no-op).
    pub fn delete_comment(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])
            .context("storage: delete comment")?;
        Ok(changed > 0)
    }

    /// Touches only the status column. Returns false when the row is gone,
    /// which makes a refresh miss racing a delete a no-op.
    pub fn set_status(&self, id: &str, status: Status) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE comments SET status = ?2 WHERE id = ?1",
                params![id, status.as_str()],
            )
            .context("storage: update comment status")?;
        Ok(changed > 0)
    }
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    let status: String = row.get(10)?;
    Ok(CommentRecord {
        id: row.get(0)?,
        subreddit: row.get(1)?,
        post_id: row.get(2)?,
        comment_id: row.get(3)?,
        author: row.get(4)?,
        body: row.get(5)?,
        created_utc: row.get(6)?,
        permalink: row.get(7)?,
        ups: row.get(8)?,
        downs: row.get(9)?,
        status: Status::from_column(&status),
    })
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
  version INTEGER PRIMARY KEY,
  applied_at INTEGER NOT NULL
)
"#,
        [],
    )?;

    let current: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let migrations = migrations();
    for (idx, sql) in migrations.iter().enumerate() {
        let version = (idx + 1) as i64;
        if version <= current {
            continue;
        }
        conn.execute_batch(sql)?;
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![
                version,
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or(Duration::from_secs(0))
                    .as_secs() as i64,
            ],
        )?;
    }
    Ok(())
}

fn migrations() -> Vec<&'static str> {
    vec![
        r#"
CREATE TABLE IF NOT EXISTS comments (
  id TEXT PRIMARY KEY,
  subreddit TEXT NOT NULL,
  post_id TEXT NOT NULL,
  comment_id TEXT NOT NULL,
  author TEXT NOT NULL,
  body TEXT NOT NULL,
  created_utc TEXT NOT NULL,
  permalink TEXT NOT NULL,
  ups INTEGER NOT NULL DEFAULT 0,
  downs INTEGER NOT NULL DEFAULT 0,
  status TEXT NOT NULL DEFAULT 'Active'
);
"#,
    ]
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("redstash").join("stash.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_temp() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stash.db");
        let store = Store::open(Options { path: Some(path) }).unwrap();
        (dir, store)
    }

    fn sample(id: &str) -> CommentRecord {
        CommentRecord {
            id: id.to_string(),
            subreddit: "test".into(),
            post_id: "p1".into(),
            comment_id: id.to_string(),
            author: "u1".into(),
            body: "hello".into(),
            created_utc: "2023-11-14 22:13:20".into(),
            permalink: format!("https://www.reddit.com/r/test/comments/p1/x/{id}/"),
            ups: 5,
            downs: 0,
            status: Status::Active,
        }
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stash.db");
        let store = Store::open(Options {
            path: Some(path.clone()),
        })
        .unwrap();
        assert!(path.exists());
        store.close().unwrap();
    }

    #[test]
    fn upsert_then_get_round_trips_every_field() {
        let (_dir, store) = open_temp();
        let record = sample("abc123");
        store.upsert_comment(&record).unwrap();
        let loaded = store.get_comment("abc123").unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn upsert_is_idempotent() {
        let (_dir, store) = open_temp();
        let record = sample("abc123");
        store.upsert_comment(&record).unwrap();
        store.upsert_comment(&record).unwrap();
        let all = store.list_comments().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], record);
    }

    #[test]
    fn upsert_overwrites_existing_row() {
        let (_dir, store) = open_temp();
        store.upsert_comment(&sample("abc123")).unwrap();
        let mut updated = sample("abc123");
        updated.body = "edited upstream".into();
        updated.ups = 12;
        store.upsert_comment(&updated).unwrap();
        let loaded = store.get_comment("abc123").unwrap().unwrap();
        assert_eq!(loaded, updated);
    }

    #[test]
    fn delete_absent_id_is_noop() {
        let (_dir, store) = open_temp();
        store.upsert_comment(&sample("abc123")).unwrap();
        assert!(!store.delete_comment("missing").unwrap());
        let all = store.list_comments().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "abc123");
    }

    #[test]
    fn delete_removes_row() {
        let (_dir, store) = open_temp();
        store.upsert_comment(&sample("abc123")).unwrap();
        assert!(store.delete_comment("abc123").unwrap());
        assert!(store.get_comment("abc123").unwrap().is_none());
    }

    #[test]
    fn set_status_touches_only_status() {
        let (_dir, store) = open_temp();
        let record = sample("abc123");
        store.upsert_comment(&record).unwrap();
        assert!(store.set_status("abc123", Status::Inactive).unwrap());
        let loaded = store.get_comment("abc123").unwrap().unwrap();
        assert_eq!(loaded.status, Status::Inactive);
        let mut expected = record;
        expected.status = Status::Inactive;
        assert_eq!(loaded, expected);
    }

    #[test]
    fn set_status_on_missing_row_reports_noop() {
        let (_dir, store) = open_temp();
        assert!(!store.set_status("missing", Status::Inactive).unwrap());
    }

    #[test]
    fn list_orders_by_id() {
        let (_dir, store) = open_temp();
        store.upsert_comment(&sample("bbb")).unwrap();
        store.upsert_comment(&sample("aaa")).unwrap();
        store.upsert_comment(&sample("ccc")).unwrap();
        let ids: Vec<String> = store
            .list_comments()
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec!["aaa", "bbb", "ccc"]);
    }

    #[test]
    fn reopen_preserves_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stash.db");
        {
            let store = Store::open(Options {
                path: Some(path.clone()),
            })
            .unwrap();
            store.upsert_comment(&sample("abc123")).unwrap();
            store.close().unwrap();
        }
        let store = Store::open(Options { path: Some(path) }).unwrap();
        assert!(store.get_comment("abc123").unwrap().is_some());
    }
}
