//! Local persistence for generated images and per-field input history,
//! backed by libSQL (local file database).
//!
//! The image logs are bounded FIFOs: append inserts the new row, then counts
//! and deletes the oldest rows past capacity. Persistence is fire-and-forget
//! relative to the in-memory conversation; the two never resync.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use libsql::{params, Builder, Connection, Database};

use crate::services::gemini::{Part, ResultImage};

use super::error::HistoryError;

/// Creation history keeps the last 50 images; refinement history the last 20.
pub const CREATION_LOG_CAPACITY: usize = 50;
pub const REFINEMENT_LOG_CAPACITY: usize = 20;

/// Per-field input history keeps the 10 most recent distinct values.
const FIELD_HISTORY_CAPACITY: usize = 10;

const CREATION_LOG: &str = "image_history";
const REFINEMENT_LOG: &str = "refine_history";

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<HistoryStoreInner>,
}

struct HistoryStoreInner {
    db: Database,
}

impl HistoryStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let db = Builder::new_local(path.as_ref()).build().await?;
        let store = Self {
            inner: Arc::new(HistoryStoreInner { db }),
        };
        store.migrate().await?;
        Ok(store)
    }

    async fn connect(&self) -> Result<Connection, HistoryError> {
        let conn = self.inner.db.connect()?;
        // Best-effort pragmas to reduce lock contention on the local file.
        let _ = conn.query("PRAGMA journal_mode = WAL;", ()).await;
        let _ = conn.query("PRAGMA synchronous = NORMAL;", ()).await;
        Ok(conn)
    }

    async fn migrate(&self) -> Result<(), HistoryError> {
        let conn = self.connect().await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS image_log (\n  id TEXT PRIMARY KEY NOT NULL,\n  log_name TEXT NOT NULL,\n  mime_type TEXT NOT NULL,\n  data TEXT NOT NULL,\n  prompt TEXT NOT NULL,\n  model TEXT NOT NULL,\n  provider_parts TEXT,\n  created_at_ms INTEGER NOT NULL\n);",
            (),
        )
        .await?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_image_log_name_created ON image_log(log_name, created_at_ms);",
            (),
        )
        .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS field_history (\n  field_key TEXT NOT NULL,\n  value TEXT NOT NULL,\n  used_at_ms INTEGER NOT NULL,\n  PRIMARY KEY (field_key, value)\n);",
            (),
        )
        .await?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_field_history_key_used ON field_history(field_key, used_at_ms);",
            (),
        )
        .await?;

        Ok(())
    }

    /// Bounded log of first-generation results.
    pub fn creation_log(&self) -> BoundedImageLog {
        BoundedImageLog {
            store: self.clone(),
            log_name: CREATION_LOG,
            capacity: CREATION_LOG_CAPACITY,
        }
    }

    /// Bounded log of refinement results.
    pub fn refinement_log(&self) -> BoundedImageLog {
        BoundedImageLog {
            store: self.clone(),
            log_name: REFINEMENT_LOG,
            capacity: REFINEMENT_LOG_CAPACITY,
        }
    }

    /// Remember a form-field input: de-duplicated, most-recent-first, capped.
    pub async fn record_field_input(
        &self,
        field_key: &str,
        value: &str,
    ) -> Result<(), HistoryError> {
        let field_key = field_key.trim();
        let value = value.trim();
        if field_key.is_empty() {
            return Err(HistoryError::invalid_input("fieldKey is required"));
        }
        if value.is_empty() {
            return Err(HistoryError::invalid_input("Value is empty"));
        }

        let conn = self.connect().await?;

        // Recency must be strictly ordered even when entries land within the
        // same millisecond; bump past the newest stored entry.
        let mut rows = conn
            .query(
                "SELECT COALESCE(MAX(used_at_ms), 0) FROM field_history WHERE field_key = ?1;",
                params![field_key],
            )
            .await?;
        let max_used = rows
            .next()
            .await?
            .map(|r| r.get::<i64>(0).unwrap_or(0))
            .unwrap_or(0);
        let now = (now_ms() as i64).max(max_used + 1);

        // Re-entering a known value just refreshes its recency.
        conn.execute(
            "INSERT INTO field_history (field_key, value, used_at_ms) VALUES (?1, ?2, ?3)\nON CONFLICT(field_key, value) DO UPDATE SET used_at_ms = excluded.used_at_ms;",
            params![field_key, value, now],
        )
        .await?;

        let count = count_rows(
            &conn,
            "SELECT COUNT(*) FROM field_history WHERE field_key = ?1;",
            field_key,
        )
        .await?;

        if count > FIELD_HISTORY_CAPACITY as i64 {
            conn.execute(
                "DELETE FROM field_history WHERE field_key = ?1 AND value IN (\n  SELECT value FROM field_history\n   WHERE field_key = ?1\n   ORDER BY used_at_ms ASC, rowid ASC\n   LIMIT ?2\n);",
                params![field_key, count - FIELD_HISTORY_CAPACITY as i64],
            )
            .await?;
        }

        Ok(())
    }

    /// Stored inputs for a field, most recent first.
    pub async fn list_field_inputs(&self, field_key: &str) -> Result<Vec<String>, HistoryError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT value FROM field_history\n  WHERE field_key = ?1\n  ORDER BY used_at_ms DESC, rowid DESC\n  LIMIT ?2;",
                params![field_key, FIELD_HISTORY_CAPACITY as i64],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row.get::<String>(0)?);
        }
        Ok(out)
    }
}

async fn count_rows(
    conn: &Connection,
    sql: &str,
    key: &str,
) -> Result<i64, HistoryError> {
    let mut rows = conn.query(sql, params![key]).await?;
    Ok(rows
        .next()
        .await?
        .map(|r| r.get::<i64>(0).unwrap_or(0))
        .unwrap_or(0))
}

/// One capped, append-with-eviction image log. Capacity is a parameter so
/// the creation and refinement logs share the implementation.
#[derive(Clone)]
pub struct BoundedImageLog {
    store: HistoryStore,
    log_name: &'static str,
    capacity: usize,
}

impl BoundedImageLog {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an image, then evict the oldest entries past capacity.
    pub async fn append(&self, image: &ResultImage) -> Result<(), HistoryError> {
        let provider_parts = image
            .provider_parts
            .as_ref()
            .map(|parts| {
                serde_json::to_string(parts)
                    .map_err(|e| HistoryError::internal(format!("Provider parts encode: {}", e)))
            })
            .transpose()?;

        let conn = self.store.connect().await?;

        conn.execute(
            "INSERT INTO image_log (id, log_name, mime_type, data, prompt, model, provider_parts, created_at_ms)\nVALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                image.id.as_str(),
                self.log_name,
                image.mime_type.as_str(),
                image.data.as_str(),
                image.prompt.as_str(),
                image.model.as_str(),
                provider_parts,
                image.created_at_ms as i64
            ],
        )
        .await?;

        let count = count_rows(
            &conn,
            "SELECT COUNT(*) FROM image_log WHERE log_name = ?1;",
            self.log_name,
        )
        .await?;

        if count > self.capacity as i64 {
            conn.execute(
                "DELETE FROM image_log WHERE log_name = ?1 AND id IN (\n  SELECT id FROM image_log\n   WHERE log_name = ?1\n   ORDER BY created_at_ms ASC, rowid ASC\n   LIMIT ?2\n);",
                params![self.log_name, count - self.capacity as i64],
            )
            .await?;
        }

        Ok(())
    }

    /// Stored images, newest first.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<ResultImage>, HistoryError> {
        let conn = self.store.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, mime_type, data, prompt, model, provider_parts, created_at_ms\n  FROM image_log\n WHERE log_name = ?1\n ORDER BY created_at_ms DESC, rowid DESC\n LIMIT ?2;",
                params![self.log_name, limit as i64],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let provider_parts_raw: Option<String> = row.get(5).ok();
            let created_at_ms: i64 = row.get(6)?;

            out.push(ResultImage {
                id: row.get(0)?,
                mime_type: row.get(1)?,
                data: row.get(2)?,
                prompt: row.get(3)?,
                model: row.get(4)?,
                provider_parts: provider_parts_raw
                    .and_then(|raw| serde_json::from_str::<Vec<Part>>(&raw).ok()),
                created_at_ms: created_at_ms.max(0) as u64,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, created_at_ms: u64) -> ResultImage {
        ResultImage {
            id: id.to_string(),
            mime_type: "image/png".to_string(),
            data: "QUJD".to_string(),
            prompt: format!("prompt for {}", id),
            model: "Gemini 3 Pro".to_string(),
            provider_parts: None,
            created_at_ms,
        }
    }

    async fn open_store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = HistoryStore::open(dir.path().join("history.db"))
            .await
            .expect("open store");
        (dir, store)
    }

    #[tokio::test]
    async fn test_creation_log_evicts_oldest_past_fifty() {
        let (_dir, store) = open_store().await;
        let log = store.creation_log();

        for i in 0..51u64 {
            log.append(&image(&format!("img_{:03}", i), 1000 + i))
                .await
                .unwrap();
        }

        let recent = log.list_recent(100).await.unwrap();
        assert_eq!(recent.len(), CREATION_LOG_CAPACITY);
        // The oldest entry is the one that went away.
        assert!(recent.iter().all(|img| img.id != "img_000"));
        assert_eq!(recent.first().unwrap().id, "img_050");
    }

    #[tokio::test]
    async fn test_refinement_log_evicts_at_twenty() {
        let (_dir, store) = open_store().await;
        let log = store.refinement_log();

        for i in 0..21u64 {
            log.append(&image(&format!("ref_{:03}", i), 2000 + i))
                .await
                .unwrap();
        }

        let recent = log.list_recent(100).await.unwrap();
        assert_eq!(recent.len(), REFINEMENT_LOG_CAPACITY);
        assert!(recent.iter().all(|img| img.id != "ref_000"));
    }

    #[tokio::test]
    async fn test_logs_are_independent() {
        let (_dir, store) = open_store().await;
        store.creation_log().append(&image("c1", 1)).await.unwrap();
        store.refinement_log().append(&image("r1", 2)).await.unwrap();

        let creation = store.creation_log().list_recent(10).await.unwrap();
        let refinement = store.refinement_log().list_recent(10).await.unwrap();
        assert_eq!(creation.len(), 1);
        assert_eq!(creation[0].id, "c1");
        assert_eq!(refinement.len(), 1);
        assert_eq!(refinement[0].id, "r1");
    }

    #[tokio::test]
    async fn test_list_recent_is_newest_first() {
        let (_dir, store) = open_store().await;
        let log = store.creation_log();
        log.append(&image("a", 10)).await.unwrap();
        log.append(&image("b", 30)).await.unwrap();
        log.append(&image("c", 20)).await.unwrap();

        let recent = log.list_recent(2).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_provider_parts_roundtrip() {
        let (_dir, store) = open_store().await;
        let log = store.refinement_log();

        let mut stored = image("with_parts", 5);
        stored.provider_parts = Some(vec![Part::Text {
            text: "Here you go.".to_string(),
            thought_signature: Some("sig_1".to_string()),
        }]);
        log.append(&stored).await.unwrap();

        let recent = log.list_recent(1).await.unwrap();
        let parts = recent[0].provider_parts.as_ref().unwrap();
        match &parts[0] {
            Part::Text {
                thought_signature, ..
            } => assert_eq!(thought_signature.as_deref(), Some("sig_1")),
            _ => panic!("expected text part"),
        }
    }

    #[tokio::test]
    async fn test_field_history_dedup_and_cap() {
        let (_dir, store) = open_store().await;

        for i in 0..12 {
            store
                .record_field_input("product", &format!("value {}", i))
                .await
                .unwrap();
        }
        // Re-entering an old value moves it back to the front.
        store.record_field_input("product", "value 5").await.unwrap();

        let inputs = store.list_field_inputs("product").await.unwrap();
        assert_eq!(inputs.len(), 10);
        assert_eq!(inputs[0], "value 5");
        // No duplicates.
        let mut deduped = inputs.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), inputs.len());

        // Other fields are unaffected.
        assert!(store.list_field_inputs("background").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_field_history_rejects_empty_values() {
        let (_dir, store) = open_store().await;
        assert!(store.record_field_input("product", "  ").await.is_err());
        assert!(store.record_field_input(" ", "value").await.is_err());
    }
}
