//! Generate-or-fetch cache for daily editions.
//!
//! [`EditionCache`] wraps a [`KvStore`] and decides, per date key, whether
//! the stored record can be served or generation has to run. Freshness is
//! recomputed on every read by re-deriving a date key from the record's
//! `created_at`: a record written at 23:59 is correctly stale at 00:01 the
//! next day even though it is a minute old.
//!
//! Anything wrong with the stored value (absent, undeserializable,
//! unparseable timestamp, stale) degrades to a miss and triggers
//! regeneration; only upstream and store-write failures propagate.
//!
//! There is deliberately no locking or single-flight here: concurrent
//! callers observing the same miss may each generate, and the last store
//! write wins. Writes are whole-record replacements, so readers only ever
//! see entirely-old or entirely-new records.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::datekey::DateKeyer;
use crate::error::GazetteError;
use crate::generator::EditionGenerator;
use crate::models::EditionRecord;
use crate::utils::truncate_for_log;

const KEY_PREFIX: &str = "daily:";

/// Async seam over the key-value store. No transactional guarantees; a
/// `put` is a whole-value replacement.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, GazetteError>;
    async fn put(&self, key: &str, value: String) -> Result<(), GazetteError>;
}

/// In-process store, the default. Contents do not survive a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, GazetteError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), GazetteError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// One-file-per-key store under a configured directory, for editions that
/// should survive restarts.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys contain ':'; keep filenames portable.
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, GazetteError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GazetteError::store(format!("read {key}: {e}"))),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), GazetteError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| GazetteError::store(format!("create {}: {e}", self.dir.display())))?;
        fs::write(self.path_for(key), value)
            .await
            .map_err(|e| GazetteError::store(format!("write {key}: {e}")))
    }
}

/// Serves a fresh cached record per date key, regenerating on demand.
pub struct EditionCache {
    store: Arc<dyn KvStore>,
    generator: EditionGenerator,
    keyer: DateKeyer,
}

impl EditionCache {
    pub fn new(store: Arc<dyn KvStore>, generator: EditionGenerator, keyer: DateKeyer) -> Self {
        Self {
            store,
            generator,
            keyer,
        }
    }

    /// Return the cached record for `date_key` when it is present,
    /// well-formed, and fresh; otherwise regenerate, overwrite, and return
    /// the new record.
    #[instrument(level = "info", skip_all, fields(%date_key))]
    pub async fn get_or_create(&self, date_key: &str) -> Result<EditionRecord, GazetteError> {
        let storage_key = Self::storage_key(date_key);

        match self.store.get(&storage_key).await {
            Ok(Some(stored)) => match serde_json::from_str::<EditionRecord>(&stored) {
                Ok(record) if self.is_fresh(&record, date_key) => {
                    debug!("cache hit");
                    return Ok(record);
                }
                Ok(record) => {
                    info!(created_at = %record.created_at, "cached record is stale; regenerating");
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        stored_preview = %truncate_for_log(&stored, 200),
                        "stored record is corrupt; regenerating"
                    );
                }
            },
            Ok(None) => debug!("cache miss"),
            // Read failures degrade to a miss rather than failing the
            // request; only the write path propagates store errors.
            Err(e) => warn!(error = %e, "store read failed; treating as miss"),
        }

        self.regenerate(date_key, &storage_key).await
    }

    /// Unconditionally regenerate and overwrite, bypassing the freshness
    /// check. Entry point for manual refreshes.
    #[instrument(level = "info", skip_all, fields(%date_key))]
    pub async fn force_refresh(&self, date_key: &str) -> Result<EditionRecord, GazetteError> {
        let storage_key = Self::storage_key(date_key);
        self.regenerate(date_key, &storage_key).await
    }

    async fn regenerate(
        &self,
        date_key: &str,
        storage_key: &str,
    ) -> Result<EditionRecord, GazetteError> {
        let record = self.generator.generate(date_key).await?;
        let serialized = serde_json::to_string(&record)
            .map_err(|e| GazetteError::store(format!("serialize record: {e}")))?;
        self.store.put(storage_key, serialized).await?;
        info!(created_at = %record.created_at, "stored regenerated edition");
        Ok(record)
    }

    fn is_fresh(&self, record: &EditionRecord, date_key: &str) -> bool {
        match DateTime::parse_from_rfc3339(&record.created_at) {
            Ok(created) => self.keyer.key_for(created.with_timezone(&Utc)) == date_key,
            // No timestamp, no freshness: treat as corrupt.
            Err(_) => false,
        }
    }

    fn storage_key(date_key: &str) -> String {
        format!("{KEY_PREFIX}{date_key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{CompletionBackend, EditionTheme, SchemaTemplate};
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts completions so tests can assert how many generations ran.
    struct CountingBackend {
        calls: Arc<AtomicUsize>,
        reply: String,
    }

    #[async_trait]
    impl CompletionBackend for CountingBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, GazetteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn well_formed_reply() -> String {
        r#"{"date":"2026-08-29","overview":"Calm.","news":[{"id":"1","title":"T","description":"D"}],"magicTip":"Tip."}"#.to_string()
    }

    fn cache_with_store(store: Arc<dyn KvStore>) -> (EditionCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = CountingBackend {
            calls: Arc::clone(&calls),
            reply: well_formed_reply(),
        };
        let template = SchemaTemplate {
            paper_name: "The Daily Gazette".to_string(),
            language: "English".to_string(),
            theme: EditionTheme::Plain,
        };
        let generator = EditionGenerator::new(Box::new(backend), template);
        let keyer = DateKeyer::from_hours(0).unwrap();
        (EditionCache::new(store, generator, keyer), calls)
    }

    fn cache() -> (EditionCache, Arc<AtomicUsize>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let (cache, calls) = cache_with_store(store.clone());
        (cache, calls, store)
    }

    fn today() -> String {
        DateKeyer::from_hours(0).unwrap().today()
    }

    #[tokio::test]
    async fn test_sequential_calls_generate_once() {
        let (cache, calls, _) = cache();
        let key = today();
        let first = cache.get_or_create(&key).await.unwrap();
        let second = cache.get_or_create(&key).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_stale_record_triggers_regeneration() {
        let (cache, calls, store) = cache();
        let key = today();
        let yesterday = (Utc::now() - Duration::days(1)).to_rfc3339();
        let stale = format!(
            r#"{{"createdAt":"{yesterday}","payload":{{"date":"old","overview":"old","news":[],"magicTip":"old"}}}}"#
        );
        store
            .put(&format!("daily:{key}"), stale)
            .await
            .unwrap();

        let record = cache.get_or_create(&key).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(record.payload.overview, "Calm.");
    }

    #[tokio::test]
    async fn test_corrupt_record_treated_as_miss() {
        let (cache, calls, store) = cache();
        let key = today();
        store
            .put(&format!("daily:{key}"), "definitely not json".to_string())
            .await
            .unwrap();

        let record = cache.get_or_create(&key).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(record.payload.overview, "Calm.");
    }

    #[tokio::test]
    async fn test_unparseable_created_at_treated_as_corrupt() {
        let (cache, calls, store) = cache();
        let key = today();
        let bad = r#"{"createdAt":"sometime last tuesday","payload":{"date":"x","overview":"x","news":[],"magicTip":"x"}}"#;
        store
            .put(&format!("daily:{key}"), bad.to_string())
            .await
            .unwrap();

        cache.get_or_create(&key).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_freshness() {
        let (cache, calls, _) = cache();
        let key = today();
        cache.get_or_create(&key).await.unwrap();
        cache.force_refresh(&key).await.unwrap();
        cache.force_refresh(&key).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_regeneration_overwrites_stored_value() {
        let (cache, _, store) = cache();
        let key = today();
        let record = cache.force_refresh(&key).await.unwrap();

        let stored = store.get(&format!("daily:{key}")).await.unwrap().unwrap();
        let parsed: EditionRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, record);
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store.put("daily:2026-08-29", "value".to_string()).await.unwrap();
        assert_eq!(
            store.get("daily:2026-08-29").await.unwrap().as_deref(),
            Some("value")
        );
        assert!(store.get("daily:2026-08-30").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get("daily:2026-08-29").await.unwrap().is_none());

        let record = EditionRecord {
            created_at: Utc::now().to_rfc3339(),
            payload: crate::models::EditionPayload::fallback("2026-08-29", "raw".to_string()),
        };
        let serialized = serde_json::to_string(&record).unwrap();
        store
            .put("daily:2026-08-29", serialized.clone())
            .await
            .unwrap();

        let read_back = store.get("daily:2026-08-29").await.unwrap().unwrap();
        let parsed: EditionRecord = serde_json::from_str(&read_back).unwrap();
        assert_eq!(parsed, record);
    }

    #[tokio::test]
    async fn test_cache_works_over_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn KvStore> = Arc::new(FileStore::new(dir.path()));
        let (cache, calls) = cache_with_store(store);
        let key = today();
        cache.get_or_create(&key).await.unwrap();
        cache.get_or_create(&key).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
