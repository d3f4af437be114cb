use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{utils::iso_timestamp_utc, Result};

/// A platform file handle from an earlier upload of (book, format).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CachedDelivery {
    pub file_id: String,
    pub cached_at: String,
}

/// Keeps one live entry per (book id, file format). Entries never expire on
/// their own; a failed re-send or a user reporting a broken file removes
/// them explicitly.
#[async_trait]
pub trait DeliveryCache: Send + Sync {
    async fn get(&self, book_id: u32, file_type: &str) -> Result<Option<CachedDelivery>>;
    async fn put(&self, book_id: u32, file_type: &str, file_id: &str) -> Result<()>;
    async fn invalidate(&self, book_id: u32, file_type: &str) -> Result<()>;
}

fn cache_key(book_id: u32, file_type: &str) -> String {
    format!("{book_id}:{file_type}")
}

/// JSON-file-backed cache, written through on every mutation.
pub struct FileDeliveryCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, CachedDelivery>>,
}

impl FileDeliveryCache {
    /// A missing or unreadable file starts an empty cache; cached uploads
    /// are reconstructible, so losing them only costs a re-download.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(txt) if !txt.trim().is_empty() => match serde_json::from_str(&txt) {
                Ok(map) => map,
                Err(e) => {
                    eprintln!("[CACHE] ignoring unreadable {}: {e}", path.display());
                    HashMap::new()
                }
            },
            _ => HashMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, CachedDelivery>) -> Result<()> {
        let txt = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, txt)?;
        Ok(())
    }
}

#[async_trait]
impl DeliveryCache for FileDeliveryCache {
    async fn get(&self, book_id: u32, file_type: &str) -> Result<Option<CachedDelivery>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&cache_key(book_id, file_type)).cloned())
    }

    async fn put(&self, book_id: u32, file_type: &str, file_id: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            cache_key(book_id, file_type),
            CachedDelivery {
                file_id: file_id.to_string(),
                cached_at: iso_timestamp_utc(),
            },
        );
        self.persist(&entries)
    }

    async fn invalidate(&self, book_id: u32, file_type: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(&cache_key(book_id, file_type)).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(std::time::Duration::from_secs(0))
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.json"))
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let cache = FileDeliveryCache::load(tmp_file("bookbot-cache-test"));
        cache.put(10, "fb2", "file-abc").await.unwrap();

        let hit = cache.get(10, "fb2").await.unwrap().unwrap();
        assert_eq!(hit.file_id, "file-abc");
        assert!(cache.get(10, "epub").await.unwrap().is_none());
        assert!(cache.get(11, "fb2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_existing_entry() {
        let cache = FileDeliveryCache::load(tmp_file("bookbot-cache-replace-test"));
        cache.put(10, "fb2", "old").await.unwrap();
        cache.put(10, "fb2", "new").await.unwrap();

        let hit = cache.get(10, "fb2").await.unwrap().unwrap();
        assert_eq!(hit.file_id, "new");
    }

    #[tokio::test]
    async fn invalidate_removes_only_that_format() {
        let cache = FileDeliveryCache::load(tmp_file("bookbot-cache-inv-test"));
        cache.put(10, "fb2", "a").await.unwrap();
        cache.put(10, "epub", "b").await.unwrap();

        cache.invalidate(10, "fb2").await.unwrap();
        assert!(cache.get(10, "fb2").await.unwrap().is_none());
        assert!(cache.get(10, "epub").await.unwrap().is_some());

        // Invalidating a missing entry is a no-op.
        cache.invalidate(99, "fb2").await.unwrap();
    }

    #[tokio::test]
    async fn entries_survive_reload() {
        let path = tmp_file("bookbot-cache-reload-test");
        {
            let cache = FileDeliveryCache::load(&path);
            cache.put(7, "mobi", "persisted").await.unwrap();
        }

        let cache = FileDeliveryCache::load(&path);
        let hit = cache.get(7, "mobi").await.unwrap().unwrap();
        assert_eq!(hit.file_id, "persisted");
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let path = tmp_file("bookbot-cache-corrupt-test");
        std::fs::write(&path, "not json at all").unwrap();

        let cache = FileDeliveryCache::load(&path);
        assert!(cache.get(1, "fb2").await.unwrap().is_none());
    }
}
