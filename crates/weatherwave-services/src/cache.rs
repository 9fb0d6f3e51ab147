//! On-disk response cache keyed by request signature.
//!
//! One JSON file per entry, named by the SHA-256 of `METHOD URL` with the query
//! pairs sorted. Entries older than the expiry window are treated as misses and
//! removed on read. Only one thread ever touches the directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    stored_at: DateTime<Utc>,
    body: String,
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    expire_after: TimeDelta,
}

impl ResponseCache {
    /// Open (creating if needed) a cache directory
    pub fn new(dir: &Path, expire_after: Duration) -> io::Result<Self> {
        let expire_after = TimeDelta::from_std(expire_after)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        fs::create_dir_all(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            expire_after,
        })
    }

    /// Cache key for a request. Query parameter order does not matter.
    pub fn key(method: &str, url: &Url) -> String {
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.sort();

        let mut normalized = url.clone();
        normalized.set_query(None);
        if !pairs.is_empty() {
            normalized.query_pairs_mut().extend_pairs(pairs);
        }

        let mut hasher = Sha256::new();
        hasher.update(method.to_ascii_uppercase().as_bytes());
        hasher.update(b" ");
        hasher.update(normalized.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Fresh body for `key`, if any
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Utc::now())
    }

    /// Fresh body for `key` as of `now`
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let path = self.entry_path(key);
        let raw = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {}: {}", path.display(), e);
                self.remove(&path);
                return None;
            }
        };

        if now - entry.stored_at >= self.expire_after {
            tracing::debug!("Cache entry for {} expired", entry.url);
            self.remove(&path);
            return None;
        }

        tracing::debug!("Cache hit for {}", entry.url);
        Some(entry.body)
    }

    /// Store a successful response body
    pub fn put(&self, key: &str, url: &Url, body: &str) -> io::Result<()> {
        self.put_at(key, url, body, Utc::now())
    }

    pub fn put_at(
        &self,
        key: &str,
        url: &Url,
        body: &str,
        now: DateTime<Utc>,
    ) -> io::Result<()> {
        let entry = CacheEntry {
            url: url.to_string(),
            stored_at: now,
            body: body.to_string(),
        };
        let json = serde_json::to_string(&entry)?;

        // Written to a temp file, then renamed into place
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)
    }

    /// Remove every expired or unreadable entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };

        let mut removed = 0;
        for path in entries.flatten().map(|e| e.path()) {
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stale = fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<CacheEntry>(&raw).ok())
                .map_or(true, |entry| now - entry.stored_at >= self.expire_after);
            if stale {
                self.remove(&path);
                removed += 1;
            }
        }
        removed
    }

    fn remove(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            tracing::debug!("Could not remove cache entry {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_ignores_query_order() {
        let a = url("https://example.com/v1/ensemble?latitude=1&longitude=2");
        let b = url("https://example.com/v1/ensemble?longitude=2&latitude=1");
        assert_eq!(ResponseCache::key("GET", &a), ResponseCache::key("get", &b));
    }

    #[test]
    fn test_key_depends_on_values() {
        let a = url("https://example.com/v1/ensemble?latitude=1");
        let b = url("https://example.com/v1/ensemble?latitude=2");
        assert_ne!(ResponseCache::key("GET", &a), ResponseCache::key("GET", &b));
        assert_eq!(ResponseCache::key("GET", &a).len(), 64);
    }

    #[test]
    fn test_put_then_get_within_window() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(3600)).unwrap();
        let u = url("https://example.com/a?x=1");
        let key = ResponseCache::key("GET", &u);
        let t0 = Utc::now();

        cache.put_at(&key, &u, "{\"ok\":true}", t0).unwrap();
        let hit = cache.get_at(&key, t0 + TimeDelta::minutes(59));
        assert_eq!(hit.as_deref(), Some("{\"ok\":true}"));
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(3600)).unwrap();
        let u = url("https://example.com/a");
        let key = ResponseCache::key("GET", &u);
        let t0 = Utc::now();

        cache.put_at(&key, &u, "body", t0).unwrap();
        assert!(cache.get_at(&key, t0 + TimeDelta::hours(1)).is_none());
        assert!(!dir.path().join(format!("{}.json", key)).exists());
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(3600)).unwrap();
        std::fs::write(dir.path().join("deadbeef.json"), "not json").unwrap();

        assert!(cache.get("deadbeef").is_none());
    }

    #[test]
    fn test_unwritable_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        assert!(ResponseCache::new(&file, Duration::from_secs(60)).is_err());
    }

    #[test]
    fn test_purge_expired() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), Duration::from_secs(60)).unwrap();
        let fresh = url("https://example.com/fresh");
        let old = url("https://example.com/old");

        cache
            .put_at(&ResponseCache::key("GET", &old), &old, "old", Utc::now() - TimeDelta::hours(2))
            .unwrap();
        cache.put(&ResponseCache::key("GET", &fresh), &fresh, "fresh").unwrap();

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(
            cache.get(&ResponseCache::key("GET", &fresh)).as_deref(),
            Some("fresh")
        );
    }
}
