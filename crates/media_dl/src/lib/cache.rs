//! JSON file cache for YouTube API results, keyed by collection-specific
//! names (`channel_<id>`, `playlist_<id>_videos`, ...). A warm cache lets a
//! re-run skip every API round trip it already paid for.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(JsonCache { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(value)?;
        fs::write(self.path_for(key), json)?;
        Ok(())
    }

    /// Missing or unreadable entries resolve to `None`; a corrupt cache file
    /// is treated the same as an absent one.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        let bytes = fs::read(&path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!(error = ?e, path = ?path, "Failed to remove cache entry");
            }
        }
    }

    /// Drops every cached entry.
    pub fn clear(&self) -> Result<(), Error> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonCache::new(dir.path()).unwrap();

        cache.save("channel_abc", &json!({"id": "abc"})).unwrap();
        let loaded: Value = cache.load("channel_abc").unwrap();
        assert_eq!(loaded["id"], "abc");
    }

    #[test]
    fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonCache::new(dir.path()).unwrap();
        assert!(cache.load::<Value>("nope").is_none());
    }

    #[test]
    fn corrupt_entry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonCache::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("bad.json"), b"{not json").unwrap();
        assert!(cache.load::<Value>("bad").is_none());
    }

    #[test]
    fn remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonCache::new(dir.path()).unwrap();

        cache.save("a", &json!(1)).unwrap();
        cache.save("b", &json!(2)).unwrap();

        cache.remove("a");
        assert!(cache.load::<Value>("a").is_none());
        assert!(cache.load::<Value>("b").is_some());

        cache.clear().unwrap();
        assert!(cache.load::<Value>("b").is_none());
    }
}
