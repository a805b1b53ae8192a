//! Local result cache persisted as a single JSON file.
//!
//! Holds the last fetched result per country, the discovered country list,
//! and vote counts extracted from hourly snapshots. Results are replaced only
//! when a fresh fetch succeeds; there is no expiry.

use super::error::Result;
use super::model::{CacheEntry, CountryId, ElectionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    results: BTreeMap<CountryId, CacheEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    countries: Option<Vec<String>>,
    #[serde(default)]
    snapshots: BTreeMap<String, u64>,
}

pub struct ResultCache {
    path: PathBuf,
    data: CacheFile,
    dirty: bool,
}

impl ResultCache {
    /// Open the cache at `path`. A missing or unreadable file yields an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CacheFile>(&content) {
                Ok(data) => {
                    info!(
                        path = %path.display(),
                        results = data.results.len(),
                        snapshots = data.snapshots.len(),
                        "loaded cache"
                    );
                    data
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cache invalid, recreating");
                    CacheFile::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cache file yet");
                CacheFile::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache unreadable, starting empty");
                CacheFile::default()
            }
        };

        Self {
            path,
            data,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.results.is_empty()
    }

    pub fn get(&self, country: &CountryId) -> Option<&ElectionResult> {
        self.data.results.get(country).map(|e| &e.result)
    }

    pub fn entry(&self, country: &CountryId) -> Option<&CacheEntry> {
        self.data.results.get(country)
    }

    /// Store `result` under its country, replacing any previous entry, and persist.
    /// When the write fails the previous entry is put back.
    pub fn put(&mut self, result: ElectionResult, source_url: impl Into<String>) -> Result<()> {
        let country = result.country.clone();
        let previous = self.data.results.insert(
            country.clone(),
            CacheEntry {
                result,
                source_url: source_url.into(),
            },
        );
        let was_dirty = self.dirty;
        self.dirty = true;

        if let Err(e) = self.flush() {
            match previous {
                Some(entry) => {
                    self.data.results.insert(country.clone(), entry);
                }
                None => {
                    self.data.results.remove(&country);
                }
            }
            self.dirty = was_dirty;
            warn!(%country, error = %e, "cache write failed, kept previous entry");
            return Err(e);
        }
        info!(%country, "cached result");
        Ok(())
    }

    pub fn countries(&self) -> Option<&[String]> {
        self.data.countries.as_deref()
    }

    pub fn set_countries(&mut self, countries: Vec<String>) -> Result<()> {
        self.data.countries = Some(countries);
        self.dirty = true;
        self.flush()
    }

    pub fn clear_countries(&mut self) {
        if self.data.countries.take().is_some() {
            self.dirty = true;
        }
    }

    pub fn snapshot(&self, key: &str) -> Option<u64> {
        self.data.snapshots.get(key).copied()
    }

    /// Record a snapshot count. Written on the next `flush`.
    pub fn put_snapshot(&mut self, key: impl Into<String>, votes: u64) {
        self.data.snapshots.insert(key.into(), votes);
        self.dirty = true;
    }

    /// Write pending changes to disk.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json)?;
        self.dirty = false;
        debug!(path = %self.path.display(), "cache written");
        Ok(())
    }

    /// Forget everything and delete the file.
    pub fn clear(&mut self) -> Result<()> {
        self.data = CacheFile::default();
        self.dirty = false;
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        info!(path = %self.path.display(), "cache cleared");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::model::Tally;
    use chrono::Utc;

    pub(crate) fn temp_cache_path() -> PathBuf {
        std::env::temp_dir().join(format!("election-monitor-cache-{}.json", uuid::Uuid::new_v4()))
    }

    fn result(country: &str, votes: u64) -> ElectionResult {
        ElectionResult {
            country: CountryId::new(country),
            tallies: vec![Tally::new("Precinct", votes)],
            retrieved_at: Utc::now(),
        }
    }

    #[test]
    fn test_get_put_and_reopen() {
        let path = temp_cache_path();
        let mut cache = ResultCache::open(&path);
        assert!(cache.is_empty());

        cache.put(result("GERMANIA", 10), "http://x/now.json").unwrap();
        assert_eq!(cache.get(&CountryId::new("GERMANIA")).unwrap().total_votes(), 10);

        let reopened = ResultCache::open(&path);
        assert_eq!(reopened.len(), 1);
        let entry = reopened.entry(&CountryId::new("germania")).unwrap();
        assert_eq!(entry.result.total_votes(), 10);
        assert_eq!(entry.source_url, "http://x/now.json");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_put_overwrites() {
        let path = temp_cache_path();
        let mut cache = ResultCache::open(&path);
        cache.put(result("ITALIA", 1), "").unwrap();
        cache.put(result("ITALIA", 2), "").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&CountryId::new("ITALIA")).unwrap().total_votes(), 2);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_failed_write_restores_previous_entry() {
        let path = temp_cache_path();
        let mut cache = ResultCache::open(&path);
        cache.put(result("GERMANIA", 200), "").unwrap();

        // a directory in place of the file makes the write fail
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(cache.put(result("GERMANIA", 999), "").is_err());
        assert_eq!(cache.get(&CountryId::new("GERMANIA")).unwrap().total_votes(), 200);
        assert!(cache.put(result("ITALIA", 5), "").is_err());
        assert!(cache.get(&CountryId::new("ITALIA")).is_none());
        assert!(!cache.dirty);

        let _ = fs::remove_dir(&path);
    }

    #[test]
    fn test_unreadable_path_loads_empty() {
        let path = temp_cache_path();
        fs::create_dir(&path).unwrap();
        let cache = ResultCache::open(&path);
        assert!(cache.is_empty());
        let _ = fs::remove_dir(&path);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let path = temp_cache_path();
        fs::write(&path, "{ not json").unwrap();
        let cache = ResultCache::open(&path);
        assert!(cache.is_empty());
        assert!(cache.countries().is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_snapshots_persist_on_flush() {
        let path = temp_cache_path();
        let mut cache = ResultCache::open(&path);
        cache.put_snapshot("TOTAL|u1", 5);
        assert!(!path.exists());
        cache.flush().unwrap();

        let reopened = ResultCache::open(&path);
        assert_eq!(reopened.snapshot("TOTAL|u1"), Some(5));
        assert_eq!(reopened.snapshot("TOTAL|u2"), None);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_clear_removes_file() {
        let path = temp_cache_path();
        let mut cache = ResultCache::open(&path);
        cache.set_countries(vec!["SPANIA".to_string()]).unwrap();
        assert!(path.exists());

        cache.clear().unwrap();
        assert!(!path.exists());
        assert!(cache.countries().is_none());
    }
}
