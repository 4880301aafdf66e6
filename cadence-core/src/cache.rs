//! Search result cache using filesystem storage
//!
//! Stores catalog search results on disk keyed by a hash of the query, so a
//! busy server does not repeat the same catalog searches for every request.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::Result;
use crate::track::RawTrack;

/// File-based cache for catalog search results
#[derive(Debug, Clone)]
pub struct SearchCache {
    cache_dir: PathBuf,
    max_age: Duration,
}

/// On-disk entry
#[derive(Debug, Serialize, Deserialize)]
struct CachedSearch {
    query: String,
    limit: u32,
    /// Seconds since the Unix epoch
    fetched_at: u64,
    tracks: Vec<RawTrack>,
}

impl SearchCache {
    /// Create a new cache at the given directory
    pub fn new<P: AsRef<Path>>(cache_dir: P, max_age: Duration) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir, max_age })
    }

    /// Hash of the search parameters
    pub fn query_hash(query: &str, limit: u32) -> u64 {
        xxh3_64(format!("{}:{}", limit, query).as_bytes())
    }

    fn entry_path(&self, query: &str, limit: u32) -> PathBuf {
        self.cache_dir
            .join(format!("{:016x}.json", Self::query_hash(query, limit)))
    }

    /// Get cached results if present and fresh
    pub fn get(&self, query: &str, limit: u32) -> Option<Vec<RawTrack>> {
        let path = self.entry_path(query, limit);
        if !path.exists() {
            return None;
        }

        let file = File::open(&path).ok()?;
        let entry: CachedSearch = serde_json::from_reader(BufReader::new(file)).ok()?;

        // hash collision guard
        if entry.query != query || entry.limit != limit {
            return None;
        }
        if now_secs().saturating_sub(entry.fetched_at) > self.max_age.as_secs() {
            return None;
        }
        Some(entry.tracks)
    }

    /// Store search results
    pub fn put(&self, query: &str, limit: u32, tracks: &[RawTrack]) -> Result<()> {
        self.put_at(query, limit, tracks, now_secs())
    }

    fn put_at(&self, query: &str, limit: u32, tracks: &[RawTrack], fetched_at: u64) -> Result<()> {
        let entry = CachedSearch {
            query: query.to_string(),
            limit,
            fetched_at,
            tracks: tracks.to_vec(),
        };

        let file = File::create(self.entry_path(query, limit))?;
        serde_json::to_writer(BufWriter::new(file), &entry)?;
        Ok(())
    }

    /// Clear entire cache
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if is_cache_file(&entry.path()) {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let mut count = 0;
        let mut total_size = 0;

        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if is_cache_file(&entry.path()) {
                count += 1;
                total_size += entry.metadata()?.len();
            }
        }

        Ok(CacheStats {
            entry_count: count,
            total_size_bytes: total_size,
        })
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: u64,
}

fn is_cache_file(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
