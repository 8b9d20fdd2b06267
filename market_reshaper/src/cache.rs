//! Load cache keyed by source identity.
//!
//! The key is the resolved file list (path, size, modification time) plus the
//! load parameters, so editing or replacing a file always misses. Entries also
//! expire after the configured TTL.

use crate::config::SourceConfig;
use crate::data_loader::DataLoader;
use crate::error::{ReshapeError, Result};
use crate::models::Table;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileStamp {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: SourceConfig,
    pub files: Vec<FileStamp>,
}

impl CacheKey {
    pub fn for_source(source: &SourceConfig) -> Result<Self> {
        let mut files = Vec::new();
        for path in DataLoader::resolve_paths(source)? {
            let meta = std::fs::metadata(&path).map_err(|e| {
                ReshapeError::data_source(&source.name, format!("{}: {}", path.display(), e))
            })?;
            files.push(FileStamp {
                len: meta.len(),
                modified: meta.modified().ok(),
                path,
            });
        }
        Ok(Self {
            source: source.clone(),
            files,
        })
    }
}

struct CacheEntry {
    loaded_at: Instant,
    table: Arc<Table>,
}

pub struct CachedLoader {
    loader: DataLoader,
    ttl: Option<Duration>,
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl CachedLoader {
    /// `ttl = None` keeps entries until their files change.
    pub fn new(loader: DataLoader, ttl: Option<Duration>) -> Self {
        Self {
            loader,
            ttl,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn load(&mut self, source: &SourceConfig) -> Result<Arc<Table>> {
        let key = CacheKey::for_source(source)?;

        if let Some(entry) = self.entries.get(&key) {
            let fresh = self
                .ttl
                .map_or(true, |ttl| entry.loaded_at.elapsed() < ttl);
            if fresh {
                self.hits += 1;
                log::debug!("Cache hit for {}", source.name);
                return Ok(Arc::clone(&entry.table));
            }
        }

        self.misses += 1;
        log::debug!("Cache miss for {}, loading", source.name);

        // Stale keys for the same source are never hit again
        self.entries.retain(|k, _| k.source != *source);

        let table = Arc::new(self.loader.load(source)?);
        self.entries.insert(
            key,
            CacheEntry {
                loaded_at: Instant::now(),
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
