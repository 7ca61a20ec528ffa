//! Per-path load cache.
//!
//! A loaded table is immutable, so the TUI and CLI share it behind an `Arc`
//! and only re-read the file when a different path is requested.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::PipelineError;
use crate::io::ingest::{self, Ingested};

#[derive(Debug, Default)]
pub struct LoadCache {
    entries: HashMap<PathBuf, Arc<Ingested>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached load for `path`, reading the file on first use.
    ///
    /// Failed loads are not cached, so a fixed file can be retried.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Ingested>, PipelineError> {
        let key = cache_key(path);
        if let Some(hit) = self.entries.get(&key) {
            debug!(path = %key.display(), "load cache hit");
            return Ok(Arc::clone(hit));
        }

        let loaded = Arc::new(ingest::load(path)?);
        self.entries.insert(key, Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_once_per_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title,variation,id,type,country,channel,2024-01-01_sales,2024-01-01_restocks").unwrap();
        writeln!(file, "A,red,1,shoe,US,web,1,2").unwrap();
        file.flush().unwrap();

        let mut cache = LoadCache::new();
        let first = cache.get_or_load(file.path()).unwrap();
        let second = cache.get_or_load(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let mut cache = LoadCache::new();
        assert!(cache.get_or_load(Path::new("/no/such/file.csv")).is_err());
        assert!(cache.is_empty());
    }
}
