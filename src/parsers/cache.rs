use anyhow::Result;
use dashmap::DashMap;
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::FileAnalysis;
use crate::core::Language;

const DEFAULT_MAX_MEMORY_ENTRIES: usize = 4096;

/// Thread-safe cache of per-file analyses keyed by language and content, so
/// re-analyzing an identical archive skips the heuristic extraction
pub struct AnalysisCache {
    memory_cache: DashMap<String, FileAnalysis>,
    cache_dir: Option<PathBuf>,
    max_memory_entries: usize,
}

impl AnalysisCache {
    /// Cache backed by `cache_dir` on disk (best effort) as well as memory
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        let resolved_dir =
            cache_dir.unwrap_or_else(|| std::env::temp_dir().join("repograph_cache"));
        let cache_dir = match fs::create_dir_all(&resolved_dir) {
            Ok(()) => Some(resolved_dir),
            Err(err) => {
                warn!(
                    "Failed to initialize disk cache at {}: {err}",
                    resolved_dir.display()
                );
                None
            }
        };

        Self {
            memory_cache: DashMap::with_capacity(DEFAULT_MAX_MEMORY_ENTRIES),
            cache_dir,
            max_memory_entries: DEFAULT_MAX_MEMORY_ENTRIES,
        }
    }

    pub fn in_memory_only() -> Self {
        Self {
            memory_cache: DashMap::with_capacity(DEFAULT_MAX_MEMORY_ENTRIES),
            cache_dir: None,
            max_memory_entries: DEFAULT_MAX_MEMORY_ENTRIES,
        }
    }

    pub fn key(language: Language, content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(language.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<FileAnalysis> {
        if let Some(entry) = self.memory_cache.get(key) {
            return Some(entry.clone());
        }

        let cache_path = self.cache_path(key)?;
        if !cache_path.exists() {
            return None;
        }
        match self.load_from_disk(&cache_path) {
            Ok(analysis) => {
                if self.memory_cache.len() < self.max_memory_entries {
                    self.memory_cache.insert(key.to_string(), analysis.clone());
                }
                Some(analysis)
            }
            Err(err) => {
                debug!("Ignoring unreadable cache entry {}: {}", cache_path.display(), err);
                None
            }
        }
    }

    pub fn store(&self, key: &str, analysis: &FileAnalysis) -> Result<()> {
        if self.memory_cache.len() >= self.max_memory_entries {
            if let Some(entry) = self.memory_cache.iter().next() {
                let evicted = entry.key().clone();
                drop(entry);
                self.memory_cache.remove(&evicted);
            }
        }
        self.memory_cache.insert(key.to_string(), analysis.clone());

        if let Some(cache_path) = self.cache_path(key) {
            self.store_to_disk(&cache_path, analysis)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.memory_cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory_cache.is_empty()
    }

    pub fn clear(&self) -> Result<()> {
        self.memory_cache.clear();
        if let Some(cache_dir) = &self.cache_dir {
            if cache_dir.exists() {
                fs::remove_dir_all(cache_dir)?;
                fs::create_dir_all(cache_dir)?;
            }
        }
        Ok(())
    }

    fn cache_path(&self, key: &str) -> Option<PathBuf> {
        let cache_dir = self.cache_dir.as_ref()?;
        Some(cache_dir.join(format!("analysis_{}.bincode", key)))
    }

    fn load_from_disk(&self, cache_path: &Path) -> Result<FileAnalysis> {
        let data = fs::read(cache_path)?;
        let analysis: FileAnalysis = bincode::deserialize(&data)?;
        Ok(analysis)
    }

    fn store_to_disk(&self, cache_path: &Path, analysis: &FileAnalysis) -> Result<()> {
        let data = bincode::serialize(analysis)?;
        fs::write(cache_path, data)?;
        Ok(())
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::in_memory_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FunctionSpan;

    fn sample() -> FileAnalysis {
        let mut analysis = FileAnalysis::empty();
        analysis.functions.insert(
            "foo".to_string(),
            FunctionSpan {
                line_start: 1,
                line_count: 3,
            },
        );
        analysis.imports.push("./a".to_string());
        analysis
    }

    #[test]
    fn key_depends_on_language_and_content() {
        let a = AnalysisCache::key(Language::JavaScript, "x");
        let b = AnalysisCache::key(Language::TypeScript, "x");
        let c = AnalysisCache::key(Language::JavaScript, "y");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, AnalysisCache::key(Language::JavaScript, "x"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn memory_round_trip() {
        let cache = AnalysisCache::in_memory_only();
        let key = AnalysisCache::key(Language::Python, "def foo(): pass");
        assert!(cache.get(&key).is_none());
        cache.store(&key, &sample()).unwrap();
        assert_eq!(cache.get(&key), Some(sample()));
        assert_eq!(cache.len(), 1);
    }
}
