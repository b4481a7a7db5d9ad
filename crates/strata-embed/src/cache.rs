//! Query embedding cache.
//!
//! Keyed on the exact question string, bounded, least-recently-used eviction,
//! no TTL: entries live until evicted or the process exits.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use lru::LruCache;
use tracing::debug;

use strata_core::traits::Embedder;

pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Mutex<LruCache<String, Arc<Vec<f32>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedEmbedder {
    /// A zero capacity is raised to one entry.
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { inner, cache: Mutex::new(LruCache::new(capacity)), hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    /// Embed a question, consulting the cache first. The lock is not held
    /// while the inner embedder runs; racing misses for the same text both
    /// compute and the last insert wins.
    pub fn embed_query(&self, question: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.lock().get(question).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("query embedding cache hit");
            return Ok(hit.as_ref().clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let vector = self.inner.embed(question)?;
        self.lock().put(question.to_string(), Arc::new(vector.clone()));
        Ok(vector)
    }

    pub fn hits(&self) -> u64 { self.hits.load(Ordering::Relaxed) }
    pub fn misses(&self) -> u64 { self.misses.load(Ordering::Relaxed) }
    pub fn len(&self) -> usize { self.lock().len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<Vec<f32>>>> {
        // a panic while holding the lock cannot leave a half-written entry
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
