// this_file: src/cache.rs

//! Content-addressed cache of matched blocks.
//!
//! Maps the exact content of a block (dimensions plus bytes) to the
//! character chosen for it. Bounded with least-recently-used eviction. The
//! cache is owned by the coordinating thread of one run and only mutated
//! there, so it needs no locking.

use crate::bitmap::PixelBlock;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;

/// Lightweight stats for observability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Bounded block → character map.
#[derive(Debug)]
pub struct DedupCache {
    inner: LruCache<PixelBlock, char>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl DedupCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(cap),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up a block, promoting it to most recently used on a hit.
    pub fn get(&mut self, block: &PixelBlock) -> Option<char> {
        match self.inner.get(block) {
            Some(&ch) => {
                self.hits += 1;
                Some(ch)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up without touching recency or counters.
    pub fn peek(&self, block: &PixelBlock) -> Option<char> {
        self.inner.peek(block).copied()
    }

    /// Insert a result, evicting the least recently used entry when full.
    pub fn put(&mut self, block: PixelBlock, ch: char) {
        if let Some((evicted, _)) = self.inner.push(block, ch) {
            // `push` also hands back the old pair when the key was present.
            if self.inner.peek(&evicted).is_none() {
                self.evictions += 1;
            }
        }
    }

    pub fn contains(&self, block: &PixelBlock) -> bool {
        self.inner.contains(block)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.len(),
            capacity: self.capacity(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}
