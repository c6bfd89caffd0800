//! Bounded set of already-emitted event IDs.
//!
//! Once an ID is evicted it can be emitted again if a later fetch returns
//! it. Capacity is sized to one full filter page so this only happens when
//! a single window holds more events than a page.

use std::num::NonZeroUsize;

use lru::LruCache;

/// Least-recently-used set of event IDs.
pub struct DedupCache {
    seen: LruCache<String, ()>,
}

impl DedupCache {
    /// Creates a cache remembering at most `capacity` IDs (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            seen: LruCache::new(capacity),
        }
    }

    /// Records `id`, returning true if it was not already present.
    ///
    /// A hit does not refresh the entry's recency.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.put(id.to_string(), ());
        true
    }

    /// Returns true if `id` is remembered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Number of remembered IDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if no IDs are remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Maximum number of remembered IDs.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.seen.cap().get()
    }
}

impl std::fmt::Debug for DedupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
