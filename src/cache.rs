//! LRU cache for rendered page content
//!
//! The page renderer is invoked once per visible, render-gated index; this
//! cache is what keeps "once" true across frames. Content is invalidated
//! wholesale on scale or document changes by keying on the scale (stored in
//! millionths for stable hashing) and rotation.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

/// Cache key for rendered pages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderKey {
    /// Zero-based page index
    pub page: usize,
    /// Scale factor in millionths
    pub scale_millionths: u32,
    /// Rotation in degrees
    pub rotation: i32,
}

impl RenderKey {
    #[must_use]
    pub fn new(page: usize, scale: f32, rotation: i32) -> Self {
        Self {
            page,
            scale_millionths: (scale * 1_000_000.0) as u32,
            rotation,
        }
    }
}

/// LRU cache over rendered page content of type `T`
pub struct RenderCache<T> {
    cache: LruCache<RenderKey, Arc<T>>,
}

impl<T> RenderCache<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached page, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, key: &RenderKey) -> Option<Arc<T>> {
        self.cache.get(key).cloned()
    }

    /// Check membership without promoting
    #[must_use]
    pub fn contains(&self, key: &RenderKey) -> bool {
        self.cache.contains(key)
    }

    /// Insert rendered content, returning a shared handle to it
    pub fn insert(&mut self, key: RenderKey, content: T) -> Arc<T> {
        let arc = Arc::new(content);
        self.cache.put(key, arc.clone());
        arc
    }

    /// Fetch or render: the renderer runs only on a miss
    pub fn get_or_insert_with(&mut self, key: RenderKey, render: impl FnOnce() -> T) -> Arc<T> {
        if let Some(content) = self.cache.get(&key) {
            return content.clone();
        }
        self.insert(key, render())
    }

    /// Drop everything, e.g. on document change
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}
