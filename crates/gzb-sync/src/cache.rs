use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use gzb_core::CanonicalArticle;
use tracing::debug;

#[derive(Debug)]
struct CacheEntry {
    captured_at: Instant,
    articles: Arc<Vec<CanonicalArticle>>,
}

/// Single-slot, time-expiring memo of the processed article list.
#[derive(Debug)]
pub struct ArticleCache {
    ttl: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

impl ArticleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, Option<CacheEntry>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn fresh(&self, entry: &CacheEntry) -> bool {
        entry.captured_at.elapsed() < self.ttl
    }

    /// Memoized list if it was captured within the TTL window.
    pub fn get(&self) -> Option<Arc<Vec<CanonicalArticle>>> {
        self.lock()
            .as_ref()
            .filter(|entry| self.fresh(entry))
            .map(|entry| Arc::clone(&entry.articles))
    }

    /// Returns the fresh memo or runs `compute` and stores its result.
    ///
    /// `compute` returning `None` means there was no data; nothing is memoized so
    /// the next call looks again.
    pub fn get_or_refresh<F>(&self, compute: F) -> Arc<Vec<CanonicalArticle>>
    where
        F: FnOnce() -> Option<Vec<CanonicalArticle>>,
    {
        let mut slot = self.lock();
        if let Some(entry) = slot.as_ref().filter(|entry| self.fresh(entry)) {
            debug!(articles = entry.articles.len(), "article cache hit");
            return Arc::clone(&entry.articles);
        }

        match compute() {
            Some(articles) => {
                let articles = Arc::new(articles);
                *slot = Some(CacheEntry {
                    captured_at: Instant::now(),
                    articles: Arc::clone(&articles),
                });
                articles
            }
            None => Arc::new(Vec::new()),
        }
    }

    pub fn invalidate(&self) {
        *self.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn article(id: &str) -> CanonicalArticle {
        CanonicalArticle {
            id: id.into(),
            title: id.into(),
            content: String::new(),
            summary: String::new(),
            category_id: "math".into(),
            cover_image: String::new(),
            publish_time: "2025-01-01".into(),
            original_link: None,
            read_count: 0,
            is_featured: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn serves_memo_within_ttl() {
        let cache = ArticleCache::new(Duration::from_secs(120));
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Some(vec![article("a")])
        };
        let first = cache.get_or_refresh(compute);
        let second = cache.get_or_refresh(compute);
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.get().is_some());
    }

    #[test]
    fn zero_ttl_recomputes_every_call() {
        let cache = ArticleCache::new(Duration::ZERO);
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Some(vec![article("a")])
        };
        cache.get_or_refresh(compute);
        cache.get_or_refresh(compute);
        assert_eq!(calls.get(), 2);
        assert!(cache.get().is_none());
    }

    #[test]
    fn missing_data_is_not_memoized() {
        let cache = ArticleCache::new(Duration::from_secs(120));
        assert!(cache.get_or_refresh(|| None).is_empty());
        assert!(cache.get().is_none());
        let refreshed = cache.get_or_refresh(|| Some(vec![article("b")]));
        assert_eq!(refreshed[0].id, "b");
    }

    #[test]
    fn invalidate_drops_the_slot() {
        let cache = ArticleCache::new(Duration::from_secs(120));
        cache.get_or_refresh(|| Some(vec![article("a")]));
        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
