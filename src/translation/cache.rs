/*!
 * Translation caching functionality.
 *
 * Providers consult this cache before a network call so repeated subtitle
 * lines ("Yes.", "Thank you.") are translated once per target language.
 * The cache is bounded; when full, the oldest half of the entries is evicted.
 */

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use parking_lot::RwLock;
use log::debug;

/// Cache key combining target language and source text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// Target language code
    target_language: String,

    /// Source text to translate
    source_text: String,
}

impl CacheKey {
    fn new(source_text: &str, target_language: &str) -> Self {
        Self {
            target_language: target_language.to_string(),
            source_text: source_text.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct CacheStore {
    entries: HashMap<CacheKey, String>,

    /// Keys in insertion order, oldest first
    order: VecDeque<CacheKey>,
}

/// Translation cache for storing and retrieving translations
#[derive(Debug)]
pub struct TranslationCache {
    /// Internal cache storage
    store: Arc<RwLock<CacheStore>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Maximum number of entries
    capacity: usize,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache holding at most `capacity` entries
    pub fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::default())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            capacity: capacity.max(1),
            enabled,
        }
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, target_language);
        let store = self.store.read();

        match store.entries.get(&key) {
            Some(translation) => {
                *self.hits.write() += 1;
                debug!("Cache hit for '{}' (-> {})", truncate_text(source_text, 30), target_language);
                Some(translation.clone())
            }
            None => {
                *self.misses.write() += 1;
                None
            }
        }
    }

    /// Store a translation in the cache
    pub fn store(&self, source_text: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(source_text, target_language);
        let mut store = self.store.write();

        if store.entries.insert(key.clone(), translation.to_string()).is_none() {
            store.order.push_back(key);
        }

        if store.entries.len() > self.capacity {
            let evict = store.entries.len() / 2;
            for _ in 0..evict {
                if let Some(oldest) = store.order.pop_front() {
                    store.entries.remove(&oldest);
                }
            }
            debug!("Translation cache full, evicted {} oldest entries", evict);
        }
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache
    pub fn clear(&self) {
        let mut store = self.store.write();
        store.entries.clear();
        store.order.clear();

        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Translation cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.store.read().entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.store.read().entries.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true, 1000)
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            capacity: self.capacity,
            enabled: self.enabled,
        }
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
