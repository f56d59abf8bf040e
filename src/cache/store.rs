//! Dependency-tracked output cache store.
//!
//! Responses are stored under opaque response keys and registered against
//! the dependency keys their conversion touched. A bidirectional index
//! (dependency key → dependent response keys, and back) makes eviction
//! exact: evicting one dependency removes precisely the responses that
//! depend on it. Master entries exist for dependency keys independent of
//! any cached response, so an eviction always finds its target even when
//! nothing was cached yet.
//!
//! All operations support concurrent callers; propagators run on the
//! repository's notification thread alongside in-flight requests.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use lru::LruCache;
use time::OffsetDateTime;
use tracing::debug;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// One cached response.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub body: Vec<u8>,
    pub etag: String,
    pub expires: Option<OffsetDateTime>,
}

/// Concurrent response store with exact dependency eviction.
///
/// The two index locks are never held at the same time; each map is
/// updated under its own lock, so insert and evict can interleave
/// freely across threads.
pub struct OutputCacheStore {
    entries: RwLock<LruCache<String, CachedEntry>>,
    /// Dependency keys currently known, cached response or not.
    masters: RwLock<HashSet<String>>,
    dependency_to_entries: RwLock<HashMap<String, HashSet<String>>>,
    entry_to_dependencies: RwLock<HashMap<String, HashSet<String>>>,
}

impl OutputCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.response_limit_non_zero())),
            masters: RwLock::new(HashSet::new()),
            dependency_to_entries: RwLock::new(HashMap::new()),
            entry_to_dependencies: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedEntry> {
        rw_write(&self.entries, SOURCE, "get").get(key).cloned()
    }

    /// Insert a response registered against its dependency keys.
    ///
    /// Every dependency becomes a master entry; LRU overflow unregisters
    /// the displaced response from the index.
    pub fn insert(&self, key: impl Into<String>, entry: CachedEntry, dependencies: HashSet<String>) {
        let key = key.into();
        // Re-inserting an existing key replaces its dependency set.
        self.unregister(&key);
        {
            let mut masters = rw_write(&self.masters, SOURCE, "insert.masters");
            for dependency in &dependencies {
                masters.insert(dependency.clone());
            }
        }
        {
            let mut by_entry = rw_write(&self.entry_to_dependencies, SOURCE, "insert.by_entry");
            by_entry.insert(key.clone(), dependencies.clone());
        }
        {
            let mut by_dependency =
                rw_write(&self.dependency_to_entries, SOURCE, "insert.by_dependency");
            for dependency in &dependencies {
                by_dependency
                    .entry(dependency.clone())
                    .or_default()
                    .insert(key.clone());
            }
        }

        let displaced = rw_write(&self.entries, SOURCE, "insert.entries").push(key, entry);
        if let Some((displaced_key, _)) = displaced {
            self.unregister(&displaced_key);
        }
    }

    /// Ensure a master entry exists for a dependency key.
    ///
    /// Needed by the site evaluator: a rename/delete event must always
    /// find a key to evict, even if no response was ever cached.
    pub fn ensure_master(&self, dependency: &str) {
        let mut masters = rw_write(&self.masters, SOURCE, "ensure_master");
        if masters.insert(dependency.to_string()) {
            debug!(
                target_module = SOURCE,
                dependency, "Registered placeholder master entry"
            );
        }
    }

    pub fn has_master(&self, dependency: &str) -> bool {
        rw_read(&self.masters, SOURCE, "has_master").contains(dependency)
    }

    /// Evict one dependency key and every response depending on it.
    ///
    /// Idempotent; evicting an absent key is a no-op. Returns the number
    /// of responses removed.
    pub fn evict(&self, dependency: &str) -> usize {
        rw_write(&self.masters, SOURCE, "evict.masters").remove(dependency);

        let dependents = rw_write(&self.dependency_to_entries, SOURCE, "evict.by_dependency")
            .remove(dependency)
            .unwrap_or_default();

        let mut removed = 0;
        for key in &dependents {
            if rw_write(&self.entries, SOURCE, "evict.entries")
                .pop(key)
                .is_some()
            {
                removed += 1;
            }
            self.unregister(key);
        }
        if removed > 0 {
            debug!(
                target_module = SOURCE,
                dependency, removed, "Evicted dependent responses"
            );
        }
        removed
    }

    /// Drop one response key from the dependency index.
    fn unregister(&self, key: &str) {
        let dependencies = {
            let mut by_entry =
                rw_write(&self.entry_to_dependencies, SOURCE, "unregister.by_entry");
            by_entry.remove(key)
        };
        let Some(dependencies) = dependencies else {
            return;
        };
        let mut by_dependency =
            rw_write(&self.dependency_to_entries, SOURCE, "unregister.by_dependency");
        for dependency in dependencies {
            if let Some(keys) = by_dependency.get_mut(&dependency) {
                keys.remove(key);
                if keys.is_empty() {
                    by_dependency.remove(&dependency);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear.entries").clear();
        rw_write(&self.masters, SOURCE, "clear.masters").clear();
        rw_write(&self.dependency_to_entries, SOURCE, "clear.by_dependency").clear();
        rw_write(&self.entry_to_dependencies, SOURCE, "clear.by_entry").clear();
    }
}
