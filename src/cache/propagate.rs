//! Dependency propagators.
//!
//! Event listeners on repository mutations that compute the *exact*
//! dependency-key set to evict: never a blanket "evict everything"
//! fallback and never an under-approximation. Eviction is idempotent and
//! best-effort: when part of a key set cannot be computed (descendant
//! enumeration on an item that is already gone), the failure is logged
//! and the remaining keys are evicted anyway.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::repos::ContentRepo;
use crate::domain::ContentId;

use super::events::{ContentEvent, ContentEventListener, SiteEvent, SiteEventListener};
use super::keys;
use super::store::OutputCacheStore;

const SOURCE: &str = "cache::propagate";

/// Evicts content-dependent cache keys on content mutations.
pub struct ContentEviction {
    store: Arc<OutputCacheStore>,
    repo: Arc<dyn ContentRepo>,
}

impl ContentEviction {
    pub fn new(store: Arc<OutputCacheStore>, repo: Arc<dyn ContentRepo>) -> Self {
        Self { store, repo }
    }

    fn keys_for(&self, event: &ContentEvent) -> Vec<String> {
        match event {
            // URLs are hierarchical, so every descendant's URL changes too.
            ContentEvent::Moved {
                id,
                old_parent,
                new_parent,
            } => {
                let mut evict = vec![
                    keys::common(*id),
                    keys::children(*old_parent),
                    keys::children(*new_parent),
                ];
                evict.extend(self.descendant_commons(*id));
                evict
            }
            ContentEvent::Published {
                id,
                parent,
                language,
                first_for_language,
            } => {
                if *first_for_language {
                    vec![keys::children(*parent), keys::common(*id)]
                } else {
                    vec![keys::language(*id, language)]
                }
            }
            ContentEvent::Deleted {
                id,
                parent,
                descendants,
            } => {
                let mut evict = vec![keys::children(*parent), keys::common(*id)];
                evict.extend(descendants.iter().map(|d| keys::common(*d)));
                evict
            }
            ContentEvent::LanguageDeleted { id, .. } => vec![keys::common(*id)],
            // Inherited permissions may change anywhere below the item.
            ContentEvent::SecuritySaved { id, parent } => {
                let mut evict = vec![keys::common(*id), keys::children(*parent)];
                evict.extend(self.descendant_commons(*id));
                evict
            }
        }
    }

    fn descendant_commons(&self, id: ContentId) -> Vec<String> {
        match self.repo.descendants(id) {
            Ok(descendants) => descendants.into_iter().map(keys::common).collect(),
            Err(error) => {
                warn!(
                    target_module = SOURCE,
                    content_id = %id,
                    error = %error,
                    "Descendant enumeration failed; evicting remaining keys"
                );
                Vec::new()
            }
        }
    }
}

impl ContentEventListener for ContentEviction {
    fn on_content_event(&self, event: &ContentEvent) {
        let evict = self.keys_for(event);
        debug!(
            target_module = SOURCE,
            event = ?event,
            keys = evict.len(),
            "Evicting content dependency keys"
        );
        for key in evict {
            self.store.evict(&key);
        }
    }
}

/// Evicts site-dependent cache keys on site mutations.
pub struct SiteEviction {
    store: Arc<OutputCacheStore>,
}

impl SiteEviction {
    pub fn new(store: Arc<OutputCacheStore>) -> Self {
        Self { store }
    }
}

impl SiteEventListener for SiteEviction {
    fn on_site_event(&self, event: &SiteEvent) {
        self.store.evict(&keys::all_sites());
        match event {
            SiteEvent::Created { .. } => {}
            SiteEvent::Updated { id } | SiteEvent::Deleted { id } => {
                self.store.evict(&keys::site(*id));
            }
        }
    }
}
