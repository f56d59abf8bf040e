//! Repository lifecycle events and listener registration.
//!
//! The repository collaborator delivers content and site mutation events;
//! listeners (the dependency propagators) are registered explicitly and
//! torn down exactly as registered. Dispatch is synchronous on the
//! caller's thread: eviction completes before `dispatch` returns, so a
//! mutation is never acknowledged with stale keys still registered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::info;
use uuid::Uuid;

use crate::domain::{ContentId, Language};

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::events";

/// Content-lifecycle mutation payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEvent {
    Moved {
        id: ContentId,
        old_parent: ContentId,
        new_parent: ContentId,
    },
    Published {
        id: ContentId,
        parent: ContentId,
        language: Language,
        /// True the first time this language variant is published.
        first_for_language: bool,
    },
    Deleted {
        id: ContentId,
        parent: ContentId,
        /// Descendants that went down with the item; enumerated by the
        /// repository before the subtree disappeared.
        descendants: Vec<ContentId>,
    },
    LanguageDeleted {
        id: ContentId,
        language: Language,
    },
    SecuritySaved {
        id: ContentId,
        parent: ContentId,
    },
}

/// Site-lifecycle mutation payloads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SiteEvent {
    Created { id: Uuid },
    Updated { id: Uuid },
    Deleted { id: Uuid },
}

pub trait ContentEventListener: Send + Sync {
    fn on_content_event(&self, event: &ContentEvent);
}

pub trait SiteEventListener: Send + Sync {
    fn on_site_event(&self, event: &SiteEvent);
}

/// Handle returned by registration; unregister exactly what was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener registry with synchronous dispatch.
pub struct EventHub {
    content: RwLock<Vec<(ListenerId, Arc<dyn ContentEventListener>)>>,
    site: RwLock<Vec<(ListenerId, Arc<dyn SiteEventListener>)>>,
    next_id: AtomicU64,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            content: RwLock::new(Vec::new()),
            site: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn register_content(&self, listener: Arc<dyn ContentEventListener>) -> ListenerId {
        let id = self.next_id();
        rw_write(&self.content, SOURCE, "register_content").push((id, listener));
        info!(target_module = SOURCE, listener_id = id.0, "Registered content event listener");
        id
    }

    pub fn register_site(&self, listener: Arc<dyn SiteEventListener>) -> ListenerId {
        let id = self.next_id();
        rw_write(&self.site, SOURCE, "register_site").push((id, listener));
        info!(target_module = SOURCE, listener_id = id.0, "Registered site event listener");
        id
    }

    /// Remove one listener; returns whether it was present.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut removed = false;
        {
            let mut listeners = rw_write(&self.content, SOURCE, "unregister.content");
            let before = listeners.len();
            listeners.retain(|(listener_id, _)| *listener_id != id);
            removed |= listeners.len() != before;
        }
        {
            let mut listeners = rw_write(&self.site, SOURCE, "unregister.site");
            let before = listeners.len();
            listeners.retain(|(listener_id, _)| *listener_id != id);
            removed |= listeners.len() != before;
        }
        removed
    }

    /// Deliver a content event to every registered listener, in
    /// registration order, on the calling thread.
    pub fn dispatch_content(&self, event: &ContentEvent) {
        let listeners: Vec<_> = rw_read(&self.content, SOURCE, "dispatch_content")
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener.on_content_event(event);
        }
    }

    pub fn dispatch_site(&self, event: &SiteEvent) {
        let listeners: Vec<_> = rw_read(&self.site, SOURCE, "dispatch_site")
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener.on_site_event(event);
        }
    }

    pub fn content_listener_count(&self) -> usize {
        rw_read(&self.content, SOURCE, "content_listener_count").len()
    }

    pub fn site_listener_count(&self) -> usize {
        rw_read(&self.site, SOURCE, "site_listener_count").len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ContentEvent>>,
    }

    impl ContentEventListener for Recorder {
        fn on_content_event(&self, event: &ContentEvent) {
            self.seen.lock().expect("lock").push(event.clone());
        }
    }

    #[test]
    fn dispatch_reaches_registered_listeners() {
        let hub = EventHub::new();
        let recorder = Arc::new(Recorder::default());
        hub.register_content(recorder.clone());

        let event = ContentEvent::LanguageDeleted {
            id: ContentId(1),
            language: Language::new("sv"),
        };
        hub.dispatch_content(&event);

        assert_eq!(recorder.seen.lock().expect("lock").as_slice(), &[event]);
    }

    #[test]
    fn unregister_removes_exactly_one_listener() {
        let hub = EventHub::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let first_id = hub.register_content(first.clone());
        hub.register_content(second.clone());

        assert!(hub.unregister(first_id));
        assert!(!hub.unregister(first_id));
        assert_eq!(hub.content_listener_count(), 1);

        hub.dispatch_content(&ContentEvent::LanguageDeleted {
            id: ContentId(1),
            language: Language::new("sv"),
        });
        assert!(first.seen.lock().expect("lock").is_empty());
        assert_eq!(second.seen.lock().expect("lock").len(), 1);
    }
}
