//! Request-scoped reference and security tracking.
//!
//! Exactly one [`TrackingContext`] exists per in-flight conversion. It is
//! passed as `&mut` through every conversion signature, read once by the
//! cache evaluators, then discarded. Never shared across requests.

use std::collections::{HashMap, HashSet};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{ContentId, Language};

/// Per-reference metadata accumulated while converting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferenceMeta {
    /// Earliest explicit expiration seen for this reference.
    pub expires: Option<OffsetDateTime>,
    /// Whether an exposed property of this reference is personalizable.
    pub personalized: bool,
}

/// Accumulator of every content/site reference touched during one
/// conversion, and of which of those were exposed despite being
/// access-restricted.
#[derive(Debug, Default)]
pub struct TrackingContext {
    referenced: HashMap<(ContentId, Option<Language>), ReferenceMeta>,
    secured: HashSet<ContentId>,
    sites: HashSet<Uuid>,
}

impl TrackingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a referenced content item.
    ///
    /// Repeated records for the same `(id, language)` pair merge: the
    /// earliest expiration wins and the personalized flag is sticky.
    pub fn record_reference(
        &mut self,
        id: ContentId,
        language: Option<Language>,
        meta: ReferenceMeta,
    ) {
        let entry = self.referenced.entry((id, language)).or_default();
        entry.personalized |= meta.personalized;
        entry.expires = match (entry.expires, meta.expires) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    /// Record that an access-restricted item was exposed in the response.
    ///
    /// Touching a restricted reference without exposing it must NOT call
    /// this; opaque references to restricted content are safe to cache.
    pub fn record_secured(&mut self, id: ContentId) {
        self.secured.insert(id);
    }

    pub fn record_site(&mut self, site_id: Uuid) {
        self.sites.insert(site_id);
    }

    pub fn referenced(
        &self,
    ) -> impl Iterator<Item = (&(ContentId, Option<Language>), &ReferenceMeta)> {
        self.referenced.iter()
    }

    pub fn secured(&self) -> &HashSet<ContentId> {
        &self.secured
    }

    pub fn sites(&self) -> &HashSet<Uuid> {
        &self.sites
    }

    pub fn has_secured(&self) -> bool {
        !self.secured.is_empty()
    }

    /// Whether any referenced item carries an exposed personalized property.
    pub fn has_personalized(&self) -> bool {
        self.referenced.values().any(|m| m.personalized)
    }

    /// Earliest explicit expiration across all referenced content.
    pub fn earliest_expiration(&self) -> Option<OffsetDateTime> {
        self.referenced.values().filter_map(|m| m.expires).min()
    }
}
