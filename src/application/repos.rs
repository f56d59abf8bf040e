//! Collaborator traits consumed by the conversion and cache layers.
//!
//! The pipeline is a single logical call stack; repository access is a
//! plain blocking call owned by the surrounding transport layer, so these
//! traits are synchronous.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{ContentId, ContentItem, Language, RepoError, SiteDefinition};

/// Read access to the content repository.
pub trait ContentRepo: Send + Sync {
    /// Load one content item, optionally in a specific language.
    /// `None` language lets the repository apply its own fallback.
    fn get(
        &self,
        id: ContentId,
        language: Option<&Language>,
    ) -> Result<Option<ContentItem>, RepoError>;

    /// Permanent-link lookup: global unique id to numeric identity.
    fn resolve_guid(&self, guid: Uuid) -> Result<Option<ContentId>, RepoError>;

    fn ancestors(&self, id: ContentId) -> Result<Vec<ContentId>, RepoError>;

    fn descendants(&self, id: ContentId) -> Result<Vec<ContentId>, RepoError>;

    fn last_saved(&self, id: ContentId) -> Result<Option<OffsetDateTime>, RepoError>;
}

/// Read access to site definitions.
pub trait SiteRepo: Send + Sync {
    fn site(&self, id: Uuid) -> Result<Option<SiteDefinition>, RepoError>;
}

/// Access-rights collaborator.
pub trait AccessChecker: Send + Sync {
    fn anonymous_can_read(&self, id: ContentId) -> bool;
}
