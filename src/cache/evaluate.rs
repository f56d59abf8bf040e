//! Output cache evaluators.
//!
//! Each evaluator owns one dependency domain and turns a populated
//! tracking context (plus the request signature) into a cacheability
//! verdict, an ETag, and the dependency-key set the response must be
//! registered under.

use std::collections::HashSet;
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::application::repos::{ContentRepo, SiteRepo};
use crate::config::DeliveryOptions;
use crate::convert::TrackingContext;
use crate::domain::ContentId;

use super::etag;
use super::keys;
use super::store::OutputCacheStore;

const SOURCE: &str = "cache::evaluate";

/// Cacheability verdict for one response.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluateResult {
    NotCachable,
    Cachable {
        etag: String,
        dependencies: HashSet<String>,
        expires: Option<OffsetDateTime>,
    },
}

impl EvaluateResult {
    pub fn is_cachable(&self) -> bool {
        matches!(self, Self::Cachable { .. })
    }
}

/// The request facts evaluators may consult: path and raw headers.
#[derive(Debug, Clone, Default)]
pub struct RequestSignature {
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl RequestSignature {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// One cache evaluator per dependency domain.
pub trait OutputCacheEvaluator: Send + Sync {
    fn evaluate(&self, request: &RequestSignature, tracking: &TrackingContext) -> EvaluateResult;
}

// ============================================================================
// Content domain
// ============================================================================

/// Evaluates single-content responses from the tracking context.
pub struct ContentCacheEvaluator {
    options: Arc<DeliveryOptions>,
}

impl ContentCacheEvaluator {
    pub fn new(options: Arc<DeliveryOptions>) -> Self {
        Self { options }
    }
}

impl OutputCacheEvaluator for ContentCacheEvaluator {
    fn evaluate(&self, request: &RequestSignature, tracking: &TrackingContext) -> EvaluateResult {
        if tracking.has_secured() || tracking.has_personalized() {
            return EvaluateResult::NotCachable;
        }

        let mut dependencies = HashSet::new();
        let mut parts = Vec::new();
        for ((id, language), _) in tracking.referenced() {
            dependencies.insert(keys::common(*id));
            parts.push(keys::common(*id));
            if let Some(language) = language {
                dependencies.insert(keys::language(*id, language));
                parts.push(keys::language(*id, language));
            }
        }
        parts.extend(etag::header_parts(
            &self.options.etag_headers,
            &request.headers,
        ));

        EvaluateResult::Cachable {
            etag: etag::generate(parts),
            dependencies,
            expires: tracking.earliest_expiration(),
        }
    }
}

// ============================================================================
// Children / ancestors domains
// ============================================================================

/// Parse the parent identity from the path segment preceding `marker`.
///
/// Accepts a direct numeric identity or a global unique id resolved
/// through the permanent-link table.
fn parse_parent(path: &str, marker: &str, repo: &dyn ContentRepo) -> Option<ContentId> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let marker_index = segments.iter().position(|s| s.eq_ignore_ascii_case(marker))?;
    let parent = segments.get(marker_index.checked_sub(1)?)?;

    if let Ok(id) = parent.parse::<i32>() {
        return Some(ContentId(id));
    }
    let guid = Uuid::parse_str(parent).ok()?;
    match repo.resolve_guid(guid) {
        Ok(resolved) => resolved,
        Err(error) => {
            warn!(
                target_module = SOURCE,
                %guid,
                error = %error,
                "Permanent-link lookup failed while parsing request path"
            );
            None
        }
    }
}

fn parent_etag(parent: ContentId, repo: &dyn ContentRepo) -> String {
    let last_saved = repo
        .last_saved(parent)
        .ok()
        .flatten()
        .map(|stamp| stamp.unix_timestamp().to_string())
        .unwrap_or_default();
    etag::generate([parent.to_string(), last_saved])
}

/// Evaluates child-listing responses.
pub struct ChildrenCacheEvaluator {
    repo: Arc<dyn ContentRepo>,
}

impl ChildrenCacheEvaluator {
    pub fn new(repo: Arc<dyn ContentRepo>) -> Self {
        Self { repo }
    }
}

impl OutputCacheEvaluator for ChildrenCacheEvaluator {
    fn evaluate(&self, request: &RequestSignature, _tracking: &TrackingContext) -> EvaluateResult {
        let Some(parent) = parse_parent(&request.path, "children", self.repo.as_ref()) else {
            return EvaluateResult::NotCachable;
        };
        EvaluateResult::Cachable {
            etag: parent_etag(parent, self.repo.as_ref()),
            dependencies: HashSet::from([keys::children(parent)]),
            expires: None,
        }
    }
}

/// Evaluates ancestor-listing responses.
///
/// The dependency is the parent's own common key: ancestor lists change
/// whenever the node or an ancestor changes, which normal content
/// invalidation already tracks transitively.
pub struct AncestorsCacheEvaluator {
    repo: Arc<dyn ContentRepo>,
}

impl AncestorsCacheEvaluator {
    pub fn new(repo: Arc<dyn ContentRepo>) -> Self {
        Self { repo }
    }
}

impl OutputCacheEvaluator for AncestorsCacheEvaluator {
    fn evaluate(&self, request: &RequestSignature, _tracking: &TrackingContext) -> EvaluateResult {
        let Some(parent) = parse_parent(&request.path, "ancestors", self.repo.as_ref()) else {
            return EvaluateResult::NotCachable;
        };
        EvaluateResult::Cachable {
            etag: parent_etag(parent, self.repo.as_ref()),
            dependencies: HashSet::from([keys::common(parent)]),
            expires: None,
        }
    }
}

// ============================================================================
// Site domain
// ============================================================================

/// Evaluates site-definition responses.
pub struct SiteCacheEvaluator {
    sites: Arc<dyn SiteRepo>,
    store: Arc<OutputCacheStore>,
}

impl SiteCacheEvaluator {
    pub fn new(sites: Arc<dyn SiteRepo>, store: Arc<OutputCacheStore>) -> Self {
        Self { sites, store }
    }
}

impl OutputCacheEvaluator for SiteCacheEvaluator {
    fn evaluate(&self, _request: &RequestSignature, tracking: &TrackingContext) -> EvaluateResult {
        if tracking.sites().is_empty() {
            return EvaluateResult::NotCachable;
        }

        let mut dependencies = HashSet::new();
        let mut parts = Vec::new();
        for site_id in tracking.sites() {
            let key = keys::site(*site_id);
            // A later rename/delete must always find a key to evict, even
            // if this response never ends up cached.
            self.store.ensure_master(&key);
            dependencies.insert(key);

            let last_saved = self
                .sites
                .site(*site_id)
                .ok()
                .flatten()
                .map(|site| site.last_saved.unix_timestamp().to_string())
                .unwrap_or_default();
            parts.push(format!("{site_id}:{last_saved}"));
        }

        EvaluateResult::Cachable {
            etag: etag::generate(parts),
            dependencies,
            expires: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::cache::config::CacheConfig;
    use crate::convert::ReferenceMeta;
    use crate::domain::{Language, RepoError, SiteDefinition};

    struct StubRepo;

    impl ContentRepo for StubRepo {
        fn get(
            &self,
            _id: ContentId,
            _language: Option<&Language>,
        ) -> Result<Option<crate::domain::ContentItem>, RepoError> {
            Ok(None)
        }

        fn resolve_guid(&self, guid: Uuid) -> Result<Option<ContentId>, RepoError> {
            if guid == Uuid::nil() {
                Ok(Some(ContentId(77)))
            } else {
                Ok(None)
            }
        }

        fn ancestors(&self, _id: ContentId) -> Result<Vec<ContentId>, RepoError> {
            Ok(vec![])
        }

        fn descendants(&self, _id: ContentId) -> Result<Vec<ContentId>, RepoError> {
            Ok(vec![])
        }

        fn last_saved(&self, _id: ContentId) -> Result<Option<OffsetDateTime>, RepoError> {
            Ok(Some(OffsetDateTime::UNIX_EPOCH))
        }
    }

    struct StubSites;

    impl SiteRepo for StubSites {
        fn site(&self, id: Uuid) -> Result<Option<SiteDefinition>, RepoError> {
            Ok(Some(SiteDefinition {
                id,
                name: "default".to_string(),
                last_saved: OffsetDateTime::UNIX_EPOCH,
            }))
        }
    }

    fn options() -> Arc<DeliveryOptions> {
        Arc::new(DeliveryOptions::default().normalize())
    }

    #[test]
    fn secured_content_is_never_cachable() {
        let evaluator = ContentCacheEvaluator::new(options());
        let mut tracking = TrackingContext::new();
        tracking.record_reference(ContentId(1), None, ReferenceMeta::default());
        tracking.record_secured(ContentId(1));

        let result = evaluator.evaluate(&RequestSignature::new("/content/1"), &tracking);
        assert_eq!(result, EvaluateResult::NotCachable);
    }

    #[test]
    fn personalized_reference_is_never_cachable() {
        let evaluator = ContentCacheEvaluator::new(options());
        let mut tracking = TrackingContext::new();
        tracking.record_reference(
            ContentId(1),
            None,
            ReferenceMeta {
                expires: None,
                personalized: true,
            },
        );

        let result = evaluator.evaluate(&RequestSignature::new("/content/1"), &tracking);
        assert_eq!(result, EvaluateResult::NotCachable);
    }

    #[test]
    fn content_keys_cover_common_and_language_axes() {
        let evaluator = ContentCacheEvaluator::new(options());
        let mut tracking = TrackingContext::new();
        tracking.record_reference(
            ContentId(1),
            Some(Language::new("sv")),
            ReferenceMeta::default(),
        );
        tracking.record_reference(ContentId(2), None, ReferenceMeta::default());

        let EvaluateResult::Cachable { dependencies, .. } =
            evaluator.evaluate(&RequestSignature::new("/content/1"), &tracking)
        else {
            panic!("expected cachable");
        };
        assert_eq!(
            dependencies,
            HashSet::from([
                keys::common(ContentId(1)),
                keys::language(ContentId(1), &Language::new("sv")),
                keys::common(ContentId(2)),
            ])
        );
    }

    #[test]
    fn repeated_evaluation_is_deterministic() {
        let evaluator = ContentCacheEvaluator::new(options());
        let mut tracking = TrackingContext::new();
        tracking.record_reference(
            ContentId(1),
            Some(Language::new("en")),
            ReferenceMeta::default(),
        );
        tracking.record_reference(ContentId(2), None, ReferenceMeta::default());

        let request = RequestSignature::new("/content/1").with_header("Accept", "application/json");
        let first = evaluator.evaluate(&request, &tracking);
        let second = evaluator.evaluate(&request, &tracking);
        assert_eq!(first, second);
    }

    #[test]
    fn children_parses_numeric_parent() {
        let evaluator = ChildrenCacheEvaluator::new(Arc::new(StubRepo));
        let result = evaluator.evaluate(
            &RequestSignature::new("/api/content/42/children"),
            &TrackingContext::new(),
        );
        let EvaluateResult::Cachable { dependencies, .. } = result else {
            panic!("expected cachable");
        };
        assert_eq!(dependencies, HashSet::from([keys::children(ContentId(42))]));
    }

    #[test]
    fn children_parses_guid_parent_via_permanent_link() {
        let evaluator = ChildrenCacheEvaluator::new(Arc::new(StubRepo));
        let path = format!("/api/content/{}/children", Uuid::nil());
        let result = evaluator.evaluate(&RequestSignature::new(path), &TrackingContext::new());
        let EvaluateResult::Cachable { dependencies, .. } = result else {
            panic!("expected cachable");
        };
        assert_eq!(dependencies, HashSet::from([keys::children(ContentId(77))]));
    }

    #[test]
    fn children_without_parseable_parent_is_not_cachable() {
        let evaluator = ChildrenCacheEvaluator::new(Arc::new(StubRepo));
        let result = evaluator.evaluate(
            &RequestSignature::new("/api/content/children"),
            &TrackingContext::new(),
        );
        assert_eq!(result, EvaluateResult::NotCachable);
    }

    #[test]
    fn ancestors_depends_on_parent_common_key() {
        let evaluator = AncestorsCacheEvaluator::new(Arc::new(StubRepo));
        let result = evaluator.evaluate(
            &RequestSignature::new("/api/content/42/ancestors"),
            &TrackingContext::new(),
        );
        let EvaluateResult::Cachable { dependencies, .. } = result else {
            panic!("expected cachable");
        };
        assert_eq!(dependencies, HashSet::from([keys::common(ContentId(42))]));
    }

    #[test]
    fn site_evaluator_requires_referenced_sites() {
        let store = Arc::new(OutputCacheStore::new(&CacheConfig::default()));
        let evaluator = SiteCacheEvaluator::new(Arc::new(StubSites), store);
        let result = evaluator.evaluate(&RequestSignature::new("/api/site"), &TrackingContext::new());
        assert_eq!(result, EvaluateResult::NotCachable);
    }

    #[test]
    fn site_evaluator_registers_placeholder_masters() {
        let store = Arc::new(OutputCacheStore::new(&CacheConfig::default()));
        let evaluator = SiteCacheEvaluator::new(Arc::new(StubSites), Arc::clone(&store));
        let site_id = Uuid::new_v4();
        let mut tracking = TrackingContext::new();
        tracking.record_site(site_id);

        let result = evaluator.evaluate(&RequestSignature::new("/api/site"), &tracking);
        assert!(result.is_cachable());
        assert!(store.has_master(&keys::site(site_id)));
    }
}
