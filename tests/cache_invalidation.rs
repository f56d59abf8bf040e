//! End-to-end cache scenarios: evaluation verdicts feeding the store, and
//! repository events evicting exactly the keys they should.

mod common;

use std::sync::Arc;

use common::{item, reference_property, InMemoryRepo, InMemorySites, RestrictedSet};
use time::OffsetDateTime;
use uuid::Uuid;

use vetrina::application::{ContentDeliveryService, DeliveryParts};
use vetrina::cache::{
    keys, CacheConfig, CachedEntry, ContentEvent, EvaluateResult, EventHub, RequestSignature,
    SiteEvent,
};
use vetrina::config::DeliveryOptions;
use vetrina::convert::{ConverterRegistry, ExpandSet, FilterPipeline, PropertyModelFactory};
use vetrina::domain::{ContentId, Language, SiteDefinition};

fn build(
    repo: InMemoryRepo,
    sites: InMemorySites,
    access: Arc<RestrictedSet>,
) -> (ContentDeliveryService, Arc<EventHub>) {
    let hub = Arc::new(EventHub::new());
    let parts = DeliveryParts {
        options: Arc::new(DeliveryOptions::default().normalize()),
        cache: CacheConfig::default(),
        registry: Arc::new(ConverterRegistry::with_defaults()),
        factory: Arc::new(PropertyModelFactory::with_defaults()),
        filters: Arc::new(FilterPipeline::default()),
        repo: Arc::new(repo),
        sites: Arc::new(sites),
        access,
    };
    (
        ContentDeliveryService::new(parts, Arc::clone(&hub)),
        hub,
    )
}

fn entry(etag: &str) -> CachedEntry {
    CachedEntry {
        body: b"{}".to_vec(),
        etag: etag.to_string(),
        expires: None,
    }
}

#[test]
fn repeated_evaluation_of_one_conversion_yields_one_etag() {
    let mut repo = InMemoryRepo::new();
    let mut root = item(1, "Start", "en");
    root.properties.push(reference_property("Related", 2));
    repo.add(root);
    repo.add(item(2, "Related", "en"));

    let (service, _hub) = build(repo, InMemorySites::default(), RestrictedSet::restricting([]));
    let ctx = service
        .context(Language::new("en"))
        .with_expand(ExpandSet::parse("Related"));
    let (_, tracking) = service.convert(ContentId(1), &ctx).expect("converted");

    let request = RequestSignature::new("/api/content/1").with_header("Accept", "application/json");
    let first = service.evaluate_content(&request, &tracking);
    let second = service.evaluate_content(&request, &tracking);

    let EvaluateResult::Cachable { etag: tag_a, .. } = first else {
        panic!("expected cachable");
    };
    let EvaluateResult::Cachable { etag: tag_b, .. } = second else {
        panic!("expected cachable");
    };
    assert_eq!(tag_a, tag_b);
}

#[test]
fn exposed_restricted_reference_blocks_caching() {
    let mut repo = InMemoryRepo::new();
    let mut root = item(1, "Start", "en");
    root.properties.push(reference_property("Related", 2));
    repo.add(root);
    repo.add(item(2, "Secret", "en"));

    let (service, _hub) = build(repo, InMemorySites::default(), RestrictedSet::restricting([2]));
    let ctx = service
        .context(Language::new("en"))
        .with_expand(ExpandSet::parse("Related"));
    let (_, tracking) = service.convert(ContentId(1), &ctx).expect("converted");

    let result = service.evaluate_content(&RequestSignature::new("/api/content/1"), &tracking);
    assert_eq!(result, EvaluateResult::NotCachable);
}

#[test]
fn opaque_restricted_reference_remains_cachable() {
    let mut repo = InMemoryRepo::new();
    let mut root = item(1, "Start", "en");
    root.properties.push(reference_property("Related", 2));
    repo.add(root);
    repo.add(item(2, "Secret", "en"));

    let (service, _hub) = build(repo, InMemorySites::default(), RestrictedSet::restricting([2]));
    // No expand-set: the restricted target stays an opaque reference.
    let ctx = service.context(Language::new("en"));
    let (_, tracking) = service.convert(ContentId(1), &ctx).expect("converted");

    let result = service.evaluate_content(&RequestSignature::new("/api/content/1"), &tracking);
    assert!(result.is_cachable());
}

#[test]
fn conversion_keys_flow_into_store_and_out_again_on_move() {
    let mut repo = InMemoryRepo::new();
    repo.add(item(10, "Moving", "en"));
    repo.set_descendants(ContentId(10), vec![ContentId(11), ContentId(12)]);

    let (service, hub) = build(repo, InMemorySites::default(), RestrictedSet::restricting([]));
    let ctx = service.context(Language::new("en"));
    let (_, tracking) = service.convert(ContentId(10), &ctx).expect("converted");

    let request = RequestSignature::new("/api/content/10");
    let EvaluateResult::Cachable {
        etag, dependencies, ..
    } = service.evaluate_content(&request, &tracking)
    else {
        panic!("expected cachable");
    };
    service.store().insert("resp:/api/content/10", entry(&etag), dependencies);
    assert!(service.store().get("resp:/api/content/10").is_some());

    // Unrelated cached response must survive the move.
    service.store().insert(
        "resp:/api/content/99",
        entry("\"other\""),
        [keys::common(ContentId(99))].into_iter().collect(),
    );

    hub.dispatch_content(&ContentEvent::Moved {
        id: ContentId(10),
        old_parent: ContentId(1),
        new_parent: ContentId(2),
    });

    assert!(service.store().get("resp:/api/content/10").is_none());
    assert!(service.store().get("resp:/api/content/99").is_some());
}

#[test]
fn children_listing_invalidated_by_first_publish_under_parent() {
    let mut repo = InMemoryRepo::new();
    repo.add(item(5, "Parent", "en"));

    let (service, hub) = build(repo, InMemorySites::default(), RestrictedSet::restricting([]));
    let request = RequestSignature::new("/api/content/5/children");
    let EvaluateResult::Cachable {
        etag, dependencies, ..
    } = service.evaluate_children(&request, &vetrina::convert::TrackingContext::new())
    else {
        panic!("expected cachable");
    };
    assert!(dependencies.contains(&keys::children(ContentId(5))));
    service
        .store()
        .insert("resp:/api/content/5/children", entry(&etag), dependencies);

    hub.dispatch_content(&ContentEvent::Published {
        id: ContentId(6),
        parent: ContentId(5),
        language: Language::new("en"),
        first_for_language: true,
    });

    assert!(service.store().get("resp:/api/content/5/children").is_none());
}

#[test]
fn language_delete_preserves_other_language_responses() {
    let repo = InMemoryRepo::new();
    let (service, hub) = build(repo, InMemorySites::default(), RestrictedSet::restricting([]));

    // One response depends on the common key, one only on the en key.
    service.store().insert(
        "resp:sv",
        entry("\"sv\""),
        [keys::common(ContentId(10))].into_iter().collect(),
    );
    service.store().insert(
        "resp:en",
        entry("\"en\""),
        [keys::language(ContentId(10), &Language::new("en"))]
            .into_iter()
            .collect(),
    );

    hub.dispatch_content(&ContentEvent::LanguageDeleted {
        id: ContentId(10),
        language: Language::new("sv"),
    });

    assert!(service.store().get("resp:sv").is_none());
    assert!(service.store().get("resp:en").is_some());
}

#[test]
fn site_rename_finds_placeholder_even_without_cached_response() {
    let site_id = Uuid::new_v4();
    let mut sites = InMemorySites::default();
    sites.add(SiteDefinition {
        id: site_id,
        name: "default".to_string(),
        last_saved: OffsetDateTime::UNIX_EPOCH,
    });

    let (service, hub) = build(InMemoryRepo::new(), sites, RestrictedSet::restricting([]));
    let mut tracking = vetrina::convert::TrackingContext::new();
    tracking.record_site(site_id);

    let result = service.evaluate_site(&RequestSignature::new("/api/site"), &tracking);
    assert!(result.is_cachable());
    assert!(service.store().has_master(&keys::site(site_id)));

    hub.dispatch_site(&SiteEvent::Updated { id: site_id });
    assert!(!service.store().has_master(&keys::site(site_id)));
}

#[test]
fn disabled_output_cache_never_caches() {
    let mut repo = InMemoryRepo::new();
    repo.add(item(1, "Start", "en"));

    let hub = Arc::new(EventHub::new());
    let parts = DeliveryParts {
        options: Arc::new(DeliveryOptions::default().normalize()),
        cache: CacheConfig {
            enable_output_cache: false,
            ..Default::default()
        },
        registry: Arc::new(ConverterRegistry::with_defaults()),
        factory: Arc::new(PropertyModelFactory::with_defaults()),
        filters: Arc::new(FilterPipeline::default()),
        repo: Arc::new(repo),
        sites: Arc::new(InMemorySites::default()),
        access: RestrictedSet::restricting([]),
    };
    let service = ContentDeliveryService::new(parts, hub);

    let ctx = service.context(Language::new("en"));
    let (_, tracking) = service.convert(ContentId(1), &ctx).expect("converted");
    let result = service.evaluate_content(&RequestSignature::new("/api/content/1"), &tracking);
    assert_eq!(result, EvaluateResult::NotCachable);
}

#[test]
fn shutdown_unregisters_propagators() {
    let (service, hub) = build(
        InMemoryRepo::new(),
        InMemorySites::default(),
        RestrictedSet::restricting([]),
    );
    assert_eq!(hub.content_listener_count(), 1);
    assert_eq!(hub.site_listener_count(), 1);

    service.shutdown();
    assert_eq!(hub.content_listener_count(), 0);
    assert_eq!(hub.site_listener_count(), 0);

    // Dispatch after shutdown must be a quiet no-op.
    hub.dispatch_content(&ContentEvent::LanguageDeleted {
        id: ContentId(1),
        language: Language::new("en"),
    });
}
