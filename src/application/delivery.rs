//! Content delivery facade.
//!
//! Wires the conversion pipeline, the cache evaluators, the output cache
//! store, and the dependency propagators into one service the transport
//! layer talks to.

use std::sync::Arc;

use tracing::info;

use crate::cache::evaluate::{
    AncestorsCacheEvaluator, ChildrenCacheEvaluator, ContentCacheEvaluator, EvaluateResult,
    OutputCacheEvaluator, RequestSignature, SiteCacheEvaluator,
};
use crate::cache::events::{EventHub, ListenerId};
use crate::cache::propagate::{ContentEviction, SiteEviction};
use crate::cache::store::OutputCacheStore;
use crate::cache::CacheConfig;
use crate::config::DeliveryOptions;
use crate::convert::{
    ContentMapper, ContentModel, ContextMode, ConverterContext, ConverterRegistry, FilterPipeline,
    PropertyModelFactory, TrackingContext,
};
use crate::domain::{ContentId, ConvertError, Language};

use super::repos::{AccessChecker, ContentRepo, SiteRepo};

const SOURCE: &str = "application::delivery";

/// Everything the delivery core needs at construction time.
pub struct DeliveryParts {
    pub options: Arc<DeliveryOptions>,
    pub cache: CacheConfig,
    pub registry: Arc<ConverterRegistry>,
    pub factory: Arc<PropertyModelFactory>,
    pub filters: Arc<FilterPipeline>,
    pub repo: Arc<dyn ContentRepo>,
    pub sites: Arc<dyn SiteRepo>,
    pub access: Arc<dyn AccessChecker>,
}

/// The conversion-and-cache core exposed to the transport layer.
pub struct ContentDeliveryService {
    options: Arc<DeliveryOptions>,
    cache_enabled: bool,
    mapper: ContentMapper,
    repo: Arc<dyn ContentRepo>,
    access: Arc<dyn AccessChecker>,
    store: Arc<OutputCacheStore>,
    hub: Arc<EventHub>,
    propagator_ids: Vec<ListenerId>,
    content_evaluator: ContentCacheEvaluator,
    children_evaluator: ChildrenCacheEvaluator,
    ancestors_evaluator: AncestorsCacheEvaluator,
    site_evaluator: SiteCacheEvaluator,
}

impl ContentDeliveryService {
    /// Build the service and register the dependency propagators on the
    /// event hub. [`ContentDeliveryService::shutdown`] unregisters exactly
    /// what was registered here.
    pub fn new(parts: DeliveryParts, hub: Arc<EventHub>) -> Self {
        let store = Arc::new(OutputCacheStore::new(&parts.cache));

        let content_propagator = Arc::new(ContentEviction::new(
            Arc::clone(&store),
            Arc::clone(&parts.repo),
        ));
        let site_propagator = Arc::new(SiteEviction::new(Arc::clone(&store)));
        let propagator_ids = vec![
            hub.register_content(content_propagator),
            hub.register_site(site_propagator),
        ];

        let mapper = ContentMapper::new(
            Arc::clone(&parts.registry),
            Arc::clone(&parts.factory),
            Arc::clone(&parts.filters),
            Arc::clone(&parts.repo),
            Arc::clone(&parts.access),
        );

        info!(target_module = SOURCE, "Content delivery service ready");
        Self {
            content_evaluator: ContentCacheEvaluator::new(Arc::clone(&parts.options)),
            children_evaluator: ChildrenCacheEvaluator::new(Arc::clone(&parts.repo)),
            ancestors_evaluator: AncestorsCacheEvaluator::new(Arc::clone(&parts.repo)),
            site_evaluator: SiteCacheEvaluator::new(Arc::clone(&parts.sites), Arc::clone(&store)),
            cache_enabled: parts.cache.enable_output_cache,
            options: parts.options,
            mapper,
            repo: parts.repo,
            access: parts.access,
            store,
            hub,
            propagator_ids,
        }
    }

    /// Convert one content item into its DTO, accumulating tracking facts.
    ///
    /// Root lookup failure surfaces as `NotFound`. In the default context
    /// mode an access-restricted root surfaces as `Forbidden`; edit and
    /// preview modes imply an authenticated editor and proceed, while the
    /// security fact is still recorded for the evaluators.
    pub fn convert(
        &self,
        id: ContentId,
        ctx: &ConverterContext,
    ) -> Result<(ContentModel, TrackingContext), ConvertError> {
        let content = self
            .repo
            .get(id, Some(&ctx.language))?
            .ok_or(ConvertError::NotFound(id))?;

        if ctx.mode == ContextMode::Default && !self.access.anonymous_can_read(id) {
            return Err(ConvertError::Forbidden(id));
        }

        let mut tracking = TrackingContext::new();
        let model = self.mapper.convert(&content, ctx, &mut tracking)?;
        Ok((model, tracking))
    }

    /// A fresh converter context for one request.
    pub fn context(&self, language: Language) -> ConverterContext {
        ConverterContext::new(Arc::clone(&self.options), language)
    }

    pub fn evaluate_content(
        &self,
        request: &RequestSignature,
        tracking: &TrackingContext,
    ) -> EvaluateResult {
        if !self.cache_enabled {
            return EvaluateResult::NotCachable;
        }
        self.content_evaluator.evaluate(request, tracking)
    }

    pub fn evaluate_children(
        &self,
        request: &RequestSignature,
        tracking: &TrackingContext,
    ) -> EvaluateResult {
        if !self.cache_enabled {
            return EvaluateResult::NotCachable;
        }
        self.children_evaluator.evaluate(request, tracking)
    }

    pub fn evaluate_ancestors(
        &self,
        request: &RequestSignature,
        tracking: &TrackingContext,
    ) -> EvaluateResult {
        if !self.cache_enabled {
            return EvaluateResult::NotCachable;
        }
        self.ancestors_evaluator.evaluate(request, tracking)
    }

    pub fn evaluate_site(
        &self,
        request: &RequestSignature,
        tracking: &TrackingContext,
    ) -> EvaluateResult {
        if !self.cache_enabled {
            return EvaluateResult::NotCachable;
        }
        self.site_evaluator.evaluate(request, tracking)
    }

    pub fn store(&self) -> &Arc<OutputCacheStore> {
        &self.store
    }

    pub fn options(&self) -> &Arc<DeliveryOptions> {
        &self.options
    }

    /// Deterministic teardown: unregister the propagators registered in
    /// [`ContentDeliveryService::new`].
    pub fn shutdown(&self) {
        for id in &self.propagator_ids {
            self.hub.unregister(*id);
        }
        info!(target_module = SOURCE, "Content delivery service stopped");
    }
}
