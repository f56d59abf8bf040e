//! Expansion resolver.
//!
//! Follows reference-valued properties one level deep: for every reference
//! in a property named by the expand-set, look up the target, check
//! anonymous-read access, and attach the nested model on success.
//! Expansion is strictly one level; nested models never expand further.
//!
//! Tracking asymmetry (load-bearing, do not unify): every visited
//! reference is recorded as a dependency, but only *expanded* references
//! that fail the access check are recorded as security facts. An opaque
//! reference to restricted content does not expose it and stays cacheable.
//! Link collections are never expanded and therefore never secured.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::repos::{AccessChecker, ContentRepo};
use crate::config::ExpansionLanguagePolicy;
use crate::convert::context::ConverterContext;
use crate::convert::model::{ContentModel, ExpandedValue, PropertyReferences};
use crate::convert::tracking::{ReferenceMeta, TrackingContext};
use crate::domain::{ContentItem, ContentReference, ConvertError, Language};

const SOURCE: &str = "convert::expand";

/// Maps an already-loaded entity one level deep, without further expansion.
///
/// Implemented by the content mapper; the indirection keeps the resolver
/// free of a direct mapper dependency.
pub trait NestedMapper {
    fn map_nested(
        &self,
        content: &ContentItem,
        ctx: &ConverterContext,
        tracking: &mut TrackingContext,
    ) -> Result<ContentModel, ConvertError>;
}

pub struct ExpansionResolver {
    repo: Arc<dyn ContentRepo>,
    access: Arc<dyn AccessChecker>,
}

impl ExpansionResolver {
    pub fn new(repo: Arc<dyn ContentRepo>, access: Arc<dyn AccessChecker>) -> Self {
        Self { repo, access }
    }

    /// Expand the post-filter property set of `model` in place.
    pub fn resolve(
        &self,
        model: &mut ContentModel,
        ctx: &ConverterContext,
        tracking: &mut TrackingContext,
        mapper: &dyn NestedMapper,
    ) -> Result<(), ConvertError> {
        for (name, property) in model.properties.iter_mut() {
            if !ctx.expand.contains(name) {
                continue;
            }
            match property.references.clone() {
                PropertyReferences::Single(reference) => {
                    property.expanded = self
                        .expand_one(&reference, ctx, tracking, mapper)?
                        .map(|nested| ExpandedValue::Single(Box::new(nested)));
                }
                PropertyReferences::Many(references) => {
                    let mut nested = Vec::new();
                    for reference in &references {
                        if let Some(model) = self.expand_one(reference, ctx, tracking, mapper)? {
                            nested.push(model);
                        }
                    }
                    property.expanded = Some(ExpandedValue::Many(nested));
                }
                // Links are tracked at mapping time and never inlined.
                PropertyReferences::Links | PropertyReferences::None => {}
            }
        }
        Ok(())
    }

    /// Expand a single reference, degrading to `None` when the target is
    /// missing or restricted.
    fn expand_one(
        &self,
        reference: &ContentReference,
        ctx: &ConverterContext,
        tracking: &mut TrackingContext,
        mapper: &dyn NestedMapper,
    ) -> Result<Option<ContentModel>, ConvertError> {
        let lookup_language = self.lookup_language(ctx);

        if !self.access.anonymous_can_read(reference.id) {
            // Exposing a restricted target: reference-track AND security-track.
            tracking.record_reference(
                reference.id,
                lookup_language.cloned(),
                ReferenceMeta::default(),
            );
            tracking.record_secured(reference.id);
            debug!(
                target_module = SOURCE,
                content_id = %reference.id,
                "Expansion target denied anonymous read"
            );
            return Ok(None);
        }

        let loaded = match self.repo.get(reference.id, lookup_language) {
            Ok(loaded) => loaded,
            Err(error) => {
                warn!(
                    target_module = SOURCE,
                    content_id = %reference.id,
                    error = %error,
                    "Expansion target lookup failed; leaving slot empty"
                );
                None
            }
        };

        let Some(target) = loaded else {
            tracking.record_reference(
                reference.id,
                lookup_language.cloned(),
                ReferenceMeta::default(),
            );
            return Ok(None);
        };

        // The nested mapper records the target's reference metadata,
        // including its personalization facts.
        mapper.map_nested(&target, ctx, tracking).map(Some)
    }

    fn lookup_language<'a>(&self, ctx: &'a ConverterContext) -> Option<&'a Language> {
        match ctx.options.expansion_language {
            ExpansionLanguagePolicy::RequestLanguage => Some(&ctx.language),
            ExpansionLanguagePolicy::ContentLanguage => None,
        }
    }
}
