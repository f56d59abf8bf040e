//! Content mapper.
//!
//! Orchestrates one content entity into a [`ContentModel`]: identity,
//! language, and parent always come from the entity's own data; each
//! declared property goes through converter resolution and the property
//! model factory; shape overrides and the filter pipeline adjust the
//! draft; expansion runs last against the post-filter property set.
//!
//! `convert` is a pure function of (content, context, registry state):
//! calling it twice with the same inputs yields structurally identical
//! models. All request-scoped mutation goes through the tracking context.

use std::sync::Arc;

use tracing::warn;

use crate::application::repos::{AccessChecker, ContentRepo};
use crate::convert::context::ConverterContext;
use crate::convert::expand::{ExpansionResolver, NestedMapper};
use crate::convert::factory::PropertyModelFactory;
use crate::convert::filters::FilterPipeline;
use crate::convert::model::{ContentModel, PropertyReferences};
use crate::convert::registry::ConverterRegistry;
use crate::convert::tracking::{ReferenceMeta, TrackingContext};
use crate::domain::{ContentItem, ConvertError, PropertyData, PropertyValue};

const SOURCE: &str = "convert::mapper";

pub struct ContentMapper {
    registry: Arc<ConverterRegistry>,
    factory: Arc<PropertyModelFactory>,
    filters: Arc<FilterPipeline>,
    expander: ExpansionResolver,
    repo: Arc<dyn ContentRepo>,
    access: Arc<dyn AccessChecker>,
}

impl ContentMapper {
    pub fn new(
        registry: Arc<ConverterRegistry>,
        factory: Arc<PropertyModelFactory>,
        filters: Arc<FilterPipeline>,
        repo: Arc<dyn ContentRepo>,
        access: Arc<dyn AccessChecker>,
    ) -> Self {
        let expander = ExpansionResolver::new(Arc::clone(&repo), Arc::clone(&access));
        Self {
            registry,
            factory,
            filters,
            expander,
            repo,
            access,
        }
    }

    /// Convert one root entity, including one level of expansion.
    pub fn convert(
        &self,
        content: &ContentItem,
        ctx: &ConverterContext,
        tracking: &mut TrackingContext,
    ) -> Result<ContentModel, ConvertError> {
        let mut model = self.map_one(content, ctx, tracking)?;
        // The root is always exposed, so its security fact is recorded
        // with the same anonymous-read check expansion uses.
        if !self.access.anonymous_can_read(content.reference.id) {
            tracking.record_secured(content.reference.id);
        }
        self.expander.resolve(&mut model, ctx, tracking, self)?;
        Ok(model)
    }

    /// Map base fields and properties, apply shape overrides and filters,
    /// and record the entity's reference metadata. No expansion.
    fn map_one(
        &self,
        content: &ContentItem,
        ctx: &ConverterContext,
        tracking: &mut TrackingContext,
    ) -> Result<ContentModel, ConvertError> {
        let mut model = ContentModel {
            reference: content.reference.clone(),
            name: content.name.clone(),
            language: content.language.clone(),
            existing_languages: content.existing_languages.clone(),
            master_language: content.master_language.clone(),
            content_type: content.type_chain.clone(),
            parent: content.parent.clone(),
            url: content.url.clone(),
            properties: Default::default(),
        };

        let mut exposed_personalized = false;
        for property in &content.properties {
            if !ctx.selects(&property.name) {
                continue;
            }
            if ctx.exclude_personalized && property.personalizable {
                continue;
            }
            if property.personalizable {
                exposed_personalized = true;
            }

            let converter = self.registry.resolve_property(property)?;
            let value = converter.convert(property, ctx);
            let mut property_model = self.factory.build(property, value, ctx)?;
            property_model.references = Self::references_of(property);

            self.track_link_targets(property, tracking);
            model.properties.insert(property.name.clone(), property_model);
        }

        if let Some(shape) = self.registry.resolve_shape(content) {
            shape.apply(&mut model, content, ctx);
        }
        self.filters.apply(content, &mut model, ctx);

        tracking.record_reference(
            content.reference.id,
            Some(content.language.clone()),
            ReferenceMeta {
                expires: content.expires,
                personalized: exposed_personalized,
            },
        );
        Ok(model)
    }

    fn references_of(property: &PropertyData) -> PropertyReferences {
        match &property.value {
            PropertyValue::Reference(reference) => PropertyReferences::Single(reference.clone()),
            PropertyValue::ReferenceList(references) => {
                PropertyReferences::Many(references.clone())
            }
            PropertyValue::Links(_) => PropertyReferences::Links,
            _ => PropertyReferences::None,
        }
    }

    /// Record internal targets of link and URL values as plain references.
    ///
    /// These never expose nested content, so they are reference-tracking
    /// only and never enter the secured set.
    fn track_link_targets(&self, property: &PropertyData, tracking: &mut TrackingContext) {
        match &property.value {
            PropertyValue::Links(links) => {
                for link in links {
                    let Some(guid) = link.target else { continue };
                    match self.repo.resolve_guid(guid) {
                        Ok(Some(id)) => tracking.record_reference(
                            id,
                            link.language.clone(),
                            ReferenceMeta::default(),
                        ),
                        Ok(None) => {}
                        Err(error) => warn!(
                            target_module = SOURCE,
                            property = %property.name,
                            error = %error,
                            "Permanent-link lookup failed while tracking a link target"
                        ),
                    }
                }
            }
            PropertyValue::Url(url) => {
                let Some(guid) = url.target else { return };
                match self.repo.resolve_guid(guid) {
                    Ok(Some(id)) => {
                        tracking.record_reference(id, None, ReferenceMeta::default());
                    }
                    Ok(None) => {}
                    Err(error) => warn!(
                        target_module = SOURCE,
                        property = %property.name,
                        error = %error,
                        "Permanent-link lookup failed while tracking a URL target"
                    ),
                }
            }
            _ => {}
        }
    }
}

impl NestedMapper for ContentMapper {
    fn map_nested(
        &self,
        content: &ContentItem,
        ctx: &ConverterContext,
        tracking: &mut TrackingContext,
    ) -> Result<ContentModel, ConvertError> {
        // One level only: no recursive expansion for nested models.
        self.map_one(content, ctx, tracking)
    }
}
