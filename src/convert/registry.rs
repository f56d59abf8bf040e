//! Converter registry.
//!
//! Holds property-level converters and content-level shape overrides, each
//! tagged with a predicate and an integer priority. Registrations are
//! evaluated once at build time into tables sorted by descending priority
//! with stable registration-order tie-breaking; resolution is a linear
//! first-match scan. Pure selection, no side effects.

use std::sync::Arc;

use serde_json::json;

use crate::convert::context::ConverterContext;
use crate::convert::model::ContentModel;
use crate::domain::{ContentItem, ConvertError, PropertyData, PropertyValue};

/// Converts a stored property value into its wire representation.
pub trait PropertyConverter: Send + Sync {
    fn convert(&self, property: &PropertyData, ctx: &ConverterContext) -> serde_json::Value;
}

impl std::fmt::Debug for dyn PropertyConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PropertyConverter")
    }
}

/// Adjusts the shape of a mapped model for one content family.
///
/// Runs after base mapping and before the filter pipeline, so extensions
/// can reshape a content family's model without touching the base mapper.
pub trait ModelShape: Send + Sync {
    fn apply(&self, model: &mut ContentModel, content: &ContentItem, ctx: &ConverterContext);
}

type PropertyPredicate = Box<dyn Fn(&PropertyData) -> bool + Send + Sync>;
type ContentPredicate = Box<dyn Fn(&ContentItem) -> bool + Send + Sync>;

struct PropertyEntry {
    priority: i32,
    seq: usize,
    matches: PropertyPredicate,
    converter: Arc<dyn PropertyConverter>,
}

struct ShapeEntry {
    priority: i32,
    seq: usize,
    matches: ContentPredicate,
    shape: Arc<dyn ModelShape>,
}

/// Registers converters during startup; [`RegistryBuilder::build`] produces
/// the immutable, sorted [`ConverterRegistry`] used for the process lifetime.
#[derive(Default)]
pub struct RegistryBuilder {
    properties: Vec<PropertyEntry>,
    shapes: Vec<ShapeEntry>,
    default_property: Option<Arc<dyn PropertyConverter>>,
}

impl RegistryBuilder {
    pub fn property<F>(mut self, priority: i32, matches: F, converter: Arc<dyn PropertyConverter>) -> Self
    where
        F: Fn(&PropertyData) -> bool + Send + Sync + 'static,
    {
        let seq = self.properties.len();
        self.properties.push(PropertyEntry {
            priority,
            seq,
            matches: Box::new(matches),
            converter,
        });
        self
    }

    /// Convenience: match a property by its declared data-type tag.
    pub fn property_for_type(self, priority: i32, data_type: &str, converter: Arc<dyn PropertyConverter>) -> Self {
        let data_type = data_type.to_string();
        self.property(priority, move |p| p.data_type == data_type, converter)
    }

    pub fn shape<F>(mut self, priority: i32, matches: F, shape: Arc<dyn ModelShape>) -> Self
    where
        F: Fn(&ContentItem) -> bool + Send + Sync + 'static,
    {
        let seq = self.shapes.len();
        self.shapes.push(ShapeEntry {
            priority,
            seq,
            matches: Box::new(matches),
            shape,
        });
        self
    }

    /// Fallback converter when no predicate matches.
    pub fn default_property(mut self, converter: Arc<dyn PropertyConverter>) -> Self {
        self.default_property = Some(converter);
        self
    }

    pub fn build(mut self) -> ConverterRegistry {
        // Descending priority; registration order breaks ties.
        self.properties
            .sort_by_key(|e| (std::cmp::Reverse(e.priority), e.seq));
        self.shapes
            .sort_by_key(|e| (std::cmp::Reverse(e.priority), e.seq));
        ConverterRegistry {
            properties: self.properties,
            shapes: self.shapes,
            default_property: self.default_property,
        }
    }
}

/// Immutable converter tables, safe for unsynchronized concurrent reads.
pub struct ConverterRegistry {
    properties: Vec<PropertyEntry>,
    shapes: Vec<ShapeEntry>,
    default_property: Option<Arc<dyn PropertyConverter>>,
}

impl ConverterRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry seeded with the built-in value converters.
    pub fn with_defaults() -> Self {
        Self::builder()
            .default_property(Arc::new(ValueConverter))
            .build()
    }

    /// Resolve exactly one converter for a property instance.
    pub fn resolve_property(
        &self,
        property: &PropertyData,
    ) -> Result<&Arc<dyn PropertyConverter>, ConvertError> {
        self.properties
            .iter()
            .find(|e| (e.matches)(property))
            .map(|e| &e.converter)
            .or(self.default_property.as_ref())
            .ok_or_else(|| ConvertError::UnsupportedType {
                property: property.name.clone(),
                data_type: property.data_type.clone(),
            })
    }

    /// Resolve at most one shape override for a content instance.
    pub fn resolve_shape(&self, content: &ContentItem) -> Option<&Arc<dyn ModelShape>> {
        self.shapes
            .iter()
            .find(|e| (e.matches)(content))
            .map(|e| &e.shape)
    }
}

/// Built-in converter covering scalars, references, links, and URLs.
///
/// Reference-shaped values serialize minimally here; the full identity
/// shape is applied by the wire layer.
pub struct ValueConverter;

impl PropertyConverter for ValueConverter {
    fn convert(&self, property: &PropertyData, _ctx: &ConverterContext) -> serde_json::Value {
        match &property.value {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Scalar(value) => value.clone(),
            PropertyValue::Reference(r) => json!({ "guidValue": r.guid }),
            PropertyValue::ReferenceList(refs) => json!(
                refs.iter()
                    .map(|r| json!({ "guidValue": r.guid }))
                    .collect::<Vec<_>>()
            ),
            PropertyValue::Links(links) => json!(
                links
                    .iter()
                    .map(|l| json!({ "text": l.text, "href": l.href }))
                    .collect::<Vec<_>>()
            ),
            PropertyValue::Url(url) => json!(url.href),
        }
    }
}
