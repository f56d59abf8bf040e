//! Property model factory.
//!
//! Builds the wire-model wrapper for a converted property value using the
//! most specific construction shape the target kind declares. The resolved
//! shape is cached per data-type tag after first use; that cache is a pure
//! performance optimization and the registry owns its only invalidation
//! trigger (a configuration reload rebuilds the factory).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::cache::lock::{rw_read, rw_write};
use crate::convert::context::ConverterContext;
use crate::convert::model::PropertyModel;
use crate::domain::{ConvertError, PropertyData};

const SOURCE: &str = "convert::factory";

/// The three supported construction shapes, least to most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConstructionShape {
    ValueOnly,
    WithPersonalization,
    WithContext,
}

/// One registered property-model kind.
///
/// `shapes()` declares which construction shapes the kind genuinely
/// implements; the factory dispatches directly to the most specific one.
/// The default builder bodies chain downward so a kind only overrides the
/// shapes it declares.
pub trait PropertyModelKind: Send + Sync {
    fn shapes(&self) -> Vec<ConstructionShape>;

    fn build_with_value(&self, property: &PropertyData, value: serde_json::Value)
        -> PropertyModel;

    fn build_with_personalization(
        &self,
        property: &PropertyData,
        value: serde_json::Value,
        excluded_from_personalization: bool,
    ) -> PropertyModel {
        let mut model = self.build_with_value(property, value);
        model.excluded_from_personalization = excluded_from_personalization;
        model
    }

    fn build_with_context(
        &self,
        property: &PropertyData,
        value: serde_json::Value,
        ctx: &ConverterContext,
    ) -> PropertyModel {
        self.build_with_personalization(property, value, ctx.exclude_personalized)
    }
}

/// Dispatch table from data-type tag to model kind, with a per-kind
/// resolved-shape cache.
pub struct PropertyModelFactory {
    kinds: HashMap<String, Arc<dyn PropertyModelKind>>,
    fallback: Option<Arc<dyn PropertyModelKind>>,
    resolved: RwLock<HashMap<String, ConstructionShape>>,
}

impl PropertyModelFactory {
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
            fallback: None,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// A factory whose fallback kind wraps any value verbatim.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.fallback = Some(Arc::new(PlainKind));
        factory
    }

    pub fn register(&mut self, data_type: impl Into<String>, kind: Arc<dyn PropertyModelKind>) {
        self.kinds.insert(data_type.into(), kind);
    }

    pub fn set_fallback(&mut self, kind: Arc<dyn PropertyModelKind>) {
        self.fallback = Some(kind);
    }

    /// Build a property model from a converted value.
    pub fn build(
        &self,
        property: &PropertyData,
        value: serde_json::Value,
        ctx: &ConverterContext,
    ) -> Result<PropertyModel, ConvertError> {
        let kind = self
            .kinds
            .get(&property.data_type)
            .or(self.fallback.as_ref())
            .ok_or_else(|| {
                ConvertError::configuration(format!(
                    "no property model kind registered for `{}`",
                    property.data_type
                ))
            })?;

        let shape = self.resolve_shape(&property.data_type, kind.as_ref())?;
        Ok(match shape {
            ConstructionShape::ValueOnly => kind.build_with_value(property, value),
            ConstructionShape::WithPersonalization => {
                kind.build_with_personalization(property, value, ctx.exclude_personalized)
            }
            ConstructionShape::WithContext => kind.build_with_context(property, value, ctx),
        })
    }

    fn resolve_shape(
        &self,
        data_type: &str,
        kind: &dyn PropertyModelKind,
    ) -> Result<ConstructionShape, ConvertError> {
        if let Some(shape) = rw_read(&self.resolved, SOURCE, "resolve_shape").get(data_type) {
            return Ok(*shape);
        }

        // Most specific declared shape wins.
        let shape = kind
            .shapes()
            .into_iter()
            .max()
            .ok_or_else(|| {
                ConvertError::configuration(format!(
                    "property model kind for `{data_type}` declares no construction shape"
                ))
            })?;

        debug!(
            target_module = SOURCE,
            data_type,
            shape = ?shape,
            "Resolved property model construction shape"
        );
        rw_write(&self.resolved, SOURCE, "resolve_shape")
            .insert(data_type.to_string(), shape);
        Ok(shape)
    }
}

impl Default for PropertyModelFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Fallback kind: wraps the converted value with the declared data type.
struct PlainKind;

impl PropertyModelKind for PlainKind {
    fn shapes(&self) -> Vec<ConstructionShape> {
        vec![ConstructionShape::WithPersonalization]
    }

    fn build_with_value(
        &self,
        property: &PropertyData,
        value: serde_json::Value,
    ) -> PropertyModel {
        PropertyModel::new(&property.name, &property.data_type).with_value(value)
    }
}
