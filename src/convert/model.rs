//! Wire-model DTOs produced by the content mapper.

use indexmap::IndexMap;

use crate::domain::{ContentReference, Language};

/// The DTO for one content entity.
///
/// Produced fresh per conversion and never mutated after the filter
/// pipeline completes.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentModel {
    pub reference: ContentReference,
    pub name: String,
    pub language: Language,
    pub existing_languages: Vec<Language>,
    pub master_language: Language,
    pub content_type: Vec<String>,
    pub parent: Option<ContentReference>,
    pub url: Option<String>,
    /// Property name → model, in declared order.
    pub properties: IndexMap<String, PropertyModel>,
}

/// Wire model for one property value.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyModel {
    pub name: String,
    pub data_type: String,
    pub value: serde_json::Value,
    /// One-level-deep inlined target models, when expansion applied.
    /// May be `None` even when references exist: unauthorized, missing,
    /// or simply not requested for expansion.
    pub expanded: Option<ExpandedValue>,
    pub excluded_from_personalization: bool,
    /// Typed reference payload retained for the expansion resolver.
    /// Not serialized; filters injecting expandable properties set this.
    pub references: PropertyReferences,
}

impl PropertyModel {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            value: serde_json::Value::Null,
            expanded: None,
            excluded_from_personalization: false,
            references: PropertyReferences::None,
        }
    }

    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = value;
        self
    }
}

/// Reference payload of a property, preserved alongside the serialized value.
///
/// `Single` and `Many` are candidates for expansion; `Links` never expand
/// and are tracked as opaque references only.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyReferences {
    #[default]
    None,
    Single(ContentReference),
    Many(Vec<ContentReference>),
    Links,
}

/// Expanded nested models attached to a property.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandedValue {
    Single(Box<ContentModel>),
    Many(Vec<ContentModel>),
}
