//! Repository-side content entities as the conversion pipeline consumes them.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::identity::{ContentReference, Language};

/// A content entity loaded from the repository collaborator.
///
/// The type chain is ordered base-first, so `type_chain.last()` is the most
/// derived type name. Converter and filter predicates match against it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub reference: ContentReference,
    pub name: String,
    /// The language variant this entity was loaded in.
    pub language: Language,
    pub existing_languages: Vec<Language>,
    pub master_language: Language,
    pub type_chain: Vec<String>,
    pub parent: Option<ContentReference>,
    pub url: Option<String>,
    pub properties: Vec<PropertyData>,
    /// Explicit stop-publish stamp, if the editors set one.
    pub expires: Option<OffsetDateTime>,
    pub last_saved: OffsetDateTime,
}

impl ContentItem {
    /// Whether `name` appears anywhere in the content-type chain.
    pub fn is_of_type(&self, name: &str) -> bool {
        self.type_chain.iter().any(|t| t == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyData> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// One declared property of a content entity.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyData {
    pub name: String,
    /// Declared data-type tag, e.g. `PropertyString` or `PropertyContentReference`.
    pub data_type: String,
    pub value: PropertyValue,
    /// Whether the value may legitimately differ per viewing principal.
    pub personalizable: bool,
}

/// The typed value of a property, as stored.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    /// Any scalar or composite value with no reference semantics.
    Scalar(serde_json::Value),
    /// A single reference to another content item.
    Reference(ContentReference),
    /// An ordered list of references.
    ReferenceList(Vec<ContentReference>),
    /// A collection of editor-authored links, possibly pointing at internal content.
    Links(Vec<LinkItem>),
    /// A URL value, resolved against the permanent-link table at load time.
    Url(UrlValue),
}

/// One entry in a link collection.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkItem {
    pub text: String,
    pub href: String,
    /// Permanent-link GUID when the link targets internal content.
    pub target: Option<Uuid>,
    /// Explicit language qualifier on the link, if any.
    pub language: Option<Language>,
}

/// A URL-valued property.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlValue {
    pub href: String,
    /// Internal content the URL resolves to, if any.
    pub target: Option<Uuid>,
}
