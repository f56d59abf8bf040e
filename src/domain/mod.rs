//! Domain types shared across the conversion and cache layers.

pub mod content;
pub mod error;
pub mod identity;
pub mod site;

pub use content::{ContentItem, LinkItem, PropertyData, PropertyValue, UrlValue};
pub use error::{ConvertError, RepoError};
pub use identity::{ContentId, ContentReference, Language};
pub use site::SiteDefinition;
