//! Content identity types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Numeric identity of a content item, stable across versions and languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub i32);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A language tag, normalized to lowercase on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full identity of one content item: numeric id, working-version id,
/// global unique id, and the provider that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentReference {
    pub id: ContentId,
    pub work_id: Option<i32>,
    pub guid: Uuid,
    pub provider: Option<String>,
}

impl ContentReference {
    pub fn new(id: i32, guid: Uuid) -> Self {
        Self {
            id: ContentId(id),
            work_id: None,
            guid,
            provider: None,
        }
    }
}
