//! In-memory collaborators and content fixtures shared by the
//! integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use vetrina::application::repos::{AccessChecker, ContentRepo, SiteRepo};
use vetrina::domain::{
    ContentId, ContentItem, ContentReference, Language, PropertyData, PropertyValue, RepoError,
    SiteDefinition,
};

/// Deterministic GUID per numeric id so fixtures stay reproducible.
pub fn guid_of(id: i32) -> Uuid {
    Uuid::from_u128(id as u128)
}

pub fn item(id: i32, name: &str, language: &str) -> ContentItem {
    ContentItem {
        reference: ContentReference::new(id, guid_of(id)),
        name: name.to_string(),
        language: Language::new(language),
        existing_languages: vec![Language::new(language)],
        master_language: Language::new(language),
        type_chain: vec!["Content".to_string(), "Page".to_string()],
        parent: None,
        url: Some(format!("/{}/", name.to_lowercase())),
        properties: Vec::new(),
        expires: None,
        last_saved: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn string_property(name: &str, value: &str) -> PropertyData {
    PropertyData {
        name: name.to_string(),
        data_type: "PropertyString".to_string(),
        value: PropertyValue::Scalar(serde_json::json!(value)),
        personalizable: false,
    }
}

pub fn reference_property(name: &str, target: i32) -> PropertyData {
    PropertyData {
        name: name.to_string(),
        data_type: "PropertyContentReference".to_string(),
        value: PropertyValue::Reference(ContentReference::new(target, guid_of(target))),
        personalizable: false,
    }
}

#[derive(Default)]
pub struct InMemoryRepo {
    items: HashMap<ContentId, ContentItem>,
    guids: HashMap<Uuid, ContentId>,
    descendants: HashMap<ContentId, Vec<ContentId>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: ContentItem) {
        self.guids.insert(item.reference.guid, item.reference.id);
        self.items.insert(item.reference.id, item);
    }

    pub fn set_descendants(&mut self, id: ContentId, descendants: Vec<ContentId>) {
        self.descendants.insert(id, descendants);
    }
}

impl ContentRepo for InMemoryRepo {
    fn get(
        &self,
        id: ContentId,
        _language: Option<&Language>,
    ) -> Result<Option<ContentItem>, RepoError> {
        Ok(self.items.get(&id).cloned())
    }

    fn resolve_guid(&self, guid: Uuid) -> Result<Option<ContentId>, RepoError> {
        Ok(self.guids.get(&guid).copied())
    }

    fn ancestors(&self, _id: ContentId) -> Result<Vec<ContentId>, RepoError> {
        Ok(vec![])
    }

    fn descendants(&self, id: ContentId) -> Result<Vec<ContentId>, RepoError> {
        Ok(self.descendants.get(&id).cloned().unwrap_or_default())
    }

    fn last_saved(&self, id: ContentId) -> Result<Option<OffsetDateTime>, RepoError> {
        Ok(self.items.get(&id).map(|item| item.last_saved))
    }
}

#[derive(Default)]
pub struct InMemorySites {
    sites: HashMap<Uuid, SiteDefinition>,
}

impl InMemorySites {
    pub fn add(&mut self, site: SiteDefinition) {
        self.sites.insert(site.id, site);
    }
}

impl SiteRepo for InMemorySites {
    fn site(&self, id: Uuid) -> Result<Option<SiteDefinition>, RepoError> {
        Ok(self.sites.get(&id).cloned())
    }
}

/// Everything is anonymous-readable except the listed identities.
#[derive(Default)]
pub struct RestrictedSet {
    restricted: HashSet<ContentId>,
}

impl RestrictedSet {
    pub fn restricting(ids: impl IntoIterator<Item = i32>) -> Arc<Self> {
        Arc::new(Self {
            restricted: ids.into_iter().map(ContentId).collect(),
        })
    }
}

impl AccessChecker for RestrictedSet {
    fn anonymous_can_read(&self, id: ContentId) -> bool {
        !self.restricted.contains(&id)
    }
}
