//! Dependency key definitions.
//!
//! A dependency key is an opaque string identifying one invalidation axis.
//! Keys are pure functions of identity (plus language where applicable):
//! two computations over the same identity always yield the same key.

use uuid::Uuid;

use crate::domain::{ContentId, Language};

/// Identity-only key for a content item, independent of language.
pub fn common(id: ContentId) -> String {
    format!("vetrina:content:{id}")
}

/// Key scoped to one (content identity, language) pair.
pub fn language(id: ContentId, language: &Language) -> String {
    format!("vetrina:content:{id}:{language}")
}

/// Key tracking the child listing of a parent.
pub fn children(parent: ContentId) -> String {
    format!("vetrina:children:{parent}")
}

/// Key for one site definition.
pub fn site(id: Uuid) -> String {
    format!("vetrina:site:{id}")
}

/// Shared key evicted whenever any site is created, renamed, or deleted.
pub fn all_sites() -> String {
    "vetrina:site:*".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        assert_eq!(common(ContentId(5)), common(ContentId(5)));
        assert_eq!(
            language(ContentId(5), &Language::new("sv")),
            language(ContentId(5), &Language::new("SV"))
        );
        let site_id = Uuid::new_v4();
        assert_eq!(site(site_id), site(site_id));
    }

    #[test]
    fn axes_do_not_collide() {
        let id = ContentId(7);
        let keys = [
            common(id),
            language(id, &Language::new("en")),
            children(id),
            all_sites(),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
