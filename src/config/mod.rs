//! Delivery options.
//!
//! Controls wire shaping, expansion language policy, and the ETag header
//! allow-list. Loaded once at startup and snapshotted into every
//! [`ConverterContext`](crate::convert::ConverterContext).

use serde::Deserialize;

fn default_etag_headers() -> Vec<String> {
    vec!["accept".to_string(), "accept-language".to_string()]
}

fn default_true() -> bool {
    true
}

/// Language used when loading an expansion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionLanguagePolicy {
    /// Load the target in the root request's language.
    #[default]
    RequestLanguage,
    /// Let the target fall back to its own language resolution.
    ContentLanguage,
}

/// Options controlling conversion output and cache evaluation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryOptions {
    /// Serialize property models as bare values instead of
    /// `{value, propertyDataType}` objects.
    pub flatten_property_models: bool,
    /// Include numeric `id`/`workId` in serialized identities. When false,
    /// a `language` field is emitted instead.
    #[serde(default = "default_true")]
    pub include_numeric_ids: bool,
    /// Which language an expansion target is loaded in.
    pub expansion_language: ExpansionLanguagePolicy,
    /// Request headers included in ETag computation. Normalized to
    /// lowercase and sorted alphabetically by [`DeliveryOptions::normalize`].
    pub etag_headers: Vec<String>,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            flatten_property_models: false,
            include_numeric_ids: true,
            expansion_language: ExpansionLanguagePolicy::default(),
            etag_headers: default_etag_headers(),
        }
    }
}

impl DeliveryOptions {
    /// Normalize the header allow-list: lowercase, sorted, deduplicated.
    ///
    /// ETag inputs must never depend on configuration file ordering.
    pub fn normalize(mut self) -> Self {
        for header in &mut self.etag_headers {
            header.make_ascii_lowercase();
        }
        self.etag_headers.sort();
        self.etag_headers.dedup();
        self
    }
}
