//! Per-request conversion context.
//!
//! A [`ConverterContext`] is created once at request entry and passed by
//! reference through the whole call graph. It is never mutated; mutable
//! per-request state lives in [`TrackingContext`](super::TrackingContext).

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::DeliveryOptions;
use crate::domain::Language;

/// Rendering mode of the surrounding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextMode {
    #[default]
    Default,
    Edit,
    Preview,
}

/// Which reference-valued properties should be expanded inline.
#[derive(Debug, Clone, Default)]
pub enum ExpandSet {
    #[default]
    None,
    All,
    Properties(BTreeSet<String>),
}

impl ExpandSet {
    pub fn contains(&self, property: &str) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Properties(names) => names.contains(property),
        }
    }

    /// Parse a comma-separated expand parameter; `*` means everything.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::None;
        }
        if raw == "*" {
            return Self::All;
        }
        Self::Properties(
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

/// Immutable snapshot of everything a single conversion needs to know
/// about the request.
#[derive(Debug, Clone)]
pub struct ConverterContext {
    pub options: Arc<DeliveryOptions>,
    pub language: Language,
    pub expand: ExpandSet,
    /// Response field subset; `None` selects every declared property.
    pub select: Option<BTreeSet<String>>,
    pub mode: ContextMode,
    /// Drop personalizable properties from the response entirely.
    pub exclude_personalized: bool,
}

impl ConverterContext {
    pub fn new(options: Arc<DeliveryOptions>, language: Language) -> Self {
        Self {
            options,
            language,
            expand: ExpandSet::None,
            select: None,
            mode: ContextMode::Default,
            exclude_personalized: false,
        }
    }

    pub fn with_expand(mut self, expand: ExpandSet) -> Self {
        self.expand = expand;
        self
    }

    pub fn with_select(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.select = Some(names.into_iter().collect());
        self
    }

    pub fn with_mode(mut self, mode: ContextMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn without_personalized(mut self) -> Self {
        self.exclude_personalized = true;
        self
    }

    /// Whether the select-set admits this property name.
    pub fn selects(&self, property: &str) -> bool {
        match &self.select {
            None => true,
            Some(names) => names.contains(property),
        }
    }
}
