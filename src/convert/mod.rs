//! Conversion pipeline.
//!
//! Maps polymorphic content entities into wire-model DTOs:
//!
//! - [`registry`]: priority-ordered, predicate-matched converter tables
//! - [`factory`]: property model construction with shape dispatch
//! - [`mapper`]: orchestration of one entity into a [`ContentModel`]
//! - [`filters`]: post-mapping, type-targeted property mutators
//! - [`expand`]: one-level reference expansion with access checks
//! - [`tracking`]: request-scoped reference/security accumulation
//! - [`wire`]: options-driven JSON shaping

pub mod context;
pub mod expand;
pub mod factory;
pub mod filters;
pub mod mapper;
pub mod model;
pub mod registry;
pub mod tracking;
pub mod wire;

pub use context::{ContextMode, ConverterContext, ExpandSet};
pub use expand::{ExpansionResolver, NestedMapper};
pub use factory::{ConstructionShape, PropertyModelFactory, PropertyModelKind};
pub use filters::{FilterPipeline, ModelFilter};
pub use mapper::ContentMapper;
pub use model::{ContentModel, ExpandedValue, PropertyModel, PropertyReferences};
pub use registry::{ConverterRegistry, ModelShape, PropertyConverter, RegistryBuilder, ValueConverter};
pub use tracking::{ReferenceMeta, TrackingContext};
pub use wire::{content_to_json, property_to_json, reference_to_json};
