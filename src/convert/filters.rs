//! Model filter pipeline.
//!
//! Ordered, type-targeted mutators that run after mapping. Unlike converter
//! resolution, this is not first-match dispatch: every filter whose
//! predicate matches the content's type runs, in registration order,
//! mutating the property map in place. Expansion only ever sees the
//! post-filter property set.

use tracing::debug;

use crate::convert::context::ConverterContext;
use crate::convert::model::ContentModel;
use crate::domain::ContentItem;

const SOURCE: &str = "convert::filters";

type TargetPredicate = Box<dyn Fn(&ContentItem) -> bool + Send + Sync>;
type Mutator = Box<dyn Fn(&mut ContentModel, &ConverterContext) + Send + Sync>;

/// One registered filter: a target predicate plus a property-map mutator.
pub struct ModelFilter {
    name: &'static str,
    matches: TargetPredicate,
    mutate: Mutator,
}

impl ModelFilter {
    pub fn new<P, M>(name: &'static str, matches: P, mutate: M) -> Self
    where
        P: Fn(&ContentItem) -> bool + Send + Sync + 'static,
        M: Fn(&mut ContentModel, &ConverterContext) + Send + Sync + 'static,
    {
        Self {
            name,
            matches: Box::new(matches),
            mutate: Box::new(mutate),
        }
    }

    /// A filter targeting one content supertype by name.
    pub fn for_type<M>(name: &'static str, type_name: &'static str, mutate: M) -> Self
    where
        M: Fn(&mut ContentModel, &ConverterContext) + Send + Sync + 'static,
    {
        Self::new(name, move |content| content.is_of_type(type_name), mutate)
    }
}

/// Registration-ordered filter list, populated once at process start.
#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<ModelFilter>,
}

impl FilterPipeline {
    pub fn new(filters: Vec<ModelFilter>) -> Self {
        Self { filters }
    }

    /// Run every matching filter against a freshly mapped model.
    pub fn apply(&self, content: &ContentItem, model: &mut ContentModel, ctx: &ConverterContext) {
        for filter in &self.filters {
            if (filter.matches)(content) {
                debug!(
                    target_module = SOURCE,
                    filter = filter.name,
                    content_id = %content.reference.id,
                    "Applying model filter"
                );
                (filter.mutate)(model, ctx);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
