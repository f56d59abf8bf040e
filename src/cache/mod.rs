//! Output cache layer.
//!
//! Turns tracking data into cacheability verdicts and keeps the cache
//! store honest when the repository mutates:
//!
//! - [`keys`]: pure dependency-key functions
//! - [`etag`]: deterministic, order-independent hash combinator
//! - [`store`]: concurrent response store with exact dependency eviction
//! - [`evaluate`]: one evaluator per dependency domain
//! - [`events`] + [`propagate`]: repository mutation events and the
//!   listeners that compute exact eviction sets

pub mod config;
pub mod etag;
pub mod evaluate;
pub mod events;
pub mod keys;
pub(crate) mod lock;
pub mod propagate;
pub mod store;

pub use config::CacheConfig;
pub use evaluate::{
    AncestorsCacheEvaluator, ChildrenCacheEvaluator, ContentCacheEvaluator, EvaluateResult,
    OutputCacheEvaluator, RequestSignature, SiteCacheEvaluator,
};
pub use events::{
    ContentEvent, ContentEventListener, EventHub, ListenerId, SiteEvent, SiteEventListener,
};
pub use propagate::{ContentEviction, SiteEviction};
pub use store::{CachedEntry, OutputCacheStore};
