//! Output cache configuration.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_RESPONSE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the output cache store.
    pub enable_output_cache: bool,
    /// Maximum cached responses before LRU eviction.
    pub response_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable_output_cache: true,
            response_limit: DEFAULT_RESPONSE_LIMIT,
        }
    }
}

impl CacheConfig {
    /// Response limit as `NonZeroUsize`, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
