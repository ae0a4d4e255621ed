//! The fallback engine and its two on-disk caches.

mod cache;
mod resolver;
#[cfg(test)]
mod tests;

pub use cache::{CacheError, ElementCache, ElementCacheEntry, FixCache, FixCacheEntry};
pub use resolver::{PositionResolver, ResolutionFailed, ResolverConfig};
