pub mod result_cache;

pub use result_cache::{create_shared_cache, CacheEntry, ResultCache, SharedResultCache};
