// src/cache/result_cache.rs
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::RankingError;
use crate::models::core::Enrichment;
use crate::store::document_store::DocumentStore;
use crate::utils::constants::CACHE_COLLECTION;
use crate::utils::hashing::identity_digest;

/// Durable record of one entity's enrichment, keyed by its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub identity_key: String,
    #[serde(default)]
    pub components: BTreeMap<String, f64>,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub resolved_link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl CacheEntry {
    pub fn from_enrichment(identity_key: &str, enrichment: Enrichment) -> Self {
        Self {
            identity_key: identity_key.to_string(),
            components: enrichment.components,
            narrative: enrichment.narrative,
            resolved_link: enrichment.resolved_link,
            tags: enrichment.tags,
            last_updated: Utc::now(),
        }
    }

    pub fn to_enrichment(&self) -> Enrichment {
        Enrichment {
            components: self.components.clone(),
            narrative: self.narrative.clone(),
            resolved_link: self.resolved_link.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Enrichment results that survive across runs. An in-process LRU fronts the
/// `enrichment_cache` collection; the collection is the source of truth.
pub struct ResultCache {
    store: Arc<dyn DocumentStore>,
    memory: LruCache<String, CacheEntry>,

    // Stats
    pub hits: usize,
    pub misses: usize,
}

impl ResultCache {
    pub fn new(store: Arc<dyn DocumentStore>, capacity: usize) -> Self {
        info!("Initializing ResultCache with LRU capacity: {}", capacity);
        Self {
            store,
            memory: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            hits: 0,
            misses: 0,
        }
    }

    pub async fn get(&mut self, identity_key: &str) -> Result<Option<CacheEntry>, RankingError> {
        if let Some(entry) = self.memory.get(identity_key) {
            let entry = entry.clone();
            self.record_hit();
            return Ok(Some(entry));
        }

        let doc_id = identity_digest(identity_key);
        let entry = match self.store.get(CACHE_COLLECTION, &doc_id).await? {
            Some(doc) => match serde_json::from_value::<CacheEntry>(doc) {
                Ok(entry) if entry.identity_key == identity_key => Some(entry),
                Ok(entry) => {
                    warn!(
                        "Cache document {} belongs to '{}', not '{}'; treating as miss",
                        doc_id, entry.identity_key, identity_key
                    );
                    None
                }
                Err(e) => {
                    warn!("Unreadable cache document {}: {}; treating as miss", doc_id, e);
                    None
                }
            },
            None => None,
        };

        match entry {
            Some(entry) => {
                self.memory.put(identity_key.to_string(), entry.clone());
                self.record_hit();
                Ok(Some(entry))
            }
            None => {
                self.misses += 1;
                Ok(None)
            }
        }
    }

    /// Full overwrite of whatever was stored for `identity_key`.
    pub async fn put(&mut self, identity_key: &str, entry: CacheEntry) -> Result<(), RankingError> {
        let doc = serde_json::to_value(&entry)?;
        self.store
            .put(CACHE_COLLECTION, &identity_digest(identity_key), &doc)
            .await?;
        self.memory.put(identity_key.to_string(), entry);
        debug!("Cached enrichment for '{}'", identity_key);
        Ok(())
    }

    pub async fn invalidate(&mut self, identity_key: &str) -> Result<bool, RankingError> {
        let in_memory = self.memory.pop(identity_key).is_some();
        let durable = self
            .store
            .delete(CACHE_COLLECTION, &identity_digest(identity_key))
            .await?;
        Ok(in_memory || durable)
    }

    fn record_hit(&mut self) {
        self.hits += 1;
        if self.hits % 100 == 0 {
            info!(
                "ResultCache stats - hits: {}, misses: {}, hit rate: {:.2}%",
                self.hits,
                self.misses,
                self.hit_rate()
            );
        }
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    pub fn get_stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    /// Clears the in-process layer and counters; durable entries stay.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
        self.hits = 0;
        self.misses = 0;
        info!("ResultCache memory layer cleared");
    }

    pub fn get_cache_info(&self) -> (usize, usize) {
        (self.memory.len(), self.memory.cap().get())
    }
}

/// A thread-safe wrapper for the ResultCache
pub type SharedResultCache = Arc<Mutex<ResultCache>>;

pub fn create_shared_cache(store: Arc<dyn DocumentStore>, capacity: usize) -> SharedResultCache {
    Arc::new(Mutex::new(ResultCache::new(store, capacity)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document_store::MemoryStore;
    use serde_json::json;

    fn enrichment() -> Enrichment {
        Enrichment {
            components: BTreeMap::from([("editorial".to_string(), 88.0)]),
            narrative: Some("Cult favourite sun cream".to_string()),
            resolved_link: Some("https://example.com/p/1".to_string()),
            tags: vec!["SPF50+".to_string()],
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mut cache = ResultCache::new(store, 16);

        assert!(cache.get("round lab birch").await.unwrap().is_none());
        cache
            .put("round lab birch", CacheEntry::from_enrichment("round lab birch", enrichment()))
            .await
            .unwrap();

        let entry = cache.get("round lab birch").await.unwrap().unwrap();
        assert_eq!(entry.to_enrichment(), enrichment());
        assert_eq!(cache.get_stats(), (1, 1));
        assert_eq!(cache.hit_rate(), 50.0);
    }

    #[tokio::test]
    async fn test_durable_layer_survives_a_new_process() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        {
            let mut first = ResultCache::new(store.clone(), 16);
            first
                .put("acme aloe serum", CacheEntry::from_enrichment("acme aloe serum", enrichment()))
                .await
                .unwrap();
        }

        let mut second = ResultCache::new(store.clone(), 16);
        assert_eq!(second.get_cache_info().0, 0);
        let entry = second.get("acme aloe serum").await.unwrap().unwrap();
        assert_eq!(entry.narrative.as_deref(), Some("Cult favourite sun cream"));
        assert_eq!(second.get_cache_info().0, 1);

        let doc_id = identity_digest("acme aloe serum");
        assert!(store.get(CACHE_COLLECTION, &doc_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_overwrites_and_invalidate_removes() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mut cache = ResultCache::new(store, 16);

        cache
            .put("k", CacheEntry::from_enrichment("k", enrichment()))
            .await
            .unwrap();
        cache
            .put("k", CacheEntry::from_enrichment("k", Enrichment::default()))
            .await
            .unwrap();
        let entry = cache.get("k").await.unwrap().unwrap();
        assert!(entry.to_enrichment().is_empty());

        assert!(cache.invalidate("k").await.unwrap());
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(!cache.invalidate("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_foreign_or_corrupt_documents_are_misses() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let foreign = CacheEntry::from_enrichment("someone else", enrichment());
        store
            .put(
                CACHE_COLLECTION,
                &identity_digest("mine"),
                &serde_json::to_value(&foreign).unwrap(),
            )
            .await
            .unwrap();
        store
            .put(CACHE_COLLECTION, &identity_digest("broken"), &json!({"oops": true}))
            .await
            .unwrap();

        let mut cache = ResultCache::new(store, 16);
        assert!(cache.get("mine").await.unwrap().is_none());
        assert!(cache.get("broken").await.unwrap().is_none());
        assert_eq!(cache.get_stats(), (0, 2));
    }
}
