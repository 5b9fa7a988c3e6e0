// src/store/document_store.rs
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::errors::RankingError;

/// Key-value store of JSON documents grouped into named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, RankingError>;

    /// Writes `doc`, replacing any existing document.
    async fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<(), RankingError>;

    /// Writes `doc` only if `id` is free. Returns false when it already exists.
    async fn create(&self, collection: &str, id: &str, doc: &Value) -> Result<bool, RankingError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, RankingError>;

    /// Document ids of a collection, sorted.
    async fn list(&self, collection: &str) -> Result<Vec<String>, RankingError>;
}

/// Ids become file names in the JSON store, so both backends reject the
/// same unsafe ids.
pub fn validate_doc_id(id: &str) -> Result<(), RankingError> {
    let unsafe_id = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(|c: char| c == '/' || c == '\\')
        || id.chars().any(char::is_control);
    if unsafe_id {
        Err(RankingError::Store(format!("invalid document id {:?}", id)))
    } else {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, RankingError> {
        validate_doc_id(id)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<(), RankingError> {
        validate_doc_id(id)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn create(&self, collection: &str, id: &str, doc: &Value) -> Result<bool, RankingError> {
        validate_doc_id(id)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Ok(false);
        }
        docs.insert(id.to_string(), doc.clone());
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, RankingError> {
        validate_doc_id(id)?;
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn list(&self, collection: &str) -> Result<Vec<String>, RankingError> {
        let collections = self.collections.read().await;
        let mut ids: Vec<String> = collections
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_create_is_exclusive() {
        let store = MemoryStore::new();
        assert!(store.create("c", "a", &json!({"v": 1})).await.unwrap());
        assert!(!store.create("c", "a", &json!({"v": 2})).await.unwrap());
        assert_eq!(store.get("c", "a").await.unwrap(), Some(json!({"v": 1})));

        store.put("c", "a", &json!({"v": 3})).await.unwrap();
        assert_eq!(store.get("c", "a").await.unwrap(), Some(json!({"v": 3})));
        assert_eq!(store.list("c").await.unwrap(), vec!["a".to_string()]);

        assert!(store.delete("c", "a").await.unwrap());
        assert!(!store.delete("c", "a").await.unwrap());
        assert_eq!(store.get("other", "a").await.unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_ids() {
        assert!(validate_doc_id("2026-10-17_beauty").is_ok());
        assert!(validate_doc_id("../secrets").is_err());
        assert!(validate_doc_id("a/b").is_err());
        assert!(validate_doc_id("").is_err());
        assert!(validate_doc_id("..").is_err());
    }
}
