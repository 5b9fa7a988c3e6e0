// src/store/json_store.rs
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::RankingError;
use crate::store::document_store::{validate_doc_id, DocumentStore};

/// One pretty-printed JSON file per document: `{base_dir}/{collection}/{id}.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf, RankingError> {
        validate_doc_id(collection)?;
        Ok(self.base_dir.join(collection))
    }

    fn doc_path(&self, collection: &str, id: &str) -> Result<PathBuf, RankingError> {
        validate_doc_id(id)?;
        Ok(self.collection_dir(collection)?.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, RankingError> {
        let path = self.doc_path(collection, id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RankingError::Store(format!(
                "failed reading {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<(), RankingError> {
        let path = self.doc_path(collection, id)?;
        fs::create_dir_all(self.collection_dir(collection)?).await?;

        let tmp_path = write_tmp(&path, doc).await?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            remove_tmp(&tmp_path).await;
            return Err(RankingError::Store(format!(
                "failed replacing {}: {}",
                path.display(),
                e
            )));
        }
        debug!("Wrote {}", path.display());
        Ok(())
    }

    async fn create(&self, collection: &str, id: &str, doc: &Value) -> Result<bool, RankingError> {
        let path = self.doc_path(collection, id)?;
        fs::create_dir_all(self.collection_dir(collection)?).await?;
        if fs::try_exists(&path).await? {
            return Ok(false);
        }

        // Linking a fully written file publishes it in one step and fails if
        // the target already exists.
        let tmp_path = write_tmp(&path, doc).await?;
        let linked = fs::hard_link(&tmp_path, &path).await;
        remove_tmp(&tmp_path).await;
        match linked {
            Ok(()) => {
                debug!("Created {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(RankingError::Store(format!(
                "failed creating {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, RankingError> {
        let path = self.doc_path(collection, id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<String>, RankingError> {
        let dir = self.collection_dir(collection)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            if let Some(id) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Writes `doc` next to `path` under a unique temporary name. The partial
/// file is removed when the write fails.
async fn write_tmp(path: &Path, doc: &Value) -> Result<PathBuf, RankingError> {
    let raw = serde_json::to_vec_pretty(doc)?;
    let tmp_path = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
    let written = async {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&raw).await?;
        file.sync_all().await?;
        Ok::<(), std::io::Error>(())
    }
    .await;
    if let Err(e) = written {
        remove_tmp(&tmp_path).await;
        return Err(RankingError::Store(format!(
            "failed writing {}: {}",
            tmp_path.display(),
            e
        )));
    }
    Ok(tmp_path)
}

async fn remove_tmp(tmp_path: &Path) {
    if let Err(e) = fs::remove_file(tmp_path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove temporary file {}: {}", tmp_path.display(), e);
        }
    }
}
