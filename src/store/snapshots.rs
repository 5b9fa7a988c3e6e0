// src/store/snapshots.rs
use chrono::NaiveDate;
use log::{debug, info};
use std::sync::Arc;

use crate::errors::RankingError;
use crate::models::core::Snapshot;
use crate::store::document_store::DocumentStore;
use crate::utils::constants::{DATE_FORMAT, SNAPSHOT_COLLECTION};

/// `{YYYY-MM-DD}_{domain}`, the document id of one day's ranking.
pub fn snapshot_doc_id(date: NaiveDate, domain: &str) -> String {
    format!("{}_{}", date.format(DATE_FORMAT), domain)
}

/// Append-only access to the `daily_rankings` collection.
#[derive(Clone)]
pub struct SnapshotRepository {
    store: Arc<dyn DocumentStore>,
}

impl SnapshotRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn load(
        &self,
        date: NaiveDate,
        domain: &str,
    ) -> Result<Option<Snapshot>, RankingError> {
        let doc_id = snapshot_doc_id(date, domain);
        match self.store.get(SNAPSHOT_COLLECTION, &doc_id).await? {
            Some(doc) => {
                let snapshot: Snapshot = serde_json::from_value(doc)?;
                debug!("Loaded snapshot {} ({} items)", doc_id, snapshot.items.len());
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// The snapshot of the day before `date`. Absence is normal on the first
    /// run or after a gap and is not an error.
    pub async fn load_previous(
        &self,
        date: NaiveDate,
        domain: &str,
    ) -> Result<Option<Snapshot>, RankingError> {
        match date.pred_opt() {
            Some(previous) => self.load(previous, domain).await,
            None => Ok(None),
        }
    }

    /// Persists `snapshot` under its date and category. Existing snapshots are
    /// never overwritten unless `replace_existing` is set.
    pub async fn save(
        &self,
        snapshot: &Snapshot,
        replace_existing: bool,
    ) -> Result<String, RankingError> {
        let doc_id = snapshot_doc_id(snapshot.date, &snapshot.category);
        let doc = serde_json::to_value(snapshot)?;

        if replace_existing {
            self.store.put(SNAPSHOT_COLLECTION, &doc_id, &doc).await?;
            info!("Replaced snapshot {}", doc_id);
        } else if !self.store.create(SNAPSHOT_COLLECTION, &doc_id, &doc).await? {
            return Err(RankingError::SnapshotExists { doc_id });
        }
        Ok(doc_id)
    }

    /// Stored snapshot dates for one domain, oldest first.
    pub async fn dates(&self, domain: &str) -> Result<Vec<NaiveDate>, RankingError> {
        let suffix = format!("_{}", domain);
        let ids = self.store.list(SNAPSHOT_COLLECTION).await?;
        Ok(ids
            .iter()
            .filter_map(|id| id.strip_suffix(&suffix))
            .filter_map(|date| NaiveDate::parse_from_str(date, DATE_FORMAT).ok())
            .collect())
    }
}
