// src/pipeline/enrichment.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use url::Url;

use crate::matching::normalize::Normalizer;
use crate::models::core::{CandidateRecord, Enrichment};

/// Collaborator producing translation, tags, narrative and links for one
/// entity. Only called on a cache miss.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, record: &CandidateRecord, domain: &str) -> Result<Enrichment>;
}

/// Enrichment read from a prepared JSON object keyed by display name,
/// e.g. the output of an offline translation batch.
#[derive(Debug, Default)]
pub struct TableEnricher {
    normalizer: Normalizer,
    entries: HashMap<String, Enrichment>,
}

impl TableEnricher {
    pub fn new(normalizer: Normalizer, entries: HashMap<String, Enrichment>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(name, enrichment)| (normalizer.key(None, &name), enrichment))
            .collect();
        Self {
            normalizer,
            entries,
        }
    }

    pub fn from_file(path: &Path, normalizer: Normalizer) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read enrichment table {}", path.display()))?;
        let entries: HashMap<String, Enrichment> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse enrichment table {}", path.display()))?;
        info!(
            "Loaded {} enrichment entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Self::new(normalizer, entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Enricher for TableEnricher {
    async fn enrich(&self, record: &CandidateRecord, _domain: &str) -> Result<Enrichment> {
        let by_name = self.normalizer.key(None, &record.display_name);
        let by_raw = record
            .raw_name
            .as_deref()
            .map(|raw| self.normalizer.key(None, raw));
        Ok(self
            .entries
            .get(&by_name)
            .or_else(|| by_raw.and_then(|key| self.entries.get(&key)))
            .cloned()
            .unwrap_or_default())
    }
}

fn default_query_param() -> String {
    "q".to_string()
}

/// Search URL built from brand and name when no enrichment supplied a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTemplate {
    pub base_url: String,
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// Query parameter carrying the affiliate id, if the target supports one.
    #[serde(default)]
    pub affiliate_param: Option<String>,
}

impl LinkTemplate {
    pub fn amazon_search() -> Self {
        Self {
            base_url: "https://www.amazon.com/s".to_string(),
            query_param: "k".to_string(),
            affiliate_param: Some("tag".to_string()),
        }
    }

    pub fn klook_search() -> Self {
        Self {
            base_url: "https://www.klook.com/en-US/search/".to_string(),
            query_param: "query".to_string(),
            affiliate_param: None,
        }
    }

    pub fn resolve(&self, record: &CandidateRecord, affiliate_id: &str) -> Option<String> {
        let query = search_query(record);
        if query.is_empty() {
            return None;
        }

        let mut params = vec![(self.query_param.as_str(), query.as_str())];
        if let Some(param) = self.affiliate_param.as_deref() {
            if !affiliate_id.is_empty() {
                params.push((param, affiliate_id));
            }
        }

        match Url::parse_with_params(&self.base_url, &params) {
            Ok(url) => Some(url.into()),
            Err(e) => {
                warn!("Invalid link template base {:?}: {}", self.base_url, e);
                None
            }
        }
    }
}

/// "Brand Name" unless the name already leads with the brand.
fn search_query(record: &CandidateRecord) -> String {
    let name = record.display_name.trim();
    match record.brand.as_deref().map(str::trim) {
        Some(brand)
            if !brand.is_empty()
                && !name.to_lowercase().starts_with(&brand.to_lowercase()) =>
        {
            format!("{} {}", brand, name)
        }
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amazon_search_link() {
        let record = CandidateRecord::new("Birch Juice Sunscreen", Some("Round Lab"));
        let link = LinkTemplate::amazon_search()
            .resolve(&record, "krank-20")
            .unwrap();
        assert_eq!(
            link,
            "https://www.amazon.com/s?k=Round+Lab+Birch+Juice+Sunscreen&tag=krank-20"
        );
    }

    #[test]
    fn test_klook_link_ignores_affiliate_and_encodes() {
        let record = CandidateRecord::new("N Seoul Tower & Namsan", None);
        let link = LinkTemplate::klook_search().resolve(&record, "krank-20").unwrap();
        assert_eq!(
            link,
            "https://www.klook.com/en-US/search/?query=N+Seoul+Tower+%26+Namsan"
        );
    }

    #[test]
    fn test_brand_not_repeated_and_empty_name_has_no_link() {
        let record = CandidateRecord::new("Anua Heartleaf Toner", Some("Anua"));
        let link = LinkTemplate::amazon_search().resolve(&record, "").unwrap();
        assert_eq!(link, "https://www.amazon.com/s?k=Anua+Heartleaf+Toner");

        let empty = CandidateRecord::new("  ", None);
        assert!(LinkTemplate::amazon_search().resolve(&empty, "x").is_none());
    }

    #[tokio::test]
    async fn test_table_enricher_matches_normalized_names() {
        let entries = HashMap::from([(
            "Aloe Serum".to_string(),
            Enrichment {
                narrative: Some("Soothing".to_string()),
                ..Enrichment::default()
            },
        )]);
        let enricher = TableEnricher::new(Normalizer::default(), entries);

        let hit = enricher
            .enrich(&CandidateRecord::new("ALOE serum (1+1)", Some("Acme")), "beauty")
            .await
            .unwrap();
        assert_eq!(hit.narrative.as_deref(), Some("Soothing"));

        let miss = enricher
            .enrich(&CandidateRecord::new("Other", None), "beauty")
            .await
            .unwrap();
        assert!(miss.is_empty());
    }
}
