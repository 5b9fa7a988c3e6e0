// src/models/core.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::matching::MatchKind;

/// One raw signal for a candidate as handed over by a fetch collaborator.
/// `value` and `rank` are both optional; a signal with neither is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubScore {
    pub source: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub rank: Option<u32>,
    /// Review or vote count backing a rating value.
    #[serde(default)]
    pub volume: Option<u64>,
}

impl RawSubScore {
    pub fn from_value(source: &str, value: f64) -> Self {
        Self {
            source: source.to_string(),
            value: Some(value),
            rank: None,
            volume: None,
        }
    }

    pub fn from_rank(source: &str, rank: u32) -> Self {
        Self {
            source: source.to_string(),
            value: None,
            rank: Some(rank),
            volume: None,
        }
    }

    pub fn rating(source: &str, rating: f64, review_count: u64) -> Self {
        Self {
            source: source.to_string(),
            value: Some(rating),
            rank: None,
            volume: Some(review_count),
        }
    }

    pub fn missing(source: &str) -> Self {
        Self {
            source: source.to_string(),
            value: None,
            rank: None,
            volume: None,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none() && self.rank.is_none()
    }
}

/// A scraped entity for one run. Formed once by the collaborator and never
/// mutated by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub display_name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    /// Name as collected, before any translation. Cache identity is built from this.
    #[serde(default)]
    pub raw_name: Option<String>,
    #[serde(default)]
    pub sub_scores: Vec<RawSubScore>,
    /// 1-based collection order. Zero means "not assigned yet".
    #[serde(default)]
    pub position: u32,
    /// Opaque presentation fields (price, imageUrl, location...) carried through unchanged.
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl CandidateRecord {
    pub fn new(display_name: &str, brand: Option<&str>) -> Self {
        Self {
            display_name: display_name.to_string(),
            brand: brand.map(|b| b.to_string()),
            source_id: None,
            raw_name: None,
            sub_scores: Vec::new(),
            position: 0,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    pub fn with_raw_name(mut self, raw_name: &str) -> Self {
        self.raw_name = Some(raw_name.to_string());
        self
    }

    pub fn with_source_id(mut self, source_id: &str) -> Self {
        self.source_id = Some(source_id.to_string());
        self
    }

    pub fn with_sub_score(mut self, sub_score: RawSubScore) -> Self {
        self.sub_scores.push(sub_score);
        self
    }

    pub fn sub_score(&self, source: &str) -> Option<&RawSubScore> {
        self.sub_scores.iter().find(|s| s.source == source)
    }
}

/// Output of the expensive enrichment step (translation, tagging, link lookup).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    /// Extra 0..100 score components, keyed by source name.
    #[serde(default)]
    pub components: BTreeMap<String, f64>,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub resolved_link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
            && self.narrative.is_none()
            && self.resolved_link.is_none()
            && self.tags.is_empty()
    }
}

/// A candidate after matching and scoring, before it has a published rank.
#[derive(Debug, Clone)]
pub struct ScoredEntity {
    pub record: CandidateRecord,
    pub identity_key: String,
    pub previous_rank: Option<u32>,
    pub match_kind: MatchKind,
    pub composite_score: f64,
    pub score_components: BTreeMap<String, f64>,
    pub imputed_sources: Vec<String>,
    pub status: Option<String>,
    pub cache_hit: bool,
    pub narrative: Option<String>,
    pub resolved_link: Option<String>,
    pub tags: Vec<String>,
}

/// One published leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntity {
    #[serde(flatten)]
    pub record: CandidateRecord,
    pub rank: u32,
    /// Positive = moved up. Zero for new entries.
    pub trend: i32,
    #[serde(default)]
    pub previous_rank: Option<u32>,
    #[serde(default)]
    pub match_kind: MatchKind,
    /// Always within [0, 100], one decimal.
    pub composite_score: f64,
    #[serde(default)]
    pub score_components: BTreeMap<String, f64>,
    #[serde(default)]
    pub imputed_sources: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cache_hit: bool,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub resolved_link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RankedEntity {
    pub fn from_scored(scored: ScoredEntity, rank: u32) -> Self {
        Self {
            record: scored.record,
            rank,
            trend: 0,
            previous_rank: scored.previous_rank,
            match_kind: scored.match_kind,
            composite_score: scored.composite_score,
            score_components: scored.score_components,
            imputed_sources: scored.imputed_sources,
            status: scored.status,
            cache_hit: scored.cache_hit,
            narrative: scored.narrative,
            resolved_link: scored.resolved_link,
            tags: scored.tags,
        }
    }
}

/// A dated, fully ranked leaderboard for one domain. Written once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub date: NaiveDate,
    pub category: String,
    pub items: Vec<RankedEntity>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub run_id: String,
}

impl Snapshot {
    pub fn ranks(&self) -> Vec<u32> {
        self.items.iter().map(|item| item.rank).collect()
    }

    pub fn find_by_name(&self, display_name: &str) -> Option<&RankedEntity> {
        self.items
            .iter()
            .find(|item| item.record.display_name == display_name)
    }
}
