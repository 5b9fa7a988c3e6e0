// src/matching/fuzzy.rs
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use strsim::jaro_winkler;

use crate::matching::normalize::Normalizer;
use crate::models::core::{CandidateRecord, Snapshot};
use crate::models::matching::MatchResult;
use crate::utils::constants::{DEFAULT_MIN_SHARED_TOKENS, DEFAULT_RANK_WINDOW};

/// Heuristic constants of the secondary tier. Both are empirical and
/// expected to be tuned per domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherConfig {
    #[serde(default = "default_rank_window")]
    pub rank_window: u32,
    #[serde(default = "default_min_shared_tokens")]
    pub min_shared_tokens: usize,
}

fn default_rank_window() -> u32 {
    DEFAULT_RANK_WINDOW
}

fn default_min_shared_tokens() -> usize {
    DEFAULT_MIN_SHARED_TOKENS
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            rank_window: DEFAULT_RANK_WINDOW,
            min_shared_tokens: DEFAULT_MIN_SHARED_TOKENS,
        }
    }
}

#[derive(Debug, Clone)]
struct PreviousEntry {
    rank: u32,
    display_key: String,
    brand_key: Option<String>,
    tokens: HashSet<String>,
}

/// Yesterday's snapshot pre-digested for matching: keys are computed once
/// per run instead of once per (today, yesterday) pair.
#[derive(Debug, Clone, Default)]
pub struct PreviousIndex {
    /// Sorted by yesterday rank.
    entries: Vec<PreviousEntry>,
    by_display_key: HashMap<String, u32>,
    by_identity_key: HashMap<String, u32>,
}

impl PreviousIndex {
    pub fn build(normalizer: &Normalizer, snapshot: &Snapshot) -> Self {
        let mut index = Self::default();
        let mut items: Vec<_> = snapshot.items.iter().collect();
        items.sort_by_key(|item| item.rank);

        for item in items {
            let record = &item.record;
            let display_key = normalizer.display_key(record);
            // First (best-ranked) holder of a key wins.
            index
                .by_display_key
                .entry(display_key.clone())
                .or_insert(item.rank);
            if record.raw_name.is_some() {
                index
                    .by_identity_key
                    .entry(normalizer.identity_key(record))
                    .or_insert(item.rank);
            }
            index.entries.push(PreviousEntry {
                rank: item.rank,
                display_key,
                brand_key: record
                    .brand
                    .as_deref()
                    .map(|b| normalizer.brand_key(b))
                    .filter(|b| !b.is_empty()),
                tokens: display_tokens(&record.display_name),
            });
        }
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Case-folded whitespace tokens of a display name.
pub fn display_tokens(display_name: &str) -> HashSet<String> {
    display_name
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

pub struct FuzzyMatcher<'a> {
    normalizer: &'a Normalizer,
    config: MatcherConfig,
}

impl<'a> FuzzyMatcher<'a> {
    pub fn new(normalizer: &'a Normalizer, config: MatcherConfig) -> Self {
        Self { normalizer, config }
    }

    /// Tiered lookup of `today` in yesterday's index; first hit wins.
    pub fn match_previous(
        &self,
        today: &CandidateRecord,
        today_rank: u32,
        yesterday: &PreviousIndex,
    ) -> MatchResult {
        if yesterday.is_empty() {
            return MatchResult::new_entry();
        }

        let display_key = self.normalizer.display_key(today);
        if let Some(&rank) = yesterday.by_display_key.get(&display_key) {
            return MatchResult::exact(rank);
        }
        if today.raw_name.is_some() {
            let identity_key = self.normalizer.identity_key(today);
            if let Some(&rank) = yesterday.by_identity_key.get(&identity_key) {
                return MatchResult::exact(rank);
            }
        }

        match self.secondary_match(today, today_rank, &display_key, yesterday) {
            Some(result) => result,
            None => MatchResult::new_entry(),
        }
    }

    fn secondary_match(
        &self,
        today: &CandidateRecord,
        today_rank: u32,
        display_key: &str,
        yesterday: &PreviousIndex,
    ) -> Option<MatchResult> {
        let brand_key = today
            .brand
            .as_deref()
            .map(|b| self.normalizer.brand_key(b))
            .filter(|b| !b.is_empty())?;
        let today_tokens = display_tokens(&today.display_name);

        for entry in &yesterday.entries {
            if entry.brand_key.as_deref() != Some(brand_key.as_str()) {
                continue;
            }
            if entry.rank.abs_diff(today_rank) > self.config.rank_window {
                continue;
            }
            let shared = today_tokens.intersection(&entry.tokens).count();
            if shared >= self.config.min_shared_tokens {
                let similarity = jaro_winkler(display_key, &entry.display_key);
                debug!(
                    "Secondary match: '{}' (rank {}) -> '{}' (rank {}), {} shared tokens, jw={:.3}",
                    display_key, today_rank, entry.display_key, entry.rank, shared, similarity
                );
                return Some(MatchResult::secondary(entry.rank, similarity));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::RankedEntity;
    use crate::models::matching::MatchKind;
    use chrono::{NaiveDate, Utc};

    fn ranked(name: &str, brand: Option<&str>, rank: u32) -> RankedEntity {
        RankedEntity {
            record: CandidateRecord::new(name, brand).with_position(rank),
            rank,
            trend: 0,
            previous_rank: None,
            match_kind: MatchKind::None,
            composite_score: 0.0,
            score_components: Default::default(),
            imputed_sources: Vec::new(),
            status: None,
            cache_hit: false,
            narrative: None,
            resolved_link: None,
            tags: Vec::new(),
        }
    }

    fn snapshot(items: Vec<RankedEntity>) -> Snapshot {
        Snapshot {
            date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            category: "beauty".to_string(),
            items,
            updated_at: Utc::now(),
            run_id: String::new(),
        }
    }

    #[test]
    fn test_exact_match_ignores_case_and_annotations() {
        let normalizer = Normalizer::default();
        let index = PreviousIndex::build(
            &normalizer,
            &snapshot(vec![ranked("Cica Cream", Some("Acme"), 4)]),
        );
        let matcher = FuzzyMatcher::new(&normalizer, MatcherConfig::default());

        let today = CandidateRecord::new("CICA  cream (1+1)", Some("acme"));
        let result = matcher.match_previous(&today, 9, &index);
        assert_eq!(result.kind, MatchKind::Exact);
        assert_eq!(result.yesterday_rank, Some(4));
    }

    #[test]
    fn test_exact_match_on_raw_name_survives_translation_drift() {
        let normalizer = Normalizer::default();
        let mut yesterday = ranked("Birch Juice Sunscreen", Some("Round Lab"), 2);
        yesterday.record.raw_name = Some("자작나무 수분 선크림".to_string());
        let index = PreviousIndex::build(&normalizer, &snapshot(vec![yesterday]));
        let matcher = FuzzyMatcher::new(&normalizer, MatcherConfig::default());

        let today = CandidateRecord::new("Birch Moisturizing Sun Cream", Some("Round Lab"))
            .with_raw_name("자작나무 수분 선크림");
        let result = matcher.match_previous(&today, 10, &index);
        assert_eq!(result.kind, MatchKind::Exact);
        assert_eq!(result.yesterday_rank, Some(2));
    }

    #[test]
    fn test_aloe_serum_boundary_scenario() {
        // {aloe, serum} are both shared once case-folded: two tokens is enough.
        let normalizer = Normalizer::default();
        let index = PreviousIndex::build(
            &normalizer,
            &snapshot(vec![ranked("Aloe Serum", Some("Acme"), 1)]),
        );
        let matcher = FuzzyMatcher::new(&normalizer, MatcherConfig::default());

        let today = CandidateRecord::new("Acme Aloe Hydrating Serum", Some("Acme"));
        let result = matcher.match_previous(&today, 1, &index);
        assert_eq!(result.kind, MatchKind::Secondary);
        assert_eq!(result.yesterday_rank, Some(1));
        assert!(result.similarity.unwrap() > 0.0);

        let other = CandidateRecord::new("New Cream", Some("Other"));
        assert_eq!(matcher.match_previous(&other, 2, &index).kind, MatchKind::None);
    }

    #[test]
    fn test_single_shared_token_is_a_new_entry() {
        let normalizer = Normalizer::default();
        let index = PreviousIndex::build(
            &normalizer,
            &snapshot(vec![ranked("Aloe Serum", Some("Acme"), 1)]),
        );
        let matcher = FuzzyMatcher::new(&normalizer, MatcherConfig::default());

        let today = CandidateRecord::new("Acme Aloe Hydrating Essence", Some("Acme"));
        let result = matcher.match_previous(&today, 1, &index);
        assert_eq!(result, MatchResult::new_entry());
    }

    #[test]
    fn test_secondary_requires_rank_window_and_brand() {
        let normalizer = Normalizer::default();
        let index = PreviousIndex::build(
            &normalizer,
            &snapshot(vec![ranked("Green Tea Seed Serum", Some("Leaf"), 5)]),
        );
        let matcher = FuzzyMatcher::new(&normalizer, MatcherConfig::default());
        let today = CandidateRecord::new("Green Tea Seed Hyaluronic Serum", Some("Leaf"));

        assert_eq!(matcher.match_previous(&today, 8, &index).kind, MatchKind::Secondary);
        assert_eq!(matcher.match_previous(&today, 2, &index).kind, MatchKind::Secondary);
        assert_eq!(matcher.match_previous(&today, 9, &index).kind, MatchKind::None);

        let unbranded = CandidateRecord::new("Green Tea Seed Hyaluronic Serum", None);
        assert_eq!(matcher.match_previous(&unbranded, 5, &index).kind, MatchKind::None);

        let other_brand = CandidateRecord::new("Green Tea Seed Hyaluronic Serum", Some("Bloom"));
        assert_eq!(matcher.match_previous(&other_brand, 5, &index).kind, MatchKind::None);
    }

    #[test]
    fn test_secondary_takes_first_candidate_in_rank_order() {
        let normalizer = Normalizer::default();
        let index = PreviousIndex::build(
            &normalizer,
            &snapshot(vec![
                ranked("Water Bomb Cream Light", Some("Acme"), 4),
                ranked("Water Bomb Cream", Some("Acme"), 3),
            ]),
        );
        let matcher = FuzzyMatcher::new(&normalizer, MatcherConfig::default());
        let today = CandidateRecord::new("Water Bomb Cream Rich", Some("Acme"));
        let result = matcher.match_previous(&today, 4, &index);
        assert_eq!(result.kind, MatchKind::Secondary);
        assert_eq!(result.yesterday_rank, Some(3));
    }

    #[test]
    fn test_tunable_thresholds() {
        let normalizer = Normalizer::default();
        let index = PreviousIndex::build(
            &normalizer,
            &snapshot(vec![ranked("Aloe Serum", Some("Acme"), 1)]),
        );
        let strict = FuzzyMatcher::new(
            &normalizer,
            MatcherConfig {
                rank_window: 0,
                min_shared_tokens: 3,
            },
        );
        let today = CandidateRecord::new("Acme Aloe Hydrating Serum", Some("Acme"));
        assert_eq!(strict.match_previous(&today, 1, &index).kind, MatchKind::None);
    }

    #[test]
    fn test_empty_index_is_new_entry() {
        let normalizer = Normalizer::default();
        let matcher = FuzzyMatcher::new(&normalizer, MatcherConfig::default());
        let today = CandidateRecord::new("Anything", Some("Acme"));
        let result = matcher.match_previous(&today, 1, &PreviousIndex::default());
        assert!(!result.is_match());
    }
}
