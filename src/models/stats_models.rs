// src/models/stats_models.rs
use serde::{Deserialize, Serialize};

use crate::models::matching::MatchKind;

/// Counters collected over one (domain, date) run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub candidates_received: usize,
    pub duplicates_dropped: usize,
    pub entities_ranked: usize,
    pub exact_matches: usize,
    pub secondary_matches: usize,
    pub new_entries: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub enrichment_failures: usize,
    pub imputed_components: usize,
    pub neutral_fallbacks: usize,
    pub had_previous_snapshot: bool,
    pub processing_time_secs: f64,
}

impl RunStats {
    pub fn record_match(&mut self, kind: MatchKind) {
        match kind {
            MatchKind::Exact => self.exact_matches += 1,
            MatchKind::Secondary => self.secondary_matches += 1,
            MatchKind::None => self.new_entries += 1,
        }
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64 * 100.0
        }
    }
}
