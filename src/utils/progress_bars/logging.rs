// src/utils/progress_bars/logging.rs - Logging helpers for a domain ranking run
use log::{debug, info, warn};
use std::time::Instant;

use crate::models::stats_models::RunStats;

#[derive(Clone)]
pub struct RankingLogger {
    domain_tag: String,
    domain_emoji: &'static str,
    start_time: Instant,
}

impl RankingLogger {
    pub fn new(domain: &str) -> Self {
        let domain_emoji = match domain {
            "beauty" => "💄",
            "media" => "🎬",
            "place" => "🗺️",
            "restaurants" => "🍽️",
            d if d.starts_with("food") => "🍜",
            _ => "🏆",
        };
        Self {
            domain_tag: domain.to_uppercase(),
            domain_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, run_id: &str, date: &str, candidates: usize) {
        info!(
            "[{}] {} 🚀 Starting ranking run {} for {} ({} candidates)",
            self.domain_tag, self.domain_emoji, run_id, date, candidates
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.domain_tag,
                self.domain_emoji,
                phase,
                details,
                elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.domain_tag,
                self.domain_emoji,
                phase,
                elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_previous_snapshot(&self, doc_id: &str, items: Option<usize>) {
        match items {
            Some(count) => info!(
                "[{}] {} 📊 Previous snapshot {} has {} entities",
                self.domain_tag, self.domain_emoji, doc_id, count
            ),
            None => info!(
                "[{}] {} ✨ No previous snapshot {} - every entity is a new entry",
                self.domain_tag, self.domain_emoji, doc_id
            ),
        }
    }

    pub fn log_cache_results(&self, cache_hits: usize, cache_misses: usize) {
        let total = cache_hits + cache_misses;
        if total > 0 {
            let hit_rate = (cache_hits as f64 / total as f64) * 100.0;
            info!(
                "[{}] {} 💾 Cache results: {} hits, {} misses ({:.1}% hit rate)",
                self.domain_tag, self.domain_emoji, cache_hits, cache_misses, hit_rate
            );
        }
    }

    pub fn log_completion(&self, stats: &RunStats) {
        let duration = self.start_time.elapsed();
        info!(
            "[{}] {} 🎉 COMPLETED: {} entities ranked in {:.2?}",
            self.domain_tag, self.domain_emoji, stats.entities_ranked, duration
        );
        info!(
            "[{}] {} 📊 Matches: {} exact, {} secondary, {} new",
            self.domain_tag,
            self.domain_emoji,
            stats.exact_matches,
            stats.secondary_matches,
            stats.new_entries
        );
        if stats.imputed_components > 0 {
            info!(
                "[{}] {} 🧮 {} missing components imputed",
                self.domain_tag, self.domain_emoji, stats.imputed_components
            );
        }
        if stats.neutral_fallbacks > 0 || stats.enrichment_failures > 0 {
            warn!(
                "[{}] {} ⚠️  {} entities fell back to the neutral score, {} enrichment failures",
                self.domain_tag,
                self.domain_emoji,
                stats.neutral_fallbacks,
                stats.enrichment_failures
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.domain_tag, self.domain_emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.domain_tag, self.domain_emoji, message);
    }
}
