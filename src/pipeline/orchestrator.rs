// src/pipeline/orchestrator.rs - One (domain, date) ranking run
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::cache::result_cache::{create_shared_cache, CacheEntry, SharedResultCache};
use crate::config::domains::{DomainConfig, DomainRegistry};
use crate::matching::fuzzy::{FuzzyMatcher, PreviousIndex};
use crate::matching::normalize::Normalizer;
use crate::models::core::{CandidateRecord, Enrichment, ScoredEntity, Snapshot};
use crate::models::stats_models::RunStats;
use crate::pipeline::enrichment::Enricher;
use crate::ranking::assembler::{annotate_trends, assemble};
use crate::scoring::composite::CompositeScoreEngine;
use crate::scoring::transforms::demand_status;
use crate::store::document_store::DocumentStore;
use crate::store::json_store::JsonFileStore;
use crate::store::snapshots::{snapshot_doc_id, SnapshotRepository};
use crate::utils::env::PipelineConfig;
use crate::utils::progress_bars::logging::RankingLogger;
use crate::utils::progress_bars::progress_config::ProgressConfig;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Overwrite an existing snapshot for the same (date, domain).
    pub replace_existing: bool,
    /// Overrides the domain's own `max_items`.
    pub max_items: Option<usize>,
    pub affiliate_id: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            replace_existing: false,
            max_items: None,
            affiliate_id: PipelineConfig::default().affiliate_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub doc_id: String,
    pub snapshot: Snapshot,
    pub stats: RunStats,
}

pub struct RankingPipeline {
    registry: DomainRegistry,
    snapshots: SnapshotRepository,
    cache: SharedResultCache,
    enricher: Option<Arc<dyn Enricher>>,
    options: RunOptions,
    progress: ProgressConfig,
}

impl RankingPipeline {
    pub fn new(
        registry: DomainRegistry,
        store: Arc<dyn DocumentStore>,
        cache: SharedResultCache,
    ) -> Self {
        Self {
            registry,
            snapshots: SnapshotRepository::new(store),
            cache,
            enricher: None,
            options: RunOptions::default(),
            progress: ProgressConfig::disabled(),
        }
    }

    /// JSON file store under `config.data_dir`, progress bars from the environment.
    pub fn from_config(config: &PipelineConfig, registry: DomainRegistry) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(JsonFileStore::new(&config.data_dir));
        let cache = create_shared_cache(store.clone(), config.result_cache_size);
        Self::new(registry, store, cache)
            .with_options(RunOptions {
                replace_existing: false,
                max_items: config.max_items,
                affiliate_id: config.affiliate_id.clone(),
            })
            .with_progress(ProgressConfig::from_env())
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.progress = progress;
        self
    }

    pub fn cache(&self) -> SharedResultCache {
        self.cache.clone()
    }

    pub fn snapshots(&self) -> &SnapshotRepository {
        &self.snapshots
    }

    pub async fn run(
        &self,
        domain: &str,
        date: NaiveDate,
        candidates: Vec<CandidateRecord>,
    ) -> Result<RunOutcome> {
        let start_time = Instant::now();
        let logger = RankingLogger::new(domain);
        let mut stats = RunStats {
            candidates_received: candidates.len(),
            ..RunStats::default()
        };

        // Misconfiguration aborts before anything is read or written.
        let domain_config = self
            .registry
            .get(domain)
            .with_context(|| format!("No configuration for domain '{}'", domain))?;
        domain_config
            .validate()
            .with_context(|| format!("Invalid configuration for domain '{}'", domain))?;
        let engine = CompositeScoreEngine::new(domain_config.weights.clone())
            .with_context(|| format!("Invalid weight table for domain '{}'", domain))?;

        let run_id = Uuid::new_v4().to_string();
        logger.log_start(&run_id, &date.to_string(), candidates.len());

        logger.log_phase("Preparing candidates", None);
        let records = prepare_candidates(candidates, &mut stats);
        if stats.duplicates_dropped > 0 {
            logger.log_debug(&format!(
                "Dropped {} duplicate source ids",
                stats.duplicates_dropped
            ));
        }

        logger.log_phase("Loading previous snapshot", None);
        let previous = self
            .snapshots
            .load_previous(date, domain)
            .await
            .with_context(|| format!("Failed to load previous snapshot for '{}'", domain))?;
        let previous_doc_id = date
            .pred_opt()
            .map(|d| snapshot_doc_id(d, domain))
            .unwrap_or_default();
        logger.log_previous_snapshot(&previous_doc_id, previous.as_ref().map(|s| s.items.len()));
        stats.had_previous_snapshot = previous.is_some();

        let normalizer = Normalizer::new(domain_config.brands.clone());
        let index = previous
            .as_ref()
            .map(|snapshot| PreviousIndex::build(&normalizer, snapshot))
            .unwrap_or_default();
        let matcher = FuzzyMatcher::new(&normalizer, domain_config.matcher);

        logger.log_phase(
            "Matching and scoring",
            Some(&format!("{} entities", records.len())),
        );
        let entity_pb = self.progress.create_entity_bar(records.len(), domain);
        let mut scored = Vec::with_capacity(records.len());
        for record in records {
            let identity_key = normalizer.identity_key(&record);
            let matched = matcher.match_previous(&record, record.position, &index);
            stats.record_match(matched.kind);

            let (enrichment, cache_hit) = self
                .enrichment_for(&record, &identity_key, domain, &logger, &mut stats)
                .await;

            let display_key = normalizer.display_key(&record);
            let breakdown = engine.score_or_neutral(
                &record,
                &identity_key,
                &display_key,
                &enrichment.components,
            );
            stats.imputed_components += breakdown.imputed.len();
            if breakdown.neutral_fallback {
                stats.neutral_fallbacks += 1;
            }

            let resolved_link = enrichment
                .resolved_link
                .clone()
                .or_else(|| resolve_link(domain_config, &record, &self.options.affiliate_id));

            if let Some(pb) = &entity_pb {
                if self.progress.should_show_detailed() {
                    pb.set_message(format!("{} ({:.1})", record.display_name, breakdown.score));
                } else if self.progress.should_show_cache_stats() {
                    pb.set_message(format!(
                        "cache {}/{}",
                        stats.cache_hits,
                        stats.cache_hits + stats.cache_misses
                    ));
                }
                pb.inc(1);
            }

            scored.push(ScoredEntity {
                identity_key,
                previous_rank: matched.yesterday_rank,
                match_kind: matched.kind,
                composite_score: breakdown.score,
                score_components: breakdown.components,
                imputed_sources: breakdown.imputed,
                status: domain_config
                    .status_bands
                    .then(|| demand_status(breakdown.score).to_string()),
                cache_hit,
                narrative: enrichment.narrative,
                resolved_link,
                tags: enrichment.tags,
                record,
            });
        }
        if let Some(pb) = &entity_pb {
            pb.finish_and_clear();
        }

        logger.log_phase("Assembling ranking", None);
        let max_items = self.options.max_items.or(domain_config.max_items);
        let mut items = assemble(scored, max_items).context("Ranking assembly failed")?;
        annotate_trends(&mut items);

        let snapshot = Snapshot {
            date,
            category: domain.to_string(),
            items,
            updated_at: Utc::now(),
            run_id,
        };

        logger.log_phase("Persisting snapshot", None);
        let doc_id = self
            .snapshots
            .save(&snapshot, self.options.replace_existing)
            .await
            .with_context(|| format!("Failed to persist snapshot for '{}' on {}", domain, date))?;
        info!("Persisted snapshot {}", doc_id);

        stats.entities_ranked = snapshot.items.len();
        stats.processing_time_secs = start_time.elapsed().as_secs_f64();
        logger.log_cache_results(stats.cache_hits, stats.cache_misses);
        logger.log_completion(&stats);

        Ok(RunOutcome {
            doc_id,
            snapshot,
            stats,
        })
    }

    /// Cached enrichment, or a fresh one from the enricher on a miss. Cache
    /// and enricher failures degrade to "no enrichment" and never abort.
    async fn enrichment_for(
        &self,
        record: &CandidateRecord,
        identity_key: &str,
        domain: &str,
        logger: &RankingLogger,
        stats: &mut RunStats,
    ) -> (Enrichment, bool) {
        {
            let mut cache = self.cache.lock().await;
            match cache.get(identity_key).await {
                Ok(Some(entry)) => {
                    stats.cache_hits += 1;
                    return (entry.to_enrichment(), true);
                }
                Ok(None) => {}
                Err(e) => logger.log_warning(&format!(
                    "Cache lookup failed for '{}': {}",
                    identity_key, e
                )),
            }
        }
        stats.cache_misses += 1;

        let Some(enricher) = &self.enricher else {
            return (Enrichment::default(), false);
        };

        match enricher.enrich(record, domain).await {
            Ok(enrichment) => {
                let entry = CacheEntry::from_enrichment(identity_key, enrichment.clone());
                let mut cache = self.cache.lock().await;
                if let Err(e) = cache.put(identity_key, entry).await {
                    logger.log_warning(&format!(
                        "Failed to cache enrichment for '{}': {}",
                        identity_key, e
                    ));
                }
                (enrichment, false)
            }
            Err(e) => {
                stats.enrichment_failures += 1;
                logger.log_warning(&format!(
                    "Enrichment failed for '{}': {:#}",
                    record.display_name, e
                ));
                (Enrichment::default(), false)
            }
        }
    }
}

/// Drops repeated `source_id`s (first wins) and fills in missing positions
/// from input order.
fn prepare_candidates(candidates: Vec<CandidateRecord>, stats: &mut RunStats) -> Vec<CandidateRecord> {
    let mut seen = HashSet::new();
    let mut records: Vec<CandidateRecord> = candidates
        .into_iter()
        .filter(|record| match &record.source_id {
            Some(id) if !seen.insert(id.clone()) => {
                debug!("Skipping duplicate source id {} ({})", id, record.display_name);
                stats.duplicates_dropped += 1;
                false
            }
            _ => true,
        })
        .collect();

    // Records without a position go after every explicit one, in collection order.
    let mut next_position = records.iter().map(|record| record.position).max().unwrap_or(0);
    for record in records.iter_mut().filter(|record| record.position == 0) {
        next_position = next_position.saturating_add(1);
        record.position = next_position;
    }
    records.sort_by_key(|record| record.position);
    records
}

fn resolve_link(config: &DomainConfig, record: &CandidateRecord, affiliate_id: &str) -> Option<String> {
    config
        .link
        .as_ref()
        .and_then(|template| template.resolve(record, affiliate_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::RawSubScore;

    #[test]
    fn test_prepare_candidates_dedupes_and_positions() {
        let mut stats = RunStats::default();
        let records = prepare_candidates(
            vec![
                CandidateRecord::new("A", None).with_source_id("p1"),
                CandidateRecord::new("B", None).with_source_id("p2"),
                CandidateRecord::new("A again", None).with_source_id("p1"),
                CandidateRecord::new("C", None),
                CandidateRecord::new("D", None),
            ],
            &mut stats,
        );
        assert_eq!(stats.duplicates_dropped, 1);
        let order: Vec<(&str, u32)> = records
            .iter()
            .map(|r| (r.display_name.as_str(), r.position))
            .collect();
        assert_eq!(order, vec![("A", 1), ("B", 2), ("C", 3), ("D", 4)]);
    }

    #[test]
    fn test_prepare_candidates_keeps_given_positions() {
        let mut stats = RunStats::default();
        let records = prepare_candidates(
            vec![
                CandidateRecord::new("second", None)
                    .with_position(2)
                    .with_sub_score(RawSubScore::from_rank("primary_rank", 2)),
                CandidateRecord::new("first", None).with_position(1),
            ],
            &mut stats,
        );
        assert_eq!(records[0].display_name, "first");
        assert_eq!(records[1].position, 2);
    }

    #[test]
    fn test_prepare_candidates_places_unpositioned_after_explicit() {
        let mut stats = RunStats::default();
        let records = prepare_candidates(
            vec![
                CandidateRecord::new("A", None).with_position(5),
                CandidateRecord::new("B", None),
                CandidateRecord::new("C", None),
                CandidateRecord::new("D", None).with_position(2),
            ],
            &mut stats,
        );
        let order: Vec<(&str, u32)> = records
            .iter()
            .map(|r| (r.display_name.as_str(), r.position))
            .collect();
        assert_eq!(order, vec![("D", 2), ("A", 5), ("B", 6), ("C", 7)]);
    }
}
