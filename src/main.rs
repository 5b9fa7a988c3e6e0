// src/main.rs
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

use leaderboard_lib::config::domains::DomainRegistry;
use leaderboard_lib::errors::RankingError;
use leaderboard_lib::matching::normalize::Normalizer;
use leaderboard_lib::models::core::CandidateRecord;
use leaderboard_lib::pipeline::enrichment::TableEnricher;
use leaderboard_lib::pipeline::orchestrator::{RankingPipeline, RunOptions};
use leaderboard_lib::utils::constants::DATE_FORMAT;
use leaderboard_lib::utils::env::{load_env, PipelineConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Leaderboard domain (beauty, media, place, restaurants, food, or one from --config)
    #[arg(long)]
    domain: String,

    /// JSON array of candidate records, in collection order
    #[arg(long)]
    input: PathBuf,

    /// Ranking date (YYYY-MM-DD), defaults to today in UTC
    #[arg(long)]
    date: Option<String>,

    /// Root of the JSON document store (overrides RANKING_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// JSON file with domain configurations (overrides RANKING_CONFIG_PATH)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON object of enrichment results keyed by display name
    #[arg(long)]
    enrichment: Option<PathBuf>,

    /// Overwrite an existing snapshot for the same date and domain
    #[arg(long)]
    replace_existing: bool,

    /// Published leaderboard length (overrides RANKING_MAX_ITEMS and the domain default)
    #[arg(long)]
    max_items: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let args = Args::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(path) = args.config {
        config.domain_config_path = Some(path);
    }
    if args.max_items.is_some() {
        config.max_items = args.max_items;
    }

    let date = match args.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .with_context(|| format!("Invalid --date '{}', expected YYYY-MM-DD", raw))?,
        None => Utc::now().date_naive(),
    };

    let registry = DomainRegistry::load(config.domain_config_path.as_deref())
        .context("Failed to load domain configuration")?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read candidates from {}", args.input.display()))?;
    let candidates: Vec<CandidateRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse candidates in {}", args.input.display()))?;
    info!(
        "Loaded {} candidates for '{}' from {}",
        candidates.len(),
        args.domain,
        args.input.display()
    );

    let mut pipeline = RankingPipeline::from_config(&config, registry.clone()).with_options(
        RunOptions {
            replace_existing: args.replace_existing,
            max_items: config.max_items,
            affiliate_id: config.affiliate_id.clone(),
        },
    );
    if let Some(path) = args.enrichment {
        let brands = registry
            .get(&args.domain)
            .map(|d| d.brands.clone())
            .unwrap_or_default();
        let enricher = TableEnricher::from_file(&path, Normalizer::new(brands))?;
        pipeline = pipeline.with_enricher(Arc::new(enricher));
    }

    match pipeline.run(&args.domain, date, candidates).await {
        Ok(outcome) => {
            info!(
                "Snapshot {} written with {} entities ({} exact, {} secondary, {} new; cache hit rate {:.1}%)",
                outcome.doc_id,
                outcome.stats.entities_ranked,
                outcome.stats.exact_matches,
                outcome.stats.secondary_matches,
                outcome.stats.new_entries,
                outcome.stats.cache_hit_rate()
            );
            Ok(())
        }
        Err(e) => {
            if let Some(ranking_error) = e.downcast_ref::<RankingError>() {
                if ranking_error.is_fatal_before_persist() {
                    error!("Run aborted before persisting anything: {}", ranking_error);
                }
            }
            Err(e)
        }
    }
}
