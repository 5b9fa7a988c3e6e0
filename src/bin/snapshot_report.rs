// src/bin/snapshot_report.rs
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use leaderboard_lib::models::core::{RankedEntity, Snapshot};
use leaderboard_lib::models::matching::MatchKind;
use leaderboard_lib::store::json_store::JsonFileStore;
use leaderboard_lib::store::snapshots::SnapshotRepository;
use leaderboard_lib::utils::constants::DATE_FORMAT;
use leaderboard_lib::utils::env::{load_env, PipelineConfig};

#[derive(Parser)]
#[command(author, version, about = "Print a stored leaderboard snapshot", long_about = None)]
struct ReportArgs {
    #[arg(long)]
    domain: String,

    /// Snapshot date (YYYY-MM-DD); the latest stored one when omitted
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Also print score components and imputed sources
    #[arg(short, long)]
    verbose: bool,
}

fn trend_label(item: &RankedEntity) -> String {
    match (item.match_kind, item.trend) {
        (MatchKind::None, _) => "NEW".to_string(),
        (_, 0) => "-".to_string(),
        (_, t) if t > 0 => format!("▲{}", t),
        (_, t) => format!("▼{}", -t),
    }
}

fn print_snapshot(snapshot: &Snapshot, verbose: bool) {
    println!(
        "\n🏆 {} leaderboard for {} ({} entities, run {})",
        snapshot.category,
        snapshot.date,
        snapshot.items.len(),
        snapshot.run_id
    );
    println!(
        "{:>4}  {:>6}  {:>6}  {:<13}  {}",
        "Rank", "Trend", "Score", "Status", "Name"
    );
    println!("{}", "-".repeat(72));
    for item in &snapshot.items {
        let name = match &item.record.brand {
            Some(brand) => format!("{} · {}", brand, item.record.display_name),
            None => item.record.display_name.clone(),
        };
        println!(
            "{:>4}  {:>6}  {:>6.1}  {:<13}  {}{}",
            item.rank,
            trend_label(item),
            item.composite_score,
            item.status.as_deref().unwrap_or(""),
            name,
            if item.cache_hit { "  (cached)" } else { "" }
        );
        if verbose {
            let components: Vec<String> = item
                .score_components
                .iter()
                .map(|(source, value)| format!("{}={:.1}", source, value))
                .collect();
            println!("        components: {}", components.join(", "));
            if !item.imputed_sources.is_empty() {
                println!("        imputed: {}", item.imputed_sources.join(", "));
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let args = ReportArgs::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    let repo = SnapshotRepository::new(Arc::new(JsonFileStore::new(&config.data_dir)));

    let date = match args.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .with_context(|| format!("Invalid --date '{}', expected YYYY-MM-DD", raw))?,
        None => {
            let dates = repo
                .dates(&args.domain)
                .await
                .context("Failed to list stored snapshots")?;
            match dates.last() {
                Some(date) => *date,
                None => bail!(
                    "No snapshots stored for '{}' under {}",
                    args.domain,
                    config.data_dir.display()
                ),
            }
        }
    };
    info!("Reading snapshot for '{}' on {}", args.domain, date);

    match repo.load(date, &args.domain).await? {
        Some(snapshot) => {
            print_snapshot(&snapshot, args.verbose);
            Ok(())
        }
        None => bail!("No snapshot for '{}' on {}", args.domain, date),
    }
}
