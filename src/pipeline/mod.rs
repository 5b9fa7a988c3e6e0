pub mod enrichment;
pub mod orchestrator;

pub use enrichment::{Enricher, LinkTemplate, TableEnricher};
pub use orchestrator::{RankingPipeline, RunOptions, RunOutcome};
