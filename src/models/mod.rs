pub mod core;
pub mod matching;
pub mod stats_models;

pub use self::core::{CandidateRecord, Enrichment, RankedEntity, RawSubScore, ScoredEntity, Snapshot};
pub use self::matching::{MatchKind, MatchResult};
pub use self::stats_models::RunStats;
