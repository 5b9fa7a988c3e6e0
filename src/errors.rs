// src/errors.rs
use std::io;

use thiserror::Error;

/// Fatal conditions for a ranking run. Anything recoverable (missing previous
/// snapshot, missing sub-score, a single entity failing to score) never
/// reaches this type.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("malformed weight configuration: {0}")]
    MalformedWeightConfiguration(String),
    #[error("rank invariant violated: {0}")]
    RankInvariantViolation(String),
    #[error("snapshot '{doc_id}' already exists and is append-only")]
    SnapshotExists { doc_id: String },
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),
    #[error("document store failure: {0}")]
    Store(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl RankingError {
    /// True for misconfiguration and programming defects, which must abort
    /// the run before anything is persisted.
    pub fn is_fatal_before_persist(&self) -> bool {
        matches!(
            self,
            RankingError::MalformedWeightConfiguration(_)
                | RankingError::RankInvariantViolation(_)
                | RankingError::UnknownDomain(_)
        )
    }
}

/// Per-entity scoring failure. The pipeline recovers from these with a
/// neutral score instead of aborting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("source '{source_name}' produced a non-finite value")]
    NonFiniteSignal { source_name: String },
    #[error("source '{source_name}' has rating {rating} outside [0, {max_rating}]")]
    InvalidRating {
        source_name: String,
        rating: f64,
        max_rating: f64,
    },
    #[error("source '{source_name}' has rank 0; ranks are 1-based")]
    InvalidRank { source_name: String },
    #[error("weight table rejected: {0}")]
    MalformedTable(String),
    #[error("composite score is not finite")]
    NonFiniteResult,
}
