// src/utils/constants.rs

/// Collection holding one snapshot document per (date, domain).
pub const SNAPSHOT_COLLECTION: &str = "daily_rankings";

/// Domain-agnostic collection holding enrichment results keyed by identity hash.
pub const CACHE_COLLECTION: &str = "enrichment_cache";

/// Upper bound of every component and composite score.
pub const SCORE_MAX: f64 = 100.0;
pub const SCORE_MIN: f64 = 0.0;

/// Score given to an entity whose scoring failed outright.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Secondary matcher: yesterday rank must be within this many places of today's.
pub const DEFAULT_RANK_WINDOW: u32 = 3;
/// Secondary matcher: minimum number of shared display-name tokens.
pub const DEFAULT_MIN_SHARED_TOKENS: usize = 2;

/// Weights must sum to 1.0 within this tolerance.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

pub const DEFAULT_RESULT_CACHE_SIZE: usize = 20000;

/// Demand bands derived from a restaurant/place score.
pub const HARD_TO_BOOK_THRESHOLD: f64 = 95.0;
pub const QUEUEING_THRESHOLD: f64 = 85.0;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
