// src/models/matching.rs
use serde::{Deserialize, Serialize};

/// Which tier of the matcher linked today's entity to yesterday's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Secondary,
    #[default]
    None,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Secondary => "secondary",
            MatchKind::None => "new",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub yesterday_rank: Option<u32>,
    pub kind: MatchKind,
    /// Jaro-Winkler similarity of the two keys; diagnostic only.
    pub similarity: Option<f64>,
}

impl MatchResult {
    pub fn new_entry() -> Self {
        Self {
            yesterday_rank: None,
            kind: MatchKind::None,
            similarity: None,
        }
    }

    pub fn exact(yesterday_rank: u32) -> Self {
        Self {
            yesterday_rank: Some(yesterday_rank),
            kind: MatchKind::Exact,
            similarity: Some(1.0),
        }
    }

    pub fn secondary(yesterday_rank: u32, similarity: f64) -> Self {
        Self {
            yesterday_rank: Some(yesterday_rank),
            kind: MatchKind::Secondary,
            similarity: Some(similarity),
        }
    }

    pub fn is_match(&self) -> bool {
        self.kind != MatchKind::None
    }
}
