// src/scoring/weights.rs
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::RankingError;
use crate::scoring::transforms::SignalTransform;
use crate::utils::constants::{SCORE_MAX, SCORE_MIN, WEIGHT_SUM_TOLERANCE};

/// One declared signal of a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    pub name: String,
    pub weight: f64,
    pub transform: SignalTransform,
    /// Correlated source whose value stands in when this one is missing.
    #[serde(default)]
    pub impute_from: Option<String>,
    /// Used when no correlated value is available.
    #[serde(default)]
    pub fallback: Option<f64>,
    /// Half-width of the deterministic jitter added to a correlated substitute.
    #[serde(default)]
    pub jitter: f64,
}

impl SourceSpec {
    pub fn new(name: &str, weight: f64, transform: SignalTransform) -> Self {
        Self {
            name: name.to_string(),
            weight,
            transform,
            impute_from: None,
            fallback: None,
            jitter: 0.0,
        }
    }

    pub fn impute_from(mut self, source: &str, jitter: f64) -> Self {
        self.impute_from = Some(source.to_string());
        self.jitter = jitter;
        self
    }

    pub fn fallback(mut self, value: f64) -> Self {
        self.fallback = Some(value);
        self
    }
}

/// Flat additive nudge for entities whose key contains an allow-listed keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusRule {
    pub keywords: Vec<String>,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightTable {
    pub sources: Vec<SourceSpec>,
    #[serde(default)]
    pub bonus: Option<BonusRule>,
}

impl WeightTable {
    pub fn new(sources: Vec<SourceSpec>) -> Self {
        Self {
            sources,
            bonus: None,
        }
    }

    pub fn with_bonus(mut self, keywords: &[&str], points: f64) -> Self {
        self.bonus = Some(BonusRule {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            points,
        });
        self
    }

    pub fn source(&self, name: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn total_weight(&self) -> f64 {
        self.sources.iter().map(|s| s.weight).sum()
    }

    /// Rejects any table that would silently mis-weight a ranking.
    pub fn validate(&self) -> Result<(), RankingError> {
        let malformed = |msg: String| Err(RankingError::MalformedWeightConfiguration(msg));

        if self.sources.is_empty() {
            return malformed("no sources declared".to_string());
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return malformed("source with empty name".to_string());
            }
            if !seen.insert(source.name.as_str()) {
                return malformed(format!("source '{}' declared twice", source.name));
            }
            if !source.weight.is_finite() || source.weight < 0.0 {
                return malformed(format!(
                    "source '{}' has invalid weight {}",
                    source.name, source.weight
                ));
            }
            if !source.jitter.is_finite() || source.jitter < 0.0 {
                return malformed(format!(
                    "source '{}' has invalid jitter {}",
                    source.name, source.jitter
                ));
            }
            if let Some(fallback) = source.fallback {
                if !fallback.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&fallback) {
                    return malformed(format!(
                        "source '{}' fallback {} outside [{}, {}]",
                        source.name, fallback, SCORE_MIN, SCORE_MAX
                    ));
                }
            }
            source
                .transform
                .validate()
                .map_err(|msg| {
                    RankingError::MalformedWeightConfiguration(format!(
                        "source '{}': {}",
                        source.name, msg
                    ))
                })?;
        }

        for source in &self.sources {
            if let Some(from) = &source.impute_from {
                if from == &source.name {
                    return malformed(format!("source '{}' imputes from itself", source.name));
                }
                if !seen.contains(from.as_str()) {
                    return malformed(format!(
                        "source '{}' imputes from undeclared source '{}'",
                        source.name, from
                    ));
                }
            }
        }

        let total = self.total_weight();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return malformed(format!("weights sum to {:.6}, expected 1.0", total));
        }

        if let Some(bonus) = &self.bonus {
            if !bonus.points.is_finite() || bonus.points < 0.0 {
                return malformed(format!("invalid bonus points {}", bonus.points));
            }
        }
        Ok(())
    }
}
