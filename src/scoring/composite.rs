// src/scoring/composite.rs
use log::{debug, warn};
use std::collections::BTreeMap;

use crate::errors::{RankingError, ScoringError};
use crate::matching::normalize::normalize;
use crate::models::core::CandidateRecord;
use crate::scoring::imputation::{impute, ImputationMethod};
use crate::scoring::transforms::clamp_score;
use crate::scoring::weights::WeightTable;
use crate::utils::constants::NEUTRAL_SCORE;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// Clamped to [0, 100], one decimal.
    pub score: f64,
    /// Post-imputation component per declared source.
    pub components: BTreeMap<String, f64>,
    pub imputed: Vec<String>,
    pub bonus_applied: bool,
    /// True when scoring failed and the neutral score was substituted.
    pub neutral_fallback: bool,
}

impl ScoreBreakdown {
    pub fn neutral() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            components: BTreeMap::new(),
            imputed: Vec::new(),
            bonus_applied: false,
            neutral_fallback: true,
        }
    }
}

/// Scores `observed` against `table`, validating the table first.
pub fn composite_score(
    observed: &BTreeMap<String, Option<f64>>,
    table: &WeightTable,
    identity_key: &str,
) -> Result<ScoreBreakdown, ScoringError> {
    table
        .validate()
        .map_err(|e| ScoringError::MalformedTable(e.to_string()))?;
    blend(table, observed, &[identity_key], identity_key)
}

/// Weighted blend over one domain's validated weight table.
#[derive(Debug, Clone)]
pub struct CompositeScoreEngine {
    table: WeightTable,
}

impl CompositeScoreEngine {
    pub fn new(table: WeightTable) -> Result<Self, RankingError> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    pub fn score(
        &self,
        observed: &BTreeMap<String, Option<f64>>,
        identity_key: &str,
    ) -> Result<ScoreBreakdown, ScoringError> {
        blend(&self.table, observed, &[identity_key], identity_key)
    }

    /// Converts a record's raw sub-scores into components. Enrichment
    /// components only fill sources the record itself leaves missing.
    pub fn observed_components(
        &self,
        record: &CandidateRecord,
        enrichment: &BTreeMap<String, f64>,
    ) -> Result<BTreeMap<String, Option<f64>>, ScoringError> {
        for raw in &record.sub_scores {
            if self.table.source(&raw.source).is_none() {
                debug!(
                    "Ignoring undeclared source '{}' on '{}'",
                    raw.source, record.display_name
                );
            }
        }

        let mut observed = BTreeMap::new();
        for spec in &self.table.sources {
            let from_record = match record.sub_score(&spec.name) {
                Some(raw) => spec.transform.apply(raw)?,
                None => None,
            };
            let value = from_record.or_else(|| enrichment.get(&spec.name).copied());
            observed.insert(spec.name.clone(), value);
        }
        Ok(observed)
    }

    /// `identity_key` and `display_key` must come from the domain's
    /// `Normalizer`; bonus keywords are matched against both.
    pub fn score_candidate(
        &self,
        record: &CandidateRecord,
        identity_key: &str,
        display_key: &str,
        enrichment: &BTreeMap<String, f64>,
    ) -> Result<ScoreBreakdown, ScoringError> {
        let observed = self.observed_components(record, enrichment)?;
        blend(&self.table, &observed, &[identity_key, display_key], identity_key)
    }

    /// `score_candidate`, degrading to the neutral score on any failure so
    /// one bad entity never aborts a run.
    pub fn score_or_neutral(
        &self,
        record: &CandidateRecord,
        identity_key: &str,
        display_key: &str,
        enrichment: &BTreeMap<String, f64>,
    ) -> ScoreBreakdown {
        match self.score_candidate(record, identity_key, display_key, enrichment) {
            Ok(breakdown) => breakdown,
            Err(e) => {
                warn!(
                    "Scoring failed for '{}', using neutral score {}: {}",
                    record.display_name, NEUTRAL_SCORE, e
                );
                ScoreBreakdown::neutral()
            }
        }
    }
}

fn blend(
    table: &WeightTable,
    observed: &BTreeMap<String, Option<f64>>,
    bonus_keys: &[&str],
    identity_key: &str,
) -> Result<ScoreBreakdown, ScoringError> {
    let mut present = BTreeMap::new();
    for spec in &table.sources {
        if let Some(Some(value)) = observed.get(&spec.name) {
            if !value.is_finite() {
                return Err(ScoringError::NonFiniteSignal {
                    source_name: spec.name.clone(),
                });
            }
            present.insert(spec.name.clone(), clamp_score(*value));
        }
    }

    let mut components = BTreeMap::new();
    let mut imputed = Vec::new();
    let mut total = 0.0;
    for spec in &table.sources {
        let value = match present.get(&spec.name) {
            Some(value) => *value,
            None => {
                let imputation = impute(spec, &present, identity_key);
                if let ImputationMethod::Correlated { from } = &imputation.method {
                    debug!(
                        "Imputed '{}' from '{}' for '{}': {:.2}",
                        spec.name, from, identity_key, imputation.value
                    );
                }
                imputed.push(spec.name.clone());
                imputation.value
            }
        };
        total += spec.weight * value;
        components.insert(spec.name.clone(), value);
    }

    if !total.is_finite() {
        return Err(ScoringError::NonFiniteResult);
    }

    let bonus_applied = match &table.bonus {
        Some(bonus) => bonus
            .keywords
            .iter()
            .any(|keyword| bonus_keys.iter().any(|key| contains_keyword(key, keyword))),
        None => false,
    };
    if bonus_applied {
        total += table.bonus.as_ref().map(|b| b.points).unwrap_or(0.0);
    }

    Ok(ScoreBreakdown {
        score: round_score(clamp_score(total)),
        components,
        imputed,
        bonus_applied,
        neutral_fallback: false,
    })
}

/// Whole-word containment of a normalized keyword in a normalized key.
fn contains_keyword(key: &str, keyword: &str) -> bool {
    let keyword = normalize(None, keyword);
    if keyword.is_empty() {
        return false;
    }
    format!(" {} ", key).contains(&format!(" {} ", keyword))
}

pub fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}
