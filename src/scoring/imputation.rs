// src/scoring/imputation.rs
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::scoring::transforms::clamp_score;
use crate::scoring::weights::SourceSpec;
use crate::utils::constants::NEUTRAL_SCORE;
use crate::utils::hashing::seed_for;

#[derive(Debug, Clone, PartialEq)]
pub enum ImputationMethod {
    Correlated { from: String },
    Fallback,
    ObservedMean,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Imputation {
    pub value: f64,
    pub method: ImputationMethod,
}

/// Offset in `[-amplitude, amplitude]`, fixed for a given (identity, source).
pub fn jitter(identity_key: &str, source: &str, amplitude: f64) -> f64 {
    if !amplitude.is_finite() || amplitude <= 0.0 {
        return 0.0;
    }
    let mut rng = StdRng::seed_from_u64(seed_for(identity_key, source));
    rng.gen_range(-amplitude..=amplitude)
}

/// Substitute for a missing component. `observed` holds only the components
/// that were actually present for this entity.
pub fn impute(spec: &SourceSpec, observed: &BTreeMap<String, f64>, identity_key: &str) -> Imputation {
    if let Some(from) = &spec.impute_from {
        if let Some(base) = observed.get(from) {
            return Imputation {
                value: clamp_score(base + jitter(identity_key, &spec.name, spec.jitter)),
                method: ImputationMethod::Correlated { from: from.clone() },
            };
        }
    }

    if let Some(fallback) = spec.fallback {
        return Imputation {
            value: clamp_score(fallback),
            method: ImputationMethod::Fallback,
        };
    }

    if !observed.is_empty() {
        let mean = observed.values().sum::<f64>() / observed.len() as f64;
        return Imputation {
            value: clamp_score(mean),
            method: ImputationMethod::ObservedMean,
        };
    }

    Imputation {
        value: NEUTRAL_SCORE,
        method: ImputationMethod::Neutral,
    }
}
