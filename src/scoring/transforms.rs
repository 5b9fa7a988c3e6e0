// src/scoring/transforms.rs
use serde::{Deserialize, Serialize};

use crate::errors::ScoringError;
use crate::models::core::RawSubScore;
use crate::utils::constants::{
    HARD_TO_BOOK_THRESHOLD, QUEUEING_THRESHOLD, SCORE_MAX, SCORE_MIN,
};

/// How a raw signal becomes a 0..100 component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SignalTransform {
    /// 1-based rank out of `max_rank`; rank 1 is best.
    #[serde(rename_all = "camelCase")]
    Rank { max_rank: u32 },
    /// Star rating weighted by log review volume.
    #[serde(rename_all = "camelCase")]
    RatingVolume {
        max_rating: f64,
        cap: f64,
        volume_multiplier: f64,
        scale: f64,
    },
    /// Count against a saturation ceiling, e.g. bookmark saves.
    Ratio { ceiling: f64 },
    /// Linear rescale of a bounded value, e.g. a 5-star rating.
    Scaled { max: f64 },
    /// Already on 0..100.
    Direct,
}

impl SignalTransform {
    /// Checks the transform's own parameters; the message names the bad one.
    pub fn validate(&self) -> Result<(), String> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(format!("{} must be positive, got {}", name, v))
            }
        };
        match self {
            SignalTransform::Rank { max_rank } => {
                if *max_rank == 0 {
                    Err("max_rank must be positive".to_string())
                } else {
                    Ok(())
                }
            }
            SignalTransform::RatingVolume {
                max_rating,
                cap,
                volume_multiplier,
                scale,
            } => {
                positive("max_rating", *max_rating)?;
                positive("cap", *cap)?;
                positive("volume_multiplier", *volume_multiplier)?;
                positive("scale", *scale)
            }
            SignalTransform::Ratio { ceiling } => positive("ceiling", *ceiling),
            SignalTransform::Scaled { max } => positive("max", *max),
            SignalTransform::Direct => Ok(()),
        }
    }

    /// Component value for one raw signal, `None` when the signal is missing.
    pub fn apply(&self, raw: &RawSubScore) -> Result<Option<f64>, ScoringError> {
        let source = raw.source.as_str();
        let component = match self {
            SignalTransform::Rank { max_rank } => match raw.rank {
                Some(rank) => Some(rank_to_score(source, rank, *max_rank)?),
                None => None,
            },
            SignalTransform::RatingVolume {
                max_rating,
                cap,
                volume_multiplier,
                scale,
            } => match (raw.value, raw.volume) {
                (Some(rating), Some(count)) => Some(rating_volume_score(
                    source,
                    rating,
                    count,
                    *max_rating,
                    *cap,
                    *volume_multiplier,
                    *scale,
                )?),
                _ => None,
            },
            SignalTransform::Ratio { ceiling } => match raw.value {
                Some(value) => Some(ratio_score(source, value, *ceiling)?),
                None => None,
            },
            SignalTransform::Scaled { max } => match raw.value {
                Some(value) => Some(clamp_score(finite(source, value)? / max * SCORE_MAX)),
                None => None,
            },
            SignalTransform::Direct => match raw.value {
                Some(value) => Some(clamp_score(finite(source, value)?)),
                None => None,
            },
        };
        Ok(component)
    }
}

/// `(max_rank + 1 - rank)` mapped onto 0..100; `max_rank = 100` is `101 - rank`.
pub fn rank_to_score(source: &str, rank: u32, max_rank: u32) -> Result<f64, ScoringError> {
    if rank == 0 {
        return Err(ScoringError::InvalidRank {
            source_name: source.to_string(),
        });
    }
    let points = (f64::from(max_rank) + 1.0 - f64::from(rank)).max(0.0);
    Ok(clamp_score(points / f64::from(max_rank) * SCORE_MAX))
}

/// `(rating / max_rating) * min(cap, log10(count + 1) * volume_multiplier) * scale`.
pub fn rating_volume_score(
    source: &str,
    rating: f64,
    count: u64,
    max_rating: f64,
    cap: f64,
    volume_multiplier: f64,
    scale: f64,
) -> Result<f64, ScoringError> {
    let rating = finite(source, rating)?;
    if rating < 0.0 || rating > max_rating {
        return Err(ScoringError::InvalidRating {
            source_name: source.to_string(),
            rating,
            max_rating,
        });
    }
    if rating == 0.0 || count == 0 {
        return Ok(0.0);
    }
    let volume_factor = (((count as f64) + 1.0).log10() * volume_multiplier).min(cap);
    Ok(clamp_score(rating / max_rating * volume_factor * scale))
}

pub fn ratio_score(source: &str, value: f64, ceiling: f64) -> Result<f64, ScoringError> {
    let value = finite(source, value)?;
    Ok(clamp_score((value / ceiling).min(1.0) * SCORE_MAX))
}

/// Demand band shown next to restaurant and place scores.
pub fn demand_status(score: f64) -> &'static str {
    if score >= HARD_TO_BOOK_THRESHOLD {
        "Hard to Book"
    } else if score >= QUEUEING_THRESHOLD {
        "Queueing"
    } else {
        "Available"
    }
}

pub fn clamp_score(value: f64) -> f64 {
    value.clamp(SCORE_MIN, SCORE_MAX)
}

fn finite(source: &str, value: f64) -> Result<f64, ScoringError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScoringError::NonFiniteSignal {
            source_name: source.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_inversion() {
        assert_eq!(rank_to_score("s", 1, 100).unwrap(), 100.0);
        assert!((rank_to_score("s", 100, 100).unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(rank_to_score("s", 150, 100).unwrap(), 0.0);
        assert_eq!(rank_to_score("s", 1, 20).unwrap(), 100.0);
        assert_eq!(rank_to_score("s", 11, 20).unwrap(), 50.0);
        assert!(matches!(
            rank_to_score("s", 0, 100),
            Err(ScoringError::InvalidRank { .. })
        ));
    }

    #[test]
    fn test_rating_volume_matches_hype_formula() {
        // 4.5 stars, 999 reviews: log10(1000) * 2 = 6, under the cap of 10.
        let score = rating_volume_score("google", 4.5, 999, 5.0, 10.0, 2.0, 10.0).unwrap();
        assert!((score - 54.0).abs() < 1e-9);

        // Volume saturates at the cap.
        let capped = rating_volume_score("google", 5.0, 10_000_000, 5.0, 10.0, 2.0, 10.0).unwrap();
        assert_eq!(capped, 100.0);

        assert_eq!(rating_volume_score("google", 0.0, 500, 5.0, 10.0, 2.0, 10.0).unwrap(), 0.0);
        assert_eq!(rating_volume_score("google", 4.0, 0, 5.0, 10.0, 2.0, 10.0).unwrap(), 0.0);
        assert!(rating_volume_score("google", 7.0, 10, 5.0, 10.0, 2.0, 10.0).is_err());
    }

    #[test]
    fn test_rating_volume_without_multiplier() {
        // (rating / max) * min(cap, log10(count + 1)) * scale
        let formula = |rating: f64, count: u64| {
            (rating / 5.0) * ((count as f64 + 1.0).log10()).min(2.0) * 50.0
        };
        for (rating, count) in [(4.0, 9), (4.0, 99), (3.5, 41), (4.0, 9999)] {
            let score = rating_volume_score("google", rating, count, 5.0, 2.0, 1.0, 50.0).unwrap();
            assert!((score - formula(rating, count)).abs() < 1e-9, "{} / {}", rating, count);
        }
        let ten = rating_volume_score("google", 4.0, 9, 5.0, 2.0, 1.0, 50.0).unwrap();
        assert!((ten - 40.0).abs() < 1e-9);
        let saturated = rating_volume_score("google", 4.0, 9999, 5.0, 2.0, 1.0, 50.0).unwrap();
        assert!((saturated - 80.0).abs() < 1e-9);

        let transform = SignalTransform::RatingVolume {
            max_rating: 5.0,
            cap: 2.0,
            volume_multiplier: 1.0,
            scale: 50.0,
        };
        let applied = transform
            .apply(&RawSubScore::rating("google", 4.0, 99))
            .unwrap()
            .unwrap();
        assert!((applied - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_handles_missing_and_non_finite() {
        let ratio = SignalTransform::Ratio { ceiling: 15000.0 };
        assert_eq!(
            ratio.apply(&RawSubScore::from_value("saves", 7500.0)).unwrap(),
            Some(50.0)
        );
        assert_eq!(
            ratio.apply(&RawSubScore::from_value("saves", 90000.0)).unwrap(),
            Some(100.0)
        );
        assert_eq!(ratio.apply(&RawSubScore::missing("saves")).unwrap(), None);
        assert!(ratio
            .apply(&RawSubScore::from_value("saves", f64::NAN))
            .is_err());

        let scaled = SignalTransform::Scaled { max: 5.0 };
        let value = scaled
            .apply(&RawSubScore::from_value("rating", 4.6))
            .unwrap()
            .unwrap();
        assert!((value - 92.0).abs() < 1e-9);

        let rank = SignalTransform::Rank { max_rank: 100 };
        assert_eq!(rank.apply(&RawSubScore::from_value("r", 3.0)).unwrap(), None);

        // Rating without a volume cannot be evaluated.
        let rv = SignalTransform::RatingVolume {
            max_rating: 5.0,
            cap: 10.0,
            volume_multiplier: 2.0,
            scale: 10.0,
        };
        assert_eq!(rv.apply(&RawSubScore::from_value("g", 4.0)).unwrap(), None);
        assert_eq!(
            SignalTransform::Direct
                .apply(&RawSubScore::from_value("d", 130.0))
                .unwrap(),
            Some(100.0)
        );
    }

    #[test]
    fn test_demand_status_bands() {
        assert_eq!(demand_status(97.2), "Hard to Book");
        assert_eq!(demand_status(95.0), "Hard to Book");
        assert_eq!(demand_status(85.0), "Queueing");
        assert_eq!(demand_status(84.9), "Available");
    }

    #[test]
    fn test_transform_deserializes_from_tagged_json() {
        let t: SignalTransform = serde_json::from_str(
            r#"{"kind":"ratingVolume","maxRating":5.0,"cap":10.0,"volumeMultiplier":2.0,"scale":10.0}"#,
        )
        .unwrap();
        assert!(matches!(t, SignalTransform::RatingVolume { .. }));
        let r: SignalTransform = serde_json::from_str(r#"{"kind":"rank","maxRank":100}"#).unwrap();
        assert_eq!(r, SignalTransform::Rank { max_rank: 100 });
    }
}
