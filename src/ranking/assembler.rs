// src/ranking/assembler.rs
use log::debug;

use crate::errors::RankingError;
use crate::matching::trend::trend;
use crate::models::core::{RankedEntity, ScoredEntity};
use crate::models::matching::MatchResult;

/// Sorts by composite score (descending, ties keep input order), assigns
/// dense ranks from 1 and truncates to `max_items`.
pub fn assemble(
    mut scored: Vec<ScoredEntity>,
    max_items: Option<usize>,
) -> Result<Vec<RankedEntity>, RankingError> {
    // `sort_by` is stable, which is what keeps ties in collection order.
    scored.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));

    if let Some(limit) = max_items {
        if scored.len() > limit {
            debug!("Truncating leaderboard from {} to {} items", scored.len(), limit);
            scored.truncate(limit);
        }
    }

    let mut ranked = Vec::with_capacity(scored.len());
    for (index, entity) in scored.into_iter().enumerate() {
        let rank = u32::try_from(index + 1).map_err(|_| {
            RankingError::RankInvariantViolation(format!("rank {} does not fit in u32", index + 1))
        })?;
        ranked.push(RankedEntity::from_scored(entity, rank));
    }

    validate_dense_ranks(&ranked)?;
    Ok(ranked)
}

/// Fills `trend` from each entity's published rank and its match against
/// the previous snapshot.
pub fn annotate_trends(items: &mut [RankedEntity]) {
    for item in items.iter_mut() {
        let matched = MatchResult {
            yesterday_rank: item.previous_rank,
            kind: item.match_kind,
            similarity: None,
        };
        item.trend = trend(item.rank, &matched);
    }
}

/// Ranks must be exactly 1..=N in order, with non-increasing finite scores
/// inside [0, 100].
pub fn validate_dense_ranks(items: &[RankedEntity]) -> Result<(), RankingError> {
    let mut previous_score = f64::INFINITY;
    for (index, item) in items.iter().enumerate() {
        let expected = index as u64 + 1;
        if u64::from(item.rank) != expected {
            return Err(RankingError::RankInvariantViolation(format!(
                "position {} carries rank {}, expected {}",
                index, item.rank, expected
            )));
        }
        let score = item.composite_score;
        if !score.is_finite() || !(0.0..=100.0).contains(&score) {
            return Err(RankingError::RankInvariantViolation(format!(
                "rank {} has out-of-range score {}",
                item.rank, score
            )));
        }
        if score > previous_score {
            return Err(RankingError::RankInvariantViolation(format!(
                "rank {} scores {} above rank {} ({})",
                item.rank,
                score,
                item.rank - 1,
                previous_score
            )));
        }
        previous_score = score;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::CandidateRecord;
    use crate::models::matching::MatchKind;
    use std::collections::BTreeMap;

    fn scored(name: &str, score: f64) -> ScoredEntity {
        ScoredEntity {
            record: CandidateRecord::new(name, None),
            identity_key: name.to_lowercase(),
            previous_rank: None,
            match_kind: MatchKind::None,
            composite_score: score,
            score_components: BTreeMap::new(),
            imputed_sources: Vec::new(),
            status: None,
            cache_hit: false,
            narrative: None,
            resolved_link: None,
            tags: Vec::new(),
        }
    }

    fn names(items: &[RankedEntity]) -> Vec<&str> {
        items.iter().map(|i| i.record.display_name.as_str()).collect()
    }

    #[test]
    fn test_sorts_descending_with_stable_ties() {
        let ranked = assemble(
            vec![
                scored("a", 70.0),
                scored("b", 90.0),
                scored("c", 70.0),
                scored("d", 95.5),
            ],
            None,
        )
        .unwrap();
        assert_eq!(names(&ranked), vec!["d", "b", "a", "c"]);
        assert_eq!(ranked.iter().map(|i| i.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_truncates_to_max_items() {
        let ranked = assemble(
            vec![scored("a", 10.0), scored("b", 20.0), scored("c", 30.0)],
            Some(2),
        )
        .unwrap();
        assert_eq!(names(&ranked), vec!["c", "b"]);
        assert!(assemble(Vec::new(), Some(5)).unwrap().is_empty());
    }

    #[test]
    fn test_validation_rejects_gaps_and_disorder() {
        let mut ranked = assemble(vec![scored("a", 80.0), scored("b", 60.0)], None).unwrap();
        assert!(validate_dense_ranks(&ranked).is_ok());

        ranked[1].rank = 3;
        assert!(matches!(
            validate_dense_ranks(&ranked),
            Err(RankingError::RankInvariantViolation(_))
        ));

        ranked[1].rank = 2;
        ranked[1].composite_score = 85.0;
        assert!(validate_dense_ranks(&ranked).is_err());

        ranked[1].composite_score = f64::NAN;
        assert!(validate_dense_ranks(&ranked).is_err());
    }

    #[test]
    fn test_annotate_trends_uses_published_rank() {
        let mut climber = scored("climber", 90.0);
        climber.previous_rank = Some(5);
        climber.match_kind = MatchKind::Exact;
        let mut faller = scored("faller", 50.0);
        faller.previous_rank = Some(1);
        faller.match_kind = MatchKind::Secondary;
        let newcomer = scored("new", 70.0);

        let mut ranked = assemble(vec![faller, newcomer, climber], None).unwrap();
        annotate_trends(&mut ranked);
        let trends: Vec<(&str, i32)> = ranked
            .iter()
            .map(|i| (i.record.display_name.as_str(), i.trend))
            .collect();
        assert_eq!(trends, vec![("climber", 4), ("new", 0), ("faller", -2)]);
    }
}
