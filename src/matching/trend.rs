// src/matching/trend.rs
use crate::models::matching::MatchResult;

/// Signed rank delta: positive when the entity moved up (its rank number
/// decreased). New entries are always 0, never "up" or "down".
pub fn trend(today_rank: u32, match_result: &MatchResult) -> i32 {
    match match_result.yesterday_rank {
        Some(yesterday_rank) if match_result.is_match() => {
            // Ranks are small positive integers; widen before subtracting.
            (i64::from(yesterday_rank) - i64::from(today_rank))
                .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_convention() {
        assert_eq!(trend(2, &MatchResult::exact(5)), 3);
        assert_eq!(trend(5, &MatchResult::exact(2)), -3);
        assert_eq!(trend(4, &MatchResult::secondary(4, 0.9)), 0);
    }

    #[test]
    fn test_new_entry_has_zero_trend() {
        assert_eq!(trend(1, &MatchResult::new_entry()), 0);
        assert_eq!(trend(50, &MatchResult::new_entry()), 0);
    }
}
