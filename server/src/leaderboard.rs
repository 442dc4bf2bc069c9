//! Leaderboard ranking

use shared::LeaderboardEntry;
use std::cmp::Reverse;

/// Ranks `(name, score)` pairs by score, descending.
///
/// The sort is stable, so ties keep the order `entries` was supplied in.
/// With [`PlayerRegistry::snapshot_all`] as the source that is registration
/// order, which makes the tie-break deterministic.
///
/// [`PlayerRegistry::snapshot_all`]: crate::registry::PlayerRegistry::snapshot_all
pub fn rank(entries: Vec<(String, i64)>) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<LeaderboardEntry> = entries
        .into_iter()
        .map(|(name, score)| LeaderboardEntry { name, score })
        .collect();
    ranked.sort_by_key(|entry| Reverse(entry.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn test_rank_sorts_descending_with_stable_ties() {
        let ranked = rank(vec![
            ("A".to_string(), 10),
            ("B".to_string(), 30),
            ("C".to_string(), 10),
        ]);

        assert_eq!(names(&ranked), vec!["B", "A", "C"]);
        assert_eq!(ranked[0].score, 30);
        assert_eq!(ranked[1].score, 10);
        assert_eq!(ranked[2].score, 10);
    }

    #[test]
    fn test_rank_empty_input() {
        assert!(rank(vec![]).is_empty());
    }

    #[test]
    fn test_rank_handles_negative_scores() {
        let ranked = rank(vec![
            ("Down".to_string(), -5),
            ("Zero".to_string(), 0),
            ("Up".to_string(), 5),
        ]);
        assert_eq!(names(&ranked), vec!["Up", "Zero", "Down"]);
    }
}
