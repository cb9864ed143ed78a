//! Ranking: competitor totals and per-discipline leaderboards.
//!
//! Positions are *positional*: `position = index + 1` after a stable
//! descending sort. Equal totals get distinct, sequential positions in input
//! order (leaderboard convention, not standard competition ranking).

use ms_core::{AttemptResult, Competition, CompetitorId, CompetitorTotal, DisciplineCatalogue, DisciplineRef, Points};

use crate::calculator::result_points;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Standing {
    /// 1-based display position.
    pub position: usize,
    pub competitor_id: CompetitorId,
    pub total: Points,
    pub rounded_total: i64,
}

impl Standing {
    pub fn to_total(&self) -> CompetitorTotal {
        CompetitorTotal {
            competitor_id: self.competitor_id.clone(),
            total: self.total,
            rounded_total: self.rounded_total,
        }
    }
}

/// Stable sort by unrounded total (descending), then assign positions.
pub fn rank(mut totals: Vec<CompetitorTotal>) -> Vec<Standing> {
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals
        .into_iter()
        .enumerate()
        .map(|(i, t)| Standing {
            position: i + 1,
            competitor_id: t.competitor_id,
            total: t.total,
            rounded_total: t.rounded_total,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub competitor_id: CompetitorId,
    pub raw_score: f64,
    pub time: Option<f64>,
    pub points: Points,
    pub provisional: bool,
}

/// Results of one discipline, stable-sorted by raw score descending.
pub fn discipline_leaderboard(
    competition: &Competition,
    discipline: &DisciplineRef,
    catalogue: &DisciplineCatalogue,
) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<&AttemptResult> = competition
        .in_scope_results()
        .filter(|r| &r.discipline_ref == discipline)
        .collect();
    rows.sort_by(|a, b| b.raw_score.total_cmp(&a.raw_score));
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| LeaderboardEntry {
            position: i + 1,
            competitor_id: r.competitor_id.clone(),
            raw_score: r.raw_score,
            time: r.time,
            points: result_points(catalogue, r),
            provisional: r.provisional,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cid(s: &str) -> CompetitorId { s.parse().unwrap() }
    fn dref(s: &str) -> DisciplineRef { s.parse().unwrap() }
    fn total(id: &str, h: i64) -> CompetitorTotal { CompetitorTotal::new(cid(id), Points::from_hundredths(h)) }

    #[test]
    fn sorts_descending_with_positional_ranks() {
        let ranked = rank(vec![total("a", 100), total("b", 300), total("c", 200)]);
        let order: Vec<_> = ranked.iter().map(|s| (s.position, s.competitor_id.as_str())).collect();
        assert_eq!(order, vec![(1, "b"), (2, "c"), (3, "a")]);
    }

    #[test]
    fn ties_keep_input_order_and_distinct_positions() {
        let ranked = rank(vec![total("x", 500), total("y", 500), total("z", 900)]);
        let order: Vec<_> = ranked.iter().map(|s| (s.position, s.competitor_id.as_str())).collect();
        assert_eq!(order, vec![(1, "z"), (2, "x"), (3, "y")]);
    }

    #[test]
    fn sort_key_is_unrounded_total() {
        // Both ceil to 11, but 10.50 > 10.01.
        let ranked = rank(vec![total("a", 1001), total("b", 1050)]);
        assert_eq!(ranked[0].competitor_id.as_str(), "b");
        assert_eq!(ranked[0].rounded_total, ranked[1].rounded_total);
    }

    #[test]
    fn leaderboard_filters_and_sorts_by_raw_score() {
        let comp = Competition {
            disciplines: vec![dref("5N1"), dref("5I")],
            participants: vec![cid("a"), cid("b"), cid("c")],
            results: vec![
                AttemptResult::new(cid("a"), dref("5N1"), 120.0),
                AttemptResult::new(cid("b"), dref("5N1"), 300.0),
                AttemptResult::new(cid("c"), dref("5I"), 999.0),
                AttemptResult::new(cid("c"), dref("5N1"), 120.0),
            ],
            ..Competition::default()
        };
        let board = discipline_leaderboard(&comp, &dref("5N1"), &DisciplineCatalogue::builtin());
        let order: Vec<_> = board.iter().map(|e| (e.position, e.competitor_id.as_str())).collect();
        assert_eq!(order, vec![(1, "b"), (2, "a"), (3, "c")]);
        assert_eq!(board[0].points, Points::from_f64_rounded(300.0 / 547.0 * 1000.0));
    }

    #[test]
    fn leaderboard_order_is_total_even_with_nan() {
        let comp = Competition {
            disciplines: vec![dref("5N1")],
            participants: vec![cid("a"), cid("b"), cid("c")],
            results: vec![
                AttemptResult::new(cid("a"), dref("5N1"), 10.0),
                AttemptResult::new(cid("b"), dref("5N1"), f64::NAN),
                AttemptResult::new(cid("c"), dref("5N1"), 30.0),
            ],
            ..Competition::default()
        };
        let board = discipline_leaderboard(&comp, &dref("5N1"), &DisciplineCatalogue::builtin());
        let finite: Vec<_> = board.iter().filter(|e| !e.raw_score.is_nan()).map(|e| e.competitor_id.as_str()).collect();
        assert_eq!(finite, vec!["c", "a"]);
    }

    proptest! {
        #[test]
        fn ranking_is_stable(values in proptest::collection::vec(0i64..20, 0..30)) {
            let totals: Vec<_> = values
                .iter()
                .enumerate()
                .map(|(i, &v)| total(&format!("c{i}"), v * 100))
                .collect();
            let once = rank(totals);
            let twice = rank(once.iter().map(Standing::to_total).collect());
            prop_assert_eq!(once, twice);
        }
    }
}
