//! The scoring pass: snapshot → totals → ranked standings, per-discipline
//! leaderboards and completion. Pure and idempotent; recomputed from scratch
//! on every call.

use std::collections::BTreeMap;

use ms_algo::{competition_status, competition_totals, discipline_leaderboard, rank, CompletionSummary, LeaderboardEntry};
use ms_core::{Competition, Competitor, CompetitorId, DisciplineCatalogue, DisciplineRef, Points};
use ms_io::{hasher, snapshot};

use crate::PipelineError;

#[derive(Clone, Debug, PartialEq)]
pub struct StandingRow {
    pub position: usize,
    pub competitor_id: CompetitorId,
    /// Display name from the user directory; the id when unknown.
    pub name: String,
    pub total: Points,
    pub rounded_total: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisciplineBoard {
    pub discipline: DisciplineRef,
    pub label: String,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StandingsPass {
    pub standings: Vec<StandingRow>,
    pub leaderboards: Vec<DisciplineBoard>,
    pub completion: CompletionSummary,
    /// Canonical-JSON SHA-256 of the snapshot the pass was computed from.
    pub snapshot_sha256: String,
}

impl StandingsPass {
    pub fn board(&self, discipline: &DisciplineRef) -> Option<&DisciplineBoard> {
        self.leaderboards.iter().find(|b| &b.discipline == discipline)
    }
}

/// The competition's disciplines in catalogue order; refs unknown to the
/// catalogue keep their relative order at the end.
pub fn ordered_disciplines(competition: &Competition, catalogue: &DisciplineCatalogue) -> Vec<DisciplineRef> {
    let mut refs = competition.disciplines.clone();
    refs.sort_by_key(|r| catalogue.order_of(r));
    refs
}

pub fn display_names(users: &[Competitor]) -> BTreeMap<&CompetitorId, String> {
    users.iter().map(|u| (&u.id, u.display_name())).collect()
}

pub fn compute_standings(
    competition: &Competition,
    users: &[Competitor],
    catalogue: &DisciplineCatalogue,
) -> Result<StandingsPass, PipelineError> {
    let names = display_names(users);
    let name_of = |id: &CompetitorId| names.get(id).cloned().unwrap_or_else(|| id.to_string());

    let standings = rank(competition_totals(competition, catalogue))
        .into_iter()
        .map(|s| StandingRow {
            position: s.position,
            name: name_of(&s.competitor_id),
            competitor_id: s.competitor_id,
            total: s.total,
            rounded_total: s.rounded_total,
        })
        .collect();

    let leaderboards = ordered_disciplines(competition, catalogue)
        .into_iter()
        .map(|d| {
            let label = catalogue.get(&d).map(|x| x.label.clone()).unwrap_or_else(|| d.to_string());
            let entries = discipline_leaderboard(competition, &d, catalogue);
            DisciplineBoard { discipline: d, label, entries }
        })
        .collect();

    let snapshot_sha256 = hasher::sha256_canonical(&snapshot::competition_to_wire(competition))?;
    let pass = StandingsPass {
        standings,
        leaderboards,
        completion: competition_status(competition, catalogue),
        snapshot_sha256,
    };
    tracing::debug!(
        competitors = pass.standings.len(),
        complete = pass.completion.complete,
        digest = hasher::short(&pass.snapshot_sha256),
        "standings computed"
    );
    Ok(pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_algo::DisciplineStatus;
    use ms_core::AttemptResult;

    fn uid(s: &str) -> CompetitorId { s.parse().unwrap() }
    fn dref(s: &str) -> DisciplineRef { s.parse().unwrap() }

    fn user(id: &str, first: &str, last: &str) -> Competitor {
        Competitor { id: uid(id), first_name: first.into(), last_name: last.into(), country: None, verified: true }
    }

    fn competition() -> Competition {
        Competition {
            disciplines: vec![dref("K1"), dref("5N1"), dref("5N2")],
            participants: vec![uid("a"), uid("b")],
            results: vec![
                AttemptResult::new(uid("a"), dref("5N1"), 547.0),
                AttemptResult::new(uid("a"), dref("5N2"), 273.5),
                AttemptResult::new(uid("b"), dref("K1"), 100.0),
            ],
            ..Competition::default()
        }
    }

    #[test]
    fn ranks_with_names_and_board_order() {
        let cat = DisciplineCatalogue::builtin();
        let pass = compute_standings(&competition(), &[user("a", "Ada", "King")], &cat).unwrap();

        // a: best of 5N1/5N2 = 1000.00; b: sqrt(100) * 47.7 = 477.00
        let rows: Vec<_> = pass.standings.iter().map(|r| (r.position, r.name.as_str(), r.rounded_total)).collect();
        assert_eq!(rows, vec![(1, "Ada King", 1000), (2, "b", 477)]);

        let order: Vec<_> = pass.leaderboards.iter().map(|b| b.discipline.as_str()).collect();
        assert_eq!(order, vec!["5N1", "5N2", "K1"]);
        assert_eq!(pass.board(&dref("K1")).unwrap().entries[0].points, Points::from_hundredths(47_700));
    }

    #[test]
    fn completion_and_digest() {
        let cat = DisciplineCatalogue::builtin();
        let pass = compute_standings(&competition(), &[], &cat).unwrap();
        assert!(!pass.completion.complete);
        assert!(pass.completion.per_discipline.iter().all(|(_, s)| *s == DisciplineStatus::Pending));
        assert_eq!(pass.snapshot_sha256.len(), 64);
    }

    #[test]
    fn pass_is_idempotent() {
        let cat = DisciplineCatalogue::builtin();
        let c = competition();
        assert_eq!(compute_standings(&c, &[], &cat).unwrap(), compute_standings(&c, &[], &cat).unwrap());
    }
}
