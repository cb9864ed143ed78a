//! Discipline completion state.
//!
//! State is a pure function of the current result set; nothing is stored.
//! - `Pending`: fewer results than registered participants.
//! - `Complete`: one result per participant and, for word-memory disciplines,
//!   none of them provisional.
//! - `ProvisionalComplete`: full participation but a word-memory result still
//!   awaits review. Counts as incomplete for the competition rollup.

use std::collections::BTreeSet;

use ms_core::{Competition, CompetitorId, DisciplineCatalogue, DisciplineRef};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DisciplineStatus {
    Pending,
    Complete,
    ProvisionalComplete,
}

impl DisciplineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DisciplineStatus::Pending => "pending",
            DisciplineStatus::Complete => "complete",
            DisciplineStatus::ProvisionalComplete => "provisional_complete",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionSummary {
    /// In the competition's discipline order.
    pub per_discipline: Vec<(DisciplineRef, DisciplineStatus)>,
    /// Every discipline `Complete` (and at least one discipline).
    pub complete: bool,
}

pub fn discipline_status(
    competition: &Competition,
    discipline: &DisciplineRef,
    catalogue: &DisciplineCatalogue,
) -> DisciplineStatus {
    if competition.participants.is_empty() {
        return DisciplineStatus::Pending;
    }

    let mut submitted: BTreeSet<&CompetitorId> = BTreeSet::new();
    let mut any_provisional = false;
    for r in competition.in_scope_results() {
        if &r.discipline_ref != discipline || !competition.is_participant(&r.competitor_id) {
            continue;
        }
        submitted.insert(&r.competitor_id);
        any_provisional |= r.provisional;
    }

    if submitted.len() < competition.participants.len() {
        return DisciplineStatus::Pending;
    }

    let needs_review = catalogue
        .get(discipline)
        .map(|d| d.family.needs_review())
        .unwrap_or(false);
    if needs_review && any_provisional {
        DisciplineStatus::ProvisionalComplete
    } else {
        DisciplineStatus::Complete
    }
}

pub fn competition_status(competition: &Competition, catalogue: &DisciplineCatalogue) -> CompletionSummary {
    let per_discipline: Vec<_> = competition
        .disciplines
        .iter()
        .map(|d| (d.clone(), discipline_status(competition, d, catalogue)))
        .collect();
    let complete = !per_discipline.is_empty()
        && per_discipline.iter().all(|(_, s)| *s == DisciplineStatus::Complete);
    CompletionSummary { per_discipline, complete }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_core::AttemptResult;

    fn cid(s: &str) -> CompetitorId { s.parse().unwrap() }
    fn dref(s: &str) -> DisciplineRef { s.parse().unwrap() }

    fn comp(results: Vec<AttemptResult>) -> Competition {
        Competition {
            disciplines: vec![dref("5N1"), dref("15W")],
            participants: vec![cid("a"), cid("b")],
            results,
            ..Competition::default()
        }
    }

    #[test]
    fn pending_until_everyone_submits() {
        let cat = DisciplineCatalogue::builtin();
        let c = comp(vec![AttemptResult::new(cid("a"), dref("5N1"), 10.0)]);
        assert_eq!(discipline_status(&c, &dref("5N1"), &cat), DisciplineStatus::Pending);
    }

    #[test]
    fn non_participant_results_do_not_count() {
        let cat = DisciplineCatalogue::builtin();
        let c = comp(vec![
            AttemptResult::new(cid("a"), dref("5N1"), 10.0),
            AttemptResult::new(cid("zz"), dref("5N1"), 10.0),
        ]);
        assert_eq!(discipline_status(&c, &dref("5N1"), &cat), DisciplineStatus::Pending);
    }

    #[test]
    fn provisional_word_results_block_completion() {
        let cat = DisciplineCatalogue::builtin();
        let mut c = comp(vec![
            AttemptResult::new(cid("a"), dref("5N1"), 10.0),
            AttemptResult::new(cid("b"), dref("5N1"), 10.0),
            AttemptResult::new(cid("a"), dref("15W"), 40.0).provisional(true),
            AttemptResult::new(cid("b"), dref("15W"), 35.0),
        ]);
        let summary = competition_status(&c, &cat);
        assert_eq!(summary.per_discipline[0].1, DisciplineStatus::Complete);
        assert_eq!(summary.per_discipline[1].1, DisciplineStatus::ProvisionalComplete);
        assert!(!summary.complete);

        c.results[2].provisional = false;
        assert!(competition_status(&c, &cat).complete);
    }

    #[test]
    fn provisional_flag_is_ignored_outside_word_memory() {
        let cat = DisciplineCatalogue::builtin();
        let c = comp(vec![
            AttemptResult::new(cid("a"), dref("5N1"), 10.0).provisional(true),
            AttemptResult::new(cid("b"), dref("5N1"), 10.0),
        ]);
        assert_eq!(discipline_status(&c, &dref("5N1"), &cat), DisciplineStatus::Complete);
    }

    #[test]
    fn empty_competition_is_not_complete() {
        let cat = DisciplineCatalogue::builtin();
        let c = Competition::default();
        assert!(!competition_status(&c, &cat).complete);
        let c = Competition { disciplines: vec![dref("5N1")], ..Competition::default() };
        assert_eq!(discipline_status(&c, &dref("5N1"), &cat), DisciplineStatus::Pending);
    }
}
