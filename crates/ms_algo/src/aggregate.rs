//! Best-attempt aggregation: one competitor's results → point total.
//!
//! Disciplines with a best-attempt `group` (`5N1`/`5N2`, `SC1`/`SC2`,
//! `K1`..`K3`) contribute only their best attempt; every other discipline is
//! summed directly. Best = highest raw score; on equal raw score a
//! time-based attempt with the lower time wins, otherwise the first one seen.
//!
//! The total is not ceiled here; callers choose between the 2-decimal total
//! and `Points::ceil()`.

use std::collections::BTreeMap;

use ms_core::{AttemptResult, Competition, CompetitorTotal, DisciplineCatalogue, Points};

use crate::calculator::result_points;

/// The attempts that count toward a total.
#[derive(Clone, Debug, Default)]
pub struct CountedAttempts<'a> {
    /// Results of ungrouped disciplines, in input order.
    pub singular: Vec<&'a AttemptResult>,
    /// Best attempt per group key.
    pub best_by_group: BTreeMap<String, &'a AttemptResult>,
}

impl<'a> CountedAttempts<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a AttemptResult> + '_ {
        self.singular.iter().copied().chain(self.best_by_group.values().copied())
    }

    /// True if `result` is one of the counted attempts (same key).
    pub fn counts(&self, result: &AttemptResult) -> bool {
        self.iter().any(|r| r.same_key(result))
    }

    pub fn total(&self, catalogue: &DisciplineCatalogue) -> Points {
        self.iter().map(|r| result_points(catalogue, r)).sum()
    }
}

/// Partition `results` into singular results and the best attempt per group.
pub fn select_counted<'a, I>(results: I, catalogue: &DisciplineCatalogue) -> CountedAttempts<'a>
where
    I: IntoIterator<Item = &'a AttemptResult>,
{
    let mut counted = CountedAttempts::default();
    for r in results {
        let discipline = catalogue.get(&r.discipline_ref);
        let Some(group) = discipline.and_then(|d| d.group.as_ref()) else {
            counted.singular.push(r);
            continue;
        };
        let timed = discipline.map(|d| d.family.is_timed()).unwrap_or(false);
        let replace = match counted.best_by_group.get(group) {
            Some(current) => is_better(r, current, timed),
            None => true,
        };
        if replace {
            counted.best_by_group.insert(group.clone(), r);
        }
    }
    counted
}

/// Sum of champion points over the counted attempts of `results`.
pub fn aggregate<'a, I>(results: I, catalogue: &DisciplineCatalogue) -> Points
where
    I: IntoIterator<Item = &'a AttemptResult>,
{
    select_counted(results, catalogue).total(catalogue)
}

/// One total per registered participant (in participant order), over in-scope results only.
/// Participants without results total zero.
pub fn competition_totals(competition: &Competition, catalogue: &DisciplineCatalogue) -> Vec<CompetitorTotal> {
    competition
        .participants
        .iter()
        .map(|id| CompetitorTotal::new(id.clone(), aggregate(competition.results_of(id), catalogue)))
        .collect()
}

fn is_better(candidate: &AttemptResult, current: &AttemptResult, timed: bool) -> bool {
    if candidate.raw_score > current.raw_score {
        return true;
    }
    if candidate.raw_score == current.raw_score && timed {
        return match (candidate.time, current.time) {
            (Some(a), Some(b)) => a < b,
            (Some(_), None) => true,
            _ => false,
        };
    }
    false
}
