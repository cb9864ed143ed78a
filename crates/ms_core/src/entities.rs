//! Competition records: results, competitors, competitions, and derived totals.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{CompetitionId, CompetitorId, DisciplineRef};
use crate::points::Points;

/// One scored attempt. At most one per `(competitor_id, discipline_ref)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttemptResult {
    pub competitor_id: CompetitorId,
    pub discipline_ref: DisciplineRef,
    pub raw_score: f64,
    /// Seconds; meaningful only for time-based disciplines.
    pub time: Option<f64>,
    /// Word-memory results awaiting manual review.
    pub provisional: bool,
    pub additional_info: Option<String>,
}

impl AttemptResult {
    pub fn new(competitor_id: CompetitorId, discipline_ref: DisciplineRef, raw_score: f64) -> Self {
        AttemptResult {
            competitor_id,
            discipline_ref,
            raw_score,
            time: None,
            provisional: false,
            additional_info: None,
        }
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    pub fn provisional(mut self, provisional: bool) -> Self {
        self.provisional = provisional;
        self
    }

    /// Same `(competitor, discipline)` key.
    pub fn same_key(&self, other: &AttemptResult) -> bool {
        self.competitor_id == other.competitor_id && self.discipline_ref == other.discipline_ref
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Competitor {
    pub id: CompetitorId,
    pub first_name: String,
    pub last_name: String,
    /// `None` = unknown (sparse legacy records).
    pub country: Option<String>,
    pub verified: bool,
}

impl Competitor {
    pub fn display_name(&self) -> String {
        match (self.first_name.trim(), self.last_name.trim()) {
            ("", last) => last.to_string(),
            (first, "") => first.to_string(),
            (first, last) => format!("{first} {last}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Competition {
    pub id: Option<CompetitionId>,
    pub name: String,
    pub disciplines: Vec<DisciplineRef>,
    pub participants: Vec<CompetitorId>,
    pub admins: Vec<CompetitorId>,
    pub results: Vec<AttemptResult>,
}

impl Competition {
    pub fn is_participant(&self, id: &CompetitorId) -> bool {
        self.participants.contains(id)
    }

    pub fn has_discipline(&self, reference: &DisciplineRef) -> bool {
        self.disciplines.contains(reference)
    }

    pub fn result_for(&self, competitor: &CompetitorId, discipline: &DisciplineRef) -> Option<&AttemptResult> {
        self.results
            .iter()
            .find(|r| &r.competitor_id == competitor && &r.discipline_ref == discipline)
    }

    pub fn has_result(&self, competitor: &CompetitorId, discipline: &DisciplineRef) -> bool {
        self.result_for(competitor, discipline).is_some()
    }

    /// Results whose discipline is part of this competition; others are ignored by ranking.
    pub fn in_scope_results(&self) -> impl Iterator<Item = &AttemptResult> {
        self.results.iter().filter(move |r| self.has_discipline(&r.discipline_ref))
    }

    /// In-scope results of one competitor, in stored order.
    pub fn results_of<'a>(&'a self, competitor: &'a CompetitorId) -> impl Iterator<Item = &'a AttemptResult> + 'a {
        self.in_scope_results().filter(move |r| &r.competitor_id == competitor)
    }
}

/// One row of pasted participant data awaiting duplicate checks.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImportedRow {
    pub first_name: String,
    pub last_name: String,
    pub country: Option<String>,
    pub birth_year: Option<u16>,
}

impl ImportedRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim()).trim().to_string()
    }
}

/// Derived per-competitor total. Recomputed on every scoring pass, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompetitorTotal {
    pub competitor_id: CompetitorId,
    pub total: Points,
    pub rounded_total: i64,
}

impl CompetitorTotal {
    pub fn new(competitor_id: CompetitorId, total: Points) -> Self {
        CompetitorTotal { competitor_id, total, rounded_total: total.ceil() }
    }
}
