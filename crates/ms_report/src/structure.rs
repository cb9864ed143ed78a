//! Report data model + the mapper from a standings pass.
//! No I/O, no float formatting beyond what `Points` already fixes.

use std::collections::BTreeMap;

use ms_algo::select_counted;
use ms_core::{Competition, CompetitorId, DisciplineCatalogue};
use ms_pipeline::{ordered_disciplines, StandingsPass};

use crate::ReportError;

#[derive(Clone, Debug, PartialEq)]
pub struct StandingsReport {
    /// Competition display name.
    pub competition: String,
    pub competition_id: Option<String>,
    pub snapshot_sha256: String,
    /// Column order for every per-discipline vector below.
    pub disciplines: Vec<DisciplineColumn>,
    pub rows: Vec<ReportRow>,
    pub leaderboards: Vec<BoardSection>,
    pub completion: CompletionSection,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisciplineColumn {
    pub reference: String,
    pub label: String,
    /// Time-based disciplines get an extra time column in CSV.
    pub timed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub position: usize,
    pub competitor_id: String,
    pub name: String,
    /// Ceiled total.
    pub total: i64,
    /// Two-decimal total, e.g. "1596.89".
    pub unrounded_total: String,
    /// One cell per discipline column; `None` when no result exists.
    pub scores: Vec<Option<ScoreCell>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreCell {
    pub raw_score: f64,
    pub time: Option<f64>,
    pub points: String,
    pub provisional: bool,
    /// False for the weaker attempt of a best-attempt group.
    pub counted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardSection {
    pub reference: String,
    pub label: String,
    pub entries: Vec<BoardEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardEntry {
    pub position: usize,
    pub competitor_id: String,
    pub name: String,
    pub raw_score: f64,
    pub time: Option<f64>,
    pub points: String,
    pub provisional: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionSection {
    /// `(reference, status)` in column order; status is `DisciplineStatus::as_str`.
    pub per_discipline: Vec<(String, &'static str)>,
    pub complete: bool,
}

/// Project `pass` (computed from `competition`) into the export model.
pub fn build_report(
    competition: &Competition,
    catalogue: &DisciplineCatalogue,
    pass: &StandingsPass,
) -> Result<StandingsReport, ReportError> {
    let order = ordered_disciplines(competition, catalogue);

    let disciplines: Vec<DisciplineColumn> = order
        .iter()
        .map(|d| {
            let entry = catalogue.get(d);
            DisciplineColumn {
                reference: d.to_string(),
                label: entry.map(|x| x.label.clone()).unwrap_or_else(|| d.to_string()),
                timed: entry.map(|x| x.family.is_timed()).unwrap_or(false),
            }
        })
        .collect();

    let names: BTreeMap<&CompetitorId, &str> =
        pass.standings.iter().map(|s| (&s.competitor_id, s.name.as_str())).collect();
    let name_of = |id: &CompetitorId| names.get(id).map(|n| n.to_string()).unwrap_or_else(|| id.to_string());

    let mut rows = Vec::with_capacity(pass.standings.len());
    for s in &pass.standings {
        if !competition.is_participant(&s.competitor_id) {
            return Err(ReportError::Inconsistent(format!("ranked competitor {} is not a participant", s.competitor_id)));
        }
        let counted = select_counted(competition.results_of(&s.competitor_id), catalogue);
        let scores = order
            .iter()
            .map(|d| {
                competition.result_for(&s.competitor_id, d).map(|r| ScoreCell {
                    raw_score: r.raw_score,
                    time: r.time,
                    points: ms_algo::result_points(catalogue, r).to_string(),
                    provisional: r.provisional,
                    counted: counted.counts(r),
                })
            })
            .collect();
        rows.push(ReportRow {
            position: s.position,
            competitor_id: s.competitor_id.to_string(),
            name: s.name.clone(),
            total: s.rounded_total,
            unrounded_total: s.total.to_string(),
            scores,
        });
    }

    let mut leaderboards = Vec::with_capacity(pass.leaderboards.len());
    for board in &pass.leaderboards {
        if !competition.has_discipline(&board.discipline) {
            return Err(ReportError::Inconsistent(format!(
                "leaderboard {} is not a discipline of this competition",
                board.discipline
            )));
        }
        leaderboards.push(BoardSection {
            reference: board.discipline.to_string(),
            label: board.label.clone(),
            entries: board
                .entries
                .iter()
                .map(|e| BoardEntry {
                    position: e.position,
                    competitor_id: e.competitor_id.to_string(),
                    name: name_of(&e.competitor_id),
                    raw_score: e.raw_score,
                    time: e.time,
                    points: e.points.to_string(),
                    provisional: e.provisional,
                })
                .collect(),
        });
    }

    let mut per_discipline: Vec<(String, &'static str)> = pass
        .completion
        .per_discipline
        .iter()
        .map(|(d, status)| (d.to_string(), status.as_str()))
        .collect();
    per_discipline.sort_by_key(|(d, _)| disciplines.iter().position(|c| &c.reference == d).unwrap_or(usize::MAX));

    Ok(StandingsReport {
        competition: competition.name.clone(),
        competition_id: competition.id.as_ref().map(|id| id.to_string()),
        snapshot_sha256: pass.snapshot_sha256.clone(),
        disciplines,
        rows,
        leaderboards,
        completion: CompletionSection { per_discipline, complete: pass.completion.complete },
    })
}
