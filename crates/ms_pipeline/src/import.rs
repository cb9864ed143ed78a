//! Participant import: pasted rows → country normalization → duplicate
//! matching → a plan an official reviews → applied decisions.
//!
//! Nothing is merged automatically. Rows with candidate duplicates (or an
//! unrecognized country) are written only when an explicit decision exists.

use std::collections::BTreeMap;

use ms_algo::{
    find_matches, normalize_country, Candidate, CountryMatch, DEFAULT_COUNTRY_THRESHOLD, DEFAULT_NAME_THRESHOLD,
    UNRECOGNIZED_COUNTRY,
};
use ms_core::{Competitor, CompetitorId, ImportedRow};
use ms_io::backend::{Backend, CompetitionPatch, NewCompetitor};
use ms_io::import_text::parse_pasted_rows;

use crate::store::CompetitionStore;
use crate::PipelineError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImportThresholds {
    pub name: f64,
    pub country: f64,
}

impl Default for ImportThresholds {
    fn default() -> Self {
        ImportThresholds { name: DEFAULT_NAME_THRESHOLD, country: DEFAULT_COUNTRY_THRESHOLD }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RowStatus {
    /// No plausible duplicate; safe to create.
    CreateNew,
    NeedsReview { candidates: Vec<Candidate> },
    /// The pasted country matched nothing in the reference list.
    UnrecognizedCountry { input: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedRow {
    pub index: usize,
    /// Row with its country replaced by the normalized name, or `UNRECOGNIZED_COUNTRY`.
    pub row: ImportedRow,
    pub status: RowStatus,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportPlan {
    pub rows: Vec<PlannedRow>,
}

impl ImportPlan {
    pub fn needing_review(&self) -> impl Iterator<Item = &PlannedRow> {
        self.rows.iter().filter(|r| r.status != RowStatus::CreateNew)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportDecision {
    /// The row is this existing competitor.
    Link(CompetitorId),
    /// The row is a new person.
    Create,
    Skip,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportOutcome {
    pub created: Vec<Competitor>,
    pub linked: Vec<CompetitorId>,
    /// Row indices left out (explicit skip, or review pending without a decision).
    pub skipped: Vec<usize>,
    /// Ids newly added to the competition's participant list.
    pub added_participants: Vec<CompetitorId>,
}

pub fn plan_import(text: &str, users: &[Competitor], thresholds: ImportThresholds) -> Result<ImportPlan, PipelineError> {
    let parsed = parse_pasted_rows(text)?;

    let mut unrecognized: BTreeMap<usize, String> = BTreeMap::new();
    let normalized: Vec<ImportedRow> = parsed
        .into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            if let Some(input) = row.country.take() {
                match normalize_country(&input, thresholds.country) {
                    CountryMatch::Recognized { name, .. } => row.country = Some(name.to_string()),
                    CountryMatch::Unrecognized => {
                        tracing::warn!(row = i + 1, country = %input, "unrecognized country in import");
                        row.country = Some(UNRECOGNIZED_COUNTRY.to_string());
                        unrecognized.insert(i, input);
                    }
                }
            }
            row
        })
        .collect();

    let rows = find_matches(&normalized, users, thresholds.name)
        .into_iter()
        .map(|m| {
            let status = match unrecognized.remove(&m.index) {
                Some(input) => RowStatus::UnrecognizedCountry { input },
                None if m.candidates.is_empty() => RowStatus::CreateNew,
                None => RowStatus::NeedsReview { candidates: m.candidates },
            };
            PlannedRow { index: m.index, row: m.row, status }
        })
        .collect();
    Ok(ImportPlan { rows })
}

/// Apply `plan`. Confident-new rows are created without a decision; all other
/// rows need one. Every link is checked before the first competitor is
/// created, and participants are added in a single competition write.
pub fn apply_import<B: Backend>(
    store: &mut CompetitionStore<B>,
    plan: &ImportPlan,
    decisions: &BTreeMap<usize, ImportDecision>,
) -> Result<ImportOutcome, PipelineError> {
    let known: Vec<CompetitorId> = store.users()?.iter().map(|u| u.id.clone()).collect();
    let mut outcome = ImportOutcome::default();

    let mut resolved: Vec<(&PlannedRow, ImportDecision)> = Vec::with_capacity(plan.rows.len());
    for planned in &plan.rows {
        let decision = match (decisions.get(&planned.index), &planned.status) {
            (Some(d), _) => d.clone(),
            (None, RowStatus::CreateNew) => ImportDecision::Create,
            (None, _) => {
                tracing::warn!(row = planned.index + 1, name = %planned.row.full_name(), "row needs review; skipped");
                outcome.skipped.push(planned.index);
                continue;
            }
        };
        if let ImportDecision::Link(id) = &decision {
            if !known.contains(id) {
                return Err(PipelineError::Io(format!("row {}: competitor {id} is not in the directory", planned.index + 1)));
            }
        }
        resolved.push((planned, decision));
    }

    let mut ids: Vec<CompetitorId> = Vec::new();
    for (planned, decision) in resolved {
        match decision {
            ImportDecision::Skip => outcome.skipped.push(planned.index),
            ImportDecision::Link(id) => {
                outcome.linked.push(id.clone());
                ids.push(id);
            }
            ImportDecision::Create => {
                let created = store.create_competitor(&NewCompetitor {
                    first_name: planned.row.first_name.clone(),
                    last_name: planned.row.last_name.clone(),
                    country: planned.row.country.clone(),
                })?;
                ids.push(created.id.clone());
                outcome.created.push(created);
            }
        }
    }
    outcome.skipped.sort_unstable();

    let mut participants = store.competition()?.participants.clone();
    for id in ids {
        if !participants.contains(&id) {
            participants.push(id.clone());
            outcome.added_participants.push(id);
        }
    }
    if !outcome.added_participants.is_empty() {
        store.write(&CompetitionPatch::participants(participants))?;
    }
    tracing::info!(
        created = outcome.created.len(),
        linked = outcome.linked.len(),
        skipped = outcome.skipped.len(),
        "participant import applied"
    );
    Ok(outcome)
}
