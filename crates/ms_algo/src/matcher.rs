//! Participant import matcher.
//!
//! Two-stage fuzzy matching for pasted participant rows:
//! 1. the row's country is normalized against [`REFERENCE_COUNTRIES`]
//!    (below [`DEFAULT_COUNTRY_THRESHOLD`] it becomes [`UNRECOGNIZED_COUNTRY`]);
//! 2. existing competitors of a compatible country are compared by name.
//!
//! A compatible country is the same country (case-insensitive) or an unset
//! one on the existing competitor. Name similarity alone never links two
//! records, and nothing here merges anything: rows with candidates are
//! returned for manual disambiguation.

use ms_core::{Competitor, ImportedRow};

use crate::countries::{COUNTRY_ALIASES, REFERENCE_COUNTRIES};

pub const DEFAULT_NAME_THRESHOLD: f64 = 0.85;
pub const DEFAULT_COUNTRY_THRESHOLD: f64 = 0.8;
pub const UNRECOGNIZED_COUNTRY: &str = "Unrecognized";

#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub competitor: Competitor,
    /// Sørensen–Dice bigram similarity in `[0, 1]`.
    pub similarity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowMatches {
    /// Index into the imported rows.
    pub index: usize,
    pub row: ImportedRow,
    /// Sorted by similarity, best first.
    pub candidates: Vec<Candidate>,
}

impl RowMatches {
    /// No plausible duplicate: safe to create a new competitor.
    pub fn is_confident_new(&self) -> bool { self.candidates.is_empty() }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CountryMatch {
    Recognized { name: &'static str, similarity: f64 },
    Unrecognized,
}

impl CountryMatch {
    pub fn name(&self) -> &'static str {
        match *self {
            CountryMatch::Recognized { name, .. } => name,
            CountryMatch::Unrecognized => UNRECOGNIZED_COUNTRY,
        }
    }
}

/// Case-insensitive name similarity of two `"first last"` strings.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(&a.trim().to_lowercase(), &b.trim().to_lowercase())
}

/// Map free-text country input onto the reference list.
pub fn normalize_country(input: &str, threshold: f64) -> CountryMatch {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return CountryMatch::Unrecognized;
    }
    if let Some(&(_, name)) = COUNTRY_ALIASES.iter().find(|(alias, _)| *alias == needle) {
        return CountryMatch::Recognized { name, similarity: 1.0 };
    }

    let mut best: Option<(&'static str, f64)> = None;
    for &name in REFERENCE_COUNTRIES {
        let sim = strsim::sorensen_dice(&needle, &name.to_lowercase());
        if best.map_or(true, |(_, b)| sim > b) {
            best = Some((name, sim));
        }
    }
    match best {
        Some((name, similarity)) if similarity >= threshold => CountryMatch::Recognized { name, similarity },
        _ => CountryMatch::Unrecognized,
    }
}

fn is_unset(country: Option<&str>) -> bool {
    country.map_or(true, |c| c.trim().is_empty())
}

fn country_compatible(imported: Option<&str>, existing: Option<&str>) -> bool {
    if is_unset(existing) {
        return true;
    }
    match (imported, existing) {
        (Some(a), Some(b)) if !a.trim().is_empty() => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

/// Candidate duplicates for every imported row.
pub fn find_matches(rows: &[ImportedRow], existing: &[Competitor], threshold: f64) -> Vec<RowMatches> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let name = row.full_name();
            let mut candidates: Vec<Candidate> = existing
                .iter()
                .filter(|c| country_compatible(row.country.as_deref(), c.country.as_deref()))
                .filter_map(|c| {
                    let similarity = name_similarity(&name, &c.display_name());
                    (similarity >= threshold).then(|| Candidate { competitor: c.clone(), similarity })
                })
                .collect();
            candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
            RowMatches { index, row: row.clone(), candidates }
        })
        .collect()
}
