//! Discipline definitions and the static discipline catalogue.
//!
//! A discipline carries its scoring family and best-attempt group explicitly.
//! Legacy backends only store short codes (`5N1`, `SC2`, `K3`, `15W`); the
//! `infer_*` helpers reproduce the historical code conventions for catalogue
//! entries that omit the explicit fields.

use std::collections::BTreeMap;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::ids::DisciplineRef;

/// Maximum attainable raw score in a time-based discipline (one full deck).
pub const MAX_TIMED_SCORE: f64 = 52.0;

/// How raw scores of a discipline convert into championship points.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScoringFamily {
    /// `(raw / standard) * 1000`
    Linear,
    /// `sqrt(raw) * standard`
    SquareRoot,
    /// Perfect runs ranked by time, partial runs by completeness.
    TimeBased,
    /// Linear scoring; results stay provisional until reviewed by an official.
    WordMemory,
}

impl ScoringFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoringFamily::Linear => "linear",
            ScoringFamily::SquareRoot => "square_root",
            ScoringFamily::TimeBased => "time_based",
            ScoringFamily::WordMemory => "word_memory",
        }
    }

    pub fn is_timed(self) -> bool { matches!(self, ScoringFamily::TimeBased) }

    /// Only word-memory results go through manual completion review.
    pub fn needs_review(self) -> bool { matches!(self, ScoringFamily::WordMemory) }
}

impl fmt::Display for ScoringFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Scoring parameters. `Timed` is only valid on `TimeBased` disciplines.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ScoringStandard {
    Single(f64),
    Timed { part1: f64, part2: f64, part3: f64 },
}

impl ScoringStandard {
    fn all_positive(&self) -> bool {
        let ok = |x: f64| x.is_finite() && x > 0.0;
        match *self {
            ScoringStandard::Single(s) => ok(s),
            ScoringStandard::Timed { part1, part2, part3 } => ok(part1) && ok(part2) && ok(part3),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Discipline {
    #[cfg_attr(feature = "serde", serde(rename = "ref"))]
    pub reference: DisciplineRef,
    pub label: String,
    pub family: ScoringFamily,
    /// Best-attempt group: only the best attempt among members counts.
    pub group: Option<String>,
    /// `None` = unconfigured; such a discipline scores zero.
    pub standard: Option<ScoringStandard>,
}

impl Discipline {
    /// Validated constructor: the standard's shape must fit the family.
    pub fn new(
        reference: DisciplineRef,
        label: impl Into<String>,
        family: ScoringFamily,
        group: Option<String>,
        standard: Option<ScoringStandard>,
    ) -> Result<Discipline, CoreError> {
        if let Some(std) = &standard {
            let shape_ok = matches!(
                (family, std),
                (ScoringFamily::TimeBased, ScoringStandard::Timed { .. })
                    | (ScoringFamily::Linear, ScoringStandard::Single(_))
                    | (ScoringFamily::SquareRoot, ScoringStandard::Single(_))
                    | (ScoringFamily::WordMemory, ScoringStandard::Single(_))
            );
            if !shape_ok {
                return Err(CoreError::StandardMismatch {
                    reference: reference.to_string(),
                    family: family.as_str(),
                });
            }
            if !std.all_positive() {
                return Err(CoreError::InvalidStandard(reference.to_string()));
            }
        }
        Ok(Discipline { reference, label: label.into(), family, group, standard })
    }

    /// Build a discipline from a legacy code, inferring family and group.
    pub fn from_legacy_code(
        reference: DisciplineRef,
        label: impl Into<String>,
        standard: Option<ScoringStandard>,
    ) -> Result<Discipline, CoreError> {
        let family = infer_family(reference.as_str());
        let group = infer_group(reference.as_str());
        Discipline::new(reference, label, family, group, standard)
    }
}

/// Legacy convention: `SC` → time-based, `K` → square-root, `W` → word memory, else linear.
pub fn infer_family(code: &str) -> ScoringFamily {
    if code.contains("SC") {
        ScoringFamily::TimeBased
    } else if code.contains('K') {
        ScoringFamily::SquareRoot
    } else if code.contains('W') {
        ScoringFamily::WordMemory
    } else {
        ScoringFamily::Linear
    }
}

/// Legacy convention: codes containing `5N`, `SC` or `K` are multi-attempt;
/// the group key is the code without trailing digits (`5N1`/`5N2` → `5N`).
pub fn infer_group(code: &str) -> Option<String> {
    if code.contains("5N") || code.contains("SC") || code.contains('K') {
        Some(code.trim_end_matches(|c: char| c.is_ascii_digit()).to_string())
    } else {
        None
    }
}

// ----------------------------- Catalogue -----------------------------

/// Static discipline table, in display order.
#[derive(Clone, Debug, Default)]
pub struct DisciplineCatalogue {
    disciplines: Vec<Discipline>,
    by_ref: BTreeMap<DisciplineRef, usize>,
}

impl DisciplineCatalogue {
    pub fn new(disciplines: Vec<Discipline>) -> Result<DisciplineCatalogue, CoreError> {
        let mut by_ref = BTreeMap::new();
        for (i, d) in disciplines.iter().enumerate() {
            if by_ref.insert(d.reference.clone(), i).is_some() {
                return Err(CoreError::DuplicateDiscipline(d.reference.to_string()));
            }
        }
        Ok(DisciplineCatalogue { disciplines, by_ref })
    }

    pub fn get(&self, reference: &DisciplineRef) -> Option<&Discipline> {
        self.by_ref.get(reference).map(|&i| &self.disciplines[i])
    }

    /// Case-insensitive label lookup (submission codes name disciplines by label).
    pub fn by_label(&self, label: &str) -> Option<&Discipline> {
        let needle = label.trim();
        self.disciplines.iter().find(|d| d.label.eq_ignore_ascii_case(needle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Discipline> { self.disciplines.iter() }

    pub fn len(&self) -> usize { self.disciplines.len() }

    pub fn is_empty(&self) -> bool { self.disciplines.is_empty() }

    /// Position in display order; unknown refs sort last.
    pub fn order_of(&self, reference: &DisciplineRef) -> usize {
        self.by_ref.get(reference).copied().unwrap_or(usize::MAX)
    }

    /// Built-in table used when no catalogue file is configured.
    pub fn builtin() -> DisciplineCatalogue {
        use ScoringFamily::*;
        const SPEED_CARDS: ScoringStandard =
            ScoringStandard::Timed { part1: 6862.0, part2: 0.75, part3: 95.83 };
        let rows: [(&str, &str, ScoringFamily, Option<&str>, ScoringStandard); 16] = [
            ("5N1", "5-Minute Numbers (Trial 1)", Linear, Some("5N"), ScoringStandard::Single(547.0)),
            ("5N2", "5-Minute Numbers (Trial 2)", Linear, Some("5N"), ScoringStandard::Single(547.0)),
            ("15N", "15-Minute Numbers", Linear, None, ScoringStandard::Single(1112.0)),
            ("5B", "5-Minute Binary", Linear, None, ScoringStandard::Single(1223.0)),
            ("5I", "5-Minute Images", Linear, None, ScoringStandard::Single(492.0)),
            ("5D", "5-Minute Dates", Linear, None, ScoringStandard::Single(125.0)),
            ("15NF", "15-Minute Names and Faces", Linear, None, ScoringStandard::Single(167.0)),
            ("10C", "10-Minute Cards", Linear, None, ScoringStandard::Single(426.0)),
            ("5W", "5-Minute Words", WordMemory, None, ScoringStandard::Single(125.0)),
            ("15W", "15-Minute Words", WordMemory, None, ScoringStandard::Single(312.0)),
            ("SC1", "Speed Cards (Trial 1)", TimeBased, Some("SC"), SPEED_CARDS),
            ("SC2", "Speed Cards (Trial 2)", TimeBased, Some("SC"), SPEED_CARDS),
            ("K1", "Spoken Numbers (Trial 1)", SquareRoot, Some("K"), ScoringStandard::Single(47.7)),
            ("K2", "Spoken Numbers (Trial 2)", SquareRoot, Some("K"), ScoringStandard::Single(47.7)),
            ("K3", "Spoken Numbers (Trial 3)", SquareRoot, Some("K"), ScoringStandard::Single(47.7)),
            ("30B", "30-Minute Binary", Linear, None, ScoringStandard::Single(5040.0)),
        ];
        let disciplines = rows
            .into_iter()
            .map(|(code, label, family, group, standard)| Discipline {
                reference: DisciplineRef::try_from(code.to_string()).expect("builtin codes are valid tokens"),
                label: label.to_string(),
                family,
                group: group.map(str::to_string),
                standard: Some(standard),
            })
            .collect();
        DisciplineCatalogue::new(disciplines).expect("builtin codes are unique")
    }
}
