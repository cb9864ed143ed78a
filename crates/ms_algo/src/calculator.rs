//! Champion-point calculator: one raw result → championship points.
//!
//! Formulas by scoring family:
//! - Linear / WordMemory: `(raw / standard) * 1000`
//! - SquareRoot:          `sqrt(raw) * standard`
//! - TimeBased:           `raw == 52` → `part1 / time^part2`,
//!                        otherwise   `(raw / 52) * part3`
//!
//! Every branch rounds to two decimals before returning; totals are sums of
//! these rounded values.
//!
//! Fails soft: an unknown or unconfigured discipline scores zero, as does a
//! non-finite input. A ranking pass never aborts on one bad record.

use ms_core::discipline::MAX_TIMED_SCORE;
use ms_core::{AttemptResult, Discipline, DisciplineCatalogue, DisciplineRef, Points, ScoringFamily, ScoringStandard};

/// Points for `raw_score` in the discipline `discipline_ref` of `catalogue`.
/// `time` is only read for time-based disciplines.
pub fn compute_points(
    catalogue: &DisciplineCatalogue,
    discipline_ref: &DisciplineRef,
    raw_score: f64,
    time: Option<f64>,
) -> Points {
    match catalogue.get(discipline_ref) {
        Some(d) => points_for(d, raw_score, time),
        None => {
            tracing::debug!(discipline = %discipline_ref, "unknown discipline scores zero");
            Points::ZERO
        }
    }
}

/// Points of a stored result.
pub fn result_points(catalogue: &DisciplineCatalogue, result: &AttemptResult) -> Points {
    compute_points(catalogue, &result.discipline_ref, result.raw_score, result.time)
}

pub fn points_for(discipline: &Discipline, raw_score: f64, time: Option<f64>) -> Points {
    let Some(standard) = discipline.standard else {
        tracing::debug!(discipline = %discipline.reference, "no configured standard; scoring zero");
        return Points::ZERO;
    };
    if !raw_score.is_finite() {
        return Points::ZERO;
    }

    let value = match (discipline.family, standard) {
        (ScoringFamily::TimeBased, ScoringStandard::Timed { part1, part2, part3 }) => {
            timed_points(raw_score, time, part1, part2, part3)
        }
        (ScoringFamily::SquareRoot, ScoringStandard::Single(multiplier)) => raw_score.sqrt() * multiplier,
        (ScoringFamily::Linear | ScoringFamily::WordMemory, ScoringStandard::Single(divisor)) => {
            (raw_score / divisor) * 1000.0
        }
        (family, _) => {
            // Unreachable through `Discipline::new`, but catalogue structs are public.
            tracing::debug!(discipline = %discipline.reference, %family, "standard shape mismatch; scoring zero");
            return Points::ZERO;
        }
    };
    Points::from_f64_rounded(value)
}

fn timed_points(raw_score: f64, time: Option<f64>, part1: f64, part2: f64, part3: f64) -> f64 {
    if raw_score == MAX_TIMED_SCORE {
        match time {
            Some(t) if t.is_finite() && t > 0.0 => part1 / t.powf(part2),
            _ => 0.0,
        }
    } else {
        (raw_score / MAX_TIMED_SCORE) * part3
    }
}
