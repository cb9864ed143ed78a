//! Result intake: submissions (direct or via submission code), official
//! edits, deletions and word-memory review confirmation.
//!
//! Every write validates against a freshly fetched snapshot and goes through
//! [`CompetitionStore::write`], so nothing changes locally unless the
//! backend accepted it. At most one result exists per (competitor,
//! discipline); a second submission is rejected, never merged.

use chrono::{DateTime, Duration, Utc};

use ms_core::discipline::MAX_TIMED_SCORE;
use ms_core::{AttemptResult, Competition, CompetitorId, DisciplineCatalogue, DisciplineRef, ScoringFamily};
use ms_io::backend::{Backend, CompetitionPatch};
use ms_io::submission_code::{self, CodeError};

use crate::store::CompetitionStore;
use crate::PipelineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntakePolicy {
    pub max_code_age: Duration,
    /// Reject codes without a timestamp instead of accepting them with a warning.
    pub require_timestamp: bool,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        IntakePolicy { max_code_age: submission_code::default_max_age(), require_timestamp: false }
    }
}

fn position(c: &Competition, competitor: &CompetitorId, discipline: &DisciplineRef) -> Option<usize> {
    c.results
        .iter()
        .position(|r| &r.competitor_id == competitor && &r.discipline_ref == discipline)
}

fn needs_review(catalogue: &DisciplineCatalogue, discipline: &DisciplineRef) -> bool {
    catalogue.get(discipline).map(|d| d.family.needs_review()).unwrap_or(false)
}

fn check_numbers(catalogue: &DisciplineCatalogue, result: &AttemptResult) -> Result<(), PipelineError> {
    if !result.raw_score.is_finite() || result.raw_score < 0.0 {
        return Err(PipelineError::InvalidScore(format!("score {} is not a non-negative number", result.raw_score)));
    }
    if let Some(t) = result.time {
        if !t.is_finite() || t <= 0.0 {
            return Err(PipelineError::InvalidScore(format!("time {t} is not a positive number")));
        }
    }
    // A perfect time-based run is scored by its time.
    let timed = catalogue.get(&result.discipline_ref).map(|d| d.family == ScoringFamily::TimeBased).unwrap_or(false);
    if timed && result.raw_score == MAX_TIMED_SCORE && result.time.is_none() {
        return Err(PipelineError::InvalidScore(format!(
            "a perfect score in {} needs a time",
            result.discipline_ref
        )));
    }
    Ok(())
}

fn check_membership(c: &Competition, result: &AttemptResult) -> Result<(), PipelineError> {
    if !c.is_participant(&result.competitor_id) {
        return Err(PipelineError::NotParticipant(result.competitor_id.clone()));
    }
    if !c.has_discipline(&result.discipline_ref) {
        return Err(PipelineError::DisciplineNotInCompetition(result.discipline_ref.clone()));
    }
    Ok(())
}

/// Append a new result. Word-memory results are stored provisional; all
/// others never are.
pub fn submit_result<B: Backend>(
    store: &mut CompetitionStore<B>,
    catalogue: &DisciplineCatalogue,
    mut result: AttemptResult,
) -> Result<AttemptResult, PipelineError> {
    check_numbers(catalogue, &result)?;
    store.refresh()?;
    let current = store.competition()?;
    check_membership(current, &result)?;
    if position(current, &result.competitor_id, &result.discipline_ref).is_some() {
        return Err(PipelineError::DuplicateResult {
            competitor: result.competitor_id.clone(),
            discipline: result.discipline_ref.clone(),
        });
    }

    result.provisional = needs_review(catalogue, &result.discipline_ref);
    let mut results = current.results.clone();
    results.push(result.clone());
    store.write(&CompetitionPatch::results(results))?;
    tracing::info!(
        competitor = %result.competitor_id,
        discipline = %result.discipline_ref,
        provisional = result.provisional,
        "result submitted"
    );
    Ok(result)
}

/// Decode a submission code for `competitor` and submit it.
pub fn submit_code<B: Backend>(
    store: &mut CompetitionStore<B>,
    catalogue: &DisciplineCatalogue,
    competitor: &CompetitorId,
    code_text: &str,
    now: DateTime<Utc>,
    policy: &IntakePolicy,
) -> Result<AttemptResult, PipelineError> {
    let decoded = submission_code::decode(code_text)?;
    if decoded.timestamp.is_none() && policy.require_timestamp {
        return Err(CodeError::MissingTimestamp.into());
    }
    submission_code::check_fresh(&decoded, now, policy.max_code_age)?;

    let discipline = resolve_discipline(store.competition()?, catalogue, &decoded.discipline)
        .ok_or_else(|| PipelineError::UnknownDiscipline(decoded.discipline.clone()))?;

    let result = AttemptResult {
        competitor_id: competitor.clone(),
        discipline_ref: discipline,
        raw_score: decoded.score,
        time: decoded.time,
        provisional: false,
        additional_info: decoded.additional_info,
    };
    submit_result(store, catalogue, result)
}

/// Match a discipline name from a code against the competition's own
/// disciplines: catalogue label (case-insensitive) or exact ref.
pub fn resolve_discipline(c: &Competition, catalogue: &DisciplineCatalogue, name: &str) -> Option<DisciplineRef> {
    let name = name.trim();
    c.disciplines
        .iter()
        .find(|d| d.as_str() == name)
        .or_else(|| {
            c.disciplines.iter().find(|d| {
                catalogue.get(d).map(|x| x.label.trim().eq_ignore_ascii_case(name)).unwrap_or(false)
            })
        })
        .cloned()
}

/// Official edit: replace the stored record for the result's key wholesale.
pub fn replace_result<B: Backend>(
    store: &mut CompetitionStore<B>,
    catalogue: &DisciplineCatalogue,
    mut result: AttemptResult,
) -> Result<AttemptResult, PipelineError> {
    check_numbers(catalogue, &result)?;
    store.refresh()?;
    let current = store.competition()?;
    check_membership(current, &result)?;
    let idx = position(current, &result.competitor_id, &result.discipline_ref).ok_or_else(|| {
        PipelineError::ResultNotFound {
            competitor: result.competitor_id.clone(),
            discipline: result.discipline_ref.clone(),
        }
    })?;

    if !needs_review(catalogue, &result.discipline_ref) {
        result.provisional = false;
    }
    let mut results = current.results.clone();
    results[idx] = result.clone();
    store.write(&CompetitionPatch::results(results))?;
    tracing::info!(competitor = %result.competitor_id, discipline = %result.discipline_ref, "result replaced");
    Ok(result)
}

pub fn delete_result<B: Backend>(
    store: &mut CompetitionStore<B>,
    competitor: &CompetitorId,
    discipline: &DisciplineRef,
) -> Result<AttemptResult, PipelineError> {
    store.refresh()?;
    let current = store.competition()?;
    let idx = position(current, competitor, discipline).ok_or_else(|| PipelineError::ResultNotFound {
        competitor: competitor.clone(),
        discipline: discipline.clone(),
    })?;
    let mut results = current.results.clone();
    let removed = results.remove(idx);
    store.write(&CompetitionPatch::results(results))?;
    tracing::info!(competitor = %competitor, discipline = %discipline, "result deleted");
    Ok(removed)
}

/// Clear the provisional flag after manual review. Confirming an already
/// confirmed result is a no-op without a write.
pub fn confirm_result<B: Backend>(
    store: &mut CompetitionStore<B>,
    competitor: &CompetitorId,
    discipline: &DisciplineRef,
) -> Result<AttemptResult, PipelineError> {
    store.refresh()?;
    let current = store.competition()?;
    let idx = position(current, competitor, discipline).ok_or_else(|| PipelineError::ResultNotFound {
        competitor: competitor.clone(),
        discipline: discipline.clone(),
    })?;
    if !current.results[idx].provisional {
        return Ok(current.results[idx].clone());
    }
    let mut results = current.results.clone();
    results[idx].provisional = false;
    let confirmed = results[idx].clone();
    store.write(&CompetitionPatch::results(results))?;
    tracing::info!(competitor = %competitor, discipline = %discipline, "result confirmed");
    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ms_core::CompetitionId;
    use ms_io::backend::{ApiContext, MemoryBackend};

    fn cid(s: &str) -> CompetitionId { s.parse().unwrap() }
    fn uid(s: &str) -> CompetitorId { s.parse().unwrap() }
    fn dref(s: &str) -> DisciplineRef { s.parse().unwrap() }

    fn backend() -> MemoryBackend {
        MemoryBackend::new().with_competition(
            cid("c1"),
            Competition {
                disciplines: vec![dref("5N1"), dref("15W"), dref("SC1")],
                participants: vec![uid("a"), uid("b")],
                ..Competition::default()
            },
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()
    }

    #[test]
    fn duplicate_submission_is_rejected_not_overwritten() {
        let be = backend();
        let cat = DisciplineCatalogue::builtin();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        submit_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("5N1"), 300.0)).unwrap();
        let err = submit_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("5N1"), 500.0)).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateResult { .. }));
        let stored = be.stored(&cid("c1")).unwrap();
        assert_eq!(stored.results.len(), 1);
        assert_eq!(stored.results[0].raw_score, 300.0);
    }

    #[test]
    fn membership_and_numbers_are_checked() {
        let be = backend();
        let cat = DisciplineCatalogue::builtin();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        let err = submit_result(&mut store, &cat, AttemptResult::new(uid("z"), dref("5N1"), 1.0)).unwrap_err();
        assert_eq!(err, PipelineError::NotParticipant(uid("z")));
        let err = submit_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("K1"), 1.0)).unwrap_err();
        assert_eq!(err, PipelineError::DisciplineNotInCompetition(dref("K1")));
        let err = submit_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("5N1"), f64::NAN)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidScore(_)));
        assert!(be.stored(&cid("c1")).unwrap().results.is_empty());
    }

    #[test]
    fn perfect_speed_cards_need_a_time() {
        let be = backend();
        let cat = DisciplineCatalogue::builtin();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        let err = submit_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("SC1"), 52.0)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidScore(m) if m.contains("SC1")));
        assert!(be.stored(&cid("c1")).unwrap().results.is_empty());

        // A partial run is scored by completeness alone.
        submit_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("SC1"), 40.0)).unwrap();
        submit_result(&mut store, &cat, AttemptResult::new(uid("b"), dref("SC1"), 52.0).with_time(31.5)).unwrap();
        assert_eq!(be.stored(&cid("c1")).unwrap().results.len(), 2);
    }

    #[test]
    fn provisional_follows_family() {
        let be = backend();
        let cat = DisciplineCatalogue::builtin();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        let w = submit_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("15W"), 90.0)).unwrap();
        assert!(w.provisional);
        let n = submit_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("5N1"), 90.0).provisional(true)).unwrap();
        assert!(!n.provisional);

        let confirmed = confirm_result(&mut store, &uid("a"), &dref("15W")).unwrap();
        assert!(!confirmed.provisional);
        assert!(be.stored(&cid("c1")).unwrap().results.iter().all(|r| !r.provisional));
    }

    #[test]
    fn code_submission_resolves_label() {
        let be = backend();
        let cat = DisciplineCatalogue::builtin();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        let code = "Discipline: speed cards (trial 1) // Score: 52 // Time:33.2 // Timestamp: 2024-05-01 10:00:00";
        let r = submit_code(&mut store, &cat, &uid("b"), code, now(), &IntakePolicy::default()).unwrap();
        assert_eq!(r.discipline_ref, dref("SC1"));
        assert_eq!(r.time, Some(33.2));
    }

    #[test]
    fn expired_or_unknown_codes_do_not_write() {
        let be = backend();
        let cat = DisciplineCatalogue::builtin();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        let policy = IntakePolicy::default();

        let old = "Discipline: 5N1 // Score: 200 // Timestamp: 2024-05-01 09:29:00";
        let err = submit_code(&mut store, &cat, &uid("a"), old, now(), &policy).unwrap_err();
        assert!(matches!(err, PipelineError::Code(CodeError::Expired { .. })));

        let unknown = "Discipline: Underwater Chess // Score: 3 // Timestamp: 2024-05-01 10:20:00";
        let err = submit_code(&mut store, &cat, &uid("a"), unknown, now(), &policy).unwrap_err();
        assert_eq!(err, PipelineError::UnknownDiscipline("Underwater Chess".into()));

        let bare = "Discipline: 5N1 // Score: 200";
        let strict = IntakePolicy { require_timestamp: true, ..policy };
        let err = submit_code(&mut store, &cat, &uid("a"), bare, now(), &strict).unwrap_err();
        assert_eq!(err, PipelineError::Code(CodeError::MissingTimestamp));

        assert!(be.stored(&cid("c1")).unwrap().results.is_empty());
    }

    #[test]
    fn replace_and_delete_need_an_existing_result() {
        let be = backend();
        let cat = DisciplineCatalogue::builtin();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        let err = replace_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("5N1"), 1.0)).unwrap_err();
        assert!(matches!(err, PipelineError::ResultNotFound { .. }));

        submit_result(&mut store, &cat, AttemptResult::new(uid("a"), dref("5N1"), 100.0)).unwrap();
        let edited = AttemptResult::new(uid("a"), dref("5N1"), 120.0);
        replace_result(&mut store, &cat, edited).unwrap();
        assert_eq!(store.cached().unwrap().results[0].raw_score, 120.0);

        let removed = delete_result(&mut store, &uid("a"), &dref("5N1")).unwrap();
        assert_eq!(removed.raw_score, 120.0);
        assert!(store.cached().unwrap().results.is_empty());
    }
}
