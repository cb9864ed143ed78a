//! Explicit cache over a [`Backend`] for one competition.
//!
//! Reads fetch only when nothing is cached or the cache was invalidated.
//! Writes are write-then-reconcile: the patch goes to the backend first; only
//! after it is accepted is the snapshot refetched and replaced wholesale. A
//! rejected write leaves the cached snapshot exactly as it was.

use ms_core::{Competition, CompetitionId, Competitor};
use ms_io::backend::{ApiContext, Backend, CompetitionPatch, NewCompetitor};
use ms_io::{hasher, snapshot};

use crate::PipelineError;

pub struct CompetitionStore<B: Backend> {
    backend: B,
    ctx: ApiContext,
    id: CompetitionId,
    competition: Option<Competition>,
    digest: Option<String>,
    users: Option<Vec<Competitor>>,
    stale: bool,
}

impl<B: Backend> CompetitionStore<B> {
    pub fn new(backend: B, ctx: ApiContext, id: CompetitionId) -> Self {
        CompetitionStore { backend, ctx, id, competition: None, digest: None, users: None, stale: true }
    }

    pub fn id(&self) -> &CompetitionId {
        &self.id
    }

    pub fn ctx(&self) -> &ApiContext {
        &self.ctx
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current snapshot, fetching if absent or invalidated.
    pub fn competition(&mut self) -> Result<&Competition, PipelineError> {
        if self.stale || self.competition.is_none() {
            self.refresh()?;
        }
        self.competition
            .as_ref()
            .ok_or_else(|| PipelineError::Io("competition snapshot unavailable".into()))
    }

    /// Last successfully fetched snapshot, without touching the backend.
    pub fn cached(&self) -> Option<&Competition> {
        self.competition.as_ref()
    }

    /// SHA-256 of the cached snapshot in canonical wire form.
    pub fn snapshot_digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn users(&mut self) -> Result<&[Competitor], PipelineError> {
        if self.users.is_none() {
            let users = self.backend.fetch_users(&self.ctx).map_err(|e| {
                tracing::error!(error = %e, "failed to load user directory");
                PipelineError::from(e)
            })?;
            self.users = Some(users);
        }
        Ok(self.users.as_deref().unwrap_or(&[]))
    }

    /// Drop both cached snapshots; the next read refetches.
    pub fn invalidate(&mut self) {
        self.stale = true;
        self.users = None;
    }

    /// Fetch the competition now. On failure the previous snapshot stays
    /// available through [`cached`](Self::cached).
    pub fn refresh(&mut self) -> Result<(), PipelineError> {
        let fetched = self.backend.fetch_competition(&self.ctx, &self.id).map_err(|e| {
            tracing::error!(competition = %self.id, error = %e, "failed to load competition");
            PipelineError::from(e)
        })?;
        let digest = hasher::sha256_canonical(&snapshot::competition_to_wire(&fetched))?;
        if self.digest.as_deref() == Some(digest.as_str()) {
            tracing::debug!(competition = %self.id, "refetch: snapshot unchanged");
        } else {
            tracing::debug!(competition = %self.id, digest = hasher::short(&digest), "refetch: new snapshot");
        }
        self.competition = Some(fetched);
        self.digest = Some(digest);
        self.stale = false;
        Ok(())
    }

    /// Send `patch`, then reconcile by refetching.
    pub fn write(&mut self, patch: &CompetitionPatch) -> Result<&Competition, PipelineError> {
        self.backend.update_competition(&self.ctx, &self.id, patch).map_err(|e| {
            tracing::error!(competition = %self.id, error = %e, "competition update rejected");
            PipelineError::from(e)
        })?;
        tracing::info!(competition = %self.id, "competition updated");
        self.stale = true;
        self.competition()
    }

    /// Create a user in the directory; the directory cache is dropped.
    pub fn create_competitor(&mut self, new: &NewCompetitor) -> Result<Competitor, PipelineError> {
        let created = self.backend.create_competitor(&self.ctx, new)?;
        tracing::info!(competitor = %created.id, "competitor created");
        self.users = None;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_core::{AttemptResult, CompetitorId, DisciplineRef};
    use ms_io::backend::MemoryBackend;

    fn cid(s: &str) -> CompetitionId { s.parse().unwrap() }
    fn uid(s: &str) -> CompetitorId { s.parse().unwrap() }
    fn dref(s: &str) -> DisciplineRef { s.parse().unwrap() }

    fn backend() -> MemoryBackend {
        MemoryBackend::new().with_competition(
            cid("c1"),
            Competition { disciplines: vec![dref("5N1")], participants: vec![uid("a")], ..Competition::default() },
        )
    }

    #[test]
    fn reads_are_cached_until_invalidated() {
        let be = backend();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        store.competition().unwrap();
        store.competition().unwrap();
        assert_eq!(be.fetch_count(), 1);
        store.invalidate();
        store.competition().unwrap();
        assert_eq!(be.fetch_count(), 2);
        assert_eq!(store.snapshot_digest().map(str::len), Some(64));
    }

    #[test]
    fn accepted_write_refetches() {
        let be = backend();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        store.competition().unwrap();
        let before = store.snapshot_digest().unwrap().to_string();
        let patch = CompetitionPatch::results(vec![AttemptResult::new(uid("a"), dref("5N1"), 100.0)]);
        let after = store.write(&patch).unwrap();
        assert_eq!(after.results.len(), 1);
        assert_eq!(be.fetch_count(), 2);
        assert_ne!(store.snapshot_digest().unwrap(), before);
    }

    #[test]
    fn rejected_write_leaves_local_state() {
        let be = backend();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        store.competition().unwrap();
        be.set_fail_writes(true);
        let patch = CompetitionPatch::results(vec![AttemptResult::new(uid("a"), dref("5N1"), 100.0)]);
        let err = store.write(&patch).unwrap_err();
        assert!(matches!(err, PipelineError::Backend { status: 503, .. }));
        assert!(store.cached().unwrap().results.is_empty());
        assert_eq!(be.fetch_count(), 1);
    }

    #[test]
    fn failed_read_keeps_previous_snapshot() {
        let be = backend();
        let mut store = CompetitionStore::new(&be, ApiContext::offline(), cid("c1"));
        store.competition().unwrap();
        let mut other = CompetitionStore::new(&be, ApiContext::offline(), cid("missing"));
        assert!(other.competition().is_err());
        assert!(other.cached().is_none());

        store.invalidate();
        assert!(store.competition().is_ok());
        assert!(store.cached().is_some());
    }
}
