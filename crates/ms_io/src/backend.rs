//! Competition record store access.
//!
//! Every call takes an explicit [`ApiContext`] (base URL + bearer token); no
//! ambient credentials. Three implementations share the [`Backend`] trait:
//! [`MemoryBackend`] (tests, embedding), [`FileBackend`] (a directory of JSON
//! snapshots) and, with feature `remote`, `remote::HttpBackend`.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use ms_core::{AttemptResult, Competition, CompetitionId, Competitor, CompetitorId, DisciplineRef};

use crate::canonical_json::write_bytes_replacing;
use crate::snapshot::{self, WireResult};
use crate::{IoError, IoResult};

/// Per-call connection context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiContext {
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiContext {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        ApiContext { base_url: base_url.into(), token: token.filter(|t| !t.trim().is_empty()) }
    }

    /// Context for local backends that ignore URL and token.
    pub fn offline() -> Self {
        ApiContext::default()
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Partial competition update; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompetitionPatch {
    pub results: Option<Vec<AttemptResult>>,
    pub participants: Option<Vec<CompetitorId>>,
    pub disciplines: Option<Vec<DisciplineRef>>,
    pub admins: Option<Vec<CompetitorId>>,
}

impl CompetitionPatch {
    pub fn results(results: Vec<AttemptResult>) -> Self {
        CompetitionPatch { results: Some(results), ..Default::default() }
    }

    pub fn participants(participants: Vec<CompetitorId>) -> Self {
        CompetitionPatch { participants: Some(participants), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_none() && self.participants.is_none() && self.disciplines.is_none() && self.admins.is_none()
    }

    pub fn apply_to(&self, c: &mut Competition) {
        if let Some(r) = &self.results {
            c.results = r.clone();
        }
        if let Some(p) = &self.participants {
            c.participants = p.clone();
        }
        if let Some(d) = &self.disciplines {
            c.disciplines = d.clone();
        }
        if let Some(a) = &self.admins {
            c.admins = a.clone();
        }
    }

    /// Request body in backend field names; absent fields are omitted.
    pub fn to_wire(&self) -> WirePatch {
        let ids = |v: &Vec<CompetitorId>| v.iter().map(|i| i.to_string()).collect();
        WirePatch {
            comp_results: self.results.as_ref().map(|r| r.iter().map(snapshot::result_to_wire).collect()),
            comp_users: self.participants.as_ref().map(ids),
            disciplines: self.disciplines.as_ref().map(|d| d.iter().map(|r| r.to_string()).collect()),
            comp_admins: self.admins.as_ref().map(ids),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comp_results: Option<Vec<WireResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comp_users: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disciplines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comp_admins: Option<Vec<String>>,
}

/// A competitor to be created in the user directory; the backend assigns the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCompetitor {
    pub first_name: String,
    pub last_name: String,
    pub country: Option<String>,
}

pub trait Backend {
    fn fetch_competition(&self, ctx: &ApiContext, id: &CompetitionId) -> IoResult<Competition>;
    fn fetch_users(&self, ctx: &ApiContext) -> IoResult<Vec<Competitor>>;
    fn update_competition(&self, ctx: &ApiContext, id: &CompetitionId, patch: &CompetitionPatch) -> IoResult<()>;
    fn create_competitor(&self, ctx: &ApiContext, new: &NewCompetitor) -> IoResult<Competitor>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn fetch_competition(&self, ctx: &ApiContext, id: &CompetitionId) -> IoResult<Competition> {
        (**self).fetch_competition(ctx, id)
    }
    fn fetch_users(&self, ctx: &ApiContext) -> IoResult<Vec<Competitor>> {
        (**self).fetch_users(ctx)
    }
    fn update_competition(&self, ctx: &ApiContext, id: &CompetitionId, patch: &CompetitionPatch) -> IoResult<()> {
        (**self).update_competition(ctx, id, patch)
    }
    fn create_competitor(&self, ctx: &ApiContext, new: &NewCompetitor) -> IoResult<Competitor> {
        (**self).create_competitor(ctx, new)
    }
}

/// Smallest `u<n>` id not already in the directory.
fn next_user_id(users: &[Competitor]) -> IoResult<CompetitorId> {
    let mut n = users.len() + 1;
    loop {
        let id: CompetitorId = format!("u{n}").parse()?;
        if users.iter().all(|u| u.id != id) {
            return Ok(id);
        }
        n += 1;
    }
}

fn not_found(id: &CompetitionId) -> IoError {
    IoError::Backend { status: 404, msg: format!("competition {id} not found") }
}

// ----------------------------- Memory -----------------------------

/// In-process store. Writes can be made to fail to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    competitions: RefCell<BTreeMap<CompetitionId, Competition>>,
    users: RefCell<Vec<Competitor>>,
    fail_writes: Cell<bool>,
    fetches: Cell<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_competition(self, id: CompetitionId, mut competition: Competition) -> Self {
        competition.id = Some(id.clone());
        self.competitions.borrow_mut().insert(id, competition);
        self
    }

    pub fn with_users(self, users: Vec<Competitor>) -> Self {
        *self.users.borrow_mut() = users;
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of `fetch_competition` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    /// Direct view of stored state, bypassing the trait.
    pub fn stored(&self, id: &CompetitionId) -> Option<Competition> {
        self.competitions.borrow().get(id).cloned()
    }

    fn check_writable(&self) -> IoResult<()> {
        if self.fail_writes.get() {
            return Err(IoError::Backend { status: 503, msg: "write rejected".into() });
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn fetch_competition(&self, _ctx: &ApiContext, id: &CompetitionId) -> IoResult<Competition> {
        self.fetches.set(self.fetches.get() + 1);
        self.competitions.borrow().get(id).cloned().ok_or_else(|| not_found(id))
    }

    fn fetch_users(&self, _ctx: &ApiContext) -> IoResult<Vec<Competitor>> {
        Ok(self.users.borrow().clone())
    }

    fn update_competition(&self, _ctx: &ApiContext, id: &CompetitionId, patch: &CompetitionPatch) -> IoResult<()> {
        self.check_writable()?;
        let mut all = self.competitions.borrow_mut();
        let comp = all.get_mut(id).ok_or_else(|| not_found(id))?;
        patch.apply_to(comp);
        Ok(())
    }

    fn create_competitor(&self, _ctx: &ApiContext, new: &NewCompetitor) -> IoResult<Competitor> {
        self.check_writable()?;
        let mut users = self.users.borrow_mut();
        let created = Competitor {
            id: next_user_id(&users)?,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            country: new.country.clone(),
            verified: false,
        };
        users.push(created.clone());
        Ok(created)
    }
}

// ----------------------------- Files -----------------------------

/// Directory layout: `competition-<id>.json` per competition, `users.json`
/// for the directory. Both in backend wire format.
#[derive(Clone, Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileBackend { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn competition_path(&self, id: &CompetitionId) -> PathBuf {
        self.root.join(format!("competition-{id}.json"))
    }

    pub fn users_path(&self) -> PathBuf {
        self.root.join("users.json")
    }

    pub fn save_competition(&self, id: &CompetitionId, competition: &Competition) -> IoResult<()> {
        let mut wire = snapshot::competition_to_wire(competition);
        wire.id = Some(id.to_string());
        write_bytes_replacing(&self.competition_path(id), &serde_json::to_vec_pretty(&wire)?)
    }

    pub fn save_users(&self, users: &[Competitor]) -> IoResult<()> {
        let wire: Vec<_> = users.iter().map(snapshot::user_to_wire).collect();
        write_bytes_replacing(&self.users_path(), &serde_json::to_vec_pretty(&wire)?)
    }
}

impl Backend for FileBackend {
    fn fetch_competition(&self, _ctx: &ApiContext, id: &CompetitionId) -> IoResult<Competition> {
        let path = self.competition_path(id);
        if !path.exists() {
            return Err(not_found(id));
        }
        let mut c = snapshot::load_competition(&path)?;
        c.id.get_or_insert_with(|| id.clone());
        Ok(c)
    }

    /// A missing `users.json` is an empty directory.
    fn fetch_users(&self, _ctx: &ApiContext) -> IoResult<Vec<Competitor>> {
        let path = self.users_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        snapshot::load_users(&path)
    }

    fn update_competition(&self, ctx: &ApiContext, id: &CompetitionId, patch: &CompetitionPatch) -> IoResult<()> {
        let mut c = self.fetch_competition(ctx, id)?;
        patch.apply_to(&mut c);
        self.save_competition(id, &c)?;
        tracing::debug!(path = %self.competition_path(id).display(), "competition file updated");
        Ok(())
    }

    fn create_competitor(&self, ctx: &ApiContext, new: &NewCompetitor) -> IoResult<Competitor> {
        let mut users = self.fetch_users(ctx)?;
        let created = Competitor {
            id: next_user_id(&users)?,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            country: new.country.clone(),
            verified: false,
        };
        users.push(created.clone());
        self.save_users(&users)?;
        Ok(created)
    }
}
