//! Backend wire shapes for competitions and users, and their conversion into
//! `ms_core` records.
//!
//! The record store speaks camelCase JSON with Mongo-style `_id` keys:
//!
//! ```json
//! { "_id": "c1", "name": "Open", "disciplines": ["5N1", "K1"],
//!   "compUsers": ["u1"], "compAdmins": [],
//!   "compResults": [ { "compUser": "u1", "discipline": "5N1", "score": 410 } ] }
//! ```
//!
//! Identifier fields are validated on the way in; a bad id is reported with
//! a JSON Pointer to the offending field.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ms_core::{AttemptResult, Competition, CompetitionId, Competitor, CompetitorId, DisciplineRef};

use crate::{IoError, IoResult};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCompetition {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub disciplines: Vec<String>,
    #[serde(default)]
    pub comp_users: Vec<String>,
    #[serde(default)]
    pub comp_results: Vec<WireResult>,
    #[serde(default)]
    pub comp_admins: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResult {
    pub comp_user: String,
    pub discipline: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default)]
    pub provisional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

// ----------------------------- Loaders -----------------------------

pub fn load_competition(path: &Path) -> IoResult<Competition> {
    parse_competition(&read_text(path)?)
}

pub fn load_users(path: &Path) -> IoResult<Vec<Competitor>> {
    parse_users(&read_text(path)?)
}

pub fn parse_competition(text: &str) -> IoResult<Competition> {
    let wire: WireCompetition = serde_json::from_str(text)?;
    competition_from_wire(wire)
}

/// Accepts either a bare array of users or `{ "users": [...] }`.
pub fn parse_users(text: &str) -> IoResult<Vec<Competitor>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Directory {
        Bare(Vec<WireUser>),
        Wrapped { users: Vec<WireUser> },
    }
    let users = match serde_json::from_str::<Directory>(text)? {
        Directory::Bare(u) | Directory::Wrapped { users: u } => u,
    };
    users_from_wire(users)
}

pub fn users_from_wire(users: Vec<WireUser>) -> IoResult<Vec<Competitor>> {
    users
        .into_iter()
        .enumerate()
        .map(|(i, u)| user_from_wire(u, &format!("/{i}")))
        .collect()
}

pub(crate) fn read_text(path: &Path) -> IoResult<String> {
    fs::read_to_string(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))
}

// ----------------------------- Conversion -----------------------------

fn token<T: FromStr>(raw: &str, pointer: impl Into<String>) -> IoResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| IoError::Json { pointer: pointer.into(), msg: e.to_string() })
}

pub fn competition_from_wire(wire: WireCompetition) -> IoResult<Competition> {
    let id = match wire.id.as_deref() {
        Some(raw) => Some(token::<CompetitionId>(raw, "/_id")?),
        None => None,
    };
    let disciplines = wire
        .disciplines
        .iter()
        .enumerate()
        .map(|(i, d)| token::<DisciplineRef>(d, format!("/disciplines/{i}")))
        .collect::<IoResult<Vec<_>>>()?;
    let participants = wire
        .comp_users
        .iter()
        .enumerate()
        .map(|(i, u)| token::<CompetitorId>(u, format!("/compUsers/{i}")))
        .collect::<IoResult<Vec<_>>>()?;
    let admins = wire
        .comp_admins
        .iter()
        .enumerate()
        .map(|(i, u)| token::<CompetitorId>(u, format!("/compAdmins/{i}")))
        .collect::<IoResult<Vec<_>>>()?;
    let results = wire
        .comp_results
        .into_iter()
        .enumerate()
        .map(|(i, r)| result_from_wire(r, &format!("/compResults/{i}")))
        .collect::<IoResult<Vec<_>>>()?;

    Ok(Competition { id, name: wire.name, disciplines, participants, admins, results })
}

pub fn result_from_wire(r: WireResult, at: &str) -> IoResult<AttemptResult> {
    if !r.score.is_finite() {
        return Err(IoError::Json { pointer: format!("{at}/score"), msg: "score must be finite".into() });
    }
    Ok(AttemptResult {
        competitor_id: token(&r.comp_user, format!("{at}/compUser"))?,
        discipline_ref: token(&r.discipline, format!("{at}/discipline"))?,
        raw_score: r.score,
        time: r.time,
        provisional: r.provisional,
        additional_info: r.additional_info,
    })
}

pub fn user_from_wire(u: WireUser, at: &str) -> IoResult<Competitor> {
    Ok(Competitor {
        id: token(&u.id, format!("{at}/_id"))?,
        first_name: u.first_name,
        last_name: u.last_name,
        country: u.country,
        verified: u.verified,
    })
}

pub fn competition_to_wire(c: &Competition) -> WireCompetition {
    WireCompetition {
        id: c.id.as_ref().map(|id| id.to_string()),
        name: c.name.clone(),
        disciplines: c.disciplines.iter().map(|d| d.to_string()).collect(),
        comp_users: c.participants.iter().map(|u| u.to_string()).collect(),
        comp_results: c.results.iter().map(result_to_wire).collect(),
        comp_admins: c.admins.iter().map(|u| u.to_string()).collect(),
    }
}

pub fn result_to_wire(r: &AttemptResult) -> WireResult {
    WireResult {
        comp_user: r.competitor_id.to_string(),
        discipline: r.discipline_ref.to_string(),
        score: r.raw_score,
        time: r.time,
        provisional: r.provisional,
        additional_info: r.additional_info.clone(),
    }
}

pub fn user_to_wire(c: &Competitor) -> WireUser {
    WireUser {
        id: c.id.to_string(),
        first_name: c.first_name.clone(),
        last_name: c.last_name.clone(),
        country: c.country.clone(),
        role: None,
        verified: c.verified,
    }
}
