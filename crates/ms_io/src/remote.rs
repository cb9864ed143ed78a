//! Blocking HTTP backend for the hosted record store.
//!
//! REST surface:
//! - `GET  /competitions/{id}`
//! - `GET  /users`
//! - `PUT  /competitions/{id}` (partial body, see [`CompetitionPatch::to_wire`])
//! - `POST /users`
//!
//! No retries, no timeout override. Non-2xx answers become [`IoError::Backend`].

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use ms_core::{Competition, CompetitionId, Competitor};

use crate::backend::{ApiContext, Backend, CompetitionPatch, NewCompetitor};
use crate::snapshot::{self, WireCompetition, WireUser};
use crate::{IoError, IoResult};

#[derive(Clone, Debug, Default)]
pub struct HttpBackend {
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUserBody<'a> {
    first_name: &'a str,
    last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<&'a str>,
}

impl HttpBackend {
    pub fn new() -> Self {
        HttpBackend { client: Client::new() }
    }

    fn authorized(&self, ctx: &ApiContext, rb: RequestBuilder) -> RequestBuilder {
        match ctx.token.as_deref() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    fn send(&self, rb: RequestBuilder) -> IoResult<Response> {
        let resp = rb.send().map_err(|e| IoError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let msg = resp.text().unwrap_or_default();
            tracing::error!(status = status.as_u16(), "backend request failed");
            return Err(IoError::Backend { status: status.as_u16(), msg });
        }
        Ok(resp)
    }

    fn get_json<T: DeserializeOwned>(&self, ctx: &ApiContext, path: &str) -> IoResult<T> {
        let rb = self.authorized(ctx, self.client.get(ctx.endpoint(path)));
        self.send(rb)?
            .json::<T>()
            .map_err(|e| IoError::Json { pointer: "/".into(), msg: e.to_string() })
    }
}

impl Backend for HttpBackend {
    fn fetch_competition(&self, ctx: &ApiContext, id: &CompetitionId) -> IoResult<Competition> {
        let wire: WireCompetition = self.get_json(ctx, &format!("competitions/{id}"))?;
        snapshot::competition_from_wire(wire)
    }

    fn fetch_users(&self, ctx: &ApiContext) -> IoResult<Vec<Competitor>> {
        let wire: Vec<WireUser> = self.get_json(ctx, "users")?;
        snapshot::users_from_wire(wire)
    }

    fn update_competition(&self, ctx: &ApiContext, id: &CompetitionId, patch: &CompetitionPatch) -> IoResult<()> {
        let url = ctx.endpoint(&format!("competitions/{id}"));
        let rb = self.authorized(ctx, self.client.put(url).json(&patch.to_wire()));
        self.send(rb)?;
        Ok(())
    }

    fn create_competitor(&self, ctx: &ApiContext, new: &NewCompetitor) -> IoResult<Competitor> {
        let body = NewUserBody {
            first_name: &new.first_name,
            last_name: &new.last_name,
            country: new.country.as_deref(),
        };
        let rb = self.authorized(ctx, self.client.post(ctx.endpoint("users")).json(&body));
        let wire: WireUser = self
            .send(rb)?
            .json()
            .map_err(|e| IoError::Json { pointer: "/".into(), msg: e.to_string() })?;
        snapshot::user_from_wire(wire, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_host_is_a_transport_error() {
        // Nothing listens on the discard port of the loopback interface.
        let ctx = ApiContext::new("http://127.0.0.1:9", Some("secret".into()));
        let id: CompetitionId = "c1".parse().unwrap();
        let err = HttpBackend::new().fetch_competition(&ctx, &id).unwrap_err();
        assert!(matches!(err, IoError::Transport(_)), "{err:?}");
    }
}
