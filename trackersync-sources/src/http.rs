//! Blocking HTTP plumbing shared by the REST adapters.
//!
//! Errors carry the host and the request path only. Credentials travel in
//! headers or query parameters that are never part of an error message.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use trackersync_core::SourceError;

const TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("trackersync/", env!("CARGO_PKG_VERSION"));

/// How requests authenticate.
#[derive(Clone)]
pub(crate) enum Auth {
    /// `Authorization: Bearer <token>` header.
    Bearer(String),
    /// `key` and `token` query parameters.
    KeyToken { key: String, token: String },
}

pub(crate) struct HttpClient {
    agent: ureq::Agent,
    source_name: &'static str,
    base_url: String,
    host: String,
    auth: Auth,
}

impl HttpClient {
    pub(crate) fn new(source_name: &'static str, base_url: &str, auth: Auth) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let host = host_of(&base_url).to_string();
        let agent = ureq::AgentBuilder::new()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            source_name,
            base_url,
            host,
            auth,
        }
    }

    /// Send `method path?query` with an optional JSON body.
    pub(crate) fn send<B: Serialize>(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<ureq::Response, SourceError> {
        tracing::debug!(source = self.source_name, method, path, "request");

        let mut request = self.agent.request(method, &format!("{}{}", self.base_url, path));
        for (name, value) in query {
            request = request.query(name, value);
        }
        request = match &self.auth {
            Auth::Bearer(token) => request.set("Authorization", &format!("Bearer {token}")),
            Auth::KeyToken { key, token } => request.query("key", key).query("token", token),
        };

        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        result.map_err(|e| self.map_error(path, e))
    }

    pub(crate) fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ureq::Response, SourceError> {
        self.send::<()>("GET", path, query, None)
    }

    /// `GET` and decode, with 404 answered as `None`.
    pub(crate) fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, SourceError> {
        match self.get(path, query) {
            Ok(response) => self.decode(response).map(Some),
            Err(SourceError::Http { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn decode<T: DeserializeOwned>(
        &self,
        response: ureq::Response,
    ) -> Result<T, SourceError> {
        response
            .into_json()
            .map_err(|e| SourceError::decode(self.source_name, e.to_string()))
    }

    fn map_error(&self, path: &str, error: ureq::Error) -> SourceError {
        match error {
            ureq::Error::Status(status, _) => SourceError::Http {
                source_name: self.source_name.to_string(),
                host: self.host.clone(),
                path: path.to_string(),
                status,
            },
            ureq::Error::Transport(transport) => SourceError::Transport {
                source_name: self.source_name.to_string(),
                host: self.host.clone(),
                message: transport.kind().to_string(),
            },
        }
    }
}

/// `https://api.github.com/x` → `api.github.com`
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?']).next().unwrap_or(rest)
}
