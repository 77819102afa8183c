//! Blocking HTTP transport on `ureq`.
//!
//! Every request carries the bearer token and a JSON content type, and is
//! bounded by the configured global timeout. Status codes are passed through
//! untouched: `http_status_as_error` is disabled so a 404 is a [`Response`].

use tracing::debug;

use super::{Method, Request, Response, Transport};
use crate::config::ClientConfig;
use crate::error::TransportError;

/// Upper bound on a response body. Full item listings of large collections
/// exceed ureq's 10 MB default.
pub const MAX_RESPONSE_BYTES: u64 = 1 << 30;

/// Transport that talks to `{api_host}/{project}` over HTTP(S).
pub struct HttpTransport {
    agent: ureq::Agent,
    project_url: String,
    authorization: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build();

        HttpTransport {
            agent: ureq::Agent::new_with_config(agent_config),
            project_url: config.project_url(),
            authorization: format!("Bearer {}", config.token),
        }
    }

    /// Absolute URL for a project-relative path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.project_url, path)
    }

    fn prepare<B>(&self, builder: ureq::RequestBuilder<B>, request: &Request) -> ureq::RequestBuilder<B> {
        let mut builder = builder
            .header("Authorization", &self.authorization)
            .header("Content-Type", "application/json");
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }
        builder
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let url = self.url(&request.path);
        let transport_error = |message: String| TransportError {
            method: request.method.to_string(),
            url: url.clone(),
            message,
        };

        debug!(method = %request.method, url = %url, "sending request");

        let body = request
            .body
            .as_ref()
            .map(|b| b.to_string())
            .unwrap_or_default();

        let result = match request.method {
            Method::Get => self.prepare(self.agent.get(&url), request).call(),
            Method::Delete => self.prepare(self.agent.delete(&url), request).call(),
            Method::Post => self
                .prepare(self.agent.post(&url), request)
                .send(body.as_bytes()),
            Method::Patch => self
                .prepare(self.agent.patch(&url), request)
                .send(body.as_bytes()),
        };

        let response = result.map_err(|e| transport_error(e.to_string()))?;
        let status = response.status().as_u16();
        let mut body = response.into_body();
        let text = body
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_string()
            .map_err(|e| transport_error(format!("could not read response body: {}", e)))?;

        debug!(method = %request.method, url = %url, status, "received response");
        Ok(Response::new(status, text))
    }
}
